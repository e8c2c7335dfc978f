//! Keeloq-style 32-bit block cipher.
//!
//! 528 rounds of a 5-input non-linear feedback function, keyed by a 32-bit
//! half key that is reused for both halves of the schedule. Not applied to
//! payloads by the driver; the module's CRYPT registers protect the air
//! link.

/// Half key used when none is configured.
pub const DEFAULT_HALF_KEY: u32 = 0x0666_0708;

const NLF: u32 = 0x3A5C_742E;
const ROUNDS: u32 = 528;

#[inline]
fn bit(x: u32, n: u32) -> u32 {
    (x >> n) & 1
}

#[inline]
fn nlf(a: u32, b: u32, c: u32, d: u32, e: u32) -> u32 {
    bit(NLF, a + 2 * b + 4 * c + 8 * d + 16 * e)
}

/// Keeloq block cipher with a fixed half key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Keeloq {
    half_key: u32,
}

impl Default for Keeloq {
    fn default() -> Self {
        Self::new(DEFAULT_HALF_KEY)
    }
}

impl Keeloq {
    /// Cipher keyed by `half_key`.
    pub const fn new(half_key: u32) -> Self {
        Self { half_key }
    }

    /// Encrypt one block.
    pub fn encrypt(&self, data: u32) -> u32 {
        let mut x = data;
        for r in 0..ROUNDS {
            let key_bit = bit(self.half_key, (r & 63) % 32);
            let f = bit(x, 0)
                ^ bit(x, 16)
                ^ nlf(bit(x, 1), bit(x, 9), bit(x, 20), bit(x, 26), bit(x, 31))
                ^ key_bit;
            x = (x >> 1) | (f << 31);
        }
        x
    }

    /// Decrypt one block.
    pub fn decrypt(&self, data: u32) -> u32 {
        let mut x = data;
        for r in 0..ROUNDS {
            let key_bit = bit(self.half_key, (15u32.wrapping_sub(r) & 63) % 32);
            let f = bit(x, 31)
                ^ bit(x, 15)
                ^ nlf(bit(x, 0), bit(x, 8), bit(x, 19), bit(x, 25), bit(x, 30))
                ^ key_bit;
            x = (x << 1) ^ f;
        }
        x
    }
}

/// [`Keeloq::encrypt`] with the default half key.
pub fn encrypt(data: u32) -> u32 {
    Keeloq::default().encrypt(data)
}

/// [`Keeloq::decrypt`] with the default half key.
pub fn decrypt(data: u32) -> u32 {
    Keeloq::default().decrypt(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decrypt_inverts_encrypt() {
        for &block in &[0u32, 1, 0xDEAD_BEEF, 0x1234_5678, u32::MAX] {
            let c = encrypt(block);
            assert_eq!(decrypt(c), block);
        }
        let k = Keeloq::new(0xA5A5_0F0F);
        assert_eq!(k.decrypt(k.encrypt(0x0BAD_F00D)), 0x0BAD_F00D);
    }

    #[test]
    fn test_key_changes_ciphertext() {
        let a = Keeloq::new(1).encrypt(0x5555_5555);
        let b = Keeloq::new(2).encrypt(0x5555_5555);
        assert_ne!(a, b);
        assert_ne!(encrypt(0x5555_5555), 0x5555_5555);
    }
}
