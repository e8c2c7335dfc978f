//! Lamp/relay map and keystroke types.
//!
//! All outputs use inverted logic: logical ON drives the expander pin LOW.
//!
//! | Id | Name  | Expander     | Pin |
//! |----|-------|--------------|-----|
//! | 0  | LED1  | IO0..7 (0x26)| 7   |
//! | 1  | LED2  | IO0..7       | 6   |
//! | 2  | LED3  | IO0..7       | 5   |
//! | 3  | LED4  | IO0..7       | 4   |
//! | 4  | LED5  | IO0..7       | 3   |
//! | 5  | RELE1 | IO0..7       | 2   |
//! | 6  | RELE2 | IO0..7       | 1   |
//! | 7  | RELE3 | IO0..7       | 0   |
//! | 8  | RELE4 | IO8..15(0x20)| 7   |
//! | 9  | RELE5 | IO8..15      | 6   |
//! | 10 | RELE6 | IO8..15      | 5   |

use std::fmt;

/// Raw keypad code: no key pressed.
pub const KEY_NONE: u8 = 16;
/// Raw keypad code: bus error or ambiguous matrix pattern.
pub const KEY_FAIL: u8 = 17;
/// Raw keypad code: scan suppressed by the debounce window.
pub const KEY_THRESHOLD: u8 = 255;

/// Default 4x4 keypad map (row-major by matrix index).
pub const DEFAULT_KEYMAP: &str = "123A456B789C*0#D";

/// Number of addressable lamp/relay outputs.
pub const MAX_IO: usize = 11;

/// A keystroke delivered to the supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Display-layer character from the keymap.
    pub ch: char,
    /// Raw matrix index 0..15.
    pub code: u8,
}

/// 16-entry translation from matrix index to character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keymap([char; 16]);

impl Keymap {
    /// Build a keymap from exactly 16 characters.
    pub fn parse(map: &str) -> Option<Self> {
        let mut chars = [' '; 16];
        let mut count = 0;
        for ch in map.chars() {
            if count == 16 {
                return None;
            }
            chars[count] = ch;
            count += 1;
        }
        (count == 16).then_some(Self(chars))
    }

    /// Character for a raw code, or `None` for codes outside 0..15.
    pub fn char_for(&self, code: u8) -> Option<char> {
        self.0.get(code as usize).copied()
    }
}

impl Default for Keymap {
    fn default() -> Self {
        let mut chars = [' '; 16];
        for (slot, ch) in chars.iter_mut().zip(DEFAULT_KEYMAP.chars()) {
            *slot = ch;
        }
        Self(chars)
    }
}

/// Which output expander a point lives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expander {
    /// IO0..IO7.
    Low,
    /// IO8..IO15.
    High,
}

/// Addressable lamp or relay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum IoId {
    /// Lamp 1.
    Led1 = 0,
    /// Lamp 2.
    Led2 = 1,
    /// Lamp 3.
    Led3 = 2,
    /// Lamp 4.
    Led4 = 3,
    /// Lamp 5.
    Led5 = 4,
    /// Relay 1.
    Rele1 = 5,
    /// Relay 2.
    Rele2 = 6,
    /// Relay 3.
    Rele3 = 7,
    /// Relay 4.
    Rele4 = 8,
    /// Relay 5.
    Rele5 = 9,
    /// Relay 6.
    Rele6 = 10,
}

impl IoId {
    /// All ids in index order.
    pub const ALL: [IoId; MAX_IO] = [
        IoId::Led1,
        IoId::Led2,
        IoId::Led3,
        IoId::Led4,
        IoId::Led5,
        IoId::Rele1,
        IoId::Rele2,
        IoId::Rele3,
        IoId::Rele4,
        IoId::Rele5,
        IoId::Rele6,
    ];

    /// Resolve a numeric id; `None` for ids >= [`MAX_IO`].
    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// Lamp ids 0..4.
    pub fn is_led(self) -> bool {
        (self as u8) <= IoId::Led5 as u8
    }

    /// Relay ids 5..10.
    pub fn is_relay(self) -> bool {
        !self.is_led()
    }

    /// Expander, pin and polarity of this output.
    pub fn point(self) -> IoPoint {
        IO_MAP[self as usize]
    }
}

impl fmt::Display for IoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let idx = *self as u8;
        if self.is_led() {
            write!(f, "LED{}", idx + 1)
        } else {
            write!(f, "RELE{}", idx - IoId::Rele1 as u8 + 1)
        }
    }
}

/// Physical location of an output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoPoint {
    /// Expander bank.
    pub expander: Expander,
    /// Pin 0..7 on the expander.
    pub pin: u8,
    /// Logical ON drives the pin LOW.
    pub active_low: bool,
}

impl IoPoint {
    const fn low(pin: u8) -> Self {
        Self {
            expander: Expander::Low,
            pin,
            active_low: true,
        }
    }

    const fn high(pin: u8) -> Self {
        Self {
            expander: Expander::High,
            pin,
            active_low: true,
        }
    }

    /// Electrical level (true = high) for a logical state.
    pub fn electrical(&self, on: bool) -> bool {
        on != self.active_low
    }
}

/// Output map indexed by [`IoId`].
pub const IO_MAP: [IoPoint; MAX_IO] = [
    IoPoint::low(7),
    IoPoint::low(6),
    IoPoint::low(5),
    IoPoint::low(4),
    IoPoint::low(3),
    IoPoint::low(2),
    IoPoint::low(1),
    IoPoint::low(0),
    IoPoint::high(7),
    IoPoint::high(6),
    IoPoint::high(5),
];

#[cfg(test)]
mod tests {
    use super::*;

    // ─── Keymap ─────────────────────────────────────────────────────

    #[test]
    fn test_default_keymap() {
        let map = Keymap::default();
        assert_eq!(map.char_for(0), Some('1'));
        assert_eq!(map.char_for(5), Some('5'));
        assert_eq!(map.char_for(15), Some('D'));
        assert_eq!(map.char_for(KEY_NONE), None);
    }

    #[test]
    fn test_keymap_requires_16_chars() {
        assert!(Keymap::parse("123").is_none());
        assert!(Keymap::parse("123A456B789C*0#DX").is_none());
        assert_eq!(Keymap::parse(DEFAULT_KEYMAP), Some(Keymap::default()));
    }

    // ─── Output map ─────────────────────────────────────────────────

    #[test]
    fn test_io_map_matches_board() {
        assert_eq!(IoId::Led1.point(), IoPoint::low(7));
        assert_eq!(IoId::Led5.point(), IoPoint::low(3));
        assert_eq!(IoId::Rele1.point(), IoPoint::low(2));
        assert_eq!(IoId::Rele3.point(), IoPoint::low(0));
        assert_eq!(IoId::Rele4.point(), IoPoint::high(7));
        assert_eq!(IoId::Rele6.point(), IoPoint::high(5));
    }

    #[test]
    fn test_inverted_logic() {
        let p = IoId::Led1.point();
        assert!(!p.electrical(true));
        assert!(p.electrical(false));
    }

    #[test]
    fn test_from_index() {
        assert_eq!(IoId::from_index(0), Some(IoId::Led1));
        assert_eq!(IoId::from_index(10), Some(IoId::Rele6));
        assert_eq!(IoId::from_index(MAX_IO as u8), None);
        assert!(IoId::Led5.is_led());
        assert!(IoId::Rele1.is_relay());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(IoId::Led3.to_string(), "LED3");
        assert_eq!(IoId::Rele1.to_string(), "RELE1");
        assert_eq!(IoId::Rele6.to_string(), "RELE6");
    }
}
