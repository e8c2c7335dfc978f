//! Field decoders shared by the sentence handlers.
//!
//! Every decoder takes one comma-delimited field. An empty field decodes to
//! `Ok(None)`: the value is simply absent. `Err(())` means the field is
//! malformed or out of range and the whole sentence must be dropped.

use crate::fix::Status;
use crate::time::{Date, Time};

pub(crate) type FieldResult<T> = Result<Option<T>, ()>;

/// Decimal with optional sign, scaled by `10^decimals`. Extra fraction
/// digits are truncated.
pub(crate) fn scaled(field: &str, decimals: u32) -> FieldResult<i64> {
    if field.is_empty() {
        return Ok(None);
    }
    let (negative, body) = match field.as_bytes()[0] {
        b'-' => (true, &field[1..]),
        b'+' => (false, &field[1..]),
        _ => (false, field),
    };
    let (int, frac) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    if int.is_empty() && frac.is_empty() {
        return Err(());
    }
    let mut value: i64 = 0;
    for b in int.bytes() {
        if !b.is_ascii_digit() {
            return Err(());
        }
        value = value
            .checked_mul(10)
            .and_then(|v| v.checked_add((b - b'0') as i64))
            .ok_or(())?;
    }
    let mut used = 0;
    for b in frac.bytes() {
        if !b.is_ascii_digit() {
            return Err(());
        }
        if used < decimals {
            value = value
                .checked_mul(10)
                .and_then(|v| v.checked_add((b - b'0') as i64))
                .ok_or(())?;
            used += 1;
        }
    }
    for _ in used..decimals {
        value = value.checked_mul(10).ok_or(())?;
    }
    Ok(Some(if negative { -value } else { value }))
}

/// Unsigned integer field.
pub(crate) fn unsigned(field: &str, max: u32) -> FieldResult<u32> {
    if field.is_empty() {
        return Ok(None);
    }
    if !field.bytes().all(|b| b.is_ascii_digit()) {
        return Err(());
    }
    let value: u32 = field.parse().map_err(|_| ())?;
    if value > max {
        return Err(());
    }
    Ok(Some(value))
}

/// `hhmmss` with optional fraction.
pub(crate) fn time(field: &str) -> FieldResult<Time> {
    let Some(raw) = scaled(field, 3)? else {
        return Ok(None);
    };
    if raw < 0 {
        return Err(());
    }
    let millis = (raw % 1000) as u16;
    let hms = raw / 1000;
    let t = Time::new(
        (hms / 10_000) as u8,
        ((hms / 100) % 100) as u8,
        (hms % 100) as u8,
        millis,
    );
    if hms >= 1_000_000 || !t.is_valid() {
        return Err(());
    }
    Ok(Some(t))
}

/// `ddmmyy`.
pub(crate) fn date(field: &str) -> FieldResult<Date> {
    if field.is_empty() {
        return Ok(None);
    }
    if field.len() != 6 {
        return Err(());
    }
    let Some(n) = unsigned(field, 999_999)? else {
        return Ok(None);
    };
    let d = Date::new(
        Date::century_year((n % 100) as u8),
        ((n / 100) % 100) as u8,
        (n / 10_000) as u8,
    );
    if !d.is_valid() {
        return Err(());
    }
    Ok(Some(d))
}

/// `ddmm.mmmmmmm` or `dddmm.mmmmmmm` into degrees × 10⁷, at most
/// `max_degrees`.
pub(crate) fn angle(field: &str, max_degrees: i64) -> FieldResult<i64> {
    let Some(raw) = scaled(field, 7)? else {
        return Ok(None);
    };
    if raw < 0 {
        return Err(());
    }
    // raw is ddmm × 10⁷
    let degrees = raw / 1_000_000_000;
    let minutes_e7 = raw % 1_000_000_000;
    if minutes_e7 >= 600_000_000 {
        return Err(());
    }
    let value = degrees * 10_000_000 + minutes_e7 / 60;
    if value > max_degrees * 10_000_000 {
        return Err(());
    }
    Ok(Some(value))
}

/// One hemisphere letter: `positive` or `negative`.
pub(crate) fn hemisphere(field: &str, positive: u8, negative: u8) -> FieldResult<bool> {
    match field.as_bytes() {
        [] => Ok(None),
        [c] if *c == positive => Ok(Some(false)),
        [c] if *c == negative => Ok(Some(true)),
        _ => Err(()),
    }
}

/// GGA quality digit or RMC/GLL/VTG status or mode letter.
pub(crate) fn status(field: &str) -> FieldResult<Status> {
    let status = match field.as_bytes() {
        [] => return Ok(None),
        [b'0' | b'N' | b'V'] => Status::None,
        [b'1' | b'A'] => Status::Std,
        [b'2' | b'D'] => Status::Dgps,
        [b'3'] => Status::Pps,
        [b'4'] => Status::RtkFixed,
        [b'5'] => Status::RtkFloat,
        [b'6' | b'E'] => Status::Est,
        _ => return Err(()),
    };
    Ok(Some(status))
}
