//! Sentence builders: checksummed framing, receiver polls, and GGA/RMC
//! output for a [`Fix`].

use std::fmt::Write;

use crate::fix::{Fix, Status, Valid};
use crate::sentence::Sentence;

/// XOR of every byte of `body`.
pub fn checksum(body: &str) -> u8 {
    body.bytes().fold(0, |acc, b| acc ^ b)
}

/// Frame `body` as `$body*HH\r\n`.
pub fn format_sentence(body: &str) -> String {
    format!("${}*{:02X}\r\n", body, checksum(body))
}

/// Standard query asking the receiver to emit `sentence` once.
pub fn poll_message(sentence: Sentence) -> String {
    format_sentence(&format!("EIGPQ,{}", sentence.tag()))
}

/// Signed fixed-point value with `decimals` fraction digits.
fn push_scaled(out: &mut String, value: i64, decimals: u32) {
    let scale = 10i64.pow(decimals);
    let sign = if value < 0 { "-" } else { "" };
    let v = value.unsigned_abs();
    let s = scale as u64;
    let _ = write!(
        out,
        "{sign}{}.{:0width$}",
        v / s,
        v % s,
        width = decimals as usize
    );
}

fn push_time(out: &mut String, fix: &Fix) {
    if fix.has(Valid::TIME) {
        let t = fix.time;
        let _ = write!(
            out,
            "{:02}{:02}{:02}.{:02}",
            t.hours,
            t.minutes,
            t.seconds,
            t.centis()
        );
    }
}

/// `ddmm.mmmmmmm,N,dddmm.mmmmmmm,E` or four empty fields.
fn push_location(out: &mut String, fix: &Fix) {
    if !fix.has(Valid::LOCATION) {
        out.push_str(",,,");
        return;
    }
    let angle = |out: &mut String, e7: i32, deg_width: usize| {
        let v = e7.unsigned_abs() as u64;
        let degrees = v / 10_000_000;
        let minutes_e7 = (v % 10_000_000) * 60;
        let _ = write!(
            out,
            "{:0deg_width$}{:02}.{:07}",
            degrees,
            minutes_e7 / 10_000_000,
            minutes_e7 % 10_000_000
        );
    };
    angle(out, fix.latitude_e7, 2);
    out.push_str(if fix.latitude_e7 < 0 { ",S," } else { ",N," });
    angle(out, fix.longitude_e7, 3);
    out.push_str(if fix.longitude_e7 < 0 { ",W" } else { ",E" });
}

fn gga_quality(status: Status) -> char {
    match status {
        Status::None | Status::TimeOnly => '0',
        Status::Std => '1',
        Status::Dgps => '2',
        Status::Pps => '3',
        Status::RtkFixed => '4',
        Status::RtkFloat => '5',
        Status::Est => '6',
    }
}

/// `$GPGGA` for the valid fields of `fix`.
pub fn format_gga(fix: &Fix) -> String {
    let mut body = String::from("GPGGA,");
    push_time(&mut body, fix);
    body.push(',');
    push_location(&mut body, fix);
    body.push(',');
    if fix.has(Valid::STATUS) {
        body.push(gga_quality(fix.status));
    }
    body.push(',');
    if fix.has(Valid::SATELLITES) {
        let _ = write!(body, "{:02}", fix.satellites);
    }
    body.push(',');
    if fix.has(Valid::HDOP) {
        push_scaled(&mut body, fix.hdop as i64, 3);
    }
    body.push(',');
    if fix.has(Valid::ALTITUDE) {
        push_scaled(&mut body, fix.altitude_cm as i64, 2);
    }
    body.push_str(",M,");
    if fix.has(Valid::GEOID_HEIGHT) {
        push_scaled(&mut body, fix.geoid_height_cm as i64, 2);
    }
    body.push_str(",M,,");
    format_sentence(&body)
}

/// `$GPRMC` for the valid fields of `fix`.
pub fn format_rmc(fix: &Fix) -> String {
    let mut body = String::from("GPRMC,");
    push_time(&mut body, fix);
    body.push(',');
    let (status, mode) = match fix.status {
        _ if !fix.has(Valid::STATUS) => ("", ""),
        Status::None | Status::TimeOnly => ("V", "N"),
        Status::Est => ("E", "E"),
        Status::Dgps => ("A", "D"),
        _ => ("A", "A"),
    };
    body.push_str(status);
    body.push(',');
    push_location(&mut body, fix);
    body.push(',');
    if fix.has(Valid::SPEED) {
        push_scaled(&mut body, fix.speed_mkn as i64, 3);
    }
    body.push(',');
    if fix.has(Valid::HEADING) {
        push_scaled(&mut body, fix.heading_cd as i64, 2);
    }
    body.push(',');
    if fix.has(Valid::DATE) {
        let d = fix.date;
        let _ = write!(body, "{:02}{:02}{:02}", d.day, d.month, d.short_year());
    }
    body.push_str(",,,");
    body.push_str(mode);
    format_sentence(&body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::Time;

    #[test]
    fn test_known_checksum() {
        assert_eq!(
            format_sentence("GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,"),
            "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n"
        );
    }

    #[test]
    fn test_poll_message() {
        assert_eq!(poll_message(Sentence::Rmc), "$EIGPQ,RMC*3A\r\n");
    }

    #[test]
    fn test_scaled_negative() {
        let mut s = String::new();
        push_scaled(&mut s, -5, 2);
        assert_eq!(s, "-0.05");
    }

    #[test]
    fn test_gga_layout() {
        let fix = Fix {
            time: Time::new(12, 35, 19, 0),
            latitude_e7: 481_173_000,
            longitude_e7: 115_166_666,
            valid: Valid::TIME | Valid::LOCATION,
            ..Fix::default()
        };
        assert!(format_gga(&fix).starts_with(
            "$GPGGA,123519.00,4807.0380000,N,01130.9999960,E,,,,,M,,M,,*"
        ));
    }
}
