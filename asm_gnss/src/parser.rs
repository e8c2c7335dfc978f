//! Streaming NMEA 0183 parser.
//!
//! Characters are decoded one at a time by a four-state machine. Every
//! sentence decodes into a scratch [`Fix`]; a sentence whose checksum
//! matches is merged into the interval fix, and when the interval's last
//! sentence (RMC) commits, the interval fix is published.

use heapless::String as FieldBuf;
use tracing::trace;

use crate::field;
use crate::fix::{Fix, MAX_ERROR_CM, Satellite, Status, Valid};
use crate::sentence::Sentence;

/// Longest field accepted.
pub const MAX_FIELD_LEN: usize = 20;
/// Longest header accepted (`P` + manufacturer + tag).
const MAX_HEADER_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    Header,
    Data,
    Crc,
}

/// Result of decoding one character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decode {
    /// Need more characters, or an unknown sentence was skipped.
    Pending,
    /// A sentence passed its checksum and was merged.
    Committed(Sentence),
    /// A field failed validation; the sentence was discarded.
    Invalid,
    /// The checksum did not match; the sentence was discarded.
    ChecksumMismatch,
}

/// Parser counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Statistics {
    /// Sentences committed.
    pub ok: u32,
    /// Checksum failures.
    pub errors: u32,
    /// Characters decoded.
    pub chars: u32,
}

/// Character-level NMEA decoder with explicit interval merging.
#[derive(Debug)]
pub struct NmeaParser {
    state: State,
    crc: u8,
    received_crc: u8,
    crc_digits: u8,
    header: FieldBuf<MAX_HEADER_LEN>,
    field: FieldBuf<MAX_FIELD_LEN>,
    index: u8,
    sentence: Option<Sentence>,
    scratch: Fix,
    lat_seen: bool,
    lon_seen: bool,
    interval: Fix,
    interval_closed: bool,
    published: Option<Fix>,
    stats: Statistics,
}

impl Default for NmeaParser {
    fn default() -> Self {
        Self::new()
    }
}

impl NmeaParser {
    /// Idle parser with empty statistics.
    pub fn new() -> Self {
        Self {
            state: State::Idle,
            crc: 0,
            received_crc: 0,
            crc_digits: 0,
            header: FieldBuf::new(),
            field: FieldBuf::new(),
            index: 0,
            sentence: None,
            scratch: Fix::default(),
            lat_seen: false,
            lon_seen: false,
            interval: Fix::default(),
            interval_closed: false,
            published: None,
            stats: Statistics::default(),
        }
    }

    /// Counters since construction.
    pub fn stats(&self) -> Statistics {
        self.stats
    }

    /// Most recently published fix, if any.
    pub fn latest(&self) -> Option<&Fix> {
        self.published.as_ref()
    }

    /// Take the published fix, leaving none.
    pub fn take_fix(&mut self) -> Option<Fix> {
        self.published.take()
    }

    /// Fix accumulated so far in the open interval.
    pub fn interval_fix(&self) -> &Fix {
        &self.interval
    }

    /// Decode a buffer. Returns the number of fixes published.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        bytes
            .iter()
            .filter(|&&b| matches!(self.decode(b), Decode::Committed(s) if s.ends_interval()))
            .count()
    }

    /// Decode one character.
    pub fn decode(&mut self, c: u8) -> Decode {
        self.stats.chars = self.stats.chars.wrapping_add(1);

        if c == b'$' {
            self.begin_sentence();
            return Decode::Pending;
        }

        match self.state {
            State::Idle => Decode::Pending,
            State::Header => self.header_char(c),
            State::Data => self.data_char(c),
            State::Crc => self.crc_char(c),
        }
    }

    fn begin_sentence(&mut self) {
        self.state = State::Header;
        self.crc = 0;
        self.received_crc = 0;
        self.crc_digits = 0;
        self.header.clear();
        self.field.clear();
        self.index = 0;
        self.sentence = None;
        self.scratch = Fix::default();
        self.lat_seen = false;
        self.lon_seen = false;
    }

    fn invalidate(&mut self) -> Decode {
        self.state = State::Idle;
        Decode::Invalid
    }

    fn header_char(&mut self, c: u8) -> Decode {
        if !is_printable(c) {
            return self.invalidate();
        }
        self.crc ^= c;
        if c != b',' {
            if self.header.push(c as char).is_err() {
                self.state = State::Idle;
            }
            return Decode::Pending;
        }

        let header = self.header.as_str();
        let tag = if header.starts_with('P') {
            // Proprietary: P + three-letter manufacturer. No proprietary
            // sentences are decoded.
            None
        } else if header.len() == 5 {
            Sentence::from_tag(&header[2..])
        } else {
            None
        };
        match tag {
            Some(sentence) => {
                self.sentence = Some(sentence);
                self.index = 1;
                self.state = State::Data;
            }
            None => {
                trace!("NMEA: skipping {:?}", self.header.as_str());
                self.state = State::Idle;
            }
        }
        Decode::Pending
    }

    fn data_char(&mut self, c: u8) -> Decode {
        match c {
            b'*' => {
                if !self.finish_field() {
                    return self.invalidate();
                }
                self.state = State::Crc;
                Decode::Pending
            }
            b',' => {
                self.crc ^= c;
                if !self.finish_field() {
                    return self.invalidate();
                }
                self.index = self.index.saturating_add(1);
                Decode::Pending
            }
            c if is_printable(c) => {
                self.crc ^= c;
                if self.field.push(c as char).is_err() {
                    return self.invalidate();
                }
                Decode::Pending
            }
            _ => self.invalidate(),
        }
    }

    fn crc_char(&mut self, c: u8) -> Decode {
        let Some(nibble) = hex_value(c) else {
            return self.invalidate();
        };
        self.received_crc = (self.received_crc << 4) | nibble;
        self.crc_digits += 1;
        if self.crc_digits < 2 {
            return Decode::Pending;
        }

        self.state = State::Idle;
        if self.received_crc != self.crc {
            self.stats.errors = self.stats.errors.wrapping_add(1);
            trace!(
                "NMEA: checksum {:02X} != {:02X}",
                self.received_crc, self.crc
            );
            return Decode::ChecksumMismatch;
        }
        let Some(sentence) = self.sentence else {
            return Decode::Pending;
        };
        self.commit(sentence);
        Decode::Committed(sentence)
    }

    fn commit(&mut self, sentence: Sentence) {
        self.stats.ok = self.stats.ok.wrapping_add(1);
        if self.interval_closed {
            self.interval = Fix::default();
            self.interval_closed = false;
        }
        self.interval.merge(&self.scratch);
        if sentence.ends_interval() {
            self.published = Some(self.interval.clone());
            self.interval_closed = true;
        }
    }

    fn finish_field(&mut self) -> bool {
        let value = std::mem::take(&mut self.field);
        match self.sentence {
            Some(sentence) => self.parse_field(sentence, self.index, value.as_str()).is_ok(),
            None => false,
        }
    }

    fn parse_field(&mut self, sentence: Sentence, index: u8, f: &str) -> Result<(), ()> {
        match sentence {
            Sentence::Gga => match index {
                1 => self.time(f),
                2..=5 => self.location(index - 2, f),
                6 => self.status(f),
                7 => {
                    if let Some(n) = field::unsigned(f, 255)? {
                        self.scratch.satellites = n as u8;
                        self.scratch.valid |= Valid::SATELLITES;
                    }
                    Ok(())
                }
                8 => self.dop(f, Valid::HDOP),
                9 => {
                    if let Some(cm) = field::scaled(f, 2)? {
                        self.scratch.altitude_cm = to_i32(cm)?;
                        self.scratch.valid |= Valid::ALTITUDE;
                    }
                    Ok(())
                }
                11 => {
                    if let Some(cm) = field::scaled(f, 2)? {
                        self.scratch.geoid_height_cm = to_i32(cm)?;
                        self.scratch.valid |= Valid::GEOID_HEIGHT;
                    }
                    Ok(())
                }
                _ => Ok(()),
            },
            Sentence::Rmc => match index {
                1 => self.time(f),
                2 => self.status(f),
                3..=6 => self.location(index - 3, f),
                7 => self.speed(f),
                8 => self.heading(f),
                9 => {
                    if let Some(date) = field::date(f)? {
                        self.scratch.date = date;
                        self.scratch.valid |= Valid::DATE;
                    }
                    Ok(())
                }
                12 => self.status(f),
                _ => Ok(()),
            },
            Sentence::Gll => match index {
                1..=4 => self.location(index - 1, f),
                5 => self.time(f),
                7 => self.status(f),
                _ => Ok(()),
            },
            Sentence::Gsa => match index {
                2 => {
                    let status = match f {
                        "" => return Ok(()),
                        "1" => Status::None,
                        "2" | "3" => Status::Std,
                        _ => return Err(()),
                    };
                    self.set_status(status);
                    Ok(())
                }
                15 => self.dop(f, Valid::PDOP),
                16 => self.dop(f, Valid::HDOP),
                17 => self.dop(f, Valid::VDOP),
                _ => Ok(()),
            },
            Sentence::Gst => match index {
                1 => self.time(f),
                6 => self.error_cm(f, Valid::LAT_ERR),
                7 => self.error_cm(f, Valid::LON_ERR),
                8 => self.error_cm(f, Valid::ALT_ERR),
                _ => Ok(()),
            },
            Sentence::Vtg => match index {
                1 => self.heading(f),
                5 => self.speed(f),
                9 => self.status(f),
                _ => Ok(()),
            },
            Sentence::Zda => match index {
                1 => self.time(f),
                2 => {
                    if let Some(day) = field::unsigned(f, 31)? {
                        self.scratch.date.day = day as u8;
                    }
                    Ok(())
                }
                3 => {
                    if let Some(month) = field::unsigned(f, 12)? {
                        self.scratch.date.month = month as u8;
                    }
                    Ok(())
                }
                4 => {
                    if let Some(year) = field::unsigned(f, 9999)? {
                        self.scratch.date.year = year as u16;
                        if !self.scratch.date.is_valid() {
                            return Err(());
                        }
                        self.scratch.valid |= Valid::DATE;
                    }
                    Ok(())
                }
                _ => Ok(()),
            },
            Sentence::Gsv => {
                if index < 4 {
                    return Ok(());
                }
                let slot = (index - 4) % 4;
                match slot {
                    0 => {
                        if let Some(id) = field::unsigned(f, 255)? {
                            let sat = Satellite {
                                id: id as u8,
                                ..Satellite::default()
                            };
                            if self.scratch.sky.push(sat).is_ok() {
                                self.scratch.valid |= Valid::SKY;
                            }
                        }
                        Ok(())
                    }
                    1 => {
                        let elevation = field::unsigned(f, 90)?;
                        if let (Some(e), Some(sat)) = (elevation, self.scratch.sky.last_mut()) {
                            sat.elevation = e as u8;
                        }
                        Ok(())
                    }
                    2 => {
                        let azimuth = field::unsigned(f, 359)?;
                        if let (Some(a), Some(sat)) = (azimuth, self.scratch.sky.last_mut()) {
                            sat.azimuth = a as u16;
                        }
                        Ok(())
                    }
                    _ => {
                        let snr = field::unsigned(f, 99)?;
                        if let (Some(s), Some(sat)) = (snr, self.scratch.sky.last_mut()) {
                            sat.snr = s as u8;
                            sat.tracked = true;
                        }
                        Ok(())
                    }
                }
            }
        }
    }

    fn time(&mut self, f: &str) -> Result<(), ()> {
        if let Some(time) = field::time(f)? {
            self.scratch.time = time;
            self.scratch.valid |= Valid::TIME;
        }
        Ok(())
    }

    fn set_status(&mut self, status: Status) {
        if !self.scratch.valid.contains(Valid::STATUS) || self.scratch.status < status {
            self.scratch.status = status;
        }
        self.scratch.valid |= Valid::STATUS;
    }

    fn status(&mut self, f: &str) -> Result<(), ()> {
        if let Some(status) = field::status(f)? {
            self.set_status(status);
        }
        Ok(())
    }

    /// `part`: 0 latitude, 1 N/S, 2 longitude, 3 E/W.
    fn location(&mut self, part: u8, f: &str) -> Result<(), ()> {
        match part {
            0 => {
                if let Some(lat) = field::angle(f, 90)? {
                    self.scratch.latitude_e7 = to_i32(lat)?;
                    self.lat_seen = true;
                }
            }
            1 => {
                if field::hemisphere(f, b'N', b'S')? == Some(true) {
                    self.scratch.latitude_e7 = -self.scratch.latitude_e7;
                }
            }
            2 => {
                if let Some(lon) = field::angle(f, 180)? {
                    self.scratch.longitude_e7 = to_i32(lon)?;
                    self.lon_seen = true;
                }
            }
            _ => {
                let west = field::hemisphere(f, b'E', b'W')?;
                if west == Some(true) {
                    self.scratch.longitude_e7 = -self.scratch.longitude_e7;
                }
                if west.is_some() && self.lat_seen && self.lon_seen {
                    self.scratch.valid |= Valid::LOCATION;
                }
            }
        }
        Ok(())
    }

    fn speed(&mut self, f: &str) -> Result<(), ()> {
        if let Some(mkn) = field::scaled(f, 3)? {
            self.scratch.speed_mkn = u32::try_from(mkn).map_err(|_| ())?;
            self.scratch.valid |= Valid::SPEED;
        }
        Ok(())
    }

    fn heading(&mut self, f: &str) -> Result<(), ()> {
        if let Some(cd) = field::scaled(f, 2)? {
            if !(0..36_000).contains(&cd) {
                return Err(());
            }
            self.scratch.heading_cd = cd as u16;
            self.scratch.valid |= Valid::HEADING;
        }
        Ok(())
    }

    fn dop(&mut self, f: &str, which: Valid) -> Result<(), ()> {
        if let Some(v) = field::scaled(f, 3)? {
            let v = u16::try_from(v).map_err(|_| ())?;
            if which == Valid::HDOP {
                self.scratch.hdop = v;
            } else if which == Valid::VDOP {
                self.scratch.vdop = v;
            } else {
                self.scratch.pdop = v;
            }
            self.scratch.valid |= which;
        }
        Ok(())
    }

    fn error_cm(&mut self, f: &str, which: Valid) -> Result<(), ()> {
        if let Some(cm) = field::scaled(f, 2)? {
            if cm < 0 {
                return Err(());
            }
            let cm = cm.min(MAX_ERROR_CM as i64) as u16;
            if which == Valid::LAT_ERR {
                self.scratch.lat_err_cm = cm;
            } else if which == Valid::LON_ERR {
                self.scratch.lon_err_cm = cm;
            } else {
                self.scratch.alt_err_cm = cm;
            }
            self.scratch.valid |= which;
        }
        Ok(())
    }
}

fn is_printable(c: u8) -> bool {
    (b' '..=b'~').contains(&c)
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'A'..=b'F' => Some(c - b'A' + 10),
        b'a'..=b'f' => Some(c - b'a' + 10),
        _ => None,
    }
}

fn to_i32(v: i64) -> Result<i32, ()> {
    i32::try_from(v).map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::format_sentence;

    fn parse(parser: &mut NmeaParser, body: &str) -> Decode {
        let mut last = Decode::Pending;
        for b in format_sentence(body).bytes() {
            let d = parser.decode(b);
            if d != Decode::Pending {
                last = d;
            }
        }
        last
    }

    #[test]
    fn test_gga_fields() {
        let mut p = NmeaParser::new();
        let r = parse(
            &mut p,
            "GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,",
        );
        assert_eq!(r, Decode::Committed(Sentence::Gga));
        let fix = p.interval_fix();
        assert_eq!(fix.satellites, 8);
        assert_eq!(fix.hdop, 900);
        assert_eq!(fix.altitude_cm, 54_540);
        assert_eq!(fix.geoid_height_cm, 4_690);
        assert_eq!(fix.latitude_e7, 481_173_000);
        assert_eq!(fix.status, Status::Std);
        assert!(fix.has(Valid::LOCATION | Valid::TIME | Valid::SATELLITES));
        assert!(p.latest().is_none());
    }

    #[test]
    fn test_southern_western_hemisphere() {
        let mut p = NmeaParser::new();
        parse(&mut p, "GNGLL,3351.000,S,15112.000,W,010203.00,A,A");
        let fix = p.interval_fix();
        assert!(fix.latitude_e7 < 0);
        assert!(fix.longitude_e7 < 0);
        assert!(fix.has(Valid::LOCATION));
    }

    #[test]
    fn test_dollar_restarts_sentence() {
        let mut p = NmeaParser::new();
        p.feed(b"$GPGGA,1235");
        let r = parse(&mut p, "GPVTG,054.7,T,034.4,M,005.5,N,010.2,K,A");
        assert_eq!(r, Decode::Committed(Sentence::Vtg));
        assert_eq!(p.interval_fix().heading_cd, 5_470);
        assert_eq!(p.interval_fix().speed_mkn, 5_500);
    }

    #[test]
    fn test_non_printable_invalidates() {
        let mut p = NmeaParser::new();
        let mut bytes = format_sentence("GPZDA,201530.00,04,07,2002,00,00").into_bytes();
        bytes[10] = 0x01;
        let results: Vec<Decode> = bytes.iter().map(|&b| p.decode(b)).collect();
        assert!(results.contains(&Decode::Invalid));
        assert_eq!(p.stats().ok, 0);
        assert_eq!(p.stats().errors, 0);
    }

    #[test]
    fn test_zda_date() {
        let mut p = NmeaParser::new();
        parse(&mut p, "GPZDA,201530.00,04,07,2002,00,00");
        assert!(p.interval_fix().has(Valid::DATE | Valid::TIME));
        assert_eq!(p.interval_fix().date.year, 2002);
        assert_eq!(
            parse(&mut p, "GPZDA,201530.00,30,02,2002,00,00"),
            Decode::Invalid
        );
    }

    #[test]
    fn test_gst_errors_are_capped() {
        let mut p = NmeaParser::new();
        parse(&mut p, "GPGST,172814.0,0.006,0.023,0.020,273.6,0.023,0.020,350.5");
        let fix = p.interval_fix();
        assert_eq!(fix.lat_err_cm, 2);
        assert_eq!(fix.lon_err_cm, 2);
        assert_eq!(fix.alt_err_cm, MAX_ERROR_CM);
    }

    #[test]
    fn test_oversized_altitude_drops_sentence() {
        let mut p = NmeaParser::new();
        let r = parse(
            &mut p,
            "GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,99999999999999999.99,M,46.9,M,,",
        );
        assert_eq!(r, Decode::Invalid);
        assert!(!p.interval_fix().has(Valid::ALTITUDE));
        assert_eq!(p.stats().ok, 0);
    }

    #[test]
    fn test_interval_resets_after_rmc() {
        let mut p = NmeaParser::new();
        parse(&mut p, "GPGGA,123519,,,,,1,08,0.9,545.4,M,46.9,M,,");
        parse(&mut p, "GPRMC,123520,A,,,,,,,230394,,,A");
        assert!(p.latest().unwrap().has(Valid::ALTITUDE));
        parse(&mut p, "GPVTG,054.7,T,,M,005.5,N,,K,A");
        assert!(!p.interval_fix().has(Valid::ALTITUDE));
        assert!(p.interval_fix().has(Valid::HEADING));
    }
}
