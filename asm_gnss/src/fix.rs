//! GNSS fix with per-field validity.
//!
//! Receivers report different subsets of a fix in different sentences.
//! Every field has its own bit in [`Valid`]; [`Fix::merge`] folds one
//! sentence's report into the interval's fix, replacing only the fields the
//! report marks valid.

use std::fmt;

use bitflags::bitflags;
use heapless::Vec as SkyVec;

use crate::time::{Date, Time};

/// Kilometres per nautical mile.
pub const KM_PER_NMI: f64 = 1.852;
/// Statute miles per nautical mile.
pub const MI_PER_NMI: f64 = 1.150_779;
/// Satellites kept in the sky table of one interval.
pub const MAX_SATELLITES: usize = 20;
/// Upper bound of the GST error fields, in centimetres (200 m).
pub const MAX_ERROR_CM: u16 = 20_000;

/// Fix quality, ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Status {
    /// No fix.
    #[default]
    None,
    /// Dead reckoning.
    Est,
    /// Time only.
    TimeOnly,
    /// Standard 2D/3D fix.
    Std,
    /// Differential fix.
    Dgps,
    /// RTK float.
    RtkFloat,
    /// RTK fixed.
    RtkFixed,
    /// Precise Positioning Service.
    Pps,
}

impl Status {
    /// Short label for displays.
    pub const fn label(self) -> &'static str {
        match self {
            Status::None => "NONE",
            Status::Est => "EST",
            Status::TimeOnly => "TIME",
            Status::Std => "STD",
            Status::Dgps => "DGPS",
            Status::RtkFloat => "RTKf",
            Status::RtkFixed => "RTK",
            Status::Pps => "PPS",
        }
    }

    /// Whether a position is available.
    pub const fn has_position(self) -> bool {
        !matches!(self, Status::None | Status::TimeOnly)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

bitflags! {
    /// Which fields of a [`Fix`] hold reported values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Valid: u16 {
        /// Fix quality.
        const STATUS = 1 << 0;
        /// UTC date.
        const DATE = 1 << 1;
        /// UTC time.
        const TIME = 1 << 2;
        /// Latitude and longitude.
        const LOCATION = 1 << 3;
        /// Altitude above MSL.
        const ALTITUDE = 1 << 4;
        /// Speed over ground.
        const SPEED = 1 << 5;
        /// Course over ground.
        const HEADING = 1 << 6;
        /// Satellites used.
        const SATELLITES = 1 << 7;
        /// Horizontal DOP.
        const HDOP = 1 << 8;
        /// Vertical DOP.
        const VDOP = 1 << 9;
        /// Position DOP.
        const PDOP = 1 << 10;
        /// Latitude error.
        const LAT_ERR = 1 << 11;
        /// Longitude error.
        const LON_ERR = 1 << 12;
        /// Altitude error.
        const ALT_ERR = 1 << 13;
        /// Geoid separation.
        const GEOID_HEIGHT = 1 << 14;
        /// Sky table from GSV.
        const SKY = 1 << 15;
    }
}

/// One satellite of the GSV sky table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Satellite {
    /// PRN.
    pub id: u8,
    /// Degrees above the horizon.
    pub elevation: u8,
    /// Degrees from true north.
    pub azimuth: u16,
    /// dB-Hz.
    pub snr: u8,
    /// An SNR was reported.
    pub tracked: bool,
}

/// Position, time and velocity snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Fix {
    /// Fix quality.
    pub status: Status,
    /// UTC date.
    pub date: Date,
    /// UTC time of day.
    pub time: Time,
    /// Degrees × 10⁷, north positive.
    pub latitude_e7: i32,
    /// Degrees × 10⁷, east positive.
    pub longitude_e7: i32,
    /// Above mean sea level, centimetres.
    pub altitude_cm: i32,
    /// Geoid separation, centimetres.
    pub geoid_height_cm: i32,
    /// Course over ground, centidegrees.
    pub heading_cd: u16,
    /// Speed over ground, thousandths of a knot.
    pub speed_mkn: u32,
    /// HDOP × 1000.
    pub hdop: u16,
    /// VDOP × 1000.
    pub vdop: u16,
    /// PDOP × 1000.
    pub pdop: u16,
    /// Latitude error, centimetres.
    pub lat_err_cm: u16,
    /// Longitude error, centimetres.
    pub lon_err_cm: u16,
    /// Altitude error, centimetres.
    pub alt_err_cm: u16,
    /// Satellites used for the fix.
    pub satellites: u8,
    /// Satellites in view.
    pub sky: SkyVec<Satellite, MAX_SATELLITES>,
    /// Fields holding reported values.
    pub valid: Valid,
}

impl Fix {
    /// Fold `other` into `self`.
    ///
    /// Valid fields of `other` replace ours; the status keeps the better of
    /// the two; sky entries accumulate up to [`MAX_SATELLITES`]. Validity
    /// bits are ORed.
    pub fn merge(&mut self, other: &Fix) {
        let v = other.valid;
        if v.contains(Valid::STATUS)
            && (!self.valid.contains(Valid::STATUS) || self.status < other.status)
        {
            self.status = other.status;
        }
        if v.contains(Valid::DATE) {
            self.date = other.date;
        }
        if v.contains(Valid::TIME) {
            self.time = other.time;
        }
        if v.contains(Valid::LOCATION) {
            self.latitude_e7 = other.latitude_e7;
            self.longitude_e7 = other.longitude_e7;
        }
        if v.contains(Valid::ALTITUDE) {
            self.altitude_cm = other.altitude_cm;
        }
        if v.contains(Valid::GEOID_HEIGHT) {
            self.geoid_height_cm = other.geoid_height_cm;
        }
        if v.contains(Valid::HEADING) {
            self.heading_cd = other.heading_cd;
        }
        if v.contains(Valid::SPEED) {
            self.speed_mkn = other.speed_mkn;
        }
        if v.contains(Valid::HDOP) {
            self.hdop = other.hdop;
        }
        if v.contains(Valid::VDOP) {
            self.vdop = other.vdop;
        }
        if v.contains(Valid::PDOP) {
            self.pdop = other.pdop;
        }
        if v.contains(Valid::LAT_ERR) {
            self.lat_err_cm = other.lat_err_cm;
        }
        if v.contains(Valid::LON_ERR) {
            self.lon_err_cm = other.lon_err_cm;
        }
        if v.contains(Valid::ALT_ERR) {
            self.alt_err_cm = other.alt_err_cm;
        }
        if v.contains(Valid::SATELLITES) {
            self.satellites = other.satellites;
        }
        if v.contains(Valid::SKY) {
            for sat in &other.sky {
                if self.sky.push(*sat).is_err() {
                    break;
                }
            }
        }
        self.valid |= v;
    }

    /// Whether every bit of `fields` is set.
    pub fn has(&self, fields: Valid) -> bool {
        self.valid.contains(fields)
    }

    /// Latitude in degrees.
    pub fn latitude_deg(&self) -> f64 {
        self.latitude_e7 as f64 * 1e-7
    }

    /// Longitude in degrees.
    pub fn longitude_deg(&self) -> f64 {
        self.longitude_e7 as f64 * 1e-7
    }

    /// Altitude in metres.
    pub fn altitude_m(&self) -> f64 {
        self.altitude_cm as f64 / 100.0
    }

    /// Speed in knots.
    pub fn speed_knots(&self) -> f64 {
        self.speed_mkn as f64 / 1000.0
    }

    /// Speed in km/h.
    pub fn speed_kph(&self) -> f64 {
        self.speed_knots() * KM_PER_NMI
    }

    /// Speed in mph.
    pub fn speed_mph(&self) -> f64 {
        self.speed_knots() * MI_PER_NMI
    }

    /// Heading in degrees.
    pub fn heading_deg(&self) -> f64 {
        self.heading_cd as f64 / 100.0
    }

    /// HDOP as a plain number.
    pub fn hdop_value(&self) -> f64 {
        self.hdop as f64 / 1000.0
    }

    /// Satellites of the sky table with an SNR.
    pub fn tracked(&self) -> usize {
        self.sky.iter().filter(|s| s.tracked).count()
    }
}
