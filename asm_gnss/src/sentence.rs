//! Recognised NMEA sentence tags.

use std::fmt;

/// Standard sentences understood by the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Sentence {
    /// Fix data.
    Gga,
    /// Geographic position.
    Gll,
    /// DOP and active satellites.
    Gsa,
    /// Pseudorange error statistics.
    Gst,
    /// Satellites in view.
    Gsv,
    /// Recommended minimum data. Last sentence of an interval.
    Rmc,
    /// Course and speed.
    Vtg,
    /// Date and time.
    Zda,
}

/// Sorted by tag for binary search.
const TABLE: [(&str, Sentence); 8] = [
    ("GGA", Sentence::Gga),
    ("GLL", Sentence::Gll),
    ("GSA", Sentence::Gsa),
    ("GST", Sentence::Gst),
    ("GSV", Sentence::Gsv),
    ("RMC", Sentence::Rmc),
    ("VTG", Sentence::Vtg),
    ("ZDA", Sentence::Zda),
];

impl Sentence {
    /// All sentences, in table order.
    pub const ALL: [Sentence; 8] = [
        Sentence::Gga,
        Sentence::Gll,
        Sentence::Gsa,
        Sentence::Gst,
        Sentence::Gsv,
        Sentence::Rmc,
        Sentence::Vtg,
        Sentence::Zda,
    ];

    /// Look up a three-letter tag.
    pub fn from_tag(tag: &str) -> Option<Self> {
        TABLE
            .binary_search_by(|(t, _)| (*t).cmp(tag))
            .ok()
            .map(|i| TABLE[i].1)
    }

    /// Three-letter tag.
    pub const fn tag(self) -> &'static str {
        match self {
            Sentence::Gga => "GGA",
            Sentence::Gll => "GLL",
            Sentence::Gsa => "GSA",
            Sentence::Gst => "GST",
            Sentence::Gsv => "GSV",
            Sentence::Rmc => "RMC",
            Sentence::Vtg => "VTG",
            Sentence::Zda => "ZDA",
        }
    }

    /// Whether this sentence closes the fix interval.
    pub const fn ends_interval(self) -> bool {
        matches!(self, Sentence::Rmc)
    }
}

impl fmt::Display for Sentence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}
