use std::fmt;

/// Label names recognized as estimates and their values
///
/// `0` is an estimate like any other: a `0` label in a range counts as an
/// estimate for that range and is not skipped in favor of a later label.
const ESTIMATE_LABELS: [(&str, f64); 11] = [
    ("0", 0.0),
    ("½", 0.5),
    ("1", 1.0),
    ("2", 2.0),
    ("3", 3.0),
    ("5", 5.0),
    ("8", 8.0),
    ("13", 13.0),
    ("25", 25.0),
    ("50", 50.0),
    ("100", 100.0),
];

/// A pokered estimate taken from an estimate label
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Estimate(f64);

impl Estimate {
    /// Looks up the estimate carried by a label name, `None` for any other label
    pub fn from_label(name: &str) -> Option<Self> {
        ESTIMATE_LABELS
            .iter()
            .find(|(label, _)| *label == name.trim())
            .map(|(_, value)| Estimate(*value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Estimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0.5 {
            write!(f, "½")
        } else if self.0.fract() == 0.0 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}
