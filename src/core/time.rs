//! Time codes for attribute value resolution.

use std::fmt;

/// Time at which attribute values are resolved.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TimeCode {
    /// The authored default value, ignoring time samples.
    #[default]
    Default,
    /// A numeric time; resolves time samples with held interpolation.
    At(f64),
}

impl TimeCode {
    /// Check if this is the default time code.
    pub fn is_default(self) -> bool {
        matches!(self, Self::Default)
    }
}

impl From<f64> for TimeCode {
    fn from(time: f64) -> Self {
        Self::At(time)
    }
}

impl From<Option<f64>> for TimeCode {
    fn from(time: Option<f64>) -> Self {
        time.map_or(Self::Default, Self::At)
    }
}

impl fmt::Display for TimeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("DEFAULT"),
            Self::At(t) => write!(f, "{t}"),
        }
    }
}
