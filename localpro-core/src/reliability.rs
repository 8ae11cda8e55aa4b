//! Three-class provider reliability labels.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reliability class assigned to a provider.
///
/// The discriminants double as class indices in model outputs.
///
/// # Examples
/// ```
/// use localpro_core::ReliabilityLabel;
///
/// let label: ReliabilityLabel = "Highly Reliable".parse().unwrap();
/// assert_eq!(label, ReliabilityLabel::High);
/// assert_eq!(label.index(), 2);
/// assert_eq!(ReliabilityLabel::Low.to_string(), "Low Reliability");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "&'static str")
)]
pub enum ReliabilityLabel {
    /// Frequently late, unfinished, or poorly rated work.
    Low = 0,
    /// Generally dependable with some shortfalls.
    Moderate = 1,
    /// Consistently strong ratings, completion, and responsiveness.
    High = 2,
}

/// Error returned when a string does not name a reliability label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown reliability label '{0}'")]
pub struct UnknownLabelError(pub String);

impl ReliabilityLabel {
    /// Number of classes in the label space.
    pub const COUNT: usize = 3;

    /// All labels in class-index order.
    pub const ALL: [Self; Self::COUNT] = [Self::Low, Self::Moderate, Self::High];

    /// Class index used by model outputs.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Label for a class index, if in range.
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::Low),
            1 => Some(Self::Moderate),
            2 => Some(Self::High),
            _ => None,
        }
    }

    /// Human-readable name used in marketplace responses.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Low => "Low Reliability",
            Self::Moderate => "Moderately Reliable",
            Self::High => "Highly Reliable",
        }
    }
}

impl fmt::Display for ReliabilityLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for ReliabilityLabel {
    type Err = UnknownLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" | "low reliability" | "0" => Ok(Self::Low),
            "moderate" | "moderately reliable" | "1" => Ok(Self::Moderate),
            "high" | "highly reliable" | "2" => Ok(Self::High),
            _ => Err(UnknownLabelError(s.to_owned())),
        }
    }
}

impl TryFrom<String> for ReliabilityLabel {
    type Error = UnknownLabelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ReliabilityLabel> for &'static str {
    fn from(label: ReliabilityLabel) -> Self {
        label.display_name()
    }
}
