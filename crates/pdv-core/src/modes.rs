//! The three axes of a comparison sweep.
//!
//! Each mode parses from its lowercase name; anything else is a
//! [`PdvError::Config`] naming the rejected string.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PdvError;

/// Output form of a comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    Table,
    Plot,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::Table => "table",
            DisplayMode::Plot => "plot",
        }
    }

    pub fn all() -> &'static [DisplayMode] {
        &[DisplayMode::Table, DisplayMode::Plot]
    }
}

/// Kind of numeric summary applied to a comparison frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatisticsMode {
    Summary,
    Correlation,
}

impl StatisticsMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatisticsMode::Summary => "summary",
            StatisticsMode::Correlation => "correlation",
        }
    }

    pub fn all() -> &'static [StatisticsMode] {
        &[StatisticsMode::Summary, StatisticsMode::Correlation]
    }
}

/// Axis along which metric values are grouped into comparison frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusMode {
    /// Every (sample, entity) cell in one frame.
    All,
    /// One frame per entity, rows are samples.
    Object,
    /// One frame per sample, rows are entities.
    Snapshot,
}

impl FocusMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusMode::All => "all",
            FocusMode::Object => "object",
            FocusMode::Snapshot => "snapshot",
        }
    }

    pub fn all() -> &'static [FocusMode] {
        &[FocusMode::All, FocusMode::Object, FocusMode::Snapshot]
    }
}

macro_rules! mode_str_impls {
    ($ty:ty, $label:literal) => {
        impl FromStr for $ty {
            type Err = PdvError;

            fn from_str(input: &str) -> Result<Self, Self::Err> {
                let wanted = input.trim().to_ascii_lowercase();
                <$ty>::all()
                    .iter()
                    .copied()
                    .find(|mode| mode.as_str() == wanted)
                    .ok_or_else(|| {
                        let supported: Vec<&str> =
                            <$ty>::all().iter().map(|mode| mode.as_str()).collect();
                        PdvError::Config(format!(
                            "unknown {} mode '{}'; supported values: {}",
                            $label,
                            input,
                            supported.join(", ")
                        ))
                    })
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

mode_str_impls!(DisplayMode, "display");
mode_str_impls!(StatisticsMode, "statistics");
mode_str_impls!(FocusMode, "focus");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_supports_every_mode() {
        for mode in DisplayMode::all() {
            assert_eq!(mode.as_str().parse::<DisplayMode>().unwrap(), *mode);
        }
        for mode in StatisticsMode::all() {
            assert_eq!(mode.as_str().parse::<StatisticsMode>().unwrap(), *mode);
        }
        for mode in FocusMode::all() {
            assert_eq!(mode.as_str().parse::<FocusMode>().unwrap(), *mode);
        }
        assert_eq!("Summary".parse::<StatisticsMode>().unwrap(), StatisticsMode::Summary);
    }

    #[test]
    fn unknown_statistics_mode_is_a_config_error() {
        let err = "median".parse::<StatisticsMode>().unwrap_err();
        assert!(matches!(err, PdvError::Config(_)));
        let message = err.to_string();
        assert!(message.contains("'median'"));
        assert!(message.contains("summary, correlation"));
    }

    #[test]
    fn unknown_focus_mode_names_the_axis() {
        let err = "entity".parse::<FocusMode>().unwrap_err();
        assert!(err.to_string().contains("unknown focus mode 'entity'"));
    }
}
