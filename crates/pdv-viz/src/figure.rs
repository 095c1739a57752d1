use std::fmt;
use std::str::FromStr;

use plotters::style::{RGBColor, BLACK, WHITE};
use serde::{Deserialize, Serialize};

use pdv_core::{PdvError, PdvResult};

/// Output image format, taken from the configured file extension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ImageFormat {
    #[default]
    Svg,
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Svg => "svg",
            ImageFormat::Png => "png",
        }
    }
}

impl FromStr for ImageFormat {
    type Err = PdvError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim().trim_start_matches('.').to_ascii_lowercase();
        match wanted.as_str() {
            "svg" => Ok(ImageFormat::Svg),
            "png" => Ok(ImageFormat::Png),
            _ => Err(PdvError::Config(format!(
                "unsupported image extension '{input}'; supported values: svg, png"
            ))),
        }
    }
}

impl TryFrom<String> for ImageFormat {
    type Error = PdvError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ImageFormat> for String {
    fn from(format: ImageFormat) -> Self {
        format.extension().to_string()
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Figure size in inches, dark background flag and image format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FigureSettings {
    pub figsize: (f64, f64),
    pub night_mode: bool,
    pub extension: ImageFormat,
}

impl Default for FigureSettings {
    fn default() -> Self {
        Self {
            figsize: (6.4, 4.8),
            night_mode: false,
            extension: ImageFormat::Svg,
        }
    }
}

const PIXELS_PER_INCH: f64 = 100.0;

impl FigureSettings {
    pub fn validate(&self) -> PdvResult<()> {
        let (width, height) = self.figsize;
        let valid = |v: f64| v.is_finite() && v > 0.0 && v * PIXELS_PER_INCH <= u32::MAX as f64;
        if valid(width) && valid(height) {
            Ok(())
        } else {
            Err(PdvError::Config(format!(
                "figure size must be two positive numbers of inches, got [{width}, {height}]"
            )))
        }
    }

    pub fn pixel_size(&self) -> (u32, u32) {
        let (width, height) = self.figsize;
        (
            (width * PIXELS_PER_INCH).round().max(1.0) as u32,
            (height * PIXELS_PER_INCH).round().max(1.0) as u32,
        )
    }

    pub fn theme(&self) -> Theme {
        if self.night_mode {
            Theme {
                background: BLACK,
                foreground: WHITE,
                scatter: RGBColor(0xb2, 0x22, 0x22),
            }
        } else {
            Theme {
                background: WHITE,
                foreground: BLACK,
                scatter: RGBColor(0x41, 0x69, 0xe1),
            }
        }
    }
}

/// Colors that do not depend on the version being drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: RGBColor,
    pub foreground: RGBColor,
    /// Marker color of scatter-matrix points.
    pub scatter: RGBColor,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_missing_fields() {
        let settings: FigureSettings = serde_json::from_str(r#"{"night_mode": true}"#).unwrap();
        assert_eq!(settings.figsize, (6.4, 4.8));
        assert_eq!(settings.extension, ImageFormat::Svg);
        assert_eq!(settings.pixel_size(), (640, 480));
        assert_eq!(settings.theme().background, BLACK);
    }

    #[test]
    fn extension_accepts_a_leading_dot() {
        let settings: FigureSettings =
            serde_json::from_str(r#"{"figsize": [3, 2], "extension": ".PNG"}"#).unwrap();
        assert_eq!(settings.extension, ImageFormat::Png);
        assert_eq!(settings.pixel_size(), (300, 200));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let err = serde_json::from_str::<FigureSettings>(r#"{"extension": "pdf"}"#).unwrap_err();
        assert!(err.to_string().contains("'pdf'"));
        assert!(matches!("jpg".parse::<ImageFormat>(), Err(PdvError::Config(_))));
    }

    #[test]
    fn unknown_keys_and_bad_sizes_are_rejected() {
        assert!(serde_json::from_str::<FigureSettings>(r#"{"dpi": 300}"#).is_err());
        let settings = FigureSettings {
            figsize: (0.0, 4.0),
            ..FigureSettings::default()
        };
        assert!(settings.validate().is_err());
    }
}
