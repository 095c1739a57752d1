//! Version colors: parsing of color strings and the version → color mapping.

use plotters::style::RGBColor;

use pdv_core::{PdvError, PdvResult};

/// Default color cycle, used for versions configured without a color.
pub const TAB10: [&str; 10] = [
    "tab:blue",
    "tab:orange",
    "tab:green",
    "tab:red",
    "tab:purple",
    "tab:brown",
    "tab:pink",
    "tab:gray",
    "tab:olive",
    "tab:cyan",
];

const NAMED: &[(&str, u32)] = &[
    ("tab:blue", 0x1f77b4),
    ("tab:orange", 0xff7f0e),
    ("tab:green", 0x2ca02c),
    ("tab:red", 0xd62728),
    ("tab:purple", 0x9467bd),
    ("tab:brown", 0x8c564b),
    ("tab:pink", 0xe377c2),
    ("tab:gray", 0x7f7f7f),
    ("tab:grey", 0x7f7f7f),
    ("tab:olive", 0xbcbd22),
    ("tab:cyan", 0x17becf),
    ("black", 0x000000),
    ("white", 0xffffff),
    ("red", 0xff0000),
    ("green", 0x008000),
    ("blue", 0x0000ff),
    ("orange", 0xffa500),
    ("purple", 0x800080),
    ("gray", 0x808080),
    ("grey", 0x808080),
    ("brown", 0xa52a2a),
    ("pink", 0xffc0cb),
    ("olive", 0x808000),
    ("cyan", 0x00ffff),
    ("magenta", 0xff00ff),
    ("yellow", 0xffff00),
    ("navy", 0x000080),
    ("teal", 0x008080),
    ("gold", 0xffd700),
    ("crimson", 0xdc143c),
    ("firebrick", 0xb22222),
    ("royalblue", 0x4169e1),
    ("darkgreen", 0x006400),
    ("skyblue", 0x87ceeb),
];

fn rgb(value: u32) -> RGBColor {
    RGBColor((value >> 16) as u8, (value >> 8) as u8, value as u8)
}

/// Parses `#rrggbb`, `#rgb`, a `tab:` palette name or a basic color name.
pub fn parse_color(spec: &str) -> PdvResult<RGBColor> {
    let trimmed = spec.trim();
    if let Some(hex) = trimmed.strip_prefix('#') {
        let expanded: String = match hex.len() {
            3 => hex.chars().flat_map(|c| [c, c]).collect(),
            6 => hex.to_string(),
            _ => String::new(),
        };
        return u32::from_str_radix(&expanded, 16)
            .map(rgb)
            .map_err(|_| PdvError::Config(format!("invalid hex color '{spec}'")));
    }
    let lower = trimmed.to_ascii_lowercase();
    NAMED
        .iter()
        .find(|(name, _)| *name == lower)
        .map(|(_, value)| rgb(*value))
        .ok_or_else(|| PdvError::Config(format!("unknown color '{spec}'")))
}

/// Ordered version name → color mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColorAssignment {
    colors: Vec<(String, RGBColor)>,
}

impl ColorAssignment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the mapping from `(version, color string)` pairs. A version without
    /// a color takes the default cycle entry for its position.
    pub fn from_specs<I, S, C>(specs: I) -> PdvResult<Self>
    where
        I: IntoIterator<Item = (S, Option<C>)>,
        S: Into<String>,
        C: AsRef<str>,
    {
        let mut assignment = Self::new();
        for (position, (version, spec)) in specs.into_iter().enumerate() {
            let version = version.into();
            let color = match spec {
                Some(spec) => parse_color(spec.as_ref())
                    .map_err(|err| PdvError::Config(format!("version '{version}': {err}")))?,
                None => parse_color(TAB10[position % TAB10.len()])?,
            };
            assignment.insert(version, color)?;
        }
        Ok(assignment)
    }

    pub fn insert(&mut self, version: impl Into<String>, color: RGBColor) -> PdvResult<()> {
        let version = version.into();
        if self.get(&version).is_some() {
            return Err(PdvError::Config(format!("version '{version}' has two colors")));
        }
        self.colors.push((version, color));
        Ok(())
    }

    pub fn get(&self, version: &str) -> Option<RGBColor> {
        self.colors
            .iter()
            .find(|(name, _)| name == version)
            .map(|(_, color)| *color)
    }

    pub fn color_for(&self, version: &str) -> PdvResult<RGBColor> {
        self.get(version)
            .ok_or_else(|| PdvError::Config(format!("no color assigned to version '{version}'")))
    }

    /// Every listed version must have a color.
    pub fn check_versions<'a, I>(&self, versions: I) -> PdvResult<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let missing: Vec<&str> = versions.into_iter().filter(|v| self.get(v).is_none()).collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(PdvError::Config(format!(
                "no color assigned to version(s): {}",
                missing.join(", ")
            )))
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }
}
