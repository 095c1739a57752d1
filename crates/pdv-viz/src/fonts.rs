//! Typeface used for every caption, label and annotation.
//!
//! The DejaVu Sans face ships inside the crate and is handed to plotters'
//! glyph renderer, so both backends draw text without system font libraries.

use std::sync::OnceLock;

use plotters::style::{register_font, FontStyle};

use pdv_core::{PdvError, PdvResult};

/// Family name the plot styles ask for.
pub const FONT_FAMILY: &str = "sans-serif";

static DEJAVU_SANS: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

static REGISTERED: OnceLock<Result<(), String>> = OnceLock::new();

/// Registers the bundled face under [`FONT_FAMILY`]. Runs once per process;
/// later calls return the first outcome.
pub fn ensure_fonts() -> PdvResult<()> {
    REGISTERED
        .get_or_init(|| {
            register_font(FONT_FAMILY, FontStyle::Normal, DEJAVU_SANS)
                .map_err(|_| "bundled DejaVu Sans font could not be parsed".to_string())
        })
        .clone()
        .map_err(PdvError::Render)
}

#[cfg(test)]
mod tests {
    use super::*;
    use plotters::prelude::*;

    #[test]
    fn registered_family_lays_out_text() {
        ensure_fonts().unwrap();
        ensure_fonts().unwrap();
        let font = (FONT_FAMILY, 12).into_font();
        let (w, h) = font.box_size("Bus Voltage").unwrap();
        assert!(w > 0 && h > 0);
        let wider = font.box_size("Bus Voltage (p.u.)").unwrap();
        assert!(wider.0 > w);
    }
}
