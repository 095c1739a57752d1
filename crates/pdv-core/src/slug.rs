//! Filesystem-safe names for report and plot artifacts.

/// Lowercase ASCII slug: characters other than letters, digits, `_`, `-` and
/// whitespace are dropped, runs of whitespace and `-` collapse into one `-`,
/// and leading/trailing `-`/`_` are trimmed. Accented Latin letters are
/// spelled without their accents; other non-ASCII characters are dropped.
///
/// Returns `"unnamed"` when nothing survives, so callers always get a usable
/// file stem. Distinct names may still share a slug.
pub fn slugify(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_dash = false;
    let mut buf = [0u8; 4];
    for ch in name.chars() {
        let spelled = if ch.is_ascii() { &*ch.encode_utf8(&mut buf) } else { fold_latin(ch).unwrap_or("") };
        for ch in spelled.chars() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                if pending_dash {
                    out.push('-');
                    pending_dash = false;
                }
                out.push(ch.to_ascii_lowercase());
            } else if ch == '-' || ch.is_ascii_whitespace() {
                pending_dash = true;
            }
        }
    }
    let slug = out.trim_matches(|c| c == '-' || c == '_');
    if slug.is_empty() {
        "unnamed".to_string()
    } else {
        slug.to_string()
    }
}

fn fold_latin(ch: char) -> Option<&'static str> {
    let ascii = match ch {
        'À'..='Å' | 'à'..='å' => "a",
        'Æ' | 'æ' => "ae",
        'Ç' | 'ç' => "c",
        'È'..='Ë' | 'è'..='ë' => "e",
        'Ì'..='Ï' | 'ì'..='ï' => "i",
        'Ñ' | 'ñ' => "n",
        'Ò'..='Ö' | 'Ø' | 'ò'..='ö' | 'ø' => "o",
        'Œ' | 'œ' => "oe",
        'Ù'..='Ü' | 'ù'..='ü' => "u",
        'Ý' | 'ý' | 'ÿ' => "y",
        'ß' => "ss",
        _ => return None,
    };
    Some(ascii)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugs_frame_names() {
        assert_eq!(slugify("Bus Voltage (p.u.)"), "bus-voltage-pu");
        assert_eq!(slugify("bus_voltage - s1"), "bus_voltage-s1");
        assert_eq!(slugify("  Line loading  %  "), "line-loading");
        assert_eq!(slugify("_N-1 line_"), "n-1-line");
    }

    #[test]
    fn punctuation_between_words_does_not_split() {
        assert_eq!(slugify("cost/MWh"), "costmwh");
        assert_eq!(slugify("Illicit voltage (eps=-0.05)"), "illicit-voltage-eps-005");
    }

    #[test]
    fn empty_result_falls_back() {
        assert_eq!(slugify("%%%"), "unnamed");
        assert_eq!(slugify("ε"), "unnamed");
    }

    #[test]
    fn accented_letters_keep_their_base_letter() {
        assert_eq!(slugify("Münster Süd"), "munster-sud");
        assert_eq!(slugify("Ærø – Straße"), "aero-strasse");
        assert_ne!(slugify("Bus Müller"), slugify("Bus Mller"));
        assert_eq!(slugify("Δ tension"), "tension");
    }
}
