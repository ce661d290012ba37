//! Inline style attribute codec.

use std::fmt::Write;
use std::sync::LazyLock;

use regex::Regex;

static RGB_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)rgb\s*\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*\)")
        .expect("invalid rgb regex")
});

/// Parse a `style` attribute into ordered `(property, value)` pairs.
///
/// Property names are lowercased, `rgb()` colors are converted to hex and
/// declarations with an empty name or value are dropped. Later
/// declarations of the same property replace earlier ones in place.
pub fn parse_style(css: &str) -> Vec<(String, String)> {
    let mut declarations: Vec<(String, String)> = Vec::new();

    for declaration in split_declarations(css) {
        let Some((name, value)) = declaration.split_once(':') else {
            continue;
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        if name.is_empty() || value.is_empty() {
            continue;
        }
        let value = rgb_to_hex(value);

        if let Some(entry) = declarations.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value;
        } else {
            declarations.push((name, value));
        }
    }
    declarations
}

/// Serialize declarations as `name: value;` separated by single spaces.
pub fn serialize_style(declarations: &[(String, String)]) -> String {
    let mut out = String::new();
    for (name, value) in declarations {
        if !out.is_empty() {
            out.push(' ');
        }
        let _ = write!(out, "{name}: {value};");
    }
    out
}

/// Normalize a style string: parse then serialize.
pub fn normalize_style(css: &str) -> String {
    serialize_style(&parse_style(css))
}

/// Split on `;` outside of quotes and parentheses.
fn split_declarations(css: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in css.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&css[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&css[start..]);
    parts
}

fn rgb_to_hex(value: &str) -> String {
    RGB_PATTERN
        .replace_all(value, |caps: &regex::Captures| {
            let mut hex = String::from("#");
            for index in 1..=3 {
                let component: u8 = caps[index].parse().unwrap_or(u8::MAX);
                let _ = write!(hex, "{component:02x}");
            }
            hex
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_normalize_lowercases_and_formats() {
        assert_eq!(
            normalize_style("COLOR:red;font-size : 12px"),
            "color: red; font-size: 12px;"
        );
    }

    #[test]
    fn test_rgb_converted_to_hex() {
        assert_eq!(
            normalize_style("color: rgb(255, 0, 16)"),
            "color: #ff0010;"
        );
    }

    #[test]
    fn test_empty_declarations_dropped() {
        assert_eq!(normalize_style(";;color:;  :red; "), "");
    }

    #[test]
    fn test_semicolons_inside_urls_kept() {
        assert_eq!(
            normalize_style("background: url('a;b.png'); color: red"),
            "background: url('a;b.png'); color: red;"
        );
    }

    #[test]
    fn test_duplicate_property_replaced_in_place() {
        assert_eq!(
            parse_style("color: red; margin: 0; color: blue"),
            vec![
                ("color".to_owned(), "blue".to_owned()),
                ("margin".to_owned(), "0".to_owned()),
            ]
        );
    }
}
