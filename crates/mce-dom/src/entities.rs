//! HTML entity decoding and policy-driven encoding.
//!
//! Decoding understands named entities from the table below plus decimal
//! and hexadecimal character references; anything else is left as-is.
//! Encoding always escapes the markup-significant characters and then
//! applies an [`EntityEncoding`] policy to everything else.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use std::sync::LazyLock;

use regex::Regex;

/// Regex pattern for matching named and numeric character references.
static ENTITY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z][a-zA-Z0-9]*);").expect("invalid entity regex")
});

/// Named entities and the characters they stand for.
const NAMED_ENTITIES: &[(&str, char)] = &[
    // Markup
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
    // Common entities
    ("nbsp", '\u{00a0}'),
    ("shy", '\u{00ad}'),
    ("mdash", '\u{2014}'),
    ("ndash", '\u{2013}'),
    ("ldquo", '\u{201c}'),
    ("rdquo", '\u{201d}'),
    ("lsquo", '\u{2018}'),
    ("rsquo", '\u{2019}'),
    ("bdquo", '\u{201e}'),
    ("sbquo", '\u{201a}'),
    ("bull", '\u{2022}'),
    ("hellip", '\u{2026}'),
    // Arrows
    ("rarr", '\u{2192}'),
    ("larr", '\u{2190}'),
    ("harr", '\u{2194}'),
    ("uarr", '\u{2191}'),
    ("darr", '\u{2193}'),
    // Math symbols
    ("le", '\u{2264}'),
    ("ge", '\u{2265}'),
    ("ne", '\u{2260}'),
    ("plusmn", '\u{00b1}'),
    ("times", '\u{00d7}'),
    ("divide", '\u{00f7}'),
    ("minus", '\u{2212}'),
    // Legal symbols
    ("copy", '\u{00a9}'),
    ("reg", '\u{00ae}'),
    ("trade", '\u{2122}'),
    // Currency
    ("euro", '\u{20ac}'),
    ("pound", '\u{00a3}'),
    ("yen", '\u{00a5}'),
    ("cent", '\u{00a2}'),
    ("curren", '\u{00a4}'),
    // Misc symbols
    ("deg", '\u{00b0}'),
    ("para", '\u{00b6}'),
    ("sect", '\u{00a7}'),
    ("dagger", '\u{2020}'),
    ("Dagger", '\u{2021}'),
    ("laquo", '\u{00ab}'),
    ("raquo", '\u{00bb}'),
    ("iexcl", '\u{00a1}'),
    ("iquest", '\u{00bf}'),
    ("brvbar", '\u{00a6}'),
    ("uml", '\u{00a8}'),
    ("not", '\u{00ac}'),
    ("macr", '\u{00af}'),
    // Fractions
    ("frac14", '\u{00bc}'),
    ("frac12", '\u{00bd}'),
    ("frac34", '\u{00be}'),
    // Superscripts
    ("sup1", '\u{00b9}'),
    ("sup2", '\u{00b2}'),
    ("sup3", '\u{00b3}'),
    // Accented letters
    ("Agrave", '\u{00c0}'),
    ("Aacute", '\u{00c1}'),
    ("Auml", '\u{00c4}'),
    ("Aring", '\u{00c5}'),
    ("AElig", '\u{00c6}'),
    ("Ccedil", '\u{00c7}'),
    ("Eacute", '\u{00c9}'),
    ("Ntilde", '\u{00d1}'),
    ("Ouml", '\u{00d6}'),
    ("Oslash", '\u{00d8}'),
    ("Uuml", '\u{00dc}'),
    ("szlig", '\u{00df}'),
    ("agrave", '\u{00e0}'),
    ("aacute", '\u{00e1}'),
    ("auml", '\u{00e4}'),
    ("aring", '\u{00e5}'),
    ("aelig", '\u{00e6}'),
    ("ccedil", '\u{00e7}'),
    ("egrave", '\u{00e8}'),
    ("eacute", '\u{00e9}'),
    ("ntilde", '\u{00f1}'),
    ("ouml", '\u{00f6}'),
    ("oslash", '\u{00f8}'),
    ("uuml", '\u{00fc}'),
    // Other
    ("acute", '\u{00b4}'),
    ("micro", '\u{00b5}'),
    ("middot", '\u{00b7}'),
    ("cedil", '\u{00b8}'),
    ("ordf", '\u{00aa}'),
    ("ordm", '\u{00ba}'),
];

static NAME_TO_CHAR: LazyLock<HashMap<&'static str, char>> =
    LazyLock::new(|| NAMED_ENTITIES.iter().copied().collect());

static CHAR_TO_NAME: LazyLock<HashMap<char, &'static str>> = LazyLock::new(|| {
    NAMED_ENTITIES
        .iter()
        .map(|&(name, ch)| (ch, name))
        .collect()
});

/// How characters outside the markup-significant set are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum EntityEncoding {
    /// Only `& < >` (and `"` in attributes) are escaped.
    #[serde(rename = "raw")]
    Raw,
    /// Characters with a named entity are written by name.
    #[default]
    #[serde(rename = "named")]
    Named,
    /// Characters above ASCII are written as decimal references.
    #[serde(rename = "numeric")]
    Numeric,
    /// Named where a name exists, numeric otherwise.
    #[serde(rename = "named+numeric", alias = "named,numeric")]
    NamedNumeric,
}

impl EntityEncoding {
    /// Configuration spelling of the policy.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Named => "named",
            Self::Numeric => "numeric",
            Self::NamedNumeric => "named+numeric",
        }
    }
}

impl fmt::Display for EntityEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raw" => Ok(Self::Raw),
            "named" => Ok(Self::Named),
            "numeric" => Ok(Self::Numeric),
            "named+numeric" | "named,numeric" => Ok(Self::NamedNumeric),
            other => Err(format!("unknown entity encoding: {other}")),
        }
    }
}

/// Decode named and numeric character references.
///
/// Unknown names and invalid code points are preserved verbatim.
pub fn decode(text: &str) -> String {
    if !text.contains('&') {
        return text.to_owned();
    }
    ENTITY_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            entity_to_char(&caps[1]).map_or_else(|| caps[0].to_owned(), String::from)
        })
        .into_owned()
}

fn entity_to_char(entity: &str) -> Option<char> {
    if let Some(number) = entity.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code);
    }
    NAME_TO_CHAR.get(entity).copied()
}

/// Encode text content under the given policy.
pub fn encode_text(text: &str, encoding: EntityEncoding) -> String {
    encode(text, encoding, false)
}

/// Encode an attribute value under the given policy. Double quotes are always escaped.
pub fn encode_attribute(value: &str, encoding: EntityEncoding) -> String {
    encode(value, encoding, true)
}

fn encode(text: &str, encoding: EntityEncoding, in_attribute: bool) -> String {
    let mut result = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' if in_attribute => result.push_str("&quot;"),
            '"' | '\'' => result.push(ch),
            _ => push_encoded(&mut result, ch, encoding),
        }
    }
    result
}

fn push_encoded(out: &mut String, ch: char, encoding: EntityEncoding) {
    let named = || CHAR_TO_NAME.get(&ch).copied();
    let numeric = ch > '\u{7e}';

    match encoding {
        EntityEncoding::Raw => out.push(ch),
        EntityEncoding::Named => match named() {
            Some(name) => push_named(out, name),
            None => out.push(ch),
        },
        EntityEncoding::Numeric if numeric => push_numeric(out, ch),
        EntityEncoding::NamedNumeric => match named() {
            Some(name) => push_named(out, name),
            None if numeric => push_numeric(out, ch),
            None => out.push(ch),
        },
        EntityEncoding::Numeric => out.push(ch),
    }
}

fn push_named(out: &mut String, name: &str) {
    out.push('&');
    out.push_str(name);
    out.push(';');
}

fn push_numeric(out: &mut String, ch: char) {
    out.push_str("&#");
    out.push_str(&u32::from(ch).to_string());
    out.push(';');
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_named_and_numeric() {
        assert_eq!(decode("a&nbsp;b"), "a\u{00a0}b");
        assert_eq!(decode("&#169; &#xA9;"), "\u{00a9} \u{00a9}");
        assert_eq!(decode("&lt;p&gt; &amp;amp;"), "<p> &amp;");
    }

    #[test]
    fn test_decode_preserves_unknown() {
        assert_eq!(decode("&unknown; & &#xZZ;"), "&unknown; & &#xZZ;");
    }

    #[test]
    fn test_encode_raw_only_escapes_markup() {
        assert_eq!(
            encode_text("a < b & \u{00a0}\"", EntityEncoding::Raw),
            "a &lt; b &amp; \u{00a0}\""
        );
        assert_eq!(encode_attribute("say \"hi\"", EntityEncoding::Raw), "say &quot;hi&quot;");
    }

    #[test]
    fn test_encode_named() {
        assert_eq!(
            encode_text("\u{00a0}\u{00e9}\u{4e2d}", EntityEncoding::Named),
            "&nbsp;&eacute;\u{4e2d}"
        );
    }

    #[test]
    fn test_encode_numeric() {
        assert_eq!(
            encode_text("\u{00a0}x\u{4e2d}", EntityEncoding::Numeric),
            "&#160;x&#20013;"
        );
    }

    #[test]
    fn test_encode_named_numeric() {
        assert_eq!(
            encode_text("\u{00a0}\u{4e2d}", EntityEncoding::NamedNumeric),
            "&nbsp;&#20013;"
        );
    }

    #[test]
    fn test_parse_encoding_names() {
        assert_eq!(
            "named+numeric".parse::<EntityEncoding>(),
            Ok(EntityEncoding::NamedNumeric)
        );
        assert_eq!("RAW".parse::<EntityEncoding>(), Ok(EntityEncoding::Raw));
        assert!("bogus".parse::<EntityEncoding>().is_err());
        assert_eq!(EntityEncoding::default().to_string(), "named");
    }
}
