//! Protection of markup fragments that must survive parsing untouched.
//!
//! Each protected fragment is replaced by a `<!--mce:protected ...-->`
//! comment carrying the percent-encoded original; the serializer's
//! comment filter turns it back into raw output.

use std::borrow::Cow;

use percent_encoding::{NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use regex::Regex;

/// Comment prefix marking a protected fragment.
pub const PROTECTED_PREFIX: &str = "mce:protected ";

/// Replace every match of `patterns` with a protected comment.
pub fn protect(html: &str, patterns: &[Regex]) -> String {
    let mut result = Cow::Borrowed(html);
    for pattern in patterns {
        let replaced = pattern
            .replace_all(&result, |caps: &regex::Captures| protected_comment(&caps[0]))
            .into_owned();
        result = Cow::Owned(replaced);
    }
    result.into_owned()
}

/// Build the protected comment for one fragment.
pub fn protected_comment(fragment: &str) -> String {
    format!(
        "<!--{PROTECTED_PREFIX}{}-->",
        utf8_percent_encode(fragment, NON_ALPHANUMERIC)
    )
}

/// Decode the payload of a protected comment body, if it is one.
pub fn unprotect(comment: &str) -> Option<String> {
    let payload = comment.strip_prefix(PROTECTED_PREFIX)?;
    Some(percent_decode_str(payload).decode_utf8_lossy().into_owned())
}
