//! URL rewriting for `src` and `href` attributes.

use mce_config::UrlMode;
use url::Url;

use crate::error::SerializeError;

/// Rewrites URL attribute values during serialization.
pub trait UrlConverter {
    /// Convert `url`, found in attribute `attribute` of element `element`.
    fn convert(&self, url: &str, attribute: &str, element: &str) -> String;
}

impl<F> UrlConverter for F
where
    F: Fn(&str, &str, &str) -> String,
{
    fn convert(&self, url: &str, attribute: &str, element: &str) -> String {
        self(url, attribute, element)
    }
}

/// Converts URLs relative to or absolute against a document base URL.
///
/// Anchors, `mailto:`, `data:`, `javascript:` and `tel:` URLs are never
/// touched, nor are URLs on a different origin in relative mode.
#[derive(Debug, Clone)]
pub struct BaseUrlConverter {
    base: Url,
    mode: UrlMode,
}

impl BaseUrlConverter {
    /// Create a converter for the given base URL.
    ///
    /// # Errors
    ///
    /// Returns `SerializeError::InvalidBaseUrl` if `base` is not an absolute URL.
    pub fn new(base: &str, mode: UrlMode) -> Result<Self, SerializeError> {
        let base = Url::parse(base).map_err(|source| SerializeError::InvalidBaseUrl {
            url: base.to_owned(),
            source,
        })?;
        Ok(Self { base, mode })
    }

    fn absolute(&self, url: &str) -> Option<Url> {
        self.base.join(url).ok()
    }
}

impl UrlConverter for BaseUrlConverter {
    fn convert(&self, url: &str, _attribute: &str, _element: &str) -> String {
        if is_opaque(url) {
            return url.to_owned();
        }

        match self.mode {
            UrlMode::Keep => url.to_owned(),
            UrlMode::Absolute => self
                .absolute(url)
                .map_or_else(|| url.to_owned(), String::from),
            UrlMode::Relative => {
                let Some(absolute) = self.absolute(url) else {
                    return url.to_owned();
                };
                if absolute.origin() != self.base.origin() {
                    return url.to_owned();
                }
                self.base
                    .make_relative(&absolute)
                    .filter(|relative| !relative.is_empty())
                    .unwrap_or_else(|| absolute.path().to_owned())
            }
        }
    }
}

fn is_opaque(url: &str) -> bool {
    let trimmed = url.trim_start();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return true;
    }
    let lower = trimmed.to_ascii_lowercase();
    ["mailto:", "data:", "javascript:", "tel:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn converter(mode: UrlMode) -> BaseUrlConverter {
        BaseUrlConverter::new("https://example.com/docs/", mode).unwrap()
    }

    #[test]
    fn test_absolute_mode_resolves_relative_urls() {
        let conv = converter(UrlMode::Absolute);
        assert_eq!(
            conv.convert("img/a.png", "src", "img"),
            "https://example.com/docs/img/a.png"
        );
        assert_eq!(
            conv.convert("/top.html", "href", "a"),
            "https://example.com/top.html"
        );
    }

    #[test]
    fn test_relative_mode_strips_base() {
        let conv = converter(UrlMode::Relative);
        assert_eq!(
            conv.convert("https://example.com/docs/img/a.png", "src", "img"),
            "img/a.png"
        );
        assert_eq!(
            conv.convert("https://other.org/x", "href", "a"),
            "https://other.org/x"
        );
    }

    #[test]
    fn test_opaque_urls_untouched() {
        let conv = converter(UrlMode::Absolute);
        for url in ["#top", "mailto:a@b.c", "data:image/png;base64,AA", "javascript:void(0)"] {
            assert_eq!(conv.convert(url, "href", "a"), url);
        }
    }

    #[test]
    fn test_keep_mode() {
        let conv = converter(UrlMode::Keep);
        assert_eq!(conv.convert("img/a.png", "src", "img"), "img/a.png");
    }

    #[test]
    fn test_closure_converter() {
        let conv = |url: &str, attribute: &str, element: &str| format!("{element}.{attribute}:{url}");
        assert_eq!(conv.convert("x", "href", "a"), "a.href:x");
    }

    #[test]
    fn test_invalid_base_url() {
        assert!(matches!(
            BaseUrlConverter::new("not a url", UrlMode::Absolute),
            Err(SerializeError::InvalidBaseUrl { .. })
        ));
    }
}
