//! Configuration management for the MCE content pipeline.
//!
//! Parses `mce.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `serializer.document_base_url`

mod expand;

use std::path::{Path, PathBuf};

pub use mce_dom::EntityEncoding;
pub use mce_html::ElementFormat;
use regex::Regex;
use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override entity encoding.
    pub entity_encoding: Option<EntityEncoding>,
    /// Override element format.
    pub element_format: Option<ElementFormat>,
    /// Override nested list fixing.
    pub fix_list_elements: Option<bool>,
    /// Override the base URL used for URL conversion.
    pub document_base_url: Option<String>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mce.toml";

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serializer configuration.
    pub serializer: SerializerConfig,
    /// Non-editable region configuration.
    pub noneditable: NonEditableConfig,

    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// How `src`/`href` URLs are rewritten against `document_base_url`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlMode {
    /// Leave URLs untouched.
    #[default]
    Keep,
    /// Make same-site URLs relative to the base URL.
    Relative,
    /// Resolve relative URLs against the base URL.
    Absolute,
}

/// Invisible character used inside caret containers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaretChar {
    /// U+FEFF zero width no-break space.
    #[default]
    Bom,
    /// U+200B zero width space.
    Zwsp,
}

impl CaretChar {
    /// The character itself.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Bom => '\u{feff}',
            Self::Zwsp => '\u{200b}',
        }
    }
}

/// Serializer configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SerializerConfig {
    /// Entity encoding policy.
    pub entity_encoding: EntityEncoding,
    /// Void element closing style.
    pub element_format: ElementFormat,
    /// Move nested lists into the preceding list item.
    pub fix_list_elements: bool,
    /// Use the shallow clone and re-parse path when cloning nodes.
    pub shallow_clone: bool,
    /// Valid element rules replacing the permissive default.
    pub valid_elements: Option<String>,
    /// Valid element rules merged on top of `valid_elements`.
    pub extended_valid_elements: Option<String>,
    /// Base URL for URL conversion.
    pub document_base_url: Option<String>,
    /// URL conversion mode.
    pub url_mode: UrlMode,
    /// Regular expressions for fragments kept verbatim through parsing.
    pub protect: Vec<String>,
}

impl SerializerConfig {
    /// Compile the `protect` patterns.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` naming the first invalid pattern.
    pub fn protect_patterns(&self) -> Result<Vec<Regex>, ConfigError> {
        self.protect
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| {
                    ConfigError::Validation(format!(
                        "serializer.protect contains an invalid pattern {pattern:?}: {e}"
                    ))
                })
            })
            .collect()
    }
}

/// Non-editable region configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NonEditableConfig {
    /// Class marking an editable island inside a non-editable region.
    pub editable_class: String,
    /// Class marking a non-editable region.
    pub noneditable_class: String,
    /// Caret container character.
    pub caret_char: CaretChar,
}

impl Default for NonEditableConfig {
    fn default() -> Self {
        Self {
            editable_class: "mceEditable".to_owned(),
            noneditable_class: "mceNonEditable".to_owned(),
            caret_char: CaretChar::default(),
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`serializer.document_base_url`").
        field: String,
        /// Error message (e.g., "${`MCE_BASE_URL`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a class name to be a single token.
fn require_class_name(value: &str, field: &str) -> Result<(), ConfigError> {
    require_non_empty(value, field)?;
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation(format!(
            "{field} must be a single class name"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `mce.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading, allowing CLI arguments to take
    /// precedence over config file values. The result is validated again
    /// after they are applied.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails or
    /// the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(entity_encoding) = settings.entity_encoding {
            self.serializer.entity_encoding = entity_encoding;
        }
        if let Some(element_format) = settings.element_format {
            self.serializer.element_format = element_format;
        }
        if let Some(fix_list_elements) = settings.fix_list_elements {
            self.serializer.fix_list_elements = fix_list_elements;
        }
        if let Some(base_url) = &settings.document_base_url {
            self.serializer.document_base_url = Some(base_url.clone());
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        config.expand_env_vars()?;
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_serializer()?;
        self.validate_noneditable()?;
        Ok(())
    }

    /// Validate serializer configuration.
    fn validate_serializer(&self) -> Result<(), ConfigError> {
        let serializer = &self.serializer;
        let base_url = serializer
            .document_base_url
            .as_deref()
            .filter(|url| !url.is_empty());

        match (serializer.url_mode, base_url) {
            (UrlMode::Keep, None) => {}
            (UrlMode::Keep | UrlMode::Relative | UrlMode::Absolute, Some(url)) => {
                require_http_url(url, "serializer.document_base_url")?;
            }
            (UrlMode::Relative | UrlMode::Absolute, None) => {
                return Err(ConfigError::Validation(
                    "serializer.url_mode requires serializer.document_base_url to be set"
                        .to_owned(),
                ));
            }
        }
        serializer.protect_patterns()?;
        Ok(())
    }

    /// Validate non-editable configuration.
    fn validate_noneditable(&self) -> Result<(), ConfigError> {
        let noneditable = &self.noneditable;
        require_class_name(&noneditable.editable_class, "noneditable.editable_class")?;
        require_class_name(&noneditable.noneditable_class, "noneditable.noneditable_class")?;

        if noneditable.editable_class == noneditable.noneditable_class {
            return Err(ConfigError::Validation(
                "noneditable.editable_class and noneditable.noneditable_class must differ"
                    .to_owned(),
            ));
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.serializer.document_base_url {
            self.serializer.document_base_url =
                Some(expand::expand_env(url, "serializer.document_base_url")?);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.serializer.entity_encoding, EntityEncoding::Named);
        assert_eq!(config.serializer.element_format, ElementFormat::Html);
        assert!(!config.serializer.fix_list_elements);
        assert!(!config.serializer.shallow_clone);
        assert_eq!(config.serializer.url_mode, UrlMode::Keep);
        assert_eq!(config.noneditable.editable_class, "mceEditable");
        assert_eq!(config.noneditable.noneditable_class, "mceNonEditable");
        assert_eq!(config.noneditable.caret_char.as_char(), '\u{feff}');
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.serializer.entity_encoding, EntityEncoding::Named);
        assert!(config.serializer.valid_elements.is_none());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[serializer]
entity_encoding = "named+numeric"
element_format = "xhtml"
fix_list_elements = true
shallow_clone = true
valid_elements = "p,a[href]"
extended_valid_elements = "span[class]"
document_base_url = "https://example.com/docs/"
url_mode = "relative"

[noneditable]
editable_class = "editable"
noneditable_class = "locked"
caret_char = "zwsp"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.serializer.entity_encoding, EntityEncoding::NamedNumeric);
        assert_eq!(config.serializer.element_format, ElementFormat::Xhtml);
        assert!(config.serializer.fix_list_elements);
        assert!(config.serializer.shallow_clone);
        assert_eq!(config.serializer.valid_elements.as_deref(), Some("p,a[href]"));
        assert_eq!(
            config.serializer.extended_valid_elements.as_deref(),
            Some("span[class]")
        );
        assert_eq!(config.serializer.url_mode, UrlMode::Relative);
        assert_eq!(config.noneditable.editable_class, "editable");
        assert_eq!(config.noneditable.noneditable_class, "locked");
        assert_eq!(config.noneditable.caret_char, CaretChar::Zwsp);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_unknown_encoding_fails() {
        let toml = r#"
[serializer]
entity_encoding = "html5"
"#;
        assert!(toml::from_str::<Config>(toml).is_err());
    }

    #[test]
    fn test_protect_patterns() {
        let toml = r#"
[serializer]
protect = ['<\?php.*?\?>', '\{\{.*?\}\}']
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let patterns = config.serializer.protect_patterns().unwrap();
        assert_eq!(patterns.len(), 2);
        assert!(patterns[1].is_match("<p>{{ name }}</p>"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_protect_pattern_rejected() {
        let toml = r#"
[serializer]
protect = ["(unclosed"]
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_parse_encoding_alias() {
        let toml = r#"
[serializer]
entity_encoding = "named,numeric"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.serializer.entity_encoding, EntityEncoding::NamedNumeric);
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config = Config::default();
        let overrides = CliSettings {
            entity_encoding: Some(EntityEncoding::Raw),
            fix_list_elements: Some(true),
            ..Default::default()
        };

        config.apply_cli_settings(&overrides);

        assert_eq!(config.serializer.entity_encoding, EntityEncoding::Raw);
        assert!(config.serializer.fix_list_elements);
        assert_eq!(config.serializer.element_format, ElementFormat::Html); // Unchanged
    }

    #[test]
    fn test_apply_cli_settings_empty() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings::default());
        assert_eq!(config.serializer.entity_encoding, EntityEncoding::Named);
        assert!(config.serializer.document_base_url.is_none());
    }

    #[test]
    fn test_expand_env_vars_base_url() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MCE_TEST_BASE_URL", "https://cms.example.com");
        }

        let toml = r#"
[serializer]
document_base_url = "${MCE_TEST_BASE_URL}/site/"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.expand_env_vars().unwrap();

        assert_eq!(
            config.serializer.document_base_url.as_deref(),
            Some("https://cms.example.com/site/")
        );

        unsafe {
            std::env::remove_var("MCE_TEST_BASE_URL");
        }
    }

    // Validation tests

    /// Assert that validation fails with expected substrings in the error message.
    fn assert_validation_error(config: &Config, expected_substrings: &[&str]) {
        let result = config.validate();
        assert!(result.is_err(), "Expected validation to fail");
        let err = result.unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        let msg = err.to_string();
        for s in expected_substrings {
            assert!(
                msg.contains(s),
                "Expected error to contain '{s}', got: {msg}"
            );
        }
    }

    #[test]
    fn test_validate_default_config_passes() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_class_name() {
        let mut config = Config::default();
        config.noneditable.editable_class = String::new();
        assert_validation_error(&config, &["noneditable.editable_class", "empty"]);
    }

    #[test]
    fn test_validate_class_name_with_spaces() {
        let mut config = Config::default();
        config.noneditable.noneditable_class = "a b".to_owned();
        assert_validation_error(&config, &["noneditable.noneditable_class"]);
    }

    #[test]
    fn test_validate_identical_class_names() {
        let mut config = Config::default();
        config.noneditable.editable_class = "mceNonEditable".to_owned();
        assert_validation_error(&config, &["must differ"]);
    }

    #[test]
    fn test_validate_url_mode_requires_base_url() {
        let mut config = Config::default();
        config.serializer.url_mode = UrlMode::Absolute;
        assert_validation_error(&config, &["document_base_url"]);

        config.serializer.document_base_url = Some("https://example.com/".to_owned());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_base_url_scheme() {
        let mut config = Config::default();
        config.serializer.document_base_url = Some("ftp://example.com/".to_owned());
        assert_validation_error(&config, &["document_base_url", "http"]);
    }

    #[test]
    fn test_load_explicit_missing_path() {
        let result = Config::load(Some(Path::new("/nonexistent/mce.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_from_file_with_cli_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mce.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "[serializer]\nentity_encoding = \"numeric\"").unwrap();

        let settings = CliSettings {
            element_format: Some(ElementFormat::Xhtml),
            ..Default::default()
        };
        let config = Config::load(Some(&path), Some(&settings)).unwrap();

        assert_eq!(config.serializer.entity_encoding, EntityEncoding::Numeric);
        assert_eq!(config.serializer.element_format, ElementFormat::Xhtml);
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_rejects_invalid_cli_settings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mce.toml");
        std::fs::write(&path, "[serializer]\nurl_mode = \"keep\"\n").unwrap();

        let settings = CliSettings {
            document_base_url: Some("not-a-url".to_owned()),
            ..Default::default()
        };
        let result = Config::load(Some(&path), Some(&settings));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }
}
