//! Environment variable expansion for configuration strings.

use std::cell::RefCell;

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in a string.
///
/// An unset `${VAR}` without a default is an error. Unset bare `$VAR` is left alone.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    let unset = RefCell::new(Vec::new());
    let expanded = shellexpand::env_with_context_no_errors(value, |var| {
        let found = std::env::var(var).ok();
        if found.is_none() {
            unset.borrow_mut().push(var.to_owned());
        }
        found
    })
    .into_owned();

    // Unset variables with a default were substituted; the rest stay verbatim.
    if let Some(var) = unset
        .borrow()
        .iter()
        .find(|var| expanded.contains(&format!("${{{var}}}")))
    {
        return Err(ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{var}}} not set"),
        });
    }
    Ok(expanded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_simple_var() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MCE_TEST_VAR_SIMPLE", "https://example.com");
        }
        let result = expand_env("${MCE_TEST_VAR_SIMPLE}/docs/", "test.field").unwrap();
        assert_eq!(result, "https://example.com/docs/");
        unsafe {
            std::env::remove_var("MCE_TEST_VAR_SIMPLE");
        }
    }

    #[test]
    fn test_expand_with_default_uses_default() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MCE_UNSET_VAR_TEST");
        }
        let result = expand_env("${MCE_UNSET_VAR_TEST:-fallback}", "test.field").unwrap();
        assert_eq!(result, "fallback");
    }

    #[test]
    fn test_expand_missing_var_error() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::remove_var("MCE_MISSING_VAR_TEST");
        }
        let err = expand_env("${MCE_MISSING_VAR_TEST}", "serializer.document_base_url")
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert!(err.to_string().contains("MCE_MISSING_VAR_TEST"));
        assert!(err.to_string().contains("serializer.document_base_url"));
    }

    #[test]
    fn test_bare_dollar_not_expanded() {
        let result = expand_env("https://example.com/$path", "test.url").unwrap();
        assert_eq!(result, "https://example.com/$path");
    }
}
