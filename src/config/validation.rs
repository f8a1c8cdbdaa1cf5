//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject charsets that cannot be carried in a header parameter
//! - Reject content type entries that can never match a base media type
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AppConfig, CharsetConfig};

/// A single semantic problem in a loaded configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("charset must not be empty")]
    EmptyCharset,

    #[error("charset \"{0}\" is not a valid token")]
    InvalidCharset(String),

    #[error("contentTypeList entry \"{0}\" is not of the form type/subtype")]
    InvalidContentType(String),

    #[error("bind_address \"{0}\" is not a socket address")]
    InvalidBindAddress(String),
}

/// Validate the whole configuration file.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = charset_errors(&config.charset);

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.server.bind_address.clone(),
        ));
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Validate only the `[charset]` section. Used on reload.
pub fn validate_charset(config: &CharsetConfig) -> Result<(), Vec<ValidationError>> {
    let errors = charset_errors(config);
    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn charset_errors(config: &CharsetConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.charset.is_empty() {
        errors.push(ValidationError::EmptyCharset);
    } else if !config.charset.chars().all(is_tchar) {
        errors.push(ValidationError::InvalidCharset(config.charset.clone()));
    }

    for entry in config.content_type_list.iter().flatten() {
        let base = entry.split(';').next().unwrap_or_default().trim();
        let valid = match base.split_once('/') {
            Some((ty, subtype)) => {
                !ty.is_empty()
                    && !subtype.is_empty()
                    && ty.chars().all(is_tchar)
                    && subtype.chars().all(is_tchar)
            }
            None => false,
        };
        if !valid {
            errors.push(ValidationError::InvalidContentType(entry.clone()));
        }
    }

    errors
}

/// RFC 9110 token character.
fn is_tchar(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$%&'*+-.^_`|~".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn charset(charset: &str, types: &[&str]) -> CharsetConfig {
        CharsetConfig {
            enabled: true,
            charset: charset.to_string(),
            content_type_list: Some(types.iter().map(|s| s.to_string()).collect()),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        assert!(validate_config(&AppConfig::default()).is_ok());
    }

    #[test]
    fn test_collects_every_error() {
        let mut config = AppConfig::default();
        config.charset = charset("utf 8", &["text/html", "html", "/json"]);
        config.server.bind_address = "nowhere".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::InvalidCharset("utf 8".into()),
                ValidationError::InvalidContentType("html".into()),
                ValidationError::InvalidContentType("/json".into()),
                ValidationError::InvalidBindAddress("nowhere".into()),
            ]
        );
    }

    #[test]
    fn test_entries_with_parameters_are_accepted() {
        let config = charset("UTF-8", &[" Text/HTML ; level=1", "application/vnd.api+json"]);
        assert!(validate_charset(&config).is_ok());
    }

    #[test]
    fn test_empty_charset() {
        let config = charset("", &[]);
        assert_eq!(
            validate_charset(&config).unwrap_err(),
            vec![ValidationError::EmptyCharset]
        );
    }
}
