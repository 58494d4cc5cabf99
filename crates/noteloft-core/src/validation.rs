//! Field validation helpers shared by request bodies.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::AppError;

/// Slug shape: 1-15 chars, alphanumeric with inner dashes, no leading or
/// trailing dash.
fn slug_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,13}[a-zA-Z0-9])?$").expect("valid slug regex")
    })
}

/// Validate a tenant slug.
pub fn validate_slug(slug: &str) -> Result<(), AppError> {
    if slug.len() > 15 {
        return Err(AppError::InvalidInput(
            "slug should not be more than 15 characters".to_string(),
        ));
    }
    if !slug_regex().is_match(slug) {
        return Err(AppError::InvalidInput(
            "slug should only contain letters, numbers, and dashes".to_string(),
        ));
    }
    Ok(())
}

/// Validate password strength: at least 8 characters with at least one
/// letter and one number.
pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::InvalidInput(
            "password must be at least 8 characters".to_string(),
        ));
    }
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    if !has_digit || !has_letter {
        return Err(AppError::InvalidInput(
            "password must contain at least 1 letter and 1 number".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_slugs() {
        for slug in ["acme", "a", "big-corp", "corp42", "A1-b2-C3"] {
            assert!(validate_slug(slug).is_ok(), "expected valid: {}", slug);
        }
    }

    #[test]
    fn test_invalid_slugs() {
        for slug in [
            "",
            "-acme",
            "acme-",
            "acme_corp",
            "acme.corp",
            "a-very-long-slug-name",
        ] {
            assert!(validate_slug(slug).is_err(), "expected invalid: {}", slug);
        }
    }

    #[test]
    fn test_password_strength() {
        assert!(validate_password("passw0rd").is_ok());
        assert!(validate_password("short1").is_err());
        assert!(validate_password("lettersonly").is_err());
        assert!(validate_password("12345678").is_err());
    }
}
