//! Input validation for API requests.
//!
//! Helpers return `Result<(), String>` so callers can collect failures into
//! a single response via `ValidationErrorBuilder`.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Matches anything shaped like local@domain.tld with no whitespace
    static ref EMAIL_REGEX: Regex = Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap();
}

pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_NAME_LEN: usize = 100;
pub const MAX_BIO_LEN: usize = 1000;
pub const MAX_LOCATION_LEN: usize = 255;
pub const MIN_AGE: i32 = 18;
pub const MAX_AGE: i32 = 120;

pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }
    if email.len() > 255 {
        return Err("Email is too long (max 255 characters)".to_string());
    }
    if !EMAIL_REGEX.is_match(email) {
        return Err("Please provide a valid email address".to_string());
    }
    Ok(())
}

/// Password policy: length plus lowercase/uppercase/digit classes.
pub fn validate_password(password: &str) -> Vec<String> {
    let mut errors = Vec::new();

    if password.len() < MIN_PASSWORD_LEN {
        errors.push(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }
    if !password.chars().any(|c| c.is_lowercase()) {
        errors.push("Password must contain at least one lowercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_uppercase()) {
        errors.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        errors.push("Password must contain at least one number".to_string());
    }

    errors
}

pub fn validate_name(name: &str) -> Result<(), String> {
    if name.chars().count() > MAX_NAME_LEN {
        return Err(format!("Name is too long (max {} characters)", MAX_NAME_LEN));
    }
    Ok(())
}

pub fn validate_age(age: i32) -> Result<(), String> {
    if !(MIN_AGE..=MAX_AGE).contains(&age) {
        return Err(format!("Age must be between {} and {}", MIN_AGE, MAX_AGE));
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> Result<(), String> {
    if bio.chars().count() > MAX_BIO_LEN {
        return Err(format!("Bio is too long (max {} characters)", MAX_BIO_LEN));
    }
    Ok(())
}

pub fn validate_location(location: &str) -> Result<(), String> {
    if location.chars().count() > MAX_LOCATION_LEN {
        return Err(format!(
            "Location is too long (max {} characters)",
            MAX_LOCATION_LEN
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a@x.com").is_ok());
        assert!(validate_email("first.last+tag@sub.example.co").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
        assert!(validate_email("spaces in@x.com").is_err());
        assert!(validate_email("two@@x.com").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("Passw0rd").is_empty());
        assert!(validate_password("L0ngerPassphrase").is_empty());

        assert!(!validate_password("short1A").is_empty());
        assert!(!validate_password("alllowercase1").is_empty());
        assert!(!validate_password("ALLUPPERCASE1").is_empty());
        assert!(!validate_password("NoDigitsHere").is_empty());
        // Weak in several ways at once reports each violation
        assert_eq!(validate_password("abc").len(), 3);
    }

    #[test]
    fn test_validate_age() {
        assert!(validate_age(18).is_ok());
        assert!(validate_age(42).is_ok());
        assert!(validate_age(120).is_ok());

        assert!(validate_age(17).is_err());
        assert!(validate_age(0).is_err());
        assert!(validate_age(121).is_err());
    }

    #[test]
    fn test_validate_field_lengths() {
        assert!(validate_name("Ada").is_ok());
        assert!(validate_name(&"x".repeat(101)).is_err());
        assert!(validate_bio(&"x".repeat(1000)).is_ok());
        assert!(validate_bio(&"x".repeat(1001)).is_err());
        assert!(validate_location(&"x".repeat(256)).is_err());
    }
}
