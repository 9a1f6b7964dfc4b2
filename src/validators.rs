/// Registration input checks.
///
/// Email comes back trimmed with a lowercase domain, username trimmed; passwords are checked as given.
/// Lengths are counted in characters.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::ValidationError;

const EMAIL_LENGTH: (usize, usize) = (5, 254);
const MAX_EMAIL_LOCAL_PART: usize = 64;
const USERNAME_LENGTH: (usize, usize) = (3, 50);
// The upper bound caps PBKDF2 input size.
const PASSWORD_LENGTH: (usize, usize) = (8, 128);

lazy_static! {
    static ref EMAIL_REGEX: Regex = Regex::new(
        r"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"
    ).expect("email regex is valid");
}

fn check_length(
    field: &'static str,
    value: &str,
    (min, max): (usize, usize),
) -> Result<(), ValidationError> {
    match value.chars().count() {
        0 => Err(ValidationError::EmptyField(field)),
        n if n < min => Err(ValidationError::TooShort(field, min)),
        n if n > max => Err(ValidationError::TooLong(field, max)),
        _ => Ok(()),
    }
}

/// Trim and lowercase the domain part. The local part keeps its case.
pub fn normalize_email(email: &str) -> String {
    let email = email.trim();
    match email.rsplit_once('@') {
        Some((local, domain)) => format!("{}@{}", local, domain.to_lowercase()),
        None => email.to_string(),
    }
}

pub fn validate_email(email: &str) -> Result<String, ValidationError> {
    let normalized = normalize_email(email);
    let email = normalized.as_str();
    check_length("email", email, EMAIL_LENGTH)?;

    if !EMAIL_REGEX.is_match(email) {
        return Err(ValidationError::InvalidFormat("email"));
    }

    let local_part_too_long = email
        .split_once('@')
        .map_or(true, |(local, _)| local.len() > MAX_EMAIL_LOCAL_PART);
    if local_part_too_long || email.contains('\0') {
        return Err(ValidationError::SuspiciousContent("email"));
    }

    Ok(email.to_string())
}

pub fn validate_username(username: &str) -> Result<String, ValidationError> {
    let username = username.trim();
    check_length("username", username, USERNAME_LENGTH)?;

    if username.chars().any(char::is_control) {
        return Err(ValidationError::SuspiciousContent("username"));
    }

    Ok(username.to_string())
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    check_length("password", password, PASSWORD_LENGTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_email() {
        assert!(validate_email("user@example.com").is_ok());
        assert!(validate_email("test.email@domain.co.uk").is_ok());
        assert!(validate_email("user+tag@example.com").is_ok());
        assert_eq!(validate_email("  alice@x.com ").unwrap(), "alice@x.com");
    }

    #[test]
    fn test_email_domain_is_lowercased() {
        assert_eq!(validate_email("Alice@X.COM").unwrap(), "Alice@x.com");
        assert_eq!(normalize_email(" bob@Example.Org "), "bob@example.org");
        assert_eq!(normalize_email("no-at-sign"), "no-at-sign");
    }

    #[test]
    fn test_invalid_email_format() {
        assert!(validate_email("invalid").is_err());
        assert!(validate_email("user@").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@@example.com").is_err());
        assert_eq!(validate_email(""), Err(ValidationError::EmptyField("email")));
    }

    #[test]
    fn test_email_length_limits() {
        let too_long = format!("{}@example.com", "a".repeat(250));
        assert!(validate_email(&too_long).is_err());

        let long_local = format!("{}@example.com", "a".repeat(65));
        assert_eq!(
            validate_email(&long_local),
            Err(ValidationError::SuspiciousContent("email"))
        );

        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_username() {
        assert_eq!(validate_username(" alice ").unwrap(), "alice");
        assert_eq!(validate_username("al"), Err(ValidationError::TooShort("username", 3)));
        assert!(validate_username(&"a".repeat(51)).is_err());
        assert!(validate_username(&"a".repeat(50)).is_ok());
        assert!(validate_username("ali\u{7}ce").is_err());
        assert_eq!(validate_username("   "), Err(ValidationError::EmptyField("username")));
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("password123").is_ok());
        assert_eq!(validate_password(""), Err(ValidationError::EmptyField("password")));
        assert_eq!(validate_password("short"), Err(ValidationError::TooShort("password", 8)));
        assert!(validate_password(&"a".repeat(129)).is_err());
    }
}
