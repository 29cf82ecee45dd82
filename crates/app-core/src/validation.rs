//! Form validation
//!
//! Checks run before any store call. Each form returns the messages for the
//! fields that failed, keyed by field.

use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

/// Minimum password length
pub const MIN_PASSWORD_LEN: usize = 6;

/// Minimum trimmed situation length
pub const MIN_SITUATION_LEN: usize = 3;

/// Form field
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// Display name
    Name,
    /// Email address
    Email,
    /// Password
    Password,
    /// Password confirmation
    ConfirmPassword,
    /// Situation description
    Situation,
}

impl Field {
    fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Email => "email",
            Field::Password => "password",
            Field::ConfirmPassword => "confirmPassword",
            Field::Situation => "situation",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failed fields with their messages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<Field, &'static str>,
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.values().copied().collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

impl ValidationErrors {
    fn add(&mut self, field: Field, message: &'static str) {
        self.errors.entry(field).or_insert(message);
    }

    /// Message for `field`, if it failed
    pub fn get(&self, field: Field) -> Option<&'static str> {
        self.errors.get(&field).copied()
    }

    /// Whether every field passed
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of failed fields
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Failed fields in form order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &'static str)> + '_ {
        self.errors.iter().map(|(field, message)| (*field, *message))
    }

    fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn email_regex() -> &'static Regex {
    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    EMAIL_REGEX.get_or_init(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"))
}

fn check_email(errors: &mut ValidationErrors, email: &str) {
    if email.is_empty() {
        errors.add(Field::Email, "Email is required");
    } else if !email_regex().is_match(email) {
        errors.add(Field::Email, "Email is invalid");
    }
}

fn check_password(errors: &mut ValidationErrors, password: &str) {
    if password.is_empty() {
        errors.add(Field::Password, "Password is required");
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(Field::Password, "Password must be at least 6 characters");
    }
}

/// Validate the login form
pub fn validate_login(email: &str, password: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_email(&mut errors, email);
    check_password(&mut errors, password);
    errors.into_result()
}

/// Validate the signup form
pub fn validate_signup(
    name: &str,
    email: &str,
    password: &str,
    confirm_password: &str,
) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if name.trim().is_empty() {
        errors.add(Field::Name, "Name is required");
    }
    check_email(&mut errors, email);
    check_password(&mut errors, password);
    if password != confirm_password {
        errors.add(Field::ConfirmPassword, "Passwords do not match");
    }
    errors.into_result()
}

/// Validate the password reset form
pub fn validate_forgot_password(email: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    check_email(&mut errors, email);
    errors.into_result()
}

/// Validate a profile edit
pub fn validate_profile(name: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if name.trim().is_empty() {
        errors.add(Field::Name, "Name cannot be empty");
    }
    errors.into_result()
}

/// Validate the situation before starting the questionnaire
pub fn validate_situation(situation: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if situation.trim().chars().count() < MIN_SITUATION_LEN {
        errors.add(Field::Situation, "Please describe the situation first");
    }
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_messages() {
        let errors = validate_login("", "").unwrap_err();
        assert_eq!(errors.get(Field::Email), Some("Email is required"));
        assert_eq!(errors.get(Field::Password), Some("Password is required"));

        let errors = validate_login("not-an-email", "12345").unwrap_err();
        assert_eq!(errors.get(Field::Email), Some("Email is invalid"));
        assert_eq!(errors.get(Field::Password), Some("Password must be at least 6 characters"));

        assert!(validate_login("a@b.co", "123456").is_ok());
    }

    #[test]
    fn test_email_pattern() {
        assert!(validate_forgot_password("me@example.com").is_ok());
        assert!(validate_forgot_password("me@example").is_err());
        assert!(validate_forgot_password("@.").is_err());
    }

    #[test]
    fn test_signup_messages() {
        let errors = validate_signup("  ", "a@b.co", "secret1", "secret2").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(Field::Name), Some("Name is required"));
        assert_eq!(errors.get(Field::ConfirmPassword), Some("Passwords do not match"));

        assert!(validate_signup("Sam", "sam@example.com", "secret1", "secret1").is_ok());
    }

    #[test]
    fn test_profile_and_situation() {
        assert_eq!(
            validate_profile(" ").unwrap_err().get(Field::Name),
            Some("Name cannot be empty")
        );
        assert!(validate_profile("Ann").is_ok());

        let errors = validate_situation("  hi  ").unwrap_err();
        assert_eq!(errors.get(Field::Situation), Some("Please describe the situation first"));
        assert!(validate_situation("gym").is_ok());
    }

    #[test]
    fn test_display_joins_messages() {
        let errors = validate_login("", "").unwrap_err();
        assert_eq!(errors.to_string(), "Email is required; Password is required");
        let fields: Vec<Field> = errors.iter().map(|(f, _)| f).collect();
        assert_eq!(fields, vec![Field::Email, Field::Password]);
    }
}
