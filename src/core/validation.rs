//! Field validation for user registration and todo input
//!
//! Each check returns a [`FieldError`] naming the offending field so clients can
//! attach the message to the matching form input.

use serde::{Deserialize, Serialize};

use crate::core::db::models::Priority;

pub const USERNAME_MIN_LENGTH: usize = 3;
pub const USERNAME_MAX_LENGTH: usize = 30;
pub const PASSWORD_MIN_LENGTH: usize = 6;
pub const TITLE_MAX_LENGTH: usize = 200;
pub const DESCRIPTION_MAX_LENGTH: usize = 1000;

/// A validation failure tied to one input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulates field errors across several checks
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error of a failed check and hand back its value otherwise
    pub fn check<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.errors.push(err);
                None
            }
        }
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Username: 3-30 characters, ASCII letters, digits and underscores
pub fn validate_username(username: &str) -> Result<(), FieldError> {
    let len = username.chars().count();

    if len == 0 {
        return Err(FieldError::new("username", "Username is required"));
    }
    if len < USERNAME_MIN_LENGTH {
        return Err(FieldError::new(
            "username",
            "Username must be at least 3 characters",
        ));
    }
    if len > USERNAME_MAX_LENGTH {
        return Err(FieldError::new(
            "username",
            "Username cannot exceed 30 characters",
        ));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        return Err(FieldError::new(
            "username",
            "Username can only contain letters, numbers and underscores",
        ));
    }

    Ok(())
}

/// Email: local@domain.tld with no whitespace
pub fn validate_email(email: &str) -> Result<(), FieldError> {
    let invalid = || FieldError::new("email", "Please provide a valid email");

    if email.is_empty() {
        return Err(FieldError::new("email", "Email is required"));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    if !domain.contains('.') || domain.split('.').any(str::is_empty) {
        return Err(invalid());
    }

    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), FieldError> {
    if password.is_empty() {
        return Err(FieldError::new("password", "Password is required"));
    }
    if password.chars().count() < PASSWORD_MIN_LENGTH {
        return Err(FieldError::new(
            "password",
            "Password must be at least 6 characters",
        ));
    }
    Ok(())
}

/// Trims the title and checks it is present and within 200 characters
pub fn validate_title(title: &str) -> Result<String, FieldError> {
    let title = title.trim();

    if title.is_empty() {
        return Err(FieldError::new("title", "Title is required"));
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(FieldError::new(
            "title",
            "Title cannot exceed 200 characters",
        ));
    }

    Ok(title.to_string())
}

/// Trims the description; a blank description becomes `None`
pub fn validate_description(description: Option<&str>) -> Result<Option<String>, FieldError> {
    let Some(description) = description.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };

    if description.chars().count() > DESCRIPTION_MAX_LENGTH {
        return Err(FieldError::new(
            "description",
            "Description cannot exceed 1000 characters",
        ));
    }

    Ok(Some(description.to_string()))
}

pub fn parse_priority(priority: &str) -> Result<Priority, FieldError> {
    priority
        .trim()
        .to_ascii_lowercase()
        .parse()
        .map_err(|_| FieldError::new("priority", "Priority must be low, medium, or high"))
}
