//! Input validation run at the HTTP boundary, before any store is touched.
//!
//! Each validator checks its rules in a fixed order and stops at the first
//! failure, so the reported message is deterministic.

use std::num::IntErrorKind;

use serde_json::Value;

use crate::{error::AppError, schema::RegisterSchema};

pub const TODO_MIN_CHARS: usize = 3;
pub const TODO_MAX_CHARS: usize = 300;
pub const CREDENTIAL_MIN_CHARS: usize = 3;
pub const CREDENTIAL_MAX_CHARS: usize = 20;

/// Checks a todo text value and returns it as an owned string.
pub fn todo_text(value: Option<&Value>) -> Result<String, AppError> {
    let value = match value {
        None | Some(Value::Null) => return Err(invalid("Todo text cannot be empty")),
        Some(Value::String(text)) if text.is_empty() => {
            return Err(invalid("Todo text cannot be empty"))
        }
        Some(value) => value,
    };

    let text = value
        .as_str()
        .ok_or_else(|| invalid("Todo should be in text format"))?;

    let len = text.chars().count();
    if !(TODO_MIN_CHARS..=TODO_MAX_CHARS).contains(&len) {
        return Err(invalid("Todo should contain 3 - 300 characters"));
    }

    Ok(text.to_string())
}

/// A registration that passed validation. The email is lowercased.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub username: String,
    pub password: String,
}

pub fn registration(input: &RegisterSchema) -> Result<Registration, AppError> {
    let name = required(&input.name, "name is required")?;
    let email = required(&input.email, "email is required")?;
    let username = required(&input.username, "username is required")?;
    let password = required(&input.password, "password is required")?;

    if !within(username, CREDENTIAL_MIN_CHARS, CREDENTIAL_MAX_CHARS) {
        return Err(invalid(
            "username must have length between 3 and 20 characters",
        ));
    }
    if !within(password, CREDENTIAL_MIN_CHARS, CREDENTIAL_MAX_CHARS) {
        return Err(invalid("password length should be 3-20"));
    }
    if !is_email(email) {
        return Err(invalid("Not a email format"));
    }

    Ok(Registration {
        name: name.to_string(),
        email: email.to_lowercase(),
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Parses the `skip` query parameter. Absent or non-numeric values mean 0.
/// Absent or non-numeric means 0; out-of-range numbers saturate.
pub fn skip(raw: Option<&str>) -> Result<i64, AppError> {
    let skip = match raw.map(|s| s.trim().parse::<i64>()) {
        Some(Ok(skip)) => skip,
        Some(Err(err)) => match err.kind() {
            IntErrorKind::PosOverflow => i64::MAX,
            IntErrorKind::NegOverflow => i64::MIN,
            _ => 0,
        },
        None => 0,
    };
    if skip < 0 {
        return Err(invalid("skip must not be negative"));
    }
    Ok(skip)
}

pub fn is_email(candidate: &str) -> bool {
    validator::validate_email(candidate)
}

fn required<'a>(field: &'a Option<String>, message: &str) -> Result<&'a str, AppError> {
    match field.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(invalid(message)),
    }
}

fn within(value: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&value.chars().count())
}

fn invalid(message: &str) -> AppError {
    AppError::Validation(message.to_string())
}
