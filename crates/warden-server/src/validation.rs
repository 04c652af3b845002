//! Request-body validation, applied before any state is touched.

use std::sync::LazyLock;

use regex::Regex;
use warden_core::error::{WardenError, WardenResult};

static EMAIL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\w+([.-]?\w+)*@\w+([.-]?\w+)*(\.\w{2,3})+$").expect("valid email regex")
});

pub fn required(value: Option<String>, field: &str) -> WardenResult<String> {
    value.ok_or_else(|| WardenError::validation(format!("missing required field {field}")))
}

pub fn email(value: Option<String>) -> WardenResult<String> {
    let value = required(value, "email")?;
    if !EMAIL_PATTERN.is_match(value.trim()) {
        return Err(WardenError::validation("email must be a valid email address"));
    }
    Ok(value)
}

pub fn password(value: Option<String>, min_length: usize) -> WardenResult<String> {
    let value = required(value, "password")?;
    if value.chars().count() < min_length {
        return Err(WardenError::validation(format!(
            "password must be at least {min_length} characters long"
        )));
    }
    Ok(value)
}

pub fn name(value: Option<String>) -> WardenResult<String> {
    let value = required(value, "name")?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(WardenError::validation("name must not be empty"));
    }
    Ok(trimmed.to_string())
}
