use std::sync::LazyLock;

use jsonschema::Validator;
use serde::Serialize;
use serde_json::{Value, json};

/// `format: email` is only asserted when format validation is switched on.
static EMAIL_SCHEMA: LazyLock<Option<Validator>> = LazyLock::new(|| {
    jsonschema::options()
        .should_validate_formats(true)
        .build(&json!({ "type": "string", "minLength": 6, "format": "email" }))
        .ok()
});

/// One rejected input, shown next to the field it names.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
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

/// Collects field errors for one form. Each check records at most one error
/// per call; checks never stop early so every bad field gets its message.
#[derive(Debug, Default)]
pub struct FieldGuard {
    errors: Vec<FieldError>,
}

impl FieldGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// At least `min` characters once surrounding whitespace is ignored.
    pub fn min_chars(&mut self, field: &str, value: &str, min: usize, message: &str) -> &mut Self {
        if value.trim().chars().count() < min {
            self.reject(field, message);
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str, message: &str) -> &mut Self {
        if !is_email(value) {
            self.reject(field, message);
        }
        self
    }

    /// Exactly `len` digits after separators are stripped.
    pub fn digits(&mut self, field: &str, value: &str, len: usize, message: &str) -> &mut Self {
        let only_digits = value.chars().all(|c| c.is_ascii_digit() || c == '-' || c == '.' || c == ' ');
        let count = value.chars().filter(char::is_ascii_digit).count();
        if !only_digits || count != len {
            self.reject(field, message);
        }
        self
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.reject(field, message);
        }
        self
    }

    pub fn reject(&mut self, field: &str, message: &str) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn finish(self) -> Vec<FieldError> {
        self.errors
    }
}

/// E-mail as the site accepts it: valid for the `email` schema format, with
/// a dotted domain whose last label has at least two letters.
pub fn is_email(value: &str) -> bool {
    let schema_ok = EMAIL_SCHEMA
        .as_ref()
        .is_some_and(|schema| schema.is_valid(&Value::String(value.to_string())));
    schema_ok && has_plain_shape(value)
}

fn has_plain_shape(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || local.starts_with('.') || local.ends_with('.') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty() || label.starts_with('-') || label.ends_with('-')) {
        return false;
    }
    let tld = labels[labels.len() - 1];
    tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
}
