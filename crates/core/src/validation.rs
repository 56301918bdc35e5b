//! Form field validation.
//!
//! Each check returns a short message suitable for showing next to the field.
//! Handlers gather them into [`FieldErrors`] so a form submission reports
//! every problem at once instead of failing on the first one.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::types::Email;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;
/// Maximum password length (argon2 input cap).
pub const MAX_PASSWORD_LENGTH: usize = 128;

static POSTAL_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{5}$").expect("postal code regex is valid"));

static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?\d{9,15}$").expect("phone regex is valid"));

static HAS_LETTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\p{L}").expect("letter regex is valid"));

static HAS_DIGIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d").expect("digit regex is valid"));

/// Validation failures keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error for `field`. The first error per field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_insert_with(|| message.into());
    }

    /// Record the error of `result`, if any, and return its value.
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    /// `Ok(())` if nothing was recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

/// Parse an email field.
///
/// # Errors
///
/// Returns the parse error message.
pub fn email(value: &str) -> Result<Email, String> {
    Email::parse(value).map_err(|e| e.to_string())
}

/// Check password strength: 8-128 characters with a letter and a digit.
///
/// # Errors
///
/// Returns a message describing the missing requirement.
pub fn password(value: &str) -> Result<(), String> {
    let len = value.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        ));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        ));
    }
    if !HAS_LETTER.is_match(value) || !HAS_DIGIT.is_match(value) {
        return Err("password must contain at least one letter and one number".to_owned());
    }
    Ok(())
}

/// Check a five-digit postal code and return it trimmed.
///
/// # Errors
///
/// Returns a message if the code is not exactly five digits.
pub fn postal_code(value: &str) -> Result<String, String> {
    let value = value.trim();
    if POSTAL_CODE.is_match(value) {
        Ok(value.to_owned())
    } else {
        Err("postal code must be 5 digits".to_owned())
    }
}

/// Check a phone number and return it with spaces, dashes and parentheses removed.
///
/// # Errors
///
/// Returns a message if the number has the wrong shape.
pub fn phone(value: &str) -> Result<String, String> {
    let compact: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
        .collect();
    if PHONE.is_match(&compact) {
        Ok(compact)
    } else {
        Err("phone must have 9 to 15 digits".to_owned())
    }
}

/// Check a required text field and return it trimmed.
///
/// # Errors
///
/// Returns a message if the value is blank or longer than `max` characters.
pub fn required(value: &str, max: usize) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        return Err("this field is required".to_owned());
    }
    if value.chars().count() > max {
        return Err(format!("must be at most {max} characters"));
    }
    Ok(value.to_owned())
}

/// Check an optional text field: blank becomes `None`.
///
/// # Errors
///
/// Returns a message if the value is longer than `max` characters.
pub fn optional(value: Option<&str>, max: usize) -> Result<Option<String>, String> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(format!("must be at most {max} characters")),
        Some(v) => Ok(Some(v.to_owned())),
    }
}
