use std::num::IntErrorKind;
use std::ops::RangeInclusive;

use serde_json::{Number, Value};

use crate::models::NewSubmission;

pub const NAME_LEN: RangeInclusive<usize> = 2..=100;
pub const CONTACT_LEN: RangeInclusive<usize> = 5..=200;
pub const AGE: RangeInclusive<i64> = 1..=119;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    MissingFields,
    NameLength,
    ContactLength,
    AgeOutOfRange,
    AgeNotNumeric,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            ValidationError::MissingFields => "All fields are required.",
            ValidationError::NameLength => "Name must be between 2 and 100 characters.",
            ValidationError::ContactLength => "Email must be between 5 and 200 characters.",
            ValidationError::AgeOutOfRange => "Age must be between 1 and 119.",
            ValidationError::AgeNotNumeric => "Invalid age. Must be a number.",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for ValidationError {}

/// Validate the raw form fields. The contact field is posted as `email`;
/// `contact` is accepted as well. The first failing check wins.
pub fn validate(raw: &Value) -> Result<NewSubmission, ValidationError> {
    let name = field(raw, &["name"]);
    let contact = field(raw, &["email", "contact"]);
    let age = field(raw, &["age"]);

    if name.is_empty() || contact.is_empty() || age.is_empty() {
        return Err(ValidationError::MissingFields);
    }

    if !NAME_LEN.contains(&name.chars().count()) {
        return Err(ValidationError::NameLength);
    }

    if !CONTACT_LEN.contains(&contact.chars().count()) {
        return Err(ValidationError::ContactLength);
    }

    let age = match age.parse::<i64>() {
        Ok(n) => n,
        Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow | IntErrorKind::NegOverflow) => {
            return Err(ValidationError::AgeOutOfRange);
        }
        Err(_) => return Err(ValidationError::AgeNotNumeric),
    };

    if !AGE.contains(&age) {
        return Err(ValidationError::AgeOutOfRange);
    }

    Ok(NewSubmission { name, contact, age })
}

/// Trimmed text of the first present key. Numbers are rendered as text;
/// anything else counts as absent.
fn field(raw: &Value, keys: &[&str]) -> String {
    keys.iter()
        .find_map(|key| match raw.get(*key) {
            Some(Value::String(s)) => Some(s.trim().to_string()),
            Some(Value::Number(n)) => Some(number_text(n)),
            _ => None,
        })
        .unwrap_or_default()
}

/// Integers past 64 bits arrive as whole floats (`1e+23`). Spell them out
/// in digits so they overflow like the same value posted as text.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() >= i64::MAX as f64 => {
            format!("{f:.0}")
        }
        _ => n.to_string(),
    }
}
