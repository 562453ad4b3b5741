//! Coercion of raw form input into typed column values.
//!
//! Form fields arrive as text. Entity forms only check presence and coerce
//! numbers, dates and identifiers; the storefront order form also checks
//! lengths and email shape.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::ValidationError;

pub fn required(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Missing(field));
    }
    Ok(value.to_string())
}

pub fn optional(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Required text of at least `min` characters after trimming
pub fn min_length(field: &'static str, value: &str, min: usize) -> Result<String, ValidationError> {
    let value = required(field, value)?;
    if value.chars().count() < min {
        return Err(ValidationError::Rule(format!(
            "{} must be at least {} characters",
            field, min
        )));
    }
    Ok(value)
}

/// Required text shaped like `local@domain.tld`
pub fn email(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = required(field, value)?;
    let plausible = match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !plausible {
        return Err(ValidationError::Malformed {
            field,
            expected: "a valid email address",
        });
    }
    Ok(value)
}

pub fn decimal(field: &'static str, value: &str) -> Result<Decimal, ValidationError> {
    let raw = required(field, value)?;
    Decimal::from_str(&raw).map_err(|_| ValidationError::Malformed {
        field,
        expected: "a number",
    })
}

pub fn optional_decimal(field: &'static str, value: &str) -> Result<Option<Decimal>, ValidationError> {
    match optional(value) {
        Some(_) => decimal(field, value).map(Some),
        None => Ok(None),
    }
}

pub fn integer(field: &'static str, value: &str) -> Result<i64, ValidationError> {
    let raw = required(field, value)?;
    raw.parse::<i64>().map_err(|_| ValidationError::Malformed {
        field,
        expected: "a whole number",
    })
}

pub fn optional_uuid(field: &'static str, value: &str) -> Result<Option<Uuid>, ValidationError> {
    match optional(value) {
        Some(raw) => Uuid::parse_str(&raw)
            .map(Some)
            .map_err(|_| ValidationError::Malformed {
                field,
                expected: "a valid identifier",
            }),
        None => Ok(None),
    }
}

/// Dates are entered as `YYYY-MM-DD`
pub fn optional_date(field: &'static str, value: &str) -> Result<Option<NaiveDate>, ValidationError> {
    match optional(value) {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ValidationError::Malformed {
                field,
                expected: "a date (YYYY-MM-DD)",
            }),
        None => Ok(None),
    }
}
