//! Shared input checks for the write routes and query parameters.

use chrono::NaiveDate;

use crate::constants::{MAX_ID_LEN, MAX_TERM_LEN, MAX_TITLE_LEN};

/// Identifiers become sled key segments: non-empty, bounded, and free of `:`.
pub fn validate_id(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{field} must not be empty"));
    }
    if value.len() > MAX_ID_LEN {
        return Err(format!("{field} must be at most {MAX_ID_LEN} characters"));
    }
    if !value
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.')
    {
        return Err(format!(
            "{field} may only contain letters, digits, '-', '_' and '.'"
        ));
    }
    Ok(())
}

/// Calendar date in `YYYY-MM-DD` form.
pub fn validate_date(field: &str, value: &str) -> Result<(), String> {
    if value.len() != 10 || NaiveDate::parse_from_str(value, "%Y-%m-%d").is_err() {
        return Err(format!("{field} must be a date in YYYY-MM-DD form"));
    }
    Ok(())
}

pub fn validate_term(value: &str) -> Result<(), String> {
    if value.chars().count() > MAX_TERM_LEN {
        return Err(format!("term must be at most {MAX_TERM_LEN} characters"));
    }
    Ok(())
}

pub fn validate_title(field: &str, value: &str) -> Result<(), String> {
    let count = value.trim().chars().count();
    if count == 0 {
        return Err(format!("{field} must not be empty"));
    }
    if count > MAX_TITLE_LEN {
        return Err(format!("{field} must be at most {MAX_TITLE_LEN} characters"));
    }
    Ok(())
}

pub fn validate_score(field: &str, value: f64) -> Result<(), String> {
    if !value.is_finite() || value < 0.0 {
        return Err(format!("{field} must be a finite, non-negative number"));
    }
    Ok(())
}
