//! Key layout. Every key starts with the owning school id so a prefix scan never crosses
//! schools.

use crate::store::StoreError;

const SEPARATOR: char = ':';

/// Reject segments that would make a key ambiguous.
pub fn segment(value: &str) -> Result<&str, StoreError> {
    if value.is_empty() || value.contains(SEPARATOR) {
        return Err(StoreError::InvalidKey(value.to_string()));
    }
    Ok(value)
}

fn join(parts: &[&str]) -> Result<String, StoreError> {
    let checked = parts
        .iter()
        .map(|p| segment(p))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(checked.join(":"))
}

pub fn school_prefix(school_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", segment(school_id)?))
}

pub fn reference_key(school_id: &str, id: &str) -> Result<String, StoreError> {
    join(&[school_id, id])
}

pub fn test_key(school_id: &str, test_id: &str) -> Result<String, StoreError> {
    join(&[school_id, test_id])
}

pub fn question_key(school_id: &str, test_id: &str, question_id: &str) -> Result<String, StoreError> {
    join(&[school_id, test_id, question_id])
}

pub fn question_prefix(school_id: &str, test_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", join(&[school_id, test_id])?))
}

/// One attempt per (test, student): the key itself enforces upsert semantics.
pub fn attempt_key(school_id: &str, test_id: &str, student_id: &str) -> Result<String, StoreError> {
    join(&[school_id, test_id, student_id])
}

pub fn attempt_prefix(school_id: &str, test_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", join(&[school_id, test_id])?))
}

pub fn attempt_index_key(school_id: &str, attempt_id: &str) -> Result<String, StoreError> {
    join(&[school_id, attempt_id])
}

pub fn answer_key(school_id: &str, attempt_id: &str, question_id: &str) -> Result<String, StoreError> {
    join(&[school_id, attempt_id, question_id])
}

pub fn answer_prefix(school_id: &str, attempt_id: &str) -> Result<String, StoreError> {
    Ok(format!("{}:", join(&[school_id, attempt_id])?))
}
