pub mod keys;
pub mod migrate;
pub mod operations;
pub mod source;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::transaction::TransactionError;
use sled::Db;
use thiserror::Error;

use crate::constants::MAX_WRITE_ATTEMPTS;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub tests: sled::Tree,
    pub questions: sled::Tree,
    pub attempts: sled::Tree,
    pub attempt_index: sled::Tree,
    pub attempt_answers: sled::Tree,
    // Reference dimensions
    pub classes: sled::Tree,
    pub subjects: sled::Tree,
    pub teachers: sled::Tree,
    pub students: sled::Tree,
    pub topics: sled::Tree,
    pub meta: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("invalid key segment: {0:?}")]
    InvalidKey(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
    #[error("write conflict: {0}")]
    Conflict(String),
}

impl StoreError {
    pub fn not_found(entity: &str, key: &str) -> Self {
        StoreError::NotFound {
            entity: entity.to_string(),
            key: key.to_string(),
        }
    }
}

impl From<TransactionError<StoreError>> for StoreError {
    fn from(error: TransactionError<StoreError>) -> Self {
        match error {
            TransactionError::Abort(store_error) => store_error,
            TransactionError::Storage(storage_error) => StoreError::Sled(storage_error),
        }
    }
}

/// Run a read-then-write operation, re-running it while its snapshot was overtaken by another
/// writer. The last conflict is returned once `MAX_WRITE_ATTEMPTS` runs have failed.
pub(crate) fn retry_on_conflict<T>(
    mut op: impl FnMut() -> Result<T, StoreError>,
) -> Result<T, StoreError> {
    let mut attempt = 1;
    loop {
        match op() {
            Err(StoreError::Conflict(reason)) if attempt < MAX_WRITE_ATTEMPTS => {
                tracing::debug!(attempt, reason = %reason, "Write conflict, retrying");
                attempt += 1;
            }
            result => return result,
        }
    }
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let tests = db.open_tree(trees::TESTS)?;
        let questions = db.open_tree(trees::QUESTIONS)?;
        let attempts = db.open_tree(trees::ATTEMPTS)?;
        let attempt_index = db.open_tree(trees::ATTEMPT_INDEX)?;
        let attempt_answers = db.open_tree(trees::ATTEMPT_ANSWERS)?;
        // Reference dimensions
        let classes = db.open_tree(trees::CLASSES)?;
        let subjects = db.open_tree(trees::SUBJECTS)?;
        let teachers = db.open_tree(trees::TEACHERS)?;
        let students = db.open_tree(trees::STUDENTS)?;
        let topics = db.open_tree(trees::TOPICS)?;
        let meta = db.open_tree(trees::META)?;

        Ok(Self {
            db,
            tests,
            questions,
            attempts,
            attempt_index,
            attempt_answers,
            classes,
            subjects,
            teachers,
            students,
            topics,
            meta,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Deserialize every value under `prefix`.
    pub(crate) fn scan_values<T: DeserializeOwned>(
        tree: &sled::Tree,
        prefix: &str,
    ) -> Result<Vec<T>, StoreError> {
        let mut out = Vec::new();
        for item in tree.scan_prefix(prefix.as_bytes()) {
            let (_, value) = item?;
            out.push(Self::deserialize(&value)?);
        }
        Ok(out)
    }
}
