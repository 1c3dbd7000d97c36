use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sled::transaction::{abort, ConflictableTransactionResult, TransactionalTree};
use sled::{IVec, Transactional};

use crate::store::keys;
use crate::store::{retry_on_conflict, Store, StoreError};

/// One student's recorded result on one test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attempt {
    pub id: String,
    pub school_id: String,
    pub test_id: String,
    pub student_id: String,
    pub total_score: f64,
    #[serde(default)]
    pub answer_count: u32,
    pub submitted_at: DateTime<Utc>,
}

pub(crate) fn check_score(score: f64) -> Result<(), StoreError> {
    if !score.is_finite() || score < 0.0 {
        return Err(StoreError::Validation(format!(
            "score must be a non-negative number, got {score}"
        )));
    }
    Ok(())
}

/// One attempt row as read before a write. The write transaction re-reads the row and aborts
/// with `StoreError::Conflict` if another writer replaced it in between.
#[derive(Debug, Clone)]
pub(crate) struct AttemptSnapshot {
    pub key: String,
    pub raw: Option<IVec>,
}

impl AttemptSnapshot {
    pub(crate) fn verify(
        &self,
        tx_attempts: &TransactionalTree,
    ) -> ConflictableTransactionResult<(), StoreError> {
        if tx_attempts.get(self.key.as_bytes())? != self.raw {
            return abort(StoreError::Conflict(format!(
                "attempt row {} changed during write",
                self.key
            )));
        }
        Ok(())
    }
}

impl Store {
    /// Record a single total for (test, student), creating or overwriting the attempt.
    ///
    /// An overwrite keeps the attempt id and drops any answer-level rows, since the manual
    /// total supersedes them.
    pub fn record_score(
        &self,
        school_id: &str,
        test_id: &str,
        student_id: &str,
        total_score: f64,
    ) -> Result<Attempt, StoreError> {
        check_score(total_score)?;
        self.require_test(school_id, test_id)?;

        let key = keys::attempt_key(school_id, test_id, student_id)?;
        retry_on_conflict(|| {
            let snapshot = AttemptSnapshot {
                raw: self.attempts.get(key.as_bytes())?,
                key: key.clone(),
            };
            self.write_score(school_id, test_id, student_id, total_score, &snapshot)
        })
    }

    pub(crate) fn write_score(
        &self,
        school_id: &str,
        test_id: &str,
        student_id: &str,
        total_score: f64,
        snapshot: &AttemptSnapshot,
    ) -> Result<Attempt, StoreError> {
        let existing: Option<Attempt> = match &snapshot.raw {
            Some(raw) => Some(Self::deserialize(raw)?),
            None => None,
        };

        let stale_answers = match &existing {
            Some(previous) => self.answer_keys(school_id, &previous.id)?,
            None => Vec::new(),
        };

        let attempt = Attempt {
            id: existing
                .map(|previous| previous.id)
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            school_id: school_id.to_string(),
            test_id: test_id.to_string(),
            student_id: student_id.to_string(),
            total_score,
            answer_count: 0,
            submitted_at: Utc::now(),
        };
        let index_key = keys::attempt_index_key(school_id, &attempt.id)?;
        let bytes = Self::serialize(&attempt)?;

        (&self.attempts, &self.attempt_index, &self.attempt_answers).transaction(
            |(tx_attempts, tx_index, tx_answers)| -> ConflictableTransactionResult<(), StoreError> {
                snapshot.verify(tx_attempts)?;
                tx_attempts.insert(snapshot.key.as_bytes(), bytes.as_slice())?;
                tx_index.insert(index_key.as_bytes(), snapshot.key.as_bytes())?;
                for stale in &stale_answers {
                    tx_answers.remove(stale.clone())?;
                }
                Ok(())
            },
        )?;

        tracing::debug!(
            school_id,
            test_id,
            attempt_id = %attempt.id,
            cleared_answers = stale_answers.len(),
            "Score recorded"
        );
        Ok(attempt)
    }

    /// Read an attempt by id together with the raw row it was decoded from.
    pub(crate) fn snapshot_attempt(
        &self,
        school_id: &str,
        attempt_id: &str,
    ) -> Result<(Attempt, AttemptSnapshot), StoreError> {
        let index_key = keys::attempt_index_key(school_id, attempt_id)?;
        let Some(key) = self.attempt_index.get(index_key.as_bytes())? else {
            return Err(StoreError::not_found("attempt", attempt_id));
        };
        let Some(raw) = self.attempts.get(&key)? else {
            return Err(StoreError::not_found("attempt", attempt_id));
        };
        let attempt: Attempt = Self::deserialize(&raw)?;
        let key = String::from_utf8(key.to_vec())
            .map_err(|_| StoreError::InvalidKey(attempt_id.to_string()))?;
        Ok((attempt, AttemptSnapshot { key, raw: Some(raw) }))
    }

    pub fn get_attempt(&self, school_id: &str, attempt_id: &str) -> Result<Option<Attempt>, StoreError> {
        let index_key = keys::attempt_index_key(school_id, attempt_id)?;
        let Some(attempt_key) = self.attempt_index.get(index_key.as_bytes())? else {
            return Ok(None);
        };
        match self.attempts.get(attempt_key)? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn require_attempt(&self, school_id: &str, attempt_id: &str) -> Result<Attempt, StoreError> {
        self.get_attempt(school_id, attempt_id)?
            .ok_or_else(|| StoreError::not_found("attempt", attempt_id))
    }

    pub fn list_attempts(&self, school_id: &str, test_id: &str) -> Result<Vec<Attempt>, StoreError> {
        let prefix = keys::attempt_prefix(school_id, test_id)?;
        Self::scan_values(&self.attempts, &prefix)
    }

    pub(crate) fn answer_keys(&self, school_id: &str, attempt_id: &str) -> Result<Vec<IVec>, StoreError> {
        let prefix = keys::answer_prefix(school_id, attempt_id)?;
        let mut out = Vec::new();
        for item in self.attempt_answers.scan_prefix(prefix.as_bytes()) {
            let (key, _) = item?;
            out.push(key);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::operations::test_papers::TestPaper;

    fn store_with_test(name: &str) -> (tempfile::TempDir, Store) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path().join(name).to_str().unwrap()).unwrap();
        store
            .upsert_test(&TestPaper {
                id: "t1".to_string(),
                school_id: "s1".to_string(),
                title: "Quiz".to_string(),
                class_id: "c1".to_string(),
                subject_id: "sub1".to_string(),
                teacher_id: "tch1".to_string(),
                term: None,
                date: None,
                total_marks: 50,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .unwrap();
        (dir, store)
    }

    #[test]
    fn at_most_one_attempt_per_student() {
        let (_dir, store) = store_with_test("att1");

        let first = store.record_score("s1", "t1", "stu1", 10.0).unwrap();
        let second = store.record_score("s1", "t1", "stu1", 30.0).unwrap();
        store.record_score("s1", "t1", "stu2", 20.0).unwrap();

        assert_eq!(first.id, second.id);
        let attempts = store.list_attempts("s1", "t1").unwrap();
        assert_eq!(attempts.len(), 2);
        let stu1 = attempts.iter().find(|a| a.student_id == "stu1").unwrap();
        assert_eq!(stu1.total_score, 30.0);
    }

    #[test]
    fn attempt_lookup_by_id() {
        let (_dir, store) = store_with_test("att2");
        let attempt = store.record_score("s1", "t1", "stu1", 12.5).unwrap();

        let found = store.require_attempt("s1", &attempt.id).unwrap();
        assert_eq!(found, attempt);
        assert!(store.get_attempt("s2", &attempt.id).unwrap().is_none());
    }

    #[test]
    fn invalid_scores_are_rejected() {
        let (_dir, store) = store_with_test("att3");
        assert!(matches!(
            store.record_score("s1", "t1", "stu1", -1.0),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.record_score("s1", "t1", "stu1", f64::NAN),
            Err(StoreError::Validation(_))
        ));
        assert!(matches!(
            store.record_score("s1", "missing", "stu1", 1.0),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn score_written_over_a_stale_read_is_rejected() {
        let (_dir, store) = store_with_test("att4");
        let key = keys::attempt_key("s1", "t1", "stu1").unwrap();
        let before_first_write = AttemptSnapshot {
            raw: store.attempts.get(key.as_bytes()).unwrap(),
            key,
        };

        let landed = store.record_score("s1", "t1", "stu1", 10.0).unwrap();
        let err = store
            .write_score("s1", "t1", "stu1", 20.0, &before_first_write)
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let attempts = store.list_attempts("s1", "t1").unwrap();
        assert_eq!(attempts, vec![landed]);
    }

    #[test]
    fn snapshot_matches_the_stored_row() {
        let (_dir, store) = store_with_test("att5");
        let attempt = store.record_score("s1", "t1", "stu1", 7.0).unwrap();

        let (read, snapshot) = store.snapshot_attempt("s1", &attempt.id).unwrap();
        assert_eq!(read, attempt);
        assert_eq!(snapshot.key, keys::attempt_key("s1", "t1", "stu1").unwrap());
        assert!(matches!(
            store.snapshot_attempt("s1", "nope"),
            Err(StoreError::NotFound { .. })
        ));
    }
}
