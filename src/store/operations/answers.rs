use std::collections::{HashMap, HashSet};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::transaction::ConflictableTransactionResult;
use sled::Transactional;

use crate::store::keys;
use crate::store::operations::attempts::{check_score, Attempt, AttemptSnapshot};
use crate::store::{retry_on_conflict, Store, StoreError};

/// Per-question marking for one attempt. Only present when a teacher marks answer by answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptAnswer {
    pub id: String,
    pub school_id: String,
    pub attempt_id: String,
    pub question_id: String,
    pub is_correct: bool,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerInput {
    pub question_id: String,
    pub is_correct: bool,
    pub score: f64,
}

impl Store {
    pub fn list_answers(&self, school_id: &str, attempt_id: &str) -> Result<Vec<AttemptAnswer>, StoreError> {
        let prefix = keys::answer_prefix(school_id, attempt_id)?;
        Self::scan_values(&self.attempt_answers, &prefix)
    }

    /// Replace every answer row of an attempt in one transaction and derive the attempt total
    /// from the new rows.
    pub fn replace_answers(
        &self,
        school_id: &str,
        attempt_id: &str,
        inputs: &[AnswerInput],
    ) -> Result<(Attempt, Vec<AttemptAnswer>), StoreError> {
        retry_on_conflict(|| {
            let (attempt, snapshot) = self.snapshot_attempt(school_id, attempt_id)?;
            self.write_answers(school_id, attempt, &snapshot, inputs)
        })
    }

    pub(crate) fn write_answers(
        &self,
        school_id: &str,
        attempt: Attempt,
        snapshot: &AttemptSnapshot,
        inputs: &[AnswerInput],
    ) -> Result<(Attempt, Vec<AttemptAnswer>), StoreError> {
        let marks_by_question: HashMap<String, u32> = self
            .list_questions(school_id, &attempt.test_id)?
            .into_iter()
            .map(|q| (q.id, q.marks))
            .collect();

        let mut seen = HashSet::new();
        for input in inputs {
            check_score(input.score)?;
            let Some(&marks) = marks_by_question.get(&input.question_id) else {
                return Err(StoreError::Validation(format!(
                    "question {} does not belong to test {}",
                    input.question_id, attempt.test_id
                )));
            };
            if input.score > f64::from(marks) {
                return Err(StoreError::Validation(format!(
                    "score {} exceeds {} marks for question {}",
                    input.score, marks, input.question_id
                )));
            }
            if !seen.insert(input.question_id.as_str()) {
                return Err(StoreError::Validation(format!(
                    "question {} answered twice",
                    input.question_id
                )));
            }
        }

        let answers: Vec<AttemptAnswer> = inputs
            .iter()
            .map(|input| AttemptAnswer {
                id: uuid::Uuid::new_v4().to_string(),
                school_id: school_id.to_string(),
                attempt_id: attempt.id.clone(),
                question_id: input.question_id.clone(),
                is_correct: input.is_correct,
                score: input.score,
            })
            .collect();

        let updated = Attempt {
            total_score: answers.iter().map(|a| a.score).sum(),
            answer_count: answers.len() as u32,
            submitted_at: Utc::now(),
            ..attempt
        };

        let attempt_bytes = Self::serialize(&updated)?;
        let rows = answers
            .iter()
            .map(|a| {
                Ok((
                    keys::answer_key(school_id, &a.attempt_id, &a.question_id)?,
                    Self::serialize(a)?,
                ))
            })
            .collect::<Result<Vec<(String, Vec<u8>)>, StoreError>>()?;
        let stale = self.answer_keys(school_id, &updated.id)?;

        (&self.attempts, &self.attempt_answers).transaction(
            |(tx_attempts, tx_answers)| -> ConflictableTransactionResult<(), StoreError> {
                snapshot.verify(tx_attempts)?;
                for key in &stale {
                    tx_answers.remove(key.clone())?;
                }
                for (key, bytes) in &rows {
                    tx_answers.insert(key.as_bytes(), bytes.as_slice())?;
                }
                tx_attempts.insert(snapshot.key.as_bytes(), attempt_bytes.as_slice())?;
                Ok(())
            },
        )?;

        tracing::debug!(
            school_id,
            attempt_id = %updated.id,
            removed = stale.len(),
            inserted = rows.len(),
            total_score = updated.total_score,
            "Answers replaced"
        );
        Ok((updated, answers))
    }
}
