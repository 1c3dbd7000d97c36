use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_QUESTIONS_PER_TEST;
use crate::store::keys;
use crate::store::operations::test_papers::TestPaper;
use crate::store::{Store, StoreError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub school_id: String,
    pub test_id: String,
    pub topic_id: Option<String>,
    pub prompt: String,
    pub marks: u32,
    pub created_at: DateTime<Utc>,
}

impl Store {
    pub fn get_question(
        &self,
        school_id: &str,
        test_id: &str,
        question_id: &str,
    ) -> Result<Option<Question>, StoreError> {
        let key = keys::question_key(school_id, test_id, question_id)?;
        match self.questions.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn list_questions(&self, school_id: &str, test_id: &str) -> Result<Vec<Question>, StoreError> {
        let prefix = keys::question_prefix(school_id, test_id)?;
        Self::scan_values(&self.questions, &prefix)
    }

    /// Attach (or replace) a question and recompute the test's total marks.
    pub fn add_question(&self, question: &Question) -> Result<TestPaper, StoreError> {
        self.require_test(&question.school_id, &question.test_id)?;
        let key = keys::question_key(&question.school_id, &question.test_id, &question.id)?;

        let existing = self.list_questions(&question.school_id, &question.test_id)?;
        let is_new = !existing.iter().any(|q| q.id == question.id);
        if is_new && existing.len() >= MAX_QUESTIONS_PER_TEST {
            return Err(StoreError::Validation(format!(
                "a test holds at most {MAX_QUESTIONS_PER_TEST} questions"
            )));
        }

        self.questions
            .insert(key.as_bytes(), Self::serialize(question)?)?;
        self.recompute_total_marks(&question.school_id, &question.test_id)
    }

    pub fn remove_question(
        &self,
        school_id: &str,
        test_id: &str,
        question_id: &str,
    ) -> Result<TestPaper, StoreError> {
        let key = keys::question_key(school_id, test_id, question_id)?;
        if self.questions.remove(key.as_bytes())?.is_none() {
            return Err(StoreError::not_found("question", question_id));
        }
        self.recompute_total_marks(school_id, test_id)
    }

    /// Recount AFTER the question write succeeded, then store the total on the test.
    fn recompute_total_marks(&self, school_id: &str, test_id: &str) -> Result<TestPaper, StoreError> {
        let total = self
            .list_questions(school_id, test_id)?
            .iter()
            .fold(0u32, |acc, q| acc.saturating_add(q.marks));
        tracing::debug!(school_id, test_id, total, "Recomputed total marks");
        self.set_total_marks(school_id, test_id, total)
    }
}
