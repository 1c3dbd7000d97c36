use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::keys;
use crate::store::{Store, StoreError};

/// A paper-based test. `total_marks` tracks the sum of attached question marks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPaper {
    pub id: String,
    pub school_id: String,
    pub title: String,
    pub class_id: String,
    pub subject_id: String,
    pub teacher_id: String,
    pub term: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub total_marks: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    pub fn upsert_test(&self, test: &TestPaper) -> Result<(), StoreError> {
        let key = keys::test_key(&test.school_id, &test.id)?;
        self.tests.insert(key.as_bytes(), Self::serialize(test)?)?;
        Ok(())
    }

    pub fn get_test(&self, school_id: &str, test_id: &str) -> Result<Option<TestPaper>, StoreError> {
        let key = keys::test_key(school_id, test_id)?;
        match self.tests.get(key.as_bytes())? {
            Some(raw) => Ok(Some(Self::deserialize(&raw)?)),
            None => Ok(None),
        }
    }

    pub fn require_test(&self, school_id: &str, test_id: &str) -> Result<TestPaper, StoreError> {
        self.get_test(school_id, test_id)?
            .ok_or_else(|| StoreError::not_found("test", test_id))
    }

    /// All tests of a school, by date (undated last) then id.
    pub fn list_tests(&self, school_id: &str) -> Result<Vec<TestPaper>, StoreError> {
        let prefix = keys::school_prefix(school_id)?;
        let mut tests: Vec<TestPaper> = Self::scan_values(&self.tests, &prefix)?;
        tests.sort_by(|a, b| match (&a.date, &b.date) {
            (Some(x), Some(y)) => x.cmp(y).then_with(|| a.id.cmp(&b.id)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.id.cmp(&b.id),
        });
        Ok(tests)
    }

    pub(crate) fn set_total_marks(
        &self,
        school_id: &str,
        test_id: &str,
        total_marks: u32,
    ) -> Result<TestPaper, StoreError> {
        let mut test = self.require_test(school_id, test_id)?;
        test.total_marks = total_marks;
        test.updated_at = Utc::now();
        self.upsert_test(&test)?;
        Ok(test)
    }
}
