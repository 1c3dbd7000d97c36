use serde::{Deserialize, Serialize};

use crate::analytics::types::TestRecord;

/// Marking status of a test, derived on every read from its attempt count and total marks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageStatus {
    PendingMarking,
    MissingTotalMarks,
    Recorded,
}

impl CoverageStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CoverageStatus::PendingMarking => "pending_marking",
            CoverageStatus::MissingTotalMarks => "missing_total_marks",
            CoverageStatus::Recorded => "recorded",
        }
    }
}

/// First match wins: no attempts, then no total marks, then recorded.
pub fn classify(test: &TestRecord, attempt_count: usize) -> CoverageStatus {
    if attempt_count == 0 {
        CoverageStatus::PendingMarking
    } else if test.total_marks == 0 {
        CoverageStatus::MissingTotalMarks
    } else {
        CoverageStatus::Recorded
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRow {
    pub test_id: String,
    pub title: String,
    pub date: Option<String>,
    pub total_marks: u32,
    pub attempts: u64,
    pub status: CoverageStatus,
    pub avg_pct: Option<f64>,
}

impl CoverageRow {
    pub fn new(test: &TestRecord, attempt_count: usize, avg_pct: Option<f64>) -> Self {
        Self {
            test_id: test.id.clone(),
            title: test.title.clone(),
            date: test.date.clone(),
            total_marks: test.total_marks,
            attempts: attempt_count as u64,
            status: classify(test, attempt_count),
            avg_pct,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::types::NamedRef;

    fn test_with_marks(total_marks: u32) -> TestRecord {
        TestRecord {
            id: "t1".to_string(),
            title: "Unit quiz".to_string(),
            class: NamedRef::new("c1", "7A"),
            subject: NamedRef::new("s1", "Science"),
            teacher: NamedRef::new("u1", "Mr Diaz"),
            term: None,
            date: None,
            total_marks,
        }
    }

    #[test]
    fn no_attempts_is_pending_even_without_marks() {
        assert_eq!(classify(&test_with_marks(20), 0), CoverageStatus::PendingMarking);
        assert_eq!(classify(&test_with_marks(0), 0), CoverageStatus::PendingMarking);
    }

    #[test]
    fn attempts_without_total_marks() {
        assert_eq!(classify(&test_with_marks(0), 2), CoverageStatus::MissingTotalMarks);
    }

    #[test]
    fn attempts_with_total_marks_are_recorded() {
        assert_eq!(classify(&test_with_marks(50), 3), CoverageStatus::Recorded);
    }

    #[test]
    fn other_fields_do_not_affect_status() {
        let base = test_with_marks(10);
        let mut changed = base.clone();
        changed.title = "Renamed".to_string();
        changed.term = Some("T3".to_string());
        changed.date = Some("2024-09-01".to_string());
        changed.class = NamedRef::new("c9", "9Z");
        assert_eq!(classify(&base, 4), classify(&changed, 4));
    }

    #[test]
    fn status_serializes_as_snake_case() {
        let json = serde_json::to_value(CoverageStatus::MissingTotalMarks).unwrap();
        assert_eq!(json, serde_json::json!("missing_total_marks"));
        assert_eq!(CoverageStatus::Recorded.as_str(), "recorded");
    }
}
