//! Join records handed to the analytics core by the data collaborator.
//!
//! Every relationship is resolved to a concrete value before it reaches the core, so the
//! aggregation code never inspects record shapes.

use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// A reference dimension resolved to its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedRef {
    pub id: String,
    pub name: String,
}

impl NamedRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Display-label order: letters compare case-insensitively first, and on an otherwise equal
/// label the lowercase form sorts ahead ("alpha" < "Alpha" < "beta" < "Zulu").
pub fn compare_labels(a: &str, b: &str) -> Ordering {
    let folded = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    folded.then_with(|| {
        a.chars()
            .zip(b.chars())
            .find(|(x, y)| x != y)
            .map_or(Ordering::Equal, |(x, y)| match (x.is_lowercase(), y.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => x.cmp(&y),
            })
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRef {
    pub id: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRecord {
    pub id: String,
    pub title: String,
    pub class: NamedRef,
    pub subject: NamedRef,
    pub teacher: NamedRef,
    pub term: Option<String>,
    /// ISO `YYYY-MM-DD`.
    pub date: Option<String>,
    pub total_marks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRecord {
    pub id: String,
    pub test_id: String,
    pub student: NamedRef,
    pub total_score: f64,
    pub submitted_at: DateTime<Utc>,
    /// Number of answer-level rows stored for this attempt.
    pub answer_count: u32,
}

impl AttemptRecord {
    pub fn has_answers(&self) -> bool {
        self.answer_count > 0
    }

    pub fn submitted_at_string(&self) -> String {
        self.submitted_at.to_rfc3339_opts(SecondsFormat::Secs, true)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerRecord {
    pub id: String,
    pub attempt_id: String,
    pub question_id: String,
    /// `None` when the question or its topic could not be resolved.
    pub topic: Option<TopicRef>,
    pub is_correct: bool,
    pub score: f64,
}
