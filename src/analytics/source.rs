//! Boundary to whatever supplies tests, attempts and answers for a school.

use std::future::Future;

use thiserror::Error;

use crate::analytics::scope::ScopeContext;
use crate::analytics::types::{AnswerRecord, AttemptRecord, TestRecord};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to fetch {what}: {message}")]
    Fetch { what: String, message: String },
    #[error("{entity} not found: {key}")]
    NotFound { entity: String, key: String },
}

impl SourceError {
    pub fn fetch(what: impl Into<String>, message: impl Into<String>) -> Self {
        SourceError::Fetch {
            what: what.into(),
            message: message.into(),
        }
    }
}

/// Data collaborator for the analytics facade.
///
/// Implementations must only return records belonging to `scope.school_id`. Timeouts and
/// cancellation are theirs to own.
pub trait AnalyticsSource: Sync {
    fn list_tests(
        &self,
        scope: &ScopeContext,
    ) -> impl Future<Output = Result<Vec<TestRecord>, SourceError>> + Send;

    fn list_attempts(
        &self,
        scope: &ScopeContext,
        test_id: &str,
    ) -> impl Future<Output = Result<Vec<AttemptRecord>, SourceError>> + Send;

    fn list_answers(
        &self,
        scope: &ScopeContext,
        attempt_id: &str,
    ) -> impl Future<Output = Result<Vec<AnswerRecord>, SourceError>> + Send;
}
