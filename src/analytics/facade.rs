//! Scope filtering, concurrent fetch fan-out and report assembly.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use futures::stream::{self, StreamExt, TryStreamExt};

use crate::analytics::aggregate::{self, AttemptContext};
use crate::analytics::coverage::CoverageRow;
use crate::analytics::distribution;
use crate::analytics::normalize::{mean_pct, normalize};
use crate::analytics::report::{AnalyticsReport, TrendPoint};
use crate::analytics::scope::{ScopeContext, ScopeFilter};
use crate::analytics::source::{AnalyticsSource, SourceError};
use crate::analytics::topics;
use crate::analytics::types::{AnswerRecord, AttemptRecord, TestRecord};

#[derive(Debug, Clone)]
pub struct FacadeOptions {
    pub topic_limit: usize,
    /// Upper bound on in-flight fetches per fan-out batch.
    pub fetch_concurrency: usize,
}

impl Default for FacadeOptions {
    fn default() -> Self {
        Self {
            topic_limit: crate::constants::DEFAULT_TOPIC_LIMIT_SCHOOL,
            fetch_concurrency: crate::constants::DEFAULT_FETCH_CONCURRENCY,
        }
    }
}

/// Raw collections for one report, as fetched.
#[derive(Debug, Clone, Default)]
pub struct ReportInput {
    pub tests: Vec<TestRecord>,
    pub attempts: Vec<AttemptRecord>,
    pub answers: Vec<AnswerRecord>,
}

pub struct AnalyticsFacade<'s, S> {
    source: &'s S,
    options: FacadeOptions,
}

impl<'s, S: AnalyticsSource> AnalyticsFacade<'s, S> {
    pub fn new(source: &'s S, options: FacadeOptions) -> Self {
        Self { source, options }
    }

    /// Fetch everything in scope and build the report.
    ///
    /// Any failed fetch fails the whole call; no partial report is produced.
    pub async fn report(
        &self,
        scope: &ScopeContext,
        filter: &ScopeFilter,
    ) -> Result<AnalyticsReport, SourceError> {
        let input = self.fetch(scope, filter).await?;
        let report = compute_report(&input, filter, self.options.topic_limit);
        tracing::info!(
            school_id = %scope.school_id,
            tests = report.test_count,
            attempts = report.attempt_count,
            topics = report.weakest_topics.len(),
            "Analytics report computed"
        );
        Ok(report)
    }

    pub async fn fetch(
        &self,
        scope: &ScopeContext,
        filter: &ScopeFilter,
    ) -> Result<ReportInput, SourceError> {
        let concurrency = self.options.fetch_concurrency.max(1);

        let tests: Vec<TestRecord> = self
            .source
            .list_tests(scope)
            .await?
            .into_iter()
            .filter(|test| filter.matches(test))
            .collect();
        if tests.is_empty() {
            return Ok(ReportInput::default());
        }

        tracing::debug!(school_id = %scope.school_id, batch = tests.len(), "Fetching attempts");
        let pending: Vec<_> = tests
            .iter()
            .map(|test| self.source.list_attempts(scope, &test.id))
            .collect();
        let attempts: Vec<AttemptRecord> = stream::iter(pending)
            .buffer_unordered(concurrency)
            .try_concat()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Attempt fan-out failed"))?;

        let marked: Vec<&AttemptRecord> = attempts.iter().filter(|a| a.has_answers()).collect();
        tracing::debug!(school_id = %scope.school_id, batch = marked.len(), "Fetching answers");
        let pending: Vec<_> = marked
            .iter()
            .map(|attempt| self.source.list_answers(scope, &attempt.id))
            .collect();
        let answers: Vec<AnswerRecord> = stream::iter(pending)
            .buffer_unordered(concurrency)
            .try_concat()
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "Answer fan-out failed"))?;

        Ok(ReportInput {
            tests,
            attempts,
            answers,
        })
    }
}

/// Chronological order: dated tests ascending, undated last, id as tie-break.
fn chronological(a: &TestRecord, b: &TestRecord) -> Ordering {
    let date = |t: &TestRecord| t.date.clone().filter(|d| !d.is_empty());
    match (date(a), date(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
    .then_with(|| a.id.cmp(&b.id))
}

/// Build the report from already-fetched collections.
///
/// Pure: the output depends only on the arguments, and input order does not matter.
pub fn compute_report(
    input: &ReportInput,
    filter: &ScopeFilter,
    topic_limit: usize,
) -> AnalyticsReport {
    let mut tests: Vec<&TestRecord> = input.tests.iter().filter(|t| filter.matches(t)).collect();
    tests.sort_by(|a, b| chronological(a, b));

    let mut attempts_by_test: HashMap<&str, Vec<&AttemptRecord>> = HashMap::new();
    for attempt in &input.attempts {
        attempts_by_test
            .entry(attempt.test_id.as_str())
            .or_default()
            .push(attempt);
    }
    for group in attempts_by_test.values_mut() {
        group.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    let per_test: Vec<(&TestRecord, Vec<AttemptContext<'_>>)> = tests
        .iter()
        .map(|&test| {
            let in_test = attempts_by_test
                .get(test.id.as_str())
                .into_iter()
                .flatten()
                .map(|&attempt| AttemptContext {
                    test,
                    attempt,
                    pct: normalize(attempt.total_score, f64::from(test.total_marks)),
                })
                .collect();
            (test, in_test)
        })
        .collect();

    let trend: Vec<TrendPoint> = per_test
        .iter()
        .filter_map(|(test, in_test)| {
            let pcts: Vec<f64> = in_test.iter().filter_map(|c| c.pct).collect();
            mean_pct(pcts.iter().copied()).map(|avg_pct| TrendPoint {
                test_id: test.id.clone(),
                title: test.title.clone(),
                date: test.date.clone(),
                avg_pct,
                attempts: pcts.len() as u64,
            })
        })
        .collect();

    let coverage: Vec<CoverageRow> = per_test
        .iter()
        .map(|(test, in_test)| {
            let avg = mean_pct(in_test.iter().filter_map(|c| c.pct));
            CoverageRow::new(test, in_test.len(), avg)
        })
        .collect();

    let contexts: Vec<AttemptContext<'_>> = per_test
        .into_iter()
        .flat_map(|(_, in_test)| in_test)
        .collect();
    let percentages: Vec<f64> = contexts.iter().filter_map(|c| c.pct).collect();

    let attempt_ids: HashSet<&str> = contexts.iter().map(|c| c.attempt.id.as_str()).collect();
    let mut answers: Vec<AnswerRecord> = input
        .answers
        .iter()
        .filter(|a| attempt_ids.contains(a.attempt_id.as_str()))
        .cloned()
        .collect();
    answers.sort_by(|a, b| {
        a.attempt_id
            .cmp(&b.attempt_id)
            .then_with(|| a.question_id.cmp(&b.question_id))
            .then_with(|| a.id.cmp(&b.id))
    });

    AnalyticsReport {
        scope: filter.clone(),
        overall_avg_pct: mean_pct(percentages.iter().copied()),
        test_count: tests.len() as u64,
        attempt_count: contexts.len() as u64,
        trend,
        distribution: distribution::bucket(&percentages),
        by_class: aggregate::by_class(&contexts),
        by_subject: aggregate::by_subject(&contexts),
        by_teacher: aggregate::by_teacher(&contexts),
        by_student: aggregate::aggregate_students(&contexts),
        weakest_topics: topics::weakest_topics(&answers, topic_limit),
        has_answer_data: answers.iter().any(|a| a.topic.is_some()),
        coverage,
    }
}
