//! Multi-dimension rollups over normalized attempts.
//!
//! The same fold serves class, subject, teacher and student rollups; only the key extractor
//! changes. Rows are ordered worst-first so intervention targets surface at the top.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::analytics::normalize::round2;
use crate::analytics::types::{compare_labels, AttemptRecord, NamedRef, TestRecord};

/// One attempt joined with its test and its normalized percentage.
#[derive(Debug, Clone, Copy)]
pub struct AttemptContext<'a> {
    pub test: &'a TestRecord,
    pub attempt: &'a AttemptRecord,
    pub pct: Option<f64>,
}

impl<'a> AttemptContext<'a> {
    /// Date used for recency: the test date when set, else the submission timestamp.
    fn recency_key(&self) -> Option<String> {
        match self.test.date.as_deref() {
            Some(date) if !date.is_empty() => Some(date.to_string()),
            _ => Some(self.attempt.submitted_at_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateRow {
    pub id: String,
    pub name: String,
    pub attempts: u64,
    pub tests_count: u64,
    pub avg_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRow {
    #[serde(flatten)]
    pub row: AggregateRow,
    pub latest_date: Option<String>,
}

#[derive(Debug)]
struct Group<'a> {
    name: &'a str,
    sum: f64,
    attempts: u64,
    tests: HashSet<&'a str>,
    latest: Option<String>,
}

fn fold_groups<'a, F>(records: &[AttemptContext<'a>], key_of: F) -> Vec<(&'a str, Group<'a>)>
where
    F: Fn(&AttemptContext<'a>) -> &'a NamedRef,
{
    let groups = records
        .iter()
        .filter_map(|ctx| ctx.pct.map(|pct| (ctx, pct)))
        .fold(
            HashMap::<&'a str, Group<'a>>::new(),
            |mut groups, (ctx, pct)| {
                let key = key_of(ctx);
                let group = groups.entry(key.id.as_str()).or_insert_with(|| Group {
                    name: key.name.as_str(),
                    sum: 0.0,
                    attempts: 0,
                    tests: HashSet::new(),
                    latest: None,
                });
                group.sum += pct;
                group.attempts += 1;
                group.tests.insert(ctx.test.id.as_str());
                let recency = ctx.recency_key();
                if recency > group.latest {
                    group.latest = recency;
                }
                groups
            },
        );

    groups.into_iter().collect()
}

fn to_row(id: &str, group: &Group<'_>) -> AggregateRow {
    AggregateRow {
        id: id.to_string(),
        name: group.name.to_string(),
        attempts: group.attempts,
        tests_count: group.tests.len() as u64,
        avg_pct: round2(group.sum / group.attempts as f64),
    }
}

fn worst_first(a: &AggregateRow, b: &AggregateRow) -> Ordering {
    a.avg_pct
        .partial_cmp(&b.avg_pct)
        .unwrap_or(Ordering::Equal)
        .then_with(|| compare_labels(&a.name, &b.name))
        .then_with(|| a.id.cmp(&b.id))
}

/// Group attempts by `key_of(..).id`. Attempts without a percentage are skipped; groups only
/// exist when at least one attempt contributed.
pub fn aggregate<'a, F>(records: &[AttemptContext<'a>], key_of: F) -> Vec<AggregateRow>
where
    F: Fn(&AttemptContext<'a>) -> &'a NamedRef,
{
    let mut rows: Vec<AggregateRow> = fold_groups(records, key_of)
        .iter()
        .map(|(id, group)| to_row(id, group))
        .collect();
    rows.sort_by(worst_first);
    rows
}

/// Student rollup: [`aggregate`] keyed by student, plus the most recent activity date.
pub fn aggregate_students(records: &[AttemptContext<'_>]) -> Vec<StudentRow> {
    let mut rows: Vec<StudentRow> = fold_groups(records, |ctx| &ctx.attempt.student)
        .iter()
        .map(|(id, group)| StudentRow {
            row: to_row(id, group),
            latest_date: group.latest.clone(),
        })
        .collect();
    rows.sort_by(|a, b| worst_first(&a.row, &b.row));
    rows
}

pub fn by_class<'a>(records: &[AttemptContext<'a>]) -> Vec<AggregateRow> {
    aggregate(records, |ctx| &ctx.test.class)
}

pub fn by_subject<'a>(records: &[AttemptContext<'a>]) -> Vec<AggregateRow> {
    aggregate(records, |ctx| &ctx.test.subject)
}

pub fn by_teacher<'a>(records: &[AttemptContext<'a>]) -> Vec<AggregateRow> {
    aggregate(records, |ctx| &ctx.test.teacher)
}
