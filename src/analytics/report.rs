use serde::{Deserialize, Serialize};

use crate::analytics::aggregate::{AggregateRow, StudentRow};
use crate::analytics::coverage::CoverageRow;
use crate::analytics::distribution::DistributionBucket;
use crate::analytics::scope::ScopeFilter;
use crate::analytics::topics::TopicRow;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPoint {
    pub test_id: String,
    pub title: String,
    pub date: Option<String>,
    pub avg_pct: f64,
    pub attempts: u64,
}

/// Everything a dashboard or export needs for one scope. Percentages are rounded to two
/// decimals; `None` means no computable data, never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub scope: ScopeFilter,
    pub overall_avg_pct: Option<f64>,
    pub test_count: u64,
    pub attempt_count: u64,
    pub trend: Vec<TrendPoint>,
    pub distribution: Vec<DistributionBucket>,
    pub by_class: Vec<AggregateRow>,
    pub by_subject: Vec<AggregateRow>,
    pub by_teacher: Vec<AggregateRow>,
    pub by_student: Vec<StudentRow>,
    pub weakest_topics: Vec<TopicRow>,
    pub has_answer_data: bool,
    pub coverage: Vec<CoverageRow>,
}
