use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use assessment_analytics::analytics::coverage::{classify, CoverageStatus};
use assessment_analytics::analytics::normalize::normalize;
use assessment_analytics::analytics::types::{
    AnswerRecord, AttemptRecord, NamedRef, TestRecord, TopicRef,
};
use assessment_analytics::analytics::{
    compute_report, AnalyticsFacade, AnalyticsSource, FacadeOptions, ReportInput, ScopeContext,
    ScopeFilter, SourceError,
};

/// In-memory collaborator over a fixed input.
struct MemorySource(ReportInput);

impl AnalyticsSource for MemorySource {
    async fn list_tests(&self, _scope: &ScopeContext) -> Result<Vec<TestRecord>, SourceError> {
        Ok(self.0.tests.clone())
    }

    async fn list_attempts(
        &self,
        _scope: &ScopeContext,
        test_id: &str,
    ) -> Result<Vec<AttemptRecord>, SourceError> {
        Ok(self
            .0
            .attempts
            .iter()
            .filter(|a| a.test_id == test_id)
            .cloned()
            .collect())
    }

    async fn list_answers(
        &self,
        _scope: &ScopeContext,
        attempt_id: &str,
    ) -> Result<Vec<AnswerRecord>, SourceError> {
        Ok(self
            .0
            .answers
            .iter()
            .filter(|a| a.attempt_id == attempt_id)
            .cloned()
            .collect())
    }
}

const TOPICS: [&str; 3] = ["Algebra", "Fractions", "Geometry"];

fn build_input(
    tests: &[(u8, u32, Option<u8>)],
    attempts: &[(usize, u8, f64, Vec<(u8, bool)>)],
) -> ReportInput {
    let tests: Vec<TestRecord> = tests
        .iter()
        .enumerate()
        .map(|(i, (class, total_marks, day))| TestRecord {
            id: format!("t-{i}"),
            title: format!("Test {i}"),
            class: NamedRef::new(format!("c-{class}"), format!("Class {class}")),
            subject: NamedRef::new("maths", "Maths"),
            teacher: NamedRef::new(format!("tch-{}", class % 2), "Teacher"),
            term: None,
            date: day.map(|d| format!("2024-09-{:02}", d % 28 + 1)),
            total_marks: *total_marks,
        })
        .collect();

    let mut attempt_rows = Vec::new();
    let mut answer_rows = Vec::new();
    for (i, (test_index, student, score, answers)) in attempts.iter().enumerate() {
        let test = &tests[test_index % tests.len()];
        let id = format!("a-{i}");
        for (j, (topic, is_correct)) in answers.iter().enumerate() {
            let title = TOPICS[*topic as usize % TOPICS.len()];
            answer_rows.push(AnswerRecord {
                id: format!("{id}-{j}"),
                attempt_id: id.clone(),
                question_id: format!("q-{j}"),
                topic: Some(TopicRef {
                    id: title.to_lowercase(),
                    title: title.to_string(),
                }),
                is_correct: *is_correct,
                score: 1.0,
            });
        }
        attempt_rows.push(AttemptRecord {
            id,
            test_id: test.id.clone(),
            student: NamedRef::new(format!("stu-{student}"), format!("Student {student}")),
            total_score: *score,
            submitted_at: Utc.timestamp_opt(1_725_000_000 + i as i64, 0).unwrap(),
            answer_count: answers.len() as u32,
        });
    }

    ReportInput {
        tests,
        attempts: attempt_rows,
        answers: answer_rows,
    }
}

fn input_strategy() -> impl Strategy<Value = ReportInput> {
    (
        prop::collection::vec((0_u8..3, 0_u32..60, prop::option::of(0_u8..40)), 1..6),
        prop::collection::vec(
            (
                0_usize..6,
                0_u8..5,
                0.0_f64..60.0,
                prop::collection::vec((0_u8..3, any::<bool>()), 0..4),
            ),
            0..20,
        ),
    )
        .prop_map(|(tests, attempts)| build_input(&tests, &attempts))
}

proptest! {
    #[test]
    fn pt_normalize_stays_within_bounds(marks in 1_u32..500, fraction in 0.0_f64..=1.0) {
        let score = f64::from(marks) * fraction;
        let pct = normalize(score, f64::from(marks)).unwrap();
        prop_assert!((0.0..=100.0).contains(&pct));
    }

    #[test]
    fn pt_normalize_undefined_without_marks(score in -10.0_f64..100.0, marks in -5.0_f64..=0.0) {
        prop_assert_eq!(normalize(score, marks), None);
    }

    #[test]
    fn pt_distribution_counts_every_scored_attempt(input in input_strategy()) {
        let report = compute_report(&input, &ScopeFilter::default(), 5);
        let scored = input
            .attempts
            .iter()
            .filter(|a| input.tests.iter().any(|t| t.id == a.test_id && t.total_marks > 0))
            .count() as u64;

        prop_assert_eq!(report.distribution.len(), 5);
        let bucketed: u64 = report.distribution.iter().map(|b| b.count).sum();
        prop_assert_eq!(bucketed, scored);

        let by_class: u64 = report.by_class.iter().map(|r| r.attempts).sum();
        prop_assert_eq!(by_class, scored);
        prop_assert_eq!(report.attempt_count, input.attempts.len() as u64);
        prop_assert_eq!(report.overall_avg_pct.is_none(), scored == 0);
    }

    #[test]
    fn pt_rollups_are_worst_first(input in input_strategy(), limit in 1_usize..4) {
        let report = compute_report(&input, &ScopeFilter::default(), limit);
        for rows in [&report.by_class, &report.by_subject, &report.by_teacher] {
            prop_assert!(rows.windows(2).all(|w| w[0].avg_pct <= w[1].avg_pct));
        }
        prop_assert!(report.by_student.windows(2).all(|w| w[0].row.avg_pct <= w[1].row.avg_pct));
        prop_assert!(report.weakest_topics.len() <= limit);
        prop_assert!(report
            .weakest_topics
            .windows(2)
            .all(|w| w[0].pct_correct <= w[1].pct_correct));
    }

    #[test]
    fn pt_coverage_average_inverts_to_mean_score(input in input_strategy()) {
        let report = compute_report(&input, &ScopeFilter::default(), 5);
        for row in &report.coverage {
            let Some(avg_pct) = row.avg_pct else { continue };
            let scores: Vec<f64> = input
                .attempts
                .iter()
                .filter(|a| a.test_id == row.test_id)
                .map(|a| a.total_score)
                .collect();
            let mean_raw = scores.iter().sum::<f64>() / scores.len() as f64;
            let marks = f64::from(row.total_marks);
            prop_assert!((avg_pct * marks / 100.0 - mean_raw).abs() <= 0.01 * marks + 1e-9);
        }
    }

    #[test]
    fn pt_coverage_depends_only_on_marks_and_attempts(
        total_marks in 0_u32..100,
        attempts in 0_usize..5,
        title in "[A-Za-z ]{1,12}",
        day in prop::option::of(1_u8..28),
    ) {
        let base = TestRecord {
            id: "t-1".to_string(),
            title: "Baseline".to_string(),
            class: NamedRef::new("c-1", "7A"),
            subject: NamedRef::new("maths", "Maths"),
            teacher: NamedRef::new("tch-1", "Ms Hart"),
            term: None,
            date: None,
            total_marks,
        };
        let renamed = TestRecord {
            title,
            date: day.map(|d| format!("2024-10-{d:02}")),
            term: Some("Spring".to_string()),
            ..base.clone()
        };

        let status = classify(&base, attempts);
        prop_assert_eq!(status, classify(&renamed, attempts));
        let expected = match (attempts, total_marks) {
            (0, _) => CoverageStatus::PendingMarking,
            (_, 0) => CoverageStatus::MissingTotalMarks,
            _ => CoverageStatus::Recorded,
        };
        prop_assert_eq!(status, expected);
    }

    #[test]
    fn pt_report_ignores_input_order(input in input_strategy()) {
        let mut shuffled = input.clone();
        shuffled.tests.reverse();
        shuffled.attempts.reverse();
        shuffled.answers.reverse();

        let filter = ScopeFilter::default();
        prop_assert_eq!(compute_report(&input, &filter, 5), compute_report(&shuffled, &filter, 5));
    }

    #[test]
    fn pt_facade_matches_pure_report(input in input_strategy(), concurrency in 1_usize..8) {
        let source = MemorySource(input.clone());
        let facade = AnalyticsFacade::new(
            &source,
            FacadeOptions {
                topic_limit: 5,
                fetch_concurrency: concurrency,
            },
        );
        let scope = ScopeContext::new("school-1");
        let filter = ScopeFilter::default();

        let fetched = tokio_test::block_on(facade.report(&scope, &filter)).unwrap();
        prop_assert_eq!(fetched, compute_report(&input, &filter, 5));
    }
}
