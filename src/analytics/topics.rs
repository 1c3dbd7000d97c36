//! Topic weakness ranking from answer-level marking.
//!
//! Answer rows only exist when a teacher opted into per-question marking, so an empty result
//! means "no answer-level data", not "no weak topics".

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::analytics::normalize::round2;
use crate::analytics::types::{compare_labels, AnswerRecord};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicRow {
    pub topic_id: String,
    pub title: String,
    pub correct: u64,
    pub total: u64,
    pub pct_correct: f64,
}

#[derive(Debug, Default)]
struct Tally<'a> {
    title: &'a str,
    correct: u64,
    total: u64,
}

/// Rank topics by share of correct answers, lowest first, keeping at most `limit` rows.
/// Answers with no resolvable topic are ignored.
pub fn weakest_topics(answers: &[AnswerRecord], limit: usize) -> Vec<TopicRow> {
    let tallies = answers
        .iter()
        .filter_map(|answer| answer.topic.as_ref().map(|topic| (topic, answer.is_correct)))
        .fold(HashMap::<&str, Tally<'_>>::new(), |mut acc, (topic, is_correct)| {
            let tally = acc.entry(topic.id.as_str()).or_insert_with(|| Tally {
                title: topic.title.as_str(),
                ..Tally::default()
            });
            tally.total += 1;
            if is_correct {
                tally.correct += 1;
            }
            acc
        });

    let mut rows: Vec<TopicRow> = tallies
        .into_iter()
        .map(|(topic_id, tally)| TopicRow {
            topic_id: topic_id.to_string(),
            title: tally.title.to_string(),
            correct: tally.correct,
            total: tally.total,
            pct_correct: round2(tally.correct as f64 / tally.total as f64 * 100.0),
        })
        .collect();

    rows.sort_by(|a, b| {
        a.pct_correct
            .partial_cmp(&b.pct_correct)
            .unwrap_or(Ordering::Equal)
            .then_with(|| compare_labels(&a.title, &b.title))
            .then_with(|| a.topic_id.cmp(&b.topic_id))
    });
    rows.truncate(limit);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::types::TopicRef;

    fn answer(id: &str, topic: Option<(&str, &str)>, is_correct: bool) -> AnswerRecord {
        AnswerRecord {
            id: id.to_string(),
            attempt_id: "a1".to_string(),
            question_id: format!("q-{id}"),
            topic: topic.map(|(id, title)| TopicRef {
                id: id.to_string(),
                title: title.to_string(),
            }),
            is_correct,
            score: if is_correct { 1.0 } else { 0.0 },
        }
    }

    #[test]
    fn fractions_rank_before_algebra() {
        let answers = vec![
            answer("1", Some(("tp-frac", "Fractions")), true),
            answer("2", Some(("tp-frac", "Fractions")), false),
            answer("3", Some(("tp-alg", "Algebra")), true),
        ];

        let rows = weakest_topics(&answers, 5);
        assert_eq!(
            rows,
            vec![
                TopicRow {
                    topic_id: "tp-frac".to_string(),
                    title: "Fractions".to_string(),
                    correct: 1,
                    total: 2,
                    pct_correct: 50.0,
                },
                TopicRow {
                    topic_id: "tp-alg".to_string(),
                    title: "Algebra".to_string(),
                    correct: 1,
                    total: 1,
                    pct_correct: 100.0,
                },
            ]
        );
    }

    #[test]
    fn unresolved_topics_are_dropped() {
        let answers = vec![answer("1", None, false), answer("2", None, true)];
        assert!(weakest_topics(&answers, 5).is_empty());
    }

    #[test]
    fn ties_break_on_title_and_limit_truncates() {
        let answers = vec![
            answer("1", Some(("tp-z", "Vectors")), false),
            answer("2", Some(("tp-y", "Angles")), false),
            answer("3", Some(("tp-x", "Ratio")), false),
        ];

        let rows = weakest_topics(&answers, 2);
        let titles: Vec<&str> = rows.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Angles", "Ratio"]);
    }

    #[test]
    fn title_ties_ignore_case() {
        let answers = vec![
            answer("1", Some(("tp-1", "Vectors")), true),
            answer("2", Some(("tp-2", "angles")), true),
        ];

        let titles: Vec<String> = weakest_topics(&answers, 5)
            .into_iter()
            .map(|r| r.title)
            .collect();
        assert_eq!(titles, vec!["angles", "Vectors"]);
    }

    #[test]
    fn zero_limit_yields_nothing() {
        let answers = vec![answer("1", Some(("tp-x", "Ratio")), true)];
        assert!(weakest_topics(&answers, 0).is_empty());
    }
}
