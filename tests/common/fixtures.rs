use chrono::Utc;

use assessment_analytics::store::operations::answers::AnswerInput;
use assessment_analytics::store::operations::attempts::Attempt;
use assessment_analytics::store::operations::questions::Question;
use assessment_analytics::store::operations::reference::{ReferenceEntity, ReferenceKind};
use assessment_analytics::store::operations::test_papers::TestPaper;
use assessment_analytics::store::Store;

pub fn seed_reference(store: &Store, school_id: &str, kind: ReferenceKind, id: &str, name: &str) {
    store
        .upsert_reference(
            kind,
            &ReferenceEntity {
                id: id.to_string(),
                school_id: school_id.to_string(),
                name: name.to_string(),
                updated_at: Utc::now(),
            },
        )
        .expect("seed reference");
}

pub struct TestSeed<'a> {
    pub id: &'a str,
    pub class_id: &'a str,
    pub subject_id: &'a str,
    pub teacher_id: &'a str,
    pub term: Option<&'a str>,
    pub date: Option<&'a str>,
}

pub fn seed_test(store: &Store, school_id: &str, seed: TestSeed<'_>) -> TestPaper {
    let now = Utc::now();
    let test = TestPaper {
        id: seed.id.to_string(),
        school_id: school_id.to_string(),
        title: format!("Test {}", seed.id),
        class_id: seed.class_id.to_string(),
        subject_id: seed.subject_id.to_string(),
        teacher_id: seed.teacher_id.to_string(),
        term: seed.term.map(str::to_string),
        date: seed.date.map(str::to_string),
        total_marks: 0,
        created_at: now,
        updated_at: now,
    };
    store.upsert_test(&test).expect("seed test");
    test
}

/// Attach `(question_id, topic_id, marks)` rows; returns the test with its recomputed total.
pub fn seed_questions(
    store: &Store,
    school_id: &str,
    test_id: &str,
    questions: &[(&str, Option<&str>, u32)],
) -> TestPaper {
    let mut last = None;
    for (id, topic_id, marks) in questions {
        last = Some(
            store
                .add_question(&Question {
                    id: id.to_string(),
                    school_id: school_id.to_string(),
                    test_id: test_id.to_string(),
                    topic_id: topic_id.map(str::to_string),
                    prompt: String::new(),
                    marks: *marks,
                    created_at: Utc::now(),
                })
                .expect("seed question"),
        );
    }
    last.unwrap_or_else(|| store.require_test(school_id, test_id).expect("test exists"))
}

pub fn seed_score(store: &Store, school_id: &str, test_id: &str, student_id: &str, score: f64) -> Attempt {
    store
        .record_score(school_id, test_id, student_id, score)
        .expect("seed score")
}

pub fn seed_answers(store: &Store, school_id: &str, attempt_id: &str, answers: &[(&str, bool, f64)]) -> Attempt {
    let inputs: Vec<AnswerInput> = answers
        .iter()
        .map(|(question_id, is_correct, score)| AnswerInput {
            question_id: question_id.to_string(),
            is_correct: *is_correct,
            score: *score,
        })
        .collect();
    store
        .replace_answers(school_id, attempt_id, &inputs)
        .expect("seed answers")
        .0
}
