use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{delete, get, post, put};
use axum::Router;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::extractors::{JsonBody, Scope};
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::attempts::Attempt;
use crate::store::operations::questions::Question;
use crate::store::operations::test_papers::TestPaper;
use crate::validation::{validate_date, validate_id, validate_score, validate_term, validate_title};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_test).get(list_tests))
        .route("/:id", get(get_test))
        .route("/:id/questions", post(add_question))
        .route("/:id/questions/:question_id", delete(remove_question))
        .route("/:id/attempts", get(list_attempts))
        .route("/:id/attempts/:student_id", put(record_score))
}

fn check(result: Result<(), String>) -> Result<(), AppError> {
    result.map_err(|msg| AppError::validation(&msg))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateTestRequest {
    id: Option<String>,
    title: String,
    class_id: String,
    subject_id: String,
    teacher_id: String,
    term: Option<String>,
    date: Option<String>,
}

/// Create a test, or update the descriptive fields of an existing one. Marks stay derived
/// from the attached questions.
async fn create_test(
    scope: Scope,
    State(state): State<AppState>,
    JsonBody(req): JsonBody<CreateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let id = req
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    check(validate_id("id", &id))?;
    check(validate_title("title", &req.title))?;
    check(validate_id("classId", &req.class_id))?;
    check(validate_id("subjectId", &req.subject_id))?;
    check(validate_id("teacherId", &req.teacher_id))?;
    let term = req.term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
    if let Some(term) = &term {
        check(validate_term(term))?;
    }
    let date = req.date.filter(|d| !d.trim().is_empty());
    if let Some(date) = &date {
        check(validate_date("date", date))?;
    }

    let existing = state.store().get_test(&scope.school_id, &id)?;
    let now = Utc::now();
    let test = TestPaper {
        id,
        school_id: scope.school_id.clone(),
        title: req.title.trim().to_string(),
        class_id: req.class_id,
        subject_id: req.subject_id,
        teacher_id: req.teacher_id,
        term,
        date,
        total_marks: existing.as_ref().map_or(0, |t| t.total_marks),
        created_at: existing.as_ref().map_or(now, |t| t.created_at),
        updated_at: now,
    };
    state.store().upsert_test(&test)?;
    tracing::info!(school_id = %scope.school_id, test_id = %test.id, "Test saved");
    Ok(created(test))
}

async fn list_tests(
    scope: Scope,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let tests = state.store().list_tests(&scope.school_id)?;
    Ok(ok(tests))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TestDetail {
    #[serde(flatten)]
    test: TestPaper,
    questions: Vec<Question>,
}

async fn get_test(
    scope: Scope,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    check(validate_id("id", &id))?;
    let test = state.store().require_test(&scope.school_id, &id)?;
    let questions = state.store().list_questions(&scope.school_id, &id)?;
    Ok(ok(TestDetail { test, questions }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddQuestionRequest {
    id: Option<String>,
    topic_id: Option<String>,
    #[serde(default)]
    prompt: String,
    marks: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionChange {
    question: Option<Question>,
    test: TestPaper,
}

async fn add_question(
    scope: Scope,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
    JsonBody(req): JsonBody<AddQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    check(validate_id("testId", &test_id))?;
    let id = req
        .id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    check(validate_id("id", &id))?;
    let topic_id = req.topic_id.filter(|t| !t.trim().is_empty());
    if let Some(topic_id) = &topic_id {
        check(validate_id("topicId", topic_id))?;
    }

    let question = Question {
        id,
        school_id: scope.school_id.clone(),
        test_id,
        topic_id,
        prompt: req.prompt,
        marks: req.marks,
        created_at: Utc::now(),
    };
    let test = state.store().add_question(&question)?;
    Ok(created(QuestionChange {
        question: Some(question),
        test,
    }))
}

async fn remove_question(
    scope: Scope,
    State(state): State<AppState>,
    Path((test_id, question_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    check(validate_id("testId", &test_id))?;
    check(validate_id("questionId", &question_id))?;
    let test = state
        .store()
        .remove_question(&scope.school_id, &test_id, &question_id)?;
    Ok(ok(QuestionChange {
        question: None,
        test,
    }))
}

async fn list_attempts(
    scope: Scope,
    State(state): State<AppState>,
    Path(test_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    check(validate_id("testId", &test_id))?;
    state.store().require_test(&scope.school_id, &test_id)?;
    let mut attempts: Vec<Attempt> = state.store().list_attempts(&scope.school_id, &test_id)?;
    attempts.sort_by(|a, b| {
        a.submitted_at
            .cmp(&b.submitted_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(ok(attempts))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecordScoreRequest {
    total_score: f64,
}

async fn record_score(
    scope: Scope,
    State(state): State<AppState>,
    Path((test_id, student_id)): Path<(String, String)>,
    JsonBody(req): JsonBody<RecordScoreRequest>,
) -> Result<impl IntoResponse, AppError> {
    check(validate_id("testId", &test_id))?;
    check(validate_id("studentId", &student_id))?;
    check(validate_score("totalScore", req.total_score))?;

    let attempt = state
        .store()
        .record_score(&scope.school_id, &test_id, &student_id, req.total_score)?;
    tracing::info!(
        school_id = %scope.school_id,
        test_id = %test_id,
        attempt_id = %attempt.id,
        "Score recorded"
    );
    Ok(ok(attempt))
}
