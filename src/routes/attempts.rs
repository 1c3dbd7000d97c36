use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::extractors::{JsonBody, Scope};
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::store::operations::answers::{AnswerInput, AttemptAnswer};
use crate::store::operations::attempts::Attempt;
use crate::validation::{validate_id, validate_score};

pub fn router() -> Router<AppState> {
    Router::new().route("/:id/answers", get(list_answers).put(replace_answers))
}

async fn list_answers(
    scope: Scope,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    validate_id("attemptId", &attempt_id).map_err(|msg| AppError::validation(&msg))?;
    state.store().require_attempt(&scope.school_id, &attempt_id)?;
    let answers = state.store().list_answers(&scope.school_id, &attempt_id)?;
    Ok(ok(answers))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReplaceAnswersRequest {
    answers: Vec<AnswerInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MarkedAttempt {
    attempt: Attempt,
    answers: Vec<AttemptAnswer>,
}

async fn replace_answers(
    scope: Scope,
    State(state): State<AppState>,
    Path(attempt_id): Path<String>,
    JsonBody(req): JsonBody<ReplaceAnswersRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_id("attemptId", &attempt_id).map_err(|msg| AppError::validation(&msg))?;
    for (index, answer) in req.answers.iter().enumerate() {
        validate_id(&format!("answers[{index}].questionId"), &answer.question_id)
            .and_then(|_| validate_score(&format!("answers[{index}].score"), answer.score))
            .map_err(|msg| AppError::validation(&msg))?;
    }

    let (attempt, answers) =
        state
            .store()
            .replace_answers(&scope.school_id, &attempt_id, &req.answers)?;
    tracing::info!(
        school_id = %scope.school_id,
        attempt_id = %attempt.id,
        answers = answers.len(),
        "Answers replaced"
    );
    Ok(ok(MarkedAttempt { attempt, answers }))
}
