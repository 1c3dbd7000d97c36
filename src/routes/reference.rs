use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use chrono::Utc;
use serde::Deserialize;

use crate::extractors::{JsonBody, Scope};
use crate::response::{created, ok, AppError};
use crate::state::AppState;
use crate::store::operations::reference::{ReferenceEntity, ReferenceKind};
use crate::validation::{validate_id, validate_title};

pub fn router() -> Router<AppState> {
    Router::new().route("/:kind", get(list_references).post(upsert_reference))
}

fn parse_kind(raw: &str) -> Result<ReferenceKind, AppError> {
    ReferenceKind::parse(raw)
        .ok_or_else(|| AppError::not_found(&format!("Unknown reference kind: {raw}")))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpsertReferenceRequest {
    id: String,
    name: String,
}

async fn upsert_reference(
    scope: Scope,
    State(state): State<AppState>,
    Path(kind): Path<String>,
    JsonBody(req): JsonBody<UpsertReferenceRequest>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    validate_id("id", &req.id).map_err(|msg| AppError::validation(&msg))?;
    validate_title("name", &req.name).map_err(|msg| AppError::validation(&msg))?;

    let entity = ReferenceEntity {
        id: req.id,
        school_id: scope.school_id.clone(),
        name: req.name.trim().to_string(),
        updated_at: Utc::now(),
    };
    state.store().upsert_reference(kind, &entity)?;
    tracing::debug!(school_id = %scope.school_id, kind = kind.as_str(), id = %entity.id, "Reference upserted");
    Ok(created(entity))
}

async fn list_references(
    scope: Scope,
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let kind = parse_kind(&kind)?;
    let rows = state.store().list_references(kind, &scope.school_id)?;
    Ok(ok(rows))
}
