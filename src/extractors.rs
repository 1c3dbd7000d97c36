use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use serde::de::DeserializeOwned;

use crate::analytics::{ActorRole, ScopeContext};
use crate::response::AppError;
use crate::validation::validate_id;

pub const SCHOOL_ID_HEADER: &str = "x-school-id";
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// A wrapper around `axum::Json<T>` that returns `AppError` on deserialization failure
/// instead of Axum's default plain-text rejection.
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection_to_app_error(rejection)),
        }
    }
}

fn json_rejection_to_app_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(e) => {
            tracing::warn!(error = %e, "JSON data deserialization failed");
            AppError::bad_request("INVALID_REQUEST_BODY", &e.body_text())
        }
        JsonRejection::JsonSyntaxError(e) => {
            tracing::warn!(error = %e, "JSON syntax parsing failed");
            AppError::bad_request("INVALID_REQUEST_BODY", "Malformed JSON body")
        }
        JsonRejection::MissingJsonContentType(e) => {
            tracing::warn!(error = %e, "Missing or invalid JSON Content-Type");
            AppError::bad_request("INVALID_REQUEST_BODY", "Expected an application/json body")
        }
        other => {
            tracing::warn!(error = %other, "Unexpected JSON body rejection");
            AppError::bad_request("INVALID_REQUEST_BODY", "Invalid request body")
        }
    }
}

impl<T> std::ops::Deref for JsonBody<T> {
    type Target = T;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T: serde::Serialize> IntoResponse for JsonBody<T> {
    fn into_response(self) -> axum::response::Response {
        axum::Json(self.0).into_response()
    }
}

/// Caller scope asserted by the upstream gateway. Every data access is confined to
/// `school_id`.
#[derive(Debug, Clone)]
pub struct Scope(pub ScopeContext);

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

pub fn scope_from_headers(headers: &HeaderMap) -> Result<ScopeContext, AppError> {
    let school_id = header_value(headers, SCHOOL_ID_HEADER).ok_or_else(|| {
        AppError::bad_request("MISSING_SCOPE", "x-school-id header is required")
    })?;
    validate_id(SCHOOL_ID_HEADER, school_id).map_err(|msg| AppError::validation(&msg))?;

    let actor_role = match header_value(headers, ACTOR_ROLE_HEADER) {
        Some(raw) => ActorRole::parse(raw).ok_or_else(|| {
            AppError::validation("x-actor-role must be admin or teacher")
        })?,
        None => ActorRole::default(),
    };

    Ok(ScopeContext {
        school_id: school_id.to_string(),
        actor_id: header_value(headers, ACTOR_ID_HEADER).map(str::to_string),
        actor_role,
    })
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Scope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        scope_from_headers(&parts.headers).map(Scope)
    }
}

impl std::ops::Deref for Scope {
    type Target = ScopeContext;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
