use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;

use crate::analytics::{AnalyticsFacade, AnalyticsReport, ScopeFilter};
use crate::extractors::Scope;
use crate::reports::{csv, html, ExportSection};
use crate::response::{ok, AppError};
use crate::state::AppState;
use crate::validation::{validate_id, validate_term};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_report))
        .route("/export/:section", get(export_section))
        .route("/print", get(print_report))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    teacher_id: Option<String>,
    class_id: Option<String>,
    subject_id: Option<String>,
    term: Option<String>,
    topic_limit: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AnalyticsQuery {
    fn into_parts(self) -> Result<(ScopeFilter, Option<usize>), AppError> {
        let filter = ScopeFilter {
            teacher_id: non_blank(self.teacher_id),
            class_id: non_blank(self.class_id),
            subject_id: non_blank(self.subject_id),
            term: non_blank(self.term),
        };
        for (field, value) in [
            ("teacherId", &filter.teacher_id),
            ("classId", &filter.class_id),
            ("subjectId", &filter.subject_id),
        ] {
            if let Some(id) = value {
                validate_id(field, id).map_err(|msg| AppError::validation(&msg))?;
            }
        }
        if let Some(term) = &filter.term {
            validate_term(term).map_err(|msg| AppError::validation(&msg))?;
        }

        let topic_limit = match non_blank(self.topic_limit) {
            Some(raw) => Some(raw.parse::<usize>().map_err(|_| {
                AppError::validation("topicLimit must be a positive integer")
            })?),
            None => None,
        };
        Ok((filter, topic_limit))
    }
}

async fn build_report(
    state: &AppState,
    scope: &Scope,
    query: AnalyticsQuery,
) -> Result<AnalyticsReport, AppError> {
    let (filter, requested_limit) = query.into_parts()?;
    let analytics = &state.config().analytics;
    let topic_limit = analytics.topic_limit(filter.is_school_wide(), requested_limit);

    let facade = AnalyticsFacade::new(state.store(), analytics.facade_options(topic_limit));
    let report = facade.report(scope, &filter).await?;
    Ok(report)
}

async fn get_report(
    scope: Scope,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = build_report(&state, &scope, query).await?;
    Ok(ok(report))
}

async fn export_section(
    scope: Scope,
    State(state): State<AppState>,
    Path(section): Path<String>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let section = ExportSection::parse(&section)
        .ok_or_else(|| AppError::not_found(&format!("Unknown export section: {section}")))?;
    let report = build_report(&state, &scope, query).await?;

    tracing::info!(school_id = %scope.school_id, section = section.as_str(), "Analytics export");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", section.file_name()),
            ),
        ],
        csv::section_csv(&report, section),
    ))
}

async fn print_report(
    scope: Scope,
    State(state): State<AppState>,
    Query(query): Query<AnalyticsQuery>,
) -> Result<impl IntoResponse, AppError> {
    let report = build_report(&state, &scope, query).await?;
    Ok(Html(html::render_print(&report, &scope.school_id)))
}
