use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::{json, Value};

use super::domain::UserId;
use super::error::AssessmentError;
use super::repository::{DocumentStore, ProfileStore};
use super::scoring::ProfileOverrides;
use super::service::{EligibilityService, EligibilityServiceError};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct AsOfQuery {
    as_of: Option<NaiveDate>,
}

fn as_of_or_today(as_of: Option<NaiveDate>) -> NaiveDate {
    as_of.unwrap_or_else(|| Local::now().date_naive())
}

/// Router builder exposing requirement, scoring, checklist and band endpoints.
pub fn eligibility_router<P, D>(service: Arc<EligibilityService<P, D>>) -> Router
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/eligibility/:user_id/requirements",
            get(requirements_handler::<P, D>),
        )
        .route(
            "/api/v1/eligibility/:user_id/crs/compute",
            post(compute_handler::<P, D>),
        )
        .route(
            "/api/v1/eligibility/:user_id/documents",
            get(documents_handler::<P, D>),
        )
        .route(
            "/api/v1/eligibility/crs/bands/:total",
            get(band_handler::<P, D>),
        )
        .with_state(service)
}

pub(crate) async fn requirements_handler<P, D>(
    State(service): State<Arc<EligibilityService<P, D>>>,
    Path(user_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    match service.requirements(&UserId(user_id), as_of_or_today(query.as_of)) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

/// Body is optional: `{ "overrides": {...}, "as_of": "YYYY-MM-DD" }`.
pub(crate) async fn compute_handler<P, D>(
    State(service): State<Arc<EligibilityService<P, D>>>,
    Path(user_id): Path<String>,
    body: Result<axum::Json<Value>, JsonRejection>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    let body = match body {
        Ok(axum::Json(value)) => value,
        Err(JsonRejection::MissingJsonContentType(_)) => Value::Null,
        Err(rejection) => return bad_request(rejection.body_text()),
    };

    let overrides = match body.get("overrides") {
        Some(value) => match ProfileOverrides::from_json(value) {
            Ok(overrides) => Some(overrides),
            Err(err) => return bad_request(err.to_string()),
        },
        None => None,
    };
    let as_of = match body.get("as_of") {
        None | Some(Value::Null) => None,
        Some(Value::String(raw)) => match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => return bad_request(format!("as_of '{raw}' must be YYYY-MM-DD")),
        },
        Some(other) => return bad_request(format!("as_of must be a date string, found {other}")),
    };

    match service.compute(
        &UserId(user_id),
        overrides.as_ref(),
        as_of_or_today(as_of),
    ) {
        Ok(view) => (StatusCode::OK, axum::Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn documents_handler<P, D>(
    State(service): State<Arc<EligibilityService<P, D>>>,
    Path(user_id): Path<String>,
    Query(query): Query<AsOfQuery>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    let user = UserId(user_id);
    match service.document_checklist(&user, as_of_or_today(query.as_of)) {
        Ok(documents) => {
            let payload = json!({
                "user_id": user,
                "documents": documents,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn band_handler<P, D>(
    State(service): State<Arc<EligibilityService<P, D>>>,
    Path(total): Path<u16>,
) -> Response
where
    P: ProfileStore + 'static,
    D: DocumentStore + 'static,
{
    let classification = service.engine().classify(total);
    let payload = json!({
        "total": total,
        "classification": classification,
    });
    (StatusCode::OK, axum::Json(payload)).into_response()
}

fn bad_request(message: String) -> Response {
    let payload = json!({ "error": message });
    (StatusCode::BAD_REQUEST, axum::Json(payload)).into_response()
}

fn error_response(err: EligibilityServiceError) -> Response {
    match err {
        EligibilityServiceError::Assessment(AssessmentError::Gating(gating)) => {
            let payload = json!({
                "error": gating.to_string(),
                "report": gating.report,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        EligibilityServiceError::Assessment(AssessmentError::Validation(validation)) => {
            bad_request(validation.to_string())
        }
        EligibilityServiceError::UnknownUser(user) => {
            let payload = json!({
                "error": "profile not found",
                "user_id": user,
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
