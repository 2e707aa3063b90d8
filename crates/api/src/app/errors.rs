use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use stocksmart_core::FieldError;
use stocksmart_infra::ServiceError;

pub fn service_error_to_response(err: ServiceError) -> Response {
    match err {
        ServiceError::Validation { message, fields } => validation_error(message, fields),
        ServiceError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        ServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ServiceError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "storage failure");
            json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "an internal error occurred",
            )
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn validation_error(message: impl Into<String>, fields: Vec<FieldError>) -> Response {
    let mut body = json!({
        "error": "validation_error",
        "message": message.into(),
    });
    if !fields.is_empty() {
        body["fields"] = json!(fields);
    }
    (StatusCode::BAD_REQUEST, axum::Json(body)).into_response()
}

/// Collected boundary errors as a 400 listing every field.
pub fn field_errors(fields: Vec<FieldError>) -> Response {
    let message = fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    validation_error(message, fields)
}

/// Parse a path id or answer 400 `invalid_id`.
pub fn parse_id<T: std::str::FromStr>(raw: &str, what: &str) -> Result<T, Response> {
    raw.parse()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "invalid_id", format!("invalid {what} id")))
}
