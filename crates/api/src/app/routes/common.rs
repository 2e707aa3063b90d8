use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use stocksmart_infra::ServiceResult;

use crate::app::errors;

/// Serialize a service result, or map its error.
pub fn respond<T: Serialize>(status: StatusCode, result: ServiceResult<T>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub fn ok<T: Serialize>(result: ServiceResult<T>) -> Response {
    respond(StatusCode::OK, result)
}

pub fn created<T: Serialize>(result: ServiceResult<T>) -> Response {
    respond(StatusCode::CREATED, result)
}
