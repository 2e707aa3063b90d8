use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    routing::get,
    Router,
};

use crate::app::dto;
use crate::app::routes::common::ok;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new().route("/", get(list_movements))
}

/// Global log, newest first.
pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::LimitParams>,
) -> axum::response::Response {
    ok(services.movements.list(params.limit).await)
}
