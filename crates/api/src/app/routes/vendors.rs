use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    routing::{get, patch, post},
    Json, Router,
};

use stocksmart_core::VendorId;

use crate::app::routes::common::{created, ok};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_vendor).get(list_vendors))
        .route("/:id", get(get_vendor).patch(update_vendor))
        .route("/:id/status", patch(update_vendor_status))
}

pub async fn create_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateVendorRequest>,
) -> axum::response::Response {
    let input = match body.into_domain() {
        Ok(v) => v,
        Err(fields) => return errors::field_errors(fields),
    };
    created(services.vendors.create_vendor(input).await)
}

pub async fn list_vendors(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListVendorsParams>,
) -> axum::response::Response {
    let filter = match params.into_filter() {
        Ok(v) => v,
        Err(fields) => return errors::field_errors(fields),
    };
    ok(services.vendors.list_vendors(&filter).await)
}

pub async fn get_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: VendorId = match errors::parse_id(&id, "vendor") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(services.vendors.get_vendor(id).await)
}

pub async fn update_vendor(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateVendorRequest>,
) -> axum::response::Response {
    let id: VendorId = match errors::parse_id(&id, "vendor") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(services.vendors.update_vendor(id, body.into_domain()).await)
}

pub async fn update_vendor_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateVendorStatusRequest>,
) -> axum::response::Response {
    let id: VendorId = match errors::parse_id(&id, "vendor") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match body.into_domain() {
        Ok(v) => v,
        Err(fields) => return errors::field_errors(fields),
    };
    ok(services.vendors.set_status(id, status).await)
}
