use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    routing::{get, patch, post},
    Json, Router,
};

use stocksmart_core::OrderId;

use crate::app::routes::common::{created, ok};
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/status", patch(update_status))
        .route("/:id/request-approval", post(request_approval))
        .route("/:id/approve", post(approve_order))
        .route("/:id/grn", get(get_grn))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> axum::response::Response {
    let input = match body.into_domain() {
        Ok(v) => v,
        Err(fields) => return errors::field_errors(fields),
    };
    created(services.orders.create_order(input).await)
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::ListOrdersParams>,
) -> axum::response::Response {
    let query = match params.into_query() {
        Ok(v) => v,
        Err(fields) => return errors::field_errors(fields),
    };
    ok(services.orders.list_orders(&query).await)
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(services.orders.get_order(id).await)
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateOrderStatusRequest>,
) -> axum::response::Response {
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status = match body.into_domain() {
        Ok(v) => v,
        Err(fields) => return errors::field_errors(fields),
    };
    ok(services.orders.update_status(id, status).await)
}

/// Plain approval request, or GRN submission plus request when `grn` is present.
pub async fn request_approval(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::RequestApprovalRequest>,
) -> axum::response::Response {
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (request, grn) = match body.into_domain() {
        Ok(v) => v,
        Err(fields) => return errors::field_errors(fields),
    };
    match grn {
        Some(submission) => ok(services
            .approvals
            .submit_approval_with_grn(id, submission, request)
            .await),
        None => ok(services.approvals.request_approval(id, request).await),
    }
}

pub async fn approve_order(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::ApproveOrderRequest>,
) -> axum::response::Response {
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let (approved_by, notes) = match body.into_domain() {
        Ok(v) => v,
        Err(fields) => return errors::field_errors(fields),
    };
    ok(services.approvals.approve_order(id, &approved_by, notes).await)
}

/// `null` when the order has no GRN yet.
pub async fn get_grn(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match errors::parse_id(&id, "order") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    ok(services.approvals.get_order_grn(id).await)
}
