use chrono::Utc;

use stocksmart_core::OrderId;
use stocksmart_sales::{Grn, GrnHeader, GrnItemDetail, GrnWithItems, Order, OrderDetails};

use super::vendors::VendorDirectory;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::SharedStorage;

/// Who asks for approval and why.
#[derive(Debug, Clone, Default)]
pub struct ApprovalRequest {
    pub requested_by: Option<String>,
    pub notes: Option<String>,
}

/// A goods receipt note as submitted: header plus the full item set.
#[derive(Debug, Clone, Default)]
pub struct GrnSubmission {
    pub header: GrnHeader,
    pub items: Vec<GrnItemDetail>,
}

#[derive(Clone)]
pub struct ApprovalWorkflow {
    storage: SharedStorage,
    vendors: VendorDirectory,
}

impl ApprovalWorkflow {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            vendors: VendorDirectory::new(storage.clone()),
            storage,
        }
    }

    pub async fn request_approval(&self, id: OrderId, request: ApprovalRequest) -> ServiceResult<Order> {
        let mut order = self.require(id).await?;
        order.request_approval(request.requested_by, request.notes, Utc::now())?;
        self.storage.update_order(&order).await?;
        tracing::info!(
            order_id = %id,
            requested_by = order.approval_requested_by.as_deref().unwrap_or_default(),
            "approval requested"
        );
        Ok(order)
    }

    /// Attach (or replace) the order's GRN, then request approval.
    pub async fn submit_approval_with_grn(
        &self,
        id: OrderId,
        mut submission: GrnSubmission,
        request: ApprovalRequest,
    ) -> ServiceResult<OrderDetails> {
        let mut order = self.require(id).await?;
        self.vendors.link_receipt(&mut submission.header).await?;
        Grn::validate_submission(&submission.header, &submission.items)?;
        if !order.accepts_approval_request() {
            return Err(ServiceError::InvariantViolation(format!(
                "cannot request approval for an order in status {}",
                order.status.as_str()
            )));
        }

        let now = Utc::now();
        let existing = self.storage.get_grn(id).await?.map(|g| g.grn);
        let grn = Grn::upsert(existing, id, submission.header, now)?;
        let items = grn.replacement_items(submission.items);
        let saved = self.storage.save_grn(&grn, &items).await?;
        tracing::info!(order_id = %id, grn_id = %saved.grn.id, items = saved.items.len(), "grn saved");

        order.request_approval(request.requested_by, request.notes, now)?;
        self.storage.update_order(&order).await?;
        tracing::info!(order_id = %id, "approval requested with grn");

        let items = self.storage.order_items(id).await?;
        Ok(OrderDetails {
            order,
            items,
            grn: Some(saved),
        })
    }

    /// Final approval; approving again overwrites the approver (last write wins).
    pub async fn approve_order(
        &self,
        id: OrderId,
        approved_by: &str,
        notes: Option<String>,
    ) -> ServiceResult<Order> {
        let mut order = self.require(id).await?;
        order.approve(approved_by, notes, Utc::now())?;
        self.storage.update_order(&order).await?;
        tracing::info!(order_id = %id, approved_by = %approved_by.trim(), "order approved");
        Ok(order)
    }

    pub async fn get_order_grn(&self, id: OrderId) -> ServiceResult<Option<GrnWithItems>> {
        self.require(id).await?;
        Ok(self.storage.get_grn(id).await?)
    }

    async fn require(&self, id: OrderId) -> ServiceResult<Order> {
        self.storage
            .get_order(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order"))
    }
}
