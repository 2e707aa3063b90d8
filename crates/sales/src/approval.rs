//! Approval sub-state transitions.
//!
//! An order that oversold (or whose requester wants a human to look at it)
//! moves to `needs_approval`; an approver then moves it to `approved`. There
//! is no reject path: a declined order is cancelled through the regular
//! status update once it has been approved, or stays in `needs_approval`.

use chrono::{DateTime, Utc};

use stocksmart_core::{DomainError, DomainResult, FieldError};

use crate::order::{ApprovalStatus, Order, OrderStatus};

impl Order {
    /// Whether an approval request (with or without a GRN) may be filed.
    pub fn accepts_approval_request(&self) -> bool {
        matches!(self.status, OrderStatus::Pending | OrderStatus::NeedsApproval)
    }

    /// Move to `needs_approval` and stamp the requester.
    ///
    /// The requester defaults to the customer name. Re-requesting while
    /// already in `needs_approval` refreshes the stamp.
    pub fn request_approval(
        &mut self,
        requested_by: Option<String>,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if !self.accepts_approval_request() {
            return Err(DomainError::invariant(format!(
                "cannot request approval for an order in status {}",
                self.status.as_str()
            )));
        }
        self.status = OrderStatus::NeedsApproval;
        self.approval_status = ApprovalStatus::NeedsApproval;
        self.approval_requested_by = requested_by
            .filter(|r| !r.trim().is_empty())
            .or_else(|| self.customer_name.clone());
        self.approval_requested_at = Some(now);
        if notes.is_some() {
            self.approval_notes = notes;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Final approval. Calling it again on an approved order overwrites the
    /// approver and timestamp (last write wins).
    pub fn approve(
        &mut self,
        approved_by: &str,
        notes: Option<String>,
        now: DateTime<Utc>,
    ) -> DomainResult<()> {
        if approved_by.trim().is_empty() {
            return Err(DomainError::InvalidFields(vec![FieldError::new(
                "approved_by",
                "cannot be empty",
            )]));
        }
        if !matches!(
            self.status,
            OrderStatus::Pending | OrderStatus::NeedsApproval | OrderStatus::Approved
        ) {
            return Err(DomainError::invariant(format!(
                "cannot approve an order in status {}",
                self.status.as_str()
            )));
        }
        self.status = OrderStatus::Approved;
        self.approval_status = ApprovalStatus::Approved;
        self.approved_by = Some(approved_by.trim().to_string());
        self.approved_at = Some(now);
        if notes.is_some() {
            self.approval_notes = notes;
        }
        self.updated_at = now;
        Ok(())
    }
}
