//! Order list filtering and sorting.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::order::{ApprovalStatus, Order, OrderStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortBy {
    #[default]
    CreatedAt,
    Total,
    Status,
    ApprovalStatus,
    Customer,
}

impl OrderSortBy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created_at" => Some(OrderSortBy::CreatedAt),
            "total" => Some(OrderSortBy::Total),
            "status" => Some(OrderSortBy::Status),
            "approval_status" => Some(OrderSortBy::ApprovalStatus),
            "customer" => Some(OrderSortBy::Customer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Filters for listing orders. Range bounds are inclusive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub approval_status: Option<ApprovalStatus>,
    /// Case-insensitive substring of the customer name.
    pub customer: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
    pub min_total: Option<Decimal>,
    pub max_total: Option<Decimal>,
    pub sort_by: OrderSortBy,
    pub sort_order: SortOrder,
}

/// A row of the order list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderSummary {
    #[serde(flatten)]
    pub order: Order,
    pub item_count: usize,
}

impl OrderQuery {
    pub fn matches(&self, order: &Order) -> bool {
        if self.status.is_some_and(|s| s != order.status) {
            return false;
        }
        if self.approval_status.is_some_and(|s| s != order.approval_status) {
            return false;
        }
        if let Some(needle) = self.customer.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            let needle = needle.to_lowercase();
            let hit = order
                .customer_name
                .as_deref()
                .is_some_and(|name| name.to_lowercase().contains(&needle));
            if !hit {
                return false;
            }
        }
        if self.created_from.is_some_and(|from| order.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| order.created_at > to) {
            return false;
        }
        if self.min_total.is_some_and(|min| order.total < min) {
            return false;
        }
        if self.max_total.is_some_and(|max| order.total > max) {
            return false;
        }
        true
    }

    fn compare(&self, a: &Order, b: &Order) -> Ordering {
        let primary = match self.sort_by {
            OrderSortBy::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderSortBy::Total => a.total.cmp(&b.total),
            OrderSortBy::Status => a.status.as_str().cmp(b.status.as_str()),
            OrderSortBy::ApprovalStatus => a.approval_status.as_str().cmp(b.approval_status.as_str()),
            OrderSortBy::Customer => {
                let name = |o: &Order| o.customer_name.as_deref().map(str::to_lowercase);
                name(a).cmp(&name(b))
            }
        };
        // Ids are UUIDv7, so this keeps ties in creation order.
        let ordering = primary.then_with(|| a.id.cmp(&b.id));
        match self.sort_order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }

    pub fn sort(&self, rows: &mut [OrderSummary]) {
        rows.sort_by(|a, b| self.compare(&a.order, &b.order));
    }

    /// Filter and sort in one pass over `(order, item_count)` pairs.
    pub fn apply(&self, rows: impl IntoIterator<Item = (Order, usize)>) -> Vec<OrderSummary> {
        let mut out: Vec<OrderSummary> = rows
            .into_iter()
            .filter(|(order, _)| self.matches(order))
            .map(|(order, item_count)| OrderSummary { order, item_count })
            .collect();
        self.sort(&mut out);
        out
    }
}
