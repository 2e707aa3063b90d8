use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stocksmart_core::{
    CustomerId, DomainError, DomainResult, Entity, FieldError, OrderId, OrderItemId, ProductId,
    UserId,
};

use crate::grn::GrnWithItems;

/// Order status lifecycle.
///
/// ```text
/// pending --> needs_approval --> approved --> shipped --> delivered
///    |                              |  \-----------------> delivered
///    |                              \--> cancelled
///    \--> shipped | delivered | cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    NeedsApproval,
    Approved,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::NeedsApproval => "needs_approval",
            OrderStatus::Approved => "approved",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "needs_approval" => Some(OrderStatus::NeedsApproval),
            "approved" => Some(OrderStatus::Approved),
            "shipped" => Some(OrderStatus::Shipped),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, NeedsApproval | Shipped | Delivered | Cancelled)
                | (NeedsApproval, Approved)
                | (Approved, Shipped | Delivered | Cancelled)
                | (Shipped, Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

/// Approval sub-state, tracked next to (not instead of) `OrderStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    NotRequired,
    NeedsApproval,
    Approved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::NotRequired => "not_required",
            ApprovalStatus::NeedsApproval => "needs_approval",
            ApprovalStatus::Approved => "approved",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "not_required" => Some(ApprovalStatus::NotRequired),
            "needs_approval" => Some(ApprovalStatus::NeedsApproval),
            "approved" => Some(ApprovalStatus::Approved),
            _ => None,
        }
    }
}

/// Order header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub order_number: String,
    pub customer_id: Option<CustomerId>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub status: OrderStatus,
    pub approval_status: ApprovalStatus,
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub notes: Option<String>,
    pub approval_requested_by: Option<String>,
    pub approval_requested_at: Option<DateTime<Utc>>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Line item, fixed at order creation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Decimal,
    pub total_price: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Decimal,
}

/// Input for placing an order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewOrder {
    pub customer_id: Option<CustomerId>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub tax: Option<Decimal>,
    pub notes: Option<String>,
    /// Who placed the order; used as approval requester on oversell.
    pub requested_by: Option<String>,
    /// Acting user, attributed on the stock movements.
    pub user_id: Option<UserId>,
    pub items: Vec<NewOrderItem>,
}

impl NewOrder {
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = Vec::new();
        if self.items.is_empty() {
            errors.push(FieldError::new("items", "at least one item is required"));
        }
        for (idx, item) in self.items.iter().enumerate() {
            if item.quantity <= 0 {
                errors.push(FieldError::new(format!("items[{idx}].quantity"), "must be positive"));
            }
            if item.unit_price.is_sign_negative() {
                errors.push(FieldError::new(
                    format!("items[{idx}].unit_price"),
                    "cannot be negative",
                ));
            }
        }
        if self.tax.is_some_and(|t| t.is_sign_negative()) {
            errors.push(FieldError::new("tax", "cannot be negative"));
        }
        if self.customer_email.as_deref().is_some_and(|e| !e.contains('@')) {
            errors.push(FieldError::new("customer_email", "must be an email address"));
        }
        if errors.is_empty() {
            if let Err(err) = self.totals() {
                errors.push(err);
            }
        }
        DomainError::check_fields(errors)
    }

    /// Line totals, subtotal and grand total, using checked decimal math.
    fn totals(&self) -> Result<OrderTotals, FieldError> {
        let too_large = |field: String| FieldError::new(field, "amount is too large");
        let mut lines = Vec::with_capacity(self.items.len());
        let mut subtotal = Decimal::ZERO;
        for (idx, item) in self.items.iter().enumerate() {
            let line = item
                .unit_price
                .checked_mul(Decimal::from(item.quantity))
                .ok_or_else(|| too_large(format!("items[{idx}].unit_price")))?;
            subtotal = subtotal
                .checked_add(line)
                .ok_or_else(|| too_large(format!("items[{idx}].unit_price")))?;
            lines.push(line);
        }
        let tax = self.tax.unwrap_or(Decimal::ZERO);
        let total = subtotal
            .checked_add(tax)
            .ok_or_else(|| too_large("tax".to_string()))?;
        Ok(OrderTotals {
            lines,
            subtotal,
            tax,
            total,
        })
    }
}

struct OrderTotals {
    lines: Vec<Decimal>,
    subtotal: Decimal,
    tax: Decimal,
    total: Decimal,
}

/// Order header plus everything owned by it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub grn: Option<GrnWithItems>,
}

/// `ORD-<unix millis>-<6 hex>`; the suffix comes from the random tail of a
/// UUIDv7 so two orders in the same millisecond still differ.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let entropy = Uuid::now_v7().simple().to_string();
    let suffix = &entropy[entropy.len() - 6..];
    format!("ORD-{}-{}", now.timestamp_millis(), suffix.to_uppercase())
}

impl Order {
    /// Build the order header and its items. Status starts `pending`; the
    /// caller escalates after decrementing stock if anything oversold.
    pub fn place(
        id: OrderId,
        order_number: String,
        customer_id: Option<CustomerId>,
        input: &NewOrder,
        now: DateTime<Utc>,
    ) -> DomainResult<(Order, Vec<OrderItem>)> {
        input.validate()?;
        let totals = input
            .totals()
            .map_err(|err| DomainError::InvalidFields(vec![err]))?;

        let items: Vec<OrderItem> = input
            .items
            .iter()
            .zip(totals.lines)
            .map(|(i, total_price)| OrderItem {
                id: OrderItemId::new(),
                order_id: id,
                product_id: i.product_id,
                quantity: i.quantity,
                unit_price: i.unit_price,
                total_price,
            })
            .collect();

        let order = Order {
            id,
            order_number,
            customer_id,
            customer_name: input.customer_name.clone(),
            customer_email: input.customer_email.clone(),
            customer_phone: input.customer_phone.clone(),
            status: OrderStatus::Pending,
            approval_status: ApprovalStatus::NotRequired,
            subtotal: totals.subtotal,
            tax: totals.tax,
            total: totals.total,
            notes: input.notes.clone(),
            approval_requested_by: None,
            approval_requested_at: None,
            approved_by: None,
            approved_at: None,
            approval_notes: None,
            created_at: now,
            updated_at: now,
        };
        Ok((order, items))
    }

    /// External status update, checked against the state machine.
    pub fn transition_to(&mut self, next: OrderStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invariant(format!(
                "cannot move order from {} to {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn one_item(quantity: i64, price: &str) -> NewOrder {
        NewOrder {
            customer_name: Some("Asha".to_string()),
            items: vec![NewOrderItem {
                product_id: ProductId::new(),
                quantity,
                unit_price: dec(price),
            }],
            ..NewOrder::default()
        }
    }

    #[test]
    fn place_computes_line_and_order_totals() {
        let mut input = one_item(3, "2.50");
        input.items.push(NewOrderItem {
            product_id: ProductId::new(),
            quantity: 1,
            unit_price: dec("10"),
        });
        input.tax = Some(dec("1.75"));

        let (order, items) =
            Order::place(OrderId::new(), "ORD-1".into(), None, &input, Utc::now()).unwrap();

        assert_eq!(items[0].total_price, dec("7.50"));
        assert_eq!(order.subtotal, dec("17.50"));
        assert_eq!(order.tax, dec("1.75"));
        assert_eq!(order.total, dec("19.25"));
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.approval_status, ApprovalStatus::NotRequired);
        assert!(items.iter().all(|i| i.order_id == order.id));
    }

    #[test]
    fn place_rejects_empty_and_non_positive_items() {
        let empty = NewOrder::default();
        assert!(matches!(
            Order::place(OrderId::new(), "X".into(), None, &empty, Utc::now()).unwrap_err(),
            DomainError::InvalidFields(_)
        ));

        match Order::place(OrderId::new(), "X".into(), None, &one_item(0, "1"), Utc::now())
            .unwrap_err()
        {
            DomainError::InvalidFields(f) => assert_eq!(f[0].field, "items[0].quantity"),
            other => panic!("expected InvalidFields, got {other:?}"),
        }
    }

    #[test]
    fn state_machine_allows_listed_transitions_only() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(NeedsApproval));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(NeedsApproval.can_transition_to(Approved));
        assert!(!NeedsApproval.can_transition_to(Shipped));
        assert!(Approved.can_transition_to(Shipped));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Cancelled.can_transition_to(Approved));
        assert!(!Pending.can_transition_to(Approved));
    }

    #[test]
    fn transition_to_rejects_illegal_moves() {
        let (mut order, _) =
            Order::place(OrderId::new(), "X".into(), None, &one_item(1, "1"), Utc::now()).unwrap();
        order.transition_to(OrderStatus::Cancelled, Utc::now()).unwrap();
        let err = order.transition_to(OrderStatus::Shipped, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(order.status, OrderStatus::Cancelled);
    }

    #[test]
    fn order_numbers_are_prefixed_and_distinct() {
        let now = Utc::now();
        let a = generate_order_number(now);
        let b = generate_order_number(now);
        assert!(a.starts_with(&format!("ORD-{}-", now.timestamp_millis())));
        assert_ne!(a, b);
    }

    #[test]
    fn status_strings_round_trip() {
        for s in [
            OrderStatus::Pending,
            OrderStatus::NeedsApproval,
            OrderStatus::Approved,
            OrderStatus::Shipped,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(s.as_str()), Some(s));
            assert_eq!(serde_json::to_value(s).unwrap(), s.as_str());
        }
    }

    #[test]
    fn oversized_line_total_is_a_field_error() {
        let mut input = one_item(10, "1");
        input.items[0].unit_price = Decimal::MAX;
        let err = Order::place(OrderId::new(), "ORD-1".into(), None, &input, Utc::now()).unwrap_err();
        match err {
            DomainError::InvalidFields(fields) => {
                assert_eq!(fields[0].field, "items[0].unit_price");
            }
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[test]
    fn oversized_subtotal_and_tax_are_rejected_by_validate() {
        let mut input = one_item(1, "1");
        input.items[0].unit_price = Decimal::MAX;
        input.items.push(NewOrderItem {
            product_id: ProductId::new(),
            quantity: 1,
            unit_price: Decimal::MAX,
        });
        let err = input.validate().unwrap_err();
        assert!(matches!(&err, DomainError::InvalidFields(f) if f[0].field == "items[1].unit_price"));

        let mut taxed = one_item(1, "1");
        taxed.items[0].unit_price = Decimal::MAX;
        taxed.tax = Some(Decimal::MAX);
        let err = taxed.validate().unwrap_err();
        assert!(matches!(&err, DomainError::InvalidFields(f) if f[0].field == "tax"));
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Property: order total is the sum of line totals plus tax, in cents.
            #[test]
            fn total_is_lines_plus_tax(
                lines in prop::collection::vec((1i64..1_000, 0i64..100_000), 1..20),
                tax_cents in 0i64..10_000
            ) {
                let input = NewOrder {
                    tax: Some(Decimal::new(tax_cents, 2)),
                    items: lines
                        .iter()
                        .map(|&(quantity, cents)| NewOrderItem {
                            product_id: ProductId::new(),
                            quantity,
                            unit_price: Decimal::new(cents, 2),
                        })
                        .collect(),
                    ..NewOrder::default()
                };
                let (order, items) =
                    Order::place(OrderId::new(), "ORD-P".into(), None, &input, Utc::now()).unwrap();

                let expected: i64 = lines.iter().map(|&(q, c)| q * c).sum::<i64>() + tax_cents;
                prop_assert_eq!(order.total, Decimal::new(expected, 2));
                prop_assert_eq!(items.len(), lines.len());
                prop_assert_eq!(order.status, OrderStatus::Pending);
            }
        }
    }
}
