//! Order Engine.
//!
//! Placing an order decrements stock for every item unconditionally. Any item
//! that asks for more than was available escalates the whole order to
//! `needs_approval`. The steps are not wrapped in one transaction: a failure
//! half-way leaves the earlier items decremented.

use chrono::Utc;

use stocksmart_core::OrderId;
use stocksmart_inventory::NewStockMovement;
use stocksmart_products::LedgerAction;
use stocksmart_sales::{
    generate_order_number, NewOrder, Order, OrderDetails, OrderQuery, OrderStatus, OrderSummary,
};

use super::customers::CustomerDirectory;
use super::ledger::ProductLedger;
use super::movements::StockMovementLog;
use crate::error::{ServiceError, ServiceResult};
use crate::storage::SharedStorage;

#[derive(Clone)]
pub struct OrderEngine {
    storage: SharedStorage,
    ledger: ProductLedger,
    movements: StockMovementLog,
    customers: CustomerDirectory,
}

impl OrderEngine {
    pub fn new(storage: SharedStorage) -> Self {
        Self {
            ledger: ProductLedger::new(storage.clone()),
            movements: StockMovementLog::new(storage.clone()),
            customers: CustomerDirectory::new(storage.clone()),
            storage,
        }
    }

    pub async fn create_order(&self, input: NewOrder) -> ServiceResult<OrderDetails> {
        input.validate()?;
        for item in &input.items {
            if self.storage.get_product(item.product_id).await?.is_none() {
                return Err(ServiceError::not_found(format!("product {}", item.product_id)));
            }
        }

        let now = Utc::now();
        let customer = self.customers.resolve_for_order(&input).await?;
        let (mut order, items) = Order::place(
            OrderId::new(),
            generate_order_number(now),
            customer.as_ref().map(|c| c.id),
            &input,
            now,
        )?;
        if let Some(customer) = &customer {
            order.customer_name = order.customer_name.or_else(|| Some(customer.name.clone()));
            order.customer_email = order.customer_email.or_else(|| customer.contact.email.clone());
            order.customer_phone = order.customer_phone.or_else(|| customer.contact.phone.clone());
        }
        self.storage.insert_order(&order, &items).await?;

        let reason = format!("Order {}", order.order_number);
        let mut oversold = Vec::new();
        for item in &items {
            let change = self
                .ledger
                .apply_stock_change(item.product_id, LedgerAction::Use, item.quantity)
                .await?;
            if change.oversold() {
                tracing::warn!(
                    order_id = %order.id,
                    product_id = %item.product_id,
                    requested = item.quantity,
                    available = change.previous.available(),
                    "order item oversells stock"
                );
                oversold.push(item.product_id);
            }
            self.movements
                .record(
                    NewStockMovement::from_change(item.product_id, &change, reason.clone())
                        .with_user(input.user_id)
                        .with_order(order.id),
                )
                .await?;
        }

        if !oversold.is_empty() {
            order.request_approval(input.requested_by.clone(), None, Utc::now())?;
            self.storage.update_order(&order).await?;
        }

        tracing::info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total,
            status = order.status.as_str(),
            oversold_items = oversold.len(),
            "order created"
        );
        Ok(OrderDetails {
            order,
            items,
            grn: None,
        })
    }

    /// External status update, validated against the state machine.
    pub async fn update_status(&self, id: OrderId, next: OrderStatus) -> ServiceResult<Order> {
        let mut order = self.require(id).await?;
        let previous = order.status;
        order.transition_to(next, Utc::now())?;
        self.storage.update_order(&order).await?;
        tracing::info!(order_id = %id, from = previous.as_str(), to = next.as_str(), "order status updated");
        Ok(order)
    }

    pub async fn get_order(&self, id: OrderId) -> ServiceResult<OrderDetails> {
        let order = self.require(id).await?;
        let items = self.storage.order_items(id).await?;
        let grn = self.storage.get_grn(id).await?;
        Ok(OrderDetails { order, items, grn })
    }

    pub async fn list_orders(&self, query: &OrderQuery) -> ServiceResult<Vec<OrderSummary>> {
        Ok(query.apply(self.storage.list_orders().await?))
    }

    async fn require(&self, id: OrderId) -> ServiceResult<Order> {
        self.storage
            .get_order(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("order"))
    }
}
