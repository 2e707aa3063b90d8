//! Sales domain module: orders, approval escalation and goods receipt notes.
//!
//! Pure domain logic (no IO, no HTTP, no storage). Stock decrement and
//! customer resolution are orchestrated by the infrastructure service layer;
//! this crate owns the order record, its status state machine, the approval
//! sub-state and the GRN that may justify an approval.

pub mod approval;
pub mod grn;
pub mod order;
pub mod query;

pub use grn::{Grn, GrnHeader, GrnItem, GrnItemDetail, GrnWithItems};
pub use order::{
    ApprovalStatus, NewOrder, NewOrderItem, Order, OrderDetails, OrderItem, OrderStatus,
    generate_order_number,
};
pub use query::{OrderQuery, OrderSortBy, OrderSummary, SortOrder};
pub use stocksmart_core::OrderId;
