//! Request DTOs and their conversion into domain inputs.
//!
//! Conversion only covers what JSON cannot express: required fields, ids,
//! enums and dates. Content rules (non-empty names, non-negative amounts)
//! stay with the domain constructors. Every problem found is collected so a
//! single 400 lists all bad fields.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use stocksmart_core::{CustomerId, FieldError, ProductId, UserId, VendorId, WarehouseId};
use stocksmart_infra::services::{
    ApprovalRequest, GrnSubmission, ProductFilter, StockRequest, VendorFilter,
};
use stocksmart_inventory::{BinLocation, MovementAction, NewWarehouse};
use stocksmart_parties::{ContactInfo, NewCustomer, NewVendor, VendorPatch, VendorStatus};
use stocksmart_products::{NewProduct, ProductPatch};
use stocksmart_sales::{
    ApprovalStatus, GrnHeader, GrnItemDetail, NewOrder, NewOrderItem, OrderQuery, OrderSortBy,
    OrderStatus, SortOrder,
};

pub type Converted<T> = Result<T, Vec<FieldError>>;

#[derive(Default)]
struct Fields(Vec<FieldError>);

impl Fields {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError::new(field, message));
    }

    fn required<T>(&mut self, field: &str, value: Option<T>) -> Option<T> {
        if value.is_none() {
            self.push(field, "is required");
        }
        value
    }

    fn id<T: FromStr>(&mut self, field: &str, raw: Option<&str>) -> Option<T> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        match raw.parse() {
            Ok(id) => Some(id),
            Err(_) => {
                self.push(field, "is not a valid id");
                None
            }
        }
    }

    fn date(&mut self, field: &str, raw: Option<&str>) -> Option<NaiveDate> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
            Ok(d) => Some(d),
            Err(_) => {
                self.push(field, "must be a YYYY-MM-DD date");
                None
            }
        }
    }

    fn timestamp(&mut self, field: &str, raw: Option<&str>) -> Option<DateTime<Utc>> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        match DateTime::parse_from_rfc3339(raw) {
            Ok(ts) => Some(ts.with_timezone(&Utc)),
            Err(_) => {
                self.push(field, "must be an RFC 3339 timestamp");
                None
            }
        }
    }

    fn decimal(&mut self, field: &str, raw: Option<&str>) -> Option<Decimal> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        match Decimal::from_str(raw) {
            Ok(d) => Some(d),
            Err(_) => {
                self.push(field, "must be a decimal number");
                None
            }
        }
    }

    fn vendor_status(&mut self, raw: Option<&str>) -> Option<VendorStatus> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
        let status = VendorStatus::parse(raw);
        if status.is_none() {
            self.push("status", "is not a known vendor status");
        }
        status
    }

    fn finish<T>(self, value: impl FnOnce() -> T) -> Converted<T> {
        if self.0.is_empty() {
            Ok(value())
        } else {
            Err(self.0)
        }
    }
}

// -------------------------
// Products
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub initial_stock: Option<i64>,
    pub min_stock_level: Option<i64>,
}

impl CreateProductRequest {
    pub fn into_domain(self) -> Converted<NewProduct> {
        let mut fields = Fields::default();
        let sku = fields.required("sku", self.sku);
        let name = fields.required("name", self.name);
        fields.finish(|| NewProduct {
            sku: sku.unwrap_or_default(),
            name: name.unwrap_or_default(),
            description: self.description,
            category: self.category,
            unit: self.unit,
            unit_price: self.unit_price,
            image_url: self.image_url,
            initial_stock: self.initial_stock.unwrap_or(0),
            min_stock_level: self.min_stock_level.unwrap_or(0),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub min_stock_level: Option<i64>,
}

impl UpdateProductRequest {
    pub fn into_domain(self) -> ProductPatch {
        ProductPatch {
            sku: self.sku,
            name: self.name,
            description: self.description,
            category: self.category,
            unit: self.unit,
            unit_price: self.unit_price,
            image_url: self.image_url,
            min_stock_level: self.min_stock_level,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListProductsParams {
    pub include_archived: Option<bool>,
    pub search: Option<String>,
    pub low_stock: Option<bool>,
}

impl ListProductsParams {
    pub fn into_filter(self) -> ProductFilter {
        ProductFilter {
            include_archived: self.include_archived.unwrap_or(false),
            search: self.search,
            low_stock_only: self.low_stock.unwrap_or(false),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub action: Option<String>,
    pub quantity: Option<i64>,
    pub warehouse_id: Option<String>,
    pub to_warehouse_id: Option<String>,
    pub reason: Option<String>,
    pub user_id: Option<String>,
}

impl SetStockRequest {
    pub fn into_domain(self) -> Converted<StockRequest> {
        let mut fields = Fields::default();
        let action = match self.action.as_deref().map(str::trim) {
            None | Some("") => {
                fields.push("action", "is required");
                None
            }
            Some(raw) => {
                let parsed = MovementAction::parse(&raw.to_ascii_lowercase());
                if parsed.is_none() {
                    fields.push("action", "must be one of add, use, adjust, transfer");
                }
                parsed
            }
        };
        let quantity = fields.required("quantity", self.quantity);
        let warehouse_id = fields.id::<WarehouseId>("warehouse_id", self.warehouse_id.as_deref());
        let to_warehouse_id =
            fields.id::<WarehouseId>("to_warehouse_id", self.to_warehouse_id.as_deref());
        let user_id = fields.id::<UserId>("user_id", self.user_id.as_deref());
        match (action, quantity) {
            (Some(action), Some(quantity)) => fields.finish(|| StockRequest {
                action,
                quantity,
                warehouse_id,
                to_warehouse_id,
                reason: self.reason,
                user_id,
            }),
            _ => Err(fields.0),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

// -------------------------
// Warehouses
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateWarehouseRequest {
    pub name: Option<String>,
    pub location: Option<String>,
}

impl CreateWarehouseRequest {
    pub fn into_domain(self) -> Converted<NewWarehouse> {
        let mut fields = Fields::default();
        let name = fields.required("name", self.name);
        fields.finish(|| NewWarehouse {
            name: name.unwrap_or_default(),
            location: self.location,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct SetWarehouseQuantityRequest {
    pub quantity: Option<i64>,
    pub aisle: Option<String>,
    pub rack: Option<String>,
    pub bin: Option<String>,
}

impl SetWarehouseQuantityRequest {
    pub fn into_domain(self) -> Converted<(i64, Option<BinLocation>)> {
        let mut fields = Fields::default();
        let quantity = fields.required("quantity", self.quantity);
        let location = BinLocation {
            aisle: self.aisle,
            rack: self.rack,
            bin: self.bin,
        };
        let location = (!location.is_empty()).then_some(location);
        fields.finish(|| (quantity.unwrap_or_default(), location))
    }
}

// -------------------------
// Customers
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CreateCustomerRequest {
    pub fn into_domain(self) -> Converted<NewCustomer> {
        let mut fields = Fields::default();
        let name = fields.required("name", self.name);
        fields.finish(|| NewCustomer {
            name: name.unwrap_or_default(),
            contact: ContactInfo {
                email: self.email,
                phone: self.phone,
                address: self.address,
            },
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
}

// -------------------------
// Vendors
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateVendorRequest {
    pub name: Option<String>,
    pub main_category: Option<String>,
    pub subcategory: Option<String>,
    pub product_type: Option<String>,
    pub product_code: Option<String>,
    pub other_products: Option<String>,
    pub contact_number: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zone: Option<String>,
    pub status: Option<String>,
}

impl CreateVendorRequest {
    pub fn into_domain(self) -> Converted<NewVendor> {
        let mut fields = Fields::default();
        let name = fields.required("name", self.name);
        let status = fields.vendor_status(self.status.as_deref());
        fields.finish(|| NewVendor {
            name: name.unwrap_or_default(),
            main_category: self.main_category,
            subcategory: self.subcategory,
            product_type: self.product_type,
            product_code: self.product_code,
            other_products: self.other_products,
            contact_number: self.contact_number,
            location: self.location,
            city: self.city,
            state: self.state,
            zone: self.zone,
            status,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateVendorRequest {
    pub name: Option<String>,
    pub main_category: Option<String>,
    pub subcategory: Option<String>,
    pub product_type: Option<String>,
    pub product_code: Option<String>,
    pub other_products: Option<String>,
    pub contact_number: Option<String>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zone: Option<String>,
}

impl UpdateVendorRequest {
    pub fn into_domain(self) -> VendorPatch {
        VendorPatch {
            name: self.name,
            main_category: self.main_category,
            subcategory: self.subcategory,
            product_type: self.product_type,
            product_code: self.product_code,
            other_products: self.other_products,
            contact_number: self.contact_number,
            location: self.location,
            city: self.city,
            state: self.state,
            zone: self.zone,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateVendorStatusRequest {
    pub status: Option<String>,
}

impl UpdateVendorStatusRequest {
    pub fn into_domain(self) -> Converted<VendorStatus> {
        let mut fields = Fields::default();
        let raw = fields.required("status", nonempty(self.status.as_deref()));
        let status = fields.vendor_status(raw);
        fields.finish(|| status.unwrap_or_default())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListVendorsParams {
    pub status: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

impl ListVendorsParams {
    pub fn into_filter(self) -> Converted<VendorFilter> {
        let mut fields = Fields::default();
        let status = fields.vendor_status(self.status.as_deref());
        fields.finish(|| VendorFilter {
            status,
            main_category: self.category,
            search: self.search,
        })
    }
}

// -------------------------
// Orders
// -------------------------

#[derive(Debug, Deserialize)]
pub struct OrderItemRequest {
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
    pub unit_price: Option<Decimal>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOrderRequest {
    pub customer_id: Option<String>,
    pub customer_name: Option<String>,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub tax: Option<Decimal>,
    pub notes: Option<String>,
    pub requested_by: Option<String>,
    pub user_id: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItemRequest>,
}

impl CreateOrderRequest {
    pub fn into_domain(self) -> Converted<NewOrder> {
        let mut fields = Fields::default();
        let customer_id = fields.id::<CustomerId>("customer_id", self.customer_id.as_deref());
        let user_id = fields.id::<UserId>("user_id", self.user_id.as_deref());

        let mut items = Vec::with_capacity(self.items.len());
        for (idx, item) in self.items.into_iter().enumerate() {
            let product_field = format!("items[{idx}].product_id");
            let product_id = match item.product_id.as_deref() {
                Some(raw) => fields.id::<ProductId>(&product_field, Some(raw)),
                None => {
                    fields.push(product_field, "is required");
                    None
                }
            };
            let quantity = fields.required(&format!("items[{idx}].quantity"), item.quantity);
            let unit_price = fields.required(&format!("items[{idx}].unit_price"), item.unit_price);
            if let (Some(product_id), Some(quantity), Some(unit_price)) =
                (product_id, quantity, unit_price)
            {
                items.push(NewOrderItem {
                    product_id,
                    quantity,
                    unit_price,
                });
            }
        }

        fields.finish(|| NewOrder {
            customer_id,
            customer_name: self.customer_name,
            customer_email: self.customer_email,
            customer_phone: self.customer_phone,
            tax: self.tax,
            notes: self.notes,
            requested_by: self.requested_by,
            user_id,
            items,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListOrdersParams {
    pub status: Option<String>,
    pub approval_status: Option<String>,
    pub customer: Option<String>,
    pub created_from: Option<String>,
    pub created_to: Option<String>,
    pub min_total: Option<String>,
    pub max_total: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

impl ListOrdersParams {
    pub fn into_query(self) -> Converted<OrderQuery> {
        let mut fields = Fields::default();
        let status = nonempty(self.status.as_deref()).and_then(|raw| {
            let parsed = OrderStatus::parse(raw);
            if parsed.is_none() {
                fields.push("status", "is not a known order status");
            }
            parsed
        });
        let approval_status = nonempty(self.approval_status.as_deref()).and_then(|raw| {
            let parsed = ApprovalStatus::parse(raw);
            if parsed.is_none() {
                fields.push("approval_status", "is not a known approval status");
            }
            parsed
        });
        let sort_by = match nonempty(self.sort_by.as_deref()) {
            None => OrderSortBy::default(),
            Some(raw) => OrderSortBy::parse(raw).unwrap_or_else(|| {
                fields.push(
                    "sort_by",
                    "must be one of created_at, total, status, approval_status, customer",
                );
                OrderSortBy::default()
            }),
        };
        let sort_order = match nonempty(self.sort_order.as_deref()) {
            None => SortOrder::default(),
            Some("asc") => SortOrder::Asc,
            Some("desc") => SortOrder::Desc,
            Some(_) => {
                fields.push("sort_order", "must be asc or desc");
                SortOrder::default()
            }
        };
        let created_from = fields.timestamp("created_from", self.created_from.as_deref());
        let created_to = fields.timestamp("created_to", self.created_to.as_deref());
        let min_total = fields.decimal("min_total", self.min_total.as_deref());
        let max_total = fields.decimal("max_total", self.max_total.as_deref());

        fields.finish(|| OrderQuery {
            status,
            approval_status,
            customer: self.customer,
            created_from,
            created_to,
            min_total,
            max_total,
            sort_by,
            sort_order,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: Option<String>,
}

impl UpdateOrderStatusRequest {
    pub fn into_domain(self) -> Converted<OrderStatus> {
        match nonempty(self.status.as_deref()) {
            None => Err(vec![FieldError::new("status", "is required")]),
            Some(raw) => OrderStatus::parse(raw)
                .ok_or_else(|| vec![FieldError::new("status", "is not a known order status")]),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GrnItemRequest {
    pub product_id: Option<String>,
    pub description: Option<String>,
    pub quantity_ordered: Option<i64>,
    pub quantity_received: Option<i64>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub remarks: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GrnRequest {
    pub vendor_id: Option<String>,
    pub vendor_name: Option<String>,
    pub vendor_address: Option<String>,
    pub bill_number: Option<String>,
    pub bill_date: Option<String>,
    pub po_number: Option<String>,
    pub po_date: Option<String>,
    pub received_by: Option<String>,
    pub remarks: Option<String>,
    #[serde(default)]
    pub items: Vec<GrnItemRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RequestApprovalRequest {
    pub requested_by: Option<String>,
    pub notes: Option<String>,
    pub grn: Option<GrnRequest>,
}

impl RequestApprovalRequest {
    pub fn into_domain(self) -> Converted<(ApprovalRequest, Option<GrnSubmission>)> {
        let request = ApprovalRequest {
            requested_by: self.requested_by,
            notes: self.notes,
        };
        let Some(grn) = self.grn else {
            return Ok((request, None));
        };

        let mut fields = Fields::default();
        let vendor_id = fields.id::<VendorId>("grn.vendor_id", grn.vendor_id.as_deref());
        let bill_date = fields.date("grn.bill_date", grn.bill_date.as_deref());
        let po_date = fields.date("grn.po_date", grn.po_date.as_deref());
        let mut items = Vec::with_capacity(grn.items.len());
        for (idx, item) in grn.items.into_iter().enumerate() {
            let product_id =
                fields.id::<ProductId>(&format!("grn.items[{idx}].product_id"), item.product_id.as_deref());
            let received =
                fields.required(&format!("grn.items[{idx}].quantity_received"), item.quantity_received);
            items.push(GrnItemDetail {
                product_id,
                description: item.description.unwrap_or_default(),
                quantity_ordered: item.quantity_ordered,
                quantity_received: received.unwrap_or_default(),
                unit: item.unit,
                unit_price: item.unit_price,
                remarks: item.remarks,
            });
        }

        fields.finish(|| {
            let header = GrnHeader {
                vendor_id,
                vendor_name: grn.vendor_name.unwrap_or_default(),
                vendor_address: grn.vendor_address,
                bill_number: grn.bill_number,
                bill_date,
                po_number: grn.po_number,
                po_date,
                received_by: grn.received_by,
                remarks: grn.remarks,
            };
            (request, Some(GrnSubmission { header, items }))
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct ApproveOrderRequest {
    pub approved_by: Option<String>,
    pub notes: Option<String>,
}

impl ApproveOrderRequest {
    pub fn into_domain(self) -> Converted<(String, Option<String>)> {
        match nonempty(self.approved_by.as_deref()) {
            Some(by) => Ok((by.to_string(), self.notes)),
            None => Err(vec![FieldError::new("approved_by", "is required")]),
        }
    }
}

fn nonempty(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn order_request_collects_every_bad_field() {
        let req: CreateOrderRequest = serde_json::from_value(json!({
            "customer_id": "nope",
            "items": [
                { "product_id": "also-nope", "quantity": 1, "unit_price": "2.50" },
                { "quantity": 3 }
            ]
        }))
        .unwrap();
        let errors = req.into_domain().unwrap_err();
        let names: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "customer_id",
                "items[0].product_id",
                "items[1].product_id",
                "items[1].unit_price"
            ]
        );
    }

    #[test]
    fn stock_request_parses_action_and_ids() {
        let wid = WarehouseId::new();
        let req: SetStockRequest = serde_json::from_value(json!({
            "action": "Transfer",
            "quantity": 4,
            "warehouse_id": wid.to_string(),
        }))
        .unwrap();
        let stock = req.into_domain().unwrap();
        assert_eq!(stock.action, MovementAction::Transfer);
        assert_eq!(stock.warehouse_id, Some(wid));
        assert_eq!(stock.to_warehouse_id, None);

        let bad: SetStockRequest = serde_json::from_value(json!({ "action": "steal" })).unwrap();
        let errors = bad.into_domain().unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn approval_without_grn_passes_through() {
        let req: RequestApprovalRequest =
            serde_json::from_value(json!({ "requested_by": "ops" })).unwrap();
        let (request, grn) = req.into_domain().unwrap();
        assert_eq!(request.requested_by.as_deref(), Some("ops"));
        assert!(grn.is_none());
    }

    #[test]
    fn grn_dates_must_be_calendar_dates() {
        let req: RequestApprovalRequest = serde_json::from_value(json!({
            "grn": {
                "vendor_name": "Northwind",
                "bill_date": "15/03/2024",
                "po_date": "2024-03-01",
                "items": [{ "description": "bolts", "quantity_received": 10 }]
            }
        }))
        .unwrap();
        let errors = req.into_domain().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "grn.bill_date");
    }

    #[test]
    fn grn_line_errors_are_scoped_under_grn() {
        let req: RequestApprovalRequest = serde_json::from_value(json!({
            "grn": {
                "vendor_name": "Northwind",
                "items": [
                    { "description": "bolts", "quantity_received": 10 },
                    { "product_id": "bad", "description": "nuts" }
                ]
            }
        }))
        .unwrap();
        let errors = req.into_domain().unwrap_err();
        let names: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(names, vec!["grn.items[1].product_id", "grn.items[1].quantity_received"]);
    }

    #[test]
    fn order_list_params_reject_unknown_values() {
        let params = ListOrdersParams {
            status: Some("lost".into()),
            sort_order: Some("sideways".into()),
            min_total: Some("10.00".into()),
            ..ListOrdersParams::default()
        };
        let errors = params.into_query().unwrap_err();
        assert_eq!(errors.len(), 2);

        let query = ListOrdersParams {
            status: Some("needs_approval".into()),
            sort_by: Some("total".into()),
            sort_order: Some("asc".into()),
            ..ListOrdersParams::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(query.status, Some(OrderStatus::NeedsApproval));
        assert_eq!(query.sort_by, OrderSortBy::Total);
        assert_eq!(query.sort_order, SortOrder::Asc);

        let approvals = ListOrdersParams {
            approval_status: Some("needs_approval".into()),
            ..ListOrdersParams::default()
        }
        .into_query()
        .unwrap();
        assert_eq!(approvals.approval_status, Some(ApprovalStatus::NeedsApproval));
    }

    #[test]
    fn vendor_requests_validate_name_and_status() {
        let req: CreateVendorRequest =
            serde_json::from_value(json!({ "status": "archived", "city": "Pune" })).unwrap();
        let names: Vec<String> = req.into_domain().unwrap_err().into_iter().map(|e| e.field).collect();
        assert_eq!(names, vec!["name", "status"]);

        let status: UpdateVendorStatusRequest = serde_json::from_value(json!({})).unwrap();
        assert_eq!(status.into_domain().unwrap_err()[0].field, "status");

        let params = ListVendorsParams {
            status: Some("active".to_string()),
            category: Some("Hardware".to_string()),
            search: None,
        };
        let filter = params.into_filter().unwrap();
        assert_eq!(filter.status, Some(VendorStatus::Active));
        assert_eq!(filter.main_category.as_deref(), Some("Hardware"));
    }
}
