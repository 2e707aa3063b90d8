//! Goods receipt notes.
//!
//! At most one GRN exists per order. Re-submitting replaces the header in
//! place and swaps the whole item set; items are never merged.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stocksmart_core::{
    DomainError, DomainResult, Entity, FieldError, GrnId, GrnItemId, OrderId, ProductId,
    ValueObject, VendorId,
};

/// Vendor / bill / purchase-order metadata of a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrnHeader {
    /// Directory entry the receipt came from, when known.
    pub vendor_id: Option<VendorId>,
    pub vendor_name: String,
    pub vendor_address: Option<String>,
    pub bill_number: Option<String>,
    pub bill_date: Option<NaiveDate>,
    pub po_number: Option<String>,
    pub po_date: Option<NaiveDate>,
    pub received_by: Option<String>,
    pub remarks: Option<String>,
}

impl ValueObject for GrnHeader {}

/// One received line.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GrnItemDetail {
    pub product_id: Option<ProductId>,
    pub description: String,
    pub quantity_ordered: Option<i64>,
    pub quantity_received: i64,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub remarks: Option<String>,
}

impl ValueObject for GrnItemDetail {}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grn {
    pub id: GrnId,
    pub order_id: OrderId,
    #[serde(flatten)]
    pub header: GrnHeader,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Grn {
    type Id = GrnId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrnItem {
    pub id: GrnItemId,
    pub grn_id: GrnId,
    #[serde(flatten)]
    pub detail: GrnItemDetail,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GrnWithItems {
    #[serde(flatten)]
    pub grn: Grn,
    pub items: Vec<GrnItem>,
}

impl Grn {
    /// Validate a submission (header + items) before anything is written.
    pub fn validate_submission(header: &GrnHeader, items: &[GrnItemDetail]) -> DomainResult<()> {
        let mut errors = Vec::new();
        if header.vendor_name.trim().is_empty() {
            errors.push(FieldError::new("grn.vendor_name", "cannot be empty"));
        }
        for (idx, item) in items.iter().enumerate() {
            if item.description.trim().is_empty() {
                errors.push(FieldError::new(format!("grn.items[{idx}].description"), "cannot be empty"));
            }
            if item.quantity_received < 0 {
                errors.push(FieldError::new(
                    format!("grn.items[{idx}].quantity_received"),
                    "cannot be negative",
                ));
            }
            if item.quantity_ordered.is_some_and(|q| q < 0) {
                errors.push(FieldError::new(
                    format!("grn.items[{idx}].quantity_ordered"),
                    "cannot be negative",
                ));
            }
            if item.unit_price.is_some_and(|p| p.is_sign_negative()) {
                errors.push(FieldError::new(format!("grn.items[{idx}].unit_price"), "cannot be negative"));
            }
        }
        DomainError::check_fields(errors)
    }

    /// Upsert rule for the order's single GRN: update the existing header in
    /// place (keeping its id), or start a new one.
    pub fn upsert(existing: Option<Grn>, order_id: OrderId, header: GrnHeader, now: DateTime<Utc>) -> DomainResult<Grn> {
        match existing {
            Some(mut grn) => {
                if grn.order_id != order_id {
                    return Err(DomainError::invariant("grn belongs to a different order"));
                }
                grn.header = header;
                grn.updated_at = now;
                Ok(grn)
            }
            None => Ok(Grn {
                id: GrnId::new(),
                order_id,
                header,
                created_at: now,
                updated_at: now,
            }),
        }
    }

    /// Fresh item rows owned by this GRN (the previous set is discarded by the caller).
    pub fn replacement_items(&self, details: Vec<GrnItemDetail>) -> Vec<GrnItem> {
        details
            .into_iter()
            .map(|detail| GrnItem {
                id: GrnItemId::new(),
                grn_id: self.id,
                detail,
            })
            .collect()
    }
}
