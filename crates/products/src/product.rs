use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use stocksmart_core::{DomainError, DomainResult, Entity, FieldError, ProductId};

use crate::ledger::{StockChange, StockCounters};

/// Product status lifecycle.
///
/// Products are never physically removed (movements keep referring to
/// them); "deleting" one archives it. Reads filter on this explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Archived,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Archived => "archived",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ProductStatus::Active),
            "archived" => Some(ProductStatus::Archived),
            _ => None,
        }
    }
}

/// Product: catalog entry plus its ledger counters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub image_url: Option<String>,
    #[serde(flatten)]
    pub stock: StockCounters,
    pub min_stock_level: i64,
    pub status: ProductStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewProduct {
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub initial_stock: i64,
    pub min_stock_level: i64,
}

/// Partial update of descriptive fields. Stock counters are not editable here;
/// they only move through the ledger.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductPatch {
    pub sku: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub unit_price: Option<Decimal>,
    pub image_url: Option<String>,
    pub min_stock_level: Option<i64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl Product {
    /// Validate input and build a new active product.
    pub fn create(id: ProductId, input: NewProduct, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut errors = Vec::new();
        if input.sku.trim().is_empty() {
            errors.push(FieldError::new("sku", "cannot be empty"));
        }
        if input.name.trim().is_empty() {
            errors.push(FieldError::new("name", "cannot be empty"));
        }
        if input.initial_stock < 0 {
            errors.push(FieldError::new("initial_stock", "cannot be negative"));
        }
        if input.min_stock_level < 0 {
            errors.push(FieldError::new("min_stock_level", "cannot be negative"));
        }
        if input.unit_price.is_some_and(|p| p.is_sign_negative()) {
            errors.push(FieldError::new("unit_price", "cannot be negative"));
        }
        DomainError::check_fields(errors)?;

        Ok(Self {
            id,
            sku: input.sku.trim().to_string(),
            name: input.name.trim().to_string(),
            description: input.description,
            category: input.category,
            unit: input.unit,
            unit_price: input.unit_price,
            image_url: input.image_url,
            stock: StockCounters::opening(input.initial_stock),
            min_stock_level: input.min_stock_level,
            status: ProductStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a partial update in place.
    pub fn apply_patch(&mut self, patch: ProductPatch, now: DateTime<Utc>) -> DomainResult<()> {
        let mut errors = Vec::new();
        if patch.sku.as_deref().is_some_and(|s| s.trim().is_empty()) {
            errors.push(FieldError::new("sku", "cannot be empty"));
        }
        if patch.name.as_deref().is_some_and(|s| s.trim().is_empty()) {
            errors.push(FieldError::new("name", "cannot be empty"));
        }
        if patch.min_stock_level.is_some_and(|v| v < 0) {
            errors.push(FieldError::new("min_stock_level", "cannot be negative"));
        }
        if patch.unit_price.is_some_and(|p| p.is_sign_negative()) {
            errors.push(FieldError::new("unit_price", "cannot be negative"));
        }
        DomainError::check_fields(errors)?;

        if let Some(sku) = patch.sku {
            self.sku = sku.trim().to_string();
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        if patch.description.is_some() {
            self.description = patch.description;
        }
        if patch.category.is_some() {
            self.category = patch.category;
        }
        if patch.unit.is_some() {
            self.unit = patch.unit;
        }
        if patch.unit_price.is_some() {
            self.unit_price = patch.unit_price;
        }
        if patch.image_url.is_some() {
            self.image_url = patch.image_url;
        }
        if let Some(level) = patch.min_stock_level {
            self.min_stock_level = level;
        }
        self.updated_at = now;
        Ok(())
    }

    /// Record a ledger write computed elsewhere (storage applies it atomically).
    pub fn record_change(&mut self, change: &StockChange, now: DateTime<Utc>) {
        self.stock = change.new;
        self.updated_at = now;
    }

    pub fn archive(&mut self, now: DateTime<Utc>) {
        self.status = ProductStatus::Archived;
        self.updated_at = now;
    }

    pub fn is_active(&self) -> bool {
        self.status == ProductStatus::Active
    }

    /// Low stock: `stock_available <= min_stock_level`.
    pub fn is_low_stock(&self) -> bool {
        self.stock.available() <= self.min_stock_level
    }

    /// Case-insensitive substring match on name or SKU.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle) || self.sku.to_lowercase().contains(&needle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerAction;

    fn widget() -> NewProduct {
        NewProduct {
            sku: " WID-001 ".to_string(),
            name: "Widget".to_string(),
            initial_stock: 100,
            min_stock_level: 10,
            ..NewProduct::default()
        }
    }

    #[test]
    fn create_opens_counters_from_initial_stock() {
        let p = Product::create(ProductId::new(), widget(), Utc::now()).unwrap();
        assert_eq!(p.sku, "WID-001");
        assert_eq!(p.stock.total(), 100);
        assert_eq!(p.stock.used(), 0);
        assert_eq!(p.stock.available(), 100);
        assert!(p.is_active());
    }

    #[test]
    fn create_collects_every_field_error() {
        let input = NewProduct {
            sku: "  ".to_string(),
            name: String::new(),
            initial_stock: -1,
            ..NewProduct::default()
        };
        match Product::create(ProductId::new(), input, Utc::now()).unwrap_err() {
            DomainError::InvalidFields(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
                assert_eq!(names, vec!["sku", "name", "initial_stock"]);
            }
            other => panic!("expected InvalidFields, got {other:?}"),
        }
    }

    #[test]
    fn patch_updates_descriptive_fields_only() {
        let mut p = Product::create(ProductId::new(), widget(), Utc::now()).unwrap();
        let before = p.stock;
        p.apply_patch(
            ProductPatch {
                name: Some("Blue Widget".to_string()),
                min_stock_level: Some(50),
                ..ProductPatch::default()
            },
            Utc::now(),
        )
        .unwrap();

        assert_eq!(p.name, "Blue Widget");
        assert_eq!(p.min_stock_level, 50);
        assert_eq!(p.stock, before);
    }

    #[test]
    fn patch_rejects_blank_name() {
        let mut p = Product::create(ProductId::new(), widget(), Utc::now()).unwrap();
        let err = p
            .apply_patch(
                ProductPatch {
                    name: Some(" ".to_string()),
                    ..ProductPatch::default()
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidFields(_)));
        assert_eq!(p.name, "Widget");
    }

    #[test]
    fn low_stock_is_inclusive_of_threshold() {
        let mut p = Product::create(ProductId::new(), widget(), Utc::now()).unwrap();
        assert!(!p.is_low_stock());

        let change = StockChange::compute(p.stock, LedgerAction::Use, 90).unwrap();
        p.record_change(&change, Utc::now());
        assert_eq!(p.stock.available(), 10);
        assert!(p.is_low_stock());
    }

    #[test]
    fn archive_is_a_status_flip() {
        let mut p = Product::create(ProductId::new(), widget(), Utc::now()).unwrap();
        p.archive(Utc::now());
        assert_eq!(p.status, ProductStatus::Archived);
        assert!(!p.is_active());
    }

    #[test]
    fn search_matches_name_or_sku_case_insensitively() {
        let p = Product::create(ProductId::new(), widget(), Utc::now()).unwrap();
        assert!(p.matches_search("widg"));
        assert!(p.matches_search("wid-0"));
        assert!(!p.matches_search("gadget"));
    }

    #[test]
    fn serializes_counters_flat() {
        let p = Product::create(ProductId::new(), widget(), Utc::now()).unwrap();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["stock_total"], 100);
        assert_eq!(json["stock_available"], 100);
        assert_eq!(json["status"], "active");
    }
}
