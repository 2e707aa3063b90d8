use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocksmart_core::{DomainError, DomainResult, Entity, FieldError, ProductId, ValueObject, WarehouseId};

/// A physical storage site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Entity for Warehouse {
    type Id = WarehouseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewWarehouse {
    pub name: String,
    pub location: Option<String>,
}

impl Warehouse {
    pub fn create(id: WarehouseId, input: NewWarehouse, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.name.trim().is_empty() {
            return Err(DomainError::InvalidFields(vec![FieldError::new(
                "name",
                "cannot be empty",
            )]));
        }
        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            location: input.location,
            created_at: now,
        })
    }
}

/// Bin coordinates inside a warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BinLocation {
    pub aisle: Option<String>,
    pub rack: Option<String>,
    pub bin: Option<String>,
}

impl ValueObject for BinLocation {}

impl BinLocation {
    pub fn is_empty(&self) -> bool {
        self.aisle.is_none() && self.rack.is_none() && self.bin.is_none()
    }
}

/// Physical quantity of one product in one warehouse.
///
/// Independent of the product ledger: these quantities are not required to
/// sum to `stock_total`, and nothing reconciles the two.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WarehouseStock {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: i64,
    pub location: Option<BinLocation>,
    pub updated_at: DateTime<Utc>,
}

impl WarehouseStock {
    /// Upsert rule keyed by (product, warehouse): overwrite quantity and
    /// location of an existing row, or build a fresh one.
    pub fn upsert(
        existing: Option<WarehouseStock>,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: i64,
        location: Option<BinLocation>,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::InvalidFields(vec![FieldError::new(
                "quantity",
                "cannot be negative",
            )]));
        }
        let location = location.filter(|l| !l.is_empty());
        match existing {
            Some(mut row) => {
                if row.product_id != product_id || row.warehouse_id != warehouse_id {
                    return Err(DomainError::invariant("warehouse stock key mismatch"));
                }
                row.quantity = quantity;
                row.location = location;
                row.updated_at = now;
                Ok(row)
            }
            None => Ok(Self {
                product_id,
                warehouse_id,
                quantity,
                location,
                updated_at: now,
            }),
        }
    }
}

/// Result of planning a move between two warehouses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseTransfer {
    pub source: WarehouseStock,
    pub target: WarehouseStock,
}

impl WarehouseTransfer {
    /// Move `quantity` of a product from one warehouse row to another.
    ///
    /// A missing source row counts as zero; the source may not go negative.
    /// The target keeps its bin location if it already has one.
    pub fn plan(
        product_id: ProductId,
        from: WarehouseId,
        to: WarehouseId,
        source: Option<WarehouseStock>,
        target: Option<WarehouseStock>,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DomainResult<Self> {
        if quantity <= 0 {
            return Err(DomainError::InvalidFields(vec![FieldError::new(
                "quantity",
                "must be positive for a transfer",
            )]));
        }
        if from == to {
            return Err(DomainError::InvalidFields(vec![FieldError::new(
                "to_warehouse_id",
                "must differ from warehouse_id",
            )]));
        }
        let on_hand = source.as_ref().map(|s| s.quantity).unwrap_or(0);
        if on_hand < quantity {
            return Err(DomainError::invariant(format!(
                "warehouse {from} holds {on_hand}, cannot transfer {quantity}"
            )));
        }

        let source_location = source.as_ref().and_then(|s| s.location.clone());
        let target_quantity = target
            .as_ref()
            .map(|t| t.quantity)
            .unwrap_or(0)
            .checked_add(quantity)
            .ok_or_else(|| {
                DomainError::InvalidFields(vec![FieldError::new(
                    "quantity",
                    "would overflow the target warehouse quantity",
                )])
            })?;
        let target_location = target.as_ref().and_then(|t| t.location.clone());

        let source = WarehouseStock::upsert(
            source,
            product_id,
            from,
            on_hand - quantity,
            source_location,
            now,
        )?;
        let target = WarehouseStock::upsert(
            target,
            product_id,
            to,
            target_quantity,
            target_location,
            now,
        )?;
        Ok(Self { source, target })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bin(aisle: &str) -> BinLocation {
        BinLocation {
            aisle: Some(aisle.to_string()),
            rack: Some("R1".to_string()),
            bin: None,
        }
    }

    #[test]
    fn upsert_inserts_when_absent() {
        let (p, w) = (ProductId::new(), WarehouseId::new());
        let row = WarehouseStock::upsert(None, p, w, 12, Some(bin("A")), Utc::now()).unwrap();
        assert_eq!(row.quantity, 12);
        assert_eq!(row.location, Some(bin("A")));
    }

    #[test]
    fn upsert_overwrites_quantity_and_location() {
        let (p, w) = (ProductId::new(), WarehouseId::new());
        let first = WarehouseStock::upsert(None, p, w, 12, Some(bin("A")), Utc::now()).unwrap();
        let second =
            WarehouseStock::upsert(Some(first), p, w, 3, Some(bin("B")), Utc::now()).unwrap();
        assert_eq!(second.quantity, 3);
        assert_eq!(second.location, Some(bin("B")));
    }

    #[test]
    fn upsert_drops_empty_location() {
        let row = WarehouseStock::upsert(
            None,
            ProductId::new(),
            WarehouseId::new(),
            1,
            Some(BinLocation::default()),
            Utc::now(),
        )
        .unwrap();
        assert_eq!(row.location, None);
    }

    #[test]
    fn upsert_rejects_negative_quantity() {
        let err = WarehouseStock::upsert(None, ProductId::new(), WarehouseId::new(), -1, None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidFields(_)));
    }

    #[test]
    fn transfer_moves_quantity_between_rows() {
        let (p, a, b) = (ProductId::new(), WarehouseId::new(), WarehouseId::new());
        let src = WarehouseStock::upsert(None, p, a, 10, Some(bin("A")), Utc::now()).unwrap();

        let plan = WarehouseTransfer::plan(p, a, b, Some(src), None, 4, Utc::now()).unwrap();
        assert_eq!(plan.source.quantity, 6);
        assert_eq!(plan.source.location, Some(bin("A")));
        assert_eq!(plan.target.quantity, 4);
        assert_eq!(plan.target.warehouse_id, b);
    }

    #[test]
    fn transfer_cannot_overdraw_source() {
        let (p, a, b) = (ProductId::new(), WarehouseId::new(), WarehouseId::new());
        let err = WarehouseTransfer::plan(p, a, b, None, None, 1, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn transfer_rejects_target_overflow() {
        let (p, a, b) = (ProductId::new(), WarehouseId::new(), WarehouseId::new());
        let src = WarehouseStock::upsert(None, p, a, 10, None, Utc::now()).unwrap();
        let full = WarehouseStock::upsert(None, p, b, i64::MAX, None, Utc::now()).unwrap();
        let err = WarehouseTransfer::plan(p, a, b, Some(src), Some(full), 5, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidFields(_)));
    }

    #[test]
    fn transfer_to_same_warehouse_is_rejected() {
        let (p, a) = (ProductId::new(), WarehouseId::new());
        let err = WarehouseTransfer::plan(p, a, a, None, None, 1, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidFields(_)));
    }

    #[test]
    fn warehouse_requires_name() {
        let err = Warehouse::create(WarehouseId::new(), NewWarehouse::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidFields(_)));
    }
}
