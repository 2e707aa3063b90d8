//! Product Ledger arithmetic.
//!
//! Every product carries three counters: `stock_total`, `stock_used` and
//! `stock_available`. The ledger invariant is
//!
//! ```text
//! stock_available = stock_total - stock_used
//! ```
//!
//! `StockCounters` can only be built through constructors that compute
//! `stock_available` from the other two, so a partially-updated triple cannot
//! be expressed. There is deliberately no floor at zero: an order may consume
//! more than is available and drive `stock_available` negative. The order
//! engine reads that as the oversell signal and escalates to approval.

use serde::{Deserialize, Serialize};

use stocksmart_core::{DomainError, DomainResult, ValueObject};

/// Ledger operations that change the product counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerAction {
    /// Goods received: `total += qty`, `available += qty`.
    Add,
    /// Goods consumed: `used += qty`, `available -= qty`.
    Use,
    /// Stock count correction: `total = qty`, `available = total - used`.
    Adjust,
}

impl LedgerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerAction::Add => "add",
            LedgerAction::Use => "use",
            LedgerAction::Adjust => "adjust",
        }
    }
}

/// The three stock counters of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockCounters {
    #[serde(rename = "stock_total")]
    total: i64,
    #[serde(rename = "stock_used")]
    used: i64,
    #[serde(rename = "stock_available")]
    available: i64,
}

impl ValueObject for StockCounters {}

impl StockCounters {
    /// Counters for a freshly created product holding `initial` units.
    pub fn opening(initial: i64) -> Self {
        Self {
            total: initial,
            used: 0,
            available: initial,
        }
    }

    /// Build counters from total and used; available is derived.
    pub fn from_parts(total: i64, used: i64) -> DomainResult<Self> {
        let available = total
            .checked_sub(used)
            .ok_or_else(|| overflow("stock_available"))?;
        Ok(Self {
            total,
            used,
            available,
        })
    }

    /// Rebuild counters read back from storage, rejecting rows that break the invariant.
    pub fn from_stored(total: i64, used: i64, available: i64) -> DomainResult<Self> {
        let counters = Self::from_parts(total, used)?;
        if counters.available != available {
            return Err(DomainError::invariant(format!(
                "stored stock_available {available} != stock_total {total} - stock_used {used}"
            )));
        }
        Ok(counters)
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn used(&self) -> i64 {
        self.used
    }

    pub fn available(&self) -> i64 {
        self.available
    }

    /// Compute the counters after applying `action` with `quantity`.
    ///
    /// All three counters are recomputed together. Negative quantities are
    /// rejected; the resulting `available` may still be negative after `Use`.
    pub fn apply(&self, action: LedgerAction, quantity: i64) -> DomainResult<Self> {
        if quantity < 0 {
            return Err(DomainError::validation("quantity cannot be negative"));
        }
        match action {
            LedgerAction::Add => {
                let total = self
                    .total
                    .checked_add(quantity)
                    .ok_or_else(|| overflow("stock_total"))?;
                Self::from_parts(total, self.used)
            }
            LedgerAction::Use => {
                let used = self
                    .used
                    .checked_add(quantity)
                    .ok_or_else(|| overflow("stock_used"))?;
                Self::from_parts(self.total, used)
            }
            LedgerAction::Adjust => Self::from_parts(quantity, self.used),
        }
    }
}

fn overflow(counter: &str) -> DomainError {
    DomainError::validation(format!("quantity would overflow {counter}"))
}

/// Before/after snapshot of one ledger write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockChange {
    pub action: LedgerAction,
    pub quantity: i64,
    pub previous: StockCounters,
    pub new: StockCounters,
}

impl StockChange {
    /// Apply `action` to `previous` and capture both snapshots.
    pub fn compute(previous: StockCounters, action: LedgerAction, quantity: i64) -> DomainResult<Self> {
        let new = previous.apply(action, quantity)?;
        // The movement log stores the delta, so it has to fit as well.
        new.available
            .checked_sub(previous.available)
            .ok_or_else(|| overflow("the stock movement"))?;
        Ok(Self {
            action,
            quantity,
            previous,
            new,
        })
    }

    /// Signed change of `stock_available` (what the movement log records).
    pub fn available_delta(&self) -> i64 {
        self.new.available - self.previous.available
    }

    /// Whether a `Use` asked for more than was available beforehand.
    pub fn oversold(&self) -> bool {
        self.action == LedgerAction::Use && self.quantity > self.previous.available
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_raises_total_and_available() {
        let c = StockCounters::from_parts(100, 10).unwrap().apply(LedgerAction::Add, 5).unwrap();
        assert_eq!((c.total(), c.used(), c.available()), (105, 10, 95));
    }

    #[test]
    fn use_raises_used_and_lowers_available() {
        let c = StockCounters::opening(100).apply(LedgerAction::Use, 30).unwrap();
        assert_eq!((c.total(), c.used(), c.available()), (100, 30, 70));
    }

    #[test]
    fn use_can_drive_available_negative() {
        let c = StockCounters::from_parts(100, 30).unwrap().apply(LedgerAction::Use, 90).unwrap();
        assert_eq!(c.used(), 120);
        assert_eq!(c.available(), -20);
    }

    #[test]
    fn adjust_sets_total_and_recomputes_available() {
        let c = StockCounters::from_parts(100, 40).unwrap().apply(LedgerAction::Adjust, 25).unwrap();
        assert_eq!(c.total(), 25);
        assert_eq!(c.used(), 40);
        assert_eq!(c.available(), -15);
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let err = StockCounters::opening(10).apply(LedgerAction::Add, -1).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn overflowing_add_is_rejected_without_changing_counters() {
        let start = StockCounters::opening(10);
        let err = start.apply(LedgerAction::Add, i64::MAX).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(start.total(), 10);
    }

    #[test]
    fn overflowing_use_is_rejected() {
        let start = StockCounters::opening(10).apply(LedgerAction::Use, i64::MAX - 1).unwrap();
        let err = start.apply(LedgerAction::Use, 5).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn overflowing_delta_is_rejected() {
        let deep = StockCounters::opening(0).apply(LedgerAction::Use, i64::MAX).unwrap();
        let err = StockChange::compute(deep, LedgerAction::Adjust, i64::MAX).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn from_parts_rejects_unrepresentable_available() {
        assert!(StockCounters::from_parts(i64::MIN, 1).is_err());
    }

    #[test]
    fn from_stored_rejects_inconsistent_rows() {
        assert!(StockCounters::from_stored(10, 4, 6).is_ok());
        let err = StockCounters::from_stored(10, 4, 7).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn change_reports_signed_delta_and_oversell() {
        let start = StockCounters::from_parts(100, 30).unwrap();
        let change = StockChange::compute(start, LedgerAction::Use, 90).unwrap();
        assert_eq!(change.available_delta(), -90);
        assert_eq!(change.previous.available(), 70);
        assert_eq!(change.new.available(), -20);
        assert!(change.oversold());

        let within = StockChange::compute(start, LedgerAction::Use, 70).unwrap();
        assert!(!within.oversold());
    }

    #[test]
    fn serializes_with_column_names() {
        let json = serde_json::to_value(StockCounters::from_parts(5, 2).unwrap()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"stock_total": 5, "stock_used": 2, "stock_available": 3})
        );
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn action() -> impl Strategy<Value = LedgerAction> {
            prop_oneof![
                Just(LedgerAction::Add),
                Just(LedgerAction::Use),
                Just(LedgerAction::Adjust),
            ]
        }

        proptest! {
            /// Property: the invariant survives any sequence of ledger writes.
            #[test]
            fn invariant_holds_after_any_sequence(
                initial in 0i64..10_000,
                ops in prop::collection::vec((action(), 0i64..10_000), 0..50)
            ) {
                let mut c = StockCounters::opening(initial);
                for (a, q) in ops {
                    c = c.apply(a, q).unwrap();
                    prop_assert_eq!(c.available(), c.total() - c.used());
                }
            }

            /// Property: add n then use n restores available; deltas cancel out.
            #[test]
            fn add_then_use_restores_available(
                total in 0i64..10_000,
                used in 0i64..10_000,
                n in 0i64..10_000
            ) {
                let start = StockCounters::from_parts(total, used).unwrap();
                let added = StockChange::compute(start, LedgerAction::Add, n).unwrap();
                let used_back = StockChange::compute(added.new, LedgerAction::Use, n).unwrap();
                prop_assert_eq!(used_back.new.available(), start.available());
                prop_assert_eq!(added.available_delta() + used_back.available_delta(), 0);
            }

            /// Property: adjust sets total exactly regardless of prior value.
            #[test]
            fn adjust_sets_total_exactly(
                total in -10_000i64..10_000,
                used in 0i64..10_000,
                n in 0i64..10_000
            ) {
                let c = StockCounters::from_parts(total, used).unwrap().apply(LedgerAction::Adjust, n).unwrap();
                prop_assert_eq!(c.total(), n);
                prop_assert_eq!(c.available(), n - used);
            }
        }
    }
}
