use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocksmart_core::{DomainError, DomainResult, Entity, FieldError, VendorId};

/// Vendor status lifecycle.
///
/// New vendors start `pending` until someone vets them. Once vetted a vendor
/// moves between `active` and `inactive`; it never returns to `pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorStatus {
    Active,
    Inactive,
    #[default]
    Pending,
}

impl VendorStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VendorStatus::Active => "active",
            VendorStatus::Inactive => "inactive",
            VendorStatus::Pending => "pending",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(VendorStatus::Active),
            "inactive" => Some(VendorStatus::Inactive),
            "pending" => Some(VendorStatus::Pending),
            _ => None,
        }
    }

    pub fn can_transition_to(self, next: VendorStatus) -> bool {
        self == next || next != VendorStatus::Pending
    }
}

/// Supplier directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vendor {
    pub id: VendorId,
    pub name: String,
    /// Normalized: lowercase, `/` replaced by `_`.
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
    pub status: VendorStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Vendor {
    type Id = VendorId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewVendor {
    pub name: String,
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
    /// Defaults to `pending`.
    pub status: Option<VendorStatus>,
}

/// Partial update of directory fields. Status changes go through `set_status`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VendorPatch {
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

/// Category key used for filtering: trimmed, lowercased, `/` as `_`.
pub fn normalize_category(raw: &str) -> String {
    raw.trim().to_lowercase().replace('/', "_")
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Vendor {
    pub fn create(id: VendorId, input: NewVendor, now: DateTime<Utc>) -> DomainResult<Self> {
        if input.name.trim().is_empty() {
            return Err(DomainError::InvalidFields(vec![FieldError::new(
                "name",
                "cannot be empty",
            )]));
        }
        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            main_category: clean(input.main_category).map(|c| normalize_category(&c)),
            subcategory: clean(input.subcategory),
            product_type: clean(input.product_type),
            product_code: clean(input.product_code),
            other_products: clean(input.other_products),
            contact_number: clean(input.contact_number),
            location: clean(input.location),
            city: clean(input.city),
            state: clean(input.state),
            zone: clean(input.zone),
            status: input.status.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn apply_patch(&mut self, patch: VendorPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if patch.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(DomainError::InvalidFields(vec![FieldError::new(
                "name",
                "cannot be empty",
            )]));
        }
        if let Some(name) = patch.name {
            self.name = name.trim().to_string();
        }
        let fields = [
            (&mut self.subcategory, patch.subcategory),
            (&mut self.product_type, patch.product_type),
            (&mut self.product_code, patch.product_code),
            (&mut self.other_products, patch.other_products),
            (&mut self.contact_number, patch.contact_number),
            (&mut self.location, patch.location),
            (&mut self.city, patch.city),
            (&mut self.state, patch.state),
            (&mut self.zone, patch.zone),
        ];
        for (slot, value) in fields {
            if value.is_some() {
                *slot = clean(value);
            }
        }
        if patch.main_category.is_some() {
            self.main_category = clean(patch.main_category).map(|c| normalize_category(&c));
        }
        self.updated_at = now;
        Ok(())
    }

    pub fn set_status(&mut self, next: VendorStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invariant(format!(
                "cannot move vendor from {} to {}",
                self.status.as_str(),
                next.as_str()
            )));
        }
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    /// Case-insensitive substring match on name, product type, product code or city.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.trim().to_lowercase();
        [
            Some(&self.name),
            self.product_type.as_ref(),
            self.product_code.as_ref(),
            self.city.as_ref(),
        ]
        .into_iter()
        .flatten()
        .any(|v| v.to_lowercase().contains(&needle))
    }

    pub fn in_category(&self, category: &str) -> bool {
        self.main_category.as_deref() == Some(normalize_category(category).as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor(name: &str) -> Vendor {
        Vendor::create(
            VendorId::new(),
            NewVendor {
                name: name.to_string(),
                main_category: Some(" Electrical/Electronics ".to_string()),
                product_type: Some("Cables".to_string()),
                city: Some("Pune".to_string()),
                zone: Some("  ".to_string()),
                ..NewVendor::default()
            },
            Utc::now(),
        )
        .unwrap()
    }

    #[test]
    fn create_normalizes_category_and_blanks() {
        let v = vendor(" Shakti Wires ");
        assert_eq!(v.name, "Shakti Wires");
        assert_eq!(v.main_category.as_deref(), Some("electrical_electronics"));
        assert_eq!(v.zone, None);
        assert_eq!(v.status, VendorStatus::Pending);
        assert!(v.in_category("ELECTRICAL/electronics"));
    }

    #[test]
    fn create_requires_name() {
        let err = Vendor::create(VendorId::new(), NewVendor::default(), Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidFields(f) if f[0].field == "name"));
    }

    #[test]
    fn status_never_returns_to_pending() {
        let mut v = vendor("Shakti Wires");
        v.set_status(VendorStatus::Active, Utc::now()).unwrap();
        v.set_status(VendorStatus::Inactive, Utc::now()).unwrap();
        v.set_status(VendorStatus::Active, Utc::now()).unwrap();
        let err = v.set_status(VendorStatus::Pending, Utc::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
        assert_eq!(v.status, VendorStatus::Active);
    }

    #[test]
    fn patch_overwrites_given_fields_only() {
        let mut v = vendor("Shakti Wires");
        v.apply_patch(
            VendorPatch {
                city: Some("Nashik".to_string()),
                main_category: Some("Hardware".to_string()),
                ..VendorPatch::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(v.city.as_deref(), Some("Nashik"));
        assert_eq!(v.main_category.as_deref(), Some("hardware"));
        assert_eq!(v.product_type.as_deref(), Some("Cables"));

        let err = v
            .apply_patch(
                VendorPatch {
                    name: Some(" ".to_string()),
                    ..VendorPatch::default()
                },
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidFields(_)));
    }

    #[test]
    fn search_covers_name_type_and_city() {
        let v = vendor("Shakti Wires");
        assert!(v.matches_search("shakti"));
        assert!(v.matches_search("cable"));
        assert!(v.matches_search("PUNE"));
        assert!(!v.matches_search("bolts"));
    }
}
