use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stocksmart_core::{CustomerId, DomainError, DomainResult, Entity, FieldError};

/// Contact information for a customer.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactInfo {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Customer record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Customer {
    pub id: CustomerId,
    pub name: String,
    #[serde(flatten)]
    pub contact: ContactInfo,
    pub created_at: DateTime<Utc>,
}

impl Entity for Customer {
    type Id = CustomerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewCustomer {
    pub name: String,
    pub contact: ContactInfo,
}

/// Canonical form used for email matching: trimmed, lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl Customer {
    pub fn create(id: CustomerId, input: NewCustomer, now: DateTime<Utc>) -> DomainResult<Self> {
        let mut errors = Vec::new();
        if input.name.trim().is_empty() {
            errors.push(FieldError::new("name", "cannot be empty"));
        }
        if let Some(email) = &input.contact.email {
            if !email.contains('@') {
                errors.push(FieldError::new("email", "must be an email address"));
            }
        }
        DomainError::check_fields(errors)?;

        let contact = ContactInfo {
            email: input
                .contact
                .email
                .as_deref()
                .map(normalize_email)
                .filter(|e| !e.is_empty()),
            ..input.contact
        };

        Ok(Self {
            id,
            name: input.name.trim().to_string(),
            contact,
            created_at: now,
        })
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.contact.email.as_deref().map(normalize_email) == Some(normalize_email(email))
    }

    /// Case-insensitive substring match on name or email.
    pub fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.name.to_lowercase().contains(&needle)
            || self
                .contact
                .email
                .as_deref()
                .is_some_and(|e| e.contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(name: &str, email: Option<&str>) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            contact: ContactInfo {
                email: email.map(str::to_string),
                ..ContactInfo::default()
            },
        }
    }

    #[test]
    fn create_normalizes_email() {
        let c = Customer::create(CustomerId::new(), input("Asha", Some("  Asha@Example.COM ")), Utc::now())
            .unwrap();
        assert_eq!(c.contact.email.as_deref(), Some("asha@example.com"));
        assert!(c.has_email("ASHA@example.com"));
    }

    #[test]
    fn create_rejects_blank_name_and_bad_email() {
        match Customer::create(CustomerId::new(), input(" ", Some("nope")), Utc::now()).unwrap_err() {
            DomainError::InvalidFields(f) => assert_eq!(f.len(), 2),
            other => panic!("expected InvalidFields, got {other:?}"),
        }
    }

    #[test]
    fn search_covers_name_and_email() {
        let c = Customer::create(CustomerId::new(), input("Ravi Traders", Some("ops@ravi.in")), Utc::now())
            .unwrap();
        assert!(c.matches_search("traders"));
        assert!(c.matches_search("ravi.in"));
        assert!(!c.matches_search("acme"));
    }
}
