//! Infrastructure and service-layer errors.
//!
//! `StoreError` covers what can go wrong talking to storage. `ServiceError`
//! is what service operations return: domain failures keep their category
//! (validation, not found, conflict, invariant) so the HTTP layer can map
//! them to status codes, and storage failures are wrapped as `Store`.

use thiserror::Error;

use stocksmart_core::{DomainError, FieldError};

/// Storage operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("failed to decode stored row: {0}")]
    Decode(String),

    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A domain rule refused a write computed inside storage.
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Service operation error.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
        fields: Vec<FieldError>,
    },

    #[error("{0} not found")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("storage failure: {0}")]
    Store(StoreError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }

    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        DomainError::InvalidFields(vec![FieldError::new(field, message)]).into()
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(message) => ServiceError::Validation {
                message,
                fields: Vec::new(),
            },
            DomainError::InvalidFields(fields) => ServiceError::Validation {
                message: fields
                    .iter()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; "),
                fields,
            },
            DomainError::InvalidId(message) => ServiceError::Validation {
                message,
                fields: Vec::new(),
            },
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::NotFound(entity) => ServiceError::NotFound(entity.to_string()),
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::UniqueViolation(msg) => ServiceError::Conflict(msg),
            StoreError::Domain(err) => err.into(),
            other => ServiceError::Store(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_fields_keep_every_field() {
        let err: ServiceError = DomainError::InvalidFields(vec![
            FieldError::new("sku", "cannot be empty"),
            FieldError::new("name", "cannot be empty"),
        ])
        .into();
        match err {
            ServiceError::Validation { message, fields } => {
                assert_eq!(fields.len(), 2);
                assert_eq!(message, "sku: cannot be empty; name: cannot be empty");
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: ServiceError = StoreError::UniqueViolation("products.sku".into()).into();
        assert!(matches!(err, ServiceError::Conflict(_)));
    }

    #[test]
    fn domain_errors_raised_in_storage_keep_their_category() {
        let err: ServiceError = StoreError::Domain(DomainError::invariant("overdraw")).into();
        assert!(matches!(err, ServiceError::InvariantViolation(_)));

        let err: ServiceError = StoreError::Unavailable("lock poisoned".into()).into();
        assert!(matches!(err, ServiceError::Store(_)));
    }
}
