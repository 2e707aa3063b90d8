use chrono::Utc;

use stocksmart_core::CustomerId;
use stocksmart_parties::{ContactInfo, Customer, NewCustomer};
use stocksmart_sales::NewOrder;

use crate::error::{ServiceError, ServiceResult};
use crate::storage::SharedStorage;

#[derive(Clone)]
pub struct CustomerDirectory {
    storage: SharedStorage,
}

impl CustomerDirectory {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub async fn create_customer(&self, input: NewCustomer) -> ServiceResult<Customer> {
        let customer = Customer::create(CustomerId::new(), input, Utc::now())?;
        self.storage.insert_customer(&customer).await?;
        tracing::info!(customer_id = %customer.id, "customer created");
        Ok(customer)
    }

    pub async fn get_customer(&self, id: CustomerId) -> ServiceResult<Customer> {
        self.storage
            .get_customer(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("customer"))
    }

    pub async fn list_customers(&self, search: Option<&str>) -> ServiceResult<Vec<Customer>> {
        let needle = search.map(str::trim).filter(|s| !s.is_empty());
        Ok(self
            .storage
            .list_customers()
            .await?
            .into_iter()
            .filter(|c| needle.is_none_or(|n| c.matches_search(n)))
            .collect())
    }

    /// Customer link for a new order.
    ///
    /// An explicit id must exist. Otherwise the email picks an existing
    /// customer; failing that a name creates one. With neither the order
    /// stays unlinked and keeps only its snapshot fields.
    pub async fn resolve_for_order(&self, input: &NewOrder) -> ServiceResult<Option<Customer>> {
        if let Some(id) = input.customer_id {
            return self.get_customer(id).await.map(Some);
        }

        let email = input
            .customer_email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty());
        let name = input
            .customer_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        match (email, name) {
            (Some(email), Some(name)) => {
                let candidate = Customer::create(
                    CustomerId::new(),
                    NewCustomer {
                        name: name.to_string(),
                        contact: ContactInfo {
                            email: Some(email.to_string()),
                            phone: input.customer_phone.clone(),
                            address: None,
                        },
                    },
                    Utc::now(),
                )?;
                let customer = self.storage.find_or_create_customer(&candidate).await?;
                if customer.id == candidate.id {
                    tracing::info!(customer_id = %customer.id, "customer created from order");
                }
                Ok(Some(customer))
            }
            (Some(email), None) => Ok(self.storage.find_customer_by_email(email).await?),
            (None, Some(name)) => {
                let customer = Customer::create(
                    CustomerId::new(),
                    NewCustomer {
                        name: name.to_string(),
                        contact: ContactInfo {
                            email: None,
                            phone: input.customer_phone.clone(),
                            address: None,
                        },
                    },
                    Utc::now(),
                )?;
                self.storage.insert_customer(&customer).await?;
                tracing::info!(customer_id = %customer.id, "customer created from order");
                Ok(Some(customer))
            }
            (None, None) => Ok(None),
        }
    }
}
