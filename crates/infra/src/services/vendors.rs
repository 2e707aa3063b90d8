use chrono::Utc;

use stocksmart_core::VendorId;
use stocksmart_parties::{NewVendor, Vendor, VendorPatch, VendorStatus};
use stocksmart_sales::GrnHeader;

use crate::error::{ServiceError, ServiceResult};
use crate::storage::SharedStorage;

/// Filters for listing vendors.
#[derive(Debug, Clone, Default)]
pub struct VendorFilter {
    pub status: Option<VendorStatus>,
    pub main_category: Option<String>,
    pub search: Option<String>,
}

#[derive(Clone)]
pub struct VendorDirectory {
    storage: SharedStorage,
}

impl VendorDirectory {
    pub fn new(storage: SharedStorage) -> Self {
        Self { storage }
    }

    pub async fn create_vendor(&self, input: NewVendor) -> ServiceResult<Vendor> {
        let vendor = Vendor::create(VendorId::new(), input, Utc::now())?;
        self.storage.insert_vendor(&vendor).await?;
        tracing::info!(vendor_id = %vendor.id, status = vendor.status.as_str(), "vendor created");
        Ok(vendor)
    }

    pub async fn get_vendor(&self, id: VendorId) -> ServiceResult<Vendor> {
        self.storage
            .get_vendor(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("vendor"))
    }

    pub async fn list_vendors(&self, filter: &VendorFilter) -> ServiceResult<Vec<Vendor>> {
        let needle = filter.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let category = filter
            .main_category
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        Ok(self
            .storage
            .list_vendors()
            .await?
            .into_iter()
            .filter(|v| filter.status.is_none_or(|s| v.status == s))
            .filter(|v| category.is_none_or(|c| v.in_category(c)))
            .filter(|v| needle.is_none_or(|n| v.matches_search(n)))
            .collect())
    }

    pub async fn update_vendor(&self, id: VendorId, patch: VendorPatch) -> ServiceResult<Vendor> {
        let mut vendor = self.get_vendor(id).await?;
        vendor.apply_patch(patch, Utc::now())?;
        self.storage.update_vendor(&vendor).await?;
        tracing::info!(vendor_id = %id, "vendor updated");
        Ok(vendor)
    }

    pub async fn set_status(&self, id: VendorId, status: VendorStatus) -> ServiceResult<Vendor> {
        let mut vendor = self.get_vendor(id).await?;
        let previous = vendor.status;
        vendor.set_status(status, Utc::now())?;
        self.storage.update_vendor(&vendor).await?;
        tracing::info!(
            vendor_id = %id,
            from = previous.as_str(),
            to = status.as_str(),
            "vendor status changed"
        );
        Ok(vendor)
    }

    /// Fill a receipt header from the directory when it names a vendor.
    ///
    /// The vendor must exist. A blank `vendor_name` takes the directory name
    /// and a missing address takes the vendor's location.
    pub async fn link_receipt(&self, header: &mut GrnHeader) -> ServiceResult<()> {
        let Some(id) = header.vendor_id else {
            return Ok(());
        };
        let vendor = self.get_vendor(id).await?;
        if header.vendor_name.trim().is_empty() {
            header.vendor_name = vendor.name;
        }
        if header.vendor_address.is_none() {
            header.vendor_address = vendor.location;
        }
        Ok(())
    }
}
