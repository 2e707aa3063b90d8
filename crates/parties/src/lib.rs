//! Parties domain module: customers and vendors.
//!
//! Customers are mostly created as a side effect of order placement
//! (resolve-by-email, else create), but can also be registered directly.
//! Vendors form the supplier directory that goods receipts point at.

pub mod customer;
pub mod vendor;

pub use customer::{normalize_email, ContactInfo, Customer, NewCustomer};
pub use vendor::{normalize_category, NewVendor, Vendor, VendorPatch, VendorStatus};
