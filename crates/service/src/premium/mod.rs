//! Premium registry: storage seam and the expiry-lifecycle service.

pub mod service;
pub mod store;

pub use service::{AddPremium, Listing, RegistryService};
pub use store::{FileRegistryStore, RegistryStore};
