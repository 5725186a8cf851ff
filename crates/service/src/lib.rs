//! Service layer for the premium registry.
//! - Owns the expiry-lifecycle rules (upsert, delete, purge-on-list).
//! - Persists the registry through the `RegistryStore` seam.
//! - Provides clear error types consumed by the HTTP layer.

pub mod errors;
pub mod auth;
pub mod metrics;
pub mod runtime;
pub mod storage;
pub mod premium;
