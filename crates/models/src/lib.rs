//! Data model of the premium registry: entries, the persisted document and
//! the `Xday` / `Xmon` duration grammar.

pub mod errors;
pub mod duration;
pub mod premium;

pub use duration::PremiumDuration;
pub use premium::{Entry, RegistryDocument};
