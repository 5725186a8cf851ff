//! Shared-secret check for mutating registry operations.

use std::{fmt, sync::Arc};

use subtle::ConstantTimeEq;

/// The static api key callers must present to add or delete entries.
#[derive(Clone)]
pub struct SharedSecret(Arc<str>);

impl SharedSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(Arc::from(secret.into()))
    }

    /// Constant-time comparison; a missing or empty candidate never matches.
    pub fn verify(&self, candidate: Option<&str>) -> bool {
        match candidate {
            Some(c) if !c.is_empty() && !self.0.is_empty() => {
                self.0.as_bytes().ct_eq(c.as_bytes()).into()
            }
            _ => false,
        }
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedSecret(***)")
    }
}
