use models::errors::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("invalid api key")]
    Unauthorized,
    #[error("missing parameter: {0}")]
    MissingParameter(&'static str),
    /// One or more of a group of required parameters is absent.
    #[error("missing parameters, required: {}", .0.join(", "))]
    MissingParameters(&'static [&'static str]),
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("storage unreadable: {0}")]
    StorageUnreadable(String),
    #[error("storage error: {0}")]
    Storage(String),
}

impl ServiceError {
    pub fn not_found(email: &str) -> Self { Self::NotFound(email.to_string()) }

    pub fn storage(e: impl std::fmt::Display) -> Self { Self::Storage(e.to_string()) }
}

impl From<ModelError> for ServiceError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::InvalidDuration(raw) => ServiceError::InvalidDuration(raw),
        }
    }
}
