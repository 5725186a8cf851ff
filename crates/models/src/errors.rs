use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("invalid duration: {0:?}")]
    InvalidDuration(String),
}
