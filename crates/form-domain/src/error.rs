use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid status: {0}")]
    InvalidStatus(String),
    #[error("duplicate field id: {0}")]
    DuplicateFieldId(String),
    #[error("{0}")]
    ValidationError(String),
}
