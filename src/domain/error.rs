use thiserror::Error;

/// Rejections raised before anything reaches storage.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("{field} must not be empty")]
    Blank { field: &'static str },
}
