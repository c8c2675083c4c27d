use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid resource address: {0}")]
    InvalidAddress(String),

    #[error("invalid edition: {0}")]
    InvalidEdition(String),

    #[error("duplicate attribute '{0}' in resource block")]
    DuplicateAttribute(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
