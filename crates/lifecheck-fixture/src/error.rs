use thiserror::Error;

#[derive(Debug, Error)]
pub enum FixtureError {
    #[error("duplicate attribute '{attribute}' on block '{address}'")]
    DuplicateAttribute { address: String, attribute: String },

    #[error("fixture '{0}' requires a restore point timestamp")]
    MissingRestorePoint(String),

    #[error("domain error: {0}")]
    Domain(#[from] lifecheck_domain::DomainError),
}
