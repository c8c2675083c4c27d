use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("create failed: {0}")]
    CreateFailed(String),

    #[error("update failed: {0}")]
    UpdateFailed(String),

    #[error("delete failed: {0}")]
    DeleteFailed(String),

    #[error("read failed: {0}")]
    ReadFailed(String),

    #[error("internal provider error: {0}")]
    Internal(String),
}
