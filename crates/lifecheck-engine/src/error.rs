use lifecheck_domain::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("graph validation error: {0}")]
    Graph(#[from] lifecheck_graph::GraphError),

    #[error("store error: {0}")]
    Store(#[from] lifecheck_store::StoreError),

    #[error("provider error: {0}")]
    Provider(#[from] lifecheck_provider::ProviderError),

    #[error("unresolved reference: '{address}' attribute '{attribute}' reads '{target_attribute}' from '{target}' which has not converged")]
    UnresolvedReference {
        address: Address,
        attribute: String,
        target: Address,
        target_attribute: String,
    },

    #[error("internal error: {0}")]
    Internal(String),
}
