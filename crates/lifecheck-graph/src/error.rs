use lifecheck_domain::Address;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("duplicate resource address '{0}' in document")]
    DuplicateAddress(Address),

    #[error("dangling reference: '{from}' attribute '{attribute}' references unknown block '{to}'")]
    DanglingReference {
        from: Address,
        attribute: String,
        to: Address,
    },

    #[error("self reference: '{address}' attribute '{attribute}' references its own block")]
    SelfReference { address: Address, attribute: String },

    #[error("cycle detected in resource reference graph")]
    CycleDetected,

    #[error("multiple errors")]
    Multiple(Vec<GraphError>),
}
