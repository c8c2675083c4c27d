use lifecheck_domain::Address;
use lifecheck_engine::EngineError;
use lifecheck_provider::ProviderError;
use lifecheck_store::StoreError;
use thiserror::Error;

/// Failure of a single assertion against remote state.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("resource '{0}' is not recorded in state")]
    NotInState(Address),

    #[error("resource '{0}' has never been created (no remote id)")]
    NotCreated(Address),

    #[error("resource '{0}' does not exist remotely")]
    Missing(Address),

    #[error("resource '{0}' unexpectedly exists")]
    UnexpectedlyPresent(Address),

    #[error("attribute mismatch on '{address}': '{attribute}' expected '{expected}', got '{actual}'")]
    AttributeMismatch {
        address: Address,
        attribute: String,
        expected: String,
        actual: String,
    },

    #[error("resource '{address}' still exists after teardown ('{remote_id}')")]
    Leaked { address: Address, remote_id: String },

    #[error("read failed for '{address}': {source}")]
    Read {
        address: Address,
        #[source]
        source: ProviderError,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("step {index}: apply failed: {source}")]
    ApplyFailed {
        index: usize,
        #[source]
        source: EngineError,
    },

    #[error("step {index}: {source}")]
    CheckFailed {
        index: usize,
        #[source]
        source: CheckError,
    },

    #[error("teardown failed: {0}")]
    Destroy(#[source] EngineError),

    #[error("destroy check: {0}")]
    DestroyCheck(#[source] CheckError),

    #[error("fixture error: {0}")]
    Fixture(#[from] lifecheck_fixture::FixtureError),
}
