use std::collections::BTreeMap;

use async_trait::async_trait;
use lifecheck_domain::{Address, ResourceType};

use crate::error::ProviderError;

/// A resource block after the engine has substituted every symbolic
/// reference. All values are concrete strings at this point.
#[derive(Debug, Clone)]
pub struct ResolvedResource {
    pub address: Address,
    pub attrs: BTreeMap<String, String>,
}

impl ResolvedResource {
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(|s| s.as_str())
    }
}

/// Result of a successful create call.
#[derive(Debug, Clone)]
pub struct Created {
    /// Remote id the provider uses to reference this resource from now on.
    pub remote_id: String,
    /// Attribute values as the remote side recorded them (may include
    /// computed attributes such as `id`).
    pub attrs: BTreeMap<String, String>,
}

/// Outcome of a read that completed without a transport or auth failure.
///
/// `Absent` is a successful read that found nothing. It is the expected
/// result after teardown and must not be conflated with [`ProviderError`].
#[derive(Debug, Clone)]
pub enum ReadOutcome {
    Present { attrs: BTreeMap<String, String> },
    Absent,
}

impl ReadOutcome {
    pub fn is_present(&self) -> bool {
        matches!(self, ReadOutcome::Present { .. })
    }
}

#[async_trait]
pub trait Provider: Send + Sync + 'static {
    fn name(&self) -> &'static str;

    // ── Mutating ──────────────────────────────────────────────────────────────

    async fn create(&self, resource: &ResolvedResource) -> Result<Created, ProviderError>;

    async fn update(
        &self,
        remote_id: &str,
        resource: &ResolvedResource,
    ) -> Result<BTreeMap<String, String>, ProviderError>;

    async fn delete(&self, remote_id: &str) -> Result<(), ProviderError>;

    // ── Read-only ─────────────────────────────────────────────────────────────

    /// Read the current remote state of one resource by id, without
    /// modifying anything. Single attempt, no retries.
    async fn read(&self, remote_id: &str) -> Result<ReadOutcome, ProviderError>;

    /// All remote ids currently known for a resource type.
    async fn list(&self, rtype: &ResourceType) -> Result<Vec<String>, ProviderError>;
}
