use async_trait::async_trait;
use lifecheck_domain::{Address, ResourceType};

use crate::error::StoreError;
use crate::state::{AuditEvent, ResourceRecord};

#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    async fn get_resource(&self, address: &Address) -> Result<Option<ResourceRecord>, StoreError>;
    async fn list_resources(&self) -> Result<Vec<ResourceRecord>, StoreError>;
    async fn list_resources_of_type(
        &self,
        rtype: &ResourceType,
    ) -> Result<Vec<ResourceRecord>, StoreError>;
    async fn upsert_resource(&self, record: &ResourceRecord) -> Result<(), StoreError>;
    async fn delete_resource(&self, address: &Address) -> Result<(), StoreError>;

    async fn append_event(&self, event: &AuditEvent) -> Result<(), StoreError>;

    async fn list_events(
        &self,
        address: Option<&Address>,
        limit: u32,
    ) -> Result<Vec<AuditEvent>, StoreError>;
}
