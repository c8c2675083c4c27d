use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use lifecheck_domain::{Address, ResourceType};
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::state::{AuditEvent, ResourceRecord};
use crate::store::StateStore;

#[derive(Debug, Default)]
struct Inner {
    resources: HashMap<Address, ResourceRecord>,
    events: Vec<AuditEvent>,
}

/// In-memory implementation of [`StateStore`].
///
/// All data is lost on process exit. Suitable for the harness and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for InMemoryStore {
    async fn get_resource(&self, address: &Address) -> Result<Option<ResourceRecord>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.resources.get(address).cloned())
    }

    async fn list_resources(&self) -> Result<Vec<ResourceRecord>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard.resources.values().cloned().collect())
    }

    async fn list_resources_of_type(
        &self,
        rtype: &ResourceType,
    ) -> Result<Vec<ResourceRecord>, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .resources
            .values()
            .filter(|r| &r.address().rtype == rtype)
            .cloned()
            .collect())
    }

    async fn upsert_resource(&self, record: &ResourceRecord) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard
            .resources
            .insert(record.address().clone(), record.clone());
        Ok(())
    }

    async fn delete_resource(&self, address: &Address) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.resources.remove(address);
        Ok(())
    }

    async fn append_event(&self, event: &AuditEvent) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        guard.events.push(event.clone());
        Ok(())
    }

    async fn list_events(
        &self,
        address: Option<&Address>,
        limit: u32,
    ) -> Result<Vec<AuditEvent>, StoreError> {
        let guard = self.inner.read().await;
        let filtered: Vec<AuditEvent> = guard
            .events
            .iter()
            .filter(|ev| {
                if let Some(addr) = address {
                    ev.address().map_or(false, |a| a == addr)
                } else {
                    true
                }
            })
            .cloned()
            .collect();

        let start = filtered.len().saturating_sub(limit as usize);
        Ok(filtered[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecheck_domain::{AttrValue, ResourceBlock};
    use std::collections::BTreeMap;

    fn dummy_record(rtype: &str, name: &str) -> ResourceRecord {
        let mut attrs = BTreeMap::new();
        attrs.insert("name".to_string(), AttrValue::from(name));
        ResourceRecord::new(ResourceBlock {
            address: Address::new(rtype, name),
            attrs,
        })
    }

    #[tokio::test]
    async fn upsert_and_get() {
        let store = InMemoryStore::new();
        store
            .upsert_resource(&dummy_record("sql_database", "test"))
            .await
            .unwrap();

        let got = store
            .get_resource(&Address::new("sql_database", "test"))
            .await
            .unwrap();
        assert!(got.is_some());
        assert_eq!(got.unwrap().address().name.as_str(), "test");
    }

    #[tokio::test]
    async fn list_filters_by_type() {
        let store = InMemoryStore::new();
        store
            .upsert_resource(&dummy_record("sql_database", "a"))
            .await
            .unwrap();
        store
            .upsert_resource(&dummy_record("sql_server", "b"))
            .await
            .unwrap();

        let all = store.list_resources().await.unwrap();
        assert_eq!(all.len(), 2);

        let dbs = store
            .list_resources_of_type(&ResourceType::new("sql_database"))
            .await
            .unwrap();
        assert_eq!(dbs.len(), 1);
        assert_eq!(dbs[0].address().name.as_str(), "a");
    }

    #[tokio::test]
    async fn delete_resource() {
        let store = InMemoryStore::new();
        store
            .upsert_resource(&dummy_record("sql_database", "del"))
            .await
            .unwrap();
        store
            .delete_resource(&Address::new("sql_database", "del"))
            .await
            .unwrap();
        assert!(store
            .get_resource(&Address::new("sql_database", "del"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn events_filtered_by_address() {
        use chrono::Utc;
        use uuid::Uuid;

        let store = InMemoryStore::new();
        store
            .append_event(&AuditEvent::ResourceCreated {
                id: Uuid::new_v4(),
                at: Utc::now(),
                address: Address::new("sql_database", "a"),
            })
            .await
            .unwrap();
        store
            .append_event(&AuditEvent::ResourceCreated {
                id: Uuid::new_v4(),
                at: Utc::now(),
                address: Address::new("sql_database", "b"),
            })
            .await
            .unwrap();

        let all = store.list_events(None, 100).await.unwrap();
        assert_eq!(all.len(), 2);

        let for_a = store
            .list_events(Some(&Address::new("sql_database", "a")), 100)
            .await
            .unwrap();
        assert_eq!(for_a.len(), 1);
    }
}
