use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lifecheck_domain::{sql, ResourceType, SqlEdition};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::ProviderError;
use crate::provider::{Created, Provider, ReadOutcome, ResolvedResource};

#[derive(Debug, Clone)]
struct SimResource {
    rtype: ResourceType,
    attrs: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Inner {
    resources: HashMap<String, SimResource>,
    fail_reads: Vec<String>,
}

/// A stateful simulated SQL cloud.
///
/// Holds created resources in memory so reads observe exactly what earlier
/// steps converged, enforces the containment and edition rules a real SQL
/// control plane would, and performs no I/O.
#[derive(Debug, Clone, Default)]
pub struct SimSqlProvider {
    inner: Arc<RwLock<Inner>>,
}

impl SimSqlProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent read whose remote id contains `fragment` fail
    /// with a transport-style error. Used to exercise the harness's
    /// hard-failure path.
    pub async fn fail_reads_matching(&self, fragment: impl Into<String>) {
        self.inner.write().await.fail_reads.push(fragment.into());
    }

    pub async fn clear_read_failures(&self) {
        self.inner.write().await.fail_reads.clear();
    }

    /// Number of live resources, across all types.
    pub async fn live_count(&self) -> usize {
        self.inner.read().await.resources.len()
    }

    fn require<'a>(res: &'a ResolvedResource, key: &str) -> Result<&'a str, ProviderError> {
        res.attr(key).ok_or_else(|| {
            ProviderError::CreateFailed(format!(
                "{}: missing required attribute '{}'",
                res.address, key
            ))
        })
    }

    fn group_id(name: &str) -> String {
        format!("/groups/{}", name)
    }

    fn server_id(group: &str, name: &str) -> String {
        format!("/groups/{}/servers/{}", group, name)
    }

    fn pool_id(group: &str, server: &str, name: &str) -> String {
        format!("/groups/{}/servers/{}/pools/{}", group, server, name)
    }

    fn database_id(group: &str, server: &str, name: &str) -> String {
        format!("/groups/{}/servers/{}/databases/{}", group, server, name)
    }

    /// Validate a resolved resource against current remote state and derive
    /// its remote id. Containment rules: servers live in groups, pools and
    /// databases live in servers.
    fn validate(inner: &Inner, res: &ResolvedResource) -> Result<String, ProviderError> {
        match res.address.rtype.as_str() {
            sql::RESOURCE_GROUP => {
                let name = Self::require(res, "name")?;
                Self::require(res, "location")?;
                Ok(Self::group_id(name))
            }
            sql::SQL_SERVER => {
                let name = Self::require(res, "name")?;
                let group = Self::require(res, "resource_group_name")?;
                Self::require(res, "location")?;
                Self::require(res, "version")?;
                Self::require(res, "administrator_login")?;
                Self::require(res, "administrator_login_password")?;
                if !inner.resources.contains_key(&Self::group_id(group)) {
                    return Err(ProviderError::CreateFailed(format!(
                        "{}: resource group '{}' does not exist",
                        res.address, group
                    )));
                }
                Ok(Self::server_id(group, name))
            }
            sql::SQL_ELASTICPOOL => {
                let name = Self::require(res, "name")?;
                let group = Self::require(res, "resource_group_name")?;
                let server = Self::require(res, "server_name")?;
                let edition = Self::require(res, "edition")?;
                SqlEdition::parse(edition)
                    .map_err(|e| ProviderError::CreateFailed(format!("{}: {}", res.address, e)))?;
                Self::require(res, "dtu")?;
                if !inner.resources.contains_key(&Self::server_id(group, server)) {
                    return Err(ProviderError::CreateFailed(format!(
                        "{}: server '{}' does not exist",
                        res.address, server
                    )));
                }
                Ok(Self::pool_id(group, server, name))
            }
            sql::SQL_DATABASE => {
                let name = Self::require(res, "name")?;
                let group = Self::require(res, "resource_group_name")?;
                let server = Self::require(res, "server_name")?;
                if !inner.resources.contains_key(&Self::server_id(group, server)) {
                    return Err(ProviderError::CreateFailed(format!(
                        "{}: server '{}' does not exist",
                        res.address, server
                    )));
                }

                let edition = res
                    .attr("edition")
                    .map(|e| {
                        SqlEdition::parse(e).map_err(|err| {
                            ProviderError::CreateFailed(format!("{}: {}", res.address, err))
                        })
                    })
                    .transpose()?;

                if let Some(pool) = res.attr("elastic_pool_name") {
                    let pool_id = Self::pool_id(group, server, pool);
                    let pool_res = inner.resources.get(&pool_id).ok_or_else(|| {
                        ProviderError::CreateFailed(format!(
                            "{}: elastic pool '{}' does not exist on server '{}'",
                            res.address, pool, server
                        ))
                    })?;
                    let pool_edition = pool_res.attrs.get("edition").cloned().unwrap_or_default();
                    if let Some(edition) = edition {
                        if edition.to_string() != pool_edition {
                            return Err(ProviderError::CreateFailed(format!(
                                "{}: edition '{}' does not match elastic pool edition '{}'",
                                res.address, edition, pool_edition
                            )));
                        }
                        if !edition.supports_elastic_pool() {
                            return Err(ProviderError::CreateFailed(format!(
                                "{}: edition '{}' cannot be placed in an elastic pool",
                                res.address, edition
                            )));
                        }
                    }
                }

                if res.attr("create_mode") == Some("PointInTimeRestore") {
                    let source = Self::require(res, "source_database_id")?;
                    if !inner.resources.contains_key(source) {
                        return Err(ProviderError::CreateFailed(format!(
                            "{}: source database '{}' does not exist",
                            res.address, source
                        )));
                    }
                    let point = Self::require(res, "restore_point_in_time")?;
                    let point: DateTime<Utc> = point
                        .parse()
                        .map_err(|e| {
                            ProviderError::CreateFailed(format!(
                                "{}: invalid restore_point_in_time '{}': {}",
                                res.address, point, e
                            ))
                        })?;
                    if point > Utc::now() {
                        return Err(ProviderError::CreateFailed(format!(
                            "{}: restore point {} is in the future",
                            res.address,
                            point.to_rfc3339()
                        )));
                    }
                }

                Ok(Self::database_id(group, server, name))
            }
            other => Err(ProviderError::CreateFailed(format!(
                "unknown resource type '{}'",
                other
            ))),
        }
    }
}

#[async_trait]
impl Provider for SimSqlProvider {
    fn name(&self) -> &'static str {
        "sim-sql"
    }

    async fn create(&self, resource: &ResolvedResource) -> Result<Created, ProviderError> {
        let mut guard = self.inner.write().await;
        let remote_id = Self::validate(&guard, resource)?;

        if guard.resources.contains_key(&remote_id) {
            return Err(ProviderError::CreateFailed(format!(
                "{}: already exists as '{}'",
                resource.address, remote_id
            )));
        }

        debug!(address = %resource.address, remote_id, "SimSqlProvider: create");

        let mut attrs = resource.attrs.clone();
        attrs.insert("id".to_string(), remote_id.clone());
        guard.resources.insert(
            remote_id.clone(),
            SimResource {
                rtype: resource.address.rtype.clone(),
                attrs: attrs.clone(),
            },
        );

        Ok(Created { remote_id, attrs })
    }

    async fn update(
        &self,
        remote_id: &str,
        resource: &ResolvedResource,
    ) -> Result<BTreeMap<String, String>, ProviderError> {
        let mut guard = self.inner.write().await;
        if !guard.resources.contains_key(remote_id) {
            return Err(ProviderError::UpdateFailed(format!(
                "{}: no such resource '{}'",
                resource.address, remote_id
            )));
        }

        debug!(address = %resource.address, remote_id, "SimSqlProvider: update");

        let mut attrs = resource.attrs.clone();
        attrs.insert("id".to_string(), remote_id.to_string());
        let rtype = resource.address.rtype.clone();
        guard.resources.insert(
            remote_id.to_string(),
            SimResource {
                rtype,
                attrs: attrs.clone(),
            },
        );
        Ok(attrs)
    }

    async fn delete(&self, remote_id: &str) -> Result<(), ProviderError> {
        let mut guard = self.inner.write().await;
        debug!(remote_id, "SimSqlProvider: delete");
        guard.resources.remove(remote_id);
        Ok(())
    }

    async fn read(&self, remote_id: &str) -> Result<ReadOutcome, ProviderError> {
        let guard = self.inner.read().await;
        if guard.fail_reads.iter().any(|f| remote_id.contains(f)) {
            return Err(ProviderError::ReadFailed(format!(
                "simulated transport failure reading '{}'",
                remote_id
            )));
        }
        match guard.resources.get(remote_id) {
            Some(r) => Ok(ReadOutcome::Present {
                attrs: r.attrs.clone(),
            }),
            None => Ok(ReadOutcome::Absent),
        }
    }

    async fn list(&self, rtype: &ResourceType) -> Result<Vec<String>, ProviderError> {
        let guard = self.inner.read().await;
        Ok(guard
            .resources
            .iter()
            .filter(|(_, r)| &r.rtype == rtype)
            .map(|(id, _)| id.clone())
            .collect())
    }
}
