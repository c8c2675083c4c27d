use std::collections::BTreeMap;
use std::sync::Arc;

use lifecheck_domain::{Address, ResourceType};
use lifecheck_engine::{apply, destroy, ApplyRequest};
use lifecheck_provider::{Provider, ReadOutcome};
use lifecheck_store::StateStore;
use tracing::{debug, info};

use crate::error::{CheckError, HarnessError};
use crate::step::{Check, Step};

/// Outcome of a completed lifecycle run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub steps: usize,
    pub destroyed: usize,
}

/// Drives a sequence of (apply, assert) steps against a provider, then a
/// final destroy and destroy-check.
///
/// Store and provider handles are explicit constructor arguments; the
/// verifier holds no global state.
pub struct Verifier {
    store: Arc<dyn StateStore>,
    provider: Arc<dyn Provider>,
    /// When set, the destroy-check only enumerates resources of this type.
    destroy_check_type: Option<ResourceType>,
}

impl Verifier {
    pub fn new(store: Arc<dyn StateStore>, provider: Arc<dyn Provider>) -> Self {
        Self {
            store,
            provider,
            destroy_check_type: None,
        }
    }

    /// Restrict the destroy-check to one resource type.
    pub fn with_destroy_check_type(mut self, rtype: ResourceType) -> Self {
        self.destroy_check_type = Some(rtype);
        self
    }

    /// Execute all steps in order, fail-fast, then tear down and verify
    /// nothing is left remotely.
    ///
    /// Assertions run only after the engine reports the step converged;
    /// the destroy-check runs only after full teardown.
    pub async fn run(&self, steps: &[Step]) -> Result<RunSummary, HarnessError> {
        for (index, step) in steps.iter().enumerate() {
            if let Some(pre) = &step.pre {
                pre.run().await;
            }

            info!(step = index, resources = step.config.len(), "applying step");
            apply(
                ApplyRequest {
                    document: step.config.clone(),
                    dry_run: false,
                },
                self.store.clone(),
                self.provider.clone(),
            )
            .await
            .map_err(|source| HarnessError::ApplyFailed { index, source })?;

            for check in &step.checks {
                self.check(check)
                    .await
                    .map_err(|source| HarnessError::CheckFailed { index, source })?;
            }
            debug!(step = index, checks = step.checks.len(), "step converged");
        }

        // Snapshot what teardown is about to remove; the destroy-check
        // reads these ids back afterwards.
        let snapshot = self
            .final_snapshot()
            .await
            .map_err(HarnessError::DestroyCheck)?;

        let report = destroy(self.store.clone(), self.provider.clone())
            .await
            .map_err(HarnessError::Destroy)?;

        self.destroyed(&snapshot)
            .await
            .map_err(HarnessError::DestroyCheck)?;

        Ok(RunSummary {
            steps: steps.len(),
            destroyed: report.deleted.len(),
        })
    }

    /// Assert a resource exists remotely, optionally pinning attribute
    /// values. Returns the remote attributes on success.
    ///
    /// A transport failure is a hard error; a successful read that finds
    /// nothing fails the assertion as `Missing`. Single read, no retries.
    pub async fn exists(
        &self,
        address: &Address,
        attr_checks: &[(&str, &str)],
    ) -> Result<BTreeMap<String, String>, CheckError> {
        let record = self
            .store
            .get_resource(address)
            .await?
            .ok_or_else(|| CheckError::NotInState(address.clone()))?;
        let remote_id = record
            .remote_id
            .ok_or_else(|| CheckError::NotCreated(address.clone()))?;

        let outcome = self
            .provider
            .read(&remote_id)
            .await
            .map_err(|source| CheckError::Read {
                address: address.clone(),
                source,
            })?;

        let attrs = match outcome {
            ReadOutcome::Present { attrs } => attrs,
            ReadOutcome::Absent => return Err(CheckError::Missing(address.clone())),
        };

        for (attribute, expected) in attr_checks {
            let actual = attrs.get(*attribute).map(|s| s.as_str()).unwrap_or("");
            if actual != *expected {
                return Err(CheckError::AttributeMismatch {
                    address: address.clone(),
                    attribute: attribute.to_string(),
                    expected: expected.to_string(),
                    actual: actual.to_string(),
                });
            }
        }
        Ok(attrs)
    }

    /// Destroy-check: read back every snapshotted resource; any read that
    /// still succeeds means the resource leaked teardown.
    pub async fn destroyed(&self, snapshot: &[(Address, String)]) -> Result<(), CheckError> {
        for (address, remote_id) in snapshot {
            let outcome = self
                .provider
                .read(remote_id)
                .await
                .map_err(|source| CheckError::Read {
                    address: address.clone(),
                    source,
                })?;
            if outcome.is_present() {
                return Err(CheckError::Leaked {
                    address: address.clone(),
                    remote_id: remote_id.clone(),
                });
            }
        }
        Ok(())
    }

    async fn final_snapshot(&self) -> Result<Vec<(Address, String)>, CheckError> {
        let records = match &self.destroy_check_type {
            Some(rtype) => self.store.list_resources_of_type(rtype).await?,
            None => self.store.list_resources().await?,
        };
        Ok(records
            .into_iter()
            .filter_map(|r| {
                let addr = r.address().clone();
                r.remote_id.map(|id| (addr, id))
            })
            .collect())
    }

    async fn check(&self, check: &Check) -> Result<(), CheckError> {
        match check {
            Check::Exists { address } => {
                self.exists(address, &[]).await?;
            }
            Check::AttrEq {
                address,
                attribute,
                expected,
            } => {
                self.exists(address, &[(attribute.as_str(), expected.as_str())])
                    .await?;
            }
            Check::AttrMatches {
                address,
                attribute,
                target,
                target_attribute,
            } => {
                let target_attrs = self.exists(target, &[]).await?;
                let expected = target_attrs
                    .get(target_attribute)
                    .cloned()
                    .unwrap_or_default();
                self.exists(address, &[(attribute.as_str(), expected.as_str())])
                    .await?;
            }
            Check::TagCount {
                address,
                attribute,
                expected,
            } => {
                // Maps are flattened with a `<attr>.%` count entry.
                let count_key = format!("{}.%", attribute);
                let attrs = self.exists(address, &[]).await?;
                let actual = attrs.get(&count_key).map(|s| s.as_str()).unwrap_or("0");
                if actual != expected.to_string() {
                    return Err(CheckError::AttributeMismatch {
                        address: address.clone(),
                        attribute: count_key,
                        expected: expected.to_string(),
                        actual: actual.to_string(),
                    });
                }
            }
            Check::Absent { address } => {
                let record = self.store.get_resource(address).await?;
                let remote_id = match record.and_then(|r| r.remote_id) {
                    Some(id) => id,
                    // Never created: absent by definition.
                    None => return Ok(()),
                };
                let outcome =
                    self.provider
                        .read(&remote_id)
                        .await
                        .map_err(|source| CheckError::Read {
                            address: address.clone(),
                            source,
                        })?;
                if outcome.is_present() {
                    return Err(CheckError::UnexpectedlyPresent(address.clone()));
                }
            }
        }
        Ok(())
    }
}
