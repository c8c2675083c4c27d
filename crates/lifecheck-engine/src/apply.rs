use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use lifecheck_domain::{Address, AttrValue, ConfigDocument, ResourceBlock};
use lifecheck_graph::validate;
use lifecheck_provider::{Provider, ResolvedResource};
use lifecheck_store::{AuditEvent, ResourceRecord, StateStore};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::EngineError;
use crate::report::{ApplyReport, ApplyRequest, Change, DestroyReport};

/// Converge remote state to the given document.
///
/// Walks the validated apply order, resolves each block's symbolic
/// references against already-converged attributes, and drives the
/// provider. Stored resources no longer declared are deleted first.
pub async fn apply(
    req: ApplyRequest,
    store: Arc<dyn StateStore>,
    provider: Arc<dyn Provider>,
) -> Result<ApplyReport, EngineError> {
    let mut report = ApplyReport::new(req.dry_run);
    let doc = &req.document;

    info!(resources = doc.len(), "validating document");
    let plan = validate(doc)?;
    debug!(
        order = ?plan.apply_order.iter().map(|a| a.to_string()).collect::<Vec<_>>(),
        "apply order resolved"
    );

    let actual: HashMap<Address, ResourceRecord> = store
        .list_resources()
        .await?
        .into_iter()
        .map(|r| (r.address().clone(), r))
        .collect();

    // Diff: deletes, then creates/updates in apply order.
    let declared: HashSet<&Address> = doc.addresses().collect();
    let removed: Vec<&ResourceRecord> = actual
        .values()
        .filter(|r| !declared.contains(r.address()))
        .collect();

    for rec in &removed {
        report.changes.push(Change::Deleted {
            address: rec.address().clone(),
        });
    }

    for addr in &plan.apply_order {
        let block = match doc.get(addr) {
            Some(b) => b,
            None => continue,
        };
        match actual.get(addr) {
            None => report.changes.push(Change::Created {
                address: addr.clone(),
            }),
            Some(rec) if rec.desired != *block => report.changes.push(Change::Updated {
                address: addr.clone(),
            }),
            Some(_) => {}
        }
    }

    if req.dry_run {
        info!("dry run, skipping provisioning");
        return Ok(report);
    }

    let run_id = Uuid::new_v4();
    store
        .append_event(&AuditEvent::ApplyStarted {
            id: run_id,
            at: Utc::now(),
            dry_run: false,
        })
        .await?;

    // Handle removals before creates so renamed resources free their slot.
    for rec in removed {
        if let Some(remote_id) = &rec.remote_id {
            provider.delete(remote_id).await?;
        }
        store.delete_resource(rec.address()).await?;
        store
            .append_event(&AuditEvent::ResourceDeleted {
                id: Uuid::new_v4(),
                at: Utc::now(),
                address: rec.address().clone(),
            })
            .await?;
    }

    // Attributes of everything converged so far, for reference resolution.
    let mut converged: HashMap<Address, BTreeMap<String, String>> = actual
        .iter()
        .map(|(a, r)| (a.clone(), r.resolved_attrs.clone()))
        .collect();

    for addr in &plan.apply_order {
        let block = match doc.get(addr) {
            Some(b) => b,
            None => continue,
        };
        let existing = actual.get(addr);
        let resolved = resolve_block(block, &converged)?;

        let (remote_id, attrs, change) = match existing.and_then(|r| r.remote_id.clone()) {
            Some(remote_id) => {
                let unchanged = existing.map_or(false, |r| r.desired == *block);
                if unchanged {
                    // Nothing to push; merge the fresh resolution over the
                    // stored attributes so computed values (`id`) survive.
                    let mut attrs = existing
                        .map(|r| r.resolved_attrs.clone())
                        .unwrap_or_default();
                    attrs.extend(resolved.attrs.clone());
                    (remote_id, attrs, None)
                } else {
                    let attrs = provider.update(&remote_id, &resolved).await?;
                    (remote_id, attrs, Some(Change::Updated { address: addr.clone() }))
                }
            }
            None => {
                let created = provider.create(&resolved).await?;
                (
                    created.remote_id,
                    created.attrs,
                    Some(Change::Created { address: addr.clone() }),
                )
            }
        };

        converged.insert(addr.clone(), attrs.clone());

        let record = ResourceRecord {
            desired: block.clone(),
            remote_id: Some(remote_id),
            resolved_attrs: attrs,
            last_converged_at: Some(Utc::now()),
        };
        store.upsert_resource(&record).await?;

        match change {
            Some(Change::Created { .. }) => {
                store
                    .append_event(&AuditEvent::ResourceCreated {
                        id: Uuid::new_v4(),
                        at: Utc::now(),
                        address: addr.clone(),
                    })
                    .await?;
            }
            Some(Change::Updated { .. }) => {
                store
                    .append_event(&AuditEvent::ResourceUpdated {
                        id: Uuid::new_v4(),
                        at: Utc::now(),
                        address: addr.clone(),
                    })
                    .await?;
            }
            _ => {}
        }
    }

    store
        .append_event(&AuditEvent::ApplyCompleted {
            id: run_id,
            at: Utc::now(),
            changes: report.changes.len(),
            dry_run: false,
        })
        .await?;

    info!(changes = report.changes.len(), "apply complete");
    Ok(report)
}

/// Tear down every stored resource, dependents first.
pub async fn destroy(
    store: Arc<dyn StateStore>,
    provider: Arc<dyn Provider>,
) -> Result<DestroyReport, EngineError> {
    let records = store.list_resources().await?;
    let by_addr: HashMap<Address, ResourceRecord> = records
        .into_iter()
        .map(|r| (r.address().clone(), r))
        .collect();

    // Recover dependency order from the stored desired blocks. A store
    // holding an invalid document can only happen after manual edits;
    // degrade to arbitrary order rather than refuse teardown.
    let doc = ConfigDocument::new(by_addr.values().map(|r| r.desired.clone()).collect());
    let order: Vec<Address> = match validate(&doc) {
        Ok(plan) => plan.apply_order,
        Err(e) => {
            warn!(error = %e, "stored state no longer validates, destroying in arbitrary order");
            doc.addresses().cloned().collect()
        }
    };

    let run_id = Uuid::new_v4();
    store
        .append_event(&AuditEvent::DestroyStarted {
            id: run_id,
            at: Utc::now(),
        })
        .await?;

    let mut report = DestroyReport::default();
    for addr in order.iter().rev() {
        let rec = match by_addr.get(addr) {
            Some(r) => r,
            None => continue,
        };
        if let Some(remote_id) = &rec.remote_id {
            provider.delete(remote_id).await?;
        }
        store.delete_resource(addr).await?;
        store
            .append_event(&AuditEvent::ResourceDeleted {
                id: Uuid::new_v4(),
                at: Utc::now(),
                address: addr.clone(),
            })
            .await?;
        report.deleted.push(addr.clone());
    }

    store
        .append_event(&AuditEvent::DestroyCompleted {
            id: run_id,
            at: Utc::now(),
            deleted: report.deleted.len(),
        })
        .await?;

    info!(deleted = report.deleted.len(), "destroy complete");
    Ok(report)
}

/// Substitute every symbolic reference in `block` with the concrete value
/// recorded for its target. Maps flatten to dotted keys plus a `.%` count
/// entry, so `tags {a, b}` becomes `tags.a`, `tags.b`, `tags.% = 2`.
pub fn resolve_block(
    block: &ResourceBlock,
    converged: &HashMap<Address, BTreeMap<String, String>>,
) -> Result<ResolvedResource, EngineError> {
    let mut attrs = BTreeMap::new();
    for (key, value) in &block.attrs {
        match value {
            AttrValue::Str(s) => {
                attrs.insert(key.clone(), s.clone());
            }
            AttrValue::Int(i) => {
                attrs.insert(key.clone(), i.to_string());
            }
            AttrValue::Bool(b) => {
                attrs.insert(key.clone(), b.to_string());
            }
            AttrValue::Map(m) => {
                for (k, v) in m {
                    attrs.insert(format!("{}.{}", key, k), v.clone());
                }
                attrs.insert(format!("{}.%", key), m.len().to_string());
            }
            AttrValue::Ref(r) => {
                let resolved = converged
                    .get(&r.target)
                    .and_then(|a| a.get(&r.attribute))
                    .cloned()
                    .ok_or_else(|| EngineError::UnresolvedReference {
                        address: block.address.clone(),
                        attribute: key.clone(),
                        target: r.target.clone(),
                        target_attribute: r.attribute.clone(),
                    })?;
                attrs.insert(key.clone(), resolved);
            }
        }
    }
    Ok(ResolvedResource {
        address: block.address.clone(),
        attrs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecheck_fixture::{sql, FixtureParams};
    use lifecheck_provider::SimSqlProvider;
    use lifecheck_store::InMemoryStore;

    fn request(doc: ConfigDocument, dry_run: bool) -> ApplyRequest {
        ApplyRequest {
            document: doc,
            dry_run,
        }
    }

    #[tokio::test]
    async fn dry_run_reports_without_persisting() {
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(SimSqlProvider::new());
        let doc = sql::sql_database_basic(&FixtureParams::new(1, "West US")).unwrap();

        let report = apply(request(doc, true), store.clone(), provider.clone())
            .await
            .unwrap();
        assert!(report.dry_run);
        assert_eq!(report.changes.len(), 3);

        assert!(store.list_resources().await.unwrap().is_empty());
        assert_eq!(provider.live_count().await, 0);
    }

    #[tokio::test]
    async fn apply_persists_and_resolves_references() {
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(SimSqlProvider::new());
        let params = FixtureParams::new(2, "West US");
        let doc = sql::sql_database_basic(&params).unwrap();

        apply(request(doc, false), store.clone(), provider.clone())
            .await
            .unwrap();

        let db = store
            .get_resource(&Address::new("sql_database", "test"))
            .await
            .unwrap()
            .unwrap();
        // The symbolic server_name reference must have become the concrete
        // generated name.
        assert_eq!(
            db.resolved_attrs.get("server_name").unwrap(),
            &params.name("acctestsqlserver")
        );
        assert!(db.remote_id.is_some());
        assert_eq!(provider.live_count().await, 3);
    }

    #[tokio::test]
    async fn second_apply_is_idempotent() {
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(SimSqlProvider::new());
        let doc = sql::sql_database_basic(&FixtureParams::new(3, "West US")).unwrap();

        apply(request(doc.clone(), false), store.clone(), provider.clone())
            .await
            .unwrap();
        let report2 = apply(request(doc, false), store.clone(), provider.clone())
            .await
            .unwrap();

        let creates: Vec<_> = report2
            .changes
            .iter()
            .filter(|c| matches!(c, Change::Created { .. }))
            .collect();
        assert!(creates.is_empty(), "second apply must not create again");
    }

    #[tokio::test]
    async fn tag_update_flows_through_update() {
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(SimSqlProvider::new());
        let params = FixtureParams::new(4, "West US");

        let two = sql::sql_database_with_tags(&params).unwrap();
        apply(request(two, false), store.clone(), provider.clone())
            .await
            .unwrap();

        let one = sql::sql_database_tags_update(&params).unwrap();
        let report = apply(request(one, false), store.clone(), provider.clone())
            .await
            .unwrap();

        assert!(report
            .changes
            .iter()
            .any(|c| matches!(c, Change::Updated { .. })));

        let db = store
            .get_resource(&Address::new("sql_database", "test"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(db.resolved_attrs.get("tags.%").unwrap(), "1");
        assert_eq!(db.resolved_attrs.get("tags.environment").unwrap(), "production");
    }

    #[tokio::test]
    async fn destroy_deletes_dependents_first() {
        let store = Arc::new(InMemoryStore::new());
        let provider = Arc::new(SimSqlProvider::new());
        let doc = sql::sql_database_basic(&FixtureParams::new(5, "West US")).unwrap();

        apply(request(doc, false), store.clone(), provider.clone())
            .await
            .unwrap();
        let report = destroy(store.clone(), provider.clone()).await.unwrap();

        assert_eq!(report.deleted.len(), 3);
        // Database goes before its server, server before its group.
        let pos = |rtype: &str| {
            report
                .deleted
                .iter()
                .position(|a| a.rtype.as_str() == rtype)
                .unwrap()
        };
        assert!(pos("sql_database") < pos("sql_server"));
        assert!(pos("sql_server") < pos("resource_group"));

        assert!(store.list_resources().await.unwrap().is_empty());
        assert_eq!(provider.live_count().await, 0);
    }

    #[tokio::test]
    async fn unresolved_reference_is_reported() {
        let converged = HashMap::new();
        let doc = sql::sql_database_basic(&FixtureParams::new(6, "West US")).unwrap();
        let db = doc
            .get(&Address::new("sql_database", "test"))
            .unwrap();
        let err = resolve_block(db, &converged).unwrap_err();
        assert!(matches!(err, EngineError::UnresolvedReference { .. }));
    }
}
