use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use lifecheck_domain::{Address, ResourceBlock};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What the engine knows about one resource: the declared block, the
/// remote id handed back by the provider, and the concrete attribute
/// values after reference resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceRecord {
    /// The desired block as declared in the document.
    pub desired: ResourceBlock,
    /// Remote id returned by the provider on create. None until the first
    /// successful create.
    pub remote_id: Option<String>,
    /// Fully resolved key→value attributes sent to the provider.
    pub resolved_attrs: BTreeMap<String, String>,
    /// Wall-clock time of the last successful converge of this resource.
    pub last_converged_at: Option<DateTime<Utc>>,
}

impl ResourceRecord {
    pub fn new(desired: ResourceBlock) -> Self {
        Self {
            desired,
            remote_id: None,
            resolved_attrs: BTreeMap::new(),
            last_converged_at: None,
        }
    }

    pub fn address(&self) -> &Address {
        &self.desired.address
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AuditEvent {
    ApplyStarted {
        id: Uuid,
        at: DateTime<Utc>,
        dry_run: bool,
    },
    ApplyCompleted {
        id: Uuid,
        at: DateTime<Utc>,
        changes: usize,
        dry_run: bool,
    },
    ResourceCreated {
        id: Uuid,
        at: DateTime<Utc>,
        address: Address,
    },
    ResourceUpdated {
        id: Uuid,
        at: DateTime<Utc>,
        address: Address,
    },
    ResourceDeleted {
        id: Uuid,
        at: DateTime<Utc>,
        address: Address,
    },
    DestroyStarted {
        id: Uuid,
        at: DateTime<Utc>,
    },
    DestroyCompleted {
        id: Uuid,
        at: DateTime<Utc>,
        deleted: usize,
    },
}

impl AuditEvent {
    pub fn address(&self) -> Option<&Address> {
        match self {
            AuditEvent::ResourceCreated { address, .. } => Some(address),
            AuditEvent::ResourceUpdated { address, .. } => Some(address),
            AuditEvent::ResourceDeleted { address, .. } => Some(address),
            _ => None,
        }
    }
}
