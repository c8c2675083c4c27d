use lifecheck_domain::{Address, ConfigDocument};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyRequest {
    pub document: ConfigDocument,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Change {
    Created { address: Address },
    Updated { address: Address },
    Deleted { address: Address },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplyReport {
    pub dry_run: bool,
    pub changes: Vec<Change>,
}

impl ApplyReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            changes: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestroyReport {
    pub deleted: Vec<Address>,
}
