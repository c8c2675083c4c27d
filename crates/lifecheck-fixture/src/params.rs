use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

/// Seed values for one fixture run.
///
/// `run_id` is folded into every generated resource name so that parallel
/// runs against the same provider never collide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureParams {
    pub run_id: u32,
    pub location: String,
    /// Point-in-time restore target, when a scenario needs one.
    pub restore_at: Option<DateTime<Utc>>,
}

impl FixtureParams {
    pub fn new(run_id: u32, location: impl Into<String>) -> Self {
        Self {
            run_id,
            location: location.into(),
            restore_at: None,
        }
    }

    /// Derive a collision-resistant run id from a fresh v4 UUID.
    pub fn generate(location: impl Into<String>) -> Self {
        let run_id = (Uuid::new_v4().as_u128() % 100_000_000) as u32;
        debug!(run_id, "generated fixture params");
        Self::new(run_id, location)
    }

    pub fn with_restore_at(mut self, at: DateTime<Utc>) -> Self {
        self.restore_at = Some(at);
        self
    }

    /// Remote resource name: `prefix` + run id.
    pub fn name(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_run_ids_differ() {
        let a = FixtureParams::generate("West US");
        let b = FixtureParams::generate("West US");
        assert_ne!(a.run_id, b.run_id);
    }

    #[test]
    fn name_appends_run_id() {
        let params = FixtureParams::new(42, "West US");
        assert_eq!(params.name("acctestdb"), "acctestdb42");
    }
}
