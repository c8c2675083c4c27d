use chrono::{DateTime, Utc};
use lifecheck_domain::{Address, ConfigDocument};
use tracing::info;

/// Blocking action executed before a step's configuration is applied.
#[derive(Debug, Clone)]
pub enum PreHook {
    /// Sleep until the given instant. Only the remaining time is slept;
    /// an instant that has already passed does not block at all.
    WaitUntil(DateTime<Utc>),
}

impl PreHook {
    pub async fn run(&self) {
        match self {
            PreHook::WaitUntil(at) => {
                let now = Utc::now();
                if *at <= now {
                    return;
                }
                let remaining = (*at - now).to_std().unwrap_or_default();
                info!(until = %at.to_rfc3339(), ?remaining, "waiting before next step");
                tokio::time::sleep(remaining).await;
            }
        }
    }
}

/// One assertion over remote state, evaluated after a step converges.
#[derive(Debug, Clone)]
pub enum Check {
    /// The resource exists remotely.
    Exists { address: Address },
    /// The resource exists and the attribute holds exactly this value.
    AttrEq {
        address: Address,
        attribute: String,
        expected: String,
    },
    /// The resource exists and an attribute equals another resource's
    /// attribute as read remotely (derived values, e.g. a restore's
    /// source id).
    AttrMatches {
        address: Address,
        attribute: String,
        target: Address,
        target_attribute: String,
    },
    /// The map attribute holds exactly this many entries.
    TagCount {
        address: Address,
        attribute: String,
        expected: usize,
    },
    /// The resource does not exist remotely (and may be entirely
    /// unrecorded).
    Absent { address: Address },
}

impl Check {
    pub fn exists(address: Address) -> Self {
        Check::Exists { address }
    }

    pub fn attr_eq(
        address: Address,
        attribute: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Check::AttrEq {
            address,
            attribute: attribute.into(),
            expected: expected.into(),
        }
    }

    pub fn attr_matches(
        address: Address,
        attribute: impl Into<String>,
        target: Address,
        target_attribute: impl Into<String>,
    ) -> Self {
        Check::AttrMatches {
            address,
            attribute: attribute.into(),
            target,
            target_attribute: target_attribute.into(),
        }
    }

    pub fn tag_count(address: Address, attribute: impl Into<String>, expected: usize) -> Self {
        Check::TagCount {
            address,
            attribute: attribute.into(),
            expected,
        }
    }

    pub fn absent(address: Address) -> Self {
        Check::Absent { address }
    }
}

/// One step of a lifecycle run: a configuration to converge, an optional
/// pre-apply hook, and the assertions to evaluate once converged.
#[derive(Debug, Clone)]
pub struct Step {
    pub config: ConfigDocument,
    pub pre: Option<PreHook>,
    pub checks: Vec<Check>,
}

impl Step {
    pub fn new(config: ConfigDocument) -> Self {
        Self {
            config,
            pre: None,
            checks: Vec::new(),
        }
    }

    pub fn with_pre(mut self, pre: PreHook) -> Self {
        self.pre = Some(pre);
        self
    }

    pub fn with_check(mut self, check: Check) -> Self {
        self.checks.push(check);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn elapsed_instant_does_not_sleep() {
        let started = tokio::time::Instant::now();
        PreHook::WaitUntil(Utc::now() - Duration::minutes(5)).run().await;
        assert!(started.elapsed() < std::time::Duration::from_millis(100));
    }

    #[tokio::test]
    async fn sleeps_only_the_remaining_time() {
        let started = tokio::time::Instant::now();
        PreHook::WaitUntil(Utc::now() + Duration::milliseconds(200)).run().await;
        let elapsed = started.elapsed();
        assert!(elapsed >= std::time::Duration::from_millis(150), "{:?}", elapsed);
        assert!(elapsed < std::time::Duration::from_secs(5), "{:?}", elapsed);
    }
}
