use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::types::ResourceType;

// ── Resource type vocabulary ──────────────────────────────────────────────────

pub const RESOURCE_GROUP: &str = "resource_group";
pub const SQL_SERVER: &str = "sql_server";
pub const SQL_ELASTICPOOL: &str = "sql_elasticpool";
pub const SQL_DATABASE: &str = "sql_database";

pub fn resource_group() -> ResourceType {
    ResourceType::new(RESOURCE_GROUP)
}

pub fn sql_server() -> ResourceType {
    ResourceType::new(SQL_SERVER)
}

pub fn sql_elasticpool() -> ResourceType {
    ResourceType::new(SQL_ELASTICPOOL)
}

pub fn sql_database() -> ResourceType {
    ResourceType::new(SQL_DATABASE)
}

// ── Editions ──────────────────────────────────────────────────────────────────

/// Database edition tiers accepted by the provider. Anything outside this
/// set is rejected at create time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SqlEdition {
    Basic,
    Standard,
    Premium,
    DataWarehouse,
}

impl SqlEdition {
    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "Basic" => Ok(SqlEdition::Basic),
            "Standard" => Ok(SqlEdition::Standard),
            "Premium" => Ok(SqlEdition::Premium),
            "DataWarehouse" => Ok(SqlEdition::DataWarehouse),
            other => Err(DomainError::InvalidEdition(other.to_string())),
        }
    }

    /// Editions that may host databases inside an elastic pool.
    pub fn supports_elastic_pool(&self) -> bool {
        !matches!(self, SqlEdition::DataWarehouse)
    }
}

impl std::fmt::Display for SqlEdition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlEdition::Basic => write!(f, "Basic"),
            SqlEdition::Standard => write!(f, "Standard"),
            SqlEdition::Premium => write!(f, "Premium"),
            SqlEdition::DataWarehouse => write!(f, "DataWarehouse"),
        }
    }
}

impl std::str::FromStr for SqlEdition {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SqlEdition::parse(s)
    }
}
