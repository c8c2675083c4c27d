use chrono::{Duration, Utc};
use lifecheck_domain::{sql, Address, ResourceType};
use lifecheck_fixture::{sql as fixtures, FixtureError, FixtureParams};

use crate::step::{Check, PreHook, Step};

/// A named, ready-to-run lifecycle case: ordered steps plus the resource
/// type the destroy-check enumerates.
pub struct Scenario {
    pub name: &'static str,
    pub summary: &'static str,
    pub steps: Vec<Step>,
    pub destroy_check: ResourceType,
}

pub const NAMES: &[&str] = &[
    "basic",
    "with_tags",
    "data_warehouse",
    "elastic_pool",
    "restore_point_in_time",
];

/// Lead time before the restore point when none is given explicitly.
const DEFAULT_RESTORE_LEAD_SECS: i64 = 5;

fn database() -> Address {
    Address::new(sql::SQL_DATABASE, "test")
}

fn restored_database() -> Address {
    Address::new(sql::SQL_DATABASE, "test_restore")
}

fn elastic_pool_addr() -> Address {
    Address::new(sql::SQL_ELASTICPOOL, "test")
}

pub fn basic(params: &FixtureParams) -> Result<Scenario, FixtureError> {
    let step = Step::new(fixtures::sql_database_basic(params)?)
        .with_check(Check::exists(database()))
        .with_check(Check::attr_eq(database(), "edition", "Standard"))
        .with_check(Check::attr_eq(database(), "max_size_bytes", "1073741824"));
    Ok(Scenario {
        name: "basic",
        summary: "single Standard database converges and tears down",
        steps: vec![step],
        destroy_check: sql::sql_database(),
    })
}

pub fn with_tags(params: &FixtureParams) -> Result<Scenario, FixtureError> {
    let first = Step::new(fixtures::sql_database_with_tags(params)?)
        .with_check(Check::exists(database()))
        .with_check(Check::tag_count(database(), "tags", 2));
    let second = Step::new(fixtures::sql_database_tags_update(params)?)
        .with_check(Check::exists(database()))
        .with_check(Check::tag_count(database(), "tags", 1));
    Ok(Scenario {
        name: "with_tags",
        summary: "tag updates converge to exact counts (2, then 1)",
        steps: vec![first, second],
        destroy_check: sql::sql_database(),
    })
}

pub fn data_warehouse(params: &FixtureParams) -> Result<Scenario, FixtureError> {
    let step = Step::new(fixtures::sql_database_data_warehouse(params)?)
        .with_check(Check::exists(database()))
        .with_check(Check::attr_eq(database(), "edition", "DataWarehouse"))
        .with_check(Check::attr_eq(
            database(),
            "requested_service_objective_name",
            "DW400",
        ));
    Ok(Scenario {
        name: "data_warehouse",
        summary: "DataWarehouse edition with a DW service objective",
        steps: vec![step],
        destroy_check: sql::sql_database(),
    })
}

pub fn elastic_pool(params: &FixtureParams) -> Result<Scenario, FixtureError> {
    let step = Step::new(fixtures::sql_database_elastic_pool(params)?)
        .with_check(Check::exists(database()))
        .with_check(Check::attr_eq(
            database(),
            "elastic_pool_name",
            params.name("acctestep"),
        ))
        // The database never states an edition literal; it must have been
        // derived from the pool block.
        .with_check(Check::attr_matches(
            database(),
            "edition",
            elastic_pool_addr(),
            "edition",
        ));
    Ok(Scenario {
        name: "elastic_pool",
        summary: "database joins an elastic pool, edition derived from it",
        steps: vec![step],
        destroy_check: sql::sql_database(),
    })
}

/// Two steps: converge the source database, then wait until the declared
/// restore point has passed and converge a point-in-time restore of it.
pub fn restore_point_in_time(
    params: &FixtureParams,
    lead: Duration,
) -> Result<Scenario, FixtureError> {
    let restore_at = Utc::now() + lead;
    let restore_params = params.clone().with_restore_at(restore_at);

    let first = Step::new(fixtures::sql_database_basic(params)?)
        .with_check(Check::exists(database()))
        .with_check(Check::absent(restored_database()));
    let second = Step::new(fixtures::sql_database_restore_point_in_time(
        &restore_params,
    )?)
    .with_pre(PreHook::WaitUntil(restore_at))
    .with_check(Check::exists(database()))
    .with_check(Check::exists(restored_database()))
    .with_check(Check::attr_matches(
        restored_database(),
        "source_database_id",
        database(),
        "id",
    ));
    Ok(Scenario {
        name: "restore_point_in_time",
        summary: "point-in-time restore appears once the restore point passes",
        steps: vec![first, second],
        destroy_check: sql::sql_database(),
    })
}

/// Look up a scenario by name, with the default restore lead.
pub fn by_name(name: &str, params: &FixtureParams) -> Option<Result<Scenario, FixtureError>> {
    match name {
        "basic" => Some(basic(params)),
        "with_tags" => Some(with_tags(params)),
        "data_warehouse" => Some(data_warehouse(params)),
        "elastic_pool" => Some(elastic_pool(params)),
        "restore_point_in_time" => Some(restore_point_in_time(
            params,
            Duration::seconds(DEFAULT_RESTORE_LEAD_SECS),
        )),
        _ => None,
    }
}
