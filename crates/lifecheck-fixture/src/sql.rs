use lifecheck_domain::{sql, Address, ConfigDocument, ResourceBlock};

use crate::builder::resource;
use crate::error::FixtureError;
use crate::params::FixtureParams;

fn group_addr() -> Address {
    Address::new(sql::RESOURCE_GROUP, "test")
}

fn server_addr() -> Address {
    Address::new(sql::SQL_SERVER, "test")
}

fn pool_addr() -> Address {
    Address::new(sql::SQL_ELASTICPOOL, "test")
}

fn database_addr() -> Address {
    Address::new(sql::SQL_DATABASE, "test")
}

fn group_block(params: &FixtureParams) -> Result<ResourceBlock, FixtureError> {
    resource(sql::RESOURCE_GROUP, "test")
        .attr_str("name", params.name("acctestRG_"))
        .attr_str("location", &params.location)
        .build()
}

fn server_block(params: &FixtureParams) -> Result<ResourceBlock, FixtureError> {
    resource(sql::SQL_SERVER, "test")
        .attr_str("name", params.name("acctestsqlserver"))
        .reference("resource_group_name", group_addr(), "name")
        .reference("location", group_addr(), "location")
        .attr_str("version", "12.0")
        .attr_str("administrator_login", "mradministrator")
        .attr_str("administrator_login_password", "thisIsDog11")
        .build()
}

fn standard_database(params: &FixtureParams) -> crate::builder::ResourceBlockBuilder {
    resource(sql::SQL_DATABASE, "test")
        .attr_str("name", params.name("acctestdb"))
        .reference("resource_group_name", group_addr(), "name")
        .reference("server_name", server_addr(), "name")
        .reference("location", group_addr(), "location")
        .attr_str("edition", "Standard")
        .attr_str("collation", "SQL_Latin1_General_CP1_CI_AS")
        .attr_str("max_size_bytes", "1073741824")
        .attr_str("requested_service_objective_name", "S0")
}

/// Resource group + server + one Standard S0 database.
pub fn sql_database_basic(params: &FixtureParams) -> Result<ConfigDocument, FixtureError> {
    Ok(ConfigDocument::new(vec![
        group_block(params)?,
        server_block(params)?,
        standard_database(params).build()?,
    ]))
}

/// Basic database carrying two tags.
pub fn sql_database_with_tags(params: &FixtureParams) -> Result<ConfigDocument, FixtureError> {
    Ok(ConfigDocument::new(vec![
        group_block(params)?,
        server_block(params)?,
        standard_database(params)
            .attr_map("tags", [("environment", "staging"), ("database", "test")])
            .build()?,
    ]))
}

/// Tag-update step: same database, one tag left.
pub fn sql_database_tags_update(params: &FixtureParams) -> Result<ConfigDocument, FixtureError> {
    Ok(ConfigDocument::new(vec![
        group_block(params)?,
        server_block(params)?,
        standard_database(params)
            .attr_map("tags", [("environment", "production")])
            .build()?,
    ]))
}

/// DataWarehouse edition with a DW service objective and no max size.
pub fn sql_database_data_warehouse(params: &FixtureParams) -> Result<ConfigDocument, FixtureError> {
    Ok(ConfigDocument::new(vec![
        group_block(params)?,
        server_block(params)?,
        resource(sql::SQL_DATABASE, "test")
            .attr_str("name", params.name("acctestdb"))
            .reference("resource_group_name", group_addr(), "name")
            .reference("server_name", server_addr(), "name")
            .reference("location", group_addr(), "location")
            .attr_str("edition", "DataWarehouse")
            .attr_str("collation", "SQL_Latin1_General_CP1_CI_AS")
            .attr_str("requested_service_objective_name", "DW400")
            .build()?,
    ]))
}

/// Elastic pool plus a database whose edition and pool name are derived
/// from the pool block, not spelled out as literals.
pub fn sql_database_elastic_pool(params: &FixtureParams) -> Result<ConfigDocument, FixtureError> {
    Ok(ConfigDocument::new(vec![
        group_block(params)?,
        server_block(params)?,
        resource(sql::SQL_ELASTICPOOL, "test")
            .attr_str("name", params.name("acctestep"))
            .reference("resource_group_name", group_addr(), "name")
            .reference("location", group_addr(), "location")
            .reference("server_name", server_addr(), "name")
            .attr_str("edition", "Basic")
            .attr_int("dtu", 50)
            .attr_int("pool_size", 5000)
            .build()?,
        resource(sql::SQL_DATABASE, "test")
            .attr_str("name", params.name("acctestdb"))
            .reference("resource_group_name", group_addr(), "name")
            .reference("server_name", server_addr(), "name")
            .reference("location", group_addr(), "location")
            .reference("edition", pool_addr(), "edition")
            .attr_str("collation", "SQL_Latin1_General_CP1_CI_AS")
            .attr_str("max_size_bytes", "1073741824")
            .reference("elastic_pool_name", pool_addr(), "name")
            .attr_str("requested_service_objective_name", "ElasticPool")
            .build()?,
    ]))
}

/// Basic database plus a second one restored from it at
/// `params.restore_at`. Requires the restore timestamp to be set.
pub fn sql_database_restore_point_in_time(
    params: &FixtureParams,
) -> Result<ConfigDocument, FixtureError> {
    let restore_at = params
        .restore_at
        .ok_or_else(|| FixtureError::MissingRestorePoint("restore_point_in_time".to_string()))?;

    Ok(ConfigDocument::new(vec![
        group_block(params)?,
        server_block(params)?,
        standard_database(params).build()?,
        resource(sql::SQL_DATABASE, "test_restore")
            .attr_str("name", params.name("acctestdb_restore"))
            .reference("resource_group_name", group_addr(), "name")
            .reference("server_name", server_addr(), "name")
            .reference("location", group_addr(), "location")
            .attr_str("create_mode", "PointInTimeRestore")
            .reference("source_database_id", database_addr(), "id")
            .attr_str("restore_point_in_time", restore_at.to_rfc3339())
            .build()?,
    ]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashSet;

    #[test]
    fn basic_names_are_unique_within_a_run() {
        let params = FixtureParams::new(123, "West US");
        let doc = sql_database_basic(&params).unwrap();

        let names: HashSet<&str> = doc
            .resources
            .iter()
            .filter_map(|b| b.str_attr("name"))
            .collect();
        assert_eq!(names.len(), doc.len());
    }

    #[test]
    fn distinct_runs_never_share_names() {
        let a = sql_database_basic(&FixtureParams::new(1, "West US")).unwrap();
        let b = sql_database_basic(&FixtureParams::new(2, "West US")).unwrap();

        let names_a: HashSet<String> = a
            .resources
            .iter()
            .filter_map(|r| r.str_attr("name").map(String::from))
            .collect();
        for block in &b.resources {
            let name = block.str_attr("name").unwrap();
            assert!(!names_a.contains(name), "name collision: {}", name);
        }
    }

    #[test]
    fn cross_resource_fields_stay_symbolic() {
        let doc = sql_database_basic(&FixtureParams::new(7, "West US")).unwrap();
        let db = doc
            .get(&Address::new(sql::SQL_DATABASE, "test"))
            .unwrap();

        assert!(db.attr("server_name").unwrap().as_ref_expr().is_some());
        assert!(db.attr("resource_group_name").unwrap().as_ref_expr().is_some());
        assert_eq!(db.str_attr("edition"), Some("Standard"));
        assert_eq!(db.str_attr("max_size_bytes"), Some("1073741824"));
    }

    #[test]
    fn tag_fixtures_carry_expected_counts() {
        let params = FixtureParams::new(9, "West US");
        let two = sql_database_with_tags(&params).unwrap();
        let one = sql_database_tags_update(&params).unwrap();

        let db_addr = Address::new(sql::SQL_DATABASE, "test");
        assert_eq!(two.get(&db_addr).unwrap().map_attr("tags").unwrap().len(), 2);
        assert_eq!(one.get(&db_addr).unwrap().map_attr("tags").unwrap().len(), 1);
    }

    #[test]
    fn elastic_pool_database_derives_edition() {
        let doc = sql_database_elastic_pool(&FixtureParams::new(11, "West US")).unwrap();
        let db = doc.get(&Address::new(sql::SQL_DATABASE, "test")).unwrap();

        let edition_ref = db.attr("edition").unwrap().as_ref_expr().unwrap();
        assert_eq!(edition_ref.target, Address::new(sql::SQL_ELASTICPOOL, "test"));
        assert_eq!(edition_ref.attribute, "edition");
    }

    #[test]
    fn restore_fixture_requires_timestamp() {
        let params = FixtureParams::new(13, "West US");
        assert!(matches!(
            sql_database_restore_point_in_time(&params),
            Err(FixtureError::MissingRestorePoint(_))
        ));

        let params = params.with_restore_at(Utc::now());
        let doc = sql_database_restore_point_in_time(&params).unwrap();
        let restore = doc
            .get(&Address::new(sql::SQL_DATABASE, "test_restore"))
            .unwrap();
        assert_eq!(restore.str_attr("create_mode"), Some("PointInTimeRestore"));
        assert!(restore
            .attr("source_database_id")
            .unwrap()
            .as_ref_expr()
            .is_some());
    }

    #[test]
    fn documents_serialize_to_yaml() {
        let doc = sql_database_basic(&FixtureParams::new(5, "West US")).unwrap();
        let yaml = serde_yaml::to_string(&doc).unwrap();
        let back: lifecheck_domain::ConfigDocument = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, doc);
    }
}
