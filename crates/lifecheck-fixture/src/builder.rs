use std::collections::BTreeMap;

use lifecheck_domain::{Address, AttrValue, RefExpr, ResourceBlock};

use crate::error::FixtureError;

/// Start a typed builder for one resource block.
pub fn resource(rtype: impl Into<String>, name: impl Into<String>) -> ResourceBlockBuilder {
    ResourceBlockBuilder {
        address: Address::new(rtype, name),
        attrs: BTreeMap::new(),
        duplicate: None,
    }
}

/// Typed construction of a [`ResourceBlock`]. Cross-resource fields are
/// declared with [`reference`](ResourceBlockBuilder::reference) and stay
/// symbolic; nothing is interpolated into strings.
#[derive(Debug)]
pub struct ResourceBlockBuilder {
    address: Address,
    attrs: BTreeMap<String, AttrValue>,
    duplicate: Option<String>,
}

impl ResourceBlockBuilder {
    fn insert(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        let key = key.into();
        if self.attrs.insert(key.clone(), value).is_some() && self.duplicate.is_none() {
            self.duplicate = Some(key);
        }
        self
    }

    pub fn attr_str(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, AttrValue::Str(value.into()))
    }

    pub fn attr_int(self, key: impl Into<String>, value: i64) -> Self {
        self.insert(key, AttrValue::Int(value))
    }

    pub fn attr_map<'a>(
        self,
        key: impl Into<String>,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let map: BTreeMap<String, String> = entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.insert(key, AttrValue::Map(map))
    }

    pub fn reference(
        self,
        key: impl Into<String>,
        target: Address,
        attribute: impl Into<String>,
    ) -> Self {
        self.insert(key, AttrValue::Ref(RefExpr::new(target, attribute)))
    }

    pub fn build(self) -> Result<ResourceBlock, FixtureError> {
        if let Some(attribute) = self.duplicate {
            return Err(FixtureError::DuplicateAttribute {
                address: self.address.to_string(),
                attribute,
            });
        }
        Ok(ResourceBlock {
            address: self.address,
            attrs: self.attrs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_typed_block() {
        let block = resource("sql_database", "test")
            .attr_str("name", "acctestdb1")
            .attr_int("max_size_gb", 1)
            .attr_map("tags", [("environment", "staging")])
            .reference("server_name", Address::new("sql_server", "test"), "name")
            .build()
            .unwrap();

        assert_eq!(block.str_attr("name"), Some("acctestdb1"));
        assert_eq!(block.int_attr("max_size_gb"), Some(1));
        assert_eq!(block.map_attr("tags").unwrap().len(), 1);
        assert_eq!(block.references().count(), 1);
    }

    #[test]
    fn duplicate_attribute_rejected() {
        let result = resource("sql_database", "test")
            .attr_str("edition", "Standard")
            .attr_str("edition", "Premium")
            .build();
        assert!(matches!(
            result,
            Err(FixtureError::DuplicateAttribute { .. })
        ));
    }
}
