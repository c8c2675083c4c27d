use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::DomainError;

// ── Identifiers ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceType(pub String);

impl ResourceType {
    pub fn new(s: impl Into<String>) -> Self {
        ResourceType(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResourceName(pub String);

impl ResourceName {
    pub fn new(s: impl Into<String>) -> Self {
        ResourceName(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ResourceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical address of a resource block: `<type>.<name>`.
///
/// The name is the document-local label (e.g. `test`), not the remote
/// resource name generated by a fixture.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    pub rtype: ResourceType,
    pub name: ResourceName,
}

impl Address {
    pub fn new(rtype: impl Into<String>, name: impl Into<String>) -> Self {
        Address {
            rtype: ResourceType::new(rtype),
            name: ResourceName::new(name),
        }
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.rtype, self.name)
    }
}

impl std::str::FromStr for Address {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('.') {
            Some((rtype, name)) if !rtype.is_empty() && !name.is_empty() => {
                Ok(Address::new(rtype, name))
            }
            _ => Err(DomainError::InvalidAddress(s.to_string())),
        }
    }
}

impl TryFrom<String> for Address {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Address> for String {
    fn from(a: Address) -> String {
        a.to_string()
    }
}

// ── Attribute values ─────────────────────────────────────────────────────────

/// Symbolic reference to an attribute of another block in the same document.
///
/// References are resolved by the engine after the target has converged;
/// fixture generators only ever emit the symbolic form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefExpr {
    #[serde(rename = "ref")]
    pub target: Address,
    pub attribute: String,
}

impl RefExpr {
    pub fn new(target: Address, attribute: impl Into<String>) -> Self {
        RefExpr {
            target,
            attribute: attribute.into(),
        }
    }
}

impl std::fmt::Display for RefExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "${{{}.{}}}", self.target, self.attribute)
    }
}

/// A typed attribute value inside a resource block.
///
/// Untagged variant order matters: `Ref` must be tried before `Map` so a
/// `{ref, attribute}` object is never swallowed as a string map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Ref(RefExpr),
    Int(i64),
    Bool(bool),
    Str(String),
    Map(BTreeMap<String, String>),
}

impl AttrValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<String, String>> {
        match self {
            AttrValue::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_ref_expr(&self) -> Option<&RefExpr> {
        match self {
            AttrValue::Ref(r) => Some(r),
            _ => None,
        }
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Str(s.to_string())
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

// ── Core structs ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBlock {
    pub address: Address,
    pub attrs: BTreeMap<String, AttrValue>,
}

impl ResourceBlock {
    pub fn attr(&self, key: &str) -> Option<&AttrValue> {
        self.attrs.get(key)
    }

    pub fn str_attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).and_then(|v| v.as_str())
    }

    pub fn int_attr(&self, key: &str) -> Option<i64> {
        self.attrs.get(key).and_then(|v| v.as_int())
    }

    pub fn map_attr(&self, key: &str) -> Option<&BTreeMap<String, String>> {
        self.attrs.get(key).and_then(|v| v.as_map())
    }

    /// All symbolic references held by this block, with the attribute key
    /// each one occupies.
    pub fn references(&self) -> impl Iterator<Item = (&str, &RefExpr)> {
        self.attrs
            .iter()
            .filter_map(|(k, v)| v.as_ref_expr().map(|r| (k.as_str(), r)))
    }
}

/// A declarative configuration document: an unordered set of resource
/// blocks. Ordering for apply/destroy is derived from references, never
/// from document position.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    pub resources: Vec<ResourceBlock>,
}

impl ConfigDocument {
    pub fn new(resources: Vec<ResourceBlock>) -> Self {
        ConfigDocument { resources }
    }

    pub fn get(&self, address: &Address) -> Option<&ResourceBlock> {
        self.resources.iter().find(|r| &r.address == address)
    }

    pub fn addresses(&self) -> impl Iterator<Item = &Address> {
        self.resources.iter().map(|r| &r.address)
    }

    pub fn of_type<'a>(
        &'a self,
        rtype: &'a ResourceType,
    ) -> impl Iterator<Item = &'a ResourceBlock> + 'a {
        self.resources.iter().filter(move |r| &r.address.rtype == rtype)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }
}
