use std::collections::{HashMap, HashSet};

use lifecheck_domain::{Address, ConfigDocument};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};

use crate::error::GraphError;

/// One attribute-level reference between two blocks in a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub from: Address,
    pub attribute: String,
    pub to: Address,
    pub target_attribute: String,
}

/// Result returned by [`validate`] on success.
#[derive(Debug)]
pub struct ResolvedPlan {
    /// Addresses in apply order (referenced blocks first). Destroy walks
    /// this in reverse.
    pub apply_order: Vec<Address>,
    /// All validated references.
    pub references: Vec<ReferenceEdge>,
}

/// Validate a configuration document.
///
/// Checks:
/// 1. Duplicate addresses
/// 2. Dangling references (target block exists)
/// 3. Self references
/// 4. Cycle detection
pub fn validate(doc: &ConfigDocument) -> Result<ResolvedPlan, GraphError> {
    let mut errors: Vec<GraphError> = Vec::new();
    let mut references: Vec<ReferenceEdge> = Vec::new();

    // --- Duplicate addresses ---
    let mut seen: HashSet<&Address> = HashSet::new();
    for block in &doc.resources {
        if !seen.insert(&block.address) {
            errors.push(GraphError::DuplicateAddress(block.address.clone()));
        }
    }

    // --- Per-block reference checks ---
    for block in &doc.resources {
        for (attribute, r) in block.references() {
            if r.target == block.address {
                errors.push(GraphError::SelfReference {
                    address: block.address.clone(),
                    attribute: attribute.to_string(),
                });
                continue;
            }
            if doc.get(&r.target).is_none() {
                errors.push(GraphError::DanglingReference {
                    from: block.address.clone(),
                    attribute: attribute.to_string(),
                    to: r.target.clone(),
                });
                continue;
            }
            references.push(ReferenceEdge {
                from: block.address.clone(),
                attribute: attribute.to_string(),
                to: r.target.clone(),
                target_attribute: r.attribute.clone(),
            });
        }
    }

    if !errors.is_empty() {
        if errors.len() == 1 {
            return Err(errors.remove(0));
        }
        return Err(GraphError::Multiple(errors));
    }

    // --- Cycle detection and apply order ---
    let mut graph: DiGraph<&Address, ()> = DiGraph::new();
    let node_map: HashMap<&Address, NodeIndex> = doc
        .resources
        .iter()
        .map(|b| (&b.address, graph.add_node(&b.address)))
        .collect();

    // Edge direction: target → referrer ("target must converge before the
    // block that reads from it").
    for edge in &references {
        let from = node_map[&edge.to];
        let to = node_map[&edge.from];
        graph.add_edge(from, to, ());
    }

    if is_cyclic_directed(&graph) {
        return Err(GraphError::CycleDetected);
    }

    let topo = petgraph::algo::toposort(&graph, None).map_err(|_| GraphError::CycleDetected)?;
    let apply_order = topo.iter().map(|idx| graph[*idx].clone()).collect();

    Ok(ResolvedPlan {
        apply_order,
        references,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use lifecheck_domain::{AttrValue, RefExpr, ResourceBlock};
    use std::collections::BTreeMap;

    fn block(rtype: &str, name: &str, refs: Vec<(&str, &str, &str, &str)>) -> ResourceBlock {
        let mut attrs = BTreeMap::new();
        attrs.insert("name".to_string(), AttrValue::from(name));
        for (key, target_type, target_name, target_attr) in refs {
            attrs.insert(
                key.to_string(),
                AttrValue::Ref(RefExpr::new(
                    Address::new(target_type, target_name),
                    target_attr,
                )),
            );
        }
        ResourceBlock {
            address: Address::new(rtype, name),
            attrs,
        }
    }

    #[test]
    fn valid_document_passes() {
        let doc = ConfigDocument::new(vec![
            block("resource_group", "test", vec![]),
            block(
                "sql_server",
                "test",
                vec![("resource_group_name", "resource_group", "test", "name")],
            ),
            block(
                "sql_database",
                "test",
                vec![("server_name", "sql_server", "test", "name")],
            ),
        ]);
        let plan = validate(&doc).unwrap();
        assert_eq!(plan.apply_order.len(), 3);
        assert_eq!(plan.references.len(), 2);
    }

    #[test]
    fn apply_order_puts_targets_first() {
        let doc = ConfigDocument::new(vec![
            block(
                "sql_database",
                "test",
                vec![("server_name", "sql_server", "test", "name")],
            ),
            block("sql_server", "test", vec![]),
        ]);
        let plan = validate(&doc).unwrap();
        let pos_server = plan
            .apply_order
            .iter()
            .position(|a| a.rtype.as_str() == "sql_server")
            .unwrap();
        let pos_db = plan
            .apply_order
            .iter()
            .position(|a| a.rtype.as_str() == "sql_database")
            .unwrap();
        assert!(pos_server < pos_db, "server must converge before database");
    }

    #[test]
    fn duplicate_address_detected() {
        let doc = ConfigDocument::new(vec![
            block("sql_database", "test", vec![]),
            block("sql_database", "test", vec![]),
        ]);
        let result = validate(&doc);
        assert!(
            matches!(result, Err(GraphError::DuplicateAddress(_))),
            "expected DuplicateAddress, got {:?}",
            result.err()
        );
    }

    #[test]
    fn dangling_reference_detected() {
        let doc = ConfigDocument::new(vec![block(
            "sql_database",
            "test",
            vec![("server_name", "sql_server", "nonexistent", "name")],
        )]);
        let result = validate(&doc);
        assert!(
            matches!(result, Err(GraphError::DanglingReference { .. })),
            "expected DanglingReference, got {:?}",
            result.err()
        );
    }

    #[test]
    fn self_reference_detected() {
        let doc = ConfigDocument::new(vec![block(
            "sql_database",
            "test",
            vec![("source_database_id", "sql_database", "test", "id")],
        )]);
        let result = validate(&doc);
        assert!(matches!(result, Err(GraphError::SelfReference { .. })));
    }

    #[test]
    fn cycle_detected() {
        let doc = ConfigDocument::new(vec![
            block("sql_server", "a", vec![("peer", "sql_server", "b", "name")]),
            block("sql_server", "b", vec![("peer", "sql_server", "a", "name")]),
        ]);
        let result = validate(&doc);
        assert!(matches!(result, Err(GraphError::CycleDetected)));
    }

    #[test]
    fn multiple_errors_collected() {
        let doc = ConfigDocument::new(vec![
            block("sql_database", "test", vec![("a", "sql_server", "x", "name")]),
            block("sql_database", "test2", vec![("b", "sql_server", "y", "name")]),
        ]);
        let result = validate(&doc);
        assert!(matches!(result, Err(GraphError::Multiple(_))));
    }
}
