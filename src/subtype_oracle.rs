// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Reference-type subtype oracle.
//!
//! Decides whether a reference type is the root of a requested filter, or one
//! of its subtypes, by walking the `HasSubtype` hierarchy in the node store.

use std::collections::HashSet;

use opcua_types::{NodeClass, NodeId, ReferenceTypeId};

use crate::store::NodeStore;

/// Returns `true` if `candidate` should be treated as matching a filter rooted
/// at `root`.
///
/// If `include_subtypes` is `false` this is exact identity. Otherwise,
/// `candidate` matches iff it is reachable from `root` by zero or more forward
/// `HasSubtype` hops.
pub fn is_relevant(
    store: &dyn NodeStore,
    root: &NodeId,
    candidate: &NodeId,
    include_subtypes: bool,
) -> bool {
    if !include_subtypes {
        return root == candidate;
    }
    is_node_in_tree(store, candidate, root)
}

/// Returns `true` if `candidate` is reachable from `root` via zero or more
/// forward `HasSubtype` references, stored in the node store.
///
/// Cycle-safe: the reference-type hierarchy is a DAG by contract, but a
/// corrupt or adversarial store must not cause an infinite walk.
pub fn is_node_in_tree(store: &dyn NodeStore, candidate: &NodeId, root: &NodeId) -> bool {
    if candidate == root {
        return true;
    }

    let has_subtype: NodeId = ReferenceTypeId::HasSubtype.into();
    let mut visited = HashSet::new();
    let mut frontier = vec![root.clone()];

    while let Some(current) = frontier.pop() {
        if !visited.insert(current.clone()) {
            continue;
        }
        let Some(node) = store.get(&current) else {
            continue;
        };
        for rk in &node.references {
            if rk.is_inverse || rk.reference_type_id != has_subtype {
                continue;
            }
            for target in &rk.targets {
                if target.server_index != 0 {
                    continue;
                }
                if &target.node_id == candidate {
                    return true;
                }
                if !visited.contains(&target.node_id) {
                    frontier.push(target.node_id.clone());
                }
            }
        }
    }
    false
}
