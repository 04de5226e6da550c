// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The node store contract the view services consult. The store itself is an
//! external collaborator (see the crate's top-level docs): this module only
//! defines the narrow `get`/`release` contract the traversal engine needs,
//! plus a small in-memory implementation used by the test suite.

use std::collections::HashMap;
use std::sync::Arc;

use opcua_types::{NodeClass, NodeId, ReferenceTypeId};
use parking_lot::RwLock;

use crate::node::{Node, NodeHandle};

/// A scoped, read-only view of the address space.
///
/// `get` hands out a borrowed (reference-counted) handle; `release` gives the
/// store a chance to reclaim bookkeeping. Because handles here are `Arc`s,
/// the default `release` is a no-op and dropping the handle is sufficient --
/// correctness only depends on every `get` being matched by a `release` or a
/// drop on every exit path, not on `release` doing anything in particular.
pub trait NodeStore: Send + Sync {
    /// Look up a node by its id. Returns `None` if the node does not exist.
    fn get(&self, node_id: &NodeId) -> Option<NodeHandle>;

    /// Release a previously acquired handle. The default implementation
    /// simply drops it.
    fn release(&self, _handle: NodeHandle) {}
}

/// Resolve the `HasTypeDefinition` target of an `Object` or `Variable` node.
///
/// Mirrors the `getTypeOf` collaborator contract: returns `None` for any
/// other node class, for nodes with no type definition reference, and for
/// type definitions that live on another server (the core does not dereference
/// across server boundaries).
pub fn get_type_of(store: &dyn NodeStore, node: &Node) -> Option<NodeHandle> {
    if !matches!(node.node_class, NodeClass::Object | NodeClass::Variable) {
        return None;
    }
    let has_type_definition: NodeId = ReferenceTypeId::HasTypeDefinition.into();
    let target = node
        .references
        .iter()
        .find(|rk| !rk.is_inverse && rk.reference_type_id == has_type_definition)
        .and_then(|rk| rk.targets.first())?;
    if target.server_index != 0 {
        return None;
    }
    let handle = store.get(&target.node_id);
    if let Some(h) = &handle {
        store.release(h.clone());
    }
    handle
}

/// A simple, fully in-memory node store backed by a `HashMap` guarded by a
/// `RwLock`. Good enough for tests and for small embedded servers; a real
/// deployment is expected to bring its own store implementation.
#[derive(Default)]
pub struct InMemoryNodeStore {
    nodes: RwLock<HashMap<NodeId, NodeHandle>>,
}

impl InMemoryNodeStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            nodes: RwLock::new(HashMap::new()),
        }
    }

    /// Insert or replace a node.
    pub fn insert(&self, node: Node) {
        self.nodes
            .write()
            .insert(node.node_id.clone(), Arc::new(node));
    }

    /// Mutate a node in place, if it exists.
    pub fn with_mut<R>(&self, node_id: &NodeId, f: impl FnOnce(&mut Node) -> R) -> Option<R> {
        let mut guard = self.nodes.write();
        let entry = guard.get_mut(node_id)?;
        let mut node = (**entry).clone();
        let result = f(&mut node);
        *entry = Arc::new(node);
        Some(result)
    }

    /// Remove a node, invalidating any continuation points that depended on it.
    pub fn remove(&self, node_id: &NodeId) -> Option<NodeHandle> {
        self.nodes.write().remove(node_id)
    }
}

impl NodeStore for InMemoryNodeStore {
    fn get(&self, node_id: &NodeId) -> Option<NodeHandle> {
        self.nodes.read().get(node_id).cloned()
    }
}
