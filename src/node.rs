// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! In-memory representation of a single address-space node, as seen by the
//! view services. This is deliberately narrower than a full node: it carries
//! only the attributes Browse, BrowseNext and TranslateBrowsePathsToNodeIds
//! ever read.

use std::sync::Arc;

use opcua_types::{ExpandedNodeId, LocalizedText, NodeClass, NodeId, QualifiedName};

/// A node handle as borrowed from the node store. Reference-counted so that
/// a `get` can hand out a cheap clone and `release` can simply be a drop.
pub type NodeHandle = Arc<Node>;

/// All outgoing references from a node sharing the same `(referenceTypeId, isInverse)` key.
#[derive(Debug, Clone)]
pub struct ReferenceKind {
    /// The reference type all targets in this group share.
    pub reference_type_id: NodeId,
    /// `true` if these are inverse references (the node is the target, not the source).
    pub is_inverse: bool,
    /// Targets, in stored order. Local targets carry `server_index == 0`.
    pub targets: Vec<ExpandedNodeId>,
}

impl ReferenceKind {
    /// Create a new, empty reference kind.
    pub fn new(reference_type_id: impl Into<NodeId>, is_inverse: bool) -> Self {
        Self {
            reference_type_id: reference_type_id.into(),
            is_inverse,
            targets: Vec::new(),
        }
    }
}

/// A single node in the address space, as consulted by the view services.
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique identifier of this node.
    pub node_id: NodeId,
    /// The node's class.
    pub node_class: NodeClass,
    /// Browse name (namespace + string).
    pub browse_name: QualifiedName,
    /// Localized display name.
    pub display_name: LocalizedText,
    /// Outgoing reference groups, keyed by `(referenceTypeId, isInverse)`.
    pub references: Vec<ReferenceKind>,
}

impl Node {
    /// Create a new node with no references.
    pub fn new(
        node_id: impl Into<NodeId>,
        node_class: NodeClass,
        browse_name: impl Into<QualifiedName>,
        display_name: impl Into<LocalizedText>,
    ) -> Self {
        Self {
            node_id: node_id.into(),
            node_class,
            browse_name: browse_name.into(),
            display_name: display_name.into(),
            references: Vec::new(),
        }
    }

    /// Find the reference kind matching `(reference_type_id, is_inverse)`, if present.
    pub fn find_kind(&self, reference_type_id: &NodeId, is_inverse: bool) -> Option<&ReferenceKind> {
        self.references
            .iter()
            .find(|rk| rk.is_inverse == is_inverse && &rk.reference_type_id == reference_type_id)
    }

    /// Add a local, forward or inverse, reference to `target`, creating the reference kind
    /// group if it does not already exist. Intended for building test fixtures and small
    /// in-memory stores, not for a production address space.
    pub fn add_reference(
        &mut self,
        reference_type_id: impl Into<NodeId>,
        is_inverse: bool,
        target: impl Into<ExpandedNodeId>,
    ) {
        let reference_type_id = reference_type_id.into();
        if let Some(rk) = self
            .references
            .iter_mut()
            .find(|rk| rk.is_inverse == is_inverse && rk.reference_type_id == reference_type_id)
        {
            rk.targets.push(target.into());
        } else {
            let mut rk = ReferenceKind::new(reference_type_id, is_inverse);
            rk.targets.push(target.into());
            self.references.push(rk);
        }
    }
}
