// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Reference descriptor builder: turns a resolved target node plus the
//! reference that reached it into a client-facing `ReferenceDescription`,
//! populating only the fields requested by a `resultMask` bitfield.

use opcua_types::{
    BrowseDescriptionResultMask, ExpandedNodeId, LocalizedText, NodeClass, NodeId, QualifiedName,
    ReferenceDescription,
};

use crate::node::Node;
use crate::store::{get_type_of, NodeStore};

/// Populate a `ReferenceDescription` for `target`, reached via a reference of
/// kind `(reference_type_id, is_inverse)`, honoring `result_mask`.
///
/// `nodeId` is always populated, with `serverIndex == 0`: this builder only
/// ever runs against nodes the local store resolved, so the distinction the
/// specification draws between surfacing external targets "by reference-list
/// position" rather than by inflating a description is automatically
/// satisfied -- a target this function never sees because the store could
/// not resolve it is simply not described at all.
pub fn fill_description(
    store: &dyn NodeStore,
    target: &Node,
    reference_type_id: &NodeId,
    is_inverse: bool,
    result_mask: BrowseDescriptionResultMask,
) -> ReferenceDescription {
    let mut descr = ReferenceDescription {
        reference_type_id: NodeId::null(),
        is_forward: false,
        node_id: ExpandedNodeId::from(target.node_id.clone()),
        browse_name: QualifiedName::null(),
        display_name: LocalizedText::null(),
        node_class: NodeClass::Unspecified,
        type_definition: ExpandedNodeId::null(),
    };

    if result_mask.contains(BrowseDescriptionResultMask::RESULT_MASK_REFERENCE_TYPE) {
        descr.reference_type_id = reference_type_id.clone();
    }
    if result_mask.contains(BrowseDescriptionResultMask::RESULT_MASK_IS_FORWARD) {
        descr.is_forward = !is_inverse;
    }
    if result_mask.contains(BrowseDescriptionResultMask::RESULT_MASK_NODE_CLASS) {
        descr.node_class = target.node_class;
    }
    if result_mask.contains(BrowseDescriptionResultMask::RESULT_MASK_BROWSE_NAME) {
        descr.browse_name = target.browse_name.clone();
    }
    if result_mask.contains(BrowseDescriptionResultMask::RESULT_MASK_DISPLAY_NAME) {
        descr.display_name = target.display_name.clone();
    }
    if result_mask.contains(BrowseDescriptionResultMask::RESULT_MASK_TYPE_DEFINITION) {
        if let Some(type_node) = get_type_of(store, target) {
            descr.type_definition = ExpandedNodeId::from(type_node.node_id.clone());
        }
    }

    descr
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryNodeStore;
    use opcua_types::ReferenceTypeId;

    fn sample_node() -> Node {
        Node::new(
            NodeId::new(1, "child"),
            NodeClass::Object,
            QualifiedName::new(1, "Child"),
            "Child",
        )
    }

    #[test]
    fn empty_mask_populates_only_node_id() {
        let store = InMemoryNodeStore::new();
        let target = sample_node();
        let descr = fill_description(
            &store,
            &target,
            &ReferenceTypeId::Organizes.into(),
            false,
            BrowseDescriptionResultMask::empty(),
        );
        assert_eq!(descr.node_id, ExpandedNodeId::from(target.node_id.clone()));
        assert!(descr.reference_type_id.is_null());
        assert!(!descr.is_forward);
        assert_eq!(descr.node_class, NodeClass::Unspecified);
        assert!(descr.browse_name.is_null());
        assert!(descr.type_definition.is_null());
    }

    #[test]
    fn full_mask_populates_requested_fields() {
        let store = InMemoryNodeStore::new();
        let target = sample_node();
        let descr = fill_description(
            &store,
            &target,
            &ReferenceTypeId::Organizes.into(),
            false,
            BrowseDescriptionResultMask::all(),
        );
        assert_eq!(descr.node_class, NodeClass::Object);
        assert_eq!(descr.browse_name, target.browse_name);
        assert_eq!(descr.display_name, target.display_name);
        assert!(descr.is_forward);
    }

    #[test]
    fn type_definition_resolved_for_objects_and_variables() {
        let store = InMemoryNodeStore::new();
        let type_def = Node::new(
            NodeId::new(1, "type"),
            NodeClass::ObjectType,
            QualifiedName::new(1, "Type"),
            "Type",
        );
        let mut target = sample_node();
        target.add_reference(
            ReferenceTypeId::HasTypeDefinition,
            false,
            type_def.node_id.clone(),
        );
        store.insert(type_def.clone());

        let descr = fill_description(
            &store,
            &target,
            &ReferenceTypeId::Organizes.into(),
            false,
            BrowseDescriptionResultMask::RESULT_MASK_TYPE_DEFINITION,
        );
        assert_eq!(descr.type_definition, ExpandedNodeId::from(type_def.node_id));
    }
}
