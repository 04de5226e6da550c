// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Browse iterator: walks the outgoing reference kinds of a single node,
//! applying direction/type/class filters, and emits a resumable cursor when
//! a per-node reference cap is hit.

use log::warn;
use opcua_types::{
    BrowseDescription, BrowseDescriptionResultMask, BrowseDirection, NodeClass, NodeClassMask,
    ReferenceDescription, StatusCode,
};

use crate::alloc::push_checked;
use crate::descriptor::fill_description;
use crate::store::NodeStore;
use crate::subtype_oracle::is_relevant;

/// Cursor coordinates naming the next unexamined `(referenceKind, target)` pair.
pub type Cursor = (usize, usize);

/// Outcome of walking a single node's references, whether from a fresh
/// `Browse` call or a resumed `BrowseNext`.
pub struct BrowseOutcome {
    /// Result status. `Good` covers both a completed walk and one truncated
    /// by the reference cap -- truncation is not an error.
    pub status: StatusCode,
    /// References collected during this call. Present (possibly empty) unless
    /// `status` is a request-level failure.
    pub references: Vec<ReferenceDescription>,
    /// `true` if the walk reached the end of the node's reference list.
    pub done: bool,
    /// Cursor to resume at, valid only when `done` is `false`.
    pub cursor: Cursor,
}

impl BrowseOutcome {
    fn failure(status: StatusCode) -> Self {
        Self {
            status,
            references: Vec::new(),
            done: true,
            cursor: (0, 0),
        }
    }
}

fn direction_matches(requested: BrowseDirection, is_inverse: bool) -> bool {
    match requested {
        BrowseDirection::Forward => !is_inverse,
        BrowseDirection::Inverse => is_inverse,
        BrowseDirection::Both => true,
        _ => false,
    }
}

/// Effective per-node reference cap: the minimum of the caller-supplied
/// `max_refs` (`0` meaning "server decides") and the server-configured
/// `server_cap` (`0` meaning "no server cap"). `(0, 0)` means unbounded.
pub fn resolve_cap(max_refs: u32, server_cap: u32) -> u32 {
    match (max_refs, server_cap) {
        (0, 0) => u32::MAX,
        (0, s) => s,
        (m, 0) => m,
        (m, s) => m.min(s),
    }
}

/// Walk `node`'s references starting at `cursor`, applying the filters in
/// `description`, and stopping once `effective_cap` references have been
/// collected or the reference list is exhausted.
pub fn browse(
    store: &dyn NodeStore,
    description: &BrowseDescription,
    cursor: Cursor,
    effective_cap: u32,
) -> BrowseOutcome {
    if !matches!(
        description.browse_direction,
        BrowseDirection::Forward | BrowseDirection::Inverse | BrowseDirection::Both
    ) {
        return BrowseOutcome::failure(StatusCode::BadBrowseDirectionInvalid);
    }

    if !description.reference_type_id.is_null() {
        match store.get(&description.reference_type_id) {
            None => return BrowseOutcome::failure(StatusCode::BadReferenceTypeIdInvalid),
            Some(n) if n.node_class != NodeClass::ReferenceType => {
                return BrowseOutcome::failure(StatusCode::BadReferenceTypeIdInvalid)
            }
            _ => {}
        }
    }

    let Some(node) = store.get(&description.node_id) else {
        return BrowseOutcome::failure(StatusCode::BadNodeIdUnknown);
    };

    let node_class_mask = NodeClassMask::from_bits_truncate(description.node_class_mask);
    let result_mask = BrowseDescriptionResultMask::from_bits_truncate(description.result_mask);

    let mut references = Vec::new();
    let (mut rk_index, mut t_index) = cursor;

    while rk_index < node.references.len() {
        let rk = &node.references[rk_index];

        let kind_allowed = direction_matches(description.browse_direction, rk.is_inverse)
            && (description.reference_type_id.is_null()
                || is_relevant(
                    store,
                    &description.reference_type_id,
                    &rk.reference_type_id,
                    description.include_subtypes,
                ));

        if !kind_allowed {
            rk_index += 1;
            t_index = 0;
            continue;
        }

        while t_index < rk.targets.len() {
            let target_expanded = &rk.targets[t_index];
            let Some(target_node) = store.get(&target_expanded.node_id) else {
                t_index += 1;
                continue;
            };

            if !node_class_mask.is_empty()
                && !node_class_mask
                    .contains(NodeClassMask::from_bits_truncate(target_node.node_class as u32))
            {
                t_index += 1;
                continue;
            }

            if references.len() >= effective_cap as usize {
                return BrowseOutcome {
                    status: StatusCode::Good,
                    references,
                    done: false,
                    cursor: (rk_index, t_index),
                };
            }

            let descr = fill_description(
                store,
                &target_node,
                &rk.reference_type_id,
                rk.is_inverse,
                result_mask,
            );
            if push_checked(&mut references, descr).is_err() {
                warn!("allocation failure while growing browse result, aborting");
                return BrowseOutcome::failure(StatusCode::BadOutOfMemory);
            }
            t_index += 1;
        }

        rk_index += 1;
        t_index = 0;
    }

    BrowseOutcome {
        status: StatusCode::Good,
        references,
        done: true,
        cursor: (rk_index, 0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::store::InMemoryNodeStore;
    use opcua_types::{NodeId, QualifiedName, ReferenceTypeId};

    fn child(ns: u16, id: &str) -> Node {
        Node::new(NodeId::new(ns, id), NodeClass::Object, QualifiedName::new(ns, id), id)
    }

    fn populated_store() -> (InMemoryNodeStore, NodeId) {
        let store = InMemoryNodeStore::new();
        let mut root = child(1, "root");
        for name in ["c1", "c2", "c3", "c4", "c5"] {
            let c = child(1, name);
            root.add_reference(ReferenceTypeId::Organizes, false, c.node_id.clone());
            store.insert(c);
        }
        let root_id = root.node_id.clone();
        store.insert(root);
        (store, root_id)
    }

    fn browse_description(node_id: NodeId) -> BrowseDescription {
        BrowseDescription {
            node_id,
            browse_direction: BrowseDirection::Forward,
            reference_type_id: ReferenceTypeId::Organizes.into(),
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: (BrowseDescriptionResultMask::RESULT_MASK_NODE_CLASS
                | BrowseDescriptionResultMask::RESULT_MASK_BROWSE_NAME)
                .bits(),
        }
    }

    #[test]
    fn pagination_sum_matches_single_shot_order() {
        let (store, root_id) = populated_store();
        let description = browse_description(root_id.clone());

        let first = browse(&store, &description, (0, 0), 2);
        assert!(!first.done);
        assert_eq!(first.references.len(), 2);

        let second = browse(&store, &description, first.cursor, 2);
        assert!(!second.done);
        assert_eq!(second.references.len(), 2);

        let third = browse(&store, &description, second.cursor, 2);
        assert!(third.done);
        assert_eq!(third.references.len(), 1);

        let whole = browse(&store, &description, (0, 0), u32::MAX);
        let mut paginated: Vec<_> = first
            .references
            .into_iter()
            .chain(second.references)
            .chain(third.references)
            .collect();
        let mut single_shot = whole.references;
        assert_eq!(paginated.len(), single_shot.len());
        let key = |r: &ReferenceDescription| r.browse_name.name.as_ref().to_string();
        paginated.sort_by_key(key);
        single_shot.sort_by_key(key);
        assert_eq!(paginated, single_shot);
    }

    #[test]
    fn invalid_reference_type_is_rejected() {
        let (store, root_id) = populated_store();
        let mut description = browse_description(root_id);
        description.reference_type_id = NodeId::new(1, "not-a-ref-type");
        let outcome = browse(&store, &description, (0, 0), 0);
        assert_eq!(outcome.status, StatusCode::BadReferenceTypeIdInvalid);
    }

    #[test]
    fn unknown_start_node_is_bad_node_id_unknown() {
        let store = InMemoryNodeStore::new();
        let description = browse_description(NodeId::new(1, "missing"));
        let outcome = browse(&store, &description, (0, 0), 0);
        assert_eq!(outcome.status, StatusCode::BadNodeIdUnknown);
    }

    #[test]
    fn zero_references_returns_empty_not_error() {
        let store = InMemoryNodeStore::new();
        let leaf = child(1, "leaf");
        let leaf_id = leaf.node_id.clone();
        store.insert(leaf);
        let description = browse_description(leaf_id);
        let outcome = browse(&store, &description, (0, 0), 0);
        assert_eq!(outcome.status, StatusCode::Good);
        assert!(outcome.done);
        assert!(outcome.references.is_empty());
    }

    #[test]
    fn subtype_inclusion_controls_whether_child_is_returned() {
        let store = InMemoryNodeStore::new();

        // Organizes is a (registered) subtype of HasChild.
        let has_child_id: NodeId = ReferenceTypeId::HasChild.into();
        let organizes_id: NodeId = ReferenceTypeId::Organizes.into();
        let mut has_child = Node::new(
            has_child_id.clone(),
            NodeClass::ReferenceType,
            QualifiedName::new(0, "HasChild"),
            "HasChild",
        );
        has_child.add_reference(ReferenceTypeId::HasSubtype, false, organizes_id.clone());
        let organizes = Node::new(
            organizes_id,
            NodeClass::ReferenceType,
            QualifiedName::new(0, "Organizes"),
            "Organizes",
        );
        store.insert(has_child);
        store.insert(organizes);

        let mut root = child(1, "root");
        let c = child(1, "c");
        root.add_reference(ReferenceTypeId::Organizes, false, c.node_id.clone());
        let root_id = root.node_id.clone();
        store.insert(c);
        store.insert(root);

        let mut description = browse_description(root_id.clone());
        description.reference_type_id = has_child_id;
        description.include_subtypes = true;
        let with_subtypes = browse(&store, &description, (0, 0), u32::MAX);
        assert_eq!(with_subtypes.references.len(), 1);

        description.include_subtypes = false;
        let without_subtypes = browse(&store, &description, (0, 0), u32::MAX);
        assert!(without_subtypes.references.is_empty());
    }
}
