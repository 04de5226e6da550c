// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Browse-path resolver: breadth-first expansion of a relative-path
//! expression from a starting node, using a pair of alternating scratch
//! buffers as the BFS frontier.

use log::warn;
use opcua_types::{BrowsePath, BrowsePathTarget, ExpandedNodeId, NodeClass, NodeId, StatusCode};

use crate::alloc::push_checked;
use crate::store::NodeStore;
use crate::subtype_oracle::is_relevant;

/// A fully resolved path position: a sentinel `remainingPathIndex` meaning
/// "this target was resolved entirely on the local server".
pub const FULLY_RESOLVED: u32 = u32::MAX;

/// Outcome of resolving a `BrowsePath`.
pub struct BrowsePathOutcome {
    /// Result status.
    pub status: StatusCode,
    /// Resolved targets, local and forwarded.
    pub targets: Vec<BrowsePathTarget>,
}

fn out_of_memory() -> BrowsePathOutcome {
    BrowsePathOutcome {
        status: StatusCode::BadOutOfMemory,
        targets: Vec::new(),
    }
}

/// Resolve `path` against `store`, breadth-first, one relative-path element
/// at a time.
pub fn resolve_browse_path(store: &dyn NodeStore, path: &BrowsePath) -> BrowsePathOutcome {
    let elements = path.relative_path.elements.as_deref().unwrap_or(&[]);

    if elements.is_empty() {
        return BrowsePathOutcome {
            status: StatusCode::BadNothingToDo,
            targets: Vec::new(),
        };
    }
    if elements.iter().any(|e| e.target_name.is_null()) {
        return BrowsePathOutcome {
            status: StatusCode::BadBrowseNameInvalid,
            targets: Vec::new(),
        };
    }

    let mut current: Vec<NodeId> = Vec::with_capacity(10);
    current.push(path.starting_node.clone());
    let mut next: Vec<NodeId> = Vec::with_capacity(10);
    let mut targets: Vec<BrowsePathTarget> = Vec::with_capacity(10);
    let mut status = StatusCode::Good;
    let mut depth = 0usize;

    while depth < elements.len() {
        let elem = &elements[depth];
        next.clear();

        let reference_type_ok = elem.reference_type_id.is_null()
            || matches!(
                store.get(&elem.reference_type_id).map(|n| n.node_class),
                Some(NodeClass::ReferenceType)
            );

        if reference_type_ok {
            for node_id in current.iter() {
                let Some(node) = store.get(node_id) else {
                    if depth == 0 {
                        status = StatusCode::BadNodeIdUnknown;
                    }
                    continue;
                };

                if depth >= 1 && node.browse_name != elements[depth - 1].target_name {
                    continue;
                }

                for rk in &node.references {
                    if rk.is_inverse != elem.is_inverse {
                        continue;
                    }
                    if !elem.reference_type_id.is_null()
                        && !is_relevant(
                            store,
                            &elem.reference_type_id,
                            &rk.reference_type_id,
                            elem.include_subtypes,
                        )
                    {
                        continue;
                    }
                    for target in &rk.targets {
                        if target.server_index != 0 {
                            if push_checked(
                                &mut targets,
                                BrowsePathTarget {
                                    target_id: target.clone(),
                                    remaining_path_index: depth as u32,
                                },
                            )
                            .is_err()
                            {
                                warn!("allocation failure recording external browse-path target");
                                return out_of_memory();
                            }
                        } else if push_checked(&mut next, target.node_id.clone()).is_err() {
                            warn!("allocation failure growing browse-path frontier");
                            return out_of_memory();
                        }
                    }
                }
            }
        }

        if status != StatusCode::Good {
            current.clear();
            break;
        }
        std::mem::swap(&mut current, &mut next);
        if current.is_empty() {
            break;
        }
        depth += 1;
    }

    if status == StatusCode::Good {
        let last = elements.last().expect("checked non-empty above");
        for node_id in current {
            let Some(node) = store.get(&node_id) else {
                continue;
            };
            if node.browse_name == last.target_name {
                if push_checked(
                    &mut targets,
                    BrowsePathTarget {
                        target_id: ExpandedNodeId::from(node_id),
                        remaining_path_index: FULLY_RESOLVED,
                    },
                )
                .is_err()
                {
                    warn!("allocation failure committing final browse-path targets");
                    return out_of_memory();
                }
            }
        }
    }

    if status == StatusCode::Good && targets.is_empty() {
        status = StatusCode::BadNoMatch;
    }

    BrowsePathOutcome { status, targets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::store::InMemoryNodeStore;
    use opcua_types::{QualifiedName, ReferenceTypeId, RelativePath, RelativePathElement};

    fn element(reference_type_id: NodeId, is_inverse: bool, target_name: QualifiedName) -> RelativePathElement {
        RelativePathElement {
            reference_type_id,
            is_inverse,
            include_subtypes: true,
            target_name,
        }
    }

    fn path(starting_node: NodeId, elements: Vec<RelativePathElement>) -> BrowsePath {
        BrowsePath {
            starting_node,
            relative_path: RelativePath {
                elements: Some(elements),
            },
        }
    }

    #[test]
    fn single_hop_matches_browse_by_name() {
        let store = InMemoryNodeStore::new();
        let mut root = Node::new(NodeId::new(1, "root"), NodeClass::Object, QualifiedName::new(1, "root"), "root");
        let target_name = QualifiedName::new(1, "X");
        let child = Node::new(NodeId::new(1, "X"), NodeClass::Object, target_name.clone(), "X");
        root.add_reference(ReferenceTypeId::HasChild, false, child.node_id.clone());
        let root_id = root.node_id.clone();
        let child_id = child.node_id.clone();
        store.insert(child);
        store.insert(root);

        let p = path(
            root_id,
            vec![element(ReferenceTypeId::HasChild.into(), false, target_name)],
        );
        let outcome = resolve_browse_path(&store, &p);
        assert_eq!(outcome.status, StatusCode::Good);
        assert_eq!(outcome.targets.len(), 1);
        assert_eq!(outcome.targets[0].remaining_path_index, FULLY_RESOLVED);
        assert_eq!(outcome.targets[0].target_id.node_id, child_id);
    }

    #[test]
    fn empty_path_is_nothing_to_do() {
        let store = InMemoryNodeStore::new();
        let p = path(NodeId::new(1, "root"), Vec::new());
        let outcome = resolve_browse_path(&store, &p);
        assert_eq!(outcome.status, StatusCode::BadNothingToDo);
    }

    #[test]
    fn null_target_name_is_rejected_before_traversal() {
        let store = InMemoryNodeStore::new();
        let p = path(
            NodeId::new(1, "root"),
            vec![element(ReferenceTypeId::HasChild.into(), false, QualifiedName::null())],
        );
        let outcome = resolve_browse_path(&store, &p);
        assert_eq!(outcome.status, StatusCode::BadBrowseNameInvalid);
        assert!(outcome.targets.is_empty());
    }

    #[test]
    fn no_match_yields_bad_no_match() {
        let store = InMemoryNodeStore::new();
        let root = Node::new(NodeId::new(1, "root"), NodeClass::Object, QualifiedName::new(1, "root"), "root");
        let root_id = root.node_id.clone();
        store.insert(root);

        let p = path(
            root_id,
            vec![element(
                ReferenceTypeId::HasChild.into(),
                false,
                QualifiedName::new(1, "Nonexistent"),
            )],
        );
        let outcome = resolve_browse_path(&store, &p);
        assert_eq!(outcome.status, StatusCode::BadNoMatch);
        assert!(outcome.targets.is_empty());
    }

    #[test]
    fn cross_server_hop_is_forwarded_with_remaining_path_index() {
        let store = InMemoryNodeStore::new();
        let mut root = Node::new(NodeId::new(1, "root"), NodeClass::Object, QualifiedName::new(1, "root"), "root");
        let remote = ExpandedNodeId {
            node_id: NodeId::new(1, "Remote"),
            namespace_uri: Default::default(),
            server_index: 7,
        };
        root.add_reference(ReferenceTypeId::HasChild, false, remote.clone());
        let root_id = root.node_id.clone();
        store.insert(root);

        let p = path(
            root_id,
            vec![element(
                ReferenceTypeId::HasChild.into(),
                false,
                QualifiedName::new(1, "Remote"),
            )],
        );
        let outcome = resolve_browse_path(&store, &p);
        assert_eq!(outcome.targets.len(), 1);
        assert_eq!(outcome.targets[0].remaining_path_index, 0);
        assert_eq!(outcome.targets[0].target_id, remote);
    }
}
