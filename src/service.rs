// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Service entry points: `Browse`, `BrowseNext`, `TranslateBrowsePathsToNodeIds`,
//! and the `RegisterNodes`/`UnregisterNodes` stubs.
//!
//! Each batched entry point validates request-wide limits, then applies the
//! same per-item function the single-shot `*_one` variants use -- mirroring
//! how `UA_Server_browse` and friends share code with the request dispatcher
//! in the source this crate is modeled on.

use std::sync::Arc;

use opcua_types::{
    BrowseDescription, BrowsePath, BrowsePathResult, BrowseRequest, BrowseResponse, BrowseResult,
    ByteString, NodeId, RegisterNodesRequest, RegisterNodesResponse, ResponseHeader, StatusCode,
    TranslateBrowsePathsToNodeIdsRequest, TranslateBrowsePathsToNodeIdsResponse,
    UnregisterNodesRequest, UnregisterNodesResponse,
};
use opcua_types::{BrowseNextRequest, BrowseNextResponse};

use crate::browse::{self, resolve_cap};
use crate::browse_path::resolve_browse_path;
use crate::config::Limits;
use crate::continuation::ContinuationPoint;
use crate::session::Session;
use crate::store::NodeStore;

/// Resolve a single `BrowseDescription` against `store`, storing a
/// continuation point on `session` if the walk was truncated.
pub fn browse_one(
    store: &dyn NodeStore,
    session: &mut Session,
    limits: &Limits,
    description: &BrowseDescription,
    requested_max_references_per_node: u32,
) -> BrowseResult {
    let effective_cap = resolve_cap(
        requested_max_references_per_node,
        limits.operational.max_references_per_browse_node,
    );
    let outcome = browse::browse(store, description, (0, 0), effective_cap);

    if outcome.done {
        return BrowseResult {
            status_code: outcome.status,
            references: Some(outcome.references),
            continuation_point: ByteString::null(),
        };
    }

    match session.continuation_points_mut().create(
        description.clone(),
        effective_cap,
        outcome.cursor.0,
        outcome.cursor.1,
    ) {
        Ok(id) => BrowseResult {
            status_code: outcome.status,
            references: Some(outcome.references),
            continuation_point: id,
        },
        Err(status) => BrowseResult {
            status_code: status,
            references: Some(outcome.references),
            continuation_point: ByteString::null(),
        },
    }
}

/// Resume (or release) a single continuation point.
pub fn browse_next_one(
    store: &dyn NodeStore,
    session: &mut Session,
    continuation_point: &ByteString,
    release: bool,
) -> BrowseResult {
    if release {
        return match session.continuation_points_mut().release(continuation_point) {
            Ok(()) => BrowseResult {
                status_code: StatusCode::Good,
                references: Some(Vec::new()),
                continuation_point: ByteString::null(),
            },
            Err(status) => BrowseResult {
                status_code: status,
                references: None,
                continuation_point: ByteString::null(),
            },
        };
    }

    let point = match session.continuation_points_mut().take(continuation_point) {
        Ok(point) => point,
        Err(status) => {
            return BrowseResult {
                status_code: status,
                references: None,
                continuation_point: ByteString::null(),
            }
        }
    };

    let outcome = browse::browse(
        store,
        &point.description,
        (point.reference_kind_index, point.target_index),
        point.max_references,
    );

    if outcome.done {
        session.continuation_points_mut().complete();
        BrowseResult {
            status_code: outcome.status,
            references: Some(outcome.references),
            continuation_point: ByteString::null(),
        }
    } else {
        let id = point.identifier.clone();
        session.continuation_points_mut().restore(ContinuationPoint {
            reference_kind_index: outcome.cursor.0,
            target_index: outcome.cursor.1,
            ..point
        });
        BrowseResult {
            status_code: outcome.status,
            references: Some(outcome.references),
            continuation_point: id,
        }
    }
}

/// Resolve a single `BrowsePath` against `store`.
pub fn translate_browse_path_to_node_ids(store: &dyn NodeStore, path: &BrowsePath) -> BrowsePathResult {
    let outcome = resolve_browse_path(store, path);
    BrowsePathResult {
        status_code: outcome.status,
        targets: Some(outcome.targets),
    }
}

fn header_error(request_header: &opcua_types::RequestHeader, status: StatusCode) -> ResponseHeader {
    ResponseHeader::new_service_result(request_header, status)
}

/// The batched view-service entry points, holding the shared node store and
/// the operational limits that bound each request.
pub struct ViewService {
    store: Arc<dyn NodeStore>,
    limits: Limits,
}

impl ViewService {
    /// Create a new view service over `store`, enforcing `limits`.
    pub fn new(store: Arc<dyn NodeStore>, limits: Limits) -> Self {
        Self { store, limits }
    }

    /// `Browse` — enumerate references of a batch of starting nodes.
    pub fn browse(&self, session: &mut Session, request: &BrowseRequest) -> BrowseResponse {
        if !request.view.view_id.is_null() {
            return BrowseResponse {
                response_header: header_error(&request.request_header, StatusCode::BadViewIdUnknown),
                results: None,
                diagnostic_infos: None,
            };
        }

        let items = match request.nodes_to_browse.as_ref() {
            Some(items) if !items.is_empty() => items,
            _ => {
                return BrowseResponse {
                    response_header: header_error(&request.request_header, StatusCode::BadNothingToDo),
                    results: None,
                    diagnostic_infos: None,
                }
            }
        };

        let cap = self.limits.operational.max_nodes_per_browse;
        if cap > 0 && items.len() > cap {
            return BrowseResponse {
                response_header: header_error(&request.request_header, StatusCode::BadTooManyOperations),
                results: None,
                diagnostic_infos: None,
            };
        }

        let results = items
            .iter()
            .map(|description| {
                browse_one(
                    self.store.as_ref(),
                    session,
                    &self.limits,
                    description,
                    request.requested_max_references_per_node,
                )
            })
            .collect();

        BrowseResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            results: Some(results),
            diagnostic_infos: None,
        }
    }

    /// `BrowseNext` — resume or release a batch of paginated browses.
    pub fn browse_next(&self, session: &mut Session, request: &BrowseNextRequest) -> BrowseNextResponse {
        let items = match request.continuation_points.as_ref() {
            Some(items) if !items.is_empty() => items,
            _ => {
                return BrowseNextResponse {
                    response_header: header_error(&request.request_header, StatusCode::BadNothingToDo),
                    results: None,
                    diagnostic_infos: None,
                }
            }
        };

        let results = items
            .iter()
            .map(|id| {
                browse_next_one(
                    self.store.as_ref(),
                    session,
                    id,
                    request.release_continuation_points,
                )
            })
            .collect();

        BrowseNextResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            results: Some(results),
            diagnostic_infos: None,
        }
    }

    /// `TranslateBrowsePathsToNodeIds` — resolve a batch of relative paths.
    pub fn translate_browse_paths_to_node_ids(
        &self,
        request: &TranslateBrowsePathsToNodeIdsRequest,
    ) -> TranslateBrowsePathsToNodeIdsResponse {
        let paths = match request.browse_paths.as_ref() {
            Some(paths) if !paths.is_empty() => paths,
            _ => {
                return TranslateBrowsePathsToNodeIdsResponse {
                    response_header: header_error(&request.request_header, StatusCode::BadNothingToDo),
                    results: None,
                    diagnostic_infos: None,
                }
            }
        };

        let cap = self.limits.operational.max_nodes_per_translate_browse_paths_to_node_ids;
        if cap > 0 && paths.len() > cap {
            return TranslateBrowsePathsToNodeIdsResponse {
                response_header: header_error(&request.request_header, StatusCode::BadTooManyOperations),
                results: None,
                diagnostic_infos: None,
            };
        }

        let results = paths
            .iter()
            .map(|path| translate_browse_path_to_node_ids(self.store.as_ref(), path))
            .collect();

        TranslateBrowsePathsToNodeIdsResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            results: Some(results),
            diagnostic_infos: None,
        }
    }

    /// `RegisterNodes` — echoes back every requested node id unchanged.
    ///
    /// Per the protocol, an empty request is `BadNothingToDo` even though it
    /// could equally be read as "nothing to register, trivially succeeded";
    /// this crate picks the stricter, more informative reading and checks
    /// emptiness before any cap, matching every other entry point above.
    pub fn register_nodes(&self, request: &RegisterNodesRequest) -> RegisterNodesResponse {
        let nodes = match request.nodes_to_register.as_ref() {
            Some(nodes) if !nodes.is_empty() => nodes,
            _ => {
                return RegisterNodesResponse {
                    response_header: header_error(&request.request_header, StatusCode::BadNothingToDo),
                    registered_node_ids: None,
                }
            }
        };

        let cap = self.limits.operational.max_nodes_per_register_nodes;
        if cap > 0 && nodes.len() > cap {
            return RegisterNodesResponse {
                response_header: header_error(&request.request_header, StatusCode::BadTooManyOperations),
                registered_node_ids: None,
            };
        }

        RegisterNodesResponse {
            response_header: ResponseHeader::new_good(&request.request_header),
            registered_node_ids: Some(nodes.clone()),
        }
    }

    /// `UnregisterNodes` — validates the request envelope and performs no
    /// state change, since this crate does not track registered-node
    /// bookkeeping (see the crate-level open questions in `DESIGN.md`).
    pub fn unregister_nodes(&self, request: &UnregisterNodesRequest) -> UnregisterNodesResponse {
        let nodes: Option<&Vec<NodeId>> = request.nodes_to_unregister.as_ref();
        let status = match nodes {
            Some(nodes) if !nodes.is_empty() => {
                let cap = self.limits.operational.max_nodes_per_register_nodes;
                if cap > 0 && nodes.len() > cap {
                    StatusCode::BadTooManyOperations
                } else {
                    StatusCode::Good
                }
            }
            _ => StatusCode::BadNothingToDo,
        };

        UnregisterNodesResponse {
            response_header: ResponseHeader::new_timestamped_service_result(
                opcua_types::DateTime::now(),
                &request.request_header,
                status,
            ),
        }
    }
}
