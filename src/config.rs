// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Server-tunable limits for the view services.
//!
//! Modeled on the server's `Limits`/`OperationalLimits` configuration
//! structs: a `serde`-deserializable, OPC-UA-sane-default set of per-request
//! and per-session caps. Only the limits the view services actually consult
//! are kept here.

use serde::{Deserialize, Serialize};

mod defaults {
    pub fn max_nodes_per_browse() -> usize {
        0
    }
    pub fn max_nodes_per_translate_browse_paths_to_node_ids() -> usize {
        0
    }
    pub fn max_nodes_per_register_nodes() -> usize {
        0
    }
    pub fn max_references_per_browse_node() -> u32 {
        0
    }
    pub fn max_browse_continuation_points() -> usize {
        5
    }
}

/// Per-request operation caps that apply to the view services.
///
/// A value of `0` means "no limit", matching the OPC UA convention used
/// throughout the address-space and session configuration layers: absence of
/// a configured cap is not the same as a cap of zero items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationalLimits {
    /// Maximum number of `BrowseDescription`s accepted in a single `Browse` request.
    #[serde(default = "defaults::max_nodes_per_browse")]
    pub max_nodes_per_browse: usize,
    /// Maximum number of `BrowsePath`s accepted in a single
    /// `TranslateBrowsePathsToNodeIds` request.
    #[serde(default = "defaults::max_nodes_per_translate_browse_paths_to_node_ids")]
    pub max_nodes_per_translate_browse_paths_to_node_ids: usize,
    /// Maximum number of node ids accepted in a single `RegisterNodes` or
    /// `UnregisterNodes` request.
    #[serde(default = "defaults::max_nodes_per_register_nodes")]
    pub max_nodes_per_register_nodes: usize,
    /// Server-side cap on references returned per browsed node, independent
    /// of any client-requested `requestedMaxReferencesPerNode`.
    #[serde(default = "defaults::max_references_per_browse_node")]
    pub max_references_per_browse_node: u32,
}

impl Default for OperationalLimits {
    fn default() -> Self {
        Self {
            max_nodes_per_browse: defaults::max_nodes_per_browse(),
            max_nodes_per_translate_browse_paths_to_node_ids:
                defaults::max_nodes_per_translate_browse_paths_to_node_ids(),
            max_nodes_per_register_nodes: defaults::max_nodes_per_register_nodes(),
            max_references_per_browse_node: defaults::max_references_per_browse_node(),
        }
    }
}

/// Top-level limits consulted by the view services.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    /// Per-request operation caps.
    #[serde(default)]
    pub operational: OperationalLimits,
    /// Maximum number of simultaneously live browse continuation points per session.
    #[serde(default = "defaults::max_browse_continuation_points")]
    pub max_browse_continuation_points: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            operational: OperationalLimits::default(),
            max_browse_continuation_points: defaults::max_browse_continuation_points(),
        }
    }
}
