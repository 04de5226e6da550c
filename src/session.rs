// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Minimal session-scoped state. Full session lifecycle (authentication,
//! secure channel association, timeouts) lives outside this crate; all the
//! view services need from a session is its continuation-point registry.

use crate::config::Limits;
use crate::continuation::ContinuationPointRegistry;

/// The session-scoped state the view services read and mutate.
pub struct Session {
    continuation_points: ContinuationPointRegistry,
}

impl Session {
    /// Create a new session with continuation-point capacity taken from `limits`.
    pub fn new(limits: &Limits) -> Self {
        Self {
            continuation_points: ContinuationPointRegistry::new(limits.max_browse_continuation_points),
        }
    }

    /// A privileged, synthetic session used by the single-shot direct-call
    /// API variants (`browse_one`, `browse_next_one`,
    /// `translate_browse_path_to_node_ids`), matching the `adminSession`
    /// collaborator named in the view-service contracts.
    pub fn admin() -> Self {
        Self::new(&Limits::default())
    }

    /// This session's continuation-point registry.
    pub fn continuation_points(&self) -> &ContinuationPointRegistry {
        &self.continuation_points
    }

    /// Mutable access to this session's continuation-point registry.
    pub fn continuation_points_mut(&mut self) -> &mut ContinuationPointRegistry {
        &mut self.continuation_points
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.continuation_points.release_all();
    }
}
