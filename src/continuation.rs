// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Per-session continuation-point registry: bounded storage for paginated
//! browse cursors, keyed by an opaque, randomly generated identifier.

use hashbrown::HashMap;
use opcua_types::{BrowseDescription, ByteString, StatusCode};

use crate::random;

/// A paused browse cursor, owned by exactly one session.
#[derive(Debug, Clone)]
pub struct ContinuationPoint {
    /// Opaque identifier handed to the client.
    pub identifier: ByteString,
    /// Deep copy of the `BrowseDescription` the browse was started with.
    pub description: BrowseDescription,
    /// The effective per-node reference cap in force when this cursor was created.
    pub max_references: u32,
    /// Index of the next unexamined reference kind.
    pub reference_kind_index: usize,
    /// Index of the next unexamined target within that reference kind.
    pub target_index: usize,
}

/// Bounded, per-session collection of live continuation points.
///
/// `available` mirrors the specification's signed
/// `availableContinuationPoints` counter: it equals the configured cap minus
/// the number of live entries, and is maintained as an invariant by every
/// operation below.
pub struct ContinuationPointRegistry {
    cap: usize,
    available: i64,
    entries: HashMap<ByteString, ContinuationPoint>,
}

impl ContinuationPointRegistry {
    /// Create a new, empty registry with room for `cap` simultaneous cursors.
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            available: cap as i64,
            entries: HashMap::new(),
        }
    }

    /// Number of free continuation-point slots.
    pub fn available(&self) -> i64 {
        self.available
    }

    /// Number of live continuation points.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if there are no live continuation points.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Create a new continuation point for a truncated browse.
    ///
    /// Fails with `BadNoContinuationPoints` if the session has no free slots.
    /// On success, the counter is decremented and the freshly generated
    /// identifier is returned.
    pub fn create(
        &mut self,
        description: BrowseDescription,
        max_references: u32,
        reference_kind_index: usize,
        target_index: usize,
    ) -> Result<ByteString, StatusCode> {
        if self.available <= 0 {
            return Err(StatusCode::BadNoContinuationPoints);
        }
        let identifier = random::continuation_point_id();
        self.entries.insert(
            identifier.clone(),
            ContinuationPoint {
                identifier: identifier.clone(),
                description,
                max_references,
                reference_kind_index,
                target_index,
            },
        );
        self.available -= 1;
        Ok(identifier)
    }

    /// Remove and return the entry for `identifier`, for use by `BrowseNext`.
    /// The caller is responsible for re-inserting it via [`Self::restore`] if
    /// the resumed browse is truncated again.
    pub fn take(&mut self, identifier: &ByteString) -> Result<ContinuationPoint, StatusCode> {
        self.entries
            .remove(identifier)
            .ok_or(StatusCode::BadContinuationPointInvalid)
    }

    /// Re-insert a continuation point that was taken but not completed.
    pub fn restore(&mut self, point: ContinuationPoint) {
        self.entries.insert(point.identifier.clone(), point);
    }

    /// Mark a continuation point completed (its browse finished): the slot
    /// is freed and the counter incremented. The caller is expected to have
    /// already removed the entry via [`Self::take`]; this only restores the
    /// availability counter.
    pub fn complete(&mut self) {
        self.available += 1;
    }

    /// Release a continuation point on explicit client request.
    ///
    /// Returns `BadContinuationPointInvalid` if the identifier is unknown;
    /// this makes a second release of the same id fail, matching the
    /// specification's idempotent-release testable property.
    pub fn release(&mut self, identifier: &ByteString) -> Result<(), StatusCode> {
        if self.entries.remove(identifier).is_some() {
            self.available += 1;
            Ok(())
        } else {
            Err(StatusCode::BadContinuationPointInvalid)
        }
    }

    /// Release every continuation point, as on session destruction.
    pub fn release_all(&mut self) {
        self.available = self.cap as i64;
        self.entries.clear();
    }
}
