// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Fallible, amortized-doubling array growth.
//!
//! The browse iterator and browse-path resolver are specified in terms of C
//! arrays that double their capacity and can fail to grow. `Vec::push` already
//! grows this way, but never reports the failure; `try_reserve` gives us the
//! same growth curve with an observable error, which is what lets
//! `BadOutOfMemory` be a real, reachable status code rather than a process
//! abort.

/// Internal error marking a failed doubling-growth attempt, before it
/// collapses to `StatusCode::BadOutOfMemory` at the caller.
#[derive(Debug, thiserror::Error)]
#[error("failed to grow scratch buffer to satisfy amortized-doubling capacity")]
pub(crate) struct GrowError;

/// Push `item` onto `v`, growing its capacity by doubling (starting from 2)
/// when full. Returns `Err(GrowError)` if the allocator could not satisfy the
/// doubled capacity.
pub(crate) fn push_checked<T>(v: &mut Vec<T>, item: T) -> Result<(), GrowError> {
    if v.len() == v.capacity() {
        let target = (v.capacity() * 2).max(2);
        v.try_reserve(target - v.len()).map_err(|_| GrowError)?;
    }
    v.push(item);
    Ok(())
}
