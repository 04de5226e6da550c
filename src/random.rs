// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Random identifier generation for continuation points.

use opcua_types::ByteString;

/// Fill `bytes` with cryptographically strong pseudo-random bytes.
pub fn bytes(bytes: &mut [u8]) {
    use rand::RngCore;
    let mut rng = rand::thread_rng();
    rng.fill_bytes(bytes);
}

/// Generate a fresh 16-byte continuation-point identifier. Collision
/// probability within a session is assumed negligible, as for any GUID-sized
/// random source.
pub fn continuation_point_id() -> ByteString {
    let mut data = vec![0u8; 16];
    bytes(&mut data);
    ByteString::from(data)
}
