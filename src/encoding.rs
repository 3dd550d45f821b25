// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! base64url without padding, the only encoding ACME accepts.

use crate::error::{Error, Result};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

pub fn base64url_encode(data: impl AsRef<[u8]>) -> String {
    URL_SAFE_NO_PAD.encode(data)
}

pub fn base64url_decode(text: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(text)
        .map_err(|e| Error::InvalidFormat(format!("Invalid base64url: {}", e)))
}

/// Big-endian unsigned integer bytes with leading zeros dropped, as JWK wants.
pub(crate) fn uint_base64url(be_bytes: &[u8]) -> String {
    let start = be_bytes
        .iter()
        .position(|&b| b != 0)
        .unwrap_or(be_bytes.len());
    base64url_encode(&be_bytes[start..])
}
