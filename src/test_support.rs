// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Shared fixtures for unit tests. RSA generation is slow, so one key is
//! generated per test binary and handed out by reference.

use crate::key::{KeySpec, PrivateKey};
use once_cell::sync::Lazy;

static RSA_KEY: Lazy<PrivateKey> =
    Lazy::new(|| PrivateKey::generate(&KeySpec::Default).expect("RSA key generation should work"));

pub(crate) fn rsa_key() -> &'static PrivateKey {
    &RSA_KEY
}

/// A P-256 key, which loads as a non-RSA key.
pub(crate) fn ec_key() -> PrivateKey {
    let pair = rcgen::KeyPair::generate().expect("EC key generation should work");
    PrivateKey::from_pem(pair.serialize_pem().as_bytes(), None).expect("EC key should load")
}
