// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Key, X.509 and JWS primitives for an ACME client.
//!
//! ```rust,no_run
//! use acme_crypt::{build_csr, jws, Config, PrivateKey};
//! use std::path::Path;
//!
//! let config = Config::load(Path::new("acme.toml"))?;
//! let key = PrivateKey::generate(&config.private_keys)?;
//! key.save(Path::new("domain.key"), None, config.files.key_mode)?;
//!
//! let csr = build_csr(&["example.org", "www.example.org"], config.must_staple, &key)?;
//! let payload = serde_json::json!({ "csr": csr }).to_string();
//! let envelope = jws::sign(payload.as_bytes(), &Default::default(), &key, Some("acct-1"))?;
//! println!("{}", envelope.to_json()?);
//! # Ok::<(), acme_crypt::Error>(())
//! ```

/// ASN.1 time decoding and calendar arithmetic.
pub mod asn1_time;
/// Self-signed fallback certificates.
pub mod cert;
/// Certificate chains.
pub mod chain;
/// Configuration handling.
pub mod config;
/// Certificate signing requests.
pub mod csr;
/// SHA-256 and RS256 primitives.
pub mod digest;
/// base64url helpers.
pub mod encoding;
/// Error types.
pub mod error;
/// Filesystem utilities.
pub mod fs;
/// JSON Web Signature envelopes.
pub mod jws;
/// Private keys and key specs.
pub mod key;
/// Process-wide random number generation.
pub mod random;
/// X.509 certificate parsing.
pub mod x509;

#[cfg(test)]
mod test_support;

pub use asn1_time::{asn1_time_to_tm, time_diff, Asn1Time, Asn1TimeKind, CalendarTime};
pub use cert::self_sign;
pub use chain::CertificateChain;
pub use config::{Config, FileModes};
pub use csr::{build_csr, build_csr_der};
pub use digest::{
    rsa_sha256_sign_base64url, sha256, sha256_base64url, sha256_hex, verify_rsa_sha256_base64url,
    Digest,
};
pub use encoding::{base64url_decode, base64url_encode};
pub use error::{Error, Result};
pub use fs::replace_file;
pub use jws::SignedEnvelope;
pub use key::{KeySpec, PrivateKey};
pub use random::fill_random;
pub use x509::{CertState, Certificate};
