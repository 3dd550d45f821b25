// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Flattened JWS envelopes for authenticating ACME requests.

use crate::digest::rsa_sha256_sign_base64url;
use crate::encoding::base64url_encode;
use crate::error::{Error, Result};
use crate::key::PrivateKey;
use serde::Serialize;
use serde_json::{Map, Value};

/// The only signature algorithm produced here.
pub const ALG_RS256: &str = "RS256";

/// A signed `{protected, payload, signature}` triple, each base64url.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedEnvelope {
    pub protected: String,
    pub payload: String,
    pub signature: String,
}

impl SignedEnvelope {
    /// The flattened JSON serialization sent as an ACME request body.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::EncodeFailed(e.to_string()))
    }

    /// The bytes the signature covers.
    pub fn signing_input(&self) -> String {
        format!("{}.{}", self.protected, self.payload)
    }
}

/// The public JWK of an RSA key: `{"kty":"RSA","e":..,"n":..}`.
///
/// # Errors
/// [`Error::NotImplemented`] for non-RSA keys.
pub fn jwk(key: &PrivateKey) -> Result<Value> {
    let (e, n) = key
        .public_exponent_b64()
        .zip(key.public_modulus_b64())
        .ok_or_else(|| Error::NotImplemented("JWK for a non-RSA key".into()))?;
    let mut jwk = Map::new();
    jwk.insert("kty".into(), Value::from("RSA"));
    jwk.insert("e".into(), Value::from(e));
    jwk.insert("n".into(), Value::from(n));
    Ok(Value::Object(jwk))
}

/// Sign `payload` with `key` into a JWS envelope.
///
/// The protected header carries `alg`, then `kid` when `key_id` is given or
/// the key's `jwk` otherwise, then every entry of `header_fields`. Caller
/// fields take precedence on key collision.
///
/// # Errors
/// [`Error::SignFailed`] or [`Error::NotImplemented`] from the signature,
/// [`Error::EncodeFailed`] if the header cannot be serialized.
pub fn sign(
    payload: &[u8],
    header_fields: &Map<String, Value>,
    key: &PrivateKey,
    key_id: Option<&str>,
) -> Result<SignedEnvelope> {
    let mut header = Map::new();
    header.insert("alg".into(), Value::from(ALG_RS256));
    match key_id {
        Some(kid) => {
            header.insert("kid".into(), Value::from(kid));
        }
        None => {
            header.insert("jwk".into(), jwk(key)?);
        }
    }
    for (name, value) in header_fields {
        header.insert(name.clone(), value.clone());
    }

    let header = serde_json::to_vec(&header).map_err(|e| {
        tracing::warn!("encoding protected header: {}", e);
        Error::EncodeFailed(e.to_string())
    })?;
    let protected = base64url_encode(header);
    let payload = base64url_encode(payload);
    let signature = rsa_sha256_sign_base64url(key, format!("{}.{}", protected, payload).as_bytes())
        .map_err(|e| {
            tracing::warn!("signing JWS: {}", e);
            e
        })?;

    Ok(SignedEnvelope {
        protected,
        payload,
        signature,
    })
}
