// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! SHA-256 digests and RS256 signatures over raw bytes.

use crate::encoding::{base64url_decode, base64url_encode};
use crate::error::{Error, Result};
use crate::key::PrivateKey;
use crate::random::{self, SystemRandom};
use rsa::{Pkcs1v15Sign, RsaPublicKey};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// A SHA-256 output.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Digest([u8; 32]);

impl Digest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_base64url(&self) -> String {
        base64url_encode(self.0)
    }

    /// Lowercase hex, 64 characters.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Digest({})", self.to_hex())
    }
}

pub fn sha256(data: &[u8]) -> Digest {
    Digest(Sha256::digest(data).into())
}

pub fn sha256_base64url(data: &[u8]) -> String {
    sha256(data).to_base64url()
}

pub fn sha256_hex(data: &[u8]) -> String {
    sha256(data).to_hex()
}

/// RSASSA-PKCS1-v1_5 with SHA-256 over `data`, base64url encoded.
///
/// # Errors
/// [`Error::NotImplemented`] if `key` is not an RSA key, [`Error::SignFailed`]
/// if the signature operation fails.
pub fn rsa_sha256_sign_base64url(key: &PrivateKey, data: &[u8]) -> Result<String> {
    rsa_sha256_sign(key, data).map(base64url_encode)
}

pub fn rsa_sha256_sign(key: &PrivateKey, data: &[u8]) -> Result<Vec<u8>> {
    let rsa = key.rsa().ok_or_else(|| {
        tracing::warn!("signing: RS256 needs an RSA key");
        Error::NotImplemented("RS256 signing with a non-RSA key".into())
    })?;

    random::init();
    let digest = sha256(data);
    rsa.sign_with_rng(
        &mut SystemRandom,
        Pkcs1v15Sign::new::<Sha256>(),
        digest.as_bytes(),
    )
    .map_err(|e| {
        tracing::warn!("signing: {}", e);
        Error::SignFailed(e.to_string())
    })
}

/// Check a base64url RS256 signature against the public half of `key`.
pub fn verify_rsa_sha256_base64url(
    key: &PrivateKey,
    data: &[u8],
    signature: &str,
) -> Result<bool> {
    let rsa = key
        .rsa()
        .ok_or_else(|| Error::NotImplemented("RS256 verification with a non-RSA key".into()))?;
    let signature = base64url_decode(signature)?;
    let public = RsaPublicKey::from(rsa);
    Ok(public
        .verify(
            Pkcs1v15Sign::new::<Sha256>(),
            sha256(data).as_bytes(),
            &signature,
        )
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ec_key, rsa_key};
    use proptest::prelude::*;

    #[test]
    fn test_sha256_known_vectors() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
        assert_eq!(
            sha256_base64url(b"abc"),
            "ungWv48Bz-pBQUDeXa4iI7ADYaOWF3qctBD_YfIAFa0"
        );
    }

    #[test]
    fn test_sign_and_verify() {
        let key = rsa_key();
        let sig = rsa_sha256_sign_base64url(key, b"payload").unwrap();
        assert!(!sig.contains('='));
        assert!(verify_rsa_sha256_base64url(key, b"payload", &sig).unwrap());
        assert!(!verify_rsa_sha256_base64url(key, b"tampered", &sig).unwrap());
    }

    #[test]
    fn test_signature_length_matches_modulus() {
        let sig = rsa_sha256_sign(rsa_key(), b"x").unwrap();
        assert_eq!(sig.len(), 256);
    }

    #[test]
    fn test_sign_with_non_rsa_key_is_not_implemented() {
        let result = rsa_sha256_sign_base64url(&ec_key(), b"payload");
        assert!(matches!(result, Err(Error::NotImplemented(_))));
    }

    proptest! {
        #[test]
        fn prop_hex_is_base64url_decoded(data in proptest::collection::vec(any::<u8>(), 0..512)) {
            let hex_text = sha256_hex(&data);
            prop_assert_eq!(hex_text.len(), 64);
            prop_assert!(hex_text.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));

            let raw = base64url_decode(&sha256_base64url(&data)).unwrap();
            prop_assert_eq!(hex::encode(raw), hex_text);
        }
    }
}
