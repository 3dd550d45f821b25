// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

use crate::encoding::uint_base64url;
use crate::error::{Error, Result};
use crate::random::{self, SystemRandom};
use pkcs8::der::Decode;
use pkcs8::{
    DecodePrivateKey, EncodePrivateKey, EncryptedPrivateKeyInfo, LineEnding, ObjectIdentifier,
    PrivateKeyInfo, SecretDocument,
};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

/// Smallest RSA modulus accepted in a key spec.
pub const RSA_BITS_MIN: u32 = 2048;
/// RSA modulus used when a spec does not name one.
pub const RSA_BITS_DEFAULT: u32 = 2048;

/// PBKDF2 rounds for pass phrase protected keys, OpenSSL's PKCS5 default.
const PBKDF2_ITERATIONS: u32 = 2048;

const RSA_ENCRYPTION: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

/// How to generate a private key.
///
/// Serialized as `{"type": "RSA", "bits": 4096}`. The type is matched
/// case-insensitively, a missing type means [`KeySpec::Default`], and an
/// unknown type becomes [`KeySpec::Unsupported`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(from = "KeySpecDoc", into = "KeySpecDoc")]
pub enum KeySpec {
    /// Whatever this crate considers a sensible key, currently RSA 2048.
    #[default]
    Default,
    /// RSA with the given modulus size. Sizes below [`RSA_BITS_MIN`] mean the default.
    Rsa { bits: u32 },
    /// A type this crate cannot generate.
    Unsupported,
}

impl KeySpec {
    /// RSA spec with `bits` normalised to the default when below the minimum.
    pub fn rsa(bits: u32) -> Self {
        KeySpec::Rsa {
            bits: normalize_bits(i64::from(bits)),
        }
    }

    /// Modulus size `generate` will use, if any.
    pub fn effective_bits(&self) -> Option<u32> {
        match self {
            KeySpec::Default => Some(RSA_BITS_DEFAULT),
            KeySpec::Rsa { bits } => Some(normalize_bits(i64::from(*bits))),
            KeySpec::Unsupported => None,
        }
    }

    pub fn from_json(value: &Value) -> Self {
        Self::from_parts(
            value.get("type").and_then(Value::as_str),
            value.get("bits").and_then(Value::as_i64),
        )
    }

    pub fn to_json(&self) -> Value {
        match self {
            KeySpec::Default => json!({ "type": "Default" }),
            KeySpec::Rsa { bits } if *bits >= RSA_BITS_MIN => {
                json!({ "type": "RSA", "bits": bits })
            }
            KeySpec::Rsa { .. } => json!({ "type": "RSA" }),
            KeySpec::Unsupported => json!({ "type": "Unsupported" }),
        }
    }

    fn from_parts(kind: Option<&str>, bits: Option<i64>) -> Self {
        match kind {
            None => KeySpec::Default,
            Some(s) if s.eq_ignore_ascii_case("Default") => KeySpec::Default,
            Some(s) if s.eq_ignore_ascii_case("RSA") => KeySpec::Rsa {
                bits: normalize_bits(bits.unwrap_or(0)),
            },
            Some(_) => KeySpec::Unsupported,
        }
    }
}

fn normalize_bits(bits: i64) -> u32 {
    match u32::try_from(bits) {
        Ok(b) if b >= RSA_BITS_MIN => b,
        _ => RSA_BITS_DEFAULT,
    }
}

impl PartialEq for KeySpec {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeySpec::Default, KeySpec::Default) => true,
            (KeySpec::Rsa { .. }, KeySpec::Rsa { .. }) => {
                self.effective_bits() == other.effective_bits()
            }
            (KeySpec::Unsupported, KeySpec::Unsupported) => true,
            _ => false,
        }
    }
}

impl Eq for KeySpec {}

impl fmt::Display for KeySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.effective_bits() {
            Some(bits) if matches!(self, KeySpec::Rsa { .. }) => write!(f, "RSA {}", bits),
            _ => write!(f, "{:?}", self),
        }
    }
}

#[derive(Serialize, Deserialize)]
struct KeySpecDoc {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bits: Option<i64>,
}

impl From<KeySpecDoc> for KeySpec {
    fn from(doc: KeySpecDoc) -> Self {
        KeySpec::from_parts(doc.kind.as_deref(), doc.bits)
    }
}

impl From<KeySpec> for KeySpecDoc {
    fn from(spec: KeySpec) -> Self {
        let (kind, bits) = match spec {
            KeySpec::Default => ("Default", None),
            KeySpec::Rsa { bits } if bits >= RSA_BITS_MIN => ("RSA", Some(i64::from(bits))),
            KeySpec::Rsa { .. } => ("RSA", None),
            KeySpec::Unsupported => ("Unsupported", None),
        };
        KeySpecDoc {
            kind: Some(kind.to_string()),
            bits,
        }
    }
}

enum KeyMaterial {
    Rsa(RsaPrivateKey),
    /// Any other PKCS#8 key; usable for X.509 signing but not for RS256.
    Other(SecretDocument),
}

/// An exclusively owned private key.
pub struct PrivateKey {
    material: KeyMaterial,
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.material {
            KeyMaterial::Rsa(_) => "RSA",
            KeyMaterial::Other(_) => "other",
        };
        f.debug_struct("PrivateKey")
            .field("kind", &kind)
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

impl PrivateKey {
    /// Generate a fresh key.
    ///
    /// # Errors
    /// [`Error::NotImplemented`] for [`KeySpec::Unsupported`], otherwise
    /// [`Error::KeyGenFailed`] if the backend fails.
    pub fn generate(spec: &KeySpec) -> Result<Self> {
        match spec {
            KeySpec::Default => gen_rsa(RSA_BITS_DEFAULT),
            KeySpec::Rsa { .. } => gen_rsa(spec.effective_bits().unwrap_or(RSA_BITS_DEFAULT)),
            KeySpec::Unsupported => Err(Error::NotImplemented(
                "key generation for unsupported key type".into(),
            )),
        }
    }

    /// Load a PEM key file, decrypting it with `passphrase` when encrypted.
    pub fn load(path: &Path, passphrase: Option<&str>) -> Result<Self> {
        let data = crate::fs::read_file(path)?;
        Self::from_pem(&data, passphrase).map_err(|e| {
            tracing::warn!(path = %path.display(), "error loading private key: {}", e);
            e
        })
    }

    /// Parse a PEM private key.
    ///
    /// Accepts `PRIVATE KEY` (PKCS#8), `ENCRYPTED PRIVATE KEY` (PKCS#8 PBES2)
    /// and legacy unencrypted `RSA PRIVATE KEY` (PKCS#1) blocks. An empty
    /// pass phrase is the same as none.
    pub fn from_pem(pem_data: &[u8], passphrase: Option<&str>) -> Result<Self> {
        let passphrase = passphrase.filter(|p| !p.is_empty());
        let supplied = passphrase.is_some();
        let invalid = |reason: String| Error::InvalidKey {
            reason,
            passphrase_supplied: supplied,
        };

        let block = pem::parse(pem_data).map_err(|e| invalid(format!("bad PEM: {}", e)))?;

        match block.tag() {
            "PRIVATE KEY" => Self::from_pkcs8_der(block.contents())
                .map_err(|e| invalid(format!("bad PKCS#8: {}", e))),
            "ENCRYPTED PRIVATE KEY" => {
                let pass = passphrase.ok_or_else(|| invalid("key is encrypted".into()))?;
                let encrypted = EncryptedPrivateKeyInfo::from_der(block.contents())
                    .map_err(|e| invalid(format!("bad encrypted PKCS#8: {}", e)))?;
                let decrypted = encrypted
                    .decrypt(pass)
                    .map_err(|_| invalid("wrong pass phrase or corrupted key".into()))?;
                Self::from_pkcs8_der(decrypted.as_bytes())
                    .map_err(|e| invalid(format!("bad PKCS#8: {}", e)))
            }
            "RSA PRIVATE KEY" => {
                if block.headers().get("Proc-Type").is_some() {
                    return Err(invalid(
                        "legacy encrypted PEM is not supported, convert to PKCS#8".into(),
                    ));
                }
                let key = RsaPrivateKey::from_pkcs1_der(block.contents())
                    .map_err(|e| invalid(format!("bad PKCS#1: {}", e)))?;
                Ok(Self {
                    material: KeyMaterial::Rsa(key),
                })
            }
            other => Err(invalid(format!("unexpected PEM block '{}'", other))),
        }
    }

    fn from_pkcs8_der(der: &[u8]) -> pkcs8::Result<Self> {
        let info = PrivateKeyInfo::from_der(der)?;
        let material = if info.algorithm.oid == RSA_ENCRYPTION {
            KeyMaterial::Rsa(RsaPrivateKey::from_pkcs8_der(der)?)
        } else {
            KeyMaterial::Other(SecretDocument::from_pkcs8_der(der)?)
        };
        Ok(Self { material })
    }

    fn to_pkcs8_der(&self) -> Result<SecretDocument> {
        match &self.material {
            KeyMaterial::Rsa(key) => key
                .to_pkcs8_der()
                .map_err(|e| Error::EncodeFailed(format!("PKCS#8 encoding: {}", e))),
            KeyMaterial::Other(doc) => Ok(doc.clone()),
        }
    }

    /// Serialize to PEM, encrypted with AES-256-CBC when a non-empty pass phrase is given.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if the pass phrase is longer than `i32::MAX`,
    /// [`Error::EncodeFailed`] if serialization fails.
    pub fn to_pem(&self, passphrase: Option<&str>) -> Result<Zeroizing<String>> {
        let passphrase = passphrase.filter(|p| !p.is_empty());
        if let Some(pass) = passphrase {
            if pass.len() > i32::MAX as usize {
                return Err(Error::InvalidArgument(format!(
                    "pass phrase of {} bytes is too long",
                    pass.len()
                )));
            }
        }

        let der = self.to_pkcs8_der()?;
        let pem = match passphrase {
            None => der.to_pem("PRIVATE KEY", LineEnding::LF),
            Some(pass) => {
                let mut salt = [0u8; 16];
                let mut iv = [0u8; 16];
                random::fill_random(&mut salt)?;
                random::fill_random(&mut iv)?;

                let params = pkcs8::pkcs5::pbes2::Parameters::pbkdf2_sha256_aes256cbc(
                    PBKDF2_ITERATIONS,
                    &salt,
                    &iv,
                )
                .map_err(|e| Error::EncodeFailed(format!("encryption parameters: {}", e)))?;

                let info = PrivateKeyInfo::from_der(der.as_bytes())
                    .map_err(|e| Error::EncodeFailed(format!("PKCS#8 decoding: {}", e)))?;
                info.encrypt_with_params(params, pass)
                    .map_err(|e| Error::EncodeFailed(format!("key encryption: {}", e)))?
                    .to_pem("ENCRYPTED PRIVATE KEY", LineEnding::LF)
            }
        };

        pem.map_err(|e| {
            tracing::error!("PEM encoding of private key failed: {}", e);
            Error::EncodeFailed(format!("PEM encoding: {}", e))
        })
    }

    /// Write the key as PEM through an atomic replace with the given file mode.
    pub fn save(&self, path: &Path, passphrase: Option<&str>, mode: u32) -> Result<()> {
        let pass_len = passphrase.map_or(0, str::len);
        let result = self
            .to_pem(passphrase)
            .and_then(|pem| crate::fs::replace_file(path, mode, pem.as_bytes()));
        if let Err(e) = &result {
            tracing::debug!(
                path = %path.display(),
                pass_len,
                "save private key ({} pass phrase) failed: {}",
                if pass_len > 0 { "with" } else { "without" },
                e
            );
        }
        result
    }

    /// Modulus size in bits, for RSA keys.
    pub fn bits(&self) -> Option<usize> {
        self.rsa().map(|key| key.size() * 8)
    }

    pub fn is_rsa(&self) -> bool {
        self.rsa().is_some()
    }

    /// JWK `e`: the public exponent as base64url big-endian bytes.
    pub fn public_exponent_b64(&self) -> Option<String> {
        self.rsa().map(|key| uint_base64url(&key.e().to_bytes_be()))
    }

    /// JWK `n`: the modulus as base64url big-endian bytes.
    pub fn public_modulus_b64(&self) -> Option<String> {
        self.rsa().map(|key| uint_base64url(&key.n().to_bytes_be()))
    }

    pub(crate) fn rsa(&self) -> Option<&RsaPrivateKey> {
        match &self.material {
            KeyMaterial::Rsa(key) => Some(key),
            KeyMaterial::Other(_) => None,
        }
    }

    /// The same key in the form rcgen signs with.
    pub(crate) fn signing_key_pair(&self) -> std::result::Result<rcgen::KeyPair, String> {
        let der = self.to_pkcs8_der().map_err(|e| e.to_string())?;
        let pem = der
            .to_pem("PRIVATE KEY", LineEnding::LF)
            .map_err(|e| e.to_string())?;
        rcgen::KeyPair::from_pem(&pem).map_err(|e| e.to_string())
    }
}

fn gen_rsa(bits: u32) -> Result<PrivateKey> {
    random::init();
    let key = RsaPrivateKey::new(&mut SystemRandom, bits as usize).map_err(|e| {
        tracing::warn!(bits, "error generating RSA key: {}", e);
        Error::KeyGenFailed(format!("RSA {}: {}", bits, e))
    })?;
    Ok(PrivateKey {
        material: KeyMaterial::Rsa(key),
    })
}
