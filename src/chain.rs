// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Ordered certificate chains stored as concatenated PEM.

use crate::error::{Error, Result};
use crate::x509::Certificate;
use std::path::Path;

/// A PEM file with no certificates in it is only accepted below this size.
pub const EMPTY_CHAIN_MAX_SIZE: usize = 1024;

/// Certificates in file order, leaf first.
#[derive(Debug, Default)]
pub struct CertificateChain {
    certs: Vec<Certificate>,
}

impl CertificateChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a chain file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut chain = Self::new();
        chain.append_from_pem_file(path)?;
        Ok(chain)
    }

    /// Append every `CERTIFICATE` block of a PEM file, in order.
    ///
    /// A file holding no certificates is accepted only when it is smaller
    /// than [`EMPTY_CHAIN_MAX_SIZE`]. Larger files with nothing usable in
    /// them are rejected with [`Error::InvalidFormat`].
    pub fn append_from_pem_file(&mut self, path: &Path) -> Result<usize> {
        let data = crate::fs::read_file(path)?;
        let blocks = pem::parse_many(&data).map_err(|e| {
            Error::InvalidFormat(format!("{}: bad PEM: {}", path.display(), e))
        })?;

        let mut added = Vec::new();
        for block in blocks.iter().filter(|b| b.tag() == "CERTIFICATE") {
            added.push(Certificate::from_der(block.contents())?);
        }

        if added.is_empty() {
            if data.len() >= EMPTY_CHAIN_MAX_SIZE {
                return Err(Error::InvalidFormat(format!(
                    "{}: no certificates in {} bytes",
                    path.display(),
                    data.len()
                )));
            }
            tracing::debug!(path = %path.display(), "empty chain file");
        }

        let count = added.len();
        self.certs.extend(added);
        tracing::trace!(path = %path.display(), count, "chain certs loaded");
        Ok(count)
    }

    /// Write all certificates as concatenated PEM.
    pub fn save(&self, path: &Path, mode: u32) -> Result<()> {
        let contents: String = self.certs.iter().map(Certificate::to_pem).collect();
        crate::fs::replace_file(path, mode, contents.as_bytes()).map_err(|e| {
            tracing::warn!(path = %path.display(), "saving chain: {}", e);
            Error::EncodeFailed(e.to_string())
        })
    }

    pub fn push(&mut self, cert: Certificate) {
        self.certs.push(cert);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certs.iter()
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }

    /// The leaf certificate, if any.
    pub fn first(&self) -> Option<&Certificate> {
        self.certs.first()
    }
}

impl<'a> IntoIterator for &'a CertificateChain {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Certificate> for CertificateChain {
    fn from_iter<I: IntoIterator<Item = Certificate>>(iter: I) -> Self {
        Self {
            certs: iter.into_iter().collect(),
        }
    }
}
