// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! PKCS#10 certificate signing requests.

use crate::encoding::base64url_encode;
use crate::error::{Error, Result};
use crate::key::PrivateKey;
use rcgen::string::Ia5String;
use rcgen::{CertificateParams, CustomExtension, DistinguishedName, DnType, SanType};

/// `id-pe-tlsfeature` (RFC 7633).
const OID_TLS_FEATURE: &[u64] = &[1, 3, 6, 1, 5, 5, 7, 1, 24];

/// `SEQUENCE { INTEGER 5 }`: the `status_request` feature, i.e. OCSP must-staple.
const MUST_STAPLE_VALUE: [u8; 5] = [0x30, 0x03, 0x02, 0x01, 0x05];

/// Build a CSR for `domains` and return it as base64url DER.
///
/// The first domain becomes the subject CN and every domain is listed as a
/// DNS subject alternative name.
///
/// # Errors
/// [`Error::NoDomains`] if `domains` is empty, [`Error::CsrBuildFailed`] if
/// any construction step fails.
pub fn build_csr<S: AsRef<str>>(
    domains: &[S],
    must_staple: bool,
    key: &PrivateKey,
) -> Result<String> {
    build_csr_der(domains, must_staple, key).map(base64url_encode)
}

/// Same as [`build_csr`], returning the raw DER.
pub fn build_csr_der<S: AsRef<str>>(
    domains: &[S],
    must_staple: bool,
    key: &PrivateKey,
) -> Result<Vec<u8>> {
    let first = domains.first().ok_or(Error::NoDomains)?;

    let mut params = CertificateParams::default();
    let mut subject = DistinguishedName::new();
    subject.push(DnType::CommonName, first.as_ref());
    params.distinguished_name = subject;

    for domain in domains {
        let domain = domain.as_ref();
        let name = Ia5String::try_from(domain.to_string()).map_err(|e| {
            tracing::warn!(domain, "adding SAN to CSR: {}", e);
            Error::CsrBuildFailed(format!("invalid DNS name '{}': {}", domain, e))
        })?;
        params.subject_alt_names.push(SanType::DnsName(name));
    }

    if must_staple {
        params
            .custom_extensions
            .push(CustomExtension::from_oid_content(
                OID_TLS_FEATURE,
                MUST_STAPLE_VALUE.to_vec(),
            ));
    }

    let key_pair = key.signing_key_pair().map_err(|e| {
        tracing::warn!("attaching key to CSR: {}", e);
        Error::CsrBuildFailed(format!("unusable signing key: {}", e))
    })?;

    let csr = params.serialize_request(&key_pair).map_err(|e| {
        tracing::warn!("signing CSR: {}", e);
        Error::CsrBuildFailed(e.to_string())
    })?;

    tracing::debug!(domains = domains.len(), must_staple, "CSR built");
    Ok(csr.der().to_vec())
}
