// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Short-lived self-signed placeholder certificates.

use crate::error::{Error, Result};
use crate::key::PrivateKey;
use crate::random::fill_random;
use crate::x509::Certificate;
use rcgen::string::Ia5String;
use rcgen::{
    BasicConstraints, CertificateParams, DistinguishedName, DnType, IsCa, SanType, SerialNumber,
};

/// Length of the random serial number, in bytes.
pub const SERIAL_LEN: usize = 20;

/// Self-sign a certificate for one `domain`, valid from now for `valid_for`
/// rounded up to whole days.
///
/// The certificate is marked as a CA with a path length of zero. It is only
/// meant to stand in until a real certificate has been issued.
///
/// # Errors
/// [`Error::InvalidArgument`] for a negative duration,
/// [`Error::CertBuildFailed`] if any construction step fails.
pub fn self_sign(
    common_name: &str,
    domain: &str,
    key: &PrivateKey,
    valid_for: time::Duration,
) -> Result<Certificate> {
    if valid_for.is_negative() {
        return Err(Error::InvalidArgument(format!(
            "negative certificate lifetime {}",
            valid_for
        )));
    }
    let days = validity_days(valid_for);

    let mut serial = [0u8; SERIAL_LEN];
    fill_random(&mut serial).map_err(|e| {
        tracing::error!("generating serial number: {}", e);
        e
    })?;

    let mut params = CertificateParams::default();
    params.serial_number = Some(SerialNumber::from_slice(&serial));

    let mut subject = DistinguishedName::new();
    subject.push(DnType::CommonName, common_name);
    params.distinguished_name = subject;

    params.is_ca = IsCa::Ca(BasicConstraints::Constrained(0));

    let san = Ia5String::try_from(domain.to_string()).map_err(|e| {
        tracing::warn!(domain, "adding SAN to certificate: {}", e);
        Error::CertBuildFailed(format!("invalid DNS name '{}': {}", domain, e))
    })?;
    params.subject_alt_names = vec![SanType::DnsName(san)];

    let now = time::OffsetDateTime::now_utc();
    params.not_before = now;
    params.not_after = now + time::Duration::days(days);

    let key_pair = key.signing_key_pair().map_err(|e| {
        tracing::warn!("attaching key to certificate: {}", e);
        Error::CertBuildFailed(format!("unusable signing key: {}", e))
    })?;
    let cert = params.self_signed(&key_pair).map_err(|e| {
        tracing::error!("signing certificate: {}", e);
        Error::CertBuildFailed(e.to_string())
    })?;

    tracing::debug!(domain, days, "self-signed certificate built");
    Certificate::from_der(cert.der())
}

/// Whole days covering `valid_for`, rounding any remainder up.
fn validity_days(valid_for: time::Duration) -> i64 {
    let secs = valid_for.whole_seconds() + i64::from(valid_for.subsec_nanoseconds() > 0);
    (secs + crate::asn1_time::SECS_PER_DAY - 1) / crate::asn1_time::SECS_PER_DAY
}
