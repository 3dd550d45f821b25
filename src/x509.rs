// Copyright 2025 Jayashankar
// SPDX-License-Identifier: Apache-2.0

//! Parsed X.509 certificates.

use crate::asn1_time::{Asn1Time, CalendarTime, SECS_PER_DAY};
use crate::encoding::base64url_encode;
use crate::error::{Error, Result};
use once_cell::sync::OnceCell;
use ::pem::{EncodeConfig, LineEnding, Pem};
use std::cmp::Ordering;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};
use std::path::Path;
use ::time::OffsetDateTime;
use x509_parser::prelude::*;

/// Content type of a DER certificate fetched over HTTP.
pub const PKIX_CERT_CONTENT_TYPE: &str = "application/pkix-cert";

/// Upper bound for a certificate body fetched over HTTP.
pub const MAX_HTTP_CERT_SIZE: usize = 1024 * 1024;

/// `id-ad-caIssuers` in an Authority Information Access extension.
const OID_CA_ISSUERS: &str = "1.3.6.1.5.5.7.48.2";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertState {
    Valid,
    Expired,
}

/// An X.509 certificate with its validity window and a lazily built SAN list.
pub struct Certificate {
    der: Vec<u8>,
    serial: Vec<u8>,
    common_name: Option<String>,
    not_before: Asn1Time,
    not_after: Asn1Time,
    issuer_uri: Option<String>,
    alt_names: OnceCell<Vec<String>>,
}

impl fmt::Debug for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Certificate")
            .field("serial", &self.serial_hex())
            .field("common_name", &self.common_name)
            .field("not_before", &self.not_before.as_str())
            .field("not_after", &self.not_after.as_str())
            .finish_non_exhaustive()
    }
}

impl Certificate {
    /// Parse a DER certificate. Trailing bytes after the certificate are an error.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (cert, trailing) = Self::from_der_prefix(der)?;
        if trailing > 0 {
            return Err(Error::InvalidFormat(format!(
                "{} trailing bytes after certificate",
                trailing
            )));
        }
        Ok(cert)
    }

    /// Parse the certificate at the start of `data`, returning it with the
    /// number of bytes left over after it.
    fn from_der_prefix(data: &[u8]) -> Result<(Self, usize)> {
        let (rest, cert) = X509Certificate::from_der(data)
            .map_err(|e| Error::InvalidFormat(format!("Invalid X.509: {}", e)))?;
        let der = &data[..data.len() - rest.len()];

        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(String::from);

        let mut issuer_uri = None;
        for ext in cert.extensions() {
            if let ParsedExtension::AuthorityInfoAccess(aia) = ext.parsed_extension() {
                issuer_uri = aia
                    .accessdescs
                    .iter()
                    .filter(|desc| desc.access_method.to_id_string() == OID_CA_ISSUERS)
                    .find_map(|desc| match &desc.access_location {
                        GeneralName::URI(uri) => Some(uri.to_string()),
                        _ => None,
                    });
            }
        }

        let parsed = Self {
            serial: cert.raw_serial().to_vec(),
            common_name,
            not_before: Asn1Time::from_datetime(cert.validity().not_before.to_datetime()),
            not_after: Asn1Time::from_datetime(cert.validity().not_after.to_datetime()),
            issuer_uri,
            alt_names: OnceCell::new(),
            der: der.to_vec(),
        };
        Ok((parsed, rest.len()))
    }

    /// Parse the first PEM `CERTIFICATE` block in `data`.
    pub fn from_pem(data: &[u8]) -> Result<Self> {
        let block = ::pem::parse_many(data)
            .map_err(|e| Error::InvalidFormat(format!("Failed to parse PEM: {}", e)))?
            .into_iter()
            .find(|p| p.tag() == "CERTIFICATE")
            .ok_or_else(|| Error::InvalidFormat("no CERTIFICATE block found".into()))?;
        Self::from_der(block.contents())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = crate::fs::read_file(path)?;
        Self::from_pem(&data)
    }

    /// Accept a certificate body from an HTTP response.
    ///
    /// # Errors
    /// [`Error::UnexpectedContentType`] unless the type is exactly
    /// `application/pkix-cert`, [`Error::TooLarge`] over 1 MiB, and
    /// [`Error::InvalidFormat`] if the body does not start with a DER
    /// certificate. Bytes after the certificate are ignored.
    pub fn from_http_response(content_type: &str, body: &[u8]) -> Result<Self> {
        if content_type != PKIX_CERT_CONTENT_TYPE {
            return Err(Error::UnexpectedContentType(content_type.to_string()));
        }
        if body.len() > MAX_HTTP_CERT_SIZE {
            return Err(Error::TooLarge {
                size: body.len(),
                limit: MAX_HTTP_CERT_SIZE,
            });
        }
        let result = Self::from_der_prefix(body);
        tracing::trace!(ok = result.is_ok(), len = body.len(), "cert parsed");
        let (cert, trailing) = result?;
        if trailing > 0 {
            tracing::debug!(trailing, "ignoring bytes after certificate");
        }
        Ok(cert)
    }

    pub fn to_der(&self) -> &[u8] {
        &self.der
    }

    pub fn to_pem(&self) -> String {
        let block = Pem::new("CERTIFICATE", self.der.clone());
        ::pem::encode_config(&block, EncodeConfig::new().set_line_ending(LineEnding::LF))
    }

    /// DER bytes, base64url encoded.
    pub fn to_base64url(&self) -> String {
        base64url_encode(&self.der)
    }

    pub fn save(&self, path: &Path, mode: u32) -> Result<()> {
        crate::fs::replace_file(path, mode, self.to_pem().as_bytes())
    }

    /// Serial number as lowercase hex of its DER content bytes.
    pub fn serial_hex(&self) -> String {
        hex::encode(&self.serial)
    }

    pub fn subject_common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// The raw validity bounds, as re-encoded ASN.1 time strings.
    pub fn validity(&self) -> (&Asn1Time, &Asn1Time) {
        (&self.not_before, &self.not_after)
    }

    pub fn not_before(&self) -> Result<OffsetDateTime> {
        self.not_before_at(OffsetDateTime::now_utc())
    }

    pub fn not_after(&self) -> Result<OffsetDateTime> {
        self.not_after_at(OffsetDateTime::now_utc())
    }

    /// `notBefore`, computed as `now` plus the calendar difference to the field.
    pub fn not_before_at(&self, now: OffsetDateTime) -> Result<OffsetDateTime> {
        offset_from(now, &self.not_before)
    }

    pub fn not_after_at(&self, now: OffsetDateTime) -> Result<OffsetDateTime> {
        offset_from(now, &self.not_after)
    }

    pub fn is_valid_now(&self) -> bool {
        self.is_valid_at(OffsetDateTime::now_utc())
    }

    pub fn has_expired(&self) -> bool {
        self.has_expired_at(OffsetDateTime::now_utc())
    }

    /// `notBefore <= now < notAfter`. Unparseable bounds count as invalid.
    pub fn is_valid_at(&self, now: OffsetDateTime) -> bool {
        matches!(
            cmp_time(&self.not_before, now),
            Some(Ordering::Less | Ordering::Equal)
        ) && cmp_time(&self.not_after, now) == Some(Ordering::Greater)
    }

    /// `notAfter <= now`.
    pub fn has_expired_at(&self, now: OffsetDateTime) -> bool {
        matches!(
            cmp_time(&self.not_after, now),
            Some(Ordering::Less | Ordering::Equal)
        )
    }

    pub fn state(&self) -> CertState {
        self.state_at(OffsetDateTime::now_utc())
    }

    pub fn state_at(&self, now: OffsetDateTime) -> CertState {
        if self.is_valid_at(now) {
            CertState::Valid
        } else {
            CertState::Expired
        }
    }

    /// DNS, URI and IP subject alternative names, computed once.
    pub fn alt_names(&self) -> &[String] {
        self.alt_names.get_or_init(|| collect_alt_names(&self.der))
    }

    /// Whether `name` is one of the alt names, ignoring ASCII case.
    pub fn covers_domain(&self, name: &str) -> bool {
        self.alt_names()
            .iter()
            .any(|alt| alt.eq_ignore_ascii_case(name))
    }

    /// Whether every name in `domains` is covered.
    ///
    /// A certificate without any alt names covers nothing, not even an
    /// empty list.
    pub fn covers_all<S: AsRef<str>>(&self, domains: &[S]) -> bool {
        let names = self.alt_names();
        if names.is_empty() {
            tracing::warn!(serial = %self.serial_hex(), "cert has no alt names");
            return false;
        }
        tracing::trace!(count = names.len(), "cert alt names");
        for domain in domains {
            if !self.covers_domain(domain.as_ref()) {
                tracing::debug!(domain = domain.as_ref(), "domain not covered by cert");
                return false;
            }
        }
        true
    }

    /// The "CA Issuers" URI from the Authority Information Access extension.
    pub fn issuer_uri(&self) -> Option<&str> {
        self.issuer_uri.as_deref()
    }
}

/// `now` truncated to whole seconds, plus the difference to `field`.
fn offset_from(now: OffsetDateTime, field: &Asn1Time) -> Result<OffsetDateTime> {
    let now = now - ::time::Duration::nanoseconds(i64::from(now.nanosecond()));
    let (days, secs) = field_diff(now, field)?;
    Ok(now + ::time::Duration::seconds(days * SECS_PER_DAY + secs))
}

fn field_diff(now: OffsetDateTime, field: &Asn1Time) -> Result<(i64, i64)> {
    let field_tm = field
        .to_calendar_time()
        .ok_or_else(|| Error::InvalidFormat(format!("unparseable certificate time '{}'", field)))?;
    CalendarTime::diff(&CalendarTime::from(now), &field_tm)
        .ok_or_else(|| Error::InvalidFormat(format!("certificate time '{}' out of range", field)))
}

/// Order of `field` relative to `now`, at whole-second precision.
fn cmp_time(field: &Asn1Time, now: OffsetDateTime) -> Option<Ordering> {
    let (days, secs) = field_diff(now, field).ok()?;
    Some((days * SECS_PER_DAY + secs).cmp(&0))
}

fn collect_alt_names(der: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let cert = match X509Certificate::from_der(der) {
        Ok((_, cert)) => cert,
        Err(e) => {
            tracing::error!("re-parsing certificate for alt names: {}", e);
            return names;
        }
    };

    for ext in cert.extensions() {
        if let ParsedExtension::SubjectAlternativeName(san) = ext.parsed_extension() {
            for name in &san.general_names {
                match name {
                    GeneralName::DNSName(dns) => names.push(dns.to_string()),
                    GeneralName::URI(uri) => names.push(uri.to_string()),
                    GeneralName::IPAddress(ip_bytes) if ip_bytes.len() == 4 => {
                        let ip = Ipv4Addr::new(ip_bytes[0], ip_bytes[1], ip_bytes[2], ip_bytes[3]);
                        names.push(ip.to_string());
                    }
                    GeneralName::IPAddress(ip_bytes) if ip_bytes.len() == 16 => {
                        if let Ok(bytes) = <[u8; 16]>::try_from(*ip_bytes) {
                            names.push(Ipv6Addr::from(bytes).to_string());
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cert::self_sign;
    use crate::test_support::rsa_key;
    use rcgen::{CertificateParams, CustomExtension, DnType, KeyPair, SanType};
    use std::net::IpAddr;

    fn self_signed(days: i64) -> Certificate {
        self_sign(
            "example.org",
            "example.org",
            rsa_key(),
            ::time::Duration::days(days),
        )
        .expect("self-signed certificate should build")
    }

    /// A certificate with arbitrary SANs and an AIA extension built directly with rcgen.
    fn custom_cert(sans: Vec<SanType>, aia: Option<&str>) -> Certificate {
        let key = KeyPair::generate().unwrap();
        let mut params = CertificateParams::default();
        params
            .distinguished_name
            .push(DnType::CommonName, "custom.example");
        params.subject_alt_names = sans;
        if let Some(uri) = aia {
            params
                .custom_extensions
                .push(CustomExtension::from_oid_content(
                    &[1, 3, 6, 1, 5, 5, 7, 1, 1],
                    aia_der(uri),
                ));
        }
        let cert = params.self_signed(&key).unwrap();
        Certificate::from_der(cert.der()).unwrap()
    }

    /// SEQUENCE { SEQUENCE { id-ad-caIssuers, [6] uri } }
    fn aia_der(uri: &str) -> Vec<u8> {
        let oid = [0x06, 0x08, 0x2b, 0x06, 0x01, 0x05, 0x05, 0x07, 0x30, 0x02];
        let mut location = vec![0x86, uri.len() as u8];
        location.extend_from_slice(uri.as_bytes());
        let inner_len = oid.len() + location.len();
        let mut out = vec![0x30, (inner_len + 2) as u8, 0x30, inner_len as u8];
        out.extend_from_slice(&oid);
        out.extend_from_slice(&location);
        out
    }

    #[test]
    fn test_from_der_rejects_garbage() {
        let result = Certificate::from_der(b"\x30\x03\x02\x01\x05");
        assert!(matches!(result, Err(Error::InvalidFormat(_))));
    }

    #[test]
    fn test_http_response_checks() {
        let cert = self_signed(7);

        let result = Certificate::from_http_response("text/plain", cert.to_der());
        assert!(matches!(result, Err(Error::UnexpectedContentType(_))));

        let huge = vec![0u8; MAX_HTTP_CERT_SIZE + 1];
        let result = Certificate::from_http_response(PKIX_CERT_CONTENT_TYPE, &huge);
        assert!(matches!(result, Err(Error::TooLarge { .. })));

        let parsed = Certificate::from_http_response(PKIX_CERT_CONTENT_TYPE, cert.to_der())
            .expect("DER body should parse");
        assert_eq!(parsed.serial_hex(), cert.serial_hex());
    }

    #[test]
    fn test_http_response_ignores_trailing_bytes() {
        let cert = self_signed(7);
        let mut body = cert.to_der().to_vec();
        body.push(b'\n');

        let parsed = Certificate::from_http_response(PKIX_CERT_CONTENT_TYPE, &body)
            .expect("body with a trailing newline should parse");
        assert_eq!(parsed.to_der(), cert.to_der());

        // Direct DER parsing stays strict
        assert!(matches!(
            Certificate::from_der(&body),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_pem_save_and_load_keeps_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cert.pem");
        let cert = self_signed(30);

        cert.save(&path, 0o644).unwrap();
        let loaded = Certificate::load(&path).unwrap();

        let now = OffsetDateTime::now_utc();
        assert_eq!(loaded.serial_hex(), cert.serial_hex());
        assert_eq!(loaded.alt_names(), cert.alt_names());
        assert_eq!(loaded.not_before_at(now).unwrap(), cert.not_before_at(now).unwrap());
        assert_eq!(loaded.not_after_at(now).unwrap(), cert.not_after_at(now).unwrap());
    }

    #[test]
    fn test_load_missing_is_not_found() {
        let result = Certificate::load(Path::new("/nonexistent/cert.pem"));
        assert!(matches!(result, Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_to_base64url_is_der() {
        let cert = self_signed(1);
        let decoded = crate::encoding::base64url_decode(&cert.to_base64url()).unwrap();
        assert_eq!(decoded, cert.to_der());
    }

    #[test]
    fn test_validity_window() {
        let cert = self_signed(7);
        let now = OffsetDateTime::now_utc();
        let not_before = cert.not_before_at(now).unwrap();
        let not_after = cert.not_after_at(now).unwrap();

        assert!(cert.is_valid_at(not_before));
        assert!(!cert.is_valid_at(not_before - ::time::Duration::seconds(1)));
        assert!(cert.is_valid_at(not_after - ::time::Duration::seconds(1)));
        assert!(!cert.is_valid_at(not_after));
        assert!(!cert.has_expired_at(not_after - ::time::Duration::seconds(1)));
        assert!(cert.has_expired_at(not_after));

        assert_eq!(cert.state_at(now), CertState::Valid);
        assert_eq!(
            cert.state_at(not_after + ::time::Duration::days(1)),
            CertState::Expired
        );
    }

    #[test]
    fn test_alt_names_kinds() {
        let cert = custom_cert(
            vec![
                SanType::DnsName("a.example".try_into().unwrap()),
                SanType::URI("https://b.example/".try_into().unwrap()),
                SanType::IpAddress(IpAddr::from([192, 0, 2, 1])),
                SanType::IpAddress("2001:db8::1".parse().unwrap()),
                SanType::Rfc822Name("someone@example.org".try_into().unwrap()),
            ],
            None,
        );
        assert_eq!(
            cert.alt_names(),
            &[
                "a.example".to_string(),
                "https://b.example/".to_string(),
                "192.0.2.1".to_string(),
                "2001:db8::1".to_string(),
            ]
        );
    }

    #[test]
    fn test_alt_names_are_cached() {
        let cert = self_signed(1);
        let first = cert.alt_names().as_ptr();
        let second = cert.alt_names().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_covers_domain_ignores_case() {
        let cert = self_signed(1);
        assert!(cert.covers_domain("example.org"));
        assert!(cert.covers_domain("EXAMPLE.org"));
        assert!(!cert.covers_domain("www.example.org"));
    }

    #[test]
    fn test_covers_all() {
        let cert = custom_cert(
            vec![
                SanType::DnsName("example.org".try_into().unwrap()),
                SanType::DnsName("www.example.org".try_into().unwrap()),
            ],
            None,
        );
        assert!(cert.covers_all(&["example.org", "www.example.org"]));
        assert!(!cert.covers_all(&["example.org", "mail.example.org"]));
        let none: [&str; 0] = [];
        assert!(cert.covers_all(&none));
    }

    #[test]
    fn test_covers_all_without_sans_is_false() {
        let cert = custom_cert(vec![], None);
        assert!(cert.alt_names().is_empty());
        let none: [&str; 0] = [];
        assert!(!cert.covers_all(&none));
        assert!(!cert.covers_all(&["custom.example"]));
    }

    #[test]
    fn test_issuer_uri() {
        let cert = custom_cert(vec![], Some("http://ca.example/issuer.der"));
        assert_eq!(cert.issuer_uri(), Some("http://ca.example/issuer.der"));

        let cert = self_signed(1);
        assert_eq!(cert.issuer_uri(), None);
    }

    #[test]
    fn test_subject_common_name() {
        let cert = self_signed(1);
        assert_eq!(cert.subject_common_name(), Some("example.org"));
    }
}
