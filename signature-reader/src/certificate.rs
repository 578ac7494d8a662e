use chrono::{DateTime, Utc};
use log::debug;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use x509_parser::parse_x509_certificate;
use x509_parser::prelude::{ASN1Time, X509Name};

use crate::error::{Result, SignatureError};
use crate::pkcs7_signature::{parse_signed_data, trim_trailing_zeros};
use crate::utils::{decode_string_value, normalize_text};

/// Short names reported for distinguished-name attributes. Anything else is
/// left out of the record.
const SHORT_NAMES: &[(&str, &str)] = &[
    ("2.5.4.3", "CN"),
    ("2.5.4.6", "C"),
    ("2.5.4.7", "L"),
    ("2.5.4.8", "ST"),
    ("2.5.4.9", "STREET"),
    ("2.5.4.10", "O"),
    ("2.5.4.11", "OU"),
    ("0.9.2342.19200300.100.1.25", "DC"),
    ("0.9.2342.19200300.100.1.1", "UID"),
    ("1.2.840.113549.1.9.1", "E"),
];

fn short_name(oid: &str) -> Option<&'static str> {
    SHORT_NAMES
        .iter()
        .find(|(known, _)| *known == oid)
        .map(|(_, short)| *short)
}

/// Metadata of one embedded certificate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateRecord {
    subject_attributes: Vec<(String, String)>,
    issuer_attributes: Vec<(String, String)>,
    valid_from: DateTime<Utc>,
    valid_to: DateTime<Utc>,
    expired: bool,
}

impl CertificateRecord {
    /// `(short name, value)` pairs in encoding order, duplicates kept.
    pub fn subject_attributes(&self) -> &[(String, String)] {
        &self.subject_attributes
    }

    pub fn issuer_attributes(&self) -> &[(String, String)] {
        &self.issuer_attributes
    }

    pub fn valid_from(&self) -> DateTime<Utc> {
        self.valid_from
    }

    pub fn valid_to(&self) -> DateTime<Utc> {
        self.valid_to
    }

    /// Whether `valid_to` had passed when the record was extracted.
    pub fn expired(&self) -> bool {
        self.expired
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_to
    }

    /// Subject rendered as `"CN=..., O=..., C=..."`.
    pub fn subject(&self) -> String {
        render_name(&self.subject_attributes)
    }

    /// Issuer rendered as `"CN=..., O=..., C=..."`.
    pub fn issuer(&self) -> String {
        render_name(&self.issuer_attributes)
    }

    /// First subject value stored under `short_name`.
    pub fn subject_value(&self, short_name: &str) -> Option<&str> {
        find_value(&self.subject_attributes, short_name)
    }

    pub fn issuer_value(&self, short_name: &str) -> Option<&str> {
        find_value(&self.issuer_attributes, short_name)
    }

    pub fn common_name(&self) -> Option<&str> {
        self.subject_value("CN")
    }
}

fn render_name(attributes: &[(String, String)]) -> String {
    attributes
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join(", ")
}

fn find_value<'a>(attributes: &'a [(String, String)], short_name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(name, _)| name == short_name)
        .map(|(_, value)| value.as_str())
}

impl Serialize for CertificateRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CertificateRecord", 7)?;
        state.serialize_field("subject", &self.subject())?;
        state.serialize_field("issuer", &self.issuer())?;
        state.serialize_field("subjectAttributes", &self.subject_attributes)?;
        state.serialize_field("issuerAttributes", &self.issuer_attributes)?;
        state.serialize_field("validFrom", &self.valid_from)?;
        state.serialize_field("validTo", &self.valid_to)?;
        state.serialize_field("expired", &self.expired)?;
        state.end()
    }
}

/// Reads every certificate embedded in a PDF signature container, judging
/// expiry against the current time.
pub fn extract_certificates(signature_container: &[u8]) -> Result<Vec<CertificateRecord>> {
    extract_certificates_at(signature_container, Utc::now())
}

/// Same as [`extract_certificates`] with an explicit clock.
///
/// Records come back in the order the SignedData lists them; the first one
/// is conventionally the signer's.
pub fn extract_certificates_at(
    signature_container: &[u8],
    now: DateTime<Utc>,
) -> Result<Vec<CertificateRecord>> {
    let der_bytes = trim_trailing_zeros(signature_container);
    debug!(
        "signature container trimmed from {} to {} bytes",
        signature_container.len(),
        der_bytes.len()
    );

    parse_signed_data(der_bytes)?
        .iter()
        .enumerate()
        .map(|(index, cert_der)| read_certificate(index, cert_der, now))
        .collect()
}

fn read_certificate(index: usize, cert_der: &[u8], now: DateTime<Utc>) -> Result<CertificateRecord> {
    let decode_failure = |reason: String| SignatureError::CertificateDecodeFailure { index, reason };

    let (_, cert) = parse_x509_certificate(cert_der).map_err(|e| decode_failure(e.to_string()))?;

    let validity = cert.validity();
    let valid_from = to_utc(&validity.not_before)
        .ok_or_else(|| decode_failure("notBefore out of range".to_string()))?;
    let valid_to = to_utc(&validity.not_after)
        .ok_or_else(|| decode_failure("notAfter out of range".to_string()))?;

    Ok(CertificateRecord {
        subject_attributes: name_attributes(cert.subject()),
        issuer_attributes: name_attributes(cert.issuer()),
        valid_from,
        valid_to,
        expired: now > valid_to,
    })
}

fn to_utc(time: &ASN1Time) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
}

fn name_attributes(name: &X509Name) -> Vec<(String, String)> {
    let mut attributes = Vec::new();
    for rdn in name.iter_rdn() {
        for attr in rdn.iter() {
            let oid = attr.attr_type().to_id_string();
            let Some(short) = short_name(&oid) else {
                debug!("skipping attribute {} without a short name", oid);
                continue;
            };
            let value = attr.attr_value();
            let text = decode_string_value(value.header.tag(), value.data);
            attributes.push((short.to_string(), normalize_text(&text)));
        }
    }
    attributes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures::{self, CertificateBuilder};
    use chrono::TimeZone;
    use simple_asn1::{to_der, ASN1Block, BigInt};
    use time::macros::datetime;

    fn at(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
    }

    #[test]
    fn signer_certificate_fields() {
        let container = fixtures::signed_data(&[fixtures::signer_certificate()]);
        let records = extract_certificates_at(&container, at(2024, 3, 15)).unwrap();

        assert_eq!(records.len(), 1);
        let signer = &records[0];
        assert_eq!(signer.common_name(), Some(fixtures::SIGNER_CN));
        assert_eq!(signer.subject_value("O"), Some(fixtures::SIGNER_ORG));
        assert_eq!(
            signer.subject(),
            format!("C=VN, O={}, CN={}", fixtures::SIGNER_ORG, fixtures::SIGNER_CN)
        );
        assert_eq!(
            signer.issuer(),
            format!("C=VN, O=Example Trust Services, CN={}", fixtures::CA_CN)
        );
        assert_eq!(signer.valid_from(), at(2020, 1, 1));
        assert_eq!(
            signer.valid_to(),
            Utc.with_ymd_and_hms(2049, 12, 31, 23, 59, 59).unwrap()
        );
        assert!(!signer.expired());
    }

    #[test]
    fn chain_is_returned_in_structure_order() {
        let container = fixtures::signed_data(&[
            fixtures::signer_certificate(),
            fixtures::ca_certificate(),
        ]);
        let records = extract_certificates_at(&container, at(2024, 3, 15)).unwrap();

        let names: Vec<_> = records.iter().map(|r| r.common_name()).collect();
        assert_eq!(names, vec![Some(fixtures::SIGNER_CN), Some(fixtures::CA_CN)]);
        assert_eq!(records[1].issuer_value("CN"), Some(fixtures::ROOT_CN));
    }

    #[test]
    fn zero_padding_is_ignored() {
        let mut container = fixtures::signed_data(&[fixtures::signer_certificate()]);
        container.extend(std::iter::repeat(0).take(512));

        let records = extract_certificates(&container).unwrap();
        assert_eq!(records[0].common_name(), Some(fixtures::SIGNER_CN));
    }

    #[test]
    fn expiry_is_strictly_after_valid_to() {
        let cert = CertificateBuilder::new(7)
            .subject(fixtures::common_name(), fixtures::utf8("Short Lived"))
            .issuer(fixtures::common_name(), fixtures::utf8(fixtures::CA_CN))
            .validity(datetime!(2010-01-01 0:00), datetime!(2012-01-01 0:00))
            .to_der();
        let container = fixtures::signed_data(&[cert]);

        let past = extract_certificates_at(&container, at(2011, 6, 1)).unwrap();
        assert!(!past[0].expired());

        let later = extract_certificates_at(&container, at(2024, 3, 15)).unwrap();
        assert!(later[0].expired());

        let record = &later[0];
        assert!(!record.is_expired_at(record.valid_to()));
        assert!(record.is_expired_at(record.valid_to() + chrono::Duration::seconds(1)));
    }

    #[test]
    fn current_clock_sees_long_lived_certificate_as_valid() {
        let container = fixtures::signed_data(&[fixtures::ca_certificate()]);
        let records = extract_certificates(&container).unwrap();
        assert!(!records[0].expired());
    }

    #[test]
    fn attributes_without_short_name_are_skipped() {
        let cert = CertificateBuilder::new(9)
            .subject(fixtures::unstructured_name(), fixtures::utf8("MST:0101234567"))
            .subject(fixtures::organizational_unit(), fixtures::utf8("Sales"))
            .subject(fixtures::organizational_unit(), fixtures::utf8("Hanoi Branch"))
            .subject(fixtures::locality(), fixtures::utf8("  Ha Noi "))
            .subject(fixtures::common_name(), fixtures::utf8("Tran Thi B"))
            .issuer(fixtures::common_name(), fixtures::utf8(fixtures::CA_CN))
            .to_der();
        let records = extract_certificates(&fixtures::signed_data(&[cert])).unwrap();

        assert_eq!(
            records[0].subject(),
            "OU=Sales, OU=Hanoi Branch, L=Ha Noi, CN=Tran Thi B"
        );
        assert!(!records[0].subject().contains("1.2.840"));
    }

    #[test]
    fn mis_encoded_subject_is_recovered() {
        let cert = CertificateBuilder::new(11)
            .subject(
                fixtures::common_name(),
                fixtures::utf8(&fixtures::mis_encoded(fixtures::SIGNER_CN)),
            )
            .subject(
                fixtures::organization(),
                ASN1Block::TeletexString(0, "C\u{f4}ng ty".to_string()),
            )
            .issuer(fixtures::common_name(), fixtures::utf8(fixtures::CA_CN))
            .to_der();
        let records = extract_certificates(&fixtures::signed_data(&[cert])).unwrap();

        assert_eq!(records[0].common_name(), Some(fixtures::SIGNER_CN));
        assert_eq!(records[0].subject_value("O"), Some("C\u{f4}ng ty"));
    }

    #[test]
    fn legacy_issuer_strings_are_read() {
        let cert = CertificateBuilder::new(13)
            .subject(fixtures::common_name(), fixtures::printable("AT&T Signer"))
            .issuer(fixtures::organization(), fixtures::teletex_bytes(b"Tra\xe9 Services"))
            .issuer(fixtures::common_name(), fixtures::printable("Example&Issuing CA"))
            .to_der();
        let container = fixtures::signed_data_with_signer_issuer(
            &[cert],
            fixtures::teletex_bytes(b"Tra\xe1 Issuing CA"),
        );

        let records = extract_certificates(&container).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].common_name(), Some("AT&T Signer"));
        assert_eq!(records[0].issuer(), "O=Tra\u{e9} Services, CN=Example&Issuing CA");
    }

    #[test]
    fn all_zero_container_is_unsupported() {
        let err = extract_certificates(&[0u8; 2048]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSignatureFormat);

        let err = extract_certificates(&[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSignatureFormat);
    }

    #[test]
    fn signed_data_without_certificates_is_unsupported() {
        let err = extract_certificates(&fixtures::signed_data(&[])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSignatureFormat);
    }

    #[test]
    fn broken_certificate_reports_its_index() {
        // Well-formed DER, but not a certificate.
        let not_a_cert = to_der(&ASN1Block::Sequence(
            0,
            vec![ASN1Block::Integer(0, BigInt::from(5u8)), ASN1Block::Boolean(0, true)],
        ))
        .unwrap();
        let container = fixtures::signed_data(&[fixtures::signer_certificate(), not_a_cert]);

        let err = extract_certificates(&container).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::CertificateDecodeFailure);
        assert!(matches!(err, SignatureError::CertificateDecodeFailure { index: 1, .. }));
    }

    #[test]
    fn record_serializes_to_camel_case_json() {
        let container = fixtures::signed_data(&[fixtures::signer_certificate()]);
        let records = extract_certificates_at(&container, at(2024, 3, 15)).unwrap();
        let json = serde_json::to_value(&records[0]).unwrap();

        assert_eq!(json["subject"], records[0].subject());
        assert_eq!(json["issuerAttributes"][2][0], "CN");
        assert_eq!(json["issuerAttributes"][2][1], fixtures::CA_CN);
        assert_eq!(json["validFrom"], "2020-01-01T00:00:00Z");
        assert_eq!(json["expired"], false);
    }
}
