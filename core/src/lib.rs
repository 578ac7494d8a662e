//! End-to-end signature check for a PDF buffer: locate the signature field,
//! then report the certificates its PKCS#7 container embeds.

use chrono::{DateTime, Utc};
use log::debug;
use serde::Serialize;
use signature_reader::{
    extract_certificates_at, locate_signature, ByteRange, CertificateRecord, SignatureError,
};

pub use signature_reader::{ErrorKind, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureReport {
    pub byte_range: ByteRange,
    /// Number of bytes covered by the signature.
    pub signed_data_len: usize,
    pub certificates: Vec<CertificateRecord>,
}

impl SignatureReport {
    /// The signer's certificate, listed first by convention.
    pub fn signer(&self) -> Option<&CertificateRecord> {
        self.certificates.first()
    }

    pub fn is_any_expired(&self) -> bool {
        self.certificates.iter().any(|cert| cert.expired())
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Wire form of a failed check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub error: &'static str,
    pub message: String,
}

impl From<&SignatureError> for ErrorReport {
    fn from(err: &SignatureError) -> Self {
        Self {
            error: err.kind().code(),
            message: err.to_string(),
        }
    }
}

impl ErrorReport {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn check_pdf_signature(pdf_bytes: &[u8]) -> Result<SignatureReport> {
    check_pdf_signature_at(pdf_bytes, Utc::now())
}

/// Runs the check with expiry judged against `now`.
pub fn check_pdf_signature_at(pdf_bytes: &[u8], now: DateTime<Utc>) -> Result<SignatureReport> {
    let region = locate_signature(pdf_bytes)?;
    let byte_range = region.byte_range();
    let signed_data_len = region.signed_data().len();

    let certificates = extract_certificates_at(region.signature_container(), now)?;
    debug!(
        "{} bytes signed, {} certificate(s) embedded",
        signed_data_len,
        certificates.len()
    );

    Ok(SignatureReport {
        byte_range,
        signed_data_len,
        certificates,
    })
}
