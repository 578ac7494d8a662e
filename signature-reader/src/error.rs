//! Error types for locating and reading PDF signatures.

use serde::Serialize;

/// Result type alias for signature reading operations.
pub type Result<T> = std::result::Result<T, SignatureError>;

/// Everything that can stop a signature from being read.
///
/// Every variant is terminal for the current call: the failure reflects the
/// input bytes, so retrying the same buffer gives the same answer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError {
    /// No `ByteRange` marker, the document carries no digital signature.
    #[error("document has no digital signature: {0}")]
    NoSignatureField(String),

    /// A signature field exists but its `Contents` entry is missing or not valid hex.
    #[error("signature present but its content is unreadable: {0}")]
    UnreadableSignatureContent(String),

    /// The `Contents` bytes are not PKCS#7 SignedData, or carry no certificate.
    #[error("unsupported or corrupted signature format: {0}")]
    UnsupportedSignatureFormat(String),

    /// The container decoded but one of its certificates did not.
    #[error("failed to decode certificate #{index}: {reason}")]
    CertificateDecodeFailure {
        /// Position of the certificate inside the SignedData structure
        index: usize,
        /// Reason reported by the certificate parser
        reason: String,
    },

    /// The ByteRange integers do not address the supplied buffer.
    #[error("invalid ByteRange: {0}")]
    InvalidByteRange(String),
}

/// Machine-readable discriminant of a [`SignatureError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NoSignatureField,
    UnreadableSignatureContent,
    UnsupportedSignatureFormat,
    CertificateDecodeFailure,
    InvalidByteRange,
}

impl ErrorKind {
    /// Stable identifier suitable for transport-level mapping.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::NoSignatureField => "no_signature_field",
            ErrorKind::UnreadableSignatureContent => "unreadable_signature_content",
            ErrorKind::UnsupportedSignatureFormat => "unsupported_signature_format",
            ErrorKind::CertificateDecodeFailure => "certificate_decode_failure",
            ErrorKind::InvalidByteRange => "invalid_byte_range",
        }
    }
}

impl SignatureError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SignatureError::NoSignatureField(_) => ErrorKind::NoSignatureField,
            SignatureError::UnreadableSignatureContent(_) => ErrorKind::UnreadableSignatureContent,
            SignatureError::UnsupportedSignatureFormat(_) => ErrorKind::UnsupportedSignatureFormat,
            SignatureError::CertificateDecodeFailure { .. } => ErrorKind::CertificateDecodeFailure,
            SignatureError::InvalidByteRange(_) => ErrorKind::InvalidByteRange,
        }
    }
}
