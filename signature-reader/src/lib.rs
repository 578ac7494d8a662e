//! Reads the digital signature embedded in a PDF without verifying it.
//!
//! [`locate_signature`] finds the first signature field and rebuilds the
//! bytes it covers; [`extract_certificates`] decodes the PKCS#7 container
//! stored in that field and reports every certificate it carries.

pub mod certificate;
pub mod error;
#[cfg(any(test, feature = "fixtures"))]
pub mod fixtures;
pub mod pkcs7_signature;
pub mod signed_bytes_extractor;
pub mod utils;

pub use certificate::{extract_certificates, extract_certificates_at, CertificateRecord};
pub use error::{ErrorKind, Result, SignatureError};
pub use signed_bytes_extractor::{locate_signature, ByteRange, SignedRegion};
pub use utils::normalize_text;
