use lazy_static::lazy_static;
use log::{debug, warn};
use regex::bytes::Regex;
use serde::Serialize;

use crate::error::{Result, SignatureError};

lazy_static! {
    // `(?-u)` keeps `\s`/`\d` ASCII-only so the buffer is matched byte for byte.
    static ref BYTE_RANGE_RE: Regex =
        Regex::new(r"(?-u)ByteRange\s*\[\s*(\d+)\s+(\d+)\s+(\d+)\s+(\d+)\s*\]").unwrap();
    static ref CONTENTS_RE: Regex = Regex::new(r"(?-u)Contents\s*<([0-9A-Fa-f]+)>").unwrap();
}

/// The `/ByteRange [off1 len1 off2 len2]` array of a signature field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ByteRange {
    pub offset1: usize,
    pub length1: usize,
    pub offset2: usize,
    pub length2: usize,
}

impl ByteRange {
    pub fn new(offset1: usize, length1: usize, offset2: usize, length2: usize) -> Self {
        Self {
            offset1,
            length1,
            offset2,
            length2,
        }
    }

    /// Total number of signed bytes.
    pub fn signed_len(&self) -> usize {
        self.length1.saturating_add(self.length2)
    }

    /// True when the first span ends before the second starts, leaving room
    /// for the `/Contents` placeholder in between.
    pub fn is_conventional(&self) -> bool {
        self.offset1
            .checked_add(self.length1)
            .map_or(false, |end| end <= self.offset2)
    }

    /// Concatenates both spans of `pdf_bytes` verbatim.
    pub fn extract_signed_bytes(&self, pdf_bytes: &[u8]) -> Result<Vec<u8>> {
        let first = span(pdf_bytes, self.offset1, self.length1, "first")?;
        let second = span(pdf_bytes, self.offset2, self.length2, "second")?;

        let mut signed_data = Vec::with_capacity(first.len() + second.len());
        signed_data.extend_from_slice(first);
        signed_data.extend_from_slice(second);
        Ok(signed_data)
    }
}

impl std::fmt::Display for ByteRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{} {} {} {}]",
            self.offset1, self.length1, self.offset2, self.length2
        )
    }
}

fn span<'a>(pdf_bytes: &'a [u8], offset: usize, length: usize, which: &str) -> Result<&'a [u8]> {
    let end = offset.checked_add(length).ok_or_else(|| {
        SignatureError::InvalidByteRange(format!(
            "{} range {} + {} overflows",
            which, offset, length
        ))
    })?;
    pdf_bytes.get(offset..end).ok_or_else(|| {
        SignatureError::InvalidByteRange(format!(
            "{} range {}..{} exceeds file size {}",
            which,
            offset,
            end,
            pdf_bytes.len()
        ))
    })
}

/// The signed bytes of a PDF together with its raw signature container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRegion {
    byte_range: ByteRange,
    signed_data: Vec<u8>,
    signature_container: Vec<u8>,
}

impl SignedRegion {
    pub fn byte_range(&self) -> ByteRange {
        self.byte_range
    }

    /// The exact byte sequence the signer hashed.
    pub fn signed_data(&self) -> &[u8] {
        &self.signed_data
    }

    /// Hex-decoded `/Contents`, zero padding included.
    pub fn signature_container(&self) -> &[u8] {
        &self.signature_container
    }

    pub fn into_signature_container(self) -> Vec<u8> {
        self.signature_container
    }
}

/// Locates the first signature field of a PDF and reconstructs its signed region.
///
/// The buffer is scanned as a single-byte text surface: only the ASCII
/// `ByteRange` and `Contents` markers are matched, so binary streams are
/// never decoded or altered.
pub fn locate_signature(pdf_bytes: &[u8]) -> Result<SignedRegion> {
    // 1) First `ByteRange [a b c d]` in the file
    let caps = BYTE_RANGE_RE.captures(pdf_bytes).ok_or_else(|| {
        SignatureError::NoSignatureField("ByteRange not found".to_string())
    })?;

    // 2) Parse exactly four usize values
    let mut nums = [0usize; 4];
    for (idx, slot) in nums.iter_mut().enumerate() {
        let digits = caps.get(idx + 1).map(|m| m.as_bytes()).unwrap_or_default();
        *slot = parse_offset(digits)?;
    }
    let byte_range = ByteRange::new(nums[0], nums[1], nums[2], nums[3]);
    debug!("found ByteRange {}", byte_range);

    if !byte_range.is_conventional() {
        warn!(
            "ByteRange {} spans overlap or are out of order, using them as given",
            byte_range
        );
    }

    // 3) Reconstruct the signed data
    let signed_data = byte_range.extract_signed_bytes(pdf_bytes)?;

    // 4) Locate the `Contents <...>` hex blob
    let hex_blob = CONTENTS_RE
        .captures(pdf_bytes)
        .and_then(|c| c.get(1))
        .ok_or_else(|| {
            SignatureError::UnreadableSignatureContent(
                "Contents hex string not found".to_string(),
            )
        })?;

    // 5) Decode the hex into the raw container
    let signature_container = hex::decode(hex_blob.as_bytes()).map_err(|e| {
        SignatureError::UnreadableSignatureContent(format!("Contents hex parse error: {}", e))
    })?;
    debug!(
        "Contents at byte {} decoded to {} bytes",
        hex_blob.start(),
        signature_container.len()
    );

    Ok(SignedRegion {
        byte_range,
        signed_data,
        signature_container,
    })
}

fn parse_offset(digits: &[u8]) -> Result<usize> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            SignatureError::InvalidByteRange(format!(
                "'{}' is not a valid offset",
                String::from_utf8_lossy(digits)
            ))
        })
}
