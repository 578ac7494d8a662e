//! Header-level walk of a PKCS#7 `ContentInfo` down to its certificate set.
//!
//! Only tags and lengths are read on the way. Strings elsewhere in the
//! container (signer identifiers, attributes) are never decoded, so
//! non-conforming legacy values there cannot break certificate extraction.

use log::debug;
use x509_parser::der_parser::asn1_rs::{Class, FromDer, Header, Tag};

use crate::error::{Result, SignatureError};

/// DER content octets of `1.2.840.113549.1.7.2` (id-signedData).
const SIGNED_DATA_OID: &[u8] = &[0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d, 0x01, 0x07, 0x02];

fn unsupported(reason: impl Into<String>) -> SignatureError {
    SignatureError::UnsupportedSignatureFormat(reason.into())
}

/// Drops the zero padding that fixed-size `/Contents` placeholders leave
/// after the encoded container.
///
/// Everything up to and including the last non-zero byte is kept untouched;
/// an all-zero buffer trims to empty.
pub fn trim_trailing_zeros(container: &[u8]) -> &[u8] {
    let end = container
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    &container[..end]
}

/// One TLV element, borrowed from the container.
#[derive(Debug, Clone, Copy)]
struct Element<'a> {
    class: Class,
    constructed: bool,
    tag: Tag,
    /// Content octets only.
    content: &'a [u8],
    /// Identifier, length and content octets.
    encoded: &'a [u8],
}

impl Element<'_> {
    fn is_universal(&self, tag: Tag) -> bool {
        self.class == Class::Universal && self.tag == tag
    }

    fn is_context(&self, number: u32) -> bool {
        self.class == Class::ContextSpecific && self.constructed && self.tag == Tag(number)
    }
}

/// Reads the element at the start of `input`, returning it and the bytes
/// that follow.
fn read_element<'a>(input: &'a [u8], what: &str) -> Result<(Element<'a>, &'a [u8])> {
    let (rest, header) =
        Header::from_der(input).map_err(|e| unsupported(format!("{}: {}", what, e)))?;
    let header_len = input.len() - rest.len();
    let body_len = header
        .length()
        .definite()
        .map_err(|e| unsupported(format!("{}: {}", what, e)))?;
    let end = header_len
        .checked_add(body_len)
        .filter(|&end| end <= input.len())
        .ok_or_else(|| unsupported(format!("{} truncated", what)))?;

    let element = Element {
        class: header.class(),
        constructed: header.is_constructed(),
        tag: header.tag(),
        content: &input[header_len..end],
        encoded: &input[..end],
    };
    Ok((element, &input[end..]))
}

/// Splits a run of concatenated elements.
fn read_all<'a>(mut input: &'a [u8], what: &str) -> Result<Vec<Element<'a>>> {
    let mut elements = Vec::new();
    while !input.is_empty() {
        let (element, rest) = read_element(input, what)?;
        elements.push(element);
        input = rest;
    }
    Ok(elements)
}

/// Returns the encoding of every certificate embedded in a PKCS#7
/// `ContentInfo`/`SignedData`, byte for byte and in the order listed.
///
/// Fails with `UnsupportedSignatureFormat` when the bytes are not SignedData
/// or when no certificate is embedded.
pub fn parse_signed_data(der_bytes: &[u8]) -> Result<Vec<Vec<u8>>> {
    let signed_data = signed_data_body(der_bytes)?;

    // certificates [0] IMPLICIT follows version, digestAlgorithms and
    // encapContentInfo; signerInfos are never looked into.
    let mut rest = signed_data;
    let mut certificate_set = None;
    while !rest.is_empty() {
        let (field, next) = read_element(rest, "SignedData field")?;
        if field.is_context(0) {
            certificate_set = Some(field);
            break;
        }
        rest = next;
    }

    let certificates: Vec<Vec<u8>> = match certificate_set {
        Some(set) => read_all(set.content, "certificate")?
            .into_iter()
            .map(|cert| cert.encoded.to_vec())
            .collect(),
        None => Vec::new(),
    };

    if certificates.is_empty() {
        return Err(unsupported("signature present but no certificate embedded"));
    }
    debug!("SignedData embeds {} certificate(s)", certificates.len());
    Ok(certificates)
}

/// Content octets of the SignedData SEQUENCE inside
/// `ContentInfo ::= SEQUENCE { contentType, [0] EXPLICIT content }`.
fn signed_data_body(der_bytes: &[u8]) -> Result<&[u8]> {
    if der_bytes.is_empty() {
        return Err(unsupported("empty signature container"));
    }

    let (content_info, _) = read_element(der_bytes, "ContentInfo")?;
    if !content_info.is_universal(Tag::Sequence) {
        return Err(unsupported("ContentInfo is not a SEQUENCE"));
    }

    let (content_type, rest) = read_element(content_info.content, "contentType")?;
    if !content_type.is_universal(Tag::Oid) {
        return Err(unsupported("ContentInfo has no contentType"));
    }
    if content_type.content != SIGNED_DATA_OID {
        return Err(unsupported("contentType is not signedData"));
    }

    let (wrapper, _) = read_element(rest, "ContentInfo content")?;
    if !wrapper.is_context(0) {
        return Err(unsupported("signedData content is not tagged [0]"));
    }

    let (signed_data, _) = read_element(wrapper.content, "SignedData")?;
    if !signed_data.is_universal(Tag::Sequence) {
        return Err(unsupported("SignedData is not a SEQUENCE"));
    }
    Ok(signed_data.content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::fixtures;
    use simple_asn1::{oid, ASN1Block};

    #[test]
    fn trim_removes_only_trailing_zeros() {
        assert_eq!(trim_trailing_zeros(&[0x30, 0x00, 0x05, 0x00, 0x00]), &[0x30, 0x00, 0x05]);
        assert_eq!(trim_trailing_zeros(&[0x00, 0x01]), &[0x00, 0x01]);
        assert_eq!(trim_trailing_zeros(&[0x00, 0x00, 0x00]), &[] as &[u8]);
        assert_eq!(trim_trailing_zeros(&[]), &[] as &[u8]);
    }

    #[test]
    fn trim_is_idempotent() {
        let padded = [0x30, 0x03, 0x02, 0x01, 0x07, 0x00, 0x00];
        let once = trim_trailing_zeros(&padded);
        assert_eq!(trim_trailing_zeros(once), once);
        assert_eq!(once.last(), Some(&0x07));
    }

    #[test]
    fn single_certificate_bytes_are_untouched() {
        let cert = fixtures::signer_certificate();
        let container = fixtures::signed_data(&[cert.clone()]);

        let certs = parse_signed_data(&container).unwrap();
        assert_eq!(certs, vec![cert]);
    }

    #[test]
    fn certificate_chain_keeps_order() {
        let signer = fixtures::signer_certificate();
        let ca = fixtures::ca_certificate();
        let container = fixtures::signed_data(&[signer.clone(), ca.clone(), signer.clone()]);

        let certs = parse_signed_data(&container).unwrap();
        assert_eq!(certs, vec![signer.clone(), ca, signer]);
    }

    #[test]
    fn signer_info_strings_are_not_decoded() {
        let cert = fixtures::signer_certificate();

        let ampersand = fixtures::signed_data_with_signer_issuer(
            &[cert.clone()],
            fixtures::printable("Example&Issuing CA"),
        );
        assert_eq!(parse_signed_data(&ampersand).unwrap(), vec![cert.clone()]);

        let latin1 = fixtures::signed_data_with_signer_issuer(
            &[cert.clone()],
            fixtures::teletex_bytes(b"Tra\xe1 Issuing CA"),
        );
        assert_eq!(parse_signed_data(&latin1).unwrap(), vec![cert]);
    }

    #[test]
    fn no_certificates_embedded() {
        let container = fixtures::signed_data(&[]);
        let err = parse_signed_data(&container).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSignatureFormat);
    }

    #[test]
    fn not_signed_data() {
        let container = fixtures::content_info(
            oid!(1, 2, 840, 113549, 1, 7, 1),
            ASN1Block::OctetString(0, b"hello".to_vec()),
        );
        let err = parse_signed_data(&container).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSignatureFormat);
    }

    #[test]
    fn empty_and_garbage_input() {
        assert_eq!(
            parse_signed_data(&[]).unwrap_err().kind(),
            ErrorKind::UnsupportedSignatureFormat
        );
        assert_eq!(
            parse_signed_data(b"not asn.1 at all").unwrap_err().kind(),
            ErrorKind::UnsupportedSignatureFormat
        );
    }

    #[test]
    fn truncated_container_is_rejected() {
        let container = fixtures::signed_data(&[fixtures::signer_certificate()]);
        let err = parse_signed_data(&container[..container.len() / 2]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSignatureFormat);
    }

    #[test]
    fn truncated_certificate_set_is_rejected() {
        let cert = fixtures::signer_certificate();
        let err = read_all(&cert[..cert.len() - 3], "certificate").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnsupportedSignatureFormat);
    }
}
