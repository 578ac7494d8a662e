//! Synthetic PKCS#7 containers and signed PDFs for tests.
//!
//! Everything here is built with `simple_asn1::to_der`; certificates carry
//! a throwaway RSA key and a dummy signature value, which is enough for
//! metadata extraction since nothing is verified.

use simple_asn1::{oid, to_der, ASN1Block, ASN1Class, BigInt, BigUint, OID};
use time::macros::datetime;
use time::PrimitiveDateTime;

pub const SIGNER_CN: &str = "Nguyễn Văn An";
pub const SIGNER_ORG: &str = "Example Signing Co";
pub const CA_CN: &str = "Example Issuing CA";
pub const ROOT_CN: &str = "Example Root CA";

pub fn common_name() -> OID {
    oid!(2, 5, 4, 3)
}

pub fn country() -> OID {
    oid!(2, 5, 4, 6)
}

pub fn locality() -> OID {
    oid!(2, 5, 4, 7)
}

pub fn organization() -> OID {
    oid!(2, 5, 4, 10)
}

pub fn organizational_unit() -> OID {
    oid!(2, 5, 4, 11)
}

/// `id-pkcs9-at-unstructuredName`, no short name.
pub fn unstructured_name() -> OID {
    oid!(1, 2, 840, 113549, 1, 9, 2)
}

pub fn utf8(value: &str) -> ASN1Block {
    ASN1Block::UTF8String(0, value.to_string())
}

pub fn printable(value: &str) -> ASN1Block {
    ASN1Block::PrintableString(0, value.to_string())
}

/// TeletexString carrying `bytes` as they are, e.g. Latin-1 text.
pub fn teletex_bytes(bytes: &[u8]) -> ASN1Block {
    ASN1Block::Unknown(ASN1Class::Universal, false, 0, BigUint::from(20u8), bytes.to_vec())
}

/// UTF-8 text whose bytes were read back one byte per character.
pub fn mis_encoded(value: &str) -> String {
    value.bytes().map(char::from).collect()
}

/// `Name ::= SEQUENCE OF SET OF AttributeTypeAndValue`, one attribute per RDN.
pub fn name(attrs: &[(OID, ASN1Block)]) -> ASN1Block {
    let rdns = attrs
        .iter()
        .map(|(oid, value)| {
            ASN1Block::Set(
                0,
                vec![ASN1Block::Sequence(
                    0,
                    vec![ASN1Block::ObjectIdentifier(0, oid.clone()), value.clone()],
                )],
            )
        })
        .collect();
    ASN1Block::Sequence(0, rdns)
}

fn algorithm(oid: OID) -> ASN1Block {
    ASN1Block::Sequence(0, vec![ASN1Block::ObjectIdentifier(0, oid), ASN1Block::Null(0)])
}

fn rsa_public_key(serial: u64) -> ASN1Block {
    let modulus = (BigInt::from(1u8) << 1023usize) + BigInt::from(serial * 2 + 1);
    let key = ASN1Block::Sequence(
        0,
        vec![
            ASN1Block::Integer(0, modulus),
            ASN1Block::Integer(0, BigInt::from(65537u32)),
        ],
    );
    let key_der = to_der(&key).expect("encode RSAPublicKey");
    ASN1Block::Sequence(
        0,
        vec![
            algorithm(oid!(1, 2, 840, 113549, 1, 1, 1)),
            ASN1Block::BitString(0, key_der.len() * 8, key_der),
        ],
    )
}

#[derive(Debug, Clone)]
pub struct CertificateBuilder {
    serial: u64,
    subject: Vec<(OID, ASN1Block)>,
    issuer: Vec<(OID, ASN1Block)>,
    not_before: PrimitiveDateTime,
    not_after: PrimitiveDateTime,
}

impl CertificateBuilder {
    pub fn new(serial: u64) -> Self {
        Self {
            serial,
            subject: Vec::new(),
            issuer: Vec::new(),
            not_before: datetime!(2020-01-01 0:00),
            not_after: datetime!(2049-12-31 23:59:59),
        }
    }

    pub fn subject(mut self, oid: OID, value: ASN1Block) -> Self {
        self.subject.push((oid, value));
        self
    }

    pub fn issuer(mut self, oid: OID, value: ASN1Block) -> Self {
        self.issuer.push((oid, value));
        self
    }

    pub fn validity(mut self, not_before: PrimitiveDateTime, not_after: PrimitiveDateTime) -> Self {
        self.not_before = not_before;
        self.not_after = not_after;
        self
    }

    pub fn build(&self) -> ASN1Block {
        let sha256_with_rsa = oid!(1, 2, 840, 113549, 1, 1, 11);
        let tbs = ASN1Block::Sequence(
            0,
            vec![
                ASN1Block::Explicit(
                    ASN1Class::ContextSpecific,
                    0,
                    BigUint::from(0u8),
                    Box::new(ASN1Block::Integer(0, BigInt::from(2u8))),
                ),
                ASN1Block::Integer(0, BigInt::from(self.serial)),
                algorithm(sha256_with_rsa.clone()),
                name(&self.issuer),
                ASN1Block::Sequence(
                    0,
                    vec![
                        ASN1Block::UTCTime(0, self.not_before),
                        ASN1Block::UTCTime(0, self.not_after),
                    ],
                ),
                name(&self.subject),
                rsa_public_key(self.serial),
            ],
        );
        ASN1Block::Sequence(
            0,
            vec![
                tbs,
                algorithm(sha256_with_rsa),
                ASN1Block::BitString(0, 64 * 8, vec![0x5a; 64]),
            ],
        )
    }

    pub fn to_der(&self) -> Vec<u8> {
        to_der(&self.build()).expect("encode certificate")
    }
}

/// End-entity certificate whose subject CN is [`SIGNER_CN`].
pub fn signer_certificate() -> Vec<u8> {
    CertificateBuilder::new(0x1001)
        .subject(country(), printable("VN"))
        .subject(organization(), utf8(SIGNER_ORG))
        .subject(common_name(), utf8(SIGNER_CN))
        .issuer(country(), printable("VN"))
        .issuer(organization(), utf8("Example Trust Services"))
        .issuer(common_name(), utf8(CA_CN))
        .to_der()
}

/// Intermediate certificate that issued [`signer_certificate`].
pub fn ca_certificate() -> Vec<u8> {
    CertificateBuilder::new(0x0002)
        .subject(country(), printable("VN"))
        .subject(organization(), utf8("Example Trust Services"))
        .subject(common_name(), utf8(CA_CN))
        .issuer(country(), printable("VN"))
        .issuer(common_name(), utf8(ROOT_CN))
        .validity(datetime!(2015-06-01 0:00), datetime!(2045-06-01 0:00))
        .to_der()
}

/// `ContentInfo` wrapping a detached `SignedData` that embeds `certificates`.
///
/// The certificate set is omitted when `certificates` is empty. A single
/// SignerInfo closes the structure, so the encoding never ends in a zero byte.
pub fn signed_data(certificates: &[Vec<u8>]) -> Vec<u8> {
    signed_data_with_signer_issuer(certificates, utf8(CA_CN))
}

/// Like [`signed_data`], with `issuer_cn` as the CN in the SignerInfo's
/// issuerAndSerialNumber.
pub fn signed_data_with_signer_issuer(certificates: &[Vec<u8>], issuer_cn: ASN1Block) -> Vec<u8> {
    let mut fields = vec![
        ASN1Block::Integer(0, BigInt::from(1u8)),
        ASN1Block::Set(0, vec![algorithm(oid!(2, 16, 840, 1, 101, 3, 4, 2, 1))]),
        ASN1Block::Sequence(
            0,
            vec![ASN1Block::ObjectIdentifier(0, oid!(1, 2, 840, 113549, 1, 7, 1))],
        ),
    ];
    if !certificates.is_empty() {
        // certificates [0] IMPLICIT SET OF Certificate
        fields.push(ASN1Block::Unknown(
            ASN1Class::ContextSpecific,
            true,
            0,
            BigUint::from(0u8),
            certificates.concat(),
        ));
    }
    fields.push(ASN1Block::Set(0, vec![signer_info(issuer_cn)]));

    content_info(oid!(1, 2, 840, 113549, 1, 7, 2), ASN1Block::Sequence(0, fields))
}

fn signer_info(issuer_cn: ASN1Block) -> ASN1Block {
    let issuer_and_serial = ASN1Block::Sequence(
        0,
        vec![
            name(&[(common_name(), issuer_cn)]),
            ASN1Block::Integer(0, BigInt::from(0x1001u32)),
        ],
    );
    ASN1Block::Sequence(
        0,
        vec![
            ASN1Block::Integer(0, BigInt::from(1u8)),
            issuer_and_serial,
            algorithm(oid!(2, 16, 840, 1, 101, 3, 4, 2, 1)),
            algorithm(oid!(1, 2, 840, 113549, 1, 1, 1)),
            ASN1Block::OctetString(0, vec![0xa5; 128]),
        ],
    )
}

pub fn content_info(content_type: OID, content: ASN1Block) -> Vec<u8> {
    let info = ASN1Block::Sequence(
        0,
        vec![
            ASN1Block::ObjectIdentifier(0, content_type),
            ASN1Block::Explicit(
                ASN1Class::ContextSpecific,
                0,
                BigUint::from(0u8),
                Box::new(content),
            ),
        ],
    );
    to_der(&info).expect("encode ContentInfo")
}

/// A minimal PDF with one signature field holding `container`, followed by
/// `padding` zero bytes in the `/Contents` placeholder.
///
/// The ByteRange covers the whole file except the `<...>` placeholder.
pub fn signed_pdf(container: &[u8], padding: usize) -> Vec<u8> {
    let mut head = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n".to_vec();
    head.extend_from_slice(b"1 0 obj\n<< /Type /Catalog /Pages 2 0 R >>\nendobj\n");
    head.extend_from_slice(b"3 0 obj\n<< /Type /Page /Parent 2 0 R /Contents 4 0 R >>\nendobj\n");
    head.extend_from_slice(b"4 0 obj\n<< /Length 7 >>\nstream\n\x00\x9f\xff\x80ByR\nendstream\nendobj\n");
    head.extend_from_slice(
        b"5 0 obj\n<< /Type /Sig /Filter /Adobe.PPKLite /SubFilter /adbe.pkcs7.detached /Contents ",
    );

    let mut placeholder = format!("<{}", hex::encode_upper(container));
    placeholder.push_str(&"0".repeat(padding * 2));
    placeholder.push('>');

    let tail = |range: [usize; 4]| {
        format!(
            " /ByteRange [{:<10} {:<10} {:<10} {:<10}] /M (D:20240315093000+07'00') >>\nendobj\ntrailer\n<< /Root 1 0 R >>\n%%EOF\n",
            range[0], range[1], range[2], range[3]
        )
    };

    let gap_start = head.len();
    let gap_end = gap_start + placeholder.len();
    let total = gap_end + tail([0; 4]).len();

    let mut pdf = head;
    pdf.extend_from_slice(placeholder.as_bytes());
    pdf.extend_from_slice(tail([0, gap_start, gap_end, total - gap_end]).as_bytes());
    pdf
}
