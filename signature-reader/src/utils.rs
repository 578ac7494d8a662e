use log::debug;
use x509_parser::der_parser::asn1_rs::Tag;

/// Repairs certificate text that was UTF-8 once but got read back one byte
/// per character (`"Nguyá»…n"` instead of `"Nguyễn"`).
///
/// Plain ASCII is only trimmed. Anything else is reinterpreted as single
/// bytes and decoded as UTF-8; when that fails the original string is
/// returned untouched.
///
/// This is a heuristic: legitimately exotic Latin-1 text that happens to form
/// valid UTF-8 will be "repaired" too. Double-encoded UTF-8 is by far the
/// more common case in these fields.
pub fn normalize_text(value: &str) -> String {
    if value.is_ascii() {
        return value.trim().to_string();
    }

    let repaired = latin1_bytes(value).and_then(|bytes| String::from_utf8(bytes).ok());
    match repaired {
        Some(text) => text.trim().to_string(),
        None => {
            debug!("keeping attribute value as decoded: {:?}", value);
            value.to_string()
        }
    }
}

/// The single-byte encoding of `value`, if every char fits in one byte.
fn latin1_bytes(value: &str) -> Option<Vec<u8>> {
    value.chars().map(|c| u8::try_from(c).ok()).collect()
}

/// One char per byte.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

/// Decodes the content octets of an ASN.1 string value.
///
/// UTF8String is decoded as UTF-8, BMPString and UniversalString as
/// big-endian UTF-16/UTF-32. Every other type (Printable, IA5, Teletex...)
/// is taken one char per byte, which is what [`normalize_text`] expects.
pub fn decode_string_value(tag: Tag, data: &[u8]) -> String {
    match tag {
        Tag::Utf8String => match std::str::from_utf8(data) {
            Ok(text) => text.to_string(),
            Err(_) => latin1_to_string(data),
        },
        Tag::BmpString => char::decode_utf16(
            data.chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]])),
        )
        .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect(),
        Tag::UniversalString => data
            .chunks_exact(4)
            .map(|quad| {
                char::from_u32(u32::from_be_bytes([quad[0], quad[1], quad[2], quad[3]]))
                    .unwrap_or(char::REPLACEMENT_CHARACTER)
            })
            .collect(),
        _ => latin1_to_string(data),
    }
}
