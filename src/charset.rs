//! Output character encodings.

use encoding_rs::WINDOWS_1252;
use log::warn;
use serde::Deserialize;

/// Byte encoding of rendered documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Charset {
    /// Western single-byte code page, declared as `CHARSET:1252`.
    #[default]
    #[serde(rename = "windows-1252", alias = "1252", alias = "cp1252")]
    Windows1252,
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
}

impl Charset {
    /// Value of the `ENCODING` header field.
    pub fn header_encoding(&self) -> &'static str {
        match self {
            Charset::Windows1252 => "USASCII",
            Charset::Utf8 => "UTF-8",
        }
    }

    /// Value of the `CHARSET` header field.
    pub fn header_charset(&self) -> &'static str {
        match self {
            Charset::Windows1252 => "1252",
            Charset::Utf8 => "NONE",
        }
    }

    /// Encodes `text`, replacing characters the charset cannot carry with `?`.
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Charset::Utf8 => text.as_bytes().to_vec(),
            Charset::Windows1252 => {
                let (bytes, _, unmappable) = WINDOWS_1252.encode(text);
                if !unmappable {
                    return bytes.into_owned();
                }
                encode_with_substitution(text)
            }
        }
    }
}

/// Slow path: encodes char by char so unmappable ones become `?` rather
/// than numeric character references.
fn encode_with_substitution(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len());
    let mut replaced = 0usize;
    let mut buf = [0u8; 4];

    for c in text.chars() {
        let (bytes, _, unmappable) = WINDOWS_1252.encode(c.encode_utf8(&mut buf));
        if unmappable {
            replaced += 1;
            out.push(b'?');
        } else {
            out.extend_from_slice(&bytes);
        }
    }

    warn!(
        "Replaced {} character(s) not representable in windows-1252",
        replaced
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_byte_accents() {
        let bytes = Charset::Windows1252.encode("Padaria São João");
        assert_eq!(bytes.len(), "Padaria São João".chars().count());
        assert_eq!(bytes[9], 0xE3);
    }

    #[test]
    fn test_code_page_punctuation_keeps_its_bytes() {
        let bytes = Charset::Windows1252.encode("Taxa €5 “cartão” – loja…");
        assert_eq!(bytes[5], 0x80);
        assert_eq!(bytes[8], 0x93);
        assert_eq!(bytes[15], 0x94);
        assert_eq!(bytes[17], 0x96);
        assert_eq!(*bytes.last().unwrap(), 0x85);
        assert!(!bytes.contains(&b'?'));
    }

    #[test]
    fn test_replaces_unmappable() {
        assert_eq!(Charset::Windows1252.encode("a€b✓c"), b"a\x80b?c".to_vec());
        assert_eq!(Charset::Windows1252.encode("日本"), b"??".to_vec());
    }

    #[test]
    fn test_utf8_passthrough() {
        assert_eq!(Charset::Utf8.encode("São €"), "São €".as_bytes().to_vec());
    }

    #[test]
    fn test_header_fields_follow_charset() {
        assert_eq!(Charset::Windows1252.header_charset(), "1252");
        assert_eq!(Charset::Windows1252.header_encoding(), "USASCII");
        assert_eq!(Charset::Utf8.header_charset(), "NONE");
        assert_eq!(Charset::Utf8.header_encoding(), "UTF-8");
    }
}
