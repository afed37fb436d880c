//! Codepage handling for member names and comments.
//!
//! RFC 1952 specifies ISO 8859-1 for names and comments, but files produced
//! on other systems often carry their local codepage. The encoding is
//! therefore configurable; the default follows the RFC (decoded as
//! windows-1252, the WHATWG superset of ISO 8859-1).

use encoding_rs::Encoding;
use oxigz_core::error::{OxiGzError, Result};

/// Codepage used when none is configured.
pub fn default_codepage() -> &'static Encoding {
    encoding_rs::WINDOWS_1252
}

/// Decode raw header bytes. Malformed sequences become U+FFFD.
pub fn decode(bytes: &[u8], codepage: &'static Encoding) -> String {
    let (text, _had_errors) = codepage.decode_without_bom_handling(bytes);
    text.into_owned()
}

/// Look up a codepage by label, e.g. `"utf-8"`, `"latin1"` or `"shift_jis"`.
pub fn from_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| OxiGzError::invalid_argument(format!("unsupported codepage: {}", label)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxigz_core::ErrorKind;

    #[test]
    fn test_default_is_latin1_compatible() {
        assert_eq!(decode(b"na\xEFve", default_codepage()), "na\u{ef}ve");
    }

    #[test]
    fn test_shift_jis() {
        let codepage = from_label("shift_jis").unwrap();
        assert_eq!(decode(&[0x82, 0xA0], codepage), "\u{3042}");
    }

    #[test]
    fn test_unknown_label() {
        let err = from_label("no-such-codepage").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }
}
