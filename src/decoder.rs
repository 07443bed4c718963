use encoding_rs::Encoding;
use tracing::{debug, warn};

/// Decode a response body to text using the resolved charset.
///
/// Unknown charsets fall back to UTF-8, as does a missing declaration.
/// Malformed byte sequences are replaced rather than rejected, so this
/// never fails.
pub fn decode_body(body: &[u8], charset: Option<&str>) -> String {
    let Some(charset) = charset else {
        return String::from_utf8_lossy(body).into_owned();
    };

    match encoding_for(charset) {
        Some(encoding) => {
            let (text, used, had_errors) = encoding.decode(body);
            debug!(
                charset = charset,
                encoding = used.name(),
                had_errors,
                "Decoded body"
            );
            text.into_owned()
        }
        None => {
            warn!(charset = charset, "Unsupported charset, falling back to UTF-8");
            String::from_utf8_lossy(body).into_owned()
        }
    }
}

/// Look up a decoder by charset name.
///
/// `windows-NNN` names that are not registered labels on their own are
/// retried under their `msNNN` spelling.
pub fn encoding_for(charset: &str) -> Option<&'static Encoding> {
    Encoding::for_label(charset.as_bytes()).or_else(|| {
        charset
            .strip_prefix("windows-")
            .and_then(|code| Encoding::for_label(format!("ms{code}").as_bytes()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_949_decodes_korean() {
        // "안녕" in EUC-KR / windows-949
        let bytes = [0xBE, 0xC8, 0xB3, 0xE7];
        assert_eq!(decode_body(&bytes, Some("windows-949")), "안녕");
    }

    #[test]
    fn test_windows_932_uses_shift_jis() {
        // "日本" in Shift_JIS
        let bytes = [0x93, 0xFA, 0x96, 0x7B];
        assert_eq!(decode_body(&bytes, Some("windows-932")), "日本");
    }

    #[test]
    fn test_unknown_charset_falls_back_to_utf8() {
        assert_eq!(decode_body("héllo".as_bytes(), Some("x-no-such-charset")), "héllo");
    }

    #[test]
    fn test_no_charset_is_utf8_and_lossy() {
        assert_eq!(decode_body("ok ✓".as_bytes(), None), "ok ✓");
        assert_eq!(decode_body(&[b'a', 0xFF, b'b'], None), "a\u{FFFD}b");
    }

    #[test]
    fn test_latin1_declared() {
        assert_eq!(decode_body(&[0x63, 0x61, 0x66, 0xE9], Some("iso-8859-1")), "café");
    }
}
