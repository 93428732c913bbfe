//! Legacy percent-escape dialect expected by the `webservicemin` decoder.
//!
//! Escaping works on UTF-16 code units, so characters outside the BMP come out
//! as two `%uXXXX` surrogate escapes.

use std::fmt::Write as _;

/// Escapes `text` with the legacy dialect:
/// ASCII alphanumerics and `*+-./@_` pass through, other units up to `0xFF`
/// become `%XX`, wider units become `%uXXXX` (uppercase hex).
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for unit in text.encode_utf16() {
        match u8::try_from(unit) {
            Ok(byte) if is_unreserved(byte) => out.push(char::from(byte)),
            Ok(byte) => {
                let _ = write!(out, "%{byte:02X}");
            }
            Err(_) => {
                let _ = write!(out, "%u{unit:04X}");
            }
        }
    }
    out
}

/// Escapes a stimulus or context line for the request body.
///
/// When the first pass produced any `%u` escape, each `%u` is folded to `|`
/// and the result is escaped a second time. The service decodes the
/// double-escaped form; sending the single pass breaks non-Latin-1 input.
#[must_use]
pub fn encode_stimulus(text: &str) -> String {
    let escaped = escape(text);
    if escaped.contains("%u") {
        escape(&escaped.replace("%u", "|"))
    } else {
        escaped
    }
}

fn is_unreserved(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || matches!(byte, b'*' | b'+' | b'-' | b'.' | b'/' | b'@' | b'_')
}
