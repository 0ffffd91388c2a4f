//! Encoded log lines.
//!
//! Log files may store each line as the marker `E` followed by the base64 of
//! the UTF-8 line, so the file is not readable as plain text. Decoding is
//! lenient: a line that starts with the marker but does not decode to UTF-8
//! text is treated as an ordinary line.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::borrow::Cow;

/// First byte of an encoded line
pub const ENCODED_MARKER: char = 'E';

/// Check whether a line carries the encoding marker
pub fn is_encoded(line: &str) -> bool {
    line.starts_with(ENCODED_MARKER)
}

/// Encode a plain line for storage
pub fn encode_line(line: &str) -> String {
    let mut encoded = String::with_capacity(1 + line.len().div_ceil(3) * 4);
    encoded.push(ENCODED_MARKER);
    STANDARD.encode_string(line.as_bytes(), &mut encoded);
    encoded
}

/// Decode a stored line, returning `None` if it is not an encoded line
pub fn decode_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix(ENCODED_MARKER)?;
    let bytes = STANDARD.decode(payload.trim_end()).ok()?;
    String::from_utf8(bytes).ok()
}

/// Decode when possible, otherwise hand back the line untouched
pub fn decode_or_keep(line: &str) -> Cow<'_, str> {
    if !is_encoded(line) {
        return Cow::Borrowed(line);
    }
    match decode_line(line) {
        Some(decoded) => Cow::Owned(decoded),
        None => Cow::Borrowed(line),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let line = "2024-09-17 21:31:40.175 INFO MyClass::run >> started";
        let encoded = encode_line(line);
        assert!(encoded.starts_with('E'));
        assert!(!encoded.contains(' '));
        assert_eq!(decode_line(&encoded).as_deref(), Some(line));
    }

    #[test]
    fn test_plain_line_starting_with_marker() {
        // "Error..." starts with 'E' but is not base64
        let line = "Error: something broke";
        assert_eq!(decode_line(line), None);
        assert_eq!(decode_or_keep(line), line);
    }

    #[test]
    fn test_unmarked_line_is_borrowed() {
        assert!(matches!(decode_or_keep("hello"), Cow::Borrowed("hello")));
    }
}
