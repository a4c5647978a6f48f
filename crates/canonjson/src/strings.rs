//! Canonical string formatting.
//!
//! Emits a JSON string literal with minimal escaping: only what JSON
//! syntax forbids is escaped, everything else travels as raw UTF-8.
//! Ill-formed input bytes are coerced to U+FFFD so the output always
//! round-trips as valid UTF-8.

/// Replacement emitted for each ill-formed input byte.
const REPLACEMENT: &[u8] = "\u{FFFD}".as_bytes();

/// Appends `"..."` for the given bytes. Object keys use the same
/// encoding; their encoded bytes double as the member sort key.
pub(crate) fn append_string(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.push(b'"');
    for chunk in bytes.utf8_chunks() {
        append_fragment(buf, chunk.valid());
        // one replacement per ill-formed byte, matching byte-at-a-time
        // decoding
        for _ in chunk.invalid() {
            buf.extend_from_slice(REPLACEMENT);
        }
    }
    buf.push(b'"');
}

fn append_fragment(buf: &mut Vec<u8>, text: &str) {
    for ch in text.chars() {
        match ch {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\u{0008}' => buf.extend_from_slice(b"\\b"),
            '\t' => buf.extend_from_slice(b"\\t"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\u{000C}' => buf.extend_from_slice(b"\\f"),
            '\r' => buf.extend_from_slice(b"\\r"),
            ch if ch < '\u{0020}' => {
                buf.extend_from_slice(format!("\\u{:04X}", ch as u32).as_bytes());
            }
            ch => {
                let mut encoded = [0u8; 4];
                buf.extend_from_slice(ch.encode_utf8(&mut encoded).as_bytes());
            }
        }
    }
}
