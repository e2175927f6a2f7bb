//! Comment detection for call-site source text.
//!
//! A call carrying a comment likely holds context a mechanical rewrite would
//! destroy, so the engine can be told to leave it alone.

/// Returns true if `text` contains a `//` or `/* */` comment outside of
/// string, char and text-block literals.
pub fn contains_comments(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'/' if matches!(bytes.get(i + 1), Some(b'/') | Some(b'*')) => return true,
            b'"' if bytes[i..].starts_with(b"\"\"\"") => {
                i = skip_text_block(bytes, i + 3);
            }
            quote @ (b'"' | b'\'') => {
                i = skip_quoted(bytes, i + 1, quote);
            }
            _ => i += 1,
        }
    }
    false
}

/// Skip past the closing `quote`, honoring backslash escapes.
fn skip_quoted(bytes: &[u8], mut i: usize, quote: u8) -> usize {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            b'\n' => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn skip_text_block(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        if bytes[i] == b'\\' {
            i += 2;
        } else if bytes[i..].starts_with(b"\"\"\"") {
            return i + 3;
        } else {
            i += 1;
        }
    }
    bytes.len()
}
