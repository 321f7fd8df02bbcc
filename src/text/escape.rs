use std::borrow::Cow;

use memchr::memchr;

use crate::{Error, Result};

#[inline]
fn escape_for(byte: u8) -> Option<&'static str> {
    match byte {
        0x08 => Some("\\b"),
        0x0c => Some("\\f"),
        b'\r' => Some("\\r"),
        b'\n' => Some("\\n"),
        b'\t' => Some("\\t"),
        b'"' => Some("\\\""),
        b'\\' => Some("\\\\"),
        _ => None,
    }
}

/// Appends `value` with JSON escapes applied, without surrounding quotes.
pub fn escape_into(out: &mut String, value: &str) {
    let bytes = value.as_bytes();
    let mut start = 0;
    for (idx, &byte) in bytes.iter().enumerate() {
        let Some(escaped) = escape_for(byte) else {
            continue;
        };
        if start < idx {
            out.push_str(&value[start..idx]);
        }
        out.push_str(escaped);
        start = idx + 1;
    }
    if start < value.len() {
        out.push_str(&value[start..]);
    }
}

/// Quotes and escapes a string for JSON output, e.g. `ha"s\` becomes
/// `"ha\"s\\"`.
pub fn escape_json_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    escape_into(&mut out, value);
    out.push('"');
    out
}

fn strip_quotes(token: &str) -> Result<&str> {
    let bytes = token.as_bytes();
    if bytes.len() < 2 || bytes[0] != b'"' || bytes[bytes.len() - 1] != b'"' {
        return Err(Error::Unquoted {
            token: token.to_string(),
        });
    }
    Ok(&token[1..token.len() - 1])
}

fn unescape_into(out: &mut String, content: &str) -> Result<()> {
    let bytes = content.as_bytes();
    let mut start = 0;
    let mut idx = 0;
    while let Some(found) = memchr(b'\\', &bytes[idx..]) {
        let slash = idx + found;
        out.push_str(&content[start..slash]);
        let Some(&next) = bytes.get(slash + 1) else {
            // a lone trailing backslash is kept as-is
            out.push('\\');
            return Ok(());
        };
        let decoded = match next {
            b'b' => '\u{8}',
            b'f' => '\u{c}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            _ => {
                let escape = content[slash + 1..].chars().next().unwrap_or('\\');
                return Err(Error::UnknownEscape {
                    escape,
                    // +1 for the opening quote that was stripped
                    offset: slash + 1,
                });
            }
        };
        out.push(decoded);
        idx = slash + 2;
        start = idx;
    }
    out.push_str(&content[start..]);
    Ok(())
}

/// Inverse of [`escape_json_string`]. `token` must start and end with `"`.
pub fn unescape_json_string(token: &str) -> Result<String> {
    let content = strip_quotes(token)?;
    let mut out = String::with_capacity(content.len());
    unescape_into(&mut out, content)?;
    Ok(out)
}

/// Like [`unescape_json_string`] but borrows when nothing needs decoding.
pub fn unescape_json_str(token: &str) -> Result<Cow<'_, str>> {
    let content = strip_quotes(token)?;
    if memchr(b'\\', content.as_bytes()).is_none() {
        return Ok(Cow::Borrowed(content));
    }
    let mut out = String::with_capacity(content.len());
    unescape_into(&mut out, content)?;
    Ok(Cow::Owned(out))
}

/// Length of the JSON escape starting at `bytes[0] == b'\\'`, or `None` if
/// JSON does not allow it. `\uXXXX` counts even though it is never decoded.
fn json_escape_len(bytes: &[u8]) -> Option<usize> {
    match bytes.get(1)? {
        b'b' | b'f' | b'n' | b'r' | b't' | b'"' | b'\\' | b'/' => Some(2),
        b'u' if bytes.len() >= 6 && bytes[2..6].iter().all(u8::is_ascii_hexdigit) => Some(6),
        _ => None,
    }
}

/// Checks that `token` is quoted and every escape in it is one JSON allows.
pub fn check_json_str(token: &str) -> Result<()> {
    let content = strip_quotes(token)?;
    let bytes = content.as_bytes();
    let mut idx = 0;
    while let Some(found) = memchr(b'\\', &bytes[idx..]) {
        let slash = idx + found;
        if slash + 1 == bytes.len() {
            // the closing quote is escaped
            return Err(Error::Unquoted {
                token: token.to_string(),
            });
        }
        let Some(len) = json_escape_len(&bytes[slash..]) else {
            return Err(Error::UnknownEscape {
                escape: content[slash + 1..].chars().next().unwrap_or('\\'),
                offset: slash + 1,
            });
        };
        idx = slash + len;
    }
    Ok(())
}

/// Appends the content of a string token as valid JSON, without quotes.
/// Escapes JSON allows are copied, any other backslash is doubled and raw
/// line breaks and tabs are escaped.
pub fn reescape_into(out: &mut String, content: &str) {
    let bytes = content.as_bytes();
    let mut start = 0;
    let mut idx = 0;
    while idx < bytes.len() {
        let byte = bytes[idx];
        let (replacement, skip) = if byte == b'\\' {
            match json_escape_len(&bytes[idx..]) {
                Some(len) => (None, len),
                None => (Some("\\\\"), 1),
            }
        } else if byte == b'"' {
            (Some("\\\""), 1)
        } else if byte < 0x20 {
            (escape_for(byte), 1)
        } else {
            (None, 1)
        };
        if let Some(replacement) = replacement {
            out.push_str(&content[start..idx]);
            out.push_str(replacement);
            start = idx + skip;
        }
        idx += skip;
    }
    out.push_str(&content[start..]);
}
