// ABOUTME: Growable JSON output buffer used by the transcoder.
// ABOUTME: Handles pre-sizing, string escaping, and container punctuation.

use std::fmt::Display;
use std::io::Write;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Escape table: 0 means the byte is copied as-is, `u` means `\u00XX`,
/// anything else is the character following the backslash.
static ESCAPE: [u8; 256] = {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 0x20 {
        table[i] = b'u';
        i += 1;
    }
    table[b'\n' as usize] = b'n';
    table[b'\t' as usize] = b't';
    table[b'\r' as usize] = b'r';
    table[0x08] = b'b';
    table[0x0c] = b'f';
    table[b'"' as usize] = b'"';
    table[b'\\' as usize] = b'\\';
    table
};

/// A JSON text buffer under construction.
pub(crate) struct JsonWriter {
    buf: Vec<u8>,
}

impl JsonWriter {
    /// Create a writer whose buffer reserves `min(hint, ceiling)` bytes up front.
    pub(crate) fn with_capacity_hint(hint: usize, ceiling: usize) -> Self {
        Self {
            buf: Vec::with_capacity(hint.min(ceiling)),
        }
    }

    #[inline]
    pub(crate) fn write_byte(&mut self, byte: u8) {
        self.buf.push(byte);
    }

    #[inline]
    pub(crate) fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Separator written before every container member except the first.
    #[inline]
    pub(crate) fn write_comma(&mut self) {
        self.buf.push(b',');
    }

    /// Write an object key: the quoted, escaped name followed by a colon.
    #[inline]
    pub(crate) fn write_key(&mut self, name: &str) {
        self.write_str(name);
        self.buf.push(b':');
    }

    /// Write a quoted string, escaping quotes, backslashes, and control characters.
    pub(crate) fn write_str(&mut self, s: &str) {
        let bytes = s.as_bytes();
        self.buf.reserve(bytes.len() + 2);
        self.buf.push(b'"');

        let mut start = 0;
        for (i, &byte) in bytes.iter().enumerate() {
            let escape = ESCAPE[byte as usize];
            if escape == 0 {
                continue;
            }
            if start < i {
                self.buf.extend_from_slice(&bytes[start..i]);
            }
            if escape == b'u' {
                self.buf.extend_from_slice(&[
                    b'\\',
                    b'u',
                    b'0',
                    b'0',
                    HEX_DIGITS[(byte >> 4) as usize],
                    HEX_DIGITS[(byte & 0x0f) as usize],
                ]);
            } else {
                self.buf.extend_from_slice(&[b'\\', escape]);
            }
            start = i + 1;
        }
        if start < bytes.len() {
            self.buf.extend_from_slice(&bytes[start..]);
        }

        self.buf.push(b'"');
    }

    /// Write a value using its `Display` form, unquoted.
    #[inline]
    pub(crate) fn write_display<T: Display>(&mut self, value: T) {
        // Writing into a Vec cannot fail.
        let _ = write!(self.buf, "{value}");
    }

    /// Write a value using its `Display` form, quoted. The form must not need escaping.
    #[inline]
    pub(crate) fn write_quoted_display<T: Display>(&mut self, value: T) {
        self.buf.push(b'"');
        self.write_display(value);
        self.buf.push(b'"');
    }

    #[cfg(test)]
    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
