// regenc.rs - Subject encoding abstraction.
// Encoding trait plus the shared stepping helpers the matcher uses to walk
// subjects by character: decode, previous-character head, bounded hops.

use crate::error::MatchError;

pub type MatchEncoding = &'static dyn Encoding;

pub const ASCII_LIMIT: u32 = 127;
pub const NEWLINE_CODE: u32 = 0x0a;
pub const MAX_CODE_POINT: u32 = 0x10_FFFF;

// === Encoding Trait ===

pub trait Encoding: Send + Sync {
    /// Encoding name (e.g. "ISO-8859-1", "UTF-8").
    fn name(&self) -> &str;

    /// True for the variable-width UTF-8 encoding.
    fn is_utf8(&self) -> bool;

    /// Maximum encoded character length in bytes.
    fn max_enc_len(&self) -> usize;

    /// Decode the character starting at `s`, never reading at or past `end`.
    /// Returns the code point and its encoded length.
    fn decode(&self, data: &[u8], s: usize, end: usize) -> Result<(u32, usize), MatchError>;

    /// Encoded length of the character whose first byte is `b`, without
    /// validating the continuation bytes.
    fn char_len(&self, b: u8) -> usize;

    /// True if `b` can begin a character.
    fn is_char_head(&self, b: u8) -> bool;

    /// Append the encoding of `code` to `buf`. Returns false if `code` is not
    /// representable.
    fn encode(&self, code: u32, buf: &mut Vec<u8>) -> bool;

    /// Start of the character that ends at `s` (s > start).
    fn prev_char_head(&self, data: &[u8], start: usize, s: usize) -> usize {
        let mut p = s.saturating_sub(1);
        while p > start && !self.is_char_head(data[p]) {
            p -= 1;
        }
        p
    }
}

// === Shared Stepping Helpers ===

/// Position just past the character at `s`, clamped to `end`.
#[inline]
pub fn next_char(enc: MatchEncoding, data: &[u8], s: usize, end: usize) -> usize {
    if s >= end {
        return end;
    }
    let n = s + enc.char_len(data[s]);
    n.min(end)
}

/// Move forward `n` characters from `s` without passing `lim`.
/// Returns the reached position and how many characters were stepped.
pub fn hop_forward(
    enc: MatchEncoding,
    data: &[u8],
    s: usize,
    n: usize,
    lim: usize,
) -> (usize, usize) {
    if !enc.is_utf8() {
        let k = n.min(lim.saturating_sub(s));
        return (s + k, k);
    }
    let mut p = s;
    let mut count = 0;
    while count < n && p < lim {
        p = next_char(enc, data, p, lim);
        count += 1;
    }
    (p, count)
}

/// Move back as many as `n` characters from `s` without passing `lim`.
/// Returns the reached position and how many characters were stepped.
pub fn hop_back_lim(
    enc: MatchEncoding,
    data: &[u8],
    s: usize,
    n: usize,
    lim: usize,
) -> (usize, usize) {
    if !enc.is_utf8() {
        let k = n.min(s.saturating_sub(lim));
        return (s - k, k);
    }
    let mut p = s;
    let mut count = 0;
    while count < n && p > lim {
        p = enc.prev_char_head(data, lim, p);
        count += 1;
    }
    (p, count)
}

/// Move back exactly `n` characters, or `None` if `lim` is reached first.
#[inline]
pub fn hop_back(enc: MatchEncoding, data: &[u8], s: usize, n: usize, lim: usize) -> Option<usize> {
    let (p, count) = hop_back_lim(enc, data, s, n, lim);
    if count == n {
        Some(p)
    } else {
        None
    }
}

/// Number of characters in `data[s..e]`.
pub fn char_count(enc: MatchEncoding, data: &[u8], s: usize, e: usize) -> usize {
    if !enc.is_utf8() {
        return e.saturating_sub(s);
    }
    data[s..e].iter().filter(|&&b| enc.is_char_head(b)).count()
}

/// Decode a character of pattern text held in its own encoding.
pub fn decode_text(utf8: bool, text: &[u8], s: usize) -> Option<(u32, usize)> {
    let b = *text.get(s)?;
    if !utf8 || b < 0x80 {
        return Some((b as u32, 1));
    }
    let len = match b {
        0xC2..=0xDF => 2,
        0xE0..=0xEF => 3,
        0xF0..=0xF4 => 4,
        _ => return None,
    };
    if s + len > text.len() {
        return None;
    }
    let mut c = (b as u32) & (0x7F >> len);
    for &t in &text[s + 1..s + len] {
        if t & 0xC0 != 0x80 {
            return None;
        }
        c = (c << 6) | (t as u32 & 0x3F);
    }
    Some((c, len))
}
