// encodings/utf8.rs - UTF-8 encoding.
// Strict decoding (RFC 3629 range U+0000 - U+10FFFF, no overlongs, no
// surrogates); malformed input is reported with its byte offset.

use crate::error::MatchError;
use crate::regenc::*;

// === UTF-8 Helpers ===

#[inline]
fn utf8_islead(c: u8) -> bool {
    (c & 0xc0) != 0x80
}

#[inline]
fn utf8_istail(c: u8) -> bool {
    (c & 0xc0) == 0x80
}

// === EncLen_UTF8 Table ===
// Maps first byte to character length (RFC 3629: max 4 bytes).

static ENC_LEN_UTF8: [u8; 256] = [
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
    1, 1, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2,
    3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 4, 4, 4, 4, 4, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
];

// === UTF-8 Encoding Struct ===

pub struct Utf8Encoding;

pub static UTF8: Utf8Encoding = Utf8Encoding;

impl Encoding for Utf8Encoding {
    fn name(&self) -> &str {
        "UTF-8"
    }

    fn is_utf8(&self) -> bool {
        true
    }

    fn max_enc_len(&self) -> usize {
        4
    }

    fn decode(&self, data: &[u8], s: usize, end: usize) -> Result<(u32, usize), MatchError> {
        let end = end.min(data.len());
        if s >= end {
            return Err(MatchError::InvalidArgument("decode past end of subject"));
        }
        let lead = data[s];
        if lead < 0x80 {
            return Ok((lead as u32, 1));
        }
        let bad = MatchError::MalformedUtf8 { offset: s };
        if lead < 0xc2 || lead > 0xf4 {
            return Err(bad);
        }
        let len = ENC_LEN_UTF8[lead as usize] as usize;
        if s + len > end {
            return Err(bad);
        }
        let mut code = (lead as u32) & (0x7f >> len);
        for &b in &data[s + 1..s + len] {
            if !utf8_istail(b) {
                return Err(bad);
            }
            code = (code << 6) | (b as u32 & 0x3f);
        }
        let overlong = match len {
            3 => code < 0x800,
            4 => code < 0x1_0000,
            _ => false,
        };
        if overlong || code > MAX_CODE_POINT || (0xd800..=0xdfff).contains(&code) {
            return Err(bad);
        }
        Ok((code, len))
    }

    #[inline]
    fn char_len(&self, b: u8) -> usize {
        ENC_LEN_UTF8[b as usize] as usize
    }

    #[inline]
    fn is_char_head(&self, b: u8) -> bool {
        utf8_islead(b)
    }

    fn encode(&self, code: u32, buf: &mut Vec<u8>) -> bool {
        match char::from_u32(code) {
            Some(c) => {
                let mut tmp = [0u8; 4];
                buf.extend_from_slice(c.encode_utf8(&mut tmp).as_bytes());
                true
            }
            None => false,
        }
    }

    fn prev_char_head(&self, data: &[u8], start: usize, s: usize) -> usize {
        if s <= start {
            return start;
        }
        let mut p = s - 1;
        while p > start && !utf8_islead(data[p]) {
            p -= 1;
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_multibyte() {
        let s = "a€😀".as_bytes();
        assert_eq!(UTF8.decode(s, 0, s.len()).unwrap(), ('a' as u32, 1));
        assert_eq!(UTF8.decode(s, 1, s.len()).unwrap(), (0x20AC, 3));
        assert_eq!(UTF8.decode(s, 4, s.len()).unwrap(), (0x1F600, 4));
    }

    #[test]
    fn decode_reports_malformed_offset() {
        let s = [b'a', 0xC3, b'(', b'b'];
        assert_eq!(
            UTF8.decode(&s, 1, s.len()),
            Err(MatchError::MalformedUtf8 { offset: 1 })
        );
        // overlong encoding of '/'
        let s = [0xC0, 0xAF];
        assert!(UTF8.decode(&s, 0, 2).is_err());
        // truncated at the window end
        let s = "€".as_bytes();
        assert!(UTF8.decode(s, 0, 2).is_err());
    }

    #[test]
    fn prev_head_skips_continuations() {
        let s = "x€".as_bytes();
        assert_eq!(UTF8.prev_char_head(s, 0, s.len()), 1);
        assert_eq!(UTF8.prev_char_head(s, 0, 1), 0);
    }
}
