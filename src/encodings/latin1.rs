// encodings/latin1.rs - Single-byte encoding.
// Every byte is one character; code points are the byte values (ISO-8859-1).

use crate::error::MatchError;
use crate::regenc::*;

pub struct Latin1Encoding;

pub static LATIN1: Latin1Encoding = Latin1Encoding;

impl Encoding for Latin1Encoding {
    fn name(&self) -> &str {
        "ISO-8859-1"
    }

    fn is_utf8(&self) -> bool {
        false
    }

    fn max_enc_len(&self) -> usize {
        1
    }

    #[inline]
    fn decode(&self, data: &[u8], s: usize, end: usize) -> Result<(u32, usize), MatchError> {
        if s >= end || s >= data.len() {
            return Err(MatchError::InvalidArgument("decode past end of subject"));
        }
        Ok((data[s] as u32, 1))
    }

    #[inline]
    fn char_len(&self, _b: u8) -> usize {
        1
    }

    #[inline]
    fn is_char_head(&self, _b: u8) -> bool {
        true
    }

    fn encode(&self, code: u32, buf: &mut Vec<u8>) -> bool {
        if code > 0xff {
            return false;
        }
        buf.push(code as u8);
        true
    }

    #[inline]
    fn prev_char_head(&self, _data: &[u8], start: usize, s: usize) -> usize {
        if s > start {
            s - 1
        } else {
            start
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_is_identity() {
        assert_eq!(LATIN1.decode(&[0xE9, b'a'], 0, 2).unwrap(), (0xE9, 1));
        assert!(LATIN1.decode(b"a", 1, 1).is_err());
    }

    #[test]
    fn encode_rejects_wide() {
        let mut buf = Vec::new();
        assert!(LATIN1.encode(0xFF, &mut buf));
        assert!(!LATIN1.encode(0x100, &mut buf));
        assert_eq!(buf, vec![0xFF]);
    }
}
