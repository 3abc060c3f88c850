// regintuit.rs - Start-position heuristic.
// Narrows the next position worth a full attempt using the program's
// required literals and its start class. A skipped position is always one
// where no match can begin.

use std::borrow::Cow;

use memchr::{memchr, memmem};

use crate::error::MatchError;
use crate::regclass::{node_matches, ClassCtx};
use crate::regenc::{decode_text, hop_back, hop_forward, next_char, MatchEncoding};
use crate::regint::{Op, Program, Substr};

/// A required literal in the subject's encoding, with its character offset
/// range from the match start.
#[derive(Debug)]
struct Needle<'p> {
    text: Cow<'p, [u8]>,
    min: usize,
    max: Option<usize>,
}

/// Literal and class hints of a program, prepared for one subject encoding.
#[derive(Debug)]
pub(crate) struct Intuit<'p> {
    prog: &'p Program,
    anchored: Option<Needle<'p>>,
    floating: Option<Needle<'p>>,
    /// A required literal has no representation in the subject encoding.
    impossible: bool,
}

impl<'p> Intuit<'p> {
    pub fn new(prog: &'p Program, utf8_target: bool) -> Self {
        let mut impossible = false;
        let mut prepare = |sub: &'p Option<Substr>| {
            let sub = sub.as_ref()?;
            match transcode(&sub.text, prog.utf8, utf8_target) {
                Some(text) => Some(Needle { text, min: sub.min_offset, max: sub.max_offset }),
                None => {
                    impossible = true;
                    None
                }
            }
        };
        let anchored = prepare(&prog.anchored_substr);
        let floating = prepare(&prog.floating_substr);
        Intuit { prog, anchored, floating, impossible }
    }

    /// No subject in this encoding can match.
    pub fn impossible(&self) -> bool {
        self.impossible
    }

    pub fn has_hints(&self) -> bool {
        self.anchored.is_some() || self.floating.is_some() || self.prog.start_class.is_some()
    }

    /// Earliest position at or after `s` where a match could start.
    pub fn start(
        &self,
        enc: MatchEncoding,
        data: &[u8],
        s: usize,
        strend: usize,
        ctx: &ClassCtx<'_>,
    ) -> Result<Option<usize>, MatchError> {
        let mut s = s;
        loop {
            if s > strend {
                return Ok(None);
            }
            let mut cand = s;

            if let Some(a) = &self.anchored {
                let (from, stepped) = hop_forward(enc, data, s, a.min, strend);
                if stepped < a.min {
                    return Ok(None);
                }
                let Some(found) = find(data, from, strend, &a.text) else {
                    return Ok(None);
                };
                cand = hop_back(enc, data, found, a.min, s).unwrap_or(s);
            }

            if let Some(f) = &self.floating {
                let (lo, stepped) = hop_forward(enc, data, cand, f.min, strend);
                if stepped < f.min {
                    return Ok(None);
                }
                let Some(found) = find(data, lo, strend, &f.text) else {
                    return Ok(None);
                };
                if let Some(max) = f.max {
                    let (hi, _) = hop_forward(enc, data, cand, max, strend);
                    if found > hi {
                        if self.anchored.is_some() {
                            // the anchored literal pins cand; try its next occurrence
                            if cand >= strend {
                                return Ok(None);
                            }
                            s = next_char(enc, data, cand, strend);
                            continue;
                        }
                        cand = hop_back(enc, data, found, max, cand).unwrap_or(cand);
                    }
                }
            }

            let Some(class) = &self.prog.start_class else {
                return Ok(Some(cand));
            };
            if class_at(class, enc, data, cand, strend, ctx)? {
                return Ok(Some(cand));
            }
            if self.anchored.is_none() && self.floating.is_none() {
                return find_byclass(class, enc, data, cand, strend, ctx);
            }
            if cand >= strend {
                return Ok(None);
            }
            s = next_char(enc, data, cand, strend);
        }
    }
}

fn find(data: &[u8], from: usize, to: usize, needle: &[u8]) -> Option<usize> {
    if from > to {
        return None;
    }
    memmem::find(&data[from..to], needle).map(|i| from + i)
}

/// Re-encode pattern literal text for the subject, or `None` when a
/// character has no representation there.
fn transcode(text: &[u8], pat_utf8: bool, utf8_target: bool) -> Option<Cow<'_, [u8]>> {
    if pat_utf8 == utf8_target {
        return Some(Cow::Borrowed(text));
    }
    let mut out = Vec::with_capacity(text.len());
    let mut i = 0;
    while i < text.len() {
        let (c, len) = decode_text(pat_utf8, text, i)?;
        if utf8_target {
            let ch = char::from_u32(c)?;
            let mut buf = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
        } else {
            out.push(u8::try_from(c).ok()?);
        }
        i += len;
    }
    Some(Cow::Owned(out))
}

fn class_at(
    class: &Op,
    enc: MatchEncoding,
    data: &[u8],
    pos: usize,
    strend: usize,
    ctx: &ClassCtx<'_>,
) -> Result<bool, MatchError> {
    if pos >= strend {
        return Ok(false);
    }
    let (c, _) = enc.decode(data, pos, strend)?;
    node_matches(class, c, ctx)
}

/// Scan forward for the first character the start class accepts.
fn find_byclass(
    class: &Op,
    enc: MatchEncoding,
    data: &[u8],
    from: usize,
    strend: usize,
    ctx: &ClassCtx<'_>,
) -> Result<Option<usize>, MatchError> {
    if let Op::Exact { text, fold: None } = class {
        if let Some(&b) = text.first().filter(|&&b| b < 0x80) {
            return Ok(memchr(b, &data[from.min(strend)..strend]).map(|i| from + i));
        }
    }
    let mut p = from;
    while p < strend {
        let (c, len) = enc.decode(data, p, strend)?;
        if node_matches(class, c, ctx)? {
            return Ok(Some(p));
        }
        p += len;
    }
    Ok(None)
}
