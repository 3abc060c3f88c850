// regboundary.rs - Boundary predicates.
// Traditional \b plus the Unicode grapheme, word, sentence and line break
// boundaries. Each is a pure function of the subject and a position; the
// off-the-end sides of the subject act as a synthetic edge class.

use crate::error::MatchError;
use crate::regenc::MatchEncoding;
use crate::regint::{BoundKind, PosixClass};
use crate::unicode::segment::{gcb, is_east_asian_wide, is_extended_pictographic, lb, sb, wb};
use crate::unicode::segment::{Gcb, Lb, Sb, Wb};
use crate::unicode::{general_category, is_posix, Rules};
use unicode_general_category::GeneralCategory;

/// A subject window the predicates read from.
#[derive(Clone, Copy)]
pub struct Text<'a> {
    pub data: &'a [u8],
    pub beg: usize,
    pub end: usize,
    pub enc: MatchEncoding,
}

impl<'a> Text<'a> {
    pub fn new(data: &'a [u8], beg: usize, end: usize, enc: MatchEncoding) -> Self {
        Text { data, beg, end, enc }
    }

    /// Character ending at `pos`: (code, start).
    #[inline]
    fn before(&self, pos: usize) -> Result<Option<(u32, usize)>, MatchError> {
        if pos <= self.beg {
            return Ok(None);
        }
        let start = self.enc.prev_char_head(self.data, self.beg, pos);
        let (c, _) = self.enc.decode(self.data, start, self.end)?;
        Ok(Some((c, start)))
    }

    /// Character starting at `pos`: (code, next position).
    #[inline]
    fn at(&self, pos: usize) -> Result<Option<(u32, usize)>, MatchError> {
        if pos >= self.end {
            return Ok(None);
        }
        let (c, len) = self.enc.decode(self.data, pos, self.end)?;
        Ok(Some((c, pos + len)))
    }
}

/// Outcome of the pair lookup for two adjacent classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pair<C> {
    Break,
    NoBreak,
    /// Decided by looking further back or ahead.
    Context(C),
}

/// Evaluate a boundary of the given kind at `pos`. `rules` only affects
/// the traditional word boundary.
pub fn is_boundary(kind: BoundKind, rules: Rules, t: &Text<'_>, pos: usize) -> Result<bool, MatchError> {
    if t.beg == t.end && kind != BoundKind::Traditional {
        return Ok(false);
    }
    match kind {
        BoundKind::Traditional => word_boundary(rules, t, pos),
        BoundKind::Gcb => gcb_break(t, pos),
        BoundKind::Wb => wb_break(t, pos),
        BoundKind::Sb => sb_break(t, pos),
        BoundKind::Lb => lb_break(t, pos),
    }
}

// ============================================================================
// Traditional \b
// ============================================================================

fn is_word(c: u32, rules: Rules) -> bool {
    match rules {
        Rules::Ascii => c < 0x80 && ((c as u8).is_ascii_alphanumeric() || c == b'_' as u32),
        _ => is_posix(PosixClass::Word, c, rules),
    }
}

fn word_boundary(rules: Rules, t: &Text<'_>, pos: usize) -> Result<bool, MatchError> {
    let before = t.before(pos)?.is_some_and(|(c, _)| is_word(c, rules));
    let after = t.at(pos)?.is_some_and(|(c, _)| is_word(c, rules));
    Ok(before != after)
}

// ============================================================================
// Grapheme cluster boundaries (UAX #29)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GcbCtx {
    /// GB11: ExtPict Extend* ZWJ x ExtPict
    ZwjEmoji,
    /// GB12/13: regional indicator pairs
    RiParity,
}

fn gcb_pair(prev: Gcb, next: Gcb) -> Pair<GcbCtx> {
    use Gcb::*;
    match (prev, next) {
        (CR, LF) => Pair::NoBreak,
        (CR | LF | Control, _) | (_, CR | LF | Control) => Pair::Break,
        (L, L | V | LV | LVT) => Pair::NoBreak,
        (LV | V, V | T) => Pair::NoBreak,
        (LVT | T, T) => Pair::NoBreak,
        (_, Extend | ZWJ | SpacingMark) => Pair::NoBreak,
        (Prepend, _) => Pair::NoBreak,
        (ZWJ, ExtPict) => Pair::Context(GcbCtx::ZwjEmoji),
        (RegionalIndicator, RegionalIndicator) => Pair::Context(GcbCtx::RiParity),
        _ => Pair::Break,
    }
}

/// Number of consecutive characters matching `pred` ending at `pos`.
fn count_back(t: &Text<'_>, mut pos: usize, pred: impl Fn(u32) -> bool) -> Result<usize, MatchError> {
    let mut n = 0;
    while let Some((c, start)) = t.before(pos)? {
        if !pred(c) {
            break;
        }
        n += 1;
        pos = start;
    }
    Ok(n)
}

pub fn gcb_break(t: &Text<'_>, pos: usize) -> Result<bool, MatchError> {
    let (Some((p, pstart)), Some((n, _))) = (t.before(pos)?, t.at(pos)?) else {
        return Ok(true);
    };
    match gcb_pair(gcb(p), gcb(n)) {
        Pair::Break => Ok(true),
        Pair::NoBreak => Ok(false),
        Pair::Context(GcbCtx::ZwjEmoji) => {
            let mut q = pstart;
            while let Some((c, start)) = t.before(q)? {
                match gcb(c) {
                    Gcb::Extend => q = start,
                    _ => return Ok(!is_extended_pictographic(c)),
                }
            }
            Ok(true)
        }
        Pair::Context(GcbCtx::RiParity) => {
            let ris = count_back(t, pos, |c| gcb(c) == Gcb::RegionalIndicator)?;
            Ok(ris % 2 == 0)
        }
    }
}

/// End of the extended grapheme cluster starting at `pos`.
pub fn next_gcb_break(t: &Text<'_>, pos: usize) -> Result<usize, MatchError> {
    let Some((_, mut q)) = t.at(pos)? else {
        return Ok(pos);
    };
    while q < t.end && !gcb_break(t, q)? {
        q = match t.at(q)? {
            Some((_, next)) => next,
            None => break,
        };
    }
    Ok(q)
}

// ============================================================================
// Word boundaries (UAX #29)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WbCtx {
    /// WB6: AHLetter x (MidLetter | MidNumLetQ) AHLetter
    LetterMidAhead,
    /// WB7: AHLetter (MidLetter | MidNumLetQ) x AHLetter
    LetterMidBehind,
    /// WB7b: HebrewLetter x DoubleQuote HebrewLetter
    HebrewQuoteAhead,
    /// WB7c: HebrewLetter DoubleQuote x HebrewLetter
    HebrewQuoteBehind,
    /// WB11: Numeric (MidNum | MidNumLetQ) x Numeric
    NumMidBehind,
    /// WB12: Numeric x (MidNum | MidNumLetQ) Numeric
    NumMidAhead,
    /// WB15/16: regional indicator pairs
    RiParity,
}

#[inline]
fn is_ahletter(c: Wb) -> bool {
    matches!(c, Wb::ALetter | Wb::HebrewLetter)
}

#[inline]
fn is_midnumletq(c: Wb) -> bool {
    matches!(c, Wb::MidNumLet | Wb::SingleQuote)
}

#[inline]
fn is_wb_ignorable(c: Wb) -> bool {
    matches!(c, Wb::Extend | Wb::Format | Wb::ZWJ)
}

fn wb_pair(prev: Wb, next: Wb) -> Pair<WbCtx> {
    use Wb::*;
    match (prev, next) {
        (p, n) if is_ahletter(p) && is_ahletter(n) => Pair::NoBreak,
        (p, MidLetter) if is_ahletter(p) => Pair::Context(WbCtx::LetterMidAhead),
        (p, n) if is_ahletter(p) && is_midnumletq(n) => {
            if p == HebrewLetter && n == SingleQuote {
                Pair::NoBreak
            } else {
                Pair::Context(WbCtx::LetterMidAhead)
            }
        }
        (MidLetter, n) if is_ahletter(n) => Pair::Context(WbCtx::LetterMidBehind),
        (p, n) if is_midnumletq(p) && is_ahletter(n) => Pair::Context(WbCtx::LetterMidBehind),
        (HebrewLetter, DoubleQuote) => Pair::Context(WbCtx::HebrewQuoteAhead),
        (DoubleQuote, HebrewLetter) => Pair::Context(WbCtx::HebrewQuoteBehind),
        (Numeric, Numeric) => Pair::NoBreak,
        (p, Numeric) if is_ahletter(p) => Pair::NoBreak,
        (Numeric, n) if is_ahletter(n) => Pair::NoBreak,
        (MidNum, Numeric) => Pair::Context(WbCtx::NumMidBehind),
        (p, Numeric) if is_midnumletq(p) => Pair::Context(WbCtx::NumMidBehind),
        (Numeric, MidNum) => Pair::Context(WbCtx::NumMidAhead),
        (Numeric, n) if is_midnumletq(n) => Pair::Context(WbCtx::NumMidAhead),
        (Katakana, Katakana) => Pair::NoBreak,
        (ALetter | HebrewLetter | Numeric | Katakana | ExtendNumLet, ExtendNumLet) => Pair::NoBreak,
        (ExtendNumLet, ALetter | HebrewLetter | Numeric | Katakana) => Pair::NoBreak,
        (RegionalIndicator, RegionalIndicator) => Pair::Context(WbCtx::RiParity),
        _ => Pair::Break,
    }
}

/// WB4-aware class of the character ending at `pos`, with its start.
fn wb_back(t: &Text<'_>, mut pos: usize) -> Result<Option<(Wb, usize)>, MatchError> {
    let mut first = None;
    while let Some((c, start)) = t.before(pos)? {
        let class = wb(c);
        if first.is_none() {
            first = Some((class, start));
        }
        if !is_wb_ignorable(class) {
            return Ok(Some((class, start)));
        }
        pos = start;
    }
    Ok(first)
}

/// WB4-aware class of the first non-ignorable character at or after `pos`.
fn wb_ahead(t: &Text<'_>, mut pos: usize) -> Result<Option<Wb>, MatchError> {
    while let Some((c, next)) = t.at(pos)? {
        let class = wb(c);
        if !is_wb_ignorable(class) {
            return Ok(Some(class));
        }
        pos = next;
    }
    Ok(None)
}

pub fn wb_break(t: &Text<'_>, pos: usize) -> Result<bool, MatchError> {
    let (Some((pc, pstart)), Some((nc, nnext))) = (t.before(pos)?, t.at(pos)?) else {
        return Ok(true);
    };
    let (praw, next) = (wb(pc), wb(nc));
    use Wb::*;
    // WB3 - WB3d
    match (praw, next) {
        (CR, LF) => return Ok(false),
        (CR | LF | Newline, _) | (_, CR | LF | Newline) => return Ok(true),
        (ZWJ, _) if is_extended_pictographic(nc) => return Ok(false),
        (WSegSpace, WSegSpace) => return Ok(false),
        _ => {}
    }
    // WB4
    if is_wb_ignorable(next) {
        return Ok(false);
    }
    let Some((prev, pstart)) = wb_back(t, pos)?.or(Some((praw, pstart))) else {
        return Ok(true);
    };
    let decided = match wb_pair(prev, next) {
        Pair::Break => true,
        Pair::NoBreak => false,
        Pair::Context(ctx) => match ctx {
            WbCtx::LetterMidAhead => !wb_ahead(t, nnext)?.is_some_and(is_ahletter),
            WbCtx::LetterMidBehind => !wb_back(t, pstart)?.is_some_and(|(c, _)| is_ahletter(c)),
            WbCtx::HebrewQuoteAhead => wb_ahead(t, nnext)? != Some(HebrewLetter),
            WbCtx::HebrewQuoteBehind => {
                !wb_back(t, pstart)?.is_some_and(|(c, _)| c == HebrewLetter)
            }
            WbCtx::NumMidBehind => !wb_back(t, pstart)?.is_some_and(|(c, _)| c == Numeric),
            WbCtx::NumMidAhead => wb_ahead(t, nnext)? != Some(Numeric),
            WbCtx::RiParity => {
                let mut count = 0;
                let mut q = pos;
                while let Some((c, start)) = wb_back(t, q)? {
                    if c != RegionalIndicator {
                        break;
                    }
                    count += 1;
                    q = start;
                }
                count % 2 == 0
            }
        },
    };
    Ok(decided)
}

// ============================================================================
// Sentence boundaries (UAX #29)
// ============================================================================

#[inline]
fn is_parasep(c: Sb) -> bool {
    matches!(c, Sb::Sep | Sb::CR | Sb::LF)
}

#[inline]
fn is_saterm(c: Sb) -> bool {
    matches!(c, Sb::STerm | Sb::ATerm)
}

/// SB5-aware class of the character ending at `pos`, with its start.
fn sb_back(t: &Text<'_>, mut pos: usize) -> Result<Option<(Sb, usize)>, MatchError> {
    while let Some((c, start)) = t.before(pos)? {
        let class = sb(c);
        if !matches!(class, Sb::Extend | Sb::Format) {
            return Ok(Some((class, start)));
        }
        pos = start;
    }
    Ok(None)
}

/// Terminator context behind `pos`: the SATerm class of `SATerm Close* Sp*`
/// and whether any Sp was crossed.
fn sb_terminator(t: &Text<'_>, pos: usize) -> Result<Option<(Sb, bool)>, MatchError> {
    let mut q = pos;
    let mut saw_sp = false;
    let mut cur = sb_back(t, q)?;
    while let Some((Sb::Sp, start)) = cur {
        saw_sp = true;
        q = start;
        cur = sb_back(t, q)?;
    }
    while let Some((Sb::Close, start)) = cur {
        q = start;
        cur = sb_back(t, q)?;
    }
    Ok(match cur {
        Some((class, _)) if is_saterm(class) => Some((class, saw_sp)),
        _ => None,
    })
}

pub fn sb_break(t: &Text<'_>, pos: usize) -> Result<bool, MatchError> {
    let (Some((pc, _)), Some((nc, nnext))) = (t.before(pos)?, t.at(pos)?) else {
        return Ok(true);
    };
    let (praw, next) = (sb(pc), sb(nc));
    // SB3, SB4
    if praw == Sb::CR && next == Sb::LF {
        return Ok(false);
    }
    if is_parasep(praw) {
        return Ok(true);
    }
    // SB5
    if matches!(next, Sb::Extend | Sb::Format) {
        return Ok(false);
    }
    let Some((prev, pstart)) = sb_back(t, pos)? else {
        return Ok(true);
    };
    // SB6, SB7
    if prev == Sb::ATerm && next == Sb::Numeric {
        return Ok(false);
    }
    if prev == Sb::ATerm && next == Sb::Upper {
        if let Some((pp, _)) = sb_back(t, pstart)? {
            if matches!(pp, Sb::Upper | Sb::Lower) {
                return Ok(false);
            }
        }
    }
    let Some((term, saw_sp)) = sb_terminator(t, pos)? else {
        // SB998
        return Ok(false);
    };
    // SB8
    if term == Sb::ATerm {
        let mut cur = Some(next);
        let mut qnext = nnext;
        while let Some(class) = cur {
            match class {
                Sb::Lower => return Ok(false),
                Sb::OLetter | Sb::Upper | Sb::Sep | Sb::CR | Sb::LF | Sb::STerm | Sb::ATerm => {
                    break
                }
                _ => {}
            }
            cur = match t.at(qnext)? {
                Some((c, after)) => {
                    qnext = after;
                    Some(sb(c))
                }
                None => None,
            };
        }
    }
    // SB8a
    if matches!(next, Sb::SContinue | Sb::STerm | Sb::ATerm) {
        return Ok(false);
    }
    // SB9
    if !saw_sp && (matches!(next, Sb::Close | Sb::Sp) || is_parasep(next)) {
        return Ok(false);
    }
    // SB10
    if next == Sb::Sp || is_parasep(next) {
        return Ok(false);
    }
    // SB11
    Ok(true)
}

// ============================================================================
// Line break opportunities (UAX #14)
// ============================================================================

#[inline]
fn lb_is_hard(c: Lb) -> bool {
    matches!(c, Lb::BK | Lb::CR | Lb::LF | Lb::NL | Lb::SP | Lb::ZW)
}

/// Class of the character sequence ending at `pos` after LB9/LB10:
/// combining marks take their base's class, or AL when unattached.
fn lb_back(t: &Text<'_>, pos: usize) -> Result<Option<(Lb, u32, usize)>, MatchError> {
    let Some((c, start)) = t.before(pos)? else {
        return Ok(None);
    };
    let class = lb(c);
    if !matches!(class, Lb::CM | Lb::ZWJ) {
        return Ok(Some((class, c, start)));
    }
    let mut q = start;
    while let Some((bc, bstart)) = t.before(q)? {
        let b = lb(bc);
        if matches!(b, Lb::CM | Lb::ZWJ) {
            q = bstart;
            continue;
        }
        if lb_is_hard(b) {
            break;
        }
        return Ok(Some((b, bc, bstart)));
    }
    Ok(Some((Lb::AL, c, start)))
}

/// Class of the character at `pos` for forward context, CM as AL.
fn lb_at(t: &Text<'_>, pos: usize) -> Result<Option<(Lb, usize)>, MatchError> {
    Ok(t.at(pos)?.map(|(c, next)| match lb(c) {
        Lb::CM | Lb::ZWJ => (Lb::AL, next),
        other => (other, next),
    }))
}

pub fn lb_break(t: &Text<'_>, pos: usize) -> Result<bool, MatchError> {
    use Lb::*;
    // LB2, LB3
    if pos <= t.beg {
        return Ok(false);
    }
    let (Some((pc, _)), Some((nc, nnext))) = (t.before(pos)?, t.at(pos)?) else {
        return Ok(true);
    };
    let (praw, nraw) = (lb(pc), lb(nc));
    // LB4 - LB7
    if praw == BK {
        return Ok(true);
    }
    if praw == CR && nraw == LF {
        return Ok(false);
    }
    if matches!(praw, CR | LF | NL) {
        return Ok(true);
    }
    if matches!(nraw, BK | CR | LF | NL | SP | ZW) {
        return Ok(false);
    }
    // LB8
    {
        let mut q = pos;
        while let Some((c, start)) = t.before(q)? {
            match lb(c) {
                SP => q = start,
                ZW => return Ok(true),
                _ => break,
            }
        }
    }
    // LB8a
    if praw == ZWJ {
        return Ok(false);
    }
    // LB9
    if matches!(nraw, CM | ZWJ) && !lb_is_hard(praw) {
        return Ok(false);
    }
    let Some((prev, prev_c, pstart)) = lb_back(t, pos)? else {
        return Ok(true);
    };
    // LB10
    let next = if matches!(nraw, CM | ZWJ) { AL } else { nraw };

    // LB11 - LB13
    if next == WJ || prev == WJ || prev == GL {
        return Ok(false);
    }
    if next == GL && !matches!(prev, SP | BA | HY) {
        return Ok(false);
    }
    if matches!(next, CL | CP | EX | IS | SY) {
        return Ok(false);
    }
    // LB14 - LB18
    let before_spaces = if prev == SP {
        let mut q = pstart;
        loop {
            match lb_back(t, q)? {
                Some((SP, _, start)) => q = start,
                Some((class, _, _)) => break Some(class),
                None => break None,
            }
        }
    } else {
        Some(prev)
    };
    match before_spaces {
        Some(OP) => return Ok(false),
        Some(QU) if next == OP => return Ok(false),
        Some(CL | CP) if next == NS => return Ok(false),
        Some(B2) if next == B2 => return Ok(false),
        _ => {}
    }
    if prev == SP {
        return Ok(true);
    }
    // LB19, LB20
    if next == QU || prev == QU {
        return Ok(false);
    }
    if next == CB || prev == CB {
        return Ok(true);
    }
    // LB21, LB21a, LB21b
    if matches!(next, BA | HY | NS) || prev == BB {
        return Ok(false);
    }
    if matches!(prev, HY | BA) && lb_back(t, pstart)?.is_some_and(|(c, _, _)| c == HL) {
        return Ok(false);
    }
    if prev == SY && next == HL {
        return Ok(false);
    }
    // LB22 - LB24
    if next == IN {
        return Ok(false);
    }
    match (prev, next) {
        (AL | HL, NU) | (NU, AL | HL) => return Ok(false),
        (PR, ID | EB | EM) | (ID | EB | EM, PO) => return Ok(false),
        (PR | PO, AL | HL) | (AL | HL, PR | PO) => return Ok(false),
        _ => {}
    }
    // LB25
    match (prev, next) {
        (CL | CP, PO | PR) => {
            // NU (SY | IS)* (CL | CP) x (PO | PR)
            let mut q = pstart;
            loop {
                match lb_back(t, q)? {
                    Some((SY | IS, _, start)) => q = start,
                    Some((NU, _, _)) => return Ok(false),
                    _ => break,
                }
            }
        }
        (PO | PR, OP) => {
            if lb_at(t, nnext)?.is_some_and(|(c, _)| c == NU) {
                return Ok(false);
            }
        }
        (NU, PO | PR) | (PO | PR, NU) | (HY | IS | NU | SY, NU) => return Ok(false),
        _ => {}
    }
    // LB26, LB27
    match (prev, next) {
        (JL, JL | JV | H2 | H3) | (JV | H2, JV | JT) | (JT | H3, JT) => return Ok(false),
        (JL | JV | JT | H2 | H3, PO) | (PR, JL | JV | JT | H2 | H3) => return Ok(false),
        _ => {}
    }
    // LB28, LB29
    if matches!(prev, AL | HL) && matches!(next, AL | HL) {
        return Ok(false);
    }
    if prev == IS && matches!(next, AL | HL) {
        return Ok(false);
    }
    // LB30
    if matches!(prev, AL | HL | NU) && next == OP && !is_east_asian_wide(nc) {
        return Ok(false);
    }
    if prev == CP && matches!(next, AL | HL | NU) && !is_east_asian_wide(prev_c) {
        return Ok(false);
    }
    // LB30a
    if prev == RI && next == RI {
        let mut count = 0;
        let mut q = pos;
        while let Some((c, _, start)) = lb_back(t, q)? {
            if c != RI {
                break;
            }
            count += 1;
            q = start;
        }
        return Ok(count % 2 == 0);
    }
    // LB30b
    if next == EM
        && (prev == EB
            || (is_extended_pictographic(prev_c)
                && general_category(prev_c) == GeneralCategory::Unassigned))
    {
        return Ok(false);
    }
    // LB31
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encodings::UTF8;

    fn breaks(kind: BoundKind, s: &str) -> Vec<usize> {
        let t = Text::new(s.as_bytes(), 0, s.len(), &UTF8);
        (0..=s.len())
            .filter(|&i| s.is_char_boundary(i))
            .filter(|&i| is_boundary(kind, Rules::Unicode, &t, i).unwrap())
            .collect()
    }

    #[test]
    fn traditional_word_boundary() {
        assert_eq!(breaks(BoundKind::Traditional, "cat dog"), vec![0, 3, 4, 7]);
        let t = Text::new(b"", 0, 0, &UTF8);
        assert!(!is_boundary(BoundKind::Traditional, Rules::Ascii, &t, 0).unwrap());
    }

    #[test]
    fn edges_always_break_except_line_start() {
        for kind in [BoundKind::Gcb, BoundKind::Wb, BoundKind::Sb] {
            let b = breaks(kind, "a");
            assert_eq!(b, vec![0, 1], "{:?}", kind);
        }
        assert_eq!(breaks(BoundKind::Lb, "a"), vec![1]);
        for kind in [BoundKind::Gcb, BoundKind::Wb, BoundKind::Sb, BoundKind::Lb] {
            assert!(breaks(kind, "").is_empty());
        }
    }

    #[test]
    fn grapheme_clusters() {
        // e + combining acute stays together; CRLF is one cluster
        assert_eq!(breaks(BoundKind::Gcb, "e\u{301}x"), vec![0, 3, 4]);
        assert_eq!(breaks(BoundKind::Gcb, "\r\n"), vec![0, 2]);
        // two flags: RI RI | RI RI
        let flags = "\u{1F1FA}\u{1F1F8}\u{1F1EB}\u{1F1F7}";
        assert_eq!(breaks(BoundKind::Gcb, flags), vec![0, 8, 16]);
        // family emoji joined by ZWJ
        let family = "\u{1F468}\u{200D}\u{1F469}";
        assert_eq!(breaks(BoundKind::Gcb, family), vec![0, family.len()]);
    }

    #[test]
    fn next_cluster_end() {
        let s = "e\u{301}\u{302}z";
        let t = Text::new(s.as_bytes(), 0, s.len(), &UTF8);
        assert_eq!(next_gcb_break(&t, 0).unwrap(), 5);
        assert_eq!(next_gcb_break(&t, 5).unwrap(), 6);
    }

    #[test]
    fn word_breaks() {
        assert_eq!(breaks(BoundKind::Wb, "can't stop"), vec![0, 5, 6, 10]);
        assert_eq!(breaks(BoundKind::Wb, "3.14"), vec![0, 4]);
        assert_eq!(breaks(BoundKind::Wb, "a.b."), vec![0, 3, 4]);
        assert_eq!(breaks(BoundKind::Wb, "a  b"), vec![0, 1, 3, 4]);
    }

    #[test]
    fn sentence_breaks() {
        assert_eq!(breaks(BoundKind::Sb, "Hi. Bye."), vec![0, 4, 8]);
        // lowercase after the period does not start a sentence
        assert_eq!(breaks(BoundKind::Sb, "e.g. this"), vec![0, 9]);
        assert_eq!(breaks(BoundKind::Sb, "Go!\nNow"), vec![0, 4, 7]);
    }

    #[test]
    fn line_breaks() {
        assert_eq!(breaks(BoundKind::Lb, "ab cd"), vec![3, 5]);
        assert_eq!(breaks(BoundKind::Lb, "a-b"), vec![2, 3]);
        // no break before closing punctuation or inside a number
        assert_eq!(breaks(BoundKind::Lb, "(1.5)"), vec![5]);
        assert_eq!(breaks(BoundKind::Lb, "a\nb"), vec![2, 3]);
    }
}
