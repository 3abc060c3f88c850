// unicode/mod.rs - Unicode character properties and case folding.
// POSIX-class predicates under ASCII, Latin-1 and Unicode rules, simple case
// folding, and the segmentation / script tables in the submodules.

pub mod script;
pub mod segment;

use smallvec::SmallVec;
use unicode_general_category::{get_general_category, GeneralCategory};

use crate::regint::{Charset, FoldKind, Locale, PosixClass};

/// Which definition of a POSIX class applies to a code point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rules {
    /// Only ASCII code points can match.
    Ascii,
    /// Unicode definitions restricted to code points below 256.
    Latin1,
    Unicode,
}

/// Resolve the rules for a node's charset in the current match context.
pub fn rules_for(charset: Charset, utf8_target: bool, pat_utf8: bool, locale: Locale) -> Rules {
    match charset {
        Charset::Unicode => Rules::Unicode,
        Charset::Ascii => Rules::Ascii,
        Charset::Depends => {
            if utf8_target || pat_utf8 {
                Rules::Unicode
            } else {
                Rules::Ascii
            }
        }
        Charset::Locale => {
            if locale.utf8 {
                Rules::Unicode
            } else {
                Rules::Latin1
            }
        }
    }
}

#[inline]
pub fn general_category(c: u32) -> GeneralCategory {
    match char::from_u32(c) {
        Some(ch) => get_general_category(ch),
        None => GeneralCategory::Surrogate,
    }
}

// === POSIX Classes ===

#[inline]
fn is_ascii_punct(c: u32) -> bool {
    matches!(c, 0x21..=0x2f | 0x3a..=0x40 | 0x5b..=0x60 | 0x7b..=0x7e)
}

pub fn is_punct_category(gc: GeneralCategory) -> bool {
    use GeneralCategory::*;
    matches!(
        gc,
        ConnectorPunctuation
            | DashPunctuation
            | OpenPunctuation
            | ClosePunctuation
            | InitialPunctuation
            | FinalPunctuation
            | OtherPunctuation
    )
}

pub fn is_mark_category(gc: GeneralCategory) -> bool {
    use GeneralCategory::*;
    matches!(gc, NonspacingMark | SpacingMark | EnclosingMark)
}

/// `\w` under Unicode rules: alphabetic, marks, decimal digits, connector
/// punctuation and the join controls.
pub fn is_word_unicode(c: u32) -> bool {
    if c < 0x80 {
        return (c as u8).is_ascii_alphanumeric() || c == b'_' as u32;
    }
    if c == 0x200c || c == 0x200d {
        return true;
    }
    let Some(ch) = char::from_u32(c) else {
        return false;
    };
    if ch.is_alphabetic() {
        return true;
    }
    let gc = get_general_category(ch);
    is_mark_category(gc)
        || gc == GeneralCategory::DecimalNumber
        || gc == GeneralCategory::ConnectorPunctuation
}

fn is_posix_unicode(class: PosixClass, c: u32) -> bool {
    let Some(ch) = char::from_u32(c) else {
        return false;
    };
    match class {
        PosixClass::Word => is_word_unicode(c),
        PosixClass::Digit => get_general_category(ch) == GeneralCategory::DecimalNumber,
        PosixClass::Space => ch.is_whitespace(),
        PosixClass::Alpha => ch.is_alphabetic(),
        PosixClass::Alnum => {
            ch.is_alphabetic() || get_general_category(ch) == GeneralCategory::DecimalNumber
        }
        PosixClass::Upper => ch.is_uppercase(),
        PosixClass::Lower => ch.is_lowercase(),
        PosixClass::Cased => {
            ch.is_uppercase()
                || ch.is_lowercase()
                || get_general_category(ch) == GeneralCategory::TitlecaseLetter
        }
        PosixClass::Punct => is_ascii_punct(c) || is_punct_category(get_general_category(ch)),
        PosixClass::Graph => is_graph_unicode(ch),
        PosixClass::Print => {
            (is_graph_unicode(ch) || is_blank_unicode(ch))
                && get_general_category(ch) != GeneralCategory::Control
        }
        PosixClass::Cntrl => get_general_category(ch) == GeneralCategory::Control,
        PosixClass::Blank => is_blank_unicode(ch),
        PosixClass::XDigit => matches!(
            ch,
            '0'..='9' | 'A'..='F' | 'a'..='f' | '\u{ff10}'..='\u{ff19}' | '\u{ff21}'..='\u{ff26}'
                | '\u{ff41}'..='\u{ff46}'
        ),
        PosixClass::Ascii => c < 0x80,
        PosixClass::VertSpace => matches!(c, 0x0a..=0x0d | 0x85 | 0x2028 | 0x2029),
    }
}

fn is_blank_unicode(ch: char) -> bool {
    ch == '\t' || get_general_category(ch) == GeneralCategory::SpaceSeparator
}

fn is_graph_unicode(ch: char) -> bool {
    use GeneralCategory::*;
    if ch.is_whitespace() {
        return false;
    }
    !matches!(get_general_category(ch), Control | Surrogate | Unassigned)
}

/// Test a POSIX class under the given rules.
pub fn is_posix(class: PosixClass, c: u32, rules: Rules) -> bool {
    match rules {
        Rules::Ascii => c < 0x80 && is_posix_unicode(class, c),
        Rules::Latin1 => c < 0x100 && is_posix_unicode(class, c),
        Rules::Unicode => is_posix_unicode(class, c),
    }
}

// === Case Folding ===

// Code points whose simple case fold differs from their lowercase mapping.
static FOLD_EXCEPTIONS: [(u32, u32); 22] = [
    (0x00b5, 0x03bc),
    (0x017f, 0x0073),
    (0x0345, 0x03b9),
    (0x03c2, 0x03c3),
    (0x03d0, 0x03b2),
    (0x03d1, 0x03b8),
    (0x03d5, 0x03c6),
    (0x03d6, 0x03c0),
    (0x03f0, 0x03ba),
    (0x03f1, 0x03c1),
    (0x03f5, 0x03b5),
    (0x1c80, 0x0432),
    (0x1c81, 0x0434),
    (0x1c82, 0x043e),
    (0x1c83, 0x0441),
    (0x1c84, 0x0442),
    (0x1c85, 0x0442),
    (0x1c86, 0x044a),
    (0x1c87, 0x0463),
    (0x1c88, 0xa64b),
    (0x1e9b, 0x1e61),
    (0x1fbe, 0x03b9),
];

/// Unicode simple case fold.
pub fn fold_simple(c: u32) -> u32 {
    if c < 0x80 {
        return fold_ascii(c);
    }
    if let Ok(i) = FOLD_EXCEPTIONS.binary_search_by_key(&c, |&(from, _)| from) {
        return FOLD_EXCEPTIONS[i].1;
    }
    let Some(ch) = char::from_u32(c) else {
        return c;
    };
    let mut lower = ch.to_lowercase();
    match (lower.next(), lower.next()) {
        (Some(l), None) => l as u32,
        _ => c,
    }
}

#[inline]
pub fn fold_ascii(c: u32) -> u32 {
    if (b'A' as u32..=b'Z' as u32).contains(&c) {
        c + 0x20
    } else {
        c
    }
}

/// Case fold over the Latin-1 repertoire only.
pub fn fold_latin1(c: u32) -> u32 {
    match c {
        0x41..=0x5a => c + 0x20,
        0xc0..=0xde if c != 0xd7 => c + 0x20,
        _ => c,
    }
}

pub const LATIN_CAPITAL_I: u32 = 0x49;
pub const LATIN_SMALL_I: u32 = 0x69;
pub const LATIN_CAPITAL_I_WITH_DOT_ABOVE: u32 = 0x130;
pub const LATIN_SMALL_DOTLESS_I: u32 = 0x131;

/// Case fold under the caller's locale.
pub fn fold_locale(c: u32, locale: Locale) -> u32 {
    if locale.turkic {
        if c == LATIN_CAPITAL_I {
            return LATIN_SMALL_DOTLESS_I;
        }
        if c == LATIN_CAPITAL_I_WITH_DOT_ABOVE {
            return LATIN_SMALL_I;
        }
    }
    if locale.utf8 {
        fold_simple(c)
    } else {
        fold_latin1(c)
    }
}

/// Fold under a node's folding mode. ASCII folding never maps between ASCII
/// and non-ASCII code points.
pub fn fold_with(kind: FoldKind, c: u32, locale: Locale) -> u32 {
    match kind {
        FoldKind::Ascii => {
            if c < 0x80 {
                return fold_ascii(c);
            }
            let f = fold_simple(c);
            if f < 0x80 {
                c
            } else {
                f
            }
        }
        FoldKind::Unicode => fold_simple(c),
        FoldKind::Locale => fold_locale(c, locale),
    }
}

/// The other-case partner of `c` in the locale's 8-bit repertoire.
pub fn latin1_other_case(c: u32) -> u32 {
    match c {
        0x41..=0x5a => c + 0x20,
        0x61..=0x7a => c - 0x20,
        0xc0..=0xde if c != 0xd7 => c + 0x20,
        0xe0..=0xfe if c != 0xf7 => c - 0x20,
        _ => c,
    }
}

// Characters that lowercase onto a letter that is not their uppercase
// partner's lowercase.
static FOLD_ALIASES: [(u32, u32); 4] = [
    (0x1e9e, 0x00df),
    (0x2126, 0x03c9),
    (0x212a, 0x006b),
    (0x212b, 0x00e5),
];

/// Every other code point with the same simple fold as `c`.
pub fn fold_partners(c: u32) -> SmallVec<[u32; 4]> {
    let f = fold_simple(c);
    let mut candidates: SmallVec<[u32; 8]> = SmallVec::new();
    candidates.push(f);
    for base in [c, f] {
        if let Some(ch) = char::from_u32(base) {
            let mut upper = ch.to_uppercase();
            if let (Some(u), None) = (upper.next(), upper.next()) {
                candidates.push(u as u32);
            }
        }
    }
    candidates.extend(
        FOLD_EXCEPTIONS
            .iter()
            .chain(FOLD_ALIASES.iter())
            .filter(|&&(_, to)| to == f)
            .map(|&(from, _)| from),
    );
    let mut out = SmallVec::new();
    for x in candidates {
        if x != c && fold_simple(x) == f && !out.contains(&x) {
            out.push(x);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partners_include_kelvin_and_long_s() {
        let k = fold_partners('k' as u32);
        assert!(k.contains(&('K' as u32)));
        assert!(k.contains(&0x212a));
        let s = fold_partners('S' as u32);
        assert!(s.contains(&('s' as u32)));
        assert!(s.contains(&0x17f));
        assert!(fold_partners('1' as u32).is_empty());
    }

    #[test]
    fn word_chars() {
        assert!(is_word_unicode('_' as u32));
        assert!(is_word_unicode('é' as u32));
        assert!(is_word_unicode(0x0301)); // combining acute
        assert!(is_word_unicode('٣' as u32));
        assert!(!is_word_unicode('-' as u32));
    }

    #[test]
    fn posix_rules() {
        assert!(is_posix(PosixClass::Alpha, 0xe9, Rules::Unicode));
        assert!(is_posix(PosixClass::Alpha, 0xe9, Rules::Latin1));
        assert!(!is_posix(PosixClass::Alpha, 0xe9, Rules::Ascii));
        assert!(!is_posix(PosixClass::Alpha, 0x3b1, Rules::Latin1));
        assert!(is_posix(PosixClass::Punct, '$' as u32, Rules::Ascii));
        assert!(is_posix(PosixClass::Space, 0x0b, Rules::Ascii));
        assert!(is_posix(PosixClass::Blank, 0x3000, Rules::Unicode));
        assert!(!is_posix(PosixClass::Graph, ' ' as u32, Rules::Unicode));
        assert!(is_posix(PosixClass::Print, ' ' as u32, Rules::Unicode));
    }

    #[test]
    fn rules_for_depends() {
        let l = Locale::default();
        assert_eq!(rules_for(Charset::Depends, false, false, l), Rules::Ascii);
        assert_eq!(rules_for(Charset::Depends, true, false, l), Rules::Unicode);
        assert_eq!(rules_for(Charset::Locale, false, false, l), Rules::Latin1);
    }

    #[test]
    fn simple_fold() {
        assert_eq!(fold_simple('K' as u32), 'k' as u32);
        assert_eq!(fold_simple(0x212a), 'k' as u32); // KELVIN SIGN
        assert_eq!(fold_simple(0x17f), 's' as u32);
        assert_eq!(fold_simple(0x3c2), 0x3c3);
        assert_eq!(fold_simple(0x3a3), 0x3c3);
        // dotted capital I has only a full fold
        assert_eq!(fold_simple(0x130), 0x130);
    }

    #[test]
    fn ascii_fold_stays_in_ascii() {
        let l = Locale::default();
        assert_eq!(fold_with(FoldKind::Ascii, 'K' as u32, l), 'k' as u32);
        assert_eq!(fold_with(FoldKind::Ascii, 0x212a, l), 0x212a);
        assert_eq!(fold_with(FoldKind::Unicode, 0x212a, l), 'k' as u32);
        assert_eq!(fold_with(FoldKind::Ascii, 0xc9, l), 0xe9);
    }

    #[test]
    fn turkic_locale_fold() {
        let tr = Locale { utf8: true, turkic: true };
        assert_eq!(fold_locale('I' as u32, tr), LATIN_SMALL_DOTLESS_I);
        assert_eq!(fold_locale(0x130, tr), 'i' as u32);
        assert_eq!(fold_locale('i' as u32, tr), 'i' as u32);
        let c = Locale::default();
        assert_eq!(fold_locale('I' as u32, c), 'i' as u32);
        assert_eq!(fold_locale(0xc9, c), 0xe9);
    }
}
