// unicode/segment.rs - Segmentation property classifiers.
// Grapheme-cluster, word, sentence and line-break classes per UAX #29 and
// UAX #14, derived from range tables and the general category.

use unicode_general_category::GeneralCategory;

use super::{general_category, is_mark_category};

/// Binary search a sorted, non-overlapping inclusive range table.
pub fn in_ranges(c: u32, table: &[(u32, u32)]) -> bool {
    table
        .binary_search_by(|&(lo, hi)| {
            if hi < c {
                std::cmp::Ordering::Less
            } else if lo > c {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .is_ok()
}

// ============================================================================
// Shared tables
// ============================================================================

static EXTENDED_PICTOGRAPHIC: &[(u32, u32)] = &[
    (0x00a9, 0x00a9),
    (0x00ae, 0x00ae),
    (0x203c, 0x203c),
    (0x2049, 0x2049),
    (0x2122, 0x2122),
    (0x2139, 0x2139),
    (0x2194, 0x2199),
    (0x21a9, 0x21aa),
    (0x231a, 0x231b),
    (0x2328, 0x2328),
    (0x2388, 0x2388),
    (0x23cf, 0x23cf),
    (0x23e9, 0x23f3),
    (0x23f8, 0x23fa),
    (0x24c2, 0x24c2),
    (0x25aa, 0x25ab),
    (0x25b6, 0x25b6),
    (0x25c0, 0x25c0),
    (0x25fb, 0x25fe),
    (0x2600, 0x2605),
    (0x2607, 0x2612),
    (0x2614, 0x2685),
    (0x2690, 0x2705),
    (0x2708, 0x2712),
    (0x2714, 0x2714),
    (0x2716, 0x2716),
    (0x271d, 0x271d),
    (0x2721, 0x2721),
    (0x2728, 0x2728),
    (0x2733, 0x2734),
    (0x2744, 0x2744),
    (0x2747, 0x2747),
    (0x274c, 0x274c),
    (0x274e, 0x274e),
    (0x2753, 0x2755),
    (0x2757, 0x2757),
    (0x2763, 0x2767),
    (0x2795, 0x2797),
    (0x27a1, 0x27a1),
    (0x27b0, 0x27b0),
    (0x27bf, 0x27bf),
    (0x2934, 0x2935),
    (0x2b05, 0x2b07),
    (0x2b1b, 0x2b1c),
    (0x2b50, 0x2b50),
    (0x2b55, 0x2b55),
    (0x3030, 0x3030),
    (0x303d, 0x303d),
    (0x3297, 0x3297),
    (0x3299, 0x3299),
    (0x1f000, 0x1f0ff),
    (0x1f10d, 0x1f10f),
    (0x1f12f, 0x1f12f),
    (0x1f16c, 0x1f171),
    (0x1f17e, 0x1f17f),
    (0x1f18e, 0x1f18e),
    (0x1f191, 0x1f19a),
    (0x1f1ad, 0x1f1e5),
    (0x1f201, 0x1f20f),
    (0x1f21a, 0x1f21a),
    (0x1f22f, 0x1f22f),
    (0x1f232, 0x1f23a),
    (0x1f23c, 0x1f23f),
    (0x1f249, 0x1f3fa),
    (0x1f400, 0x1f53d),
    (0x1f546, 0x1f64f),
    (0x1f680, 0x1f6ff),
    (0x1f774, 0x1f77f),
    (0x1f7d5, 0x1f7ff),
    (0x1f80c, 0x1f80f),
    (0x1f848, 0x1f84f),
    (0x1f85a, 0x1f85f),
    (0x1f888, 0x1f88f),
    (0x1f8ae, 0x1f8ff),
    (0x1f90c, 0x1f93a),
    (0x1f93c, 0x1f945),
    (0x1f947, 0x1faff),
    (0x1fc00, 0x1fffd),
];

pub fn is_extended_pictographic(c: u32) -> bool {
    c >= 0xa9 && in_ranges(c, EXTENDED_PICTOGRAPHIC)
}

#[inline]
pub fn is_regional_indicator(c: u32) -> bool {
    (0x1f1e6..=0x1f1ff).contains(&c)
}

// Spacing marks that are nonetheless Grapheme_Extend.
static EXTEND_SPACING: &[(u32, u32)] = &[
    (0x09be, 0x09be),
    (0x09d7, 0x09d7),
    (0x0b3e, 0x0b3e),
    (0x0b57, 0x0b57),
    (0x0bbe, 0x0bbe),
    (0x0bd7, 0x0bd7),
    (0x0cc2, 0x0cc2),
    (0x0cd5, 0x0cd6),
    (0x0d3e, 0x0d3e),
    (0x0d57, 0x0d57),
    (0x0dcf, 0x0dcf),
    (0x0ddf, 0x0ddf),
    (0x1b35, 0x1b35),
    (0x302e, 0x302f),
    (0x1133e, 0x1133e),
    (0x11357, 0x11357),
    (0x114b0, 0x114b0),
    (0x114bd, 0x114bd),
    (0x115af, 0x115af),
    (0x11930, 0x11930),
    (0x1d165, 0x1d165),
    (0x1d16e, 0x1d172),
];

static PREPEND: &[(u32, u32)] = &[
    (0x0600, 0x0605),
    (0x06dd, 0x06dd),
    (0x070f, 0x070f),
    (0x0890, 0x0891),
    (0x08e2, 0x08e2),
    (0x0d4e, 0x0d4e),
    (0x110bd, 0x110bd),
    (0x110cd, 0x110cd),
    (0x111c2, 0x111c3),
    (0x1193f, 0x1193f),
    (0x11941, 0x11941),
    (0x11a3a, 0x11a3a),
    (0x11a84, 0x11a89),
    (0x11d46, 0x11d46),
];

/// Grapheme_Extend.
pub fn is_grapheme_extend(c: u32) -> bool {
    if c < 0x300 {
        return false;
    }
    if c == 0x200c
        || (0x1f3fb..=0x1f3ff).contains(&c)
        || (0xe0020..=0xe007f).contains(&c)
        || (0xff9e..=0xff9f).contains(&c)
    {
        return true;
    }
    match general_category(c) {
        GeneralCategory::NonspacingMark | GeneralCategory::EnclosingMark => true,
        GeneralCategory::SpacingMark => in_ranges(c, EXTEND_SPACING),
        _ => false,
    }
}

fn is_hangul_l(c: u32) -> bool {
    (0x1100..=0x115f).contains(&c) || (0xa960..=0xa97c).contains(&c)
}

fn is_hangul_v(c: u32) -> bool {
    (0x1160..=0x11a7).contains(&c) || (0xd7b0..=0xd7c6).contains(&c)
}

fn is_hangul_t(c: u32) -> bool {
    (0x11a8..=0x11ff).contains(&c) || (0xd7cb..=0xd7fb).contains(&c)
}

const HANGUL_SBASE: u32 = 0xac00;
const HANGUL_SLAST: u32 = 0xd7a3;
const HANGUL_TCOUNT: u32 = 28;

/// Some(true) for an LV syllable, Some(false) for LVT.
fn hangul_syllable_lv(c: u32) -> Option<bool> {
    if (HANGUL_SBASE..=HANGUL_SLAST).contains(&c) {
        Some((c - HANGUL_SBASE) % HANGUL_TCOUNT == 0)
    } else {
        None
    }
}

// ============================================================================
// Grapheme Cluster Break
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gcb {
    Other,
    CR,
    LF,
    Control,
    Extend,
    ZWJ,
    RegionalIndicator,
    Prepend,
    SpacingMark,
    L,
    V,
    T,
    LV,
    LVT,
    ExtPict,
}

pub fn gcb(c: u32) -> Gcb {
    match c {
        0x0d => return Gcb::CR,
        0x0a => return Gcb::LF,
        0x200d => return Gcb::ZWJ,
        0x20..=0x7e => return Gcb::Other,
        _ => {}
    }
    if is_regional_indicator(c) {
        return Gcb::RegionalIndicator;
    }
    if is_hangul_l(c) {
        return Gcb::L;
    }
    if is_hangul_v(c) {
        return Gcb::V;
    }
    if is_hangul_t(c) {
        return Gcb::T;
    }
    if let Some(lv) = hangul_syllable_lv(c) {
        return if lv { Gcb::LV } else { Gcb::LVT };
    }
    if in_ranges(c, PREPEND) {
        return Gcb::Prepend;
    }
    if is_grapheme_extend(c) {
        return Gcb::Extend;
    }
    match general_category(c) {
        GeneralCategory::Control
        | GeneralCategory::LineSeparator
        | GeneralCategory::ParagraphSeparator
        | GeneralCategory::Surrogate => Gcb::Control,
        GeneralCategory::Format if c != 0x200c => Gcb::Control,
        GeneralCategory::SpacingMark => Gcb::SpacingMark,
        _ if is_extended_pictographic(c) => Gcb::ExtPict,
        _ => Gcb::Other,
    }
}

// ============================================================================
// Word Break
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wb {
    Other,
    CR,
    LF,
    Newline,
    Extend,
    ZWJ,
    RegionalIndicator,
    Format,
    Katakana,
    HebrewLetter,
    ALetter,
    SingleQuote,
    DoubleQuote,
    MidNumLet,
    MidLetter,
    MidNum,
    Numeric,
    ExtendNumLet,
    WSegSpace,
}

static WB_KATAKANA: &[(u32, u32)] = &[
    (0x3031, 0x3035),
    (0x309b, 0x309c),
    (0x30a0, 0x30fa),
    (0x30fc, 0x30ff),
    (0x31f0, 0x31ff),
    (0x32d0, 0x32fe),
    (0x3300, 0x3357),
    (0xff66, 0xff9d),
    (0x1b000, 0x1b000),
    (0x1b120, 0x1b122),
    (0x1b164, 0x1b167),
];

static WB_HEBREW: &[(u32, u32)] = &[
    (0x05d0, 0x05ea),
    (0x05ef, 0x05f2),
    (0xfb1d, 0xfb1d),
    (0xfb1f, 0xfb28),
    (0xfb2a, 0xfb36),
    (0xfb38, 0xfb3c),
    (0xfb3e, 0xfb3e),
    (0xfb40, 0xfb41),
    (0xfb43, 0xfb44),
    (0xfb46, 0xfb4f),
];

static WB_MIDNUMLET: &[u32] = &[0x2e, 0x2018, 0x2019, 0x2024, 0xfe52, 0xff07, 0xff0e];
static WB_MIDLETTER: &[u32] = &[
    0x3a, 0xb7, 0x387, 0x55f, 0x5f4, 0x2027, 0xfe13, 0xfe55, 0xff1a,
];
static WB_MIDNUM: &[u32] = &[
    0x2c, 0x3b, 0x37e, 0x589, 0x60c, 0x60d, 0x66c, 0x7f8, 0x2044, 0xfe10, 0xfe14, 0xfe50, 0xfe54,
    0xff0c, 0xff1b,
];

// South-East Asian scripts segmented by dictionary, never ALetter.
static COMPLEX_CONTEXT: &[(u32, u32)] = &[
    (0x0e00, 0x0eff),
    (0x1000, 0x109f),
    (0x1780, 0x17ff),
    (0x1950, 0x19df),
    (0x1a20, 0x1aaf),
    (0xa9e0, 0xa9ff),
    (0xaa60, 0xaadf),
];

static IDEOGRAPHIC: &[(u32, u32)] = &[
    (0x3006, 0x3007),
    (0x3021, 0x3029),
    (0x3038, 0x303a),
    (0x3400, 0x4dbf),
    (0x4e00, 0x9fff),
    (0xf900, 0xfaff),
    (0x20000, 0x3ffff),
];

pub fn is_ideographic(c: u32) -> bool {
    in_ranges(c, IDEOGRAPHIC)
}

fn is_hiragana(c: u32) -> bool {
    (0x3041..=0x309f).contains(&c)
}

pub fn wb(c: u32) -> Wb {
    match c {
        0x0d => return Wb::CR,
        0x0a => return Wb::LF,
        0x0b | 0x0c | 0x85 | 0x2028 | 0x2029 => return Wb::Newline,
        0x200d => return Wb::ZWJ,
        0x27 => return Wb::SingleQuote,
        0x22 => return Wb::DoubleQuote,
        // tab is tailored in as horizontal word-separating space
        0x09 | 0x20 | 0x1680 | 0x2000..=0x2006 | 0x2008..=0x200a | 0x205f | 0x3000 => {
            return Wb::WSegSpace
        }
        0x202f => return Wb::ExtendNumLet,
        0x66b => return Wb::Numeric,
        _ => {}
    }
    if WB_MIDNUMLET.contains(&c) {
        return Wb::MidNumLet;
    }
    if WB_MIDLETTER.contains(&c) {
        return Wb::MidLetter;
    }
    if WB_MIDNUM.contains(&c) {
        return Wb::MidNum;
    }
    if is_regional_indicator(c) {
        return Wb::RegionalIndicator;
    }
    if in_ranges(c, WB_KATAKANA) {
        return Wb::Katakana;
    }
    if in_ranges(c, WB_HEBREW) {
        return Wb::HebrewLetter;
    }
    if is_grapheme_extend(c) || is_mark_category(general_category(c)) {
        return Wb::Extend;
    }
    let gc = general_category(c);
    match gc {
        GeneralCategory::Format if c != 0x200b && c != 0x200c => return Wb::Format,
        GeneralCategory::DecimalNumber => return Wb::Numeric,
        GeneralCategory::ConnectorPunctuation => return Wb::ExtendNumLet,
        _ => {}
    }
    let alphabetic = char::from_u32(c).is_some_and(|ch| ch.is_alphabetic());
    if alphabetic
        && !is_ideographic(c)
        && !is_hiragana(c)
        && !in_ranges(c, COMPLEX_CONTEXT)
    {
        return Wb::ALetter;
    }
    Wb::Other
}

// ============================================================================
// Sentence Break
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sb {
    Other,
    CR,
    LF,
    Extend,
    Sep,
    Format,
    Sp,
    Lower,
    Upper,
    OLetter,
    Numeric,
    ATerm,
    SContinue,
    STerm,
    Close,
}

static SB_STERM: &[u32] = &[
    0x21, 0x3f, 0x589, 0x61d, 0x61e, 0x61f, 0x6d4, 0x700, 0x701, 0x702, 0x7f9, 0x964, 0x965,
    0x104a, 0x104b, 0x1362, 0x1367, 0x1368, 0x166e, 0x1803, 0x1809, 0x1944, 0x1945, 0x203c,
    0x203d, 0x2047, 0x2048, 0x2049, 0x2e2e, 0x3002, 0xa4ff, 0xa60e, 0xa60f, 0xa876, 0xa877,
    0xfe56, 0xfe57, 0xff01, 0xff1f, 0xff61,
];

static SB_SCONTINUE: &[u32] = &[
    0x2c, 0x2d, 0x3a, 0x55d, 0x60c, 0x60d, 0x7f8, 0x1802, 0x1808, 0x2013, 0x2014, 0x3001, 0xfe10,
    0xfe11, 0xfe13, 0xfe31, 0xfe32, 0xfe50, 0xfe51, 0xfe55, 0xfe58, 0xfe63, 0xff0c, 0xff0d,
    0xff1a, 0xff64,
];

pub fn sb(c: u32) -> Sb {
    match c {
        0x0d => return Sb::CR,
        0x0a => return Sb::LF,
        0x85 | 0x2028 | 0x2029 => return Sb::Sep,
        0x2e | 0x2024 | 0xfe52 | 0xff0e => return Sb::ATerm,
        0x22 | 0x27 => return Sb::Close,
        0x200d => return Sb::Extend,
        _ => {}
    }
    if SB_STERM.contains(&c) {
        return Sb::STerm;
    }
    if SB_SCONTINUE.contains(&c) {
        return Sb::SContinue;
    }
    if is_grapheme_extend(c) {
        return Sb::Extend;
    }
    let gc = general_category(c);
    let Some(ch) = char::from_u32(c) else {
        return Sb::Other;
    };
    if ch.is_whitespace() {
        return Sb::Sp;
    }
    match gc {
        GeneralCategory::SpacingMark => return Sb::Extend,
        GeneralCategory::Format if c != 0x200c => return Sb::Format,
        GeneralCategory::DecimalNumber => return Sb::Numeric,
        GeneralCategory::OpenPunctuation
        | GeneralCategory::ClosePunctuation
        | GeneralCategory::InitialPunctuation
        | GeneralCategory::FinalPunctuation => return Sb::Close,
        GeneralCategory::TitlecaseLetter => return Sb::Upper,
        _ => {}
    }
    if ch.is_lowercase() {
        return Sb::Lower;
    }
    if ch.is_uppercase() {
        return Sb::Upper;
    }
    if ch.is_alphabetic() || matches!(gc, GeneralCategory::LetterNumber) {
        return Sb::OLetter;
    }
    Sb::Other
}

// ============================================================================
// Line Break
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lb {
    BK,
    CR,
    LF,
    NL,
    CM,
    ZWJ,
    WJ,
    ZW,
    GL,
    SP,
    B2,
    BA,
    BB,
    HY,
    CB,
    CL,
    CP,
    EX,
    IN,
    NS,
    OP,
    QU,
    IS,
    NU,
    PO,
    PR,
    SY,
    AL,
    EB,
    EM,
    H2,
    H3,
    HL,
    ID,
    JL,
    JV,
    JT,
    RI,
}

static LB_BA: &[(u32, u32)] = &[
    (0x0009, 0x0009),
    (0x007c, 0x007c),
    (0x00ad, 0x00ad),
    (0x058a, 0x058a),
    (0x05be, 0x05be),
    (0x0964, 0x0965),
    (0x0e5a, 0x0e5b),
    (0x0f0b, 0x0f0b),
    (0x1361, 0x1361),
    (0x1680, 0x1680),
    (0x17d4, 0x17d5),
    (0x1804, 0x1805),
    (0x2000, 0x2006),
    (0x2008, 0x200a),
    (0x2010, 0x2010),
    (0x2012, 0x2013),
    (0x2027, 0x2027),
    (0x205f, 0x205f),
    (0x2cfa, 0x2cfc),
    (0x2cff, 0x2cff),
    (0x2e0e, 0x2e15),
    (0x2e17, 0x2e17),
    (0x3000, 0x3000),
];

static LB_BB: &[u32] = &[0xb4, 0x2c8, 0x2cc, 0x2df, 0xf01, 0xf02, 0xf03, 0xf04, 0x1806, 0xa874, 0xa875];

static LB_EX: &[u32] = &[
    0x21, 0x3f, 0x5c6, 0x61b, 0x61e, 0x61f, 0x6d4, 0x7f9, 0xf0d, 0xf0e, 0xf0f, 0xf10, 0xf11,
    0xf14, 0x1802, 0x1803, 0x1808, 0x1809, 0x1944, 0x1945, 0x2762, 0x2763, 0x2cf9, 0x2cfe,
    0x2e2e, 0xa60e, 0xa876, 0xa877, 0xfe15, 0xfe16, 0xfe56, 0xfe57, 0xff01, 0xff1f,
];

static LB_IS: &[u32] = &[
    0x2c, 0x2e, 0x3a, 0x3b, 0x37e, 0x589, 0x60c, 0x60d, 0x7f8, 0x2044, 0xfe10, 0xfe13, 0xfe14,
];

static LB_CL_EXTRA: &[u32] = &[
    0x3001, 0x3002, 0xfe11, 0xfe12, 0xfe50, 0xfe52, 0xff0c, 0xff0e, 0xff61, 0xff64,
];

static LB_NS: &[(u32, u32)] = &[
    (0x17d6, 0x17d6),
    (0x203c, 0x203d),
    (0x2047, 0x2049),
    (0x3005, 0x3005),
    (0x301c, 0x301c),
    (0x303b, 0x303c),
    (0x309b, 0x309e),
    (0x30a0, 0x30a0),
    (0x30fb, 0x30fb),
    (0x30fd, 0x30fe),
    (0xa015, 0xa015),
    (0xfe54, 0xfe55),
    (0xff1a, 0xff1b),
    (0xff65, 0xff65),
    (0xff9e, 0xff9f),
];

// Small kana and prolonged sound marks (CJ), resolved to NS.
static LB_CJ: &[u32] = &[
    0x3041, 0x3043, 0x3045, 0x3047, 0x3049, 0x3063, 0x3083, 0x3085, 0x3087, 0x308e, 0x3095,
    0x3096, 0x30a1, 0x30a3, 0x30a5, 0x30a7, 0x30a9, 0x30c3, 0x30e3, 0x30e5, 0x30e7, 0x30ee,
    0x30f5, 0x30f6, 0x30fc,
];

static LB_PO: &[u32] = &[
    0x25, 0xa2, 0xb0, 0x60b, 0x66a, 0x2030, 0x2031, 0x2032, 0x2033, 0x2034, 0x2035, 0x2036,
    0x2037, 0x20a7, 0x2103, 0x2109, 0x2126, 0xfdfc, 0xfe6a, 0xff05, 0xffe0,
];

static LB_PR: &[(u32, u32)] = &[
    (0x0024, 0x0024),
    (0x002b, 0x002b),
    (0x005c, 0x005c),
    (0x00a3, 0x00a5),
    (0x00b1, 0x00b1),
    (0x058f, 0x058f),
    (0x09fb, 0x09fb),
    (0x0af1, 0x0af1),
    (0x0bf9, 0x0bf9),
    (0x0e3f, 0x0e3f),
    (0x17db, 0x17db),
    (0x20a0, 0x20a6),
    (0x20a8, 0x20c0),
    (0x2116, 0x2116),
    (0x2212, 0x2213),
    (0xfe69, 0xfe69),
    (0xff04, 0xff04),
    (0xffe1, 0xffe1),
    (0xffe5, 0xffe6),
];

static LB_QU: &[(u32, u32)] = &[
    (0x0022, 0x0022),
    (0x0027, 0x0027),
    (0x00ab, 0x00ab),
    (0x00bb, 0x00bb),
    (0x2018, 0x2019),
    (0x201b, 0x201f),
    (0x2039, 0x203a),
    (0x275b, 0x2760),
    (0x2e00, 0x2e0d),
    (0x2e1c, 0x2e1d),
    (0x2e20, 0x2e21),
];

static LB_GL: &[u32] = &[0xa0, 0x34f, 0x35c, 0x35d, 0x35e, 0x35f, 0x360, 0x361, 0x362, 0xf08, 0xf0c, 0xf12, 0x180e, 0x2007, 0x2011, 0x202f];

static LB_EB: &[(u32, u32)] = &[
    (0x261d, 0x261d),
    (0x26f9, 0x26f9),
    (0x270a, 0x270d),
    (0x1f385, 0x1f385),
    (0x1f3c2, 0x1f3c4),
    (0x1f3c7, 0x1f3c7),
    (0x1f3ca, 0x1f3cc),
    (0x1f442, 0x1f443),
    (0x1f446, 0x1f450),
    (0x1f466, 0x1f478),
    (0x1f47c, 0x1f47c),
    (0x1f481, 0x1f483),
    (0x1f485, 0x1f487),
    (0x1f4aa, 0x1f4aa),
    (0x1f574, 0x1f575),
    (0x1f57a, 0x1f57a),
    (0x1f590, 0x1f590),
    (0x1f595, 0x1f596),
    (0x1f645, 0x1f647),
    (0x1f64b, 0x1f64f),
    (0x1f6a3, 0x1f6a3),
    (0x1f6b4, 0x1f6b6),
    (0x1f6c0, 0x1f6c0),
    (0x1f6cc, 0x1f6cc),
    (0x1f90c, 0x1f90c),
    (0x1f90f, 0x1f90f),
    (0x1f918, 0x1f91f),
    (0x1f926, 0x1f926),
    (0x1f930, 0x1f939),
    (0x1f93c, 0x1f93e),
    (0x1f977, 0x1f977),
    (0x1f9b5, 0x1f9b6),
    (0x1f9b8, 0x1f9b9),
    (0x1f9bb, 0x1f9bb),
    (0x1f9cd, 0x1f9cf),
    (0x1f9d1, 0x1f9dd),
    (0x1fac3, 0x1fac5),
    (0x1faf0, 0x1faf8),
];

static LB_ID: &[(u32, u32)] = &[
    (0x2e80, 0x2fff),
    (0x3003, 0x3004),
    (0x3006, 0x3007),
    (0x3012, 0x3013),
    (0x3020, 0x3029),
    (0x3030, 0x303a),
    (0x303d, 0x303f),
    (0x3040, 0x309f),
    (0x30a0, 0x30ff),
    (0x3100, 0x31ef),
    (0x3200, 0x4dbf),
    (0x4e00, 0x9fff),
    (0xa000, 0xa48f),
    (0xf900, 0xfaff),
    (0xfe30, 0xfe4f),
    (0xff01, 0xff60),
    (0xffe0, 0xffe6),
    (0x1f000, 0x1faff),
    (0x20000, 0x3fffd),
];

/// Characters of East Asian width F, W or H, where LB30 does not apply.
pub fn is_east_asian_wide(c: u32) -> bool {
    (0x1100..=0x115f).contains(&c)
        || (0x2e80..=0xa4cf).contains(&c)
        || (0xac00..=0xd7a3).contains(&c)
        || (0xf900..=0xfaff).contains(&c)
        || (0xfe30..=0xfe4f).contains(&c)
        || (0xff00..=0xffef).contains(&c)
        || (0x1f300..=0x1f64f).contains(&c)
        || (0x20000..=0x3fffd).contains(&c)
}

/// Line-break class with the LB1 resolutions applied
/// (AI, SG, XX -> AL; CJ -> NS; SA -> CM or AL).
pub fn lb(c: u32) -> Lb {
    match c {
        0x0a => return Lb::LF,
        0x0d => return Lb::CR,
        0x85 => return Lb::NL,
        0x0b | 0x0c | 0x2028 | 0x2029 => return Lb::BK,
        0x20 => return Lb::SP,
        0x200b => return Lb::ZW,
        0x200d => return Lb::ZWJ,
        0x2060 | 0xfeff => return Lb::WJ,
        0x2014 => return Lb::B2,
        0x2d => return Lb::HY,
        0xfffc => return Lb::CB,
        0x29 | 0x5d => return Lb::CP,
        0x2f => return Lb::SY,
        0x2024..=0x2026 | 0x22ef | 0xfe19 => return Lb::IN,
        0x66b | 0x66c => return Lb::NU,
        _ => {}
    }
    if LB_GL.contains(&c) {
        return Lb::GL;
    }
    if in_ranges(c, LB_BA) {
        return Lb::BA;
    }
    if LB_BB.contains(&c) {
        return Lb::BB;
    }
    if LB_EX.contains(&c) {
        return Lb::EX;
    }
    if LB_IS.contains(&c) {
        return Lb::IS;
    }
    if LB_CL_EXTRA.contains(&c) {
        return Lb::CL;
    }
    if LB_CJ.contains(&c) || in_ranges(c, LB_NS) || (0x31f0..=0x31ff).contains(&c) {
        return Lb::NS;
    }
    if LB_PO.contains(&c) {
        return Lb::PO;
    }
    if in_ranges(c, LB_PR) {
        return Lb::PR;
    }
    if in_ranges(c, LB_QU) {
        return Lb::QU;
    }
    if is_regional_indicator(c) {
        return Lb::RI;
    }
    if (0x1f3fb..=0x1f3ff).contains(&c) {
        return Lb::EM;
    }
    if in_ranges(c, LB_EB) {
        return Lb::EB;
    }
    if is_hangul_l(c) {
        return Lb::JL;
    }
    if is_hangul_v(c) {
        return Lb::JV;
    }
    if is_hangul_t(c) {
        return Lb::JT;
    }
    if let Some(lv) = hangul_syllable_lv(c) {
        return if lv { Lb::H2 } else { Lb::H3 };
    }
    if in_ranges(c, WB_HEBREW) {
        return Lb::HL;
    }
    let gc = general_category(c);
    match gc {
        GeneralCategory::NonspacingMark
        | GeneralCategory::SpacingMark
        | GeneralCategory::EnclosingMark => return Lb::CM,
        GeneralCategory::Control => return Lb::CM,
        GeneralCategory::DecimalNumber if !(0xff10..=0xff19).contains(&c) => return Lb::NU,
        GeneralCategory::OpenPunctuation if !is_east_asian_wide(c) || c >= 0x3008 => {
            return Lb::OP
        }
        GeneralCategory::ClosePunctuation => return Lb::CL,
        _ => {}
    }
    if in_ranges(c, LB_ID) {
        return Lb::ID;
    }
    if c == 0xa1 || c == 0xbf || c == 0x2e18 {
        return Lb::OP;
    }
    Lb::AL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_search() {
        assert!(in_ranges(0x2614, EXTENDED_PICTOGRAPHIC));
        assert!(!in_ranges(0x2613, EXTENDED_PICTOGRAPHIC));
        assert!(is_extended_pictographic(0x1f600));
    }

    #[test]
    fn gcb_classes() {
        assert_eq!(gcb('a' as u32), Gcb::Other);
        assert_eq!(gcb(0x0301), Gcb::Extend);
        assert_eq!(gcb(0x1f1fa), Gcb::RegionalIndicator);
        assert_eq!(gcb(0xac00), Gcb::LV);
        assert_eq!(gcb(0xac01), Gcb::LVT);
        assert_eq!(gcb(0x1100), Gcb::L);
        assert_eq!(gcb(0x0600), Gcb::Prepend);
        assert_eq!(gcb(0x1f600), Gcb::ExtPict);
        assert_eq!(gcb(0x07), Gcb::Control);
    }

    #[test]
    fn wb_classes() {
        assert_eq!(wb('a' as u32), Wb::ALetter);
        assert_eq!(wb('5' as u32), Wb::Numeric);
        assert_eq!(wb('.' as u32), Wb::MidNumLet);
        assert_eq!(wb(':' as u32), Wb::MidLetter);
        assert_eq!(wb(',' as u32), Wb::MidNum);
        assert_eq!(wb('_' as u32), Wb::ExtendNumLet);
        assert_eq!(wb(0x05d0), Wb::HebrewLetter);
        assert_eq!(wb(0x30a2), Wb::Katakana);
        assert_eq!(wb(0x4e00), Wb::Other);
        assert_eq!(wb('\t' as u32), Wb::WSegSpace);
    }

    #[test]
    fn sb_classes() {
        assert_eq!(sb('.' as u32), Sb::ATerm);
        assert_eq!(sb('?' as u32), Sb::STerm);
        assert_eq!(sb('A' as u32), Sb::Upper);
        assert_eq!(sb('a' as u32), Sb::Lower);
        assert_eq!(sb(' ' as u32), Sb::Sp);
        assert_eq!(sb(')' as u32), Sb::Close);
        assert_eq!(sb(0x2029), Sb::Sep);
    }

    #[test]
    fn lb_classes() {
        assert_eq!(lb(' ' as u32), Lb::SP);
        assert_eq!(lb('a' as u32), Lb::AL);
        assert_eq!(lb('(' as u32), Lb::OP);
        assert_eq!(lb(')' as u32), Lb::CP);
        assert_eq!(lb('$' as u32), Lb::PR);
        assert_eq!(lb('%' as u32), Lb::PO);
        assert_eq!(lb('7' as u32), Lb::NU);
        assert_eq!(lb(0x4e00), Lb::ID);
        assert_eq!(lb(0x0301), Lb::CM);
        assert_eq!(lb(0x3041), Lb::NS);
    }
}
