// unicode/script.rs - Script property tables.
// Script ranges for the major scripts, a Script_Extensions table for shared
// marks and digits, and the zeros of every decimal-digit sequence.

use bitflags::bitflags;
use unicode_general_category::GeneralCategory;

use super::general_category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Script {
    Common,
    Inherited,
    Unknown,
    Latin,
    Greek,
    Coptic,
    Cyrillic,
    Armenian,
    Hebrew,
    Arabic,
    Syriac,
    Thaana,
    Nko,
    Devanagari,
    Bengali,
    Gurmukhi,
    Gujarati,
    Oriya,
    Tamil,
    Telugu,
    Kannada,
    Malayalam,
    Sinhala,
    Thai,
    Lao,
    Tibetan,
    Myanmar,
    Georgian,
    Hangul,
    Ethiopic,
    Cherokee,
    Khmer,
    Mongolian,
    Hiragana,
    Katakana,
    Bopomofo,
    Han,
}

bitflags! {
    /// A set of scripts, including the virtual CJK writing systems a Han
    /// character may belong to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ScriptSet: u64 {
        const LATIN = 1 << 0;
        const GREEK = 1 << 1;
        const COPTIC = 1 << 2;
        const CYRILLIC = 1 << 3;
        const ARMENIAN = 1 << 4;
        const HEBREW = 1 << 5;
        const ARABIC = 1 << 6;
        const SYRIAC = 1 << 7;
        const THAANA = 1 << 8;
        const NKO = 1 << 9;
        const DEVANAGARI = 1 << 10;
        const BENGALI = 1 << 11;
        const GURMUKHI = 1 << 12;
        const GUJARATI = 1 << 13;
        const ORIYA = 1 << 14;
        const TAMIL = 1 << 15;
        const TELUGU = 1 << 16;
        const KANNADA = 1 << 17;
        const MALAYALAM = 1 << 18;
        const SINHALA = 1 << 19;
        const THAI = 1 << 20;
        const LAO = 1 << 21;
        const TIBETAN = 1 << 22;
        const MYANMAR = 1 << 23;
        const GEORGIAN = 1 << 24;
        const HANGUL = 1 << 25;
        const ETHIOPIC = 1 << 26;
        const CHEROKEE = 1 << 27;
        const KHMER = 1 << 28;
        const MONGOLIAN = 1 << 29;
        const HIRAGANA = 1 << 30;
        const KATAKANA = 1 << 31;
        const BOPOMOFO = 1 << 32;
        const HAN = 1 << 33;
        // Virtual writing systems.
        const JPAN = 1 << 40;
        const KORE = 1 << 41;
        const HANB = 1 << 42;
    }
}

impl Script {
    /// Short ISO 15924 code.
    pub fn code(self) -> &'static str {
        match self {
            Script::Common => "Zyyy",
            Script::Inherited => "Zinh",
            Script::Unknown => "Zzzz",
            Script::Latin => "Latn",
            Script::Greek => "Grek",
            Script::Coptic => "Copt",
            Script::Cyrillic => "Cyrl",
            Script::Armenian => "Armn",
            Script::Hebrew => "Hebr",
            Script::Arabic => "Arab",
            Script::Syriac => "Syrc",
            Script::Thaana => "Thaa",
            Script::Nko => "Nkoo",
            Script::Devanagari => "Deva",
            Script::Bengali => "Beng",
            Script::Gurmukhi => "Guru",
            Script::Gujarati => "Gujr",
            Script::Oriya => "Orya",
            Script::Tamil => "Taml",
            Script::Telugu => "Telu",
            Script::Kannada => "Knda",
            Script::Malayalam => "Mlym",
            Script::Sinhala => "Sinh",
            Script::Thai => "Thai",
            Script::Lao => "Laoo",
            Script::Tibetan => "Tibt",
            Script::Myanmar => "Mymr",
            Script::Georgian => "Geor",
            Script::Hangul => "Hang",
            Script::Ethiopic => "Ethi",
            Script::Cherokee => "Cher",
            Script::Khmer => "Khmr",
            Script::Mongolian => "Mong",
            Script::Hiragana => "Hira",
            Script::Katakana => "Kana",
            Script::Bopomofo => "Bopo",
            Script::Han => "Hani",
        }
    }

    /// The set a character of this script constrains a run to. Empty for
    /// Common, Inherited and Unknown.
    pub fn as_set(self) -> ScriptSet {
        match self {
            Script::Common | Script::Inherited | Script::Unknown => ScriptSet::empty(),
            Script::Latin => ScriptSet::LATIN,
            Script::Greek => ScriptSet::GREEK,
            Script::Coptic => ScriptSet::COPTIC,
            Script::Cyrillic => ScriptSet::CYRILLIC,
            Script::Armenian => ScriptSet::ARMENIAN,
            Script::Hebrew => ScriptSet::HEBREW,
            Script::Arabic => ScriptSet::ARABIC,
            Script::Syriac => ScriptSet::SYRIAC,
            Script::Thaana => ScriptSet::THAANA,
            Script::Nko => ScriptSet::NKO,
            Script::Devanagari => ScriptSet::DEVANAGARI,
            Script::Bengali => ScriptSet::BENGALI,
            Script::Gurmukhi => ScriptSet::GURMUKHI,
            Script::Gujarati => ScriptSet::GUJARATI,
            Script::Oriya => ScriptSet::ORIYA,
            Script::Tamil => ScriptSet::TAMIL,
            Script::Telugu => ScriptSet::TELUGU,
            Script::Kannada => ScriptSet::KANNADA,
            Script::Malayalam => ScriptSet::MALAYALAM,
            Script::Sinhala => ScriptSet::SINHALA,
            Script::Thai => ScriptSet::THAI,
            Script::Lao => ScriptSet::LAO,
            Script::Tibetan => ScriptSet::TIBETAN,
            Script::Myanmar => ScriptSet::MYANMAR,
            Script::Georgian => ScriptSet::GEORGIAN,
            Script::Hangul => ScriptSet::HANGUL.union(ScriptSet::KORE),
            Script::Ethiopic => ScriptSet::ETHIOPIC,
            Script::Cherokee => ScriptSet::CHEROKEE,
            Script::Khmer => ScriptSet::KHMER,
            Script::Mongolian => ScriptSet::MONGOLIAN,
            Script::Hiragana => ScriptSet::HIRAGANA.union(ScriptSet::JPAN),
            Script::Katakana => ScriptSet::KATAKANA.union(ScriptSet::JPAN),
            Script::Bopomofo => ScriptSet::BOPOMOFO.union(ScriptSet::HANB),
            Script::Han => ScriptSet::HAN
                .union(ScriptSet::JPAN)
                .union(ScriptSet::KORE)
                .union(ScriptSet::HANB),
        }
    }
}

use Script::*;

static SCRIPT_RANGES: &[(u32, u32, Script)] = &[
    (0x0041, 0x005a, Latin),
    (0x0061, 0x007a, Latin),
    (0x00aa, 0x00aa, Latin),
    (0x00ba, 0x00ba, Latin),
    (0x00c0, 0x00d6, Latin),
    (0x00d8, 0x00f6, Latin),
    (0x00f8, 0x02b8, Latin),
    (0x02e0, 0x02e4, Latin),
    (0x02ea, 0x02eb, Bopomofo),
    (0x0300, 0x036f, Inherited),
    (0x0370, 0x0373, Greek),
    (0x0375, 0x0377, Greek),
    (0x037a, 0x037d, Greek),
    (0x037f, 0x037f, Greek),
    (0x0384, 0x0384, Greek),
    (0x0386, 0x0386, Greek),
    (0x0388, 0x03e1, Greek),
    (0x03e2, 0x03ef, Coptic),
    (0x03f0, 0x03ff, Greek),
    (0x0400, 0x0484, Cyrillic),
    (0x0485, 0x0486, Inherited),
    (0x0487, 0x052f, Cyrillic),
    (0x0531, 0x0556, Armenian),
    (0x0559, 0x058a, Armenian),
    (0x058d, 0x058f, Armenian),
    (0x0591, 0x05c7, Hebrew),
    (0x05d0, 0x05ea, Hebrew),
    (0x05ef, 0x05f4, Hebrew),
    (0x0600, 0x0604, Arabic),
    (0x0606, 0x060b, Arabic),
    (0x060d, 0x061a, Arabic),
    (0x061c, 0x061e, Arabic),
    (0x0620, 0x063f, Arabic),
    (0x0641, 0x064a, Arabic),
    (0x064b, 0x0655, Inherited),
    (0x0656, 0x066f, Arabic),
    (0x0670, 0x0670, Inherited),
    (0x0671, 0x06dc, Arabic),
    (0x06de, 0x06ff, Arabic),
    (0x0700, 0x070d, Syriac),
    (0x070f, 0x074a, Syriac),
    (0x074d, 0x074f, Syriac),
    (0x0750, 0x077f, Arabic),
    (0x0780, 0x07b1, Thaana),
    (0x07c0, 0x07fa, Nko),
    (0x07fd, 0x07ff, Nko),
    (0x0860, 0x086a, Syriac),
    (0x0870, 0x08e1, Arabic),
    (0x08e3, 0x08ff, Arabic),
    (0x0900, 0x0950, Devanagari),
    (0x0951, 0x0954, Inherited),
    (0x0955, 0x0963, Devanagari),
    (0x0966, 0x097f, Devanagari),
    (0x0980, 0x09fe, Bengali),
    (0x0a01, 0x0a76, Gurmukhi),
    (0x0a81, 0x0aff, Gujarati),
    (0x0b01, 0x0b77, Oriya),
    (0x0b82, 0x0bfa, Tamil),
    (0x0c00, 0x0c7f, Telugu),
    (0x0c80, 0x0cf3, Kannada),
    (0x0d00, 0x0d7f, Malayalam),
    (0x0d81, 0x0df4, Sinhala),
    (0x0e01, 0x0e3a, Thai),
    (0x0e40, 0x0e5b, Thai),
    (0x0e81, 0x0edf, Lao),
    (0x0f00, 0x0fd4, Tibetan),
    (0x0fd9, 0x0fda, Tibetan),
    (0x1000, 0x109f, Myanmar),
    (0x10a0, 0x10fa, Georgian),
    (0x10fc, 0x10ff, Georgian),
    (0x1100, 0x11ff, Hangul),
    (0x1200, 0x139f, Ethiopic),
    (0x13a0, 0x13fd, Cherokee),
    (0x1780, 0x17dd, Khmer),
    (0x17e0, 0x17e9, Khmer),
    (0x17f0, 0x17f9, Khmer),
    (0x1800, 0x1801, Mongolian),
    (0x1804, 0x1804, Mongolian),
    (0x1806, 0x18aa, Mongolian),
    (0x19e0, 0x19ff, Khmer),
    (0x1ab0, 0x1aff, Inherited),
    (0x1c80, 0x1c88, Cyrillic),
    (0x1c90, 0x1cbf, Georgian),
    (0x1cd0, 0x1cd2, Inherited),
    (0x1cd4, 0x1ce0, Inherited),
    (0x1ce2, 0x1ce8, Inherited),
    (0x1ced, 0x1ced, Inherited),
    (0x1cf4, 0x1cf4, Inherited),
    (0x1cf8, 0x1cf9, Inherited),
    (0x1d00, 0x1d25, Latin),
    (0x1d26, 0x1d2a, Greek),
    (0x1d2b, 0x1d2b, Cyrillic),
    (0x1d2c, 0x1d5c, Latin),
    (0x1d5d, 0x1d61, Greek),
    (0x1d62, 0x1d65, Latin),
    (0x1d66, 0x1d6a, Greek),
    (0x1d6b, 0x1d77, Latin),
    (0x1d78, 0x1d78, Cyrillic),
    (0x1d79, 0x1dbe, Latin),
    (0x1dbf, 0x1dbf, Greek),
    (0x1dc0, 0x1dff, Inherited),
    (0x1e00, 0x1eff, Latin),
    (0x1f00, 0x1ffe, Greek),
    (0x200c, 0x200d, Inherited),
    (0x2071, 0x2071, Latin),
    (0x207f, 0x207f, Latin),
    (0x2090, 0x209c, Latin),
    (0x20d0, 0x20f0, Inherited),
    (0x2126, 0x2126, Greek),
    (0x212a, 0x212b, Latin),
    (0x2132, 0x2132, Latin),
    (0x214e, 0x214e, Latin),
    (0x2160, 0x2188, Latin),
    (0x2c60, 0x2c7f, Latin),
    (0x2c80, 0x2cff, Coptic),
    (0x2d00, 0x2d2d, Georgian),
    (0x2d80, 0x2dde, Ethiopic),
    (0x2de0, 0x2dff, Cyrillic),
    (0x2e80, 0x2fd5, Han),
    (0x3005, 0x3005, Han),
    (0x3007, 0x3007, Han),
    (0x3021, 0x3029, Han),
    (0x302a, 0x302d, Inherited),
    (0x3038, 0x303b, Han),
    (0x3041, 0x3096, Hiragana),
    (0x3099, 0x309a, Inherited),
    (0x309d, 0x309f, Hiragana),
    (0x30a1, 0x30fa, Katakana),
    (0x30fd, 0x30ff, Katakana),
    (0x3105, 0x312f, Bopomofo),
    (0x3131, 0x318e, Hangul),
    (0x31a0, 0x31bf, Bopomofo),
    (0x31f0, 0x31ff, Katakana),
    (0x3200, 0x321e, Hangul),
    (0x3260, 0x327e, Hangul),
    (0x32d0, 0x32fe, Katakana),
    (0x3300, 0x3357, Katakana),
    (0x3400, 0x4dbf, Han),
    (0x4e00, 0x9fff, Han),
    (0xa640, 0xa69f, Cyrillic),
    (0xa722, 0xa787, Latin),
    (0xa78b, 0xa7ca, Latin),
    (0xa7f2, 0xa7ff, Latin),
    (0xa8e0, 0xa8ff, Devanagari),
    (0xa960, 0xa97c, Hangul),
    (0xa9e0, 0xa9fe, Myanmar),
    (0xaa60, 0xaa7f, Myanmar),
    (0xab01, 0xab2e, Ethiopic),
    (0xab30, 0xab5a, Latin),
    (0xab5c, 0xab64, Latin),
    (0xab65, 0xab65, Greek),
    (0xab70, 0xabbf, Cherokee),
    (0xac00, 0xd7a3, Hangul),
    (0xd7b0, 0xd7fb, Hangul),
    (0xf900, 0xfad9, Han),
    (0xfb00, 0xfb06, Latin),
    (0xfb13, 0xfb17, Armenian),
    (0xfb1d, 0xfb4f, Hebrew),
    (0xfb50, 0xfdff, Arabic),
    (0xfe00, 0xfe0f, Inherited),
    (0xfe20, 0xfe2d, Inherited),
    (0xfe2e, 0xfe2f, Cyrillic),
    (0xfe70, 0xfefc, Arabic),
    (0xff21, 0xff3a, Latin),
    (0xff41, 0xff5a, Latin),
    (0xff66, 0xff6f, Katakana),
    (0xff71, 0xff9d, Katakana),
    (0xffa0, 0xffdc, Hangul),
    (0x101fd, 0x101fd, Inherited),
    (0x1b000, 0x1b000, Katakana),
    (0x1b001, 0x1b11f, Hiragana),
    (0x1d167, 0x1d169, Inherited),
    (0x1d17b, 0x1d182, Inherited),
    (0x1d185, 0x1d18b, Inherited),
    (0x1d1aa, 0x1d1ad, Inherited),
    (0x1f200, 0x1f200, Hiragana),
    (0x20000, 0x3134a, Han),
    (0xe0100, 0xe01ef, Inherited),
];

/// Script property of `c`. Letters, marks and digits outside the tables
/// are Unknown; everything else defaults to Common.
pub fn script_of(c: u32) -> Script {
    let found = SCRIPT_RANGES.binary_search_by(|&(lo, hi, _)| {
        if hi < c {
            std::cmp::Ordering::Less
        } else if lo > c {
            std::cmp::Ordering::Greater
        } else {
            std::cmp::Ordering::Equal
        }
    });
    if let Ok(i) = found {
        return SCRIPT_RANGES[i].2;
    }
    use GeneralCategory::*;
    match general_category(c) {
        UppercaseLetter | LowercaseLetter | TitlecaseLetter | ModifierLetter | OtherLetter
        | NonspacingMark | SpacingMark | EnclosingMark => Script::Unknown,
        DecimalNumber if c >= 0x80 && !(0xff10..=0xff19).contains(&c) && !(0x1d7ce..=0x1d7ff).contains(&c) => {
            Script::Unknown
        }
        Unassigned | PrivateUse | Surrogate => Script::Unknown,
        _ => Script::Common,
    }
}

/// Every code point in `script`, as inclusive ranges.
pub fn script_ranges(script: Script) -> Vec<(u32, u32)> {
    SCRIPT_RANGES
        .iter()
        .filter(|&&(_, _, s)| s == script)
        .map(|&(lo, hi, _)| (lo, hi))
        .collect()
}

const INDIC_DANDA: ScriptSet = ScriptSet::DEVANAGARI
    .union(ScriptSet::BENGALI)
    .union(ScriptSet::GURMUKHI)
    .union(ScriptSet::GUJARATI)
    .union(ScriptSet::ORIYA)
    .union(ScriptSet::TAMIL)
    .union(ScriptSet::TELUGU)
    .union(ScriptSet::KANNADA)
    .union(ScriptSet::MALAYALAM)
    .union(ScriptSet::SINHALA);

const CJK_PUNCT: ScriptSet = ScriptSet::BOPOMOFO
    .union(ScriptSet::HANGUL)
    .union(ScriptSet::HAN)
    .union(ScriptSet::HIRAGANA)
    .union(ScriptSet::KATAKANA)
    .union(ScriptSet::JPAN)
    .union(ScriptSet::KORE)
    .union(ScriptSet::HANB);

const KANA: ScriptSet = ScriptSet::HIRAGANA
    .union(ScriptSet::KATAKANA)
    .union(ScriptSet::JPAN);

static SCRIPT_EXTENSIONS: &[(u32, u32, ScriptSet)] = &[
    (0x0640, 0x0640, ScriptSet::ARABIC.union(ScriptSet::SYRIAC)),
    (0x060c, 0x060c, ScriptSet::ARABIC.union(ScriptSet::NKO).union(ScriptSet::SYRIAC).union(ScriptSet::THAANA)),
    (0x061b, 0x061b, ScriptSet::ARABIC.union(ScriptSet::NKO).union(ScriptSet::SYRIAC).union(ScriptSet::THAANA)),
    (0x061f, 0x061f, ScriptSet::ARABIC.union(ScriptSet::NKO).union(ScriptSet::SYRIAC).union(ScriptSet::THAANA)),
    (0x0660, 0x0669, ScriptSet::ARABIC.union(ScriptSet::THAANA)),
    (0x06f0, 0x06f9, ScriptSet::ARABIC),
    (0x0951, 0x0952, INDIC_DANDA.union(ScriptSet::LATIN)),
    (0x0964, 0x0965, INDIC_DANDA),
    (0x1802, 0x1803, ScriptSet::MONGOLIAN),
    (0x1805, 0x1805, ScriptSet::MONGOLIAN),
    (0x3001, 0x3003, CJK_PUNCT),
    (0x3008, 0x3011, CJK_PUNCT),
    (0x3099, 0x309c, KANA),
    (0x30a0, 0x30a0, KANA),
    (0x30fb, 0x30fb, CJK_PUNCT),
    (0x30fc, 0x30fc, KANA),
    (0xff70, 0xff70, KANA),
];

/// Script_Extensions of `c` when it differs from its Script property.
pub fn script_extensions(c: u32) -> Option<ScriptSet> {
    SCRIPT_EXTENSIONS
        .iter()
        .find(|&&(lo, hi, _)| lo <= c && c <= hi)
        .map(|&(_, _, set)| set)
}

static DIGIT_ZEROS: &[u32] = &[
    0x0030, 0x0660, 0x06f0, 0x07c0, 0x0966, 0x09e6, 0x0a66, 0x0ae6, 0x0b66, 0x0be6, 0x0c66,
    0x0ce6, 0x0d66, 0x0de6, 0x0e50, 0x0ed0, 0x0f20, 0x1040, 0x1090, 0x17e0, 0x1810, 0x1946,
    0x19d0, 0x1a80, 0x1a90, 0x1b50, 0x1bb0, 0x1c40, 0x1c50, 0xa620, 0xa8d0, 0xa900, 0xa9d0,
    0xa9f0, 0xaa50, 0xabf0, 0xff10, 0x104a0, 0x10d30, 0x11066, 0x110f0, 0x11136, 0x111d0,
    0x112f0, 0x11450, 0x114d0, 0x11650, 0x116c0, 0x11730, 0x118e0, 0x11950, 0x11c50, 0x11d50,
    0x11da0, 0x11f50, 0x16a60, 0x16ac0, 0x16b50, 0x1d7ce, 0x1d7d8, 0x1d7e2, 0x1d7ec, 0x1d7f6,
    0x1e140, 0x1e2f0, 0x1e4f0, 0x1e950, 0x1fbf0,
];

/// The zero of the decimal-digit sequence containing `c`, if `c` is a
/// decimal digit.
pub fn digit_zero(c: u32) -> Option<u32> {
    if general_category(c) != GeneralCategory::DecimalNumber {
        return None;
    }
    let i = match DIGIT_ZEROS.binary_search(&c) {
        Ok(i) => i,
        Err(0) => return None,
        Err(i) => i - 1,
    };
    let zero = DIGIT_ZEROS[i];
    if c - zero < 10 {
        Some(zero)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_lookup() {
        assert_eq!(script_of('a' as u32), Latin);
        assert_eq!(script_of('α' as u32), Greek);
        assert_eq!(script_of('Ж' as u32), Cyrillic);
        assert_eq!(script_of('1' as u32), Common);
        assert_eq!(script_of(' ' as u32), Common);
        assert_eq!(script_of(0x0301), Inherited);
        assert_eq!(script_of(0x0663), Arabic);
        assert_eq!(script_of('漢' as u32), Han);
        assert_eq!(script_of('ひ' as u32), Hiragana);
    }

    #[test]
    fn han_sets_overlap_japanese() {
        let han = Han.as_set();
        assert!(han.intersects(Hiragana.as_set()));
        assert!(han.intersects(Hangul.as_set()));
        assert!(!Hiragana.as_set().intersects(Hangul.as_set()));
    }

    #[test]
    fn digit_zeros() {
        assert_eq!(digit_zero('7' as u32), Some(0x30));
        assert_eq!(digit_zero(0x0663), Some(0x0660));
        assert_eq!(digit_zero(0x1d7d9), Some(0x1d7d8));
        assert_eq!(digit_zero('a' as u32), None);
    }

    #[test]
    fn extensions() {
        assert!(script_extensions(0x0640).is_some_and(|s| s.contains(ScriptSet::SYRIAC)));
        assert!(script_extensions('a' as u32).is_none());
        assert_eq!(script_ranges(Thaana), vec![(0x0780, 0x07b1)]);
    }
}
