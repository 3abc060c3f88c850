// regclass.rs - Compiled character classes.
// A class is a 256-bit bitmap for the low code points, locale POSIX bits,
// sorted ranges and property tests for everything else, and sets resolved
// lazily on first use. Matching is a pure predicate over one code point.

use std::sync::OnceLock;

use bitflags::bitflags;
use unicode_general_category::GeneralCategory;

use crate::error::MatchError;
use crate::regcallout::HostCallback;
use crate::regint::{Charset, Locale, Op, PosixClass};
use crate::unicode::script::{script_of, script_ranges, Script};
use crate::unicode::{
    self, fold_partners, general_category, is_mark_category, is_posix, is_punct_category,
    latin1_other_case, rules_for, Rules, LATIN_CAPITAL_I, LATIN_CAPITAL_I_WITH_DOT_ABOVE,
    LATIN_SMALL_DOTLESS_I, LATIN_SMALL_I,
};

const BITMAP_LIMIT: u32 = 256;
/// Widest range whose fold partners are added when the class is built.
const EAGER_FOLD_SPAN: u32 = 0x1000;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ClassFlags: u8 {
        /// Result is complemented.
        const INVERT = 1 << 0;
        /// Case-insensitive under the runtime locale: the 8-bit partner of
        /// the tested character is looked up as well.
        const LOC_FOLD = 1 << 1;
        /// Every code point at or above 256 matches (before inversion).
        const MATCHES_ALL_ABOVE_LATIN1 = 1 << 2;
    }
}

/// A property test applied to code points outside the bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropKind {
    Category(GeneralCategory),
    /// Any letter category (`\p{L}`).
    Letter,
    /// Any mark category (`\p{M}`).
    Mark,
    /// Any number category (`\p{N}`).
    Number,
    /// Any punctuation category (`\p{P}`).
    Punct,
    Script(Script),
    /// A POSIX class evaluated under the given charset's rules.
    Posix(PosixClass, Charset),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prop {
    pub kind: PropKind,
    pub negate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredKind {
    /// A user-defined property resolved through the host.
    User(String),
    /// The full range list of a script.
    Script(Script),
}

/// A set whose contents are computed on first use.
#[derive(Debug, Clone)]
pub struct Deferred {
    pub kind: DeferredKind,
    pub negate: bool,
    resolved: OnceLock<Vec<(u32, u32)>>,
}

impl Deferred {
    fn ranges(&self, host: Option<&dyn HostCallback>) -> Result<&[(u32, u32)], MatchError> {
        if let Some(r) = self.resolved.get() {
            return Ok(r.as_slice());
        }
        let mut ranges = match &self.kind {
            DeferredKind::Script(s) => script_ranges(*s),
            DeferredKind::User(name) => match host {
                Some(h) => h.user_property(name)?,
                None => return Err(MatchError::UnknownProperty(name.clone())),
            },
        };
        normalize(&mut ranges);
        Ok(self.resolved.get_or_init(|| ranges).as_slice())
    }
}

/// Runtime context a class may depend on.
#[derive(Clone, Copy)]
pub struct ClassCtx<'a> {
    pub utf8_target: bool,
    pub pat_utf8: bool,
    pub locale: Locale,
    pub host: Option<&'a dyn HostCallback>,
}

#[derive(Debug, Clone, Default)]
pub struct CharClass {
    bitmap: [u64; 4],
    pub flags: ClassFlags,
    /// POSIX classes evaluated against the runtime locale.
    posixl: Vec<PosixClass>,
    /// Sorted, non-overlapping ranges at or above 256.
    ranges: Vec<(u32, u32)>,
    /// Ranges too wide to close under folding eagerly; a code point also
    /// matches when one of its fold partners falls inside.
    fold_ranges: Vec<(u32, u32)>,
    props: Vec<Prop>,
    deferred: Vec<Deferred>,
}

// === Construction ===

impl CharClass {
    pub fn new() -> Self {
        CharClass::default()
    }

    pub fn from_ranges(ranges: &[(u32, u32)]) -> Self {
        let mut cc = CharClass::new();
        for &(lo, hi) in ranges {
            cc.add_range(lo, hi);
        }
        cc
    }

    pub fn add_char(&mut self, c: u32) -> &mut Self {
        self.add_range(c, c)
    }

    pub fn add_range(&mut self, lo: u32, hi: u32) -> &mut Self {
        if lo > hi {
            return self;
        }
        let mut c = lo;
        while c <= hi && c < BITMAP_LIMIT {
            self.bitmap[(c >> 6) as usize] |= 1 << (c & 63);
            c += 1;
        }
        if hi >= BITMAP_LIMIT {
            self.ranges.push((lo.max(BITMAP_LIMIT), hi));
            normalize(&mut self.ranges);
        }
        self
    }

    /// Add every simple-fold partner of the class's literal members.
    pub fn close_under_fold(&mut self) -> &mut Self {
        let mut extra = Vec::new();
        for c in 0..BITMAP_LIMIT {
            if self.in_bitmap(c) {
                extra.extend(fold_partners(c));
            }
        }
        for &(lo, hi) in &self.ranges {
            if hi - lo > EAGER_FOLD_SPAN {
                self.fold_ranges.push((lo, hi));
                continue;
            }
            for c in lo..=hi {
                extra.extend(fold_partners(c));
            }
        }
        for c in extra {
            self.add_char(c);
        }
        self
    }

    pub fn add_prop(&mut self, kind: PropKind, negate: bool) -> &mut Self {
        self.props.push(Prop { kind, negate });
        self
    }

    /// POSIX class under a fixed charset. ASCII-restricted classes are
    /// expanded into the bitmap; the others are evaluated per code point.
    pub fn add_posix(&mut self, class: PosixClass, charset: Charset, negate: bool) -> &mut Self {
        match charset {
            Charset::Ascii => {
                for c in 0..BITMAP_LIMIT {
                    if is_posix(class, c, Rules::Ascii) != negate {
                        self.add_char(c);
                    }
                }
                if negate {
                    self.add_range(BITMAP_LIMIT, unicode_max());
                }
            }
            Charset::Locale => self.posixl.push(class),
            _ => {
                self.add_prop(PropKind::Posix(class, charset), negate);
            }
        }
        self
    }

    pub fn add_user_property(&mut self, name: &str, negate: bool) -> &mut Self {
        self.deferred.push(Deferred {
            kind: DeferredKind::User(name.to_string()),
            negate,
            resolved: OnceLock::new(),
        });
        self
    }

    /// Script membership through its range list, built on first use.
    pub fn add_script_set(&mut self, script: Script, negate: bool) -> &mut Self {
        self.deferred.push(Deferred {
            kind: DeferredKind::Script(script),
            negate,
            resolved: OnceLock::new(),
        });
        self
    }

    pub fn invert(&mut self) -> &mut Self {
        self.flags.toggle(ClassFlags::INVERT);
        self
    }

    pub fn with_flags(&mut self, flags: ClassFlags) -> &mut Self {
        self.flags |= flags;
        self
    }

    pub fn build(&mut self) -> Self {
        std::mem::take(self)
    }
}

fn unicode_max() -> u32 {
    crate::regenc::MAX_CODE_POINT
}

fn normalize(ranges: &mut Vec<(u32, u32)>) {
    ranges.sort_unstable();
    let mut out: Vec<(u32, u32)> = Vec::with_capacity(ranges.len());
    for &(lo, hi) in ranges.iter() {
        match out.last_mut() {
            Some(last) if lo <= last.1.saturating_add(1) => last.1 = last.1.max(hi),
            _ => out.push((lo, hi)),
        }
    }
    *ranges = out;
}

fn in_sorted(ranges: &[(u32, u32)], c: u32) -> bool {
    ranges
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

// === Matching ===

impl CharClass {
    #[inline]
    fn in_bitmap(&self, c: u32) -> bool {
        c < BITMAP_LIMIT && self.bitmap[(c >> 6) as usize] & (1 << (c & 63)) != 0
    }

    /// True if nothing outside the bitmap can match.
    pub fn bitmap_only(&self) -> bool {
        self.posixl.is_empty()
            && self.ranges.is_empty()
            && self.props.is_empty()
            && self.deferred.is_empty()
            && !self.flags.intersects(ClassFlags::LOC_FOLD | ClassFlags::MATCHES_ALL_ABOVE_LATIN1)
    }

    /// Test a code point (or, for non-UTF-8 subjects, a byte value).
    pub fn matches(&self, c: u32, ctx: &ClassCtx<'_>) -> Result<bool, MatchError> {
        let found = self.matches_uninverted(c, ctx)?;
        Ok(found != self.flags.contains(ClassFlags::INVERT))
    }

    fn matches_uninverted(&self, c: u32, ctx: &ClassCtx<'_>) -> Result<bool, MatchError> {
        let turkic_fold = ctx.locale.turkic && self.flags.contains(ClassFlags::LOC_FOLD);

        // 1. bitmap, with the locale's case partner under /il
        if c < BITMAP_LIMIT {
            if self.in_bitmap(c) {
                return Ok(true);
            }
            if self.flags.contains(ClassFlags::LOC_FOLD)
                && !(turkic_fold && (c == LATIN_CAPITAL_I || c == LATIN_SMALL_I))
                && self.in_bitmap(latin1_other_case(c))
            {
                return Ok(true);
            }
        }

        // 2. locale POSIX classes
        if !self.posixl.is_empty() {
            let rules = if ctx.locale.utf8 { Rules::Unicode } else { Rules::Latin1 };
            let folding = self.flags.contains(ClassFlags::LOC_FOLD);
            for &class in &self.posixl {
                let class = match class {
                    PosixClass::Upper | PosixClass::Lower if folding => PosixClass::Cased,
                    other => other,
                };
                if is_posix(class, c, rules) {
                    return Ok(true);
                }
            }
        }

        // 3. everything beyond the bitmap
        if c >= BITMAP_LIMIT {
            if self.flags.contains(ClassFlags::MATCHES_ALL_ABOVE_LATIN1)
                || in_sorted(&self.ranges, c)
            {
                return Ok(true);
            }
        }
        if !self.fold_ranges.is_empty()
            && fold_partners(c).iter().any(|&p| in_sorted(&self.fold_ranges, p))
        {
            return Ok(true);
        }
        for prop in &self.props {
            if prop_matches(prop.kind, c, ctx) != prop.negate {
                return Ok(true);
            }
        }
        for set in &self.deferred {
            if in_sorted(set.ranges(ctx.host)?, c) != set.negate {
                return Ok(true);
            }
        }

        // 4. dotted and dotless I under a Turkic locale
        if turkic_fold {
            let partner = match c {
                LATIN_CAPITAL_I => Some(LATIN_SMALL_DOTLESS_I),
                LATIN_SMALL_DOTLESS_I => Some(LATIN_CAPITAL_I),
                LATIN_SMALL_I => Some(LATIN_CAPITAL_I_WITH_DOT_ABOVE),
                LATIN_CAPITAL_I_WITH_DOT_ABOVE => Some(LATIN_SMALL_I),
                _ => None,
            };
            if let Some(p) = partner {
                if self.in_bitmap(p) || in_sorted(&self.ranges, p) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

fn prop_matches(kind: PropKind, c: u32, ctx: &ClassCtx<'_>) -> bool {
    use GeneralCategory::*;
    match kind {
        PropKind::Category(gc) => general_category(c) == gc,
        PropKind::Letter => matches!(
            general_category(c),
            UppercaseLetter | LowercaseLetter | TitlecaseLetter | ModifierLetter | OtherLetter
        ),
        PropKind::Mark => is_mark_category(general_category(c)),
        PropKind::Number => matches!(general_category(c), DecimalNumber | LetterNumber | OtherNumber),
        PropKind::Punct => is_punct_category(general_category(c)),
        PropKind::Script(s) => script_of(c) == s,
        PropKind::Posix(class, charset) => {
            let rules = rules_for(charset, ctx.utf8_target, ctx.pat_utf8, ctx.locale);
            unicode::is_posix(class, c, rules)
        }
    }
}

/// Test one character against a single-width node. Nodes that are not
/// single-width never match.
pub fn node_matches(op: &Op, c: u32, ctx: &ClassCtx<'_>) -> Result<bool, MatchError> {
    Ok(match op {
        Op::Sany => true,
        Op::RegAny => c != crate::regenc::NEWLINE_CODE,
        Op::AnyOf(cc) => cc.matches(c, ctx)?,
        Op::Posix { class, charset, negate } => {
            let rules = rules_for(*charset, ctx.utf8_target, ctx.pat_utf8, ctx.locale);
            unicode::is_posix(*class, c, rules) != *negate
        }
        Op::Exact { text, fold } => match crate::regenc::decode_text(ctx.pat_utf8, text, 0) {
            Some((p, _)) => match fold {
                None => c == p,
                Some(kind) => {
                    c == p || unicode::fold_with(*kind, c, ctx.locale) == unicode::fold_with(*kind, p, ctx.locale)
                }
            },
            None => false,
        },
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::regcallout::{CalloutContext, HostValue};

    fn ctx() -> ClassCtx<'static> {
        ClassCtx { utf8_target: true, pat_utf8: true, locale: Locale::default(), host: None }
    }

    #[test]
    fn single_width_nodes() {
        let exact = Op::Exact { text: "é".as_bytes().to_vec(), fold: Some(crate::regint::FoldKind::Unicode) };
        assert!(node_matches(&exact, 0xc9, &ctx()).unwrap());
        assert!(!node_matches(&Op::RegAny, '\n' as u32, &ctx()).unwrap());
        assert!(node_matches(&Op::Sany, '\n' as u32, &ctx()).unwrap());
        let digit = Op::Posix { class: PosixClass::Digit, charset: Charset::Ascii, negate: true };
        assert!(node_matches(&digit, '٣' as u32, &ctx()).unwrap());
        assert!(!node_matches(&Op::Branch, 'a' as u32, &ctx()).unwrap());
    }

    #[test]
    fn bitmap_and_ranges() {
        let cc = CharClass::from_ranges(&[('a' as u32, 'f' as u32), (0x3b1, 0x3c9)]);
        assert!(cc.matches('c' as u32, &ctx()).unwrap());
        assert!(!cc.matches('g' as u32, &ctx()).unwrap());
        assert!(cc.matches('λ' as u32, &ctx()).unwrap());
        assert!(!cc.bitmap_only());
    }

    #[test]
    fn inverted_class() {
        let cc = CharClass::new().add_char('x' as u32).invert().build();
        assert!(!cc.matches('x' as u32, &ctx()).unwrap());
        assert!(cc.matches('y' as u32, &ctx()).unwrap());
        assert!(cc.matches(0x1F600, &ctx()).unwrap());
    }

    #[test]
    fn depends_charset_follows_target() {
        let cc = CharClass::new().add_posix(PosixClass::Word, Charset::Depends, false).build();
        let mut c = ctx();
        assert!(cc.matches(0xe9, &c).unwrap());
        c.utf8_target = false;
        c.pat_utf8 = false;
        assert!(!cc.matches(0xe9, &c).unwrap());
        assert!(cc.matches('q' as u32, &c).unwrap());
    }

    #[test]
    fn locale_fold_uses_partner() {
        let cc = CharClass::new()
            .add_char('k' as u32)
            .with_flags(ClassFlags::LOC_FOLD)
            .build();
        assert!(cc.matches('K' as u32, &ctx()).unwrap());
    }

    #[test]
    fn turkic_i_exception() {
        let cc = CharClass::new()
            .add_char('i' as u32)
            .with_flags(ClassFlags::LOC_FOLD)
            .build();
        let mut c = ctx();
        c.locale = Locale { utf8: true, turkic: true };
        assert!(cc.matches(LATIN_CAPITAL_I_WITH_DOT_ABOVE, &c).unwrap());
        assert!(!cc.matches('I' as u32, &c).unwrap());
        c.locale.turkic = false;
        assert!(cc.matches('I' as u32, &c).unwrap());
    }

    #[test]
    fn locale_posix_upper_is_cased_under_fold() {
        let cc = CharClass::new()
            .add_posix(PosixClass::Upper, Charset::Locale, false)
            .with_flags(ClassFlags::LOC_FOLD)
            .build();
        assert!(cc.matches('a' as u32, &ctx()).unwrap());
    }

    #[test]
    fn fold_closure_adds_kelvin() {
        let cc = CharClass::from_ranges(&[('k' as u32, 'k' as u32)]).close_under_fold().build();
        assert!(cc.matches(0x212a, &ctx()).unwrap());
        assert!(cc.matches('K' as u32, &ctx()).unwrap());
    }

    #[test]
    fn wide_range_folds_at_match_time() {
        let cc = CharClass::from_ranges(&[(0x1000, 0x2200)]).close_under_fold().build();
        // Cherokee U+13A0 has its lowercase partner at U+AB70
        assert!(cc.matches(0xab70, &ctx()).unwrap());
        assert!(!cc.matches(0x4e00, &ctx()).unwrap());
        let cc = CharClass::from_ranges(&[(0x2000, 0x3100)]).close_under_fold().build();
        assert!(cc.matches('k' as u32, &ctx()).unwrap());
        assert!(cc.matches('K' as u32, &ctx()).unwrap());
        assert!(!cc.matches('j' as u32, &ctx()).unwrap());
    }

    #[test]
    fn script_set_resolves_lazily() {
        let cc = CharClass::new().add_script_set(Script::Greek, false).build();
        assert!(cc.matches('ω' as u32, &ctx()).unwrap());
        assert!(!cc.matches('w' as u32, &ctx()).unwrap());
    }

    struct Vowels;
    impl HostCallback for Vowels {
        fn run(&self, _code: usize, _ctx: &CalloutContext<'_>) -> Result<HostValue, MatchError> {
            Ok(HostValue::Undef)
        }
        fn user_property(&self, name: &str) -> Result<Vec<(u32, u32)>, MatchError> {
            match name {
                "IsVowel" => Ok("aeiou".chars().map(|c| (c as u32, c as u32)).collect()),
                _ => Err(MatchError::UnknownProperty(name.to_string())),
            }
        }
    }

    #[test]
    fn user_property_through_host() {
        let cc = CharClass::new().add_user_property("IsVowel", false).build();
        let host = Vowels;
        let mut c = ctx();
        assert!(matches!(cc.matches('e' as u32, &c), Err(MatchError::UnknownProperty(_))));
        c.host = Some(&host);
        assert!(cc.matches('e' as u32, &c).unwrap());
        assert!(!cc.matches('z' as u32, &c).unwrap());
    }
}
