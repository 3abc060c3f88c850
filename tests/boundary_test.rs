// boundary_test.rs - Boundary assertions driven through the matcher.
// Each helper lists every offset where the zero-width assertion holds, by
// iterating empty matches over the subject.

use regmatch::prelude::*;
use regmatch::regint::{BoundKind, Charset};

fn bound(kind: BoundKind, charset: Charset, negate: bool) -> Regex {
    let prog = ProgramBuilder::new(Pat::Bound { kind, charset, negate }).build().unwrap();
    Regex::new(prog).unwrap()
}

fn offsets(re: &Regex, subject: &str) -> Vec<usize> {
    re.find_iter(subject).map(|m| m.unwrap().start()).collect()
}

#[test]
fn traditional_depends_on_charset() {
    let unicode = bound(BoundKind::Traditional, Charset::Unicode, false);
    let ascii = bound(BoundKind::Traditional, Charset::Ascii, false);
    assert_eq!(offsets(&unicode, "café"), [0, 5]);
    assert_eq!(offsets(&ascii, "café"), [0, 3]);
}

#[test]
fn negated_traditional() {
    let nb = bound(BoundKind::Traditional, Charset::Unicode, true);
    assert_eq!(offsets(&nb, "ab c"), [1]);
}

#[test]
fn empty_subject_has_no_boundary() {
    for kind in [BoundKind::Traditional, BoundKind::Gcb, BoundKind::Wb, BoundKind::Sb, BoundKind::Lb] {
        let re = bound(kind, Charset::Unicode, false);
        assert!(!re.is_match("").unwrap(), "{:?}", kind);
    }
}

#[test]
fn word_break_property() {
    let re = bound(BoundKind::Wb, Charset::Unicode, false);
    assert_eq!(offsets(&re, "can't stop"), [0, 5, 6, 10]);
}

#[test]
fn grapheme_break_property() {
    let re = bound(BoundKind::Gcb, Charset::Unicode, false);
    assert_eq!(offsets(&re, "e\u{301}x"), [0, 3, 4]);
}

#[test]
fn sentence_break_inside_pattern() {
    let prog = ProgramBuilder::new(Pat::seq([
        Pat::Bound { kind: BoundKind::Sb, charset: Charset::Unicode, negate: false },
        Pat::plus(Pat::posix(PosixClass::Upper)),
    ]))
    .build()
    .unwrap();
    let re = Regex::new(prog).unwrap();
    let starts: Vec<_> = re.find_iter("Hi. Bye.").map(|m| m.unwrap().range()).collect();
    assert_eq!(starts, [0..1, 4..5]);
}

#[test]
fn line_break_opportunities() {
    let re = bound(BoundKind::Lb, Charset::Unicode, false);
    assert_eq!(offsets(&re, "ab cd"), [3, 5]);
}
