// api_test.rs - Integration tests for the high-level Rust API.

use regmatch::api::{Regex, Subject};
use regmatch::error::MatchError;
use regmatch::prelude::*;

fn regex(pat: Pat) -> Regex {
    Regex::new(ProgramBuilder::new(pat).build().unwrap()).unwrap()
}

fn digits() -> Pat {
    Pat::plus(Pat::posix(PosixClass::Digit))
}

/// `(\d{4})-(\d{2})-(\d{2})` with the groups named year, month and day.
fn date() -> Regex {
    let d = |n| Pat::repeat(Pat::posix(PosixClass::Digit), n, n);
    let pat = Pat::seq([
        Pat::group(1, d(4)),
        Pat::lit("-"),
        Pat::group(2, d(2)),
        Pat::lit("-"),
        Pat::group(3, d(2)),
    ]);
    let prog = ProgramBuilder::new(pat)
        .name("year", 1)
        .name("month", 2)
        .name("day", 3)
        .build()
        .unwrap();
    Regex::new(prog).unwrap()
}

// === Regex::new ===

#[test]
fn simple_program() {
    let re = regex(digits());
    let m = re.find("abc 123 def").unwrap().unwrap();
    assert_eq!(m.as_str(), Some("123"));
}

#[test]
fn unicode_class() {
    let re = regex(Pat::plus(Pat::posix(PosixClass::Alpha)));
    let m = re.find("42 せかい!").unwrap().unwrap();
    assert_eq!(m.as_str(), Some("せかい"));
}

#[test]
fn empty_program_matches_empty() {
    let re = regex(Pat::Empty);
    let m = re.find("hello").unwrap().unwrap();
    assert_eq!((m.start(), m.end()), (0, 0));
    assert!(m.is_empty());
}

#[test]
fn corrupt_program_rejected() {
    let mut prog = ProgramBuilder::new(Pat::lit("a")).build().unwrap();
    prog.nodes[0].next = 1000;
    assert!(matches!(Regex::new(prog), Err(MatchError::CorruptProgram { node: 0, .. })));
}

#[test]
fn builder_rejects_undefined_names() {
    let err = ProgramBuilder::new(Pat::lit("a")).name("x", 1).build().unwrap_err();
    assert!(matches!(err, MatchError::InvalidArgument(_)));
    let err = ProgramBuilder::new(Pat::Recurse(2)).build().unwrap_err();
    assert!(matches!(err, MatchError::InvalidArgument(_)));
}

// === Regex::is_match / find ===

#[test]
fn is_match() {
    let re = regex(Pat::lit("world"));
    assert!(re.is_match("hello world").unwrap());
    assert!(!re.is_match("hello").unwrap());
}

#[test]
fn find_range_and_bytes() {
    let re = regex(digits());
    let m = re.find("ab 2024 cd").unwrap().unwrap();
    assert_eq!(m.start(), 3);
    assert_eq!(m.end(), 7);
    assert_eq!(m.range(), 3..7);
    assert_eq!(m.as_bytes(), b"2024");
    assert_eq!(m.len(), 4);
}

// === Regex::captures ===

#[test]
fn captures_groups() {
    let caps = date().captures("on 2024-01-15.").unwrap().unwrap();
    assert_eq!(caps.len(), 4);
    assert_eq!(caps.get(0).unwrap().as_str(), Some("2024-01-15"));
    assert_eq!(caps.get(1).unwrap().as_str(), Some("2024"));
    assert_eq!(caps.get(3).unwrap().as_str(), Some("15"));
    assert!(caps.get(4).is_none());
    assert_eq!(caps.last_paren(), 3);
    assert_eq!(caps.last_close_paren(), 3);
}

#[test]
fn captures_named() {
    let caps = date().captures("2024-01-15").unwrap().unwrap();
    assert_eq!(caps.name("month").unwrap().as_str(), Some("01"));
    assert_eq!(caps.name("day").unwrap().range(), 8..10);
    assert!(caps.name("hour").is_none());
}

#[test]
fn captures_optional_group() {
    let re = regex(Pat::seq([
        Pat::group(1, Pat::lit("a")),
        Pat::opt(Pat::group(2, Pat::lit("x"))),
        Pat::group(3, Pat::lit("b")),
    ]));
    let caps = re.captures("ab").unwrap().unwrap();
    assert!(caps.get(2).is_none());
    let groups: Vec<_> = caps.iter().map(|m| m.map(|m| m.range())).collect();
    assert_eq!(groups, vec![Some(0..2), Some(0..1), None, Some(1..2)]);
}

#[test]
fn captures_at_offset() {
    let re = regex(digits());
    let caps = re.captures_at("1 22 333", 2).unwrap().unwrap();
    assert_eq!(caps.range(0), Some(2..4));
    assert_eq!(re.captures_len(), 0);
}

#[test]
fn captures_no_match() {
    assert!(date().captures("no date").unwrap().is_none());
}

// === Regex::find_iter ===

#[test]
fn find_iter_multiple() {
    let re = regex(digits());
    let found: Vec<_> = re
        .find_iter("a1b22c333")
        .map(|m| m.unwrap().as_str().unwrap().to_string())
        .collect();
    assert_eq!(found, ["1", "22", "333"]);
}

#[test]
fn find_iter_empty_matches_advance() {
    let re = regex(Pat::Empty);
    let starts: Vec<_> = re.find_iter("ab").map(|m| m.unwrap().start()).collect();
    assert_eq!(starts, [0, 1, 2]);
}

#[test]
fn find_iter_no_matches() {
    let re = regex(digits());
    assert_eq!(re.find_iter("abc").count(), 0);
}

// === Byte subjects ===

#[test]
fn non_utf8_bytes() {
    let re = regex(Pat::lit("b"));
    let bytes = [0xff, b'a', b'b'];
    let m = re.find(Subject::bytes(&bytes, false)).unwrap().unwrap();
    assert_eq!(m.range(), 2..3);
    assert_eq!(m.as_str(), Some("b"));
}

#[test]
fn latin1_class_match() {
    let re = regex(Pat::plus(Pat::posix(PosixClass::Alpha)));
    let bytes = [b' ', 0xe9, b't', 0xe9, b' '];
    let m = re.find(Subject::latin1(&bytes)).unwrap().unwrap();
    assert_eq!(m.range(), 1..4);
}

// === Host callbacks and locale ===

#[test]
fn host_sees_captures() {
    use std::sync::{Arc, Mutex};
    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    let mut re = regex(Pat::seq([
        Pat::group(1, digits()),
        Pat::Eval(7, regmatch::regint::EvalFlavour::Side),
    ]));
    re.set_host(Arc::new(move |code: usize, ctx: &CalloutContext<'_>| -> Result<HostValue, MatchError> {
        log.lock().unwrap().push((code, ctx.group_bytes(1).map(<[u8]>::to_vec)));
        Ok(HostValue::Undef)
    }));
    assert!(re.is_match("x42").unwrap());
    assert_eq!(seen.lock().unwrap()[0], (7, Some(b"42".to_vec())));
}

#[test]
fn turkic_locale_fold() {
    let mut re = regex(Pat::lit_fold("i", FoldKind::Locale));
    assert!(re.is_match("I").unwrap());
    re.set_locale(Locale { turkic: true, ..Locale::default() });
    assert!(!re.is_match("I").unwrap());
    assert!(re.is_match("\u{130}").unwrap());
}

// === Errors ===

#[test]
fn error_display() {
    let err = MatchError::InfiniteRecursion { group: 2, offset: 5 };
    assert_eq!(err.to_string(), "infinite recursion into group 2 at offset 5");
}

#[test]
fn error_is_std_error() {
    fn takes(_: &dyn std::error::Error) {}
    takes(&MatchError::RetryLimitOver);
}

#[test]
fn malformed_utf8_is_an_error() {
    let re = regex(Pat::seq([Pat::lit("x"), Pat::Any, Pat::lit("(")]));
    let bytes = [b'x', 0xc3, b'(', b'y'];
    assert_eq!(
        re.find(Subject::bytes(&bytes, true)).unwrap_err(),
        MatchError::MalformedUtf8 { offset: 1 }
    );

    // truncated three-byte sequence at the end
    let re = regex(Pat::seq([Pat::lit("a"), Pat::Any]));
    let bytes = [b'a', 0xe2, 0x82];
    assert!(matches!(
        re.exec(Subject::bytes(&bytes, true), 0, 0, ExecFlags::empty()),
        Err(MatchError::MalformedUtf8 { offset: 1 })
    ));
}

#[test]
fn start_past_end_is_invalid() {
    let re = regex(Pat::lit("a"));
    assert!(matches!(
        re.exec("abc", 4, 0, ExecFlags::empty()),
        Err(MatchError::InvalidArgument(_))
    ));
}

// === Debug ===

#[test]
fn debug_impls() {
    let re = regex(digits());
    assert!(format!("{:?}", re).contains("Regex"));
    let caps = re.captures("7").unwrap().unwrap();
    assert!(format!("{:?}", caps).contains("(0, 1)"));
}
