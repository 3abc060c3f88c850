// exec_test.rs - Integration tests for the matcher.
//
// Programs are assembled from `Pat` trees. Helpers:
//   x2(pat, subject, from, to)          - expect a match at byte range from..to
//   x3(pat, subject, from, to, group)   - expect capture group `group` at from..to
//   xg(pat, subject, groups)            - expect every group range, unset as None
//   n(pat, subject)                     - expect no match
// Variants suffixed with `_f` take extra execution flags.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use regmatch::prelude::*;
use regmatch::regexec::ExecOutcome;
use regmatch::regint::EvalFlavour;

fn regex(pat: Pat) -> Regex {
    let prog = ProgramBuilder::new(pat)
        .build()
        .unwrap_or_else(|e| panic!("assembly failed: {}", e));
    Regex::new(prog).unwrap()
}

fn x2_f(pat: Pat, subject: &str, from: usize, to: usize, flags: ExecFlags) {
    let desc = format!("{:?}", pat);
    let re = regex(pat);
    let caps = re
        .exec(subject, 0, 0, flags)
        .unwrap_or_else(|e| panic!("x2: error {} for {} against {:?}", e, desc, subject))
        .unwrap_or_else(|| panic!("x2: expected match for {} against {:?}", desc, subject));
    assert_eq!(
        caps.range(0),
        Some(from..to),
        "x2: wrong range for {} against {:?}",
        desc,
        subject
    );
}

fn x2(pat: Pat, subject: &str, from: usize, to: usize) {
    x2_f(pat, subject, from, to, ExecFlags::empty());
}

fn x3(pat: Pat, subject: &str, from: usize, to: usize, group: usize) {
    let desc = format!("{:?}", pat);
    let re = regex(pat);
    let caps = re
        .captures(subject)
        .unwrap_or_else(|e| panic!("x3: error {} for {} against {:?}", e, desc, subject))
        .unwrap_or_else(|| panic!("x3: expected match for {} against {:?}", desc, subject));
    assert_eq!(
        caps.range(group),
        Some(from..to),
        "x3: wrong group {} for {} against {:?}",
        group,
        desc,
        subject
    );
}

fn groups(re: &Regex, subject: &str, flags: ExecFlags) -> Option<Vec<Option<std::ops::Range<usize>>>> {
    let caps = re.exec(subject, 0, 0, flags).unwrap_or_else(|e| panic!("error {} against {:?}", e, subject))?;
    Some((0..caps.len()).map(|i| caps.range(i)).collect())
}

fn xg(pat: Pat, subject: &str, expected: &[Option<std::ops::Range<usize>>]) {
    let desc = format!("{:?}", pat);
    let found = groups(&regex(pat), subject, ExecFlags::empty())
        .unwrap_or_else(|| panic!("xg: expected match for {} against {:?}", desc, subject));
    assert_eq!(found, expected, "xg: wrong groups for {} against {:?}", desc, subject);
}

fn n_f(pat: Pat, subject: &str, flags: ExecFlags) {
    let desc = format!("{:?}", pat);
    let re = regex(pat);
    let found = re
        .exec(subject, 0, 0, flags)
        .unwrap_or_else(|e| panic!("n: error {} for {} against {:?}", e, desc, subject));
    assert!(found.is_none(), "n: expected no match for {} against {:?}", desc, subject);
}

fn n(pat: Pat, subject: &str) {
    n_f(pat, subject, ExecFlags::empty());
}

fn a() -> Pat {
    Pat::lit("a")
}

fn host<F>(f: F) -> Arc<dyn HostCallback>
where
    F: Fn(usize, &CalloutContext<'_>) -> Result<HostValue, MatchError> + Send + Sync + 'static,
{
    Arc::new(f)
}

// === Literals and repetition ===

#[test]
fn literal_search() {
    x2(Pat::lit("cat"), "concatenate", 3, 6);
    n(Pat::lit("dog"), "concatenate");
    x2(Pat::lit(""), "abc", 0, 0);
}

#[test]
fn counted_repeat() {
    x2(Pat::repeat(a(), 2, 4), "aaaaa", 0, 4);
    x2(Pat::repeat(a(), 2, 4).lazy(), "aaaaa", 0, 2);
    n(Pat::repeat(a(), 2, 4), "a-a");
    x2(Pat::seq([Pat::repeat(a(), 2, 4).lazy(), Pat::lit("b")]), "aaab", 0, 4);
}

#[test]
fn greedy_backs_off_to_suffix() {
    x2(Pat::seq([a(), Pat::star(Pat::AnyNl), Pat::lit("c")]), "abcbcd", 0, 5);
    x2(Pat::seq([a(), Pat::star(Pat::AnyNl).lazy(), Pat::lit("c")]), "abcbcd", 0, 3);
    n(Pat::seq([a(), Pat::star(Pat::Any), Pat::lit("c")]), "ab\nc");
}

fn a_opt_b() -> Pat {
    Pat::group(1, Pat::seq([a(), Pat::opt(Pat::group(2, Pat::lit("b")))]))
}

#[test]
fn complex_repeat_keeps_last_iteration() {
    // (a(b)?){2}: the second pass leaves group 2 unset
    xg(Pat::repeat(a_opt_b(), 2, 2), "aba", &[Some(0..3), Some(2..3), None]);
}

#[test]
fn backtracked_iteration_leaves_no_capture() {
    // (a(b)?)+b: (b) matches, then gives the b back to the tail
    xg(Pat::seq([Pat::plus(a_opt_b()), Pat::lit("b")]), "ab", &[Some(0..2), Some(0..1), None]);
}

#[test]
fn alternated_groups_keep_their_last_value() {
    // (?:(a)|(b))*c
    let pat = Pat::seq([
        Pat::star(Pat::alt([Pat::group(1, a()), Pat::group(2, Pat::lit("b"))])),
        Pat::lit("c"),
    ]);
    xg(pat, "abac", &[Some(0..4), Some(2..3), Some(1..2)]);
}

#[test]
fn atomic_group_does_not_backtrack() {
    n(Pat::seq([Pat::atomic(Pat::plus(a())), a()]), "aaa");
    x2(Pat::seq([Pat::plus(a()), a()]), "aaa", 0, 3);
}

// === Alternation ===

#[test]
fn alternation_prefers_earlier_branch() {
    x2(Pat::alt([Pat::lit("foo"), Pat::lit("foobar")]), "foobar", 0, 3);
    x2(Pat::seq([Pat::alt([Pat::lit("foo"), Pat::lit("foobar")]), Pat::Eos]), "foobar", 0, 6);
    x3(Pat::seq([Pat::group(1, Pat::alt([a(), Pat::lit("ab")])), Pat::lit("c")]), "abc", 0, 2, 1);
}

#[test]
fn trie_and_branch_agree() {
    let words = || Pat::seq([Pat::alt([Pat::lit("ab"), Pat::lit("abc"), Pat::lit("b")]), Pat::lit("d")]);
    for subject in ["abcd", "xbd", "abd"] {
        let trie = regex(words()).find(subject).unwrap().map(|m| m.range());
        let plain = ProgramBuilder::new(words()).tries(false).build().unwrap();
        let plain = Regex::new(plain).unwrap().find(subject).unwrap().map(|m| m.range());
        assert_eq!(trie, plain, "subject {:?}", subject);
    }
}

// === Anchors and boundaries ===

#[test]
fn line_anchors() {
    x2(Pat::seq([a(), Pat::Seol]), "a\n", 0, 1);
    n(Pat::seq([a(), Pat::Eos]), "a\n");
    x2(Pat::seq([Pat::Mbol, Pat::lit("b")]), "a\nb", 2, 3);
    n(Pat::seq([Pat::Sbol, Pat::lit("b")]), "a\nb");
    x2(Pat::seq([Pat::lit("a"), Pat::Meol]), "xa\nb", 1, 2);
}

#[test]
fn word_boundary() {
    x2(Pat::seq([Pat::bound(), Pat::lit("cat"), Pat::bound()]), "concat cat", 7, 10);
    n(Pat::seq([Pat::bound(), Pat::lit("cat"), Pat::bound()]), "concatenate");
}

#[test]
fn gpos_anchors_search() {
    let re = regex(Pat::seq([Pat::Gpos, Pat::lit("b")]));
    let caps = re.exec_with_gpos("abb", 0, 0, Some(1), ExecFlags::empty()).unwrap().unwrap();
    assert_eq!(caps.range(0), Some(1..2));
    let none = re.exec_with_gpos("abb", 0, 0, Some(0), ExecFlags::empty()).unwrap();
    assert!(none.is_none());
}

// === Backreferences and recursion ===

#[test]
fn backreference_with_fold() {
    let pat = |fold| Pat::seq([Pat::group(1, Pat::lit("ab")), Pat::Ref(1, fold)]);
    x2(pat(Some(FoldKind::Unicode)), "abAB", 0, 4);
    n(pat(None), "abAB");
    x2(pat(None), "xabab", 1, 5);
}

#[test]
fn recursion_matches_balanced_parens() {
    let pat = Pat::group(
        1,
        Pat::seq([
            Pat::lit("("),
            Pat::star(Pat::alt([
                Pat::not_class(&[('(' as u32, ')' as u32)]),
                Pat::Recurse(1),
            ])),
            Pat::lit(")"),
        ]),
    );
    x2(pat.clone(), "x(a(b)c)y", 1, 8);
    x2(pat, "((a)", 1, 4);
}

#[test]
fn left_recursion_is_an_error() {
    let re = regex(Pat::group(1, Pat::alt([Pat::Recurse(1), a()])));
    match re.captures("a") {
        Err(MatchError::InfiniteRecursion { group: 1, offset: 0 }) => {}
        other => panic!("expected infinite recursion, got {:?}", other.map(|c| c.map(|c| c.range(0)))),
    }
}

// === Lookaround and \K ===

#[test]
fn lookahead() {
    x2(Pat::seq([a(), Pat::ahead(Pat::lit("b"))]), "acab", 2, 3);
    x2(Pat::seq([a(), Pat::not_ahead(Pat::lit("b"))]), "abac", 2, 3);
}

#[test]
fn lookbehind() {
    let pat = || Pat::seq([Pat::behind(Pat::alt([Pat::lit("ab"), Pat::lit("c")])), Pat::lit("d")]);
    x2(pat(), "abd", 2, 3);
    x2(pat(), "cd", 1, 2);
    n(pat(), "xd");
    x2(Pat::seq([Pat::not_behind(a()), Pat::lit("b")]), "abcb", 3, 4);
}

#[test]
fn keep_moves_match_start() {
    x2(Pat::seq([Pat::lit("foo"), Pat::Keep, Pat::lit("bar")]), "foobar", 3, 6);
}

// === Conditionals ===

#[test]
fn group_condition() {
    let pat = || {
        Pat::seq([
            Pat::opt(Pat::group(1, a())),
            Pat::cond(Cond::Group(1), Pat::lit("b"), Some(Pat::lit("c"))),
        ])
    };
    x2(pat(), "ab", 0, 2);
    x2(pat(), "c", 0, 1);
}

#[test]
fn define_block_is_callable() {
    let pat = Pat::seq([
        Pat::cond(Cond::Define, Pat::group(1, a()), None),
        Pat::Recurse(1),
        Pat::lit("b"),
    ]);
    x2(pat, "ab", 0, 2);
}

#[test]
fn lookahead_condition() {
    let pat = || {
        Pat::cond(
            Cond::Look { behind: false, negate: false, pat: Box::new(a()) },
            Pat::lit("ab"),
            Some(Pat::lit("cd")),
        )
    };
    x2(pat(), "cd", 0, 2);
    x2(pat(), "ab", 0, 2);
}

// === Verbs and marks ===

#[test]
fn commit_fails_whole_match() {
    let pat = |verb: bool| {
        let mut items = vec![Pat::plus(a())];
        if verb {
            items.push(Pat::Commit);
        }
        items.push(Pat::lit("b"));
        Pat::seq(items)
    };
    n_f(pat(true), "aaacaab", ExecFlags::NO_INTUIT);
    x2_f(pat(false), "aaacaab", 4, 7, ExecFlags::NO_INTUIT);
}

#[test]
fn prune_and_then_differ() {
    let with = |verb: Pat| Pat::alt([Pat::seq([a(), verb, Pat::lit("b")]), Pat::lit("ac")]);
    x2(with(Pat::Then(None)), "ac", 0, 2);
    n(with(Pat::Prune), "ac");
}

#[test]
fn skip_resumes_after_mark() {
    x2_f(
        Pat::seq([Pat::plus(a()), Pat::Skip(None), Pat::lit("b")]),
        "aaacaaab",
        4,
        8,
        ExecFlags::NO_INTUIT,
    );
}

#[test]
fn mark_name_reported() {
    let pat = Pat::alt([
        Pat::seq([Pat::lit("x"), Pat::Mark("A".into()), Pat::lit("y")]),
        Pat::seq([Pat::lit("x"), Pat::Mark("B".into()), Pat::lit("z")]),
    ]);
    let re = regex(pat);
    let caps = re.captures("xz").unwrap().unwrap();
    assert_eq!(caps.mark(), Some("B"));

    let re = regex(Pat::seq([Pat::lit("x"), Pat::Mark("A".into()), Pat::lit("y")]));
    match re.exec_outcome("xz", 0, ExecFlags::NO_INTUIT).unwrap() {
        ExecOutcome::NoMatch { mark } => assert_eq!(mark.as_deref(), Some("A")),
        ExecOutcome::Match(_) => panic!("expected no match"),
    }
}

#[test]
fn accept_ends_match_early() {
    let pat = Pat::seq([Pat::group(1, Pat::seq([a(), Pat::Accept, Pat::lit("b")])), Pat::lit("c")]);
    x2(pat.clone(), "ac", 0, 1);
    x3(pat, "ac", 0, 1, 1);
}

#[test]
fn fail_forces_next_branch() {
    x2(Pat::alt([Pat::seq([a(), Pat::Fail]), Pat::lit("b")]), "ab", 1, 2);
}

// === Host code ===

#[test]
fn side_effect_value_recorded() {
    let mut re = regex(Pat::seq([
        Pat::group(1, a()),
        Pat::Eval(0, EvalFlavour::Side),
        Pat::lit("b"),
    ]));
    re.set_host(host(|_, ctx| {
        Ok(HostValue::Int(ctx.group(1).map_or(-1, |(s, e)| (e - s) as i64)))
    }));
    let caps = re.captures("ab").unwrap().unwrap();
    assert_eq!(caps.side_value(), Some(&HostValue::Int(1)));
}

#[test]
fn eval_condition_selects_branch() {
    let mut re = regex(Pat::cond(Cond::Eval(3), a(), Some(Pat::lit("b"))));
    re.set_host(host(|code, _| Ok(HostValue::Bool(code != 3))));
    assert_eq!(re.find("ab").unwrap().map(|m| m.range()), Some(1..2));
}

#[test]
fn postponed_pattern_matches_in_place() {
    let mut re = regex(Pat::seq([
        Pat::lit("x"),
        Pat::Eval(0, EvalFlavour::Postponed),
        Pat::lit("y"),
    ]));
    re.set_host(host(|_, _| Ok(HostValue::Str(b"ab".to_vec()))));
    assert_eq!(re.find("-xaby").unwrap().map(|m| m.range()), Some(1..5));
    assert!(re.find("-xy").unwrap().is_none());

    let inner = Arc::new(ProgramBuilder::new(Pat::plus(Pat::lit("b"))).build().unwrap());
    re.set_host(host(move |_, _| Ok(HostValue::Pattern(inner.clone()))));
    assert_eq!(re.find("xbbby").unwrap().map(|m| m.range()), Some(0..5));
}

#[test]
fn nested_postponed_without_progress_is_an_error() {
    let inner = Arc::new(ProgramBuilder::new(Pat::Eval(0, EvalFlavour::Postponed)).build().unwrap());
    let mut re = Regex::new(inner.clone()).unwrap();
    re.set_host(host(move |_, _| Ok(HostValue::Pattern(inner.clone()))));
    assert!(matches!(re.captures("a"), Err(MatchError::NoProgressRecursion { .. })));
}

#[test]
fn host_error_propagates() {
    let mut re = regex(Pat::seq([a(), Pat::Eval(0, EvalFlavour::Side)]));
    re.set_host(host(|_, _| Err(MatchError::Callout("boom".into()))));
    assert!(matches!(re.captures("a"), Err(MatchError::Callout(_))));
}

// === Unicode constructs ===

#[test]
fn linebreak_and_clump() {
    x2(Pat::seq([a(), Pat::LnBreak, Pat::lit("b")]), "a\r\nb", 0, 4);
    x2(Pat::Clump, "e\u{301}x", 0, 3);
}

#[test]
fn script_run() {
    x2(Pat::ScriptRun(Box::new(Pat::plus(Pat::posix(PosixClass::Alpha)))), "abc", 0, 3);
    x2(Pat::ScriptRun(Box::new(Pat::plus(Pat::posix(PosixClass::Alpha)))), "a\u{430}", 0, 1);
}

#[test]
fn latin1_subject_with_utf8_literal() {
    let re = regex(Pat::lit("\u{e9}t\u{e9}"));
    let subject = [b'x', 0xe9, b't', 0xe9];
    let m = re.find(Subject::latin1(&subject)).unwrap().unwrap();
    assert_eq!(m.range(), 1..4);
}

// === Optimisations do not change results ===

#[test]
fn poscache_does_not_change_results() {
    let pats = [
        // (?:(a+)|(ab))*c
        Pat::seq([
            Pat::star(Pat::alt([Pat::group(1, Pat::plus(a())), Pat::group(2, Pat::lit("ab"))])),
            Pat::lit("c"),
        ]),
        // (?:(a)|(ab)|(b))*(c)
        Pat::seq([
            Pat::star(Pat::alt([Pat::group(1, a()), Pat::group(2, Pat::lit("ab")), Pat::group(3, Pat::lit("b"))])),
            Pat::group(4, Pat::lit("c")),
        ]),
        // (?:a*|(ab))*c
        Pat::seq([Pat::star(Pat::alt([Pat::star(a()), Pat::group(1, Pat::lit("ab"))])), Pat::lit("c")]),
    ];
    // The failing subject stays short: without the cache it backtracks
    // exponentially.
    let subjects = [
        format!("{}b", "a".repeat(12)),
        format!("{}c", "ab".repeat(12)),
        format!("{}abc", "a".repeat(22)),
        format!("x{}ac", "aab".repeat(8)),
    ];
    for pat in pats {
        let re = regex(pat);
        for subject in &subjects {
            let cached = groups(&re, subject, ExecFlags::NO_INTUIT);
            let plain = groups(&re, subject, ExecFlags::NO_INTUIT | ExecFlags::NO_POSCACHE);
            assert_eq!(cached, plain, "subject {:?}", subject);
        }
    }
}

#[test]
fn intuit_does_not_change_results() {
    let pat = || Pat::seq([Pat::plus(Pat::posix(PosixClass::Digit)), Pat::lit("px")]);
    for subject in ["width: 12px", "12 px", "1px2px", "px"] {
        let re = regex(pat());
        let fast = re.exec(subject, 0, 0, ExecFlags::empty()).unwrap().map(|c| c.range(0));
        let slow = re.exec(subject, 0, 0, ExecFlags::NO_INTUIT).unwrap().map(|c| c.range(0));
        assert_eq!(fast, slow, "subject {:?}", subject);
    }
}

#[test]
fn interrupt_flag_aborts() {
    let mut re = regex(Pat::seq([Pat::star(a()), Pat::lit("b")]));
    re.set_interrupt(Arc::new(AtomicBool::new(true)));
    assert!(matches!(
        re.exec("aaa", 0, 0, ExecFlags::NO_INTUIT),
        Err(MatchError::Interrupted)
    ));
}

#[test]
fn minend_rejects_short_matches() {
    let re = regex(Pat::star(a()));
    let caps = re.exec("baa", 0, 1, ExecFlags::empty()).unwrap().unwrap();
    assert_eq!(caps.range(0), Some(1..3));
}

#[test]
fn start_inside_character_is_rejected() {
    let re = regex(a());
    assert!(matches!(
        re.exec("\u{e9}a", 1, 0, ExecFlags::empty()),
        Err(MatchError::InvalidArgument(_))
    ));
}
