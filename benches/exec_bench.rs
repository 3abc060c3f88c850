// Criterion benchmark suite for the matcher.
//
// Run: cargo bench
// Specific group: cargo bench -- quantifiers
// HTML report: target/criterion/report/index.html
//
// Most groups run each case twice: with the start-position and position
// caches enabled ("fast") and with them disabled ("plain").

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use regmatch::prelude::*;
use regmatch::regint::EvalFlavour;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn build(pat: Pat) -> Regex {
    Regex::new(ProgramBuilder::new(pat).build().expect("assembly failed")).expect("invalid program")
}

fn search(re: &Regex, text: &str, flags: ExecFlags) -> Option<usize> {
    re.exec(text, 0, 0, flags).expect("match error").and_then(|c| c.get(0)).map(|m| m.start())
}

fn digit() -> Pat {
    Pat::posix(PosixClass::Digit)
}

fn word() -> Pat {
    Pat::plus(Pat::posix(PosixClass::Word))
}

fn bench_cases(c: &mut Criterion, group_name: &str, text: &str, cases: Vec<(&str, Pat)>) {
    let mut group = c.benchmark_group(group_name);
    for (name, pat) in cases {
        let re = build(pat);
        let fast = search(&re, text, ExecFlags::empty());
        let plain = search(&re, text, ExecFlags::NO_INTUIT | ExecFlags::NO_POSCACHE);
        debug_assert_eq!(fast, plain, "{name}: cached and plain searches disagree");

        group.bench_with_input(BenchmarkId::new("fast", name), text, |b, text| {
            b.iter(|| black_box(search(&re, black_box(text), ExecFlags::empty())));
        });
        group.bench_with_input(BenchmarkId::new("plain", name), text, |b, text| {
            b.iter(|| {
                black_box(search(&re, black_box(text), ExecFlags::NO_INTUIT | ExecFlags::NO_POSCACHE))
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// 1. assemble -- program construction
// ---------------------------------------------------------------------------

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assemble");
    group.bench_function("alternation", |b| {
        b.iter(|| {
            let pat = Pat::alt(["alpha", "beta", "gamma", "delta"].map(Pat::lit));
            black_box(ProgramBuilder::new(black_box(pat)).build().unwrap());
        });
    });
    group.bench_function("date", |b| {
        b.iter(|| {
            let d = |n| Pat::repeat(digit(), n, n);
            let pat = Pat::seq([
                Pat::group(1, d(4)),
                Pat::lit("-"),
                Pat::group(2, d(2)),
                Pat::lit("-"),
                Pat::group(3, d(2)),
            ]);
            black_box(ProgramBuilder::new(black_box(pat)).build().unwrap());
        });
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// 2. literal_match
// ---------------------------------------------------------------------------

fn bench_literal_match(c: &mut Criterion) {
    let text = "The quick brown fox jumps over the lazy dog near the riverbank";
    bench_cases(
        c,
        "literal_match",
        text,
        vec![
            ("exact", Pat::lit("lazy dog")),
            ("anchored_start", Pat::seq([Pat::Sbol, Pat::lit("The quick")])),
            ("anchored_end", Pat::seq([Pat::lit("riverbank"), Pat::Seol])),
            ("word_boundary", Pat::seq([Pat::bound(), Pat::lit("fox"), Pat::bound()])),
        ],
    );
}

// ---------------------------------------------------------------------------
// 3. quantifiers
// ---------------------------------------------------------------------------

fn bench_quantifiers(c: &mut Criterion) {
    let text = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaab";
    bench_cases(
        c,
        "quantifiers",
        text,
        vec![
            ("greedy_star", Pat::seq([Pat::star(Pat::lit("a")), Pat::lit("b")])),
            ("lazy_star", Pat::seq([Pat::star(Pat::lit("a")).lazy(), Pat::lit("b")])),
            ("counted", Pat::repeat(Pat::lit("a"), 10, 20)),
            (
                "nested",
                Pat::seq([Pat::star(Pat::star(Pat::lit("a"))), Pat::lit("b")]),
            ),
        ],
    );
}

// ---------------------------------------------------------------------------
// 4. alternation -- trie vs plain branches
// ---------------------------------------------------------------------------

fn bench_alternation(c: &mut Criterion) {
    let text = "the color is epsilon not alpha or beta or gamma or delta";
    let words = || Pat::alt(["delta", "gamma", "epsilon", "zeta", "eta", "theta"].map(Pat::lit));
    let trie = build(words());
    let plain = Regex::new(ProgramBuilder::new(words()).tries(false).build().unwrap()).unwrap();
    assert_eq!(search(&trie, text, ExecFlags::empty()), search(&plain, text, ExecFlags::empty()));

    let mut group = c.benchmark_group("alternation");
    group.bench_function("trie", |b| b.iter(|| black_box(search(&trie, black_box(text), ExecFlags::empty()))));
    group.bench_function("branch", |b| {
        b.iter(|| black_box(search(&plain, black_box(text), ExecFlags::empty())))
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// 5. backreferences and lookaround
// ---------------------------------------------------------------------------

fn bench_backrefs_lookaround(c: &mut Criterion) {
    let text = "the the quick brown fox foo@bar.com said hello hello";
    bench_cases(
        c,
        "backrefs_lookaround",
        text,
        vec![
            (
                "repeated_word",
                Pat::seq([Pat::group(1, word()), Pat::lit(" "), Pat::Ref(1, None), Pat::bound()]),
            ),
            ("lookahead", Pat::seq([Pat::lit("foo"), Pat::ahead(Pat::lit("@"))])),
            ("lookbehind", Pat::seq([Pat::behind(Pat::lit("@")), word()])),
        ],
    );
}

// ---------------------------------------------------------------------------
// 6. unicode -- classes, folding and boundaries
// ---------------------------------------------------------------------------

fn bench_unicode(c: &mut Criterion) {
    let text = "Grüße aus München, schöne Straße! Ελληνικά και Кириллица";
    bench_cases(
        c,
        "unicode",
        text,
        vec![
            ("alpha_run", Pat::repeat(Pat::posix(PosixClass::Alpha), 8, u32::MAX)),
            ("fold_literal", Pat::lit_fold("strasse", FoldKind::Unicode)),
            ("upper", Pat::seq([Pat::posix(PosixClass::Upper), Pat::plus(Pat::posix(PosixClass::Lower))])),
            ("script_run", Pat::ScriptRun(Box::new(Pat::repeat(Pat::posix(PosixClass::Alpha), 6, u32::MAX)))),
        ],
    );
}

// ---------------------------------------------------------------------------
// 7. recursion -- balanced parentheses
// ---------------------------------------------------------------------------

fn bench_recursion(c: &mut Criterion) {
    let text = "call(f(a, g(b, c)), h(d(e(f))), (((x))))";
    bench_cases(
        c,
        "recursion",
        text,
        vec![(
            "balanced",
            Pat::group(
                1,
                Pat::seq([
                    Pat::lit("("),
                    Pat::star(Pat::alt([
                        Pat::plus(Pat::not_class(&[('(' as u32, ')' as u32)])),
                        Pat::Recurse(1),
                    ])),
                    Pat::lit(")"),
                ]),
            ),
        )],
    );
}

// ---------------------------------------------------------------------------
// 8. large_text -- realistic log scanning
// ---------------------------------------------------------------------------

fn build_log(lines: usize) -> String {
    let levels = ["INFO", "DEBUG", "WARN", "ERROR"];
    let mut s = String::new();
    for i in 0..lines {
        s.push_str(&format!(
            "2024-01-{:02} 12:{:02}:{:02} [{}] request id={} path=/api/v1/items/{}\n",
            i % 28 + 1,
            i % 60,
            (i * 7) % 60,
            levels[i % levels.len()],
            i * 31,
            i
        ));
    }
    s.push_str("2024-02-01 00:00:00 [FATAL] disk full\n");
    s
}

fn bench_large_text(c: &mut Criterion) {
    let text = build_log(2000);
    let fatal = build(Pat::seq([Pat::Mbol, Pat::plus(Pat::Any), Pat::lit("[FATAL]")]));
    let ids = build(Pat::seq([Pat::lit("id="), Pat::plus(digit())]));

    let mut group = c.benchmark_group("large_text");
    group.bench_function("fatal_line", |b| {
        b.iter(|| black_box(search(&fatal, black_box(&text), ExecFlags::empty())))
    });
    group.bench_function("all_ids", |b| {
        b.iter(|| black_box(ids.find_iter(black_box(text.as_str())).count()))
    });
    group.finish();
}

// ---------------------------------------------------------------------------
// 9. host_code -- callouts in a hot loop
// ---------------------------------------------------------------------------

fn bench_host_code(c: &mut Criterion) {
    use std::sync::Arc;
    let text = "k1=v1;k2=v2;k3=v3;k4=v4;k5=v5;k6=v6;k7=v7;k8=v8";
    let mut re = build(Pat::seq([
        Pat::group(1, word()),
        Pat::lit("="),
        Pat::Eval(0, EvalFlavour::Side),
        word(),
    ]));
    re.set_host(Arc::new(|_: usize, ctx: &CalloutContext<'_>| -> Result<HostValue, MatchError> {
        Ok(HostValue::Int(ctx.group(1).map_or(0, |(s, e)| (e - s) as i64)))
    }));

    let mut group = c.benchmark_group("host_code");
    group.bench_function("side_value", |b| {
        b.iter(|| black_box(re.find_iter(black_box(text)).count()))
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_assemble,
    bench_literal_match,
    bench_quantifiers,
    bench_alternation,
    bench_backrefs_lookaround,
    bench_unicode,
    bench_recursion,
    bench_large_text,
    bench_host_code,
);
criterion_main!(benches);
