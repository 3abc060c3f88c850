// limits_test.rs - Process-wide match limits.
// The limits are global, so every check lives in a single test to keep the
// harness from running them concurrently.

use regmatch::prelude::*;
use regmatch::regexec::{
    get_match_stack_limit, get_retry_limit_in_match, get_time_limit, set_match_stack_limit,
    set_retry_limit_in_match, set_time_limit,
};

fn nested_star() -> Regex {
    let pat = Pat::seq([Pat::star(Pat::star(Pat::lit("a"))), Pat::lit("b")]);
    Regex::new(ProgramBuilder::new(pat).build().unwrap()).unwrap()
}

#[test]
fn limits() {
    let retry = get_retry_limit_in_match();
    let stack = get_match_stack_limit();
    let time = get_time_limit();
    let flags = ExecFlags::NO_INTUIT | ExecFlags::NO_POSCACHE;
    let subject = "a".repeat(30);

    // === retry limit ===
    set_retry_limit_in_match(1000);
    assert!(matches!(
        nested_star().exec(subject.as_str(), 0, 0, flags),
        Err(MatchError::RetryLimitOver)
    ));
    set_retry_limit_in_match(retry);
    assert!(nested_star().exec(subject.as_str(), 0, 0, ExecFlags::NO_INTUIT).unwrap().is_none());

    // === stack limit ===
    set_match_stack_limit(10);
    let re = Regex::new(
        ProgramBuilder::new(Pat::star(Pat::alt([Pat::lit("ab"), Pat::lit("a")]))).build().unwrap(),
    )
    .unwrap();
    let long = "ab".repeat(100);
    assert!(matches!(
        re.exec(long.as_str(), 0, 0, ExecFlags::empty()),
        Err(MatchError::StackLimitOver)
    ));
    set_match_stack_limit(stack);
    assert_eq!(re.find(long.as_str()).unwrap().map(|m| m.range()), Some(0..200));

    // === time limit ===
    set_retry_limit_in_match(0);
    set_time_limit(1);
    let huge = "a".repeat(40);
    assert!(matches!(
        nested_star().exec(huge.as_str(), 0, 0, flags),
        Err(MatchError::TimeLimitOver)
    ));
    set_time_limit(time);
    set_retry_limit_in_match(retry);
}
