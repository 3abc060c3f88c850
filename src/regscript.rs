// regscript.rs - Script-run validation.
// A span is a script run when every character's scripts share at least one
// member and all of its decimal digits come from one ten-digit sequence.

use crate::error::MatchError;
use crate::regenc::MatchEncoding;
use crate::unicode::script::{digit_zero, script_extensions, script_of, Script, ScriptSet};

/// Check `data[s..e]` for a script run.
pub fn is_script_run(enc: MatchEncoding, data: &[u8], s: usize, e: usize) -> Result<bool, MatchError> {
    let mut scripts: Option<ScriptSet> = None;
    let mut zero: Option<u32> = None;
    let mut p = s;
    while p < e {
        let (c, len) = enc.decode(data, p, e)?;
        p += len;

        if let Some(z) = digit_zero(c) {
            match zero {
                Some(prev) if prev != z => return Ok(false),
                _ => zero = Some(z),
            }
        }

        let set = match script_extensions(c) {
            Some(set) => set,
            None => match script_of(c) {
                Script::Common | Script::Inherited => continue,
                Script::Unknown => return Ok(false),
                sc => sc.as_set(),
            },
        };
        let narrowed = match scripts {
            Some(cur) => cur & set,
            None => set,
        };
        if narrowed.is_empty() {
            return Ok(false);
        }
        scripts = Some(narrowed);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encodings::{LATIN1, UTF8};

    fn run(s: &str) -> bool {
        is_script_run(&UTF8, s.as_bytes(), 0, s.len()).unwrap()
    }

    #[test]
    fn single_script_and_common() {
        assert!(run(""));
        assert!(run("hello, world"));
        assert!(run("αβγ 123"));
        assert!(!run("paypаl")); // Cyrillic а
    }

    #[test]
    fn digit_systems_do_not_mix() {
        assert!(!run("αβ\u{663}"));
        assert!(!run("1\u{663}"));
        assert!(run("\u{661}\u{662}\u{628}"));
    }

    #[test]
    fn japanese_mixes_han_and_kana() {
        assert!(run("漢字ひらがなカタカナ"));
        assert!(!run("ひらがな한글"));
        assert!(run("漢字한글"));
    }

    #[test]
    fn latin1_subject() {
        let s = [b'c', 0xE9, b'!'];
        assert!(is_script_run(&LATIN1, &s, 0, s.len()).unwrap());
    }
}
