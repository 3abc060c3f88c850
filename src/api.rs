// api.rs - Idiomatic Rust API for regmatch.
//
// Wraps the execution entry point (regexec_flags) with Rust-native types:
// Regex, Subject, Match, Captures, FindIter.

use std::ops::Range;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use crate::error::MatchError;
use crate::regcallout::{HostCallback, HostValue};
use crate::regexec::{regexec_flags, ExecInput, ExecOutcome, ExecResult};
use crate::regint::{ExecFlags, Locale, Program};

/// A compiled program ready to run, with its per-regex execution settings.
///
/// # Examples
///
/// ```
/// use regmatch::prelude::*;
///
/// let prog = ProgramBuilder::new(Pat::plus(Pat::posix(PosixClass::Digit))).build().unwrap();
/// let re = Regex::new(prog).unwrap();
/// assert!(re.is_match("hello 42").unwrap());
///
/// let m = re.find("hello 42").unwrap().unwrap();
/// assert_eq!(m.as_bytes(), b"42");
/// assert_eq!(m.start(), 6);
/// assert_eq!(m.end(), 8);
/// ```
#[derive(Clone)]
pub struct Regex {
    prog: Arc<Program>,
    host: Option<Arc<dyn HostCallback>>,
    locale: Locale,
    interrupt: Option<Arc<AtomicBool>>,
}

impl Regex {
    /// Wrap a program after checking its node chains and operands.
    pub fn new(prog: impl Into<Arc<Program>>) -> Result<Regex, MatchError> {
        let prog = prog.into();
        prog.validate()?;
        Ok(Regex { prog, host: None, locale: Locale::default(), interrupt: None })
    }

    pub fn program(&self) -> &Arc<Program> {
        &self.prog
    }

    /// Install the callback that runs embedded code blocks.
    pub fn set_host(&mut self, host: Arc<dyn HostCallback>) {
        self.host = Some(host);
    }

    /// Locale used by locale-dependent classes and folds.
    pub fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    /// Flag observed while backtracking; raising it aborts the match with
    /// [`MatchError::Interrupted`].
    pub fn set_interrupt(&mut self, flag: Arc<AtomicBool>) {
        self.interrupt = Some(flag);
    }

    /// Run one search from `start`. A match must end at least `minend` bytes
    /// past `start`.
    pub fn exec<'t>(
        &self,
        subject: impl Into<Subject<'t>>,
        start: usize,
        minend: usize,
        flags: ExecFlags,
    ) -> Result<Option<Captures<'t>>, MatchError> {
        self.exec_with_gpos(subject, start, minend, None, flags)
    }

    /// Like [`Regex::exec`], with the position `\G` matches at.
    pub fn exec_with_gpos<'t>(
        &self,
        subject: impl Into<Subject<'t>>,
        start: usize,
        minend: usize,
        gpos: Option<usize>,
        flags: ExecFlags,
    ) -> Result<Option<Captures<'t>>, MatchError> {
        let subject = subject.into();
        Ok(match self.run(subject, start, minend, gpos, flags)? {
            ExecOutcome::Match(result) => Some(Captures::new(subject, result, &self.prog)),
            ExecOutcome::NoMatch { .. } => None,
        })
    }

    /// Run one search and return the raw outcome, including the mark name
    /// reported on failure.
    pub fn exec_outcome<'t>(
        &self,
        subject: impl Into<Subject<'t>>,
        start: usize,
        flags: ExecFlags,
    ) -> Result<ExecOutcome, MatchError> {
        self.run(subject.into(), start, 0, None, flags)
    }

    fn run(
        &self,
        subject: Subject<'_>,
        start: usize,
        minend: usize,
        gpos: Option<usize>,
        flags: ExecFlags,
    ) -> Result<ExecOutcome, MatchError> {
        let input = ExecInput {
            subject: subject.bytes,
            utf8: subject.utf8,
            start,
            minend,
            gpos,
            flags,
            locale: self.locale,
            host: self.host.as_deref(),
            interrupt: self.interrupt.as_deref(),
        };
        regexec_flags(&self.prog, input)
    }

    /// Check whether the subject matches anywhere.
    pub fn is_match<'t>(&self, subject: impl Into<Subject<'t>>) -> Result<bool, MatchError> {
        Ok(self.exec(subject, 0, 0, ExecFlags::NOSAVE)?.is_some())
    }

    /// Return the first match, or `None`.
    pub fn find<'t>(&self, subject: impl Into<Subject<'t>>) -> Result<Option<Match<'t>>, MatchError> {
        Ok(self.exec(subject, 0, 0, ExecFlags::NOSAVE)?.and_then(|c| c.get(0)))
    }

    /// Return the first match with all capture groups, or `None`.
    pub fn captures<'t>(&self, subject: impl Into<Subject<'t>>) -> Result<Option<Captures<'t>>, MatchError> {
        self.captures_at(subject, 0)
    }

    /// Return the first match at or after byte `start`.
    pub fn captures_at<'t>(
        &self,
        subject: impl Into<Subject<'t>>,
        start: usize,
    ) -> Result<Option<Captures<'t>>, MatchError> {
        self.exec(subject, start, 0, ExecFlags::empty())
    }

    /// Iterate over successive matches. Each search starts where the last
    /// one ended with `\G` there; after an empty match the next one must be
    /// non-empty.
    pub fn find_iter<'r, 't>(&'r self, subject: impl Into<Subject<'t>>) -> FindIter<'r, 't> {
        FindIter { regex: self, subject: subject.into(), pos: 0, need_nonempty: false, done: false }
    }

    /// Number of capture groups (excluding group 0).
    pub fn captures_len(&self) -> usize {
        self.prog.nparens as usize
    }
}

impl std::fmt::Debug for Regex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Regex")
            .field("nodes", &self.prog.nodes.len())
            .field("nparens", &self.prog.nparens)
            .finish_non_exhaustive()
    }
}

// === Subject ===

/// Subject bytes with their encoding.
#[derive(Debug, Clone, Copy)]
pub struct Subject<'t> {
    bytes: &'t [u8],
    utf8: bool,
}

impl<'t> Subject<'t> {
    /// Raw bytes, UTF-8 or one byte per character.
    pub fn bytes(bytes: &'t [u8], utf8: bool) -> Self {
        Subject { bytes, utf8 }
    }

    pub fn latin1(bytes: &'t [u8]) -> Self {
        Subject { bytes, utf8: false }
    }

    pub fn as_bytes(&self) -> &'t [u8] {
        self.bytes
    }

    pub fn is_utf8(&self) -> bool {
        self.utf8
    }
}

impl<'t> From<&'t str> for Subject<'t> {
    fn from(s: &'t str) -> Self {
        Subject { bytes: s.as_bytes(), utf8: true }
    }
}

impl<'t> From<&'t String> for Subject<'t> {
    fn from(s: &'t String) -> Self {
        Subject::from(s.as_str())
    }
}

// === Match ===

/// A single match result referencing the original subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'t> {
    text: &'t [u8],
    start: usize,
    end: usize,
}

impl<'t> Match<'t> {
    /// Byte offset of the start of the match.
    pub fn start(&self) -> usize {
        self.start
    }

    /// Byte offset of the end of the match (exclusive).
    pub fn end(&self) -> usize {
        self.end
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn as_bytes(&self) -> &'t [u8] {
        &self.text[self.start..self.end]
    }

    /// The matched text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&'t str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

// === Captures ===

/// All capture groups from a single match.
///
/// Group 0 is the reported match (its start moves with `\K`).
pub struct Captures<'t> {
    text: &'t [u8],
    offs: Vec<Option<Range<usize>>>,
    prog: Arc<Program>,
    lastparen: u32,
    lastcloseparen: u32,
    mark: Option<String>,
    side_value: Option<HostValue>,
}

impl<'t> Captures<'t> {
    fn new(subject: Subject<'t>, result: ExecResult, prog: &Arc<Program>) -> Self {
        Captures {
            text: subject.bytes,
            offs: result.offs.into_iter().map(|o| o.map(|(s, e)| s..e)).collect(),
            prog: Arc::clone(prog),
            lastparen: result.lastparen,
            lastcloseparen: result.lastcloseparen,
            mark: result.mark,
            side_value: result.side_value,
        }
    }

    /// Get capture group `i`, or `None` if the group did not participate.
    pub fn get(&self, i: usize) -> Option<Match<'t>> {
        let r = self.offs.get(i)?.clone()?;
        Some(Match { text: self.text, start: r.start, end: r.end })
    }

    /// Byte range of group `i`.
    pub fn range(&self, i: usize) -> Option<Range<usize>> {
        self.offs.get(i)?.clone()
    }

    /// Get the first defined group bound to `name`.
    pub fn name(&self, name: &str) -> Option<Match<'t>> {
        self.prog.name_to_groups(name)?.iter().find_map(|&n| self.get(n as usize))
    }

    /// Bytes of the whole match.
    pub fn as_bytes(&self) -> &'t [u8] {
        self.get(0).map_or(&[][..], |m| m.as_bytes())
    }

    /// Highest group that has been closed.
    pub fn last_paren(&self) -> u32 {
        self.lastparen
    }

    /// Most recently closed group.
    pub fn last_close_paren(&self) -> u32 {
        self.lastcloseparen
    }

    /// Name of the last `(*MARK)` passed on the way to success.
    pub fn mark(&self) -> Option<&str> {
        self.mark.as_deref()
    }

    /// Value of the last side-effect code block.
    pub fn side_value(&self) -> Option<&HostValue> {
        self.side_value.as_ref()
    }

    /// Number of groups (including group 0).
    pub fn len(&self) -> usize {
        self.offs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offs.is_empty()
    }

    pub fn iter(&self) -> CapturesIter<'_, 't> {
        CapturesIter { captures: self, index: 0 }
    }
}

impl std::fmt::Debug for Captures<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for r in &self.offs {
            list.entry(r);
        }
        list.finish()
    }
}

// === CapturesIter ===

/// Iterator over capture groups in a [`Captures`].
pub struct CapturesIter<'c, 't> {
    captures: &'c Captures<'t>,
    index: usize,
}

impl<'c, 't> Iterator for CapturesIter<'c, 't> {
    type Item = Option<Match<'t>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.captures.len() {
            return None;
        }
        let m = self.captures.get(self.index);
        self.index += 1;
        Some(m)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.captures.len() - self.index;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CapturesIter<'_, '_> {}

// === FindIter ===

/// Iterator over successive matches in a subject.
pub struct FindIter<'r, 't> {
    regex: &'r Regex,
    subject: Subject<'t>,
    pos: usize,
    need_nonempty: bool,
    done: bool,
}

impl<'r, 't> Iterator for FindIter<'r, 't> {
    type Item = Result<Match<'t>, MatchError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos > self.subject.bytes.len() {
            return None;
        }
        let minend = usize::from(self.need_nonempty);
        let found = self.regex.exec_with_gpos(self.subject, self.pos, minend, Some(self.pos), ExecFlags::NOSAVE);
        let m = match found {
            Ok(Some(caps)) => caps.get(0)?,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(e) => {
                self.done = true;
                return Some(Err(e));
            }
        };
        self.need_nonempty = m.is_empty();
        self.pos = m.end();
        Some(Ok(m))
    }
}
