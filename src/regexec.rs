// regexec.rs - Backtracking matcher.
// Search driver, per-position attempt and the node dispatch loop. Backtrack
// states live on a slab stack; capture state is saved on the separate
// checkpoint stack.

use std::fmt;
use std::mem;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use memchr::{memchr, memmem};

use crate::encodings;
use crate::error::MatchError;
use crate::regasm::{Pat, ProgramBuilder};
use crate::regboundary::{is_boundary, next_gcb_break, Text};
use crate::regcallout::{CalloutContext, HostCallback, HostValue};
use crate::regclass::{node_matches, ClassCtx};
use crate::regcp::{CheckpointStack, CpId, Parens};
use crate::regenc::{char_count, decode_text, hop_back, hop_back_lim, hop_forward, next_char, MatchEncoding};
use crate::regint::*;
use crate::regintuit::Intuit;
use crate::regscript::is_script_run;
use crate::regtrie::{Trie, TrieWalk, WordId};
use crate::unicode::{fold_with, rules_for};

// ============================================================================
// Global Limits
// ============================================================================

static RETRY_LIMIT_IN_MATCH: AtomicU64 = AtomicU64::new(DEFAULT_RETRY_LIMIT_IN_MATCH);
static MATCH_STACK_LIMIT: AtomicUsize = AtomicUsize::new(DEFAULT_MATCH_STACK_LIMIT_SIZE);
static TIME_LIMIT: AtomicU64 = AtomicU64::new(DEFAULT_TIME_LIMIT_MSEC);
static NOCHANGE_DEPTH_LIMIT: AtomicU32 = AtomicU32::new(DEFAULT_NOCHANGE_DEPTH_LIMIT);

pub fn set_retry_limit_in_match(n: u64) { RETRY_LIMIT_IN_MATCH.store(n, Ordering::Relaxed); }
pub fn get_retry_limit_in_match() -> u64 { RETRY_LIMIT_IN_MATCH.load(Ordering::Relaxed) }
pub fn set_match_stack_limit(n: usize) { MATCH_STACK_LIMIT.store(n, Ordering::Relaxed); }
pub fn get_match_stack_limit() -> usize { MATCH_STACK_LIMIT.load(Ordering::Relaxed) }
pub fn set_time_limit(msec: u64) { TIME_LIMIT.store(msec, Ordering::Relaxed); }
pub fn get_time_limit() -> u64 { TIME_LIMIT.load(Ordering::Relaxed) }
pub fn set_nochange_depth_limit(n: u32) { NOCHANGE_DEPTH_LIMIT.store(n, Ordering::Relaxed); }
pub fn get_nochange_depth_limit() -> u32 { NOCHANGE_DEPTH_LIMIT.load(Ordering::Relaxed) }

const CHECK_TIME_INTERVAL: u64 = 512;

/// Limits read once per execution.
#[derive(Debug, Clone, Copy)]
struct Limits {
    retry: u64,
    stack: usize,
    time_ms: u64,
    nochange: u32,
}

impl Limits {
    fn load() -> Self {
        Limits {
            retry: get_retry_limit_in_match(),
            stack: get_match_stack_limit(),
            time_ms: get_time_limit(),
            nochange: get_nochange_depth_limit(),
        }
    }
}

// ============================================================================
// Public Interface
// ============================================================================

/// One execution request.
#[derive(Clone, Copy, Default)]
pub struct ExecInput<'a> {
    pub subject: &'a [u8],
    /// The subject is UTF-8; otherwise one byte per character.
    pub utf8: bool,
    /// Byte offset where the search starts.
    pub start: usize,
    /// A match must end at least this many bytes past `start`.
    pub minend: usize,
    /// Position `\G` matches at.
    pub gpos: Option<usize>,
    pub flags: ExecFlags,
    pub locale: Locale,
    pub host: Option<&'a dyn HostCallback>,
    /// Raised by another thread to abort the match.
    pub interrupt: Option<&'a AtomicBool>,
}

impl<'a> ExecInput<'a> {
    pub fn new(subject: &'a [u8], utf8: bool) -> Self {
        ExecInput { subject, utf8, ..ExecInput::default() }
    }
}

impl fmt::Debug for ExecInput<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecInput")
            .field("len", &self.subject.len())
            .field("utf8", &self.utf8)
            .field("start", &self.start)
            .field("minend", &self.minend)
            .field("gpos", &self.gpos)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}

/// Capture state of a successful match.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecResult {
    /// Byte ranges per group; index 0 is the reported match.
    pub offs: Vec<Option<(usize, usize)>>,
    pub lastparen: u32,
    pub lastcloseparen: u32,
    /// Name of the last mark passed on the way to success.
    pub mark: Option<String>,
    /// Value of the last side-effect code block.
    pub side_value: Option<HostValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    Match(ExecResult),
    /// No match; carries the mark name involved in the last failing verb.
    NoMatch { mark: Option<String> },
}

/// Execute `prog` against the subject described by `input`.
pub fn regexec_flags(prog: &Arc<Program>, input: ExecInput<'_>) -> Result<ExecOutcome, MatchError> {
    let data = input.subject;
    if input.start > data.len() {
        return Err(MatchError::InvalidArgument("start offset past end of subject"));
    }
    let enc = encodings::for_flag(input.utf8);
    if input.start < data.len() && !enc.is_char_head(data[input.start]) {
        return Err(MatchError::InvalidArgument("start offset inside a character"));
    }
    if input.gpos.is_some_and(|g| g > data.len()) {
        return Err(MatchError::InvalidArgument("\\G position past end of subject"));
    }
    let mut m = Matcher::new(prog, &input, enc);
    Ok(match m.search()? {
        Some(result) => ExecOutcome::Match(result),
        None => ExecOutcome::NoMatch { mark: m.fail_mark.take() },
    })
}

// ============================================================================
// Backtrack State Stack
// ============================================================================

/// Per-program matching context. A postponed sub-pattern gets its own.
#[derive(Debug)]
struct RxState {
    prog: Arc<Program>,
    parens: Parens,
    /// Entry position of the innermost active recursion into each group.
    recurse_locinput: Vec<Option<usize>>,
}

impl RxState {
    fn new(prog: Arc<Program>) -> Self {
        let n = prog.nparens;
        RxState { prog, parens: Parens::new(n), recurse_locinput: vec![None; n as usize + 1] }
    }
}

/// Quick reject for the node following a repeat.
#[derive(Debug, Clone, Copy)]
enum NextChar {
    Unknown,
    /// Leading bytes of an unfolded literal in the subject's encoding.
    Bytes { buf: [u8; NEXT_CHAR_FILTER_LEN], len: usize },
    /// First character of a literal, compared under its fold.
    Char { c: u32, fold: Option<FoldKind> },
}

#[derive(Debug, Clone)]
struct CurlyxState {
    prev_curlyx: Option<usize>,
    me: usize,
    b: usize,
    min: u32,
    max: u32,
    greedy: bool,
    parenfloor: u32,
    /// Iterations matched so far; -1 before the first WHILEM.
    count: i64,
    lastloc: Option<usize>,
}

#[derive(Debug, Clone, Copy)]
struct WhilemLocals {
    curlyx: usize,
    save_lastloc: Option<usize>,
    cache: Option<usize>,
    cp: Option<CpId>,
}

#[derive(Debug, Clone, Copy)]
struct CurlymState {
    a: usize,
    b: usize,
    paren: u32,
    min: u32,
    max: u32,
    greedy: bool,
    count: u32,
    /// Character length of one A.
    alen: usize,
    lastparen: u32,
    lastcloseparen: u32,
    filter: NextChar,
}

#[derive(Debug, Clone, Copy)]
struct CurlyState {
    a: usize,
    b: usize,
    paren: u32,
    min: u32,
    max: u32,
    count: u32,
    lastparen: u32,
    lastcloseparen: u32,
    filter: NextChar,
    /// Furthest position a lazy B may start at.
    maxpos: usize,
}

#[derive(Debug, Clone, Copy)]
struct LookState {
    me: usize,
    wanted: bool,
    logical: bool,
    suspend: bool,
    behind: bool,
    /// Current start of the body attempt.
    start: usize,
    /// Last start a lookbehind body is tried from.
    nearest: usize,
    prev_match_end: Option<usize>,
    cp: CpId,
}

/// Saved links of a recursion or postponed pattern. The same shape is
/// pushed on entry and again when the callee returns to its caller.
#[derive(Debug, Clone)]
struct EvalState {
    prev_rx: usize,
    prev_curlyx: Option<usize>,
    prev_eval: Option<usize>,
    prev_look: u32,
    /// Continuation after the call.
    b: usize,
    cp: CpId,
    /// Group whose CLOSE returns from the call; `Some(0)` returns at END.
    close_paren: Option<u32>,
    recurse: Option<(u32, Option<usize>)>,
    rx_pushed: Option<usize>,
}

#[derive(Debug)]
enum Resume {
    BranchNext { next_branch: Option<usize>, cp: CpId },
    TrieNext { node: usize, walk: TrieWalk, word: WordId, cp: Option<CpId>, lastparen: u32, lastcloseparen: u32 },
    CurlyxEnd(CurlyxState),
    WhilemAPre(WhilemLocals),
    WhilemAMax(WhilemLocals),
    WhilemAMin(WhilemLocals),
    WhilemBMin(WhilemLocals),
    WhilemBMax(WhilemLocals),
    CurlymA(CurlymState),
    CurlymB(CurlymState),
    CurlyBMin(CurlyState),
    CurlyBMax(CurlyState),
    IfMatchA(LookState),
    EvalAB(EvalState),
    SideValue { prev: Option<HostValue> },
    KeepsNext { prev: Option<usize> },
    MarkpointNext { name: String, prev_mark: Option<usize>, mark_loc: usize, may_cut: bool },
    SkipNext { name: Option<String>, mark_loc: usize, may_cut: bool },
    CommitNext,
    CutgroupNext { name: Option<String> },
}

#[derive(Debug)]
struct Frame {
    resume: Resume,
    locinput: usize,
    loceol: usize,
    sr0: usize,
    /// Also resumed on downstream success.
    yes: bool,
    prev_yes: Option<usize>,
}

/// Frames in fixed-size slabs, addressed by depth.
#[derive(Debug, Default)]
struct StateStack {
    slabs: Vec<Vec<Frame>>,
    len: usize,
}

impl StateStack {
    fn push(&mut self, frame: Frame) -> usize {
        let slab = self.len / STATE_SLAB_FRAMES;
        if slab == self.slabs.len() {
            self.slabs.push(Vec::with_capacity(STATE_SLAB_FRAMES));
        }
        self.slabs[slab].push(frame);
        self.len += 1;
        self.len - 1
    }

    fn pop(&mut self) -> Option<Frame> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        self.slabs[self.len / STATE_SLAB_FRAMES].pop()
    }

    fn get(&self, i: usize) -> Option<&Frame> {
        if i >= self.len {
            return None;
        }
        self.slabs.get(i / STATE_SLAB_FRAMES)?.get(i % STATE_SLAB_FRAMES)
    }

    fn get_mut(&mut self, i: usize) -> Option<&mut Frame> {
        if i >= self.len {
            return None;
        }
        self.slabs.get_mut(i / STATE_SLAB_FRAMES)?.get_mut(i % STATE_SLAB_FRAMES)
    }

    fn truncate(&mut self, depth: usize) {
        while self.len > depth {
            self.pop();
        }
    }

    fn len(&self) -> usize {
        self.len
    }
}

// ============================================================================
// Super-linear Cache
// ============================================================================

/// One bit per (WHILEM, position) pair known to fail. Switched on only after
/// the loop tails have run about as many times as there are such pairs.
#[derive(Debug, Default)]
struct PosCache {
    bits: Vec<u8>,
    maxiter: usize,
    /// Countdown to activation; -1 once active.
    iter: i64,
}

impl PosCache {
    /// Returns the bit for `(id, pos)` when the cache is active, and whether
    /// this call switched it on.
    fn probe(&mut self, id: u32, n_whilem: u32, pos: usize, strlen: usize) -> (Option<usize>, bool) {
        let n = n_whilem.max(1) as usize;
        if self.maxiter == 0 {
            self.maxiter = (strlen + 1).saturating_mul(n);
            self.iter = self.maxiter.min(i64::MAX as usize) as i64;
        }
        let was = self.iter;
        self.iter -= 1;
        let enabled = was == 0;
        if enabled {
            self.bits.clear();
            self.bits.resize(self.maxiter.div_ceil(8), 0);
        }
        if self.iter < 0 {
            self.iter = -1;
            return (Some((id as usize).saturating_sub(1) + pos * n), enabled);
        }
        (None, enabled)
    }

    fn is_set(&self, bit: usize) -> bool {
        self.bits.get(bit / 8).is_some_and(|b| b & (1 << (bit % 8)) != 0)
    }

    fn set(&mut self, bit: usize) {
        if let Some(b) = self.bits.get_mut(bit / 8) {
            *b |= 1 << (bit % 8);
        }
    }

    /// Forget everything; the countdown restarts.
    fn invalidate(&mut self) {
        self.maxiter = 0;
    }
}

// ============================================================================
// Matcher
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cut {
    None,
    /// Give up on every later start position.
    Stop,
    /// Resume the search at this position.
    At(usize),
}

enum Step {
    Dispatch(usize),
    Yes,
    No,
    /// Overall success.
    Done,
}

struct Matcher<'a> {
    data: &'a [u8],
    strend: usize,
    enc: MatchEncoding,
    utf8_target: bool,
    start: usize,
    minend: usize,
    gpos: Option<usize>,
    flags: ExecFlags,
    locale: Locale,
    host: Option<&'a dyn HostCallback>,
    interrupt: Option<&'a AtomicBool>,
    limits: Limits,
    time_start: Option<Instant>,
    retries: u64,

    rxs: Vec<RxState>,
    cur_rx: usize,
    rx_switched: bool,
    stack: StateStack,
    cps: CheckpointStack,
    poscache: PosCache,

    // Registers of the current attempt.
    locinput: usize,
    loceol: usize,
    sr0: usize,
    try_start: usize,
    yes_state: Option<usize>,
    no_final: bool,
    do_cutgroup: bool,
    sw: bool,
    logical: bool,
    lastopen: u32,
    maxopenparen: u32,
    cur_curlyx: Option<usize>,
    cur_eval: Option<usize>,
    nochange_depth: u32,
    match_end: Option<usize>,
    mark_state: Option<usize>,
    popmark: Option<String>,
    sv_commit: Option<String>,
    sv_yes_mark: Option<String>,
    in_lookaround: u32,
    accepting: bool,
    keeps: Option<usize>,
    side_value: Option<HostValue>,
    cut: Cut,
    fail_mark: Option<String>,
}

impl<'a> Matcher<'a> {
    fn new(prog: &Arc<Program>, input: &ExecInput<'a>, enc: MatchEncoding) -> Self {
        let strend = input.subject.len();
        Matcher {
            data: input.subject,
            strend,
            enc,
            utf8_target: input.utf8,
            start: input.start,
            minend: input.start.saturating_add(input.minend),
            gpos: input.gpos,
            flags: input.flags,
            locale: input.locale,
            host: input.host,
            interrupt: input.interrupt,
            limits: Limits::load(),
            time_start: None,
            retries: 0,
            rxs: vec![RxState::new(Arc::clone(prog))],
            cur_rx: 0,
            rx_switched: false,
            stack: StateStack::default(),
            cps: CheckpointStack::new(),
            poscache: PosCache::default(),
            locinput: input.start,
            loceol: strend,
            sr0: input.start,
            try_start: input.start,
            yes_state: None,
            no_final: false,
            do_cutgroup: false,
            sw: false,
            logical: false,
            lastopen: 0,
            maxopenparen: 0,
            cur_curlyx: None,
            cur_eval: None,
            nochange_depth: 0,
            match_end: None,
            mark_state: None,
            popmark: None,
            sv_commit: None,
            sv_yes_mark: None,
            in_lookaround: 0,
            accepting: false,
            keeps: None,
            side_value: None,
            cut: Cut::None,
            fail_mark: None,
        }
    }

    #[cfg_attr(not(debug_assertions), allow(unused_variables))]
    fn trace(&self, args: fmt::Arguments<'_>) {
        #[cfg(debug_assertions)]
        if self.flags.contains(ExecFlags::TRACE) {
            do_trace(args);
        }
    }

    fn class_ctx(&self, prog: &Program) -> ClassCtx<'a> {
        ClassCtx { utf8_target: self.utf8_target, pat_utf8: prog.utf8, locale: self.locale, host: self.host }
    }

    #[inline]
    fn parens(&self) -> &Parens {
        &self.rxs[self.cur_rx].parens
    }

    #[inline]
    fn parens_mut(&mut self) -> &mut Parens {
        &mut self.rxs[self.cur_rx].parens
    }

    fn switch_rx(&mut self, rx: usize) {
        if rx != self.cur_rx {
            self.cur_rx = rx;
            self.rx_switched = true;
        }
    }

    /// Check if the time limit has been exceeded. On first call, initializes
    /// the start time.
    #[inline]
    fn check_time_limit(&mut self) -> bool {
        if self.limits.time_ms == 0 {
            return false;
        }
        let start = self.time_start.get_or_insert_with(Instant::now);
        start.elapsed() >= Duration::from_millis(self.limits.time_ms)
    }

    /// Bookkeeping for one failure-path pop.
    fn count_retry(&mut self) -> Result<(), MatchError> {
        self.retries += 1;
        if self.limits.retry != 0 && self.retries > self.limits.retry {
            return Err(MatchError::RetryLimitOver);
        }
        if self.interrupt.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            return Err(MatchError::Interrupted);
        }
        if self.limits.time_ms > 0 && self.retries % CHECK_TIME_INTERVAL == 0 && self.check_time_limit() {
            return Err(MatchError::TimeLimitOver);
        }
        Ok(())
    }

    // ========================================================================
    // Search driver
    // ========================================================================

    fn search(&mut self) -> Result<Option<ExecResult>, MatchError> {
        let prog = Arc::clone(&self.rxs[0].prog);
        let (data, strend, enc) = (self.data, self.strend, self.enc);
        let start = self.start;
        if strend - start < prog.minlen {
            self.trace(format_args!("subject too short for minlen {}", prog.minlen));
            return Ok(None);
        }
        let intuit = Intuit::new(&prog, self.utf8_target);
        if intuit.impossible() {
            self.trace(format_args!("required literal not representable in subject"));
            return Ok(None);
        }
        if self.flags.contains(ExecFlags::ANCHORED) {
            return self.try_once(&prog, start);
        }
        match prog.anchor {
            Anchor::Sbol => return if start == 0 { self.try_once(&prog, 0) } else { Ok(None) },
            Anchor::Gpos => {
                return match self.gpos {
                    Some(g) if g >= start => self.try_once(&prog, g),
                    _ => Ok(None),
                }
            }
            Anchor::None | Anchor::Mbol => {}
        }

        let use_intuit =
            prog.anchor == Anchor::None && !self.flags.contains(ExecFlags::NO_INTUIT) && intuit.has_hints();
        let ctx = self.class_ctx(&prog);
        let mut s = start;
        loop {
            let cand = if prog.anchor == Anchor::Mbol && s > 0 && data[s - 1] != b'\n' {
                match memchr(b'\n', &data[s..strend]) {
                    Some(i) => s + i + 1,
                    None => break,
                }
            } else if use_intuit {
                match intuit.start(enc, data, s, strend, &ctx)? {
                    Some(p) => {
                        if p != s {
                            self.trace(format_args!("intuit: skipped {} -> {}", s, p));
                        }
                        p
                    }
                    None => {
                        self.trace(format_args!("intuit: no candidate from {}", s));
                        break;
                    }
                }
            } else {
                s
            };
            if strend - cand < prog.minlen {
                break;
            }
            if self.regtry(cand)? {
                return Ok(Some(self.result(&prog, cand)));
            }
            match mem::replace(&mut self.cut, Cut::None) {
                Cut::Stop => break,
                Cut::At(p) if p > cand => {
                    s = p;
                    continue;
                }
                _ => {}
            }
            if cand >= strend {
                break;
            }
            s = next_char(enc, data, cand, strend);
        }
        Ok(None)
    }

    fn try_once(&mut self, prog: &Program, s: usize) -> Result<Option<ExecResult>, MatchError> {
        if self.strend - s < prog.minlen {
            return Ok(None);
        }
        Ok(if self.regtry(s)? { Some(self.result(prog, s)) } else { None })
    }

    fn reset_attempt(&mut self, s: usize) {
        self.rxs.truncate(1);
        self.switch_rx(0);
        let rx = &mut self.rxs[0];
        rx.parens.reset();
        rx.recurse_locinput.iter_mut().for_each(|slot| *slot = None);
        self.stack.truncate(0);
        self.cps.clear();
        self.retries = 0;
        self.locinput = s;
        self.loceol = self.strend;
        self.sr0 = s;
        self.try_start = s;
        self.yes_state = None;
        self.no_final = false;
        self.do_cutgroup = false;
        self.sw = false;
        self.logical = false;
        self.lastopen = 0;
        self.maxopenparen = 0;
        self.cur_curlyx = None;
        self.cur_eval = None;
        self.nochange_depth = 0;
        self.match_end = None;
        self.mark_state = None;
        self.popmark = None;
        self.sv_commit = None;
        self.sv_yes_mark = None;
        self.in_lookaround = 0;
        self.accepting = false;
        self.keeps = None;
        self.side_value = None;
        self.cut = Cut::None;
    }

    /// Try a match starting exactly at `s`.
    fn regtry(&mut self, s: usize) -> Result<bool, MatchError> {
        self.reset_attempt(s);
        self.trace(format_args!("attempt at {}", s));
        let matched = self.run()?;
        if !matched && self.sv_commit.is_some() {
            self.fail_mark = self.sv_commit.take();
        }
        Ok(matched)
    }

    fn result(&self, prog: &Program, s: usize) -> ExecResult {
        let parens = &self.rxs[0].parens;
        let nosave = self.flags.contains(ExecFlags::NOSAVE);
        let n = if nosave { 0 } else { prog.nparens };
        let mut offs = Vec::with_capacity(n as usize + 1);
        offs.push(Some((self.keeps.unwrap_or(s), self.locinput)));
        offs.extend((1..=n).map(|g| parens.group(g)));
        ExecResult {
            offs,
            lastparen: if nosave { 0 } else { parens.lastparen },
            lastcloseparen: if nosave { 0 } else { parens.lastcloseparen },
            mark: self.sv_yes_mark.clone(),
            side_value: self.side_value.clone(),
        }
    }

    // ========================================================================
    // Dispatch loop
    // ========================================================================

    fn run(&mut self) -> Result<bool, MatchError> {
        let mut prog = Arc::clone(&self.rxs[self.cur_rx].prog);
        let mut step = Step::Dispatch(0);
        loop {
            if self.rx_switched {
                prog = Arc::clone(&self.rxs[self.cur_rx].prog);
                self.rx_switched = false;
            }
            step = match step {
                Step::Dispatch(idx) => self.exec_node(&prog, idx)?,
                Step::Done => return Ok(true),
                Step::Yes => match self.pop_to_yes() {
                    Some(frame) => {
                        self.trace(format_args!("pop (yes) depth {}", self.stack.len()));
                        self.resume_yes(&prog, frame)?
                    }
                    None => return Ok(true),
                },
                Step::No => {
                    self.count_retry()?;
                    let frame = if self.no_final {
                        self.discard_to_yes();
                        match self.pop_to_yes() {
                            Some(frame) => frame,
                            None => return Ok(false),
                        }
                    } else {
                        match self.stack.pop() {
                            Some(frame) => {
                                if frame.yes {
                                    self.yes_state = frame.prev_yes;
                                }
                                frame
                            }
                            None => return Ok(false),
                        }
                    };
                    self.trace(format_args!("pop (no) depth {}", self.stack.len()));
                    self.locinput = frame.locinput;
                    self.loceol = frame.loceol;
                    self.sr0 = frame.sr0;
                    self.resume_no(&prog, frame)?
                }
            };
        }
    }

    fn push(&mut self, resume: Resume, yes: bool) -> Result<usize, MatchError> {
        if self.limits.stack != 0 && self.stack.len() >= self.limits.stack {
            return Err(MatchError::StackLimitOver);
        }
        let frame = Frame {
            resume,
            locinput: self.locinput,
            loceol: self.loceol,
            sr0: self.sr0,
            yes,
            prev_yes: self.yes_state,
        };
        let i = self.stack.push(frame);
        if yes {
            self.yes_state = Some(i);
        }
        Ok(i)
    }

    /// Discard every frame above the nearest yes-state and pop it.
    fn pop_to_yes(&mut self) -> Option<Frame> {
        let y = self.yes_state?;
        self.stack.truncate(y + 1);
        let frame = self.stack.pop()?;
        self.yes_state = frame.prev_yes;
        Some(frame)
    }

    /// Drop the plain states above the nearest yes-state after a verb,
    /// undoing the registers they guard.
    fn discard_to_yes(&mut self) {
        let Some(y) = self.yes_state else { return };
        while self.stack.len() > y + 1 {
            let Some(frame) = self.stack.pop() else { break };
            match frame.resume {
                Resume::KeepsNext { prev } => self.keeps = prev,
                Resume::SideValue { prev } => self.side_value = prev,
                _ => {}
            }
        }
    }

    #[inline]
    fn goto_next(&self, prog: &Program, idx: usize) -> Result<Step, MatchError> {
        Ok(Step::Dispatch(prog.next_req(idx)?))
    }

    #[inline]
    fn check(&self, prog: &Program, idx: usize, ok: bool) -> Result<Step, MatchError> {
        if ok {
            self.goto_next(prog, idx)
        } else {
            Ok(Step::No)
        }
    }

    #[inline]
    fn advance_to(&mut self, prog: &Program, idx: usize, end: Option<usize>) -> Result<Step, MatchError> {
        match end {
            Some(p) => {
                self.locinput = p;
                self.goto_next(prog, idx)
            }
            None => Ok(Step::No),
        }
    }

    fn exec_node(&mut self, prog: &Program, idx: usize) -> Result<Step, MatchError> {
        let node = prog.node(idx)?;
        self.trace(format_args!("{:>6} {:>5}: {}", self.locinput, idx, node.op.name()));
        let (data, strend) = (self.data, self.strend);
        let loc = self.locinput;

        match &node.op {
            // ================================================================
            // END - end of program, or return from a recursion
            // ================================================================
            Op::End => {
                if self.cur_eval.is_some() {
                    return self.fake_end();
                }
                if loc < self.minend {
                    return Ok(Step::No);
                }
                Ok(Step::Done)
            }

            // ================================================================
            // SUCCEED - end of a lookaround, atomic or CURLYM body
            // ================================================================
            Op::Succeed => {
                if self.yes_state.is_none() {
                    return Err(MatchError::UnknownOpcode { node: idx });
                }
                Ok(Step::Yes)
            }

            Op::Nothing | Op::Tail => self.goto_next(prog, idx),

            // ================================================================
            // Anchors and boundaries
            // ================================================================
            Op::Sbol => self.check(prog, idx, loc == 0),
            Op::Mbol => self.check(prog, idx, loc == 0 || (loc < strend && data[loc - 1] == b'\n')),
            Op::Seol => self.check(prog, idx, loc == strend || (loc + 1 == strend && data[loc] == b'\n')),
            Op::Meol => self.check(prog, idx, loc == strend || data[loc] == b'\n'),
            Op::Eos => self.check(prog, idx, loc == strend),
            Op::Gpos => self.check(prog, idx, self.gpos == Some(loc)),
            Op::Bound { kind, charset, negate } => {
                let rules = rules_for(*charset, self.utf8_target, prog.utf8, self.locale);
                let text = Text::new(data, 0, strend, self.enc);
                let at = is_boundary(*kind, rules, &text, loc)?;
                self.check(prog, idx, at != *negate)
            }

            // ================================================================
            // Single characters
            // ================================================================
            Op::RegAny | Op::Sany | Op::AnyOf(_) | Op::Posix { .. } => {
                let end = self.match_one(prog, &node.op)?;
                self.advance_to(prog, idx, end)
            }
            Op::Exact { text, fold } => {
                let end = self.match_exact(text, *fold, prog.utf8)?;
                self.advance_to(prog, idx, end)
            }

            // ================================================================
            // LNBREAK (\R) and CLUMP (\X)
            // ================================================================
            Op::LnBreak => {
                if loc >= self.loceol {
                    return Ok(Step::No);
                }
                let (c, len) = self.enc.decode(data, loc, self.loceol)?;
                let end = if c == 0x0d && loc + 1 < self.loceol && data[loc + 1] == b'\n' {
                    Some(loc + 2)
                } else if matches!(c, 0x0a..=0x0d | 0x85 | 0x2028 | 0x2029) {
                    Some(loc + len)
                } else {
                    None
                };
                self.advance_to(prog, idx, end)
            }
            Op::Clump => {
                if loc >= self.loceol {
                    return Ok(Step::No);
                }
                let text = Text::new(data, 0, self.loceol, self.enc);
                let end = next_gcb_break(&text, loc)?;
                self.advance_to(prog, idx, Some(end))
            }

            // ================================================================
            // OPEN / CLOSE - capture groups
            // ================================================================
            Op::Open(n) => {
                let n = *n;
                self.parens_mut().offs[n as usize].start_tmp = Some(loc);
                self.maxopenparen = self.maxopenparen.max(n);
                self.lastopen = n;
                self.goto_next(prog, idx)
            }
            Op::Close(n) => {
                let n = *n;
                self.parens_mut().close(n, loc);
                if self.eval_close_paren()? == Some(n) {
                    return self.fake_end();
                }
                self.goto_next(prog, idx)
            }

            // ================================================================
            // REF / NREF - back-references
            // ================================================================
            Op::Ref { group, fold } => {
                let range = self.parens().group(*group);
                let end = self.match_ref(range, *fold)?;
                self.advance_to(prog, idx, end)
            }
            Op::NRef { name, fold } => {
                let range = prog
                    .name_to_groups(name)
                    .and_then(|groups| groups.iter().find_map(|&g| self.parens().group(g)));
                let end = self.match_ref(range, *fold)?;
                self.advance_to(prog, idx, end)
            }

            // ================================================================
            // BRANCH - one alternative of an alternation
            // ================================================================
            Op::Branch => {
                let rx = self.cur_rx;
                let parens = &self.rxs[rx].parens;
                let cp = self.cps.push(parens, parens.lastparen, self.maxopenparen)?;
                self.push(Resume::BranchNext { next_branch: prog.next(idx), cp }, prog.has_cutgroup)?;
                Ok(Step::Dispatch(idx + 1))
            }

            // ================================================================
            // TRIE - literal alternation, words tried in declaration order
            // ================================================================
            Op::Trie(trie) => {
                let Some(walk) = trie.walk(self.enc, data, loc, self.loceol)? else {
                    return Ok(Step::No);
                };
                match trie.next_word(&walk, 0) {
                    Some(word) => self.trie_try(prog, idx, trie, walk, word),
                    None => Ok(Step::No),
                }
            }

            // ================================================================
            // STAR / PLUS / CURLY / CURLYN - single-character repeats
            // ================================================================
            Op::Star { greedy } => self.curly_start(prog, idx, idx + 1, 0, 0, REG_INFTY, *greedy),
            Op::Plus { greedy } => self.curly_start(prog, idx, idx + 1, 0, 1, REG_INFTY, *greedy),
            Op::Curly { min, max, greedy } => self.curly_start(prog, idx, idx + 1, 0, *min, *max, *greedy),
            Op::CurlyN { paren, min, max, greedy } => {
                self.curly_start(prog, idx, idx + 2, *paren, *min, *max, *greedy)
            }

            // ================================================================
            // CURLYM - repeat of a fixed-length body
            // ================================================================
            Op::CurlyM { paren, min, max, greedy } => {
                let parens = self.parens();
                let st = CurlymState {
                    a: idx + 1,
                    b: prog.next_req(idx)?,
                    paren: *paren,
                    min: *min,
                    max: *max,
                    greedy: *greedy,
                    count: 0,
                    alen: 0,
                    lastparen: parens.lastparen,
                    lastcloseparen: parens.lastcloseparen,
                    filter: NextChar::Unknown,
                };
                let st = CurlymState { filter: self.next_char_filter(prog, st.b), ..st };
                if st.paren > 0 {
                    self.lastopen = st.paren;
                    self.maxopenparen = self.maxopenparen.max(st.paren);
                }
                if (if st.greedy { st.max } else { st.min }) == 0 {
                    return self.curlym_do_b(st);
                }
                self.curlym_do_a(st)
            }

            // ================================================================
            // CURLYX / WHILEM - general repeat
            // ================================================================
            Op::CurlyX { min, max, greedy, parenfloor } => {
                let b = prog.next_req(idx)?;
                let whilem = b.checked_sub(1).ok_or(MatchError::corrupt(idx, "CURLYX without its WHILEM"))?;
                let st = CurlyxState {
                    prev_curlyx: self.cur_curlyx,
                    me: idx,
                    b,
                    min: *min,
                    max: *max,
                    greedy: *greedy,
                    parenfloor: *parenfloor,
                    count: -1,
                    lastloc: None,
                };
                let f = self.push(Resume::CurlyxEnd(st), true)?;
                self.cur_curlyx = Some(f);
                Ok(Step::Dispatch(whilem))
            }
            Op::WhileM { cache_id } => self.whilem(prog, idx, *cache_id),

            // ================================================================
            // IFMATCH / UNLESSM / SUSPEND - lookaround and atomic groups
            // ================================================================
            Op::IfMatch { behind } => self.lookaround(prog, idx, true, *behind, false),
            Op::UnlessM { behind } => self.lookaround(prog, idx, false, *behind, false),
            Op::Suspend => self.lookaround(prog, idx, true, None, true),
            Op::LookbehindEnd => self.check(prog, idx, self.match_end.map_or(true, |e| e == loc)),

            // ================================================================
            // Conditionals
            // ================================================================
            Op::Logical => {
                self.logical = true;
                self.goto_next(prog, idx)
            }
            Op::IfThen => {
                if self.sw {
                    return Ok(Step::Dispatch(idx + 1));
                }
                let n = prog.next_req(idx)?;
                match prog.node(n)?.op {
                    Op::IfThen => Ok(Step::Dispatch(n + 1)),
                    _ => Ok(Step::Dispatch(n)),
                }
            }
            Op::GroupP(n) => {
                self.sw = self.parens().group(*n).is_some();
                self.goto_next(prog, idx)
            }
            Op::GroupPN(name) => {
                self.sw = prog
                    .name_to_groups(name)
                    .is_some_and(|groups| groups.iter().any(|&g| self.parens().group(g).is_some()));
                self.goto_next(prog, idx)
            }
            Op::InsubP(n) => {
                let paren = self.eval_close_paren()?;
                self.sw = match *n {
                    0 => self.cur_eval.is_some(),
                    n => paren == Some(n),
                };
                self.goto_next(prog, idx)
            }
            Op::DefineP => {
                self.sw = false;
                self.goto_next(prog, idx)
            }

            // ================================================================
            // GOSUB - recursion into a group
            // ================================================================
            Op::GoSub { group, offset } => self.gosub(prog, idx, *group, *offset),

            // ================================================================
            // EVAL - host code
            // ================================================================
            Op::Eval { code, flavour } => self.eval(prog, idx, *code, *flavour),

            // ================================================================
            // Backtracking control verbs
            // ================================================================
            Op::Commit => {
                if self.in_lookaround == 0 {
                    self.cut = Cut::Stop;
                }
                self.push(Resume::CommitNext, false)?;
                self.goto_next(prog, idx)
            }
            Op::Prune => {
                self.push(Resume::CommitNext, false)?;
                self.goto_next(prog, idx)
            }
            Op::Skip { name: None } => {
                let may_cut = self.in_lookaround == 0;
                self.push(Resume::SkipNext { name: None, mark_loc: loc, may_cut }, false)?;
                self.goto_next(prog, idx)
            }
            Op::Skip { name: Some(name) } => {
                if self.find_mark(name).is_some() {
                    let may_cut = self.in_lookaround == 0;
                    self.push(Resume::SkipNext { name: Some(name.clone()), mark_loc: loc, may_cut }, false)?;
                }
                self.goto_next(prog, idx)
            }
            Op::MarkPoint { name } => {
                self.sv_commit = Some(name.clone());
                self.sv_yes_mark = Some(name.clone());
                let resume = Resume::MarkpointNext {
                    name: name.clone(),
                    prev_mark: self.mark_state,
                    mark_loc: loc,
                    may_cut: self.in_lookaround == 0,
                };
                let f = self.push(resume, true)?;
                self.mark_state = Some(f);
                self.goto_next(prog, idx)
            }
            Op::CutGroup { name } => {
                if name.is_some() {
                    self.sv_yes_mark = name.clone();
                }
                self.push(Resume::CutgroupNext { name: name.clone() }, false)?;
                self.goto_next(prog, idx)
            }
            Op::Accept => {
                self.close_open_groups(prog, idx)?;
                if self.in_lookaround > 0 {
                    self.accepting = true;
                    return Ok(Step::Yes);
                }
                if self.cur_eval.is_some() {
                    return self.fake_end();
                }
                if loc < self.minend {
                    return Ok(Step::No);
                }
                Ok(Step::Done)
            }
            Op::OpFail => {
                if self.logical {
                    self.logical = false;
                    self.sw = false;
                    return self.goto_next(prog, idx);
                }
                Ok(Step::No)
            }

            // ================================================================
            // KEEPS (\K) - reset the reported match start
            // ================================================================
            Op::Keeps => {
                self.push(Resume::KeepsNext { prev: self.keeps }, false)?;
                self.keeps = Some(loc);
                self.goto_next(prog, idx)
            }

            // ================================================================
            // SROPEN / SRCLOSE - script runs
            // ================================================================
            Op::SrOpen => {
                self.sr0 = loc;
                self.goto_next(prog, idx)
            }
            Op::SrClose => {
                let ok = is_script_run(self.enc, data, self.sr0.min(loc), loc)?;
                self.check(prog, idx, ok)
            }
        }
    }

    // ========================================================================
    // Success and failure handlers
    // ========================================================================

    fn resume_yes(&mut self, prog: &Program, frame: Frame) -> Result<Step, MatchError> {
        match frame.resume {
            Resume::BranchNext { cp, .. } => {
                self.cps.blow(cp);
                Ok(Step::Yes)
            }
            Resume::TrieNext { cp, .. } => {
                if let Some(cp) = cp {
                    self.cps.blow(cp);
                }
                Ok(Step::Yes)
            }
            Resume::CurlyxEnd(st) => {
                self.cur_curlyx = st.prev_curlyx;
                Ok(Step::Yes)
            }
            Resume::WhilemBMin(loc) | Resume::WhilemBMax(loc) => {
                self.cur_curlyx = Some(loc.curlyx);
                Ok(Step::Yes)
            }
            Resume::CurlymA(st) => self.curlym_a_matched(st, frame.locinput),
            Resume::IfMatchA(st) => {
                if self.accepting && st.suspend {
                    self.match_end = st.prev_match_end;
                    self.cps.blow(st.cp);
                    return Ok(Step::Yes);
                }
                self.accepting = false;
                self.loceol = frame.loceol;
                self.look_finish(prog, st, true, frame.locinput, true)
            }
            Resume::EvalAB(ev) => {
                self.switch_rx(ev.prev_rx);
                self.cps.blow(ev.cp);
                self.restore_eval_links(&ev);
                self.drop_pushed_rx(&ev);
                Ok(Step::Yes)
            }
            Resume::MarkpointNext { prev_mark, .. } => {
                self.mark_state = prev_mark;
                Ok(Step::Yes)
            }
            _ => Err(MatchError::corrupt(frame.locinput, "success reached a failure-only state")),
        }
    }

    fn resume_no(&mut self, prog: &Program, frame: Frame) -> Result<Step, MatchError> {
        match frame.resume {
            // ================================================================
            // BRANCH / TRIE - next alternative
            // ================================================================
            Resume::BranchNext { next_branch, cp } => {
                if self.do_cutgroup {
                    self.do_cutgroup = false;
                    self.no_final = false;
                }
                let rx = self.cur_rx;
                self.cps.restore_and_pop(cp, &mut self.rxs[rx].parens, &mut self.maxopenparen);
                match next_branch {
                    Some(nb) if matches!(prog.node(nb)?.op, Op::Branch) => Ok(Step::Dispatch(nb)),
                    _ => Ok(Step::No),
                }
            }
            Resume::TrieNext { node, walk, word, cp, lastparen, lastcloseparen } => {
                if self.do_cutgroup {
                    self.do_cutgroup = false;
                    self.no_final = false;
                }
                let rx = self.cur_rx;
                match cp {
                    Some(cp) => self.cps.restore_and_pop(cp, &mut self.rxs[rx].parens, &mut self.maxopenparen),
                    None => self.parens_mut().unwind(lastparen, lastcloseparen),
                }
                let Op::Trie(trie) = &prog.node(node)?.op else {
                    return Err(MatchError::corrupt(node, "trie state without a trie"));
                };
                match trie.next_word(&walk, word) {
                    Some(next) => self.trie_try(prog, node, trie, walk, next),
                    None => Ok(Step::No),
                }
            }

            // ================================================================
            // CURLYX / WHILEM
            // ================================================================
            Resume::CurlyxEnd(st) => {
                self.cur_curlyx = st.prev_curlyx;
                Ok(Step::No)
            }
            Resume::WhilemAPre(loc) | Resume::WhilemAMin(loc) => {
                self.whilem_a_failed(loc)?;
                Ok(self.cache_say_no(loc))
            }
            Resume::WhilemAMax(loc) => {
                if let Some(cp) = loc.cp {
                    let rx = self.cur_rx;
                    self.cps.restore_and_pop(cp, &mut self.rxs[rx].parens, &mut self.maxopenparen);
                }
                self.whilem_do_b_max(loc)
            }
            Resume::WhilemBMax(loc) => {
                self.cur_curlyx = Some(loc.curlyx);
                let st = self.curlyx_mut(loc.curlyx)?;
                st.lastloc = loc.save_lastloc;
                st.count -= 1;
                Ok(self.cache_say_no(loc))
            }
            Resume::WhilemBMin(mut loc) => {
                self.cur_curlyx = Some(loc.curlyx);
                let locinput = self.locinput;
                let st = self.curlyx_mut(loc.curlyx)?;
                if !is_infinite_repeat(st.max) && st.count >= st.max as i64 {
                    st.count -= 1;
                    return Ok(self.cache_say_no(loc));
                }
                st.lastloc = Some(locinput);
                let (me, parenfloor) = (st.me, st.parenfloor);
                let rx = self.cur_rx;
                loc.cp = Some(self.cps.push(&self.rxs[rx].parens, parenfloor, self.maxopenparen)?);
                self.push(Resume::WhilemAMin(loc), false)?;
                Ok(Step::Dispatch(me + 1))
            }

            // ================================================================
            // CURLYM / CURLY
            // ================================================================
            Resume::CurlymA(st) => {
                if !st.greedy || st.count < st.min {
                    return Ok(Step::No);
                }
                self.curlym_do_b(st)
            }
            Resume::CurlymB(st) => self.curlym_b_failed(st),
            Resume::CurlyBMax(st) => {
                self.curly_unwind(&st);
                if st.count <= st.min {
                    return Ok(Step::No);
                }
                let st = CurlyState { count: st.count - 1, ..st };
                self.locinput = self.enc.prev_char_head(self.data, 0, self.locinput);
                self.curly_try_b_max(st)
            }
            Resume::CurlyBMin(mut st) => {
                self.curly_unwind(&st);
                if !self.curly_advance(prog, &mut st)? {
                    return Ok(Step::No);
                }
                self.curly_try_b_min(prog, st)
            }

            // ================================================================
            // IFMATCH / UNLESSM / SUSPEND
            // ================================================================
            Resume::IfMatchA(mut st) => {
                let entry = frame.locinput;
                if st.behind && st.start < st.nearest {
                    // Try the body again from one character nearer.
                    self.no_final = false;
                    self.do_cutgroup = false;
                    let rx = self.cur_rx;
                    self.cps.restore(st.cp, &mut self.rxs[rx].parens, &mut self.maxopenparen);
                    st.start = next_char(self.enc, self.data, st.start, entry);
                    let me = st.me;
                    let start = st.start;
                    self.push(Resume::IfMatchA(st), true)?;
                    self.locinput = start;
                    self.loceol = entry;
                    return Ok(Step::Dispatch(me + 1));
                }
                if !st.suspend {
                    self.no_final = false;
                    self.do_cutgroup = false;
                    self.accepting = false;
                }
                self.look_finish(prog, st, false, entry, true)
            }

            // ================================================================
            // EVAL / GOSUB
            // ================================================================
            Resume::EvalAB(ev) => {
                self.switch_rx(ev.prev_rx);
                let rx = self.cur_rx;
                self.cps.restore_and_pop(ev.cp, &mut self.rxs[rx].parens, &mut self.maxopenparen);
                self.restore_eval_links(&ev);
                self.drop_pushed_rx(&ev);
                Ok(Step::No)
            }
            Resume::SideValue { prev } => {
                self.side_value = prev;
                Ok(Step::No)
            }
            Resume::KeepsNext { prev } => {
                self.keeps = prev;
                Ok(Step::No)
            }

            // ================================================================
            // Verbs
            // ================================================================
            Resume::MarkpointNext { name, prev_mark, mark_loc, may_cut } => {
                if self.popmark.as_deref() == Some(name.as_str()) {
                    if may_cut && mark_loc > self.try_start {
                        self.cut = Cut::At(mark_loc);
                    }
                    self.popmark = None;
                    self.sv_commit = Some(name);
                }
                self.mark_state = prev_mark;
                self.sv_yes_mark = prev_mark.and_then(|m| self.mark_name(m).map(str::to_owned));
                Ok(Step::No)
            }
            Resume::SkipNext { name, mark_loc, may_cut } => {
                match name {
                    Some(name) => self.popmark = Some(name),
                    None => {
                        if may_cut && mark_loc > self.try_start {
                            self.cut = Cut::At(mark_loc);
                        }
                        if let Some(m) = self.mark_state {
                            self.sv_commit = self.mark_name(m).map(str::to_owned);
                        }
                    }
                }
                self.no_final = true;
                Ok(Step::No)
            }
            Resume::CommitNext => {
                self.no_final = true;
                Ok(Step::No)
            }
            Resume::CutgroupNext { name } => {
                self.do_cutgroup = true;
                self.no_final = true;
                if name.is_some() {
                    self.sv_commit = name;
                }
                Ok(Step::No)
            }
        }
    }

    // ========================================================================
    // TRIE helpers
    // ========================================================================

    fn trie_try(
        &mut self,
        prog: &Program,
        idx: usize,
        trie: &Trie,
        walk: TrieWalk,
        word: WordId,
    ) -> Result<Step, MatchError> {
        let rx = self.cur_rx;
        let parens = &self.rxs[rx].parens;
        let (lastparen, lastcloseparen) = (parens.lastparen, parens.lastcloseparen);
        let cp = if trie.jump.is_empty() {
            None
        } else {
            Some(self.cps.push(parens, lastparen, self.maxopenparen)?)
        };
        let resume = Resume::TrieNext { node: idx, walk, word, cp, lastparen, lastcloseparen };
        self.push(resume, prog.has_cutgroup)?;
        self.locinput = trie.word_end(self.enc, self.data, &walk, word, self.loceol);
        let target = match trie.jump.get(usize::from(word).wrapping_sub(1)) {
            Some(&off) => usize::try_from(idx as i64 + i64::from(off))
                .map_err(|_| MatchError::corrupt(idx, "trie jump out of range"))?,
            None => prog.next_req(idx)?,
        };
        self.trace(format_args!("trie: word {} ends at {}", word, self.locinput));
        Ok(Step::Dispatch(target))
    }

    // ========================================================================
    // CURLYX / WHILEM helpers
    // ========================================================================

    fn curlyx_mut(&mut self, i: usize) -> Result<&mut CurlyxState, MatchError> {
        match self.stack.get_mut(i).map(|f| &mut f.resume) {
            Some(Resume::CurlyxEnd(st)) => Ok(st),
            _ => Err(MatchError::corrupt(i, "WHILEM without an active CURLYX")),
        }
    }

    fn whilem(&mut self, prog: &Program, idx: usize, cache_id: u32) -> Result<Step, MatchError> {
        let Some(cx) = self.cur_curlyx else {
            return Err(MatchError::UnknownOpcode { node: idx });
        };
        let locinput = self.locinput;
        let st = self.curlyx_mut(cx)?;
        st.count += 1;
        let n = st.count;
        let (me, b, min, max, greedy, parenfloor) = (st.me, st.b, st.min, st.max, st.greedy, st.parenfloor);
        let prev_curlyx = st.prev_curlyx;
        let mut loc = WhilemLocals { curlyx: cx, save_lastloc: st.lastloc, cache: None, cp: None };
        self.trace(format_args!("whilem: iteration {} of {{{},{}}}", n, min, max));

        // First, the mandatory iterations.
        if n < i64::from(min) {
            self.curlyx_mut(cx)?.lastloc = Some(locinput);
            let rx = self.cur_rx;
            loc.cp = Some(self.cps.push(&self.rxs[rx].parens, parenfloor, self.maxopenparen)?);
            self.push(Resume::WhilemAPre(loc), false)?;
            return Ok(Step::Dispatch(me + 1));
        }

        // An empty iteration: going round again cannot help.
        if loc.save_lastloc == Some(locinput) {
            self.trace(format_args!("whilem: empty match detected, trying continuation"));
            return self.whilem_do_b_max(loc);
        }

        if cache_id != 0 && !self.flags.contains(ExecFlags::NO_POSCACHE) {
            let (bit, enabled) = self.poscache.probe(cache_id, prog.n_whilem, locinput, self.strend);
            if enabled {
                self.trace(format_args!("whilem: detected a super-linear match, switching on caching"));
            }
            if let Some(bit) = bit {
                if self.poscache.is_set(bit) {
                    self.trace(format_args!("whilem: (cache) already tried at this position"));
                    self.curlyx_mut(cx)?.count -= 1;
                    return Ok(Step::No);
                }
                loc.cache = Some(bit);
            }
        }

        if !greedy {
            self.cur_curlyx = prev_curlyx;
            self.push(Resume::WhilemBMin(loc), true)?;
            return Ok(Step::Dispatch(b));
        }

        if is_infinite_repeat(max) || n < i64::from(max) {
            let rx = self.cur_rx;
            loc.cp = Some(self.cps.push(&self.rxs[rx].parens, parenfloor, self.maxopenparen)?);
            self.curlyx_mut(cx)?.lastloc = Some(locinput);
            self.push(Resume::WhilemAMax(loc), false)?;
            return Ok(Step::Dispatch(me + 1));
        }
        self.whilem_do_b_max(loc)
    }

    fn whilem_do_b_max(&mut self, loc: WhilemLocals) -> Result<Step, MatchError> {
        let st = self.curlyx_mut(loc.curlyx)?;
        let (b, prev) = (st.b, st.prev_curlyx);
        self.cur_curlyx = prev;
        self.push(Resume::WhilemBMax(loc), true)?;
        Ok(Step::Dispatch(b))
    }

    fn whilem_a_failed(&mut self, loc: WhilemLocals) -> Result<(), MatchError> {
        if let Some(cp) = loc.cp {
            let rx = self.cur_rx;
            self.cps.restore_and_pop(cp, &mut self.rxs[rx].parens, &mut self.maxopenparen);
        }
        let st = self.curlyx_mut(loc.curlyx)?;
        st.lastloc = loc.save_lastloc;
        st.count -= 1;
        Ok(())
    }

    fn cache_say_no(&mut self, loc: WhilemLocals) -> Step {
        if let Some(bit) = loc.cache {
            self.poscache.set(bit);
        }
        Step::No
    }

    // ========================================================================
    // CURLYM helpers
    // ========================================================================

    fn curlym_do_a(&mut self, st: CurlymState) -> Result<Step, MatchError> {
        let a = st.a;
        self.push(Resume::CurlymA(st), true)?;
        Ok(Step::Dispatch(a))
    }

    fn curlym_a_matched(&mut self, mut st: CurlymState, a_start: usize) -> Result<Step, MatchError> {
        st.count += 1;
        if st.count == 1 {
            st.alen = char_count(self.enc, self.data, a_start, self.locinput);
            if st.alen == 0 {
                st.count = if st.greedy { st.max } else { st.min.max(1) };
                if is_infinite_repeat(st.count) {
                    st.count = st.min.max(1);
                }
            }
        }
        let limit = if st.greedy { st.max } else { st.min };
        if st.alen > 0 && (is_infinite_repeat(limit) || st.count < limit) {
            return self.curlym_do_a(st);
        }
        self.curlym_do_b(st)
    }

    fn curlym_do_b(&mut self, st: CurlymState) -> Result<Step, MatchError> {
        if !self.filter_ok(&st.filter, self.locinput)? {
            return self.curlym_b_failed(st);
        }
        if st.paren > 0 {
            let loc = self.locinput;
            if st.count > 0 {
                let start = hop_back(self.enc, self.data, loc, st.alen, 0).unwrap_or(loc);
                let parens = self.parens_mut();
                parens.offs[st.paren as usize].start_tmp = Some(start);
                parens.close(st.paren, loc);
            } else {
                self.parens_mut().offs[st.paren as usize].end = None;
            }
        }
        let b = st.b;
        self.push(Resume::CurlymB(st), false)?;
        Ok(Step::Dispatch(b))
    }

    fn curlym_b_failed(&mut self, mut st: CurlymState) -> Result<Step, MatchError> {
        self.parens_mut().unwind(st.lastparen, st.lastcloseparen);
        if st.alen == 0 && st.count > 0 {
            return Ok(Step::No);
        }
        if !st.greedy {
            if !is_infinite_repeat(st.max) && st.count >= st.max {
                return Ok(Step::No);
            }
            return self.curlym_do_a(st);
        }
        if st.count <= st.min {
            return Ok(Step::No);
        }
        st.count -= 1;
        self.locinput = hop_back(self.enc, self.data, self.locinput, st.alen, 0).unwrap_or(0);
        self.curlym_do_b(st)
    }

    // ========================================================================
    // STAR / PLUS / CURLY / CURLYN helpers
    // ========================================================================

    #[allow(clippy::too_many_arguments)]
    fn curly_start(
        &mut self,
        prog: &Program,
        idx: usize,
        a: usize,
        paren: u32,
        min: u32,
        max: u32,
        greedy: bool,
    ) -> Result<Step, MatchError> {
        let b = prog.next_req(idx)?;
        let parens = self.parens();
        let mut st = CurlyState {
            a,
            b,
            paren,
            min,
            max,
            count: 0,
            lastparen: parens.lastparen,
            lastcloseparen: parens.lastcloseparen,
            filter: self.next_char_filter(prog, b),
            maxpos: 0,
        };
        if paren > 0 {
            self.maxopenparen = self.maxopenparen.max(paren);
        }
        let body = &prog.node(a)?.op;

        if !greedy {
            if min > 0 {
                let (p, n) = self.regrepeat(prog, body, self.locinput, min)?;
                if n < min {
                    return Ok(Step::No);
                }
                self.locinput = p;
            }
            st.count = min;
            st.maxpos = if is_infinite_repeat(max) {
                self.loceol
            } else {
                hop_forward(self.enc, self.data, self.locinput, (max - min) as usize, self.loceol).0
            };
            return self.curly_try_b_min(prog, st);
        }

        let (p, n) = if max > 0 { self.regrepeat(prog, body, self.locinput, max)? } else { (self.locinput, 0) };
        if n < min {
            return Ok(Step::No);
        }
        self.locinput = p;
        st.count = n;
        // Only the end of the subject, or just before a final newline, can
        // satisfy an end-of-string continuation.
        let b_op = &prog.node(b)?.op;
        if n > min && matches!(b_op, Op::Seol | Op::Eos) {
            st.min = n;
            if matches!(b_op, Op::Seol) && p > 0 && self.data[p - 1] == b'\n' {
                st.min -= 1;
            }
        }
        self.curly_try_b_max(st)
    }

    fn curly_try_b_max(&mut self, mut st: CurlyState) -> Result<Step, MatchError> {
        loop {
            if self.filter_ok(&st.filter, self.locinput)? {
                self.curly_setparen(&st);
                let b = st.b;
                self.push(Resume::CurlyBMax(st), false)?;
                return Ok(Step::Dispatch(b));
            }
            self.curly_unwind(&st);
            if st.count <= st.min {
                return Ok(Step::No);
            }
            st.count -= 1;
            self.locinput = self.enc.prev_char_head(self.data, 0, self.locinput);
        }
    }

    fn curly_try_b_min(&mut self, prog: &Program, mut st: CurlyState) -> Result<Step, MatchError> {
        loop {
            if self.filter_ok(&st.filter, self.locinput)? {
                self.curly_setparen(&st);
                let b = st.b;
                self.push(Resume::CurlyBMin(st), false)?;
                return Ok(Step::Dispatch(b));
            }
            if !self.curly_advance(prog, &mut st)? {
                return Ok(Step::No);
            }
        }
    }

    /// Take at least one more A for a lazy repeat, skipping straight to the
    /// next place the continuation's literal occurs when known.
    fn curly_advance(&mut self, prog: &Program, st: &mut CurlyState) -> Result<bool, MatchError> {
        if !is_infinite_repeat(st.max) && st.count >= st.max {
            return Ok(false);
        }
        let body = &prog.node(st.a)?.op;
        if let NextChar::Bytes { buf, len } = st.filter {
            if self.locinput >= self.loceol {
                return Ok(false);
            }
            let from = next_char(self.enc, self.data, self.locinput, self.loceol);
            let Some(i) = memmem::find(&self.data[from..self.loceol], &buf[..len]) else {
                return Ok(false);
            };
            let target = from + i;
            if target > st.maxpos {
                return Ok(false);
            }
            let n = u32::try_from(char_count(self.enc, self.data, self.locinput, target)).unwrap_or(u32::MAX);
            if !is_infinite_repeat(st.max) && st.count.saturating_add(n) > st.max {
                return Ok(false);
            }
            let (p, got) = self.regrepeat(prog, body, self.locinput, n)?;
            if got < n || p != target {
                return Ok(false);
            }
            self.locinput = target;
            st.count += n;
            return Ok(true);
        }
        let (p, got) = self.regrepeat(prog, body, self.locinput, 1)?;
        if got == 0 {
            return Ok(false);
        }
        self.locinput = p;
        st.count += 1;
        Ok(true)
    }

    /// The paren of a CURLYN holds the last iteration, or is unset after
    /// zero of them.
    fn curly_setparen(&mut self, st: &CurlyState) {
        if st.paren == 0 {
            return;
        }
        let loc = self.locinput;
        if st.count > 0 {
            let start = self.enc.prev_char_head(self.data, 0, loc);
            let parens = self.parens_mut();
            parens.offs[st.paren as usize].start_tmp = Some(start);
            parens.close(st.paren, loc);
        } else {
            let parens = self.parens_mut();
            parens.offs[st.paren as usize].end = None;
            parens.lastparen = st.lastparen;
            parens.lastcloseparen = st.lastcloseparen;
        }
    }

    fn curly_unwind(&mut self, st: &CurlyState) {
        if st.paren > 0 {
            self.parens_mut().unwind(st.lastparen, st.lastcloseparen);
        }
    }

    /// Count how many times the single-width node `op` matches from `pos`,
    /// up to `max`. Returns the end position and the count.
    fn regrepeat(&self, prog: &Program, op: &Op, pos: usize, max: u32) -> Result<(usize, u32), MatchError> {
        let (data, loceol) = (self.data, self.loceol);
        if pos >= loceol {
            return Ok((pos, 0));
        }
        let limit = if is_infinite_repeat(max) { usize::MAX } else { max as usize };
        if !self.utf8_target {
            match op {
                Op::Sany => {
                    let n = limit.min(loceol - pos);
                    return Ok((pos + n, n as u32));
                }
                Op::RegAny => {
                    let span = &data[pos..loceol.min(pos.saturating_add(limit))];
                    let n = memchr(b'\n', span).unwrap_or(span.len());
                    return Ok((pos + n, n as u32));
                }
                _ => {}
            }
        }
        if let Op::Exact { text, fold: None } = op {
            if text.len() == 1 && (text[0] < 0x80 || !self.utf8_target) {
                let byte = text[0];
                let n = data[pos..loceol].iter().take(limit).take_while(|&&b| b == byte).count();
                return Ok((pos + n, n as u32));
            }
        }
        let ctx = self.class_ctx(prog);
        let mut p = pos;
        let mut count = 0usize;
        while count < limit && p < loceol {
            let (c, len) = self.enc.decode(data, p, loceol)?;
            if !node_matches(op, c, &ctx)? {
                break;
            }
            p += len;
            count += 1;
        }
        Ok((p, count as u32))
    }

    // ========================================================================
    // Next-character filter
    // ========================================================================

    /// Derive a quick test for the first character the node at `b` needs.
    fn next_char_filter(&self, prog: &Program, mut b: usize) -> NextChar {
        for _ in 0..prog.nodes.len() {
            let Some(node) = prog.nodes.get(b) else {
                return NextChar::Unknown;
            };
            match &node.op {
                Op::Open(_) | Op::Nothing | Op::Tail | Op::Keeps => {}
                Op::Close(n) => {
                    if self.eval_close_paren().ok().flatten() == Some(*n) {
                        return NextChar::Unknown;
                    }
                }
                Op::Plus { .. } => {
                    b += 1;
                    continue;
                }
                Op::Curly { min, .. } | Op::CurlyM { min, .. } if *min > 0 => {
                    b += 1;
                    continue;
                }
                Op::CurlyN { min, .. } if *min > 0 => {
                    b += 2;
                    continue;
                }
                Op::Exact { text, fold } => return self.literal_filter(text, *fold, prog.utf8),
                _ => return NextChar::Unknown,
            }
            match prog.next(b) {
                Some(n) => b = n,
                None => return NextChar::Unknown,
            }
        }
        NextChar::Unknown
    }

    fn literal_filter(&self, text: &[u8], fold: Option<FoldKind>, pat_utf8: bool) -> NextChar {
        if text.is_empty() {
            return NextChar::Unknown;
        }
        if fold.is_none() && pat_utf8 == self.utf8_target {
            let len = text.len().min(NEXT_CHAR_FILTER_LEN);
            let mut buf = [0u8; NEXT_CHAR_FILTER_LEN];
            buf[..len].copy_from_slice(&text[..len]);
            return NextChar::Bytes { buf, len };
        }
        match decode_text(pat_utf8, text, 0) {
            Some((c, _)) => NextChar::Char { c, fold },
            None => NextChar::Unknown,
        }
    }

    fn filter_ok(&self, filter: &NextChar, pos: usize) -> Result<bool, MatchError> {
        match *filter {
            NextChar::Unknown => Ok(true),
            NextChar::Bytes { buf, len } => {
                Ok(pos + len <= self.loceol && self.data[pos..pos + len] == buf[..len])
            }
            NextChar::Char { c, fold } => {
                if pos >= self.loceol {
                    return Ok(false);
                }
                let (got, _) = self.enc.decode(self.data, pos, self.loceol)?;
                Ok(chars_eq(got, c, fold, self.locale))
            }
        }
    }

    // ========================================================================
    // Lookaround helpers
    // ========================================================================

    fn lookaround(
        &mut self,
        prog: &Program,
        idx: usize,
        wanted: bool,
        behind: Option<Behind>,
        suspend: bool,
    ) -> Result<Step, MatchError> {
        let logical = mem::take(&mut self.logical);
        let rx = self.cur_rx;
        let cp = self.cps.push(&self.rxs[rx].parens, 0, self.maxopenparen)?;
        let entry = self.locinput;
        let mut st = LookState {
            me: idx,
            wanted,
            logical,
            suspend,
            behind: behind.is_some(),
            start: entry,
            nearest: entry,
            prev_match_end: self.match_end,
            cp,
        };
        if let Some(b) = behind {
            let (far, stepped) = hop_back_lim(self.enc, self.data, entry, b.max as usize, 0);
            if stepped < b.min as usize {
                // Not enough characters behind us for the body.
                return self.look_finish(prog, st, false, entry, false);
            }
            st.start = far;
            st.nearest = hop_back(self.enc, self.data, entry, b.min as usize, 0).unwrap_or(entry);
            self.match_end = Some(entry);
        }
        if !suspend {
            self.in_lookaround += 1;
        }
        let start = st.start;
        self.push(Resume::IfMatchA(st), true)?;
        self.locinput = start;
        if behind.is_some() {
            self.loceol = entry;
        }
        Ok(Step::Dispatch(idx + 1))
    }

    /// Settle a lookaround whose body matched or not, then continue after it.
    fn look_finish(
        &mut self,
        prog: &Program,
        st: LookState,
        matched: bool,
        entry: usize,
        counted: bool,
    ) -> Result<Step, MatchError> {
        self.match_end = st.prev_match_end;
        if counted && !st.suspend {
            self.in_lookaround = self.in_lookaround.saturating_sub(1);
        }
        let ok = matched == st.wanted;
        let rx = self.cur_rx;
        if matched && ok {
            self.cps.blow(st.cp);
        } else {
            self.cps.restore_and_pop(st.cp, &mut self.rxs[rx].parens, &mut self.maxopenparen);
        }
        if st.logical {
            self.sw = ok;
        } else if !ok {
            return Ok(Step::No);
        }
        if !st.suspend {
            self.locinput = entry;
        }
        self.goto_next(prog, st.me)
    }

    // ========================================================================
    // Recursion and host code
    // ========================================================================

    fn eval_state(&self, i: usize) -> Result<(&EvalState, usize), MatchError> {
        match self.stack.get(i) {
            Some(Frame { resume: Resume::EvalAB(ev), locinput, .. }) => Ok((ev, *locinput)),
            _ => Err(MatchError::corrupt(i, "recursion state missing")),
        }
    }

    /// Group whose CLOSE returns from the innermost call.
    fn eval_close_paren(&self) -> Result<Option<u32>, MatchError> {
        match self.cur_eval {
            Some(i) => Ok(self.eval_state(i)?.0.close_paren.filter(|&n| n != 0)),
            None => Ok(None),
        }
    }

    fn check_nochange(&mut self) -> Result<(), MatchError> {
        let same = match self.cur_eval {
            Some(i) => self.eval_state(i)?.1 == self.locinput,
            None => false,
        };
        if same {
            self.nochange_depth += 1;
            if self.nochange_depth > self.limits.nochange {
                return Err(MatchError::NoProgressRecursion { limit: self.limits.nochange });
            }
        } else {
            self.nochange_depth = 0;
        }
        Ok(())
    }

    fn gosub(&mut self, prog: &Program, idx: usize, group: u32, offset: i32) -> Result<Step, MatchError> {
        let target = usize::try_from(idx as i64 + i64::from(offset))
            .map_err(|_| MatchError::corrupt(idx, "recursion target out of range"))?;
        self.check_nochange()?;
        let locinput = self.locinput;
        let rx = self.cur_rx;
        let slot = self.rxs[rx]
            .recurse_locinput
            .get_mut(group as usize)
            .ok_or(MatchError::corrupt(idx, "recursion into unknown group"))?;
        if *slot == Some(locinput) {
            return Err(MatchError::InfiniteRecursion { group, offset: locinput });
        }
        let prev = slot.replace(locinput);
        let cp = self.cps.push(&self.rxs[rx].parens, 0, self.maxopenparen)?;
        let ev = EvalState {
            prev_rx: rx,
            prev_curlyx: self.cur_curlyx,
            prev_eval: self.cur_eval,
            prev_look: self.in_lookaround,
            b: prog.next_req(idx)?,
            cp,
            close_paren: Some(group),
            recurse: Some((group, prev)),
            rx_pushed: None,
        };
        let f = self.push(Resume::EvalAB(ev), true)?;
        let parens = self.parens_mut();
        parens.lastparen = 0;
        parens.lastcloseparen = 0;
        self.maxopenparen = 0;
        self.cur_curlyx = None;
        self.cur_eval = Some(f);
        self.in_lookaround = 0;
        self.poscache.invalidate();
        self.trace(format_args!("gosub: group {} at {}", group, locinput));
        Ok(Step::Dispatch(target))
    }

    fn call_host(&self, code: usize) -> Result<HostValue, MatchError> {
        let host = self.host.ok_or_else(|| MatchError::Callout("no host callback installed".into()))?;
        let ctx = CalloutContext {
            subject: self.data,
            pos: self.locinput,
            start: self.try_start,
            parens: &self.rxs[self.cur_rx].parens,
        };
        host.run(code, &ctx)
    }

    fn eval(&mut self, prog: &Program, idx: usize, code: usize, flavour: EvalFlavour) -> Result<Step, MatchError> {
        let value = self.call_host(code)?;
        match flavour {
            EvalFlavour::Side => {
                let prev = self.side_value.replace(value);
                self.push(Resume::SideValue { prev }, false)?;
                self.goto_next(prog, idx)
            }
            EvalFlavour::Condition => {
                self.sw = value.truthy();
                self.logical = false;
                self.goto_next(prog, idx)
            }
            EvalFlavour::Postponed => {
                let sub = postponed_program(value, self.utf8_target)?;
                self.check_nochange()?;
                let rx = self.cur_rx;
                let cp = self.cps.push(&self.rxs[rx].parens, 0, self.maxopenparen)?;
                let inner = self.rxs.len();
                let ev = EvalState {
                    prev_rx: rx,
                    prev_curlyx: self.cur_curlyx,
                    prev_eval: self.cur_eval,
                    prev_look: self.in_lookaround,
                    b: prog.next_req(idx)?,
                    cp,
                    close_paren: None,
                    recurse: None,
                    rx_pushed: Some(inner),
                };
                let f = self.push(Resume::EvalAB(ev), true)?;
                self.rxs.push(RxState::new(sub));
                self.switch_rx(inner);
                self.maxopenparen = 0;
                self.cur_curlyx = None;
                self.cur_eval = Some(f);
                self.in_lookaround = 0;
                self.poscache.invalidate();
                self.trace(format_args!("eval: entering postponed pattern at {}", self.locinput));
                Ok(Step::Dispatch(0))
            }
        }
    }

    /// Return from the innermost recursion or postponed pattern to its
    /// caller, leaving a state that re-enters the callee on failure.
    fn fake_end(&mut self) -> Result<Step, MatchError> {
        let Some(ev_idx) = self.cur_eval else {
            return Err(MatchError::corrupt(0, "return without an active call"));
        };
        let (entry, entry_loc) = self.eval_state(ev_idx)?;
        let entry = entry.clone();
        let rx = self.cur_rx;
        let inner_cp = self.cps.push(&self.rxs[rx].parens, 0, self.maxopenparen)?;
        let back = EvalState {
            prev_rx: rx,
            prev_curlyx: self.cur_curlyx,
            prev_eval: Some(ev_idx),
            prev_look: self.in_lookaround,
            b: entry.b,
            cp: inner_cp,
            close_paren: entry.close_paren,
            recurse: entry.recurse.map(|(g, _)| (g, Some(entry_loc))),
            rx_pushed: None,
        };

        self.switch_rx(entry.prev_rx);
        let outer = self.cur_rx;
        self.cps.reapply(entry.cp, &mut self.rxs[outer].parens, &mut self.maxopenparen);
        self.restore_eval_links(&entry);
        self.trace(format_args!("eval: return to caller at {}", self.locinput));
        self.push(Resume::EvalAB(back), true)?;
        Ok(Step::Dispatch(entry.b))
    }

    fn restore_eval_links(&mut self, ev: &EvalState) {
        self.cur_eval = ev.prev_eval;
        self.cur_curlyx = ev.prev_curlyx;
        self.in_lookaround = ev.prev_look;
        if let Some((g, v)) = ev.recurse {
            if let Some(slot) = self.rxs[self.cur_rx].recurse_locinput.get_mut(g as usize) {
                *slot = v;
            }
        }
        self.nochange_depth = self.nochange_depth.saturating_sub(1);
        self.poscache.invalidate();
    }

    /// Release the context of a postponed pattern once its entry state is gone.
    fn drop_pushed_rx(&mut self, ev: &EvalState) {
        if let Some(r) = ev.rx_pushed {
            if self.cur_rx < r {
                self.rxs.truncate(r);
            }
        }
    }

    // ========================================================================
    // Verb helpers
    // ========================================================================

    fn mark_name(&self, i: usize) -> Option<&str> {
        match self.stack.get(i).map(|f| &f.resume) {
            Some(Resume::MarkpointNext { name, .. }) => Some(name.as_str()),
            _ => None,
        }
    }

    /// Find the innermost live mark called `name`.
    fn find_mark(&self, name: &str) -> Option<usize> {
        let mut cur = self.mark_state;
        while let Some(i) = cur {
            match self.stack.get(i).map(|f| &f.resume) {
                Some(Resume::MarkpointNext { name: n, prev_mark, .. }) => {
                    if n == name {
                        return Some(i);
                    }
                    cur = *prev_mark;
                }
                _ => return None,
            }
        }
        None
    }

    /// ACCEPT closes every group still open around it.
    fn close_open_groups(&mut self, prog: &Program, idx: usize) -> Result<(), MatchError> {
        let stop = self.eval_close_paren()?;
        let loc = self.locinput;
        let mut cursor = prog.next(idx);
        for _ in 0..prog.nodes.len() {
            let Some(i) = cursor else { break };
            match prog.node(i)?.op {
                Op::End | Op::Succeed => break,
                Op::Close(n) if n <= self.lastopen => {
                    let parens = self.parens_mut();
                    if parens.offs.get(n as usize).is_some_and(|s| s.start_tmp.is_some()) {
                        parens.close(n, loc);
                    }
                    if stop == Some(n) {
                        break;
                    }
                }
                _ => {}
            }
            cursor = prog.next(i);
        }
        Ok(())
    }

    // ========================================================================
    // Literal and back-reference comparison
    // ========================================================================

    fn match_one(&self, prog: &Program, op: &Op) -> Result<Option<usize>, MatchError> {
        if self.locinput >= self.loceol {
            return Ok(None);
        }
        let (c, len) = self.enc.decode(self.data, self.locinput, self.loceol)?;
        Ok(node_matches(op, c, &self.class_ctx(prog))?.then_some(self.locinput + len))
    }

    fn match_exact(&self, text: &[u8], fold: Option<FoldKind>, pat_utf8: bool) -> Result<Option<usize>, MatchError> {
        let (mut p, lim) = (self.locinput, self.loceol);
        if fold.is_none() && pat_utf8 == self.utf8_target {
            let end = p + text.len();
            return Ok((end <= lim && &self.data[p..end] == text).then_some(end));
        }
        let mut i = 0;
        while i < text.len() {
            let Some((want, wlen)) = decode_text(pat_utf8, text, i) else {
                return Ok(None);
            };
            if p >= lim {
                return Ok(None);
            }
            let (got, glen) = self.enc.decode(self.data, p, lim)?;
            if !chars_eq(got, want, fold, self.locale) {
                return Ok(None);
            }
            i += wlen;
            p += glen;
        }
        Ok(Some(p))
    }

    fn match_ref(&self, range: Option<(usize, usize)>, fold: Option<FoldKind>) -> Result<Option<usize>, MatchError> {
        let Some((s, e)) = range else {
            return Ok(None);
        };
        let (data, lim) = (self.data, self.loceol);
        let mut p = self.locinput;
        if fold.is_none() {
            let end = p + (e - s);
            return Ok((end <= lim && data[s..e] == data[p..end]).then_some(end));
        }
        let mut i = s;
        while i < e {
            if p >= lim {
                return Ok(None);
            }
            let (want, wlen) = self.enc.decode(data, i, e)?;
            let (got, glen) = self.enc.decode(data, p, lim)?;
            if !chars_eq(got, want, fold, self.locale) {
                return Ok(None);
            }
            i += wlen;
            p += glen;
        }
        Ok(Some(p))
    }
}

#[inline]
fn chars_eq(c: u32, want: u32, fold: Option<FoldKind>, locale: Locale) -> bool {
    c == want || fold.is_some_and(|k| fold_with(k, c, locale) == fold_with(k, want, locale))
}

/// Turn the value of a `(??{ })` block into a program to run.
fn postponed_program(value: HostValue, utf8: bool) -> Result<Arc<Program>, MatchError> {
    let bytes = match value {
        HostValue::Pattern(p) => {
            p.validate()?;
            return Ok(p);
        }
        HostValue::Undef | HostValue::Bool(false) => Vec::new(),
        HostValue::Bool(true) => b"1".to_vec(),
        HostValue::Int(n) => n.to_string().into_bytes(),
        HostValue::Str(s) => s,
    };
    Ok(Arc::new(ProgramBuilder::new(Pat::Bytes(bytes)).utf8(utf8).build()?))
}

#[cold]
#[cfg(debug_assertions)]
fn do_trace(args: fmt::Arguments<'_>) {
    eprintln!("{}", args);
}
