// regint.rs - Compiled program representation.
// Node kinds with their operands, the immutable Program the matcher runs,
// execution flags, locale context and default limits.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::error::MatchError;
use crate::regclass::CharClass;
use crate::regtrie::Trie;

// === Config Constants ===
pub const DEFAULT_RETRY_LIMIT_IN_MATCH: u64 = 10_000_000;
pub const DEFAULT_MATCH_STACK_LIMIT_SIZE: usize = 0;
pub const DEFAULT_TIME_LIMIT_MSEC: u64 = 0;
pub const DEFAULT_NOCHANGE_DEPTH_LIMIT: u32 = 10;

// === Internal Constants ===
/// Upper quantifier bound meaning "unbounded".
pub const REG_INFTY: u32 = u32::MAX;
/// Backtrack states per stack slab.
pub const STATE_SLAB_FRAMES: usize = 128;
/// Bytes of the following literal used as a quick reject before B.
pub const NEXT_CHAR_FILTER_LEN: usize = 5;

#[inline]
pub fn is_infinite_repeat(n: u32) -> bool {
    n == REG_INFTY
}

bitflags! {
    /// Caller-supplied flags for one execution.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ExecFlags: u32 {
        /// Skip the start-position pre-filter and try every position.
        const NO_INTUIT = 1 << 0;
        /// Disable the WHILEM position cache.
        const NO_POSCACHE = 1 << 1;
        /// Trace node dispatch to stderr (debug builds only).
        const TRACE = 1 << 2;
        /// Only try the given start position.
        const ANCHORED = 1 << 3;
        /// Report only the overall match range, not the groups.
        const NOSAVE = 1 << 4;
    }
}

/// Character-set semantics for class, posix and boundary nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// Unicode rules iff the subject or the pattern is UTF-8.
    Depends,
    Unicode,
    Ascii,
    Locale,
}

/// Case-folding mode for literals and back-references.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FoldKind {
    Ascii,
    Unicode,
    Locale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundKind {
    /// `\b`: word / non-word transition.
    Traditional,
    Gcb,
    Wb,
    Sb,
    Lb,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosixClass {
    Word,
    Digit,
    Space,
    Alpha,
    Alnum,
    Upper,
    Lower,
    Cased,
    Punct,
    Print,
    Graph,
    Cntrl,
    Blank,
    XDigit,
    Ascii,
    VertSpace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalFlavour {
    /// `(?{ })`: run for side effects, value recorded as the side value.
    Side,
    /// `(?(?{ })yes|no)`: truthiness selects the branch.
    Condition,
    /// `(??{ })`: the returned pattern is matched at the current position.
    Postponed,
}

/// Character-length bounds of a lookbehind body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Behind {
    pub min: u32,
    pub max: u32,
}

/// Process-wide locale the caller runs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Locale {
    /// The locale's character set is UTF-8.
    pub utf8: bool,
    /// Turkic case mapping for I/i (dotted and dotless).
    pub turkic: bool,
}

// === Nodes ===

#[derive(Debug, Clone)]
pub enum Op {
    End,
    Succeed,
    Nothing,
    Tail,

    // Anchors
    Sbol,
    Mbol,
    Seol,
    Meol,
    Eos,
    Gpos,
    Bound { kind: BoundKind, charset: Charset, negate: bool },

    // Single-character matchers
    RegAny,
    Sany,
    Exact { text: Vec<u8>, fold: Option<FoldKind> },
    AnyOf(Box<CharClass>),
    Posix { class: PosixClass, charset: Charset, negate: bool },
    LnBreak,
    Clump,

    // Captures
    Open(u32),
    Close(u32),
    Ref { group: u32, fold: Option<FoldKind> },
    NRef { name: String, fold: Option<FoldKind> },

    // Alternation
    Branch,
    Trie(Box<Trie>),

    // Quantifiers
    Star { greedy: bool },
    Plus { greedy: bool },
    Curly { min: u32, max: u32, greedy: bool },
    CurlyN { paren: u32, min: u32, max: u32, greedy: bool },
    CurlyM { paren: u32, min: u32, max: u32, greedy: bool },
    CurlyX { min: u32, max: u32, greedy: bool, parenfloor: u32 },
    /// Loop tail of a CURLYX; `cache_id` 0 means never cached.
    WhileM { cache_id: u32 },

    // Lookaround
    IfMatch { behind: Option<Behind> },
    UnlessM { behind: Option<Behind> },
    Suspend,
    LookbehindEnd,

    // Conditionals
    Logical,
    IfThen,
    GroupP(u32),
    GroupPN(String),
    InsubP(u32),
    DefineP,

    // Recursion and host code
    GoSub { group: u32, offset: i32 },
    Eval { code: usize, flavour: EvalFlavour },

    // Backtracking verbs
    Commit,
    Prune,
    Skip { name: Option<String> },
    MarkPoint { name: String },
    CutGroup { name: Option<String> },
    Accept,
    OpFail,
    Keeps,

    // Script runs
    SrOpen,
    SrClose,
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::End => "END",
            Op::Succeed => "SUCCEED",
            Op::Nothing => "NOTHING",
            Op::Tail => "TAIL",
            Op::Sbol => "SBOL",
            Op::Mbol => "MBOL",
            Op::Seol => "SEOL",
            Op::Meol => "MEOL",
            Op::Eos => "EOS",
            Op::Gpos => "GPOS",
            Op::Bound { negate: false, .. } => "BOUND",
            Op::Bound { negate: true, .. } => "NBOUND",
            Op::RegAny => "REG_ANY",
            Op::Sany => "SANY",
            Op::Exact { fold: None, .. } => "EXACT",
            Op::Exact { fold: Some(_), .. } => "EXACTF",
            Op::AnyOf(_) => "ANYOF",
            Op::Posix { negate: false, .. } => "POSIX",
            Op::Posix { negate: true, .. } => "NPOSIX",
            Op::LnBreak => "LNBREAK",
            Op::Clump => "CLUMP",
            Op::Open(_) => "OPEN",
            Op::Close(_) => "CLOSE",
            Op::Ref { .. } => "REF",
            Op::NRef { .. } => "NREF",
            Op::Branch => "BRANCH",
            Op::Trie(_) => "TRIE",
            Op::Star { .. } => "STAR",
            Op::Plus { .. } => "PLUS",
            Op::Curly { .. } => "CURLY",
            Op::CurlyN { .. } => "CURLYN",
            Op::CurlyM { .. } => "CURLYM",
            Op::CurlyX { .. } => "CURLYX",
            Op::WhileM { .. } => "WHILEM",
            Op::IfMatch { .. } => "IFMATCH",
            Op::UnlessM { .. } => "UNLESSM",
            Op::Suspend => "SUSPEND",
            Op::LookbehindEnd => "LOOKBEHIND_END",
            Op::Logical => "LOGICAL",
            Op::IfThen => "IFTHEN",
            Op::GroupP(_) => "GROUPP",
            Op::GroupPN(_) => "GROUPPN",
            Op::InsubP(_) => "INSUBP",
            Op::DefineP => "DEFINEP",
            Op::GoSub { .. } => "GOSUB",
            Op::Eval { .. } => "EVAL",
            Op::Commit => "COMMIT",
            Op::Prune => "PRUNE",
            Op::Skip { .. } => "SKIP",
            Op::MarkPoint { .. } => "MARKPOINT",
            Op::CutGroup { .. } => "CUTGROUP",
            Op::Accept => "ACCEPT",
            Op::OpFail => "OPFAIL",
            Op::Keeps => "KEEPS",
            Op::SrOpen => "SROPEN",
            Op::SrClose => "SRCLOSE",
        }
    }

    /// Matches exactly one character (usable as a simple-repeat body).
    /// `utf8` is the encoding of the program's literal text.
    pub fn is_single_width(&self, utf8: bool) -> bool {
        match self {
            Op::RegAny | Op::Sany | Op::AnyOf(_) | Op::Posix { .. } => true,
            Op::Exact { text, .. } => {
                crate::regenc::decode_text(utf8, text, 0).is_some_and(|(_, len)| len == text.len())
            }
            _ => false,
        }
    }
}

/// One program node. `next` is the relative offset of the successor;
/// zero marks the end of a chain.
#[derive(Debug, Clone)]
pub struct Node {
    pub op: Op,
    pub next: i32,
}

impl Node {
    pub fn new(op: Op) -> Self {
        Node { op, next: 0 }
    }
}

// === Program ===

/// Where a successful match may start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    None,
    /// Only at the subject start.
    Sbol,
    /// At the subject start or after any newline.
    Mbol,
    /// Only at the \G position.
    Gpos,
}

/// A literal every match must contain, with its offset range (in
/// characters) from the match start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substr {
    pub text: Vec<u8>,
    pub min_offset: usize,
    pub max_offset: Option<usize>,
}

/// Immutable compiled program. Shared read-only between concurrent matches.
#[derive(Debug, Clone)]
pub struct Program {
    pub nodes: Vec<Node>,
    pub nparens: u32,
    /// Minimum match length in characters.
    pub minlen: usize,
    pub maxlen: Option<usize>,
    pub anchor: Anchor,
    pub anchored_substr: Option<Substr>,
    pub floating_substr: Option<Substr>,
    /// Class of the first character of any match.
    pub start_class: Option<Op>,
    /// Literal text in the program is UTF-8.
    pub utf8: bool,
    pub has_cutgroup: bool,
    /// Number of WHILEM nodes with a position-cache slot.
    pub n_whilem: u32,
    pub names: HashMap<String, Vec<u32>>,
}

impl Program {
    /// Successor of node `idx`, or `None` at the end of its chain.
    #[inline]
    pub fn next(&self, idx: usize) -> Option<usize> {
        let off = self.nodes.get(idx)?.next;
        if off == 0 {
            return None;
        }
        let n = idx as isize + off as isize;
        if n < 0 || n as usize >= self.nodes.len() {
            return None;
        }
        Some(n as usize)
    }

    /// Successor of node `idx`, which must exist.
    #[inline]
    pub fn next_req(&self, idx: usize) -> Result<usize, MatchError> {
        self.next(idx)
            .ok_or(MatchError::corrupt(idx, "ran off the end of the node chain"))
    }

    #[inline]
    pub fn node(&self, idx: usize) -> Result<&Node, MatchError> {
        self.nodes
            .get(idx)
            .ok_or(MatchError::corrupt(idx, "node index out of range"))
    }

    /// Group numbers bound to `name`, in declaration order.
    pub fn name_to_groups(&self, name: &str) -> Option<&[u32]> {
        self.names.get(name).map(|v| v.as_slice())
    }

    /// Structural checks done once before a program is first executed.
    pub fn validate(&self) -> Result<(), MatchError> {
        if self.nodes.is_empty() {
            return Err(MatchError::corrupt(0, "empty program"));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            let target = i as isize + node.next as isize;
            if node.next != 0 && (target < 0 || target as usize >= self.nodes.len()) {
                return Err(MatchError::corrupt(i, "successor offset out of range"));
            }
            match &node.op {
                Op::Open(n) | Op::Close(n) | Op::GroupP(n) => {
                    if *n == 0 || *n > self.nparens {
                        return Err(MatchError::corrupt(i, "group number out of range"));
                    }
                }
                Op::Ref { group, .. } | Op::GoSub { group, .. } => {
                    if *group > self.nparens {
                        return Err(MatchError::corrupt(i, "group number out of range"));
                    }
                }
                Op::CurlyN { paren, .. } | Op::CurlyM { paren, .. } => {
                    if *paren > self.nparens {
                        return Err(MatchError::corrupt(i, "group number out of range"));
                    }
                }
                Op::Star { .. } | Op::Plus { .. } | Op::Curly { .. } => {
                    let body = self
                        .nodes
                        .get(i + 1)
                        .ok_or(MatchError::corrupt(i, "repeat without a body"))?;
                    if !body.op.is_single_width(self.utf8) {
                        return Err(MatchError::corrupt(i, "simple repeat of a multi-width node"));
                    }
                }
                Op::CurlyN { .. } => {
                    let body = self
                        .nodes
                        .get(i + 2)
                        .ok_or(MatchError::corrupt(i, "repeat without a body"))?;
                    if !body.op.is_single_width(self.utf8) {
                        return Err(MatchError::corrupt(i, "simple repeat of a multi-width node"));
                    }
                }
                Op::CurlyX { .. } => {
                    let b = self.next_req(i)?;
                    if b == 0 || !matches!(self.nodes[b - 1].op, Op::WhileM { .. }) {
                        return Err(MatchError::corrupt(i, "CURLYX without its WHILEM"));
                    }
                }
                Op::Trie(trie) => trie.validate(i)?,
                _ => {}
            }
        }
        Ok(())
    }
}
