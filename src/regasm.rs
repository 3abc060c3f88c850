// regasm.rs - Program assembler.
// Lays out a pattern tree as a node program in the form the matcher runs:
// branch chains, repeat controllers, lookaround bodies, conditionals and
// recursion targets, plus the derived length, anchor and literal hints.

use std::collections::{HashMap, HashSet};

use crate::error::MatchError;
use crate::regclass::CharClass;
use crate::regint::*;
use crate::regtrie::Trie;

/// A pattern tree. Group numbers are assigned by the caller.
#[derive(Debug, Clone)]
pub enum Pat {
    Empty,
    Lit(String),
    LitFold(String, FoldKind),
    /// Literal bytes, in the program's text encoding.
    Bytes(Vec<u8>),
    /// Any character (`.` under `/s`).
    Any,
    /// Any character but newline.
    AnyNl,
    Class(CharClass),
    Posix { class: PosixClass, charset: Charset, negate: bool },
    Seq(Vec<Pat>),
    Alt(Vec<Pat>),
    Group(u32, Box<Pat>),
    Repeat { pat: Box<Pat>, min: u32, max: u32, greedy: bool },
    Atomic(Box<Pat>),
    Look { behind: bool, negate: bool, pat: Box<Pat> },
    Cond { cond: Cond, yes: Box<Pat>, no: Option<Box<Pat>> },
    Ref(u32, Option<FoldKind>),
    NRef(String, Option<FoldKind>),
    /// Recurse into group n, or the whole pattern for 0.
    Recurse(u32),
    Eval(usize, EvalFlavour),
    Commit,
    Prune,
    Skip(Option<String>),
    Mark(String),
    Then(Option<String>),
    Accept,
    Fail,
    Keep,
    Sbol,
    Mbol,
    Seol,
    Meol,
    Eos,
    Gpos,
    Bound { kind: BoundKind, charset: Charset, negate: bool },
    LnBreak,
    Clump,
    ScriptRun(Box<Pat>),
}

/// Condition of a `(?(cond)yes|no)` construct.
#[derive(Debug, Clone)]
pub enum Cond {
    Group(u32),
    Named(String),
    /// Inside a recursion into group n (0 = any).
    Recursion(u32),
    Define,
    Look { behind: bool, negate: bool, pat: Box<Pat> },
    Eval(usize),
}

impl Pat {
    pub fn lit(s: &str) -> Pat {
        Pat::Lit(s.to_string())
    }

    pub fn lit_fold(s: &str, fold: FoldKind) -> Pat {
        Pat::LitFold(s.to_string(), fold)
    }

    pub fn seq(items: impl IntoIterator<Item = Pat>) -> Pat {
        Pat::Seq(items.into_iter().collect())
    }

    pub fn alt(items: impl IntoIterator<Item = Pat>) -> Pat {
        Pat::Alt(items.into_iter().collect())
    }

    pub fn group(n: u32, pat: Pat) -> Pat {
        Pat::Group(n, Box::new(pat))
    }

    pub fn repeat(pat: Pat, min: u32, max: u32) -> Pat {
        Pat::Repeat { pat: Box::new(pat), min, max, greedy: true }
    }

    pub fn star(pat: Pat) -> Pat {
        Pat::repeat(pat, 0, REG_INFTY)
    }

    pub fn plus(pat: Pat) -> Pat {
        Pat::repeat(pat, 1, REG_INFTY)
    }

    pub fn opt(pat: Pat) -> Pat {
        Pat::repeat(pat, 0, 1)
    }

    /// Make a repeat non-greedy.
    pub fn lazy(self) -> Pat {
        match self {
            Pat::Repeat { pat, min, max, .. } => Pat::Repeat { pat, min, max, greedy: false },
            other => other,
        }
    }

    pub fn class(ranges: &[(u32, u32)]) -> Pat {
        Pat::Class(CharClass::from_ranges(ranges))
    }

    pub fn not_class(ranges: &[(u32, u32)]) -> Pat {
        Pat::Class(CharClass::from_ranges(ranges).invert().build())
    }

    pub fn posix(class: PosixClass) -> Pat {
        Pat::Posix { class, charset: Charset::Unicode, negate: false }
    }

    pub fn ahead(pat: Pat) -> Pat {
        Pat::Look { behind: false, negate: false, pat: Box::new(pat) }
    }

    pub fn not_ahead(pat: Pat) -> Pat {
        Pat::Look { behind: false, negate: true, pat: Box::new(pat) }
    }

    pub fn behind(pat: Pat) -> Pat {
        Pat::Look { behind: true, negate: false, pat: Box::new(pat) }
    }

    pub fn not_behind(pat: Pat) -> Pat {
        Pat::Look { behind: true, negate: true, pat: Box::new(pat) }
    }

    pub fn atomic(pat: Pat) -> Pat {
        Pat::Atomic(Box::new(pat))
    }

    pub fn cond(cond: Cond, yes: Pat, no: Option<Pat>) -> Pat {
        Pat::Cond { cond, yes: Box::new(yes), no: no.map(Box::new) }
    }

    pub fn bound() -> Pat {
        Pat::Bound { kind: BoundKind::Traditional, charset: Charset::Unicode, negate: false }
    }

    /// Character-length bounds.
    fn width(&self, utf8: bool) -> (usize, Option<usize>) {
        match self {
            Pat::Lit(s) | Pat::LitFold(s, _) => {
                let n = s.chars().count();
                (n, Some(n))
            }
            Pat::Bytes(b) => {
                let n = if utf8 { text_chars(b) } else { b.len() };
                (n, Some(n))
            }
            Pat::Any | Pat::AnyNl | Pat::Class(_) | Pat::Posix { .. } => (1, Some(1)),
            Pat::Seq(items) => items.iter().fold((0, Some(0)), |(lo, hi), p| {
                let (a, b) = p.width(utf8);
                (lo + a, hi.zip(b).map(|(x, y)| x + y))
            }),
            Pat::Alt(items) => {
                let mut lo = usize::MAX;
                let mut hi = Some(0);
                for p in items {
                    let (a, b) = p.width(utf8);
                    lo = lo.min(a);
                    hi = hi.zip(b).map(|(x, y)| x.max(y));
                }
                (if items.is_empty() { 0 } else { lo }, hi)
            }
            Pat::Group(_, p) | Pat::Atomic(p) | Pat::ScriptRun(p) => p.width(utf8),
            Pat::Repeat { pat, min, max, .. } => {
                let (a, b) = pat.width(utf8);
                let lo = a.saturating_mul(*min as usize);
                let hi = match b {
                    Some(0) => Some(0),
                    Some(w) if !is_infinite_repeat(*max) => w.checked_mul(*max as usize),
                    _ => None,
                };
                (lo, hi)
            }
            Pat::Cond { yes, no, .. } => {
                let (a, b) = yes.width(utf8);
                let (c, d) = no.as_ref().map_or((0, Some(0)), |n| n.width(utf8));
                (a.min(c), b.zip(d).map(|(x, y)| x.max(y)))
            }
            Pat::Ref(..) | Pat::NRef(..) | Pat::Recurse(_) => (0, None),
            Pat::Eval(_, EvalFlavour::Postponed) => (0, None),
            Pat::LnBreak => (1, Some(2)),
            Pat::Clump => (1, None),
            _ => (0, Some(0)),
        }
    }

    /// Emits exactly one single-character node.
    fn is_single_char(&self, utf8: bool) -> bool {
        match self {
            Pat::Any | Pat::AnyNl | Pat::Class(_) | Pat::Posix { .. } => true,
            Pat::Lit(s) | Pat::LitFold(s, _) => s.chars().count() == 1,
            Pat::Bytes(b) => self.width(utf8) == (1, Some(1)) && !b.is_empty(),
            _ => false,
        }
    }

    /// Fixed-width body with no captures or state a repeat of it could
    /// observe between iterations.
    fn is_simple_fixed(&self, utf8: bool) -> bool {
        fn simple(p: &Pat) -> bool {
            match p {
                Pat::Lit(_) | Pat::LitFold(..) | Pat::Bytes(_) => true,
                Pat::Any | Pat::AnyNl | Pat::Class(_) | Pat::Posix { .. } => true,
                Pat::Sbol | Pat::Mbol | Pat::Seol | Pat::Meol | Pat::Eos | Pat::Bound { .. } => true,
                Pat::Seq(items) | Pat::Alt(items) => items.iter().all(simple),
                _ => false,
            }
        }
        let (lo, hi) = self.width(utf8);
        simple(self) && lo > 0 && hi == Some(lo)
    }

    fn visit(&self, f: &mut impl FnMut(&Pat)) {
        f(self);
        match self {
            Pat::Seq(items) | Pat::Alt(items) => items.iter().for_each(|p| p.visit(f)),
            Pat::Group(_, p)
            | Pat::Atomic(p)
            | Pat::ScriptRun(p)
            | Pat::Repeat { pat: p, .. }
            | Pat::Look { pat: p, .. } => p.visit(f),
            Pat::Cond { cond, yes, no } => {
                if let Cond::Look { pat, .. } = cond {
                    pat.visit(f);
                }
                yes.visit(f);
                if let Some(n) = no {
                    n.visit(f);
                }
            }
            _ => {}
        }
    }
}

fn text_chars(b: &[u8]) -> usize {
    let mut i = 0;
    let mut n = 0;
    while i < b.len() {
        i += crate::regenc::decode_text(true, b, i).map_or(1, |(_, len)| len);
        n += 1;
    }
    n
}

// ============================================================================
// Emission
// ============================================================================

/// A laid-out fragment: its first node and the nodes whose successor is
/// still the fragment's continuation.
struct Frag {
    first: usize,
    tails: Vec<usize>,
}

struct Emitter {
    nodes: Vec<Node>,
    utf8: bool,
    tries: bool,
    /// Group number -> its OPEN node.
    opens: HashMap<u32, usize>,
    gosubs: Vec<(usize, u32)>,
    recursed: HashSet<u32>,
    /// (node, cache-eligible) for every WHILEM.
    whilems: Vec<(usize, bool)>,
    /// Bounds of the enclosing general repeats.
    curlyx_stack: Vec<(u32, u32)>,
    lookaround_depth: u32,
    max_group: u32,
    has_cutgroup: bool,
}

impl Emitter {
    fn push(&mut self, op: Op) -> usize {
        self.nodes.push(Node::new(op));
        self.nodes.len() - 1
    }

    fn patch(&mut self, tails: &[usize], target: usize) {
        for &t in tails {
            self.nodes[t].next = (target as isize - t as isize) as i32;
        }
    }

    fn single(&mut self, op: Op) -> Frag {
        let i = self.push(op);
        Frag { first: i, tails: vec![i] }
    }

    fn text(&self, s: &str) -> Result<Vec<u8>, MatchError> {
        if self.utf8 {
            return Ok(s.as_bytes().to_vec());
        }
        s.chars()
            .map(|c| u8::try_from(c as u32).map_err(|_| MatchError::InvalidArgument("literal not representable in Latin-1")))
            .collect()
    }

    fn emit(&mut self, pat: &Pat) -> Result<Frag, MatchError> {
        let frag = match pat {
            Pat::Empty => self.single(Op::Nothing),
            Pat::Lit(s) if s.is_empty() => self.single(Op::Nothing),
            Pat::Lit(s) => {
                let text = self.text(s)?;
                self.single(Op::Exact { text, fold: None })
            }
            Pat::LitFold(s, fold) => {
                let text = self.text(s)?;
                self.single(Op::Exact { text, fold: Some(*fold) })
            }
            Pat::Bytes(b) if b.is_empty() => self.single(Op::Nothing),
            Pat::Bytes(b) => self.single(Op::Exact { text: b.clone(), fold: None }),
            Pat::Any => self.single(Op::Sany),
            Pat::AnyNl => self.single(Op::RegAny),
            Pat::Class(cc) => self.single(Op::AnyOf(Box::new(cc.clone()))),
            Pat::Posix { class, charset, negate } => {
                self.single(Op::Posix { class: *class, charset: *charset, negate: *negate })
            }
            Pat::Seq(items) => {
                if items.is_empty() {
                    return Ok(self.single(Op::Nothing));
                }
                let mut first = None;
                let mut tails: Vec<usize> = Vec::new();
                for p in items {
                    let f = self.emit(p)?;
                    self.patch(&tails, f.first);
                    first.get_or_insert(f.first);
                    tails = f.tails;
                }
                Frag { first: first.unwrap_or(0), tails }
            }
            Pat::Alt(items) => match items.len() {
                0 => self.single(Op::Nothing),
                1 => self.emit(&items[0])?,
                _ => match trie_words(items, self.tries) {
                    Some(words) => self.emit_trie(words)?,
                    None => self.emit_branches(items)?,
                },
            },
            Pat::Group(n, p) => {
                let open = self.push(Op::Open(*n));
                self.opens.entry(*n).or_insert(open);
                self.max_group = self.max_group.max(*n);
                let body = self.emit(p)?;
                self.patch(&[open], body.first);
                let close = self.push(Op::Close(*n));
                self.patch(&body.tails, close);
                Frag { first: open, tails: vec![close] }
            }
            Pat::Repeat { pat, min, max, greedy } => self.emit_repeat(pat, *min, *max, *greedy)?,
            Pat::Atomic(p) => {
                let s = self.push(Op::Suspend);
                let body = self.emit(p)?;
                let succeed = self.push(Op::Succeed);
                self.patch(&body.tails, succeed);
                Frag { first: s, tails: vec![s] }
            }
            Pat::Look { behind, negate, pat } => self.emit_look(*behind, *negate, pat)?,
            Pat::Cond { cond, yes, no } => self.emit_cond(cond, yes, no.as_deref())?,
            Pat::Ref(n, fold) => self.single(Op::Ref { group: *n, fold: *fold }),
            Pat::NRef(name, fold) => self.single(Op::NRef { name: name.clone(), fold: *fold }),
            Pat::Recurse(n) => {
                let f = self.single(Op::GoSub { group: *n, offset: 0 });
                self.gosubs.push((f.first, *n));
                f
            }
            Pat::Eval(code, flavour) => {
                if *flavour == EvalFlavour::Condition {
                    return Err(MatchError::InvalidArgument("condition eval outside a conditional"));
                }
                self.single(Op::Eval { code: *code, flavour: *flavour })
            }
            Pat::Commit => self.single(Op::Commit),
            Pat::Prune => self.single(Op::Prune),
            Pat::Skip(name) => self.single(Op::Skip { name: name.clone() }),
            Pat::Mark(name) => self.single(Op::MarkPoint { name: name.clone() }),
            Pat::Then(name) => {
                self.has_cutgroup = true;
                self.single(Op::CutGroup { name: name.clone() })
            }
            Pat::Accept => self.single(Op::Accept),
            Pat::Fail => self.single(Op::OpFail),
            Pat::Keep => self.single(Op::Keeps),
            Pat::Sbol => self.single(Op::Sbol),
            Pat::Mbol => self.single(Op::Mbol),
            Pat::Seol => self.single(Op::Seol),
            Pat::Meol => self.single(Op::Meol),
            Pat::Eos => self.single(Op::Eos),
            Pat::Gpos => self.single(Op::Gpos),
            Pat::Bound { kind, charset, negate } => {
                self.single(Op::Bound { kind: *kind, charset: *charset, negate: *negate })
            }
            Pat::LnBreak => self.single(Op::LnBreak),
            Pat::Clump => self.single(Op::Clump),
            Pat::ScriptRun(p) => {
                let open = self.push(Op::SrOpen);
                let body = self.emit(p)?;
                self.patch(&[open], body.first);
                let close = self.push(Op::SrClose);
                self.patch(&body.tails, close);
                Frag { first: open, tails: vec![close] }
            }
        };
        Ok(frag)
    }

    fn emit_branches(&mut self, items: &[Pat]) -> Result<Frag, MatchError> {
        let mut tails = Vec::new();
        let mut prev_branch: Option<usize> = None;
        let mut first = 0;
        for (i, p) in items.iter().enumerate() {
            let b = self.push(Op::Branch);
            if i == 0 {
                first = b;
            }
            if let Some(pb) = prev_branch {
                self.patch(&[pb], b);
            }
            let body = self.emit(p)?;
            tails.extend(body.tails);
            prev_branch = Some(b);
        }
        // The last BRANCH and every body meet at a TAIL.
        let tail = self.push(Op::Tail);
        if let Some(pb) = prev_branch {
            self.patch(&[pb], tail);
        }
        self.patch(&tails, tail);
        Ok(Frag { first, tails: vec![tail] })
    }

    fn emit_trie(&mut self, words: TrieWords<'_>) -> Result<Frag, MatchError> {
        let codes: Vec<Vec<u32>> = words.items.iter().map(|(w, _)| w.chars().map(|c| c as u32).collect()).collect();
        let trie = Trie::new(&codes, words.fold)?;
        let t = self.push(Op::Trie(Box::new(trie)));
        if words.items.iter().all(|(_, tail)| tail.is_none()) {
            return Ok(Frag { first: t, tails: vec![t] });
        }
        let mut jump = Vec::with_capacity(words.items.len());
        let mut tails = Vec::new();
        for (_, tail) in &words.items {
            let body = match tail {
                Some(items) => self.emit(&Pat::Seq(items.to_vec()))?,
                None => self.single(Op::Nothing),
            };
            jump.push((body.first - t) as i32);
            tails.extend(body.tails);
        }
        let join = self.push(Op::Tail);
        self.patch(&tails, join);
        if let Op::Trie(trie) = &mut self.nodes[t].op {
            trie.jump = jump;
        }
        Ok(Frag { first: t, tails: vec![join] })
    }

    fn emit_repeat(&mut self, pat: &Pat, min: u32, max: u32, greedy: bool) -> Result<Frag, MatchError> {
        if min > max {
            return Err(MatchError::InvalidArgument("repeat minimum above maximum"));
        }
        if max == 0 {
            return Ok(self.single(Op::Nothing));
        }
        if min == 1 && max == 1 {
            return self.emit(pat);
        }
        if pat.is_single_char(self.utf8) {
            let op = match (min, is_infinite_repeat(max)) {
                (0, true) => Op::Star { greedy },
                (1, true) => Op::Plus { greedy },
                _ => Op::Curly { min, max, greedy },
            };
            let i = self.push(op);
            let a = self.emit(pat)?;
            self.nodes[a.first].next = 0;
            return Ok(Frag { first: i, tails: vec![i] });
        }
        if let Pat::Group(n, inner) = pat {
            if !self.recursed.contains(n) && inner.is_single_char(self.utf8) {
                let i = self.push(Op::CurlyN { paren: *n, min, max, greedy });
                let open = self.push(Op::Open(*n));
                self.opens.entry(*n).or_insert(open);
                self.max_group = self.max_group.max(*n);
                let a = self.emit(inner)?;
                let close = self.push(Op::Close(*n));
                self.patch(&[open], a.first);
                self.patch(&[a.first], close);
                return Ok(Frag { first: i, tails: vec![i] });
            }
            if !self.recursed.contains(n) && inner.is_simple_fixed(self.utf8) {
                self.max_group = self.max_group.max(*n);
                return self.emit_curlym(inner, *n, min, max, greedy);
            }
        }
        if pat.is_simple_fixed(self.utf8) {
            return self.emit_curlym(pat, 0, min, max, greedy);
        }

        let parenfloor = self.max_group;
        let i = self.push(Op::CurlyX { min, max, greedy, parenfloor });
        self.curlyx_stack.push((min, max));
        let body = self.emit(pat)?;
        self.curlyx_stack.pop();
        let eligible = is_infinite_repeat(max)
            && self.lookaround_depth == 0
            && self.curlyx_stack.iter().all(|&(lo, hi)| lo <= 1 && is_infinite_repeat(hi));
        let w = self.push(Op::WhileM { cache_id: 0 });
        self.whilems.push((w, eligible));
        self.patch(&body.tails, w);
        let b = self.push(Op::Nothing);
        self.nodes[w].next = 1;
        self.patch(&[i], b);
        Ok(Frag { first: i, tails: vec![b] })
    }

    fn emit_curlym(&mut self, body: &Pat, paren: u32, min: u32, max: u32, greedy: bool) -> Result<Frag, MatchError> {
        let i = self.push(Op::CurlyM { paren, min, max, greedy });
        let a = self.emit(body)?;
        let succeed = self.push(Op::Succeed);
        self.patch(&a.tails, succeed);
        Ok(Frag { first: i, tails: vec![i] })
    }

    fn emit_look(&mut self, behind: bool, negate: bool, pat: &Pat) -> Result<Frag, MatchError> {
        let bounds = if behind {
            match pat.width(self.utf8) {
                (min, Some(max)) => Some(Behind { min: min as u32, max: max as u32 }),
                (_, None) => return Err(MatchError::InvalidArgument("lookbehind without a maximum length")),
            }
        } else {
            None
        };
        let op = if negate { Op::UnlessM { behind: bounds } } else { Op::IfMatch { behind: bounds } };
        let head = self.push(op);
        self.lookaround_depth += 1;
        let body = self.emit(pat)?;
        self.lookaround_depth -= 1;
        let mut tails = body.tails;
        if behind {
            let end = self.push(Op::LookbehindEnd);
            self.patch(&tails, end);
            tails = vec![end];
        }
        let succeed = self.push(Op::Succeed);
        self.patch(&tails, succeed);
        Ok(Frag { first: head, tails: vec![head] })
    }

    fn emit_cond(&mut self, cond: &Cond, yes: &Pat, no: Option<&Pat>) -> Result<Frag, MatchError> {
        let head = match cond {
            Cond::Group(n) => self.single(Op::GroupP(*n)),
            Cond::Named(name) => self.single(Op::GroupPN(name.clone())),
            Cond::Recursion(n) => self.single(Op::InsubP(*n)),
            Cond::Define => self.single(Op::DefineP),
            Cond::Look { behind, negate, pat } => {
                let logical = self.push(Op::Logical);
                let look = self.emit_look(*behind, *negate, pat)?;
                self.patch(&[logical], look.first);
                Frag { first: logical, tails: look.tails }
            }
            Cond::Eval(code) => {
                let logical = self.push(Op::Logical);
                let eval = self.push(Op::Eval { code: *code, flavour: EvalFlavour::Condition });
                self.patch(&[logical], eval);
                Frag { first: logical, tails: vec![eval] }
            }
        };
        let t = self.push(Op::IfThen);
        self.patch(&head.tails, t);
        let yes = self.emit(yes)?;
        let mut tails = yes.tails;
        match no {
            Some(no) => {
                let t2 = self.push(Op::IfThen);
                self.patch(&[t], t2);
                let no = self.emit(no)?;
                tails.extend(no.tails);
            }
            None => tails.push(t),
        }
        Ok(Frag { first: head.first, tails })
    }
}

/// Literal-led alternatives suitable for a trie: each word and the rest of
/// its branch.
struct TrieWords<'p> {
    items: Vec<(&'p str, Option<&'p [Pat]>)>,
    fold: Option<FoldKind>,
}

fn trie_words(items: &[Pat], enabled: bool) -> Option<TrieWords<'_>> {
    if !enabled {
        return None;
    }
    let mut fold: Option<Option<FoldKind>> = None;
    let mut out = Vec::with_capacity(items.len());
    for p in items {
        let (word, f, tail) = match p {
            Pat::Lit(s) => (s.as_str(), None, None),
            Pat::LitFold(s, f) => (s.as_str(), Some(*f), None),
            Pat::Seq(v) => match v.first() {
                Some(Pat::Lit(s)) => (s.as_str(), None, Some(&v[1..])),
                Some(Pat::LitFold(s, f)) => (s.as_str(), Some(*f), Some(&v[1..])),
                _ => return None,
            },
            _ => return None,
        };
        if f == Some(FoldKind::Locale) || fold.is_some_and(|prev| prev != f) {
            return None;
        }
        fold = Some(f);
        out.push((word, tail.filter(|t| !t.is_empty())));
    }
    Some(TrieWords { items: out, fold: fold.flatten() })
}

// ============================================================================
// Builder
// ============================================================================

/// Assembles a [`Program`] from a [`Pat`].
pub struct ProgramBuilder {
    pat: Pat,
    utf8: bool,
    tries: bool,
    study: bool,
    names: HashMap<String, Vec<u32>>,
}

impl ProgramBuilder {
    pub fn new(pat: Pat) -> Self {
        ProgramBuilder { pat, utf8: true, tries: true, study: true, names: HashMap::new() }
    }

    /// Literal text is UTF-8 (default) or Latin-1.
    pub fn utf8(mut self, yes: bool) -> Self {
        self.utf8 = yes;
        self
    }

    /// Compile literal alternations to tries (default on).
    pub fn tries(mut self, yes: bool) -> Self {
        self.tries = yes;
        self
    }

    /// Derive required literals and the start class (default on).
    pub fn study(mut self, yes: bool) -> Self {
        self.study = yes;
        self
    }

    /// Bind a name to group `n`. A name may be bound to several groups.
    pub fn name(mut self, name: &str, n: u32) -> Self {
        self.names.entry(name.to_string()).or_default().push(n);
        self
    }

    pub fn build(self) -> Result<Program, MatchError> {
        let mut recursed = HashSet::new();
        let mut nparens = 0;
        let mut no_cache = false;
        let mut has_verbs = false;
        self.pat.visit(&mut |p| match p {
            Pat::Group(n, _) => nparens = nparens.max(*n),
            Pat::Recurse(n) => {
                recursed.insert(*n);
                no_cache = true;
            }
            Pat::Ref(..) | Pat::NRef(..) | Pat::Eval(..) | Pat::Cond { .. } | Pat::Keep | Pat::ScriptRun(_) => {
                no_cache = true
            }
            Pat::Commit | Pat::Prune | Pat::Skip(_) | Pat::Mark(_) | Pat::Then(_) | Pat::Accept => {
                no_cache = true;
                has_verbs = true;
            }
            _ => {}
        });
        for groups in self.names.values() {
            if groups.iter().any(|&n| n == 0 || n > nparens) {
                return Err(MatchError::InvalidArgument("name bound to an undefined group"));
            }
        }

        let mut em = Emitter {
            nodes: Vec::new(),
            utf8: self.utf8,
            tries: self.tries,
            opens: HashMap::new(),
            gosubs: Vec::new(),
            recursed,
            whilems: Vec::new(),
            curlyx_stack: Vec::new(),
            lookaround_depth: 0,
            max_group: 0,
            has_cutgroup: false,
        };
        let top = em.emit(&self.pat)?;
        let end = em.push(Op::End);
        em.patch(&top.tails, end);

        for &(node, group) in &em.gosubs {
            let target = match group {
                0 => top.first,
                n => *em.opens.get(&n).ok_or(MatchError::InvalidArgument("recursion into an undefined group"))?,
            };
            if let Op::GoSub { offset, .. } = &mut em.nodes[node].op {
                *offset = (target as isize - node as isize) as i32;
            }
        }

        let mut n_whilem = 0;
        if !no_cache {
            for &(w, eligible) in &em.whilems {
                if eligible {
                    n_whilem += 1;
                    em.nodes[w].op = Op::WhileM { cache_id: n_whilem };
                }
            }
        }

        let (minlen, maxlen) = if has_verbs { (0, None) } else { self.pat.width(self.utf8) };
        let mut prog = Program {
            nodes: em.nodes,
            nparens,
            minlen,
            maxlen,
            anchor: leading_anchor(&self.pat),
            anchored_substr: None,
            floating_substr: None,
            start_class: None,
            utf8: self.utf8,
            has_cutgroup: em.has_cutgroup,
            n_whilem,
            names: self.names,
        };
        if self.study && !has_verbs {
            study(&self.pat, &mut prog)?;
        }
        prog.validate()?;
        Ok(prog)
    }
}

fn leading_anchor(p: &Pat) -> Anchor {
    match p {
        Pat::Sbol => Anchor::Sbol,
        Pat::Mbol => Anchor::Mbol,
        Pat::Gpos => Anchor::Gpos,
        Pat::Seq(items) => items.first().map_or(Anchor::None, leading_anchor),
        Pat::Group(_, inner) | Pat::Atomic(inner) => leading_anchor(inner),
        Pat::Alt(items) if !items.is_empty() => {
            let first = leading_anchor(&items[0]);
            if items[1..].iter().all(|p| leading_anchor(p) == first) {
                first
            } else {
                Anchor::None
            }
        }
        _ => Anchor::None,
    }
}

// === Study ===

fn flatten<'p>(p: &'p Pat, out: &mut Vec<&'p Pat>) {
    match p {
        Pat::Seq(items) => items.iter().for_each(|i| flatten(i, out)),
        Pat::Group(_, inner) => flatten(inner, out),
        _ => out.push(p),
    }
}

/// Derive the required literals and the start class from the mandatory
/// top-level items.
fn study(pat: &Pat, prog: &mut Program) -> Result<(), MatchError> {
    let mut items = Vec::new();
    flatten(pat, &mut items);

    let mut min_off = 0usize;
    let mut max_off = Some(0usize);
    let mut anchored: Option<Substr> = None;
    let mut floating: Option<Substr> = None;
    for item in &items {
        if let Pat::Lit(s) = item {
            let text = if prog.utf8 {
                s.as_bytes().to_vec()
            } else {
                match s.chars().map(|c| u8::try_from(c as u32)).collect::<Result<Vec<u8>, _>>() {
                    Ok(t) => t,
                    Err(_) => Vec::new(),
                }
            };
            if !text.is_empty() {
                let cand = Substr { text, min_offset: min_off, max_offset: max_off };
                let slot = if max_off == Some(min_off) { &mut anchored } else { &mut floating };
                if slot.as_ref().map_or(true, |cur| cur.text.len() < cand.text.len()) {
                    *slot = Some(cand);
                }
            }
        }
        let (lo, hi) = item.width(prog.utf8);
        min_off += lo;
        max_off = max_off.zip(hi).map(|(a, b)| a + b);
    }
    prog.anchored_substr = anchored;
    prog.floating_substr = floating;

    for item in &items {
        match item {
            Pat::Sbol | Pat::Mbol | Pat::Gpos | Pat::Empty => continue,
            _ => {
                prog.start_class = first_char_op(item, prog.utf8);
                break;
            }
        }
    }
    Ok(())
}

fn first_char_op(p: &Pat, utf8: bool) -> Option<Op> {
    let first = |s: &str| s.chars().next().map(|c| {
        let mut buf = [0u8; 4];
        if utf8 {
            c.encode_utf8(&mut buf).as_bytes().to_vec()
        } else {
            vec![c as u32 as u8]
        }
    });
    match p {
        Pat::Lit(s) => first(s).map(|text| Op::Exact { text, fold: None }),
        Pat::LitFold(s, fold) => first(s).map(|text| Op::Exact { text, fold: Some(*fold) }),
        Pat::Class(cc) => Some(Op::AnyOf(Box::new(cc.clone()))),
        Pat::Posix { class, charset, negate } => Some(Op::Posix { class: *class, charset: *charset, negate: *negate }),
        Pat::AnyNl => Some(Op::RegAny),
        Pat::Repeat { pat, min, .. } if *min >= 1 => first_char_op(pat, utf8),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_chain_meets_at_tail() {
        let prog = ProgramBuilder::new(Pat::alt([Pat::lit("a"), Pat::AnyNl]))
            .build()
            .unwrap();
        assert!(matches!(prog.nodes[0].op, Op::Branch));
        assert_eq!(prog.next(0), Some(2));
        assert!(matches!(prog.nodes[2].op, Op::Branch));
        assert!(matches!(prog.nodes[prog.next(2).unwrap()].op, Op::Tail));
    }

    #[test]
    fn literal_alternation_becomes_trie() {
        let prog = ProgramBuilder::new(Pat::alt([Pat::lit("foo"), Pat::lit("foobar")]))
            .build()
            .unwrap();
        assert!(matches!(prog.nodes[0].op, Op::Trie(_)));
        assert_eq!(prog.minlen, 3);
        assert_eq!(prog.maxlen, Some(6));
    }

    #[test]
    fn repeat_strategies() {
        let star = ProgramBuilder::new(Pat::star(Pat::lit("a"))).build().unwrap();
        assert!(matches!(star.nodes[0].op, Op::Star { greedy: true }));

        let curlyn = ProgramBuilder::new(Pat::repeat(Pat::group(1, Pat::AnyNl), 2, 3))
            .build()
            .unwrap();
        assert!(matches!(curlyn.nodes[0].op, Op::CurlyN { paren: 1, .. }));

        let curlym = ProgramBuilder::new(Pat::plus(Pat::lit("ab"))).build().unwrap();
        assert!(matches!(curlym.nodes[0].op, Op::CurlyM { paren: 0, .. }));

        let curlyx = ProgramBuilder::new(Pat::star(Pat::alt([Pat::lit("a"), Pat::lit("bc")])))
            .build()
            .unwrap();
        assert!(matches!(curlyx.nodes[0].op, Op::CurlyX { .. }));
        assert_eq!(curlyx.n_whilem, 1);
    }

    #[test]
    fn cache_disabled_by_backrefs() {
        let pat = Pat::seq([
            Pat::group(1, Pat::lit("a")),
            Pat::star(Pat::alt([Pat::lit("b"), Pat::lit("cd")])),
            Pat::Ref(1, None),
        ]);
        let prog = ProgramBuilder::new(pat).build().unwrap();
        assert_eq!(prog.n_whilem, 0);
    }

    #[test]
    fn gosub_targets_open() {
        let pat = Pat::group(1, Pat::seq([Pat::lit("("), Pat::opt(Pat::Recurse(1)), Pat::lit(")")]));
        let prog = ProgramBuilder::new(pat).build().unwrap();
        let (i, offset) = prog
            .nodes
            .iter()
            .enumerate()
            .find_map(|(i, n)| match n.op {
                Op::GoSub { offset, .. } => Some((i, offset)),
                _ => None,
            })
            .unwrap();
        assert!(matches!(prog.nodes[(i as i32 + offset) as usize].op, Op::Open(1)));
    }

    #[test]
    fn study_finds_literals() {
        let pat = Pat::seq([Pat::lit("ab"), Pat::star(Pat::AnyNl), Pat::lit("xyz")]);
        let prog = ProgramBuilder::new(pat).build().unwrap();
        assert_eq!(prog.anchored_substr.as_ref().unwrap().text, b"ab");
        let fl = prog.floating_substr.unwrap();
        assert_eq!(fl.text, b"xyz");
        assert_eq!((fl.min_offset, fl.max_offset), (2, None));
        assert!(matches!(prog.start_class, Some(Op::Exact { .. })));
    }

    #[test]
    fn unbounded_lookbehind_rejected() {
        let err = ProgramBuilder::new(Pat::behind(Pat::star(Pat::lit("a")))).build();
        assert!(matches!(err, Err(MatchError::InvalidArgument(_))));
    }

    #[test]
    fn anchors_detected() {
        let prog = ProgramBuilder::new(Pat::seq([Pat::Mbol, Pat::lit("x")])).build().unwrap();
        assert_eq!(prog.anchor, Anchor::Mbol);
    }
}
