// regcallout.rs - Host code callouts.
// The matcher runs embedded host code through the HostCallback trait and
// interprets the returned HostValue according to the call site's flavour.

use std::fmt;
use std::sync::Arc;

use crate::error::MatchError;
use crate::regcp::Parens;
use crate::regint::Program;

/// Value returned by host code.
#[derive(Clone)]
pub enum HostValue {
    Undef,
    Bool(bool),
    Int(i64),
    Str(Vec<u8>),
    /// A compiled sub-pattern for `(??{ })` call sites.
    Pattern(Arc<Program>),
}

impl HostValue {
    /// Host truthiness: undef, false, 0, "" and "0" are false.
    pub fn truthy(&self) -> bool {
        match self {
            HostValue::Undef => false,
            HostValue::Bool(b) => *b,
            HostValue::Int(n) => *n != 0,
            HostValue::Str(s) => !(s.is_empty() || s.as_slice() == b"0"),
            HostValue::Pattern(_) => true,
        }
    }
}

impl fmt::Debug for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HostValue::Undef => write!(f, "Undef"),
            HostValue::Bool(b) => write!(f, "Bool({})", b),
            HostValue::Int(n) => write!(f, "Int({})", n),
            HostValue::Str(s) => write!(f, "Str({:?})", String::from_utf8_lossy(s)),
            HostValue::Pattern(p) => write!(f, "Pattern({} nodes)", p.nodes.len()),
        }
    }
}

impl PartialEq for HostValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HostValue::Undef, HostValue::Undef) => true,
            (HostValue::Bool(a), HostValue::Bool(b)) => a == b,
            (HostValue::Int(a), HostValue::Int(b)) => a == b,
            (HostValue::Str(a), HostValue::Str(b)) => a == b,
            (HostValue::Pattern(a), HostValue::Pattern(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Partial match state visible to host code.
pub struct CalloutContext<'a> {
    pub subject: &'a [u8],
    /// Current input position.
    pub pos: usize,
    /// Start of the current match attempt.
    pub start: usize,
    pub(crate) parens: &'a Parens,
}

impl<'a> CalloutContext<'a> {
    /// Byte range of group `n` as captured so far.
    pub fn group(&self, n: u32) -> Option<(usize, usize)> {
        self.parens.group(n)
    }

    pub fn group_bytes(&self, n: u32) -> Option<&'a [u8]> {
        self.group(n).map(|(s, e)| &self.subject[s..e])
    }

    pub fn last_paren(&self) -> u32 {
        self.parens.lastparen
    }

    pub fn last_close_paren(&self) -> u32 {
        self.parens.lastcloseparen
    }
}

/// Host code the matcher can call into mid-match.
pub trait HostCallback: Send + Sync {
    /// Run the code block numbered `code`.
    fn run(&self, code: usize, ctx: &CalloutContext<'_>) -> Result<HostValue, MatchError>;

    /// Resolve a user-defined property to inclusive code point ranges.
    fn user_property(&self, name: &str) -> Result<Vec<(u32, u32)>, MatchError> {
        Err(MatchError::UnknownProperty(name.to_string()))
    }
}

impl<F> HostCallback for F
where
    F: Fn(usize, &CalloutContext<'_>) -> Result<HostValue, MatchError> + Send + Sync,
{
    fn run(&self, code: usize, ctx: &CalloutContext<'_>) -> Result<HostValue, MatchError> {
        self(code, ctx)
    }
}
