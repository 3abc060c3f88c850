// prelude.rs - Convenient re-exports for the idiomatic API.
//
//! # Prelude
//!
//! ```
//! use regmatch::prelude::*;
//!
//! let re = Regex::new(ProgramBuilder::new(Pat::lit("42")).build().unwrap()).unwrap();
//! let m = re.find("answer: 42").unwrap().unwrap();
//! assert_eq!(m.as_bytes(), b"42");
//! ```

pub use crate::api::{Captures, CapturesIter, FindIter, Match, Regex, Subject};
pub use crate::error::MatchError;
pub use crate::regasm::{Cond, Pat, ProgramBuilder};
pub use crate::regcallout::{CalloutContext, HostCallback, HostValue};
pub use crate::regint::{ExecFlags, FoldKind, Locale, PosixClass, Program};
