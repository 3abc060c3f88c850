//! # regmatch
//!
//! Perl-style backtracking regex execution engine. It runs programs produced
//! by an external pattern compiler (or assembled with [`regasm::ProgramBuilder`])
//! against byte subjects in UTF-8 or Latin-1, with substring search via
//! [`memchr`](https://crates.io/crates/memchr).
//!
//! ## Quick Start
//!
//! ```rust
//! use regmatch::prelude::*;
//!
//! let prog = ProgramBuilder::new(Pat::seq([
//!     Pat::group(1, Pat::plus(Pat::posix(PosixClass::Alpha))),
//!     Pat::lit("="),
//!     Pat::group(2, Pat::plus(Pat::posix(PosixClass::Digit))),
//! ]))
//! .build()
//! .unwrap();
//! let re = Regex::new(prog).unwrap();
//! let caps = re.captures("set width=80").unwrap().unwrap();
//! assert_eq!(caps.get(1).unwrap().as_bytes(), b"width");
//! assert_eq!(caps.get(2).unwrap().as_bytes(), b"80");
//! ```
//!
//! ## Low-Level API
//!
//! ```rust
//! use std::sync::Arc;
//! use regmatch::regasm::{Pat, ProgramBuilder};
//! use regmatch::regexec::{regexec_flags, ExecInput, ExecOutcome};
//!
//! let prog = Arc::new(ProgramBuilder::new(Pat::lit("b")).build().unwrap());
//! let outcome = regexec_flags(&prog, ExecInput::new(b"abc", true)).unwrap();
//! assert!(matches!(outcome, ExecOutcome::Match(ref r) if r.offs[0] == Some((1, 2))));
//! ```
//!
//! ## Module Structure
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`regexec`] | Backtracking matcher and search driver |
//! | [`regint`] | Program, node kinds, flags and limits |
//! | [`regasm`] | Program assembler |
//! | [`regcp`] | Capture offsets and checkpoint stack |
//! | [`regclass`] | Character-class evaluation |
//! | [`regboundary`] | `\b{gcb}`, `\b{wb}`, `\b{sb}`, `\b{lb}` and `\b` |
//! | [`regtrie`] | Literal-alternation trie |
//! | [`regintuit`] | Start-position heuristic |
//! | [`regscript`] | Script-run validation |
//! | [`regcallout`] | Host code callouts |
//! | [`regenc`] | Encoding trait |
//! | [`unicode`] | Properties, folds and segmentation tables |

#![allow(dead_code)]
#![allow(clippy::empty_line_after_doc_comments)]
// Enable #[coverage(off)] attribute when running under cargo-llvm-cov on nightly.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod api;
pub mod encodings;
pub mod error;
pub mod prelude;
pub mod regasm;
pub mod regboundary;
pub mod regcallout;
pub mod regclass;
pub mod regcp;
pub mod regenc;
pub mod regexec;
pub mod regint;
pub mod regintuit;
pub mod regscript;
pub mod regtrie;
pub mod unicode;
