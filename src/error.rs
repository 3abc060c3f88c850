// error.rs - Error type for the matcher.
//
// A failed match is not an error. These variants cover the conditions
// that abort a match attempt outright, each with a stable numeric code.

use std::fmt;

pub const ERR_INFINITE_RECURSION: i32 = -201;
pub const ERR_NO_PROGRESS_RECURSION: i32 = -202;
pub const ERR_MALFORMED_UTF8: i32 = -203;
pub const ERR_CORRUPT_PROGRAM: i32 = -204;
pub const ERR_UNKNOWN_OPCODE: i32 = -205;
pub const ERR_CHECKPOINT_OVERFLOW: i32 = -206;
pub const ERR_STACK_LIMIT_OVER: i32 = -15;
pub const ERR_RETRY_LIMIT_OVER: i32 = -17;
pub const ERR_TIME_LIMIT_OVER: i32 = -19;
pub const ERR_INTERRUPTED: i32 = -20;
pub const ERR_CALLOUT: i32 = -207;
pub const ERR_UNKNOWN_PROPERTY: i32 = -223;
pub const ERR_INVALID_ARGUMENT: i32 = -30;

/// Error type for program assembly and matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchError {
    /// A group recursed into itself without consuming input.
    InfiniteRecursion { group: u32, offset: usize },
    /// Too many nested recursions or postponed patterns at one position.
    NoProgressRecursion { limit: u32 },
    /// The subject is flagged UTF-8 but contains an invalid sequence.
    MalformedUtf8 { offset: usize },
    /// The program's node chain or operands are inconsistent.
    CorruptProgram { node: usize, reason: &'static str },
    /// A node was reached in a context where it cannot execute.
    UnknownOpcode { node: usize },
    /// Saving capture state would overflow the checkpoint stack.
    CheckpointOverflow,
    /// Backtrack-state stack limit exceeded.
    StackLimitOver,
    /// Backtrack count limit exceeded.
    RetryLimitOver,
    /// Time limit exceeded.
    TimeLimitOver,
    /// The caller's interrupt flag was raised.
    Interrupted,
    /// The host callback failed or returned an unusable value.
    Callout(String),
    /// A user-defined property could not be resolved.
    UnknownProperty(String),
    /// Invalid argument passed to a public entry point.
    InvalidArgument(&'static str),
}

impl fmt::Display for MatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchError::InfiniteRecursion { group, offset } => write!(
                f,
                "infinite recursion into group {} at offset {}",
                group, offset
            ),
            MatchError::NoProgressRecursion { limit } => write!(
                f,
                "pattern subroutine nesting without pos change exceeded limit {}",
                limit
            ),
            MatchError::MalformedUtf8 { offset } => {
                write!(f, "malformed UTF-8 character at offset {}", offset)
            }
            MatchError::CorruptProgram { node, reason } => {
                write!(f, "corrupted program at node {}: {}", node, reason)
            }
            MatchError::UnknownOpcode { node } => {
                write!(f, "unexpected node {} in current context", node)
            }
            MatchError::CheckpointOverflow => write!(f, "capture checkpoint overflow"),
            MatchError::StackLimitOver => write!(f, "match-stack limit over"),
            MatchError::RetryLimitOver => write!(f, "retry-limit-in-match over"),
            MatchError::TimeLimitOver => write!(f, "time limit over"),
            MatchError::Interrupted => write!(f, "match interrupted"),
            MatchError::Callout(message) => write!(f, "callout failed: {}", message),
            MatchError::UnknownProperty(name) => {
                write!(f, "can't find Unicode property definition \"{}\"", name)
            }
            MatchError::InvalidArgument(what) => write!(f, "invalid argument: {}", what),
        }
    }
}

impl std::error::Error for MatchError {}

impl MatchError {
    /// Returns the numeric code for this error.
    pub fn code(&self) -> i32 {
        match self {
            MatchError::InfiniteRecursion { .. } => ERR_INFINITE_RECURSION,
            MatchError::NoProgressRecursion { .. } => ERR_NO_PROGRESS_RECURSION,
            MatchError::MalformedUtf8 { .. } => ERR_MALFORMED_UTF8,
            MatchError::CorruptProgram { .. } => ERR_CORRUPT_PROGRAM,
            MatchError::UnknownOpcode { .. } => ERR_UNKNOWN_OPCODE,
            MatchError::CheckpointOverflow => ERR_CHECKPOINT_OVERFLOW,
            MatchError::StackLimitOver => ERR_STACK_LIMIT_OVER,
            MatchError::RetryLimitOver => ERR_RETRY_LIMIT_OVER,
            MatchError::TimeLimitOver => ERR_TIME_LIMIT_OVER,
            MatchError::Interrupted => ERR_INTERRUPTED,
            MatchError::Callout(_) => ERR_CALLOUT,
            MatchError::UnknownProperty(_) => ERR_UNKNOWN_PROPERTY,
            MatchError::InvalidArgument(_) => ERR_INVALID_ARGUMENT,
        }
    }

    /// True for the resource-limit family (stack, retry, time, interrupt).
    pub fn is_limit(&self) -> bool {
        matches!(
            self,
            MatchError::StackLimitOver
                | MatchError::RetryLimitOver
                | MatchError::TimeLimitOver
                | MatchError::Interrupted
        )
    }

    pub(crate) fn corrupt(node: usize, reason: &'static str) -> Self {
        MatchError::CorruptProgram { node, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infinite_recursion_message() {
        let err = MatchError::InfiniteRecursion { group: 1, offset: 3 };
        assert_eq!(err.code(), ERR_INFINITE_RECURSION);
        assert_eq!(err.to_string(), "infinite recursion into group 1 at offset 3");
    }

    #[test]
    fn malformed_utf8_carries_offset() {
        let err = MatchError::MalformedUtf8 { offset: 7 };
        assert_eq!(err.code(), ERR_MALFORMED_UTF8);
        assert!(err.to_string().contains("offset 7"));
    }

    #[test]
    fn limit_family() {
        assert!(MatchError::RetryLimitOver.is_limit());
        assert!(MatchError::Interrupted.is_limit());
        assert!(!MatchError::CheckpointOverflow.is_limit());
        assert_eq!(MatchError::TimeLimitOver.to_string(), "time limit over");
    }

    #[test]
    fn corrupt_program_helper() {
        let err = MatchError::corrupt(4, "ran off the end of the node chain");
        assert!(matches!(err, MatchError::CorruptProgram { node: 4, .. }));
        assert_eq!(err.code(), ERR_CORRUPT_PROGRAM);
    }

    #[test]
    fn display_impl() {
        let err = MatchError::UnknownProperty("IsVowel".into());
        let msg = format!("{}", err);
        assert!(msg.contains("IsVowel"));
    }

    #[test]
    fn error_trait() {
        let err: Box<dyn std::error::Error> = Box::new(MatchError::StackLimitOver);
        assert_eq!(err.to_string(), "match-stack limit over");
    }
}
