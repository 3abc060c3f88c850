// encodings/mod.rs - Encoding registry
// One module per subject encoding the matcher understands.

pub mod latin1;
pub mod utf8;

pub use latin1::LATIN1;
pub use utf8::UTF8;

use crate::regenc::MatchEncoding;

/// Encoding for a subject or pattern given its UTF-8 flag.
pub fn for_flag(utf8: bool) -> MatchEncoding {
    if utf8 {
        &UTF8
    } else {
        &LATIN1
    }
}
