//! G-Code instruction handling
//!
//! Turns stored instruction files into the ordered command lines streamed to
//! the printer.

pub mod parser;
pub mod source;

pub use parser::{parse_instructions, strip_comment, COMMENT_MARKER};
pub use source::InstructionSource;
