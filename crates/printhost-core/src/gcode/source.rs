//! Instruction file references
//!
//! The controller consumes an instruction file by reference; how the file got
//! there is the caller's business.

use crate::error::{GcodeError, Result};
use std::fmt;
use std::path::PathBuf;

/// Where to read an instruction file from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstructionSource {
    /// A file on disk, read as UTF-8
    Path(PathBuf),
    /// Instruction text already in memory
    Content(String),
}

impl InstructionSource {
    /// Load the raw instruction text
    pub fn load(&self) -> Result<String> {
        match self {
            InstructionSource::Path(path) => std::fs::read_to_string(path).map_err(|e| {
                GcodeError::FileError {
                    reason: format!("Failed to read {}: {}", path.display(), e),
                }
                .into()
            }),
            InstructionSource::Content(text) => Ok(text.clone()),
        }
    }

    /// Load and parse into executable command lines
    pub fn parse(&self) -> Result<Vec<String>> {
        Ok(super::parse_instructions(&self.load()?))
    }
}

impl fmt::Display for InstructionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstructionSource::Path(path) => write!(f, "{}", path.display()),
            InstructionSource::Content(text) => write!(f, "<inline, {} bytes>", text.len()),
        }
    }
}

impl From<PathBuf> for InstructionSource {
    fn from(path: PathBuf) -> Self {
        InstructionSource::Path(path)
    }
}

impl From<String> for InstructionSource {
    fn from(text: String) -> Self {
        InstructionSource::Content(text)
    }
}
