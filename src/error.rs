//! Error types for registry, alphabet and session operations.
//!
//! Nothing in here ever carries the master secret. Variants hold site
//! identifiers, alphabet specs, file paths and line numbers only.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PwdbError>;

#[derive(Debug, Error)]
pub enum PwdbError {
    /// The alphabet spec contains a character outside `u`, `n`, `s`.
    #[error("Alphabet string \"{spec}\" makes no sense (unexpected '{invalid}', use only u, n, s)")]
    InvalidAlphabetSpec { spec: String, invalid: char },

    #[error("Cannot encode with digit table \"{digits}\": {reason}")]
    InvalidDigitTable { digits: String, reason: String },

    /// A registry line could not be parsed.
    #[error("Corrupt registry record at line {line}: {reason}")]
    CorruptRecord { line: usize, reason: String },

    /// The registry file is missing or an I/O operation on it failed.
    #[error("Registry {} unavailable: {reason}", .path.display())]
    RegistryUnavailable {
        path: PathBuf,
        reason: String,
        #[source]
        source: Option<io::Error>,
    },

    #[error("Site \"{0}\" is already registered")]
    DuplicateSite(String),

    /// Empty identifier, or one containing whitespace.
    #[error("Invalid site name \"{0}\": must be non-empty and contain no whitespace")]
    InvalidSiteName(String),

    #[error("Site \"{site}\" is registered with alphabet \"{stored}\", refusing to derive with \"{requested}\"")]
    SpecConflict {
        site: String,
        stored: String,
        requested: String,
    },

    /// The interactive collaborator could not supply input.
    #[error("Failed to read input: {0}")]
    Prompt(#[source] io::Error),
}

impl PwdbError {
    pub(crate) fn unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        PwdbError::RegistryUnavailable {
            path: path.into(),
            reason: reason.into(),
            source: None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, reason: impl Into<String>, err: io::Error) -> Self {
        PwdbError::RegistryUnavailable {
            path: path.into(),
            reason: format!("{}: {}", reason.into(), err),
            source: Some(err),
        }
    }

    pub(crate) fn corrupt(line: usize, reason: impl Into<String>) -> Self {
        PwdbError::CorruptRecord {
            line,
            reason: reason.into(),
        }
    }
}
