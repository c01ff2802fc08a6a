//! # Error Types
//!
//! Error handling for the sniffer.
//!
//! Only genuine failures live here. A flow that simply is not an EasyTier
//! handshake is a negative match result, never an error, so that unclassified
//! traffic can keep flowing to the next matcher.
//!
//! ## Error Categories
//! - **I/O Errors**: short reads, resets and other transport failures while
//!   reading the handshake header
//! - **Timeouts**: the host pipeline gave up waiting on a slow peer
//! - **Configuration Errors**: malformed matcher directives, bad config files
//! - **Registry Errors**: unknown or duplicate matcher module ids
//!
//! ## Example Usage
//! ```rust
//! use easytier_sniff::error::{Result, SniffError};
//! use tracing::{error, info};
//!
//! fn load(path: &str) -> Result<String> {
//!     std::fs::read_to_string(path).map_err(SniffError::Io)
//! }
//!
//! fn main() {
//!     match load("sniff.toml") {
//!         Ok(contents) => info!(len = contents.len(), "Loaded config"),
//!         Err(e) => error!(error = %e, "Error reading config"),
//!     }
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Registry lock errors
    pub const ERR_REGISTRY_WRITE_LOCK: &str = "Failed to acquire write lock on matcher registry";
    pub const ERR_REGISTRY_READ_LOCK: &str = "Failed to acquire read lock on matcher registry";

    /// Directive errors
    pub const ERR_EMPTY_DIRECTIVE: &str = "Matcher directive is empty";
    pub const ERR_WRONG_ARG_COUNT: &str = "Wrong argument count or unexpected line ending";
    pub const ERR_UNCLOSED_BLOCK: &str = "Unclosed block in matcher directive";

    /// Pipeline errors
    pub const ERR_MATCHING_TIMEOUT: &str = "Matching timed out";
}

/// Primary error type for all sniffer operations.
#[derive(Error, Debug)]
pub enum SniffError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Matching timed out")]
    Timeout,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Unknown matcher: {0}")]
    UnknownMatcher(String),

    #[error("Matcher already registered: {0}")]
    DuplicateMatcher(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl SniffError {
    /// True when this is an end-of-input condition, i.e. the peer closed the
    /// flow before a full header arrived.
    pub fn is_eof(&self) -> bool {
        matches!(
            self,
            SniffError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof
        )
    }

    /// True for failures of the underlying transport (I/O or deadline).
    pub fn is_transport(&self) -> bool {
        matches!(self, SniffError::Io(_) | SniffError::Timeout)
    }
}

/// Type alias for Results using SniffError
pub type Result<T> = std::result::Result<T, SniffError>;
