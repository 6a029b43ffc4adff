//! Error types for alphabuddy

use std::io;
use thiserror::Error;

/// Main error type for alphabuddy
#[derive(Error, Debug)]
pub enum BuddyError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    /// No speech or tone capability on this platform
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A started utterance or tone failed mid-flight
    #[error("Provider error: {0}")]
    Provider(String),

    /// The optional premium speech engine could not be loaded
    #[error("Failed to load speech engine: {0}")]
    LoadFailure(String),

    #[error("Audio output error: {0}")]
    Audio(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for alphabuddy operations
pub type Result<T> = std::result::Result<T, BuddyError>;

impl From<String> for BuddyError {
    fn from(s: String) -> Self {
        BuddyError::Other(s)
    }
}

impl From<&str> for BuddyError {
    fn from(s: &str) -> Self {
        BuddyError::Other(s.to_string())
    }
}

impl From<ini::Error> for BuddyError {
    fn from(e: ini::Error) -> Self {
        BuddyError::IniParse(e.to_string())
    }
}
