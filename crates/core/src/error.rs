//! Error types surfaced by roster loading and parsing.

use thiserror::Error;

/// Failures that stop a roster from being produced.
///
/// Unfamiliar selections or profiles never end up here; those are logged and
/// skipped by the walker so the rest of the roster still parses.
#[derive(Error, Debug)]
pub enum RosterError {
    /// The document's game system is missing or not one we know how to read.
    #[error("unsupported game type: {0}")]
    UnsupportedGameType(String),

    /// The document parsed as XML but has no `roster` root element.
    #[error("document does not contain a roster element")]
    MissingRoster,

    /// The payload is not well-formed XML.
    #[error("XML parsing error at byte {position}: {message}")]
    Xml {
        /// Byte offset reported by the reader.
        position: u64,
        /// Reader error text.
        message: String,
    },

    /// A zip container without a roster entry at its root.
    #[error("archive does not contain a .ros file")]
    EmptyArchive,

    /// The roster payload is not valid UTF-8.
    #[error("roster is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Underlying I/O failure while reading a container.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Underlying zip failure while reading a `.rosz` container.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// A rule table could not be decoded.
    #[error("invalid rule table: {0}")]
    Tables(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, RosterError>;
