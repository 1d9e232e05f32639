//! Error types for FASTQ parsing and pair synchronization

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the FASTQ codec before a file path is known
#[derive(Debug, Error)]
pub enum FastqError {
    /// Record does not follow the 4-line FASTQ layout
    #[error("record {record} (line {line}): {reason}")]
    Malformed {
        record: u64,
        line: u64,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors that abort a synchronization run
#[derive(Debug, Error)]
pub enum SyncError {
    /// The same normalized identifier occurs twice within one filtered file
    #[error("{}: duplicate read identifier '{id}' at record {record}", path.display())]
    DuplicateIdentifier {
        path: PathBuf,
        record: u64,
        id: String,
    },

    /// A filtered read never appears in the original read file
    #[error(
        "{}: read identifier '{id}' does not occur in original file {}",
        path.display(),
        original.display()
    )]
    MissingIdentifier {
        path: PathBuf,
        original: PathBuf,
        id: String,
    },

    #[error("{}: malformed FASTQ record {record} (line {line}): {reason}", path.display())]
    MalformedRecord {
        path: PathBuf,
        record: u64,
        line: u64,
        reason: String,
    },

    #[error("{}: cannot {action}: {source}", path.display())]
    Io {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    pub(crate) fn io(path: impl Into<PathBuf>, action: &'static str, source: io::Error) -> Self {
        SyncError::Io {
            path: path.into(),
            action,
            source,
        }
    }

    /// Attach a file path to a codec error
    pub(crate) fn from_fastq(path: impl Into<PathBuf>, err: FastqError) -> Self {
        match err {
            FastqError::Malformed {
                record,
                line,
                reason,
            } => SyncError::MalformedRecord {
                path: path.into(),
                record,
                line,
                reason,
            },
            FastqError::Io(source) => SyncError::io(path, "read", source),
        }
    }
}

pub type Result<T, E = SyncError> = std::result::Result<T, E>;
