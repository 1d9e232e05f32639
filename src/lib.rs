// Library exports for fqsync
pub mod error;
pub mod fastq;
pub mod format_io;
pub mod read_id;
pub mod sync;

pub use error::{FastqError, SyncError};
pub use fastq::{FastqReader, FastqRecord, FastqWriter};
pub use read_id::ReadId;
pub use sync::{synchronize, MissingPolicy, SyncConfig, SyncStats, Synchronizer};
