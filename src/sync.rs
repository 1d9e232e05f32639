//! Paired-end read synchronization
//!
//! Two mate files filtered independently (quality trimming, contaminant
//! removal, ...) usually disagree on which reads survived. Downstream aligners
//! need both files to list the same pairs in the same order. Given the two
//! filtered files and the original read file, keep only pairs present in both
//! filtered files and write them in original-file order.
//!
//! Both filtered files are loaded into memory; the original file is streamed
//! once and drives the output order.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use log::{debug, info, warn};

use crate::error::{Result, SyncError};
use crate::fastq::{FastqReader, FastqRecord, FastqWriter};
use crate::format_io::{self, OutputSink, DEFAULT_COMPRESSION_LEVEL};
use crate::read_id::{mate_of, Mate, ReadId};

/// What to do with filtered reads whose identifier is absent from the original
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Abort with [`SyncError::MissingIdentifier`]
    #[default]
    Error,
    /// Drop the read and log a warning
    Ignore,
}

impl FromStr for MissingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(MissingPolicy::Error),
            "ignore" => Ok(MissingPolicy::Ignore),
            other => Err(format!(
                "invalid missing-read policy '{other}', expected 'error' or 'ignore'"
            )),
        }
    }
}

impl fmt::Display for MissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingPolicy::Error => f.write_str("error"),
            MissingPolicy::Ignore => f.write_str("ignore"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub missing: MissingPolicy,
    /// gzip level for outputs ending in `.gz`
    pub compression_level: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            missing: MissingPolicy::default(),
            compression_level: DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

/// Counts reported after a successful run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStats {
    /// Reads dropped from the first filtered file
    pub filtered_1: u64,
    /// Reads dropped from the second filtered file
    pub filtered_2: u64,
    /// Pairs written to both outputs
    pub kept: u64,
    /// Records scanned in the original file
    pub original_records: u64,
    /// Original records repeating an identifier already matched to a filtered read
    pub original_duplicates: u64,
    /// Filtered reads absent from the original (only non-zero with `MissingPolicy::Ignore`)
    pub missing: u64,
    /// Filtered reads whose header names the other mate
    pub mislabeled: u64,
}

impl fmt::Display for SyncStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Filtered {} reads from first read file.", self.filtered_1)?;
        writeln!(f, "Filtered {} reads from second read file.", self.filtered_2)?;
        write!(f, "Synced read files contain {} reads.", self.kept)
    }
}

/// Filtered reads of one mate, keyed by normalized identifier in file order.
/// A slot is emptied once the original file has claimed its read.
struct MateReads {
    path: PathBuf,
    reads: IndexMap<ReadId, Option<FastqRecord>>,
    mislabeled: u64,
}

impl MateReads {
    fn load(path: &Path, mate: Mate) -> Result<Self> {
        let input = format_io::open_input(path).map_err(|e| SyncError::io(path, "open", e))?;
        let mut reader = FastqReader::new(input);
        let mut reads = IndexMap::new();
        let mut mislabeled = 0u64;

        while let Some(record) = reader
            .next_record()
            .map_err(|e| SyncError::from_fastq(path, e))?
        {
            if mate_of(&record.header()).is_some_and(|m| m != mate) {
                mislabeled += 1;
            }
            let id = record.read_id();
            if reads.contains_key(&id) {
                return Err(SyncError::DuplicateIdentifier {
                    path: path.to_path_buf(),
                    record: reader.records_read(),
                    id: id.into_string(),
                });
            }
            reads.insert(id, Some(record));
        }

        if mislabeled > 0 {
            warn!(
                "{}: {} reads are labeled as the other mate",
                path.display(),
                mislabeled
            );
        }
        info!("{}: loaded {} reads", path.display(), reads.len());
        Ok(MateReads {
            path: path.to_path_buf(),
            reads,
            mislabeled,
        })
    }

    /// `None` if the identifier is unknown, `Some(None)` if already claimed
    fn take(&mut self, id: &ReadId) -> Option<Option<FastqRecord>> {
        self.reads.get_mut(id).map(Option::take)
    }

    /// Handle reads never matched by the original file
    fn resolve_missing(&self, original: &Path, policy: MissingPolicy) -> Result<u64> {
        let Some((id, _)) = self.reads.iter().find(|(_, read)| read.is_some()) else {
            return Ok(0);
        };
        let unclaimed = self.reads.values().filter(|read| read.is_some()).count();
        match policy {
            MissingPolicy::Error => Err(SyncError::MissingIdentifier {
                path: self.path.clone(),
                original: original.to_path_buf(),
                id: id.to_string(),
            }),
            MissingPolicy::Ignore => {
                warn!(
                    "{}: dropping {} reads not present in {} (first: '{}')",
                    self.path.display(),
                    unclaimed,
                    original.display(),
                    id
                );
                Ok(unclaimed as u64)
            }
        }
    }
}

/// Synchronizes two filtered mate files against their original read file
#[derive(Debug, Clone, Default)]
pub struct Synchronizer {
    config: SyncConfig,
}

impl Synchronizer {
    pub fn new(config: SyncConfig) -> Self {
        Synchronizer { config }
    }

    /// Run one synchronization.
    ///
    /// Outputs are written only if the whole run succeeds; on error neither
    /// output path is created or modified.
    pub fn run<P: AsRef<Path>>(
        &self,
        original: P,
        filtered_1: P,
        filtered_2: P,
        out_1: P,
        out_2: P,
    ) -> Result<SyncStats> {
        let original = original.as_ref();
        let (out_1, out_2) = (out_1.as_ref(), out_2.as_ref());

        let mut mates_1 = MateReads::load(filtered_1.as_ref(), Mate::First)?;
        let mut mates_2 = MateReads::load(filtered_2.as_ref(), Mate::Second)?;

        let level = self.config.compression_level;
        let mut writer_1 = FastqWriter::new(
            OutputSink::create(out_1, level).map_err(|e| SyncError::io(out_1, "create", e))?,
        );
        let mut writer_2 = FastqWriter::new(
            OutputSink::create(out_2, level).map_err(|e| SyncError::io(out_2, "create", e))?,
        );

        let input = format_io::open_input(original)
            .map_err(|e| SyncError::io(original, "open", e))?;
        let mut reader = FastqReader::new(input);
        let mut stats = SyncStats {
            mislabeled: mates_1.mislabeled + mates_2.mislabeled,
            ..SyncStats::default()
        };

        while let Some(record) = reader
            .next_record()
            .map_err(|e| SyncError::from_fastq(original, e))?
        {
            stats.original_records += 1;
            let id = record.read_id();

            // Only the first occurrence of an identifier takes part
            match (mates_1.take(&id), mates_2.take(&id)) {
                (Some(None), _) | (_, Some(None)) => stats.original_duplicates += 1,
                (Some(Some(read_1)), Some(Some(read_2))) => {
                    writer_1
                        .write_record(&read_1)
                        .map_err(|e| SyncError::io(out_1, "write", e))?;
                    writer_2
                        .write_record(&read_2)
                        .map_err(|e| SyncError::io(out_2, "write", e))?;
                    stats.kept += 1;
                }
                (Some(Some(_)), None) => stats.filtered_1 += 1,
                (None, Some(Some(_))) => stats.filtered_2 += 1,
                (None, None) => {}
            }
        }

        let missing_1 = mates_1.resolve_missing(original, self.config.missing)?;
        let missing_2 = mates_2.resolve_missing(original, self.config.missing)?;
        stats.filtered_1 += missing_1;
        stats.filtered_2 += missing_2;
        stats.missing = missing_1 + missing_2;

        if stats.original_duplicates > 0 {
            debug!(
                "{}: skipped {} repeated identifiers",
                original.display(),
                stats.original_duplicates
            );
        }

        let finished_1 = writer_1
            .into_inner()
            .finish()
            .map_err(|e| SyncError::io(out_1, "write", e))?;
        let finished_2 = writer_2
            .into_inner()
            .finish()
            .map_err(|e| SyncError::io(out_2, "write", e))?;
        finished_1
            .persist()
            .map_err(|e| SyncError::io(out_1, "replace", e))?;
        finished_2
            .persist()
            .map_err(|e| SyncError::io(out_2, "replace", e))?;

        info!(
            "kept {} pairs, dropped {} + {} unpaired reads",
            stats.kept, stats.filtered_1, stats.filtered_2
        );
        Ok(stats)
    }
}

/// Synchronize with the default configuration
pub fn synchronize<P: AsRef<Path>>(
    original: P,
    filtered_1: P,
    filtered_2: P,
    out_1: P,
    out_2: P,
) -> Result<SyncStats> {
    Synchronizer::default().run(original, filtered_1, filtered_2, out_1, out_2)
}
