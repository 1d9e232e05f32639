//! FASTQ records on top of `noodles::fastq`
//!
//! The reader adds what synchronization needs on top of the noodles parser:
//! record/line positions in errors, skipping of blank lines between records,
//! and strict checks that sequence and quality are printable ASCII of equal
//! length. Text after `+` on the separator line is not kept; records are
//! always written with a bare `+`.

use std::borrow::Cow;
use std::fmt;
use std::io::{self, BufRead, Write};

use noodles::fastq;
use noodles::fastq::record::Definition;

use crate::error::FastqError;
use crate::read_id::ReadId;

/// A single FASTQ record holding printable ASCII sequence and quality
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FastqRecord(fastq::Record);

impl FastqRecord {
    /// `header` is the definition line without the leading `@`
    pub fn new(header: &str, seq: &str, qual: &str) -> Self {
        let (name, description) = split_header(header);
        FastqRecord(fastq::Record::new(
            Definition::new(name.as_bytes().to_vec(), description.as_bytes().to_vec()),
            seq.as_bytes().to_vec(),
            qual.as_bytes().to_vec(),
        ))
    }

    /// Read name: the first token of the header, mate suffix included
    pub fn name(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.0.name().as_ref())
    }

    pub fn description(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.0.description().as_ref())
    }

    /// Header line without the leading `@`
    pub fn header(&self) -> String {
        let description = self.description();
        if description.is_empty() {
            self.name().into_owned()
        } else {
            format!("{} {}", self.name(), description)
        }
    }

    pub fn sequence(&self) -> &[u8] {
        self.0.sequence()
    }

    pub fn quality_scores(&self) -> &[u8] {
        self.0.quality_scores()
    }

    /// Normalized identifier used to match mates
    pub fn read_id(&self) -> ReadId {
        ReadId::from_header(&self.name())
    }

    pub fn write_to<W: Write>(&self, out: W) -> io::Result<()> {
        fastq::io::Writer::new(out).write_record(&self.0)
    }
}

impl fmt::Display for FastqRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "@{}\n{}\n+\n{}\n",
            self.header(),
            String::from_utf8_lossy(self.sequence()),
            String::from_utf8_lossy(self.quality_scores())
        )
    }
}

fn split_header(header: &str) -> (&str, &str) {
    match header.find(|c: char| c.is_ascii_whitespace()) {
        Some(i) => (&header[..i], header[i..].trim_start()),
        None => (header, ""),
    }
}

/// Checks the noodles parser leaves to the caller
fn check_record(record: &fastq::Record) -> Result<(), String> {
    let name: &[u8] = record.name().as_ref();
    let description: &[u8] = record.description().as_ref();
    if std::str::from_utf8(name).is_err() || std::str::from_utf8(description).is_err() {
        return Err("header is not valid UTF-8".to_string());
    }

    let sequence = record.sequence();
    let quality = record.quality_scores();
    if let Some(pos) = sequence.iter().position(|b| !b.is_ascii_graphic()) {
        return Err(format!(
            "sequence has invalid byte 0x{:02x} at position {}",
            sequence[pos],
            pos + 1
        ));
    }
    if let Some(pos) = quality.iter().position(|b| !b.is_ascii_graphic()) {
        return Err(format!(
            "quality has invalid byte 0x{:02x} at position {}",
            quality[pos],
            pos + 1
        ));
    }
    if sequence.len() != quality.len() {
        return Err(format!(
            "sequence length {} does not match quality length {}",
            sequence.len(),
            quality.len()
        ));
    }
    Ok(())
}

/// Streaming FASTQ reader
///
/// Yields one record at a time. Blank lines between records are skipped.
pub struct FastqReader<R: BufRead> {
    inner: R,
    /// Lines consumed so far
    line: u64,
    /// Records returned so far
    records: u64,
    done: bool,
}

impl<R: BufRead> FastqReader<R> {
    pub fn new(inner: R) -> Self {
        FastqReader {
            inner,
            line: 0,
            records: 0,
            done: false,
        }
    }

    /// Number of records returned so far
    pub fn records_read(&self) -> u64 {
        self.records
    }

    pub fn next_record(&mut self) -> Result<Option<FastqRecord>, FastqError> {
        if self.done {
            return Ok(None);
        }
        self.skip_blank_lines()?;
        let start = self.line + 1;

        let mut record = fastq::Record::default();
        let read = fastq::io::Reader::new(&mut self.inner).read_record(&mut record);
        match read {
            Ok(0) => {
                self.done = true;
                return Ok(None);
            }
            Ok(_) => {}
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::InvalidData | io::ErrorKind::UnexpectedEof
                ) =>
            {
                return Err(self.malformed(start, e.to_string()));
            }
            Err(e) => {
                self.done = true;
                return Err(e.into());
            }
        }

        if let Err(reason) = check_record(&record) {
            return Err(self.malformed(start, reason));
        }

        self.line += 4;
        self.records += 1;
        Ok(Some(FastqRecord(record)))
    }

    fn skip_blank_lines(&mut self) -> io::Result<()> {
        loop {
            let buf = self.inner.fill_buf()?;
            let n = if buf.starts_with(b"\n") {
                1
            } else if buf.starts_with(b"\r\n") {
                2
            } else {
                return Ok(());
            };
            self.inner.consume(n);
            self.line += 1;
        }
    }

    fn malformed(&mut self, line: u64, reason: String) -> FastqError {
        self.done = true;
        FastqError::Malformed {
            record: self.records + 1,
            line,
            reason,
        }
    }
}

impl<R: BufRead> Iterator for FastqReader<R> {
    type Item = Result<FastqRecord, FastqError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Writes records in 4-line form
pub struct FastqWriter<W: Write> {
    inner: W,
    records: u64,
}

impl<W: Write> FastqWriter<W> {
    pub fn new(inner: W) -> Self {
        FastqWriter { inner, records: 0 }
    }

    pub fn write_record(&mut self, record: &FastqRecord) -> io::Result<()> {
        record.write_to(&mut self.inner)?;
        self.records += 1;
        Ok(())
    }

    pub fn records_written(&self) -> u64 {
        self.records
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}
