//! Plain and gzip byte streams for FASTQ input and output
//!
//! The compression of an input is decided once, when the file is opened, by
//! peeking at its first bytes. Outputs are compressed when their path ends in
//! `.gz`/`.bgz`. Outputs are staged in a temporary file next to the
//! destination and only moved into place by [`FinishedOutput::persist`].

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use log::{debug, warn};
use tempfile::NamedTempFile;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Default gzip level for compressed outputs
pub const DEFAULT_COMPRESSION_LEVEL: u32 = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Plain,
    Gzip,
}

impl Compression {
    /// Guess compression from the file extension
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        let is_gzip = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("gz") || ext.eq_ignore_ascii_case("bgz"))
            .unwrap_or(false);

        if is_gzip {
            Compression::Gzip
        } else {
            Compression::Plain
        }
    }

    /// Decide from the leading bytes of a stream. An empty stream is plain.
    pub fn from_magic(head: &[u8]) -> Self {
        if head.starts_with(&GZIP_MAGIC) {
            Compression::Gzip
        } else {
            Compression::Plain
        }
    }
}

/// Open a FASTQ input, transparently decompressing gzip/BGZF data
pub fn open_input<P: AsRef<Path>>(path: P) -> io::Result<Box<dyn BufRead>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);

    // Magic bytes decide; the extension is only used to flag surprises
    let head = reader.fill_buf()?;
    let compression = if head.len() < GZIP_MAGIC.len() {
        Compression::Plain
    } else {
        Compression::from_magic(head)
    };
    if !head.is_empty() && compression != Compression::from_path(path) {
        warn!(
            "{}: extension suggests {:?} but content is {:?}",
            path.display(),
            Compression::from_path(path),
            compression
        );
    }
    debug!("{}: opened as {:?}", path.display(), compression);

    match compression {
        Compression::Gzip => Ok(Box::new(BufReader::new(MultiGzDecoder::new(reader)))),
        Compression::Plain => Ok(Box::new(reader)),
    }
}

enum SinkWriter {
    Plain(BufWriter<NamedTempFile>),
    Gzip(GzEncoder<BufWriter<NamedTempFile>>),
}

/// Output stream staged in a temporary file beside its destination
pub struct OutputSink {
    writer: SinkWriter,
    dest: PathBuf,
}

impl OutputSink {
    pub fn create<P: AsRef<Path>>(dest: P, level: u32) -> io::Result<Self> {
        let dest = dest.as_ref().to_path_buf();
        let dir = match dest.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let temp = tempfile::Builder::new()
            .prefix(".fqsync-")
            .suffix(".tmp")
            .tempfile_in(&dir)?;
        let buffered = BufWriter::new(temp);

        let writer = match Compression::from_path(&dest) {
            Compression::Gzip => SinkWriter::Gzip(GzEncoder::new(
                buffered,
                flate2::Compression::new(level.min(9)),
            )),
            Compression::Plain => SinkWriter::Plain(buffered),
        };
        Ok(OutputSink { writer, dest })
    }

    /// Flush all buffered data and write the gzip trailer, if any.
    ///
    /// The destination is not touched until the result is persisted.
    pub fn finish(self) -> io::Result<FinishedOutput> {
        let buffered = match self.writer {
            SinkWriter::Plain(w) => w,
            SinkWriter::Gzip(enc) => enc.finish()?,
        };
        let temp = buffered.into_inner().map_err(|e| e.into_error())?;
        temp.as_file().sync_all()?;
        Ok(FinishedOutput {
            temp,
            dest: self.dest,
        })
    }
}

impl Write for OutputSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &mut self.writer {
            SinkWriter::Plain(w) => w.write(buf),
            SinkWriter::Gzip(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.writer {
            SinkWriter::Plain(w) => w.flush(),
            SinkWriter::Gzip(w) => w.flush(),
        }
    }
}

/// A complete output waiting to replace its destination
pub struct FinishedOutput {
    temp: NamedTempFile,
    dest: PathBuf,
}

impl FinishedOutput {
    /// Atomically move the staged file over the destination
    pub fn persist(self) -> io::Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(self.temp.path(), std::fs::Permissions::from_mode(0o644))?;
        }
        self.temp.persist(&self.dest).map_err(|e| e.error)?;
        Ok(())
    }
}
