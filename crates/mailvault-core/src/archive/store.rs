//! Archive handles and the store that opens them.

use std::fmt::Display;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};

use super::{ArchiveConfig, ArchiveError, Clock, MetaField, SystemClock};

/// Format of the `TIME=` metadata value.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Suffix of the metadata file.
const META_SUFFIX: &str = "meta";

/// One buffered output file.
#[derive(Debug)]
struct Stream {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl Stream {
    fn create(path: PathBuf) -> Result<Self, ArchiveError> {
        match File::create(&path) {
            Ok(file) => Ok(Self {
                path,
                writer: BufWriter::new(file),
            }),
            Err(source) => Err(ArchiveError::CreateFile { path, source }),
        }
    }

    fn write_line(&mut self, line: &[u8]) -> io::Result<()> {
        self.writer.write_all(line)?;
        self.writer.write_all(b"\n")
    }

    fn close(mut self) -> Result<(), ArchiveError> {
        self.writer
            .flush()
            .map_err(|source| ArchiveError::Flush {
                path: self.path,
                source,
            })
    }
}

/// Writes one line, dropping the stream on failure so later writes are
/// no-ops.
fn append(slot: &mut Option<Stream>, line: &[u8]) {
    let Some(stream) = slot.as_mut() else {
        return;
    };

    if let Err(e) = stream.write_line(line) {
        tracing::error!(path = %stream.path.display(), error = %e, "Archive write failed");
        *slot = None;
    }
}

/// Creates `dir` (and parents) unless it already exists as a directory.
fn ensure_dir(dir: &Path) -> Result<(), ArchiveError> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => Err(ArchiveError::NotADirectory(dir.to_path_buf())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            fs::create_dir_all(dir).map_err(|source| ArchiveError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })
        }
        Err(source) => Err(ArchiveError::CreateDir {
            path: dir.to_path_buf(),
            source,
        }),
    }
}

/// On-disk representation of one message: a content stream and a metadata
/// stream, opened and closed together.
///
/// Writes on a handle that is closed, or that never opened, do nothing.
#[derive(Debug)]
pub struct Archive {
    name: String,
    content: Option<Stream>,
    meta: Option<Stream>,
}

impl Archive {
    /// Opens the content and metadata files for `name` in the bucket for
    /// `now`, and writes the `DATAFILE` and `TIME` metadata lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket directory or either file cannot be
    /// created. No stream is left open in that case.
    pub fn open(
        config: &ArchiveConfig,
        name: &str,
        now: &DateTime<FixedOffset>,
    ) -> Result<Self, ArchiveError> {
        let dir = config.bucket(now)?;
        ensure_dir(&dir)?;

        let file_name = format!("{name}.{}", now.timestamp());
        let content = Stream::create(dir.join(&file_name))?;
        let meta = Stream::create(dir.join(format!("{file_name}.{META_SUFFIX}")))?;

        let mut archive = Self {
            name: name.to_string(),
            content: Some(content),
            meta: Some(meta),
        };
        archive.write_meta(MetaField::DataFile, &file_name);
        archive.write_meta(MetaField::Time, now.format(TIME_FORMAT));

        tracing::debug!(path = %dir.join(&file_name).display(), "Opened archive");
        Ok(archive)
    }

    /// Creates a handle that discards everything.
    ///
    /// Used when [`Archive::open`] failed so the transaction can go on.
    #[must_use]
    pub fn disabled(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: None,
            meta: None,
        }
    }

    /// Returns the archive name (`<session>.<message>`).
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true while either stream is still open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.content.is_some() || self.meta.is_some()
    }

    /// Returns the content file path while it is open.
    #[must_use]
    pub fn content_path(&self) -> Option<&Path> {
        self.content.as_ref().map(|s| s.path.as_path())
    }

    /// Returns the metadata file path while it is open.
    #[must_use]
    pub fn meta_path(&self) -> Option<&Path> {
        self.meta.as_ref().map(|s| s.path.as_path())
    }

    /// Appends a newline-terminated content line, byte for byte.
    pub fn write_content(&mut self, line: impl AsRef<[u8]>) {
        append(&mut self.content, line.as_ref());
    }

    /// Appends a `KEY=VALUE` metadata line.
    pub fn write_meta(&mut self, field: MetaField, value: impl Display) {
        append(&mut self.meta, format!("{field}={value}").as_bytes());
    }

    /// Flushes and closes both streams. Calling it again does nothing.
    ///
    /// # Errors
    ///
    /// Returns the first flush failure. Both streams are closed regardless.
    pub fn close(&mut self) -> Result<(), ArchiveError> {
        let content = self.content.take().map_or(Ok(()), Stream::close);
        let meta = self.meta.take().map_or(Ok(()), Stream::close);
        content.and(meta)
    }
}

/// Opens archives under a fixed configuration.
#[derive(Debug)]
pub struct ArchiveStore {
    config: ArchiveConfig,
    clock: Box<dyn Clock>,
}

impl ArchiveStore {
    /// Creates a store that uses the system clock.
    #[must_use]
    pub fn new(config: ArchiveConfig) -> Self {
        Self::with_clock(config, SystemClock)
    }

    /// Creates a store with a custom clock.
    #[must_use]
    pub fn with_clock(config: ArchiveConfig, clock: impl Clock + 'static) -> Self {
        Self {
            config,
            clock: Box::new(clock),
        }
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    /// Opens an archive named `name` at the current time.
    ///
    /// # Errors
    ///
    /// See [`Archive::open`].
    pub fn open(&self, name: &str) -> Result<Archive, ArchiveError> {
        Archive::open(&self.config, name, &self.clock.now())
    }
}
