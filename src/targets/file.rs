//! File target with size-based rotation
//!
//! Backups are named `<file>.1` (newest) through `<file>.<backup_count>`,
//! with a `.gz` suffix when compression is enabled.

use super::worker::{Sink, Worker, DEFAULT_QUEUE_CAPACITY};
use crate::core::{Entry, ErrorWriter, Filter, LoggerError, Record, Result, Target};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

const DEFAULT_MAX_BYTES: u64 = 1 << 20;
const DEFAULT_BACKUP_COUNT: usize = 10;

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FileTarget {
    pub path: PathBuf,
    pub filter: Filter,
    /// Rotate once the file would grow past `max_bytes`
    pub rotate: bool,
    pub max_bytes: u64,
    /// Backups to keep; zero truncates the file instead
    pub backup_count: usize,
    /// Gzip each backup as it is rotated out
    pub compress: bool,
    pub queue_capacity: usize,
    #[serde(skip)]
    worker: Option<Worker>,
}

impl Default for FileTarget {
    fn default() -> Self {
        Self {
            path: PathBuf::new(),
            filter: Filter::default(),
            rotate: true,
            max_bytes: DEFAULT_MAX_BYTES,
            backup_count: DEFAULT_BACKUP_COUNT,
            compress: false,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            worker: None,
        }
    }
}

impl FileTarget {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_rotation(mut self, max_bytes: u64, backup_count: usize) -> Self {
        self.rotate = true;
        self.max_bytes = max_bytes;
        self.backup_count = backup_count;
        self
    }

    #[must_use]
    pub fn without_rotation(mut self) -> Self {
        self.rotate = false;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, enabled: bool) -> Self {
        self.compress = enabled;
        self
    }

    #[must_use]
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }
}

impl Target for FileTarget {
    fn name(&self) -> &str {
        "file"
    }

    fn open(&mut self, errors: ErrorWriter) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(LoggerError::file_target("", "file path must be set"));
        }
        if self.rotate && self.max_bytes == 0 {
            return Err(LoggerError::config("FileTarget", "max_bytes must be positive"));
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let sink = FileSink::open(self)?;
        self.worker = Some(Worker::spawn("file", self.queue_capacity, sink, errors)?);
        Ok(())
    }

    fn process(&mut self, record: Record) {
        let Some(worker) = self.worker.as_mut() else {
            return;
        };
        match record {
            Record::Entry(entry) => {
                if self.filter.allows(&entry) {
                    worker.submit(entry);
                }
            }
            Record::Flush => worker.drain(),
        }
    }

    fn close(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.join();
        }
    }
}

struct FileSink {
    path: PathBuf,
    rotate: bool,
    max_bytes: u64,
    backup_count: usize,
    compress: bool,
    writer: Option<BufWriter<File>>,
    current_size: u64,
}

impl FileSink {
    fn open(target: &FileTarget) -> Result<Self> {
        let (file, current_size) = open_locked(&target.path)?;
        Ok(Self {
            path: target.path.clone(),
            rotate: target.rotate,
            max_bytes: target.max_bytes,
            backup_count: target.backup_count,
            compress: target.compress,
            writer: Some(BufWriter::new(file)),
            current_size,
        })
    }

    fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    fn backup_path(&self, index: usize, compressed: bool) -> PathBuf {
        let filename = self
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("app.log");
        let suffix = if compressed { ".gz" } else { "" };
        self.path.with_file_name(format!("{}.{}{}", filename, index, suffix))
    }

    fn rotate(&mut self) -> Result<()> {
        // Dropping the writer closes the file and releases its lock
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.display_path(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }

        if self.backup_count == 0 {
            fs::remove_file(&self.path).map_err(|e| {
                LoggerError::file_rotation(self.display_path(), format!("Failed to truncate: {}", e))
            })?;
        } else {
            for compressed in [false, true] {
                let oldest = self.backup_path(self.backup_count, compressed);
                if oldest.exists() {
                    fs::remove_file(&oldest).map_err(|e| {
                        LoggerError::file_rotation(
                            oldest.display().to_string(),
                            format!("Failed to remove oldest backup: {}", e),
                        )
                    })?;
                }
            }

            for i in (1..self.backup_count).rev() {
                for compressed in [false, true] {
                    let old_path = self.backup_path(i, compressed);
                    if old_path.exists() {
                        let new_path = self.backup_path(i + 1, compressed);
                        fs::rename(&old_path, &new_path).map_err(|e| {
                            LoggerError::file_rotation(
                                old_path.display().to_string(),
                                format!("Failed to rotate backup files: {}", e),
                            )
                        })?;
                    }
                }
            }

            let backup = self.backup_path(1, false);
            fs::rename(&self.path, &backup).map_err(|e| {
                LoggerError::file_rotation(
                    self.display_path(),
                    format!("Failed to rotate current log file: {}", e),
                )
            })?;

            if self.compress {
                compress_file(&backup, &self.backup_path(1, true))?;
            }
        }

        let (file, size) = open_locked(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        self.current_size = size;
        Ok(())
    }
}

impl Sink for FileSink {
    fn write(&mut self, entry: &Entry) -> Result<()> {
        let mut line = entry.output().to_string();
        line.push('\n');
        let len = line.len() as u64;

        if self.rotate && self.current_size > 0 && self.current_size + len > self.max_bytes {
            if let Err(e) = self.rotate() {
                // Keep writing to whatever file we can get rather than losing entries
                if self.writer.is_none() {
                    let (file, size) = open_locked(&self.path)?;
                    self.writer = Some(BufWriter::new(file));
                    self.current_size = size;
                }
                return Err(e);
            }
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| LoggerError::writer("File writer not initialized"))?;
        writer.write_all(line.as_bytes()).map_err(|e| {
            LoggerError::file_target(
                self.path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;
        self.current_size += len;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
            let file = writer.get_ref();
            file.sync_all()?;
            let _ = FileExt::unlock(file);
        }
        Ok(())
    }
}

/// Open for appending and take an exclusive advisory lock
fn open_locked(path: &Path) -> Result<(File, u64)> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| {
            LoggerError::file_target(path.display().to_string(), format!("Failed to open: {}", e))
        })?;

    file.try_lock_exclusive()
        .map_err(|_| LoggerError::file_lock(path.display().to_string()))?;

    let size = file
        .metadata()
        .map_err(|e| {
            LoggerError::file_target(
                path.display().to_string(),
                format!("Cannot access file metadata: {}", e),
            )
        })?
        .len();
    Ok((file, size))
}

/// Gzip `source` into `destination`, removing `source` only once the archive is complete
fn compress_file(source: &Path, destination: &Path) -> Result<()> {
    let temp = destination.with_extension("gz.tmp");

    let result = (|| -> io::Result<()> {
        let mut reader = BufReader::with_capacity(64 * 1024, File::open(source)?);
        let output = BufWriter::with_capacity(64 * 1024, File::create(&temp)?);
        let mut encoder = flate2::write::GzEncoder::new(output, flate2::Compression::default());
        io::copy(&mut reader, &mut encoder)?;
        encoder.finish()?.flush()?;
        fs::rename(&temp, destination)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&temp);
        return Err(LoggerError::io_operation(
            "compress log file",
            format!("Failed to compress '{}'", source.display()),
            e,
        ));
    }

    fs::remove_file(source).map_err(|e| {
        LoggerError::io_operation(
            "compress log file",
            format!("Compressed but failed to remove '{}'", source.display()),
            e,
        )
    })
}
