//! Line sinks for the JSON adapters.

use opstats_shared::{ErrorClass, ErrorCode, ErrorEnvelope};
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// Failures raised by a [`LineSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing a line failed.
    #[error("failed to write to {sink} sink: {source}")]
    Write {
        /// Sink name.
        sink: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// Opening the sink target failed.
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl From<SinkError> for ErrorEnvelope {
    fn from(error: SinkError) -> Self {
        let message = error.to_string();
        match error {
            SinkError::Write { sink, source } => {
                Self::unexpected(ErrorCode::new("sink", "write_failed"), message, io_class(&source))
                    .with_metadata("sink", sink)
            },
            SinkError::Open { path, source } => {
                Self::unexpected(ErrorCode::new("sink", "open_failed"), message, io_class(&source))
                    .with_metadata("path", path.display().to_string())
            },
        }
    }
}

fn io_class(error: &io::Error) -> ErrorClass {
    ErrorEnvelope::from(io::Error::from(error.kind())).class
}

/// A sink that receives pre-formatted, newline-terminated lines.
pub trait LineSink: Send + Sync {
    /// Write one line.
    fn write_line(&self, line: &str) -> Result<(), SinkError>;

    /// Short name used in diagnostics.
    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Sink that writes to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrLineSink;

impl LineSink for StderrLineSink {
    fn write_line(&self, line: &str) -> Result<(), SinkError> {
        io::stderr()
            .lock()
            .write_all(line.as_bytes())
            .map_err(|source| SinkError::Write {
                sink: self.name(),
                source,
            })
    }

    fn name(&self) -> &'static str {
        "stderr"
    }
}

/// Sink that writes to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutLineSink;

impl LineSink for StdoutLineSink {
    fn write_line(&self, line: &str) -> Result<(), SinkError> {
        let mut stdout = io::stdout().lock();
        stdout
            .write_all(line.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|source| SinkError::Write {
                sink: self.name(),
                source,
            })
    }

    fn name(&self) -> &'static str {
        "stdout"
    }
}

/// Sink that appends to a file. Writers are serialized by a mutex.
#[derive(Debug)]
pub struct FileLineSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileLineSink {
    /// Open `path` for appending, creating it when missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| SinkError::Open {
                path: path.clone(),
                source,
            })?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Target path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSink for FileLineSink {
    fn write_line(&self, line: &str) -> Result<(), SinkError> {
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())
            .map_err(|source| SinkError::Write {
                sink: self.name(),
                source,
            })
    }

    fn name(&self) -> &'static str {
        "file"
    }
}
