//! Process exit codes and CLI-local failures.

use opstats_shared::{ErrorEnvelope, ErrorKind};
use thiserror::Error;

/// Process exit status for a CLI run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Ok = 0,
    Internal = 1,
    InvalidInput = 2,
    Io = 3,
}

impl ExitCode {
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Exit status for a structured error.
    ///
    /// Sink and file access failures are I/O. Other expected errors are caller
    /// input problems; invariants and unexpected failures are internal.
    #[must_use]
    pub fn for_envelope(error: &ErrorEnvelope) -> Self {
        if is_io_failure(error) {
            return Self::Io;
        }
        match error.kind {
            ErrorKind::Expected => Self::InvalidInput,
            ErrorKind::Invariant | ErrorKind::Unexpected => Self::Internal,
        }
    }
}

fn is_io_failure(error: &ErrorEnvelope) -> bool {
    let code = error.code.code();
    match error.code.namespace() {
        "sink" => true,
        "config" => code.starts_with("config_file_"),
        "core" => matches!(code, "io" | "not_found" | "permission_denied"),
        _ => false,
    }
}

/// Failures raised by the CLI layer itself, outside the envelope path.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CliError {
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self {
            Self::Io(_) => ExitCode::Io,
            Self::Serialization(_) => ExitCode::Internal,
        }
    }
}
