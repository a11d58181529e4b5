use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
/// Errors returned by this crate.
pub enum SvnConfigError {
    /// An I/O error occurred while reading or writing a file.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// A record file ended in the middle of its content after at least one
    /// complete record had been decoded.
    #[error("corrupted record file: {}", path.display())]
    Corrupt {
        /// The file being decoded.
        path: PathBuf,
    },
    /// A `K <len>` or `V <len>` header carried a length that could not be parsed.
    #[error("invalid length {token:?} in {}", path.display())]
    InvalidLength {
        /// The file being decoded.
        path: PathBuf,
        /// The raw length token.
        token: String,
    },
    /// A record file did not have the expected shape.
    #[error("malformed record file {}: {message}", path.display())]
    Malformed {
        /// The file being decoded.
        path: PathBuf,
        /// What was wrong.
        message: String,
    },
    /// The provided repository URL is syntactically invalid.
    #[error("invalid repository url: {0}")]
    InvalidUrl(String),
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What kind of operation an absorbed failure happened in.
pub enum DiagnosticKind {
    /// Reading or parsing a configuration file.
    Load,
    /// Writing a configuration file.
    Store,
    /// Resolving a repository URL.
    Url,
}

#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq)]
/// A failure that was logged and absorbed instead of being returned.
///
/// Configuration sync is best effort: a file that cannot be read degrades to
/// an empty document, a file that cannot be written is skipped. Each such
/// event is kept as a diagnostic so callers can still observe it.
pub struct ConfigDiagnostic {
    /// The file (or URL, for [`DiagnosticKind::Url`]) involved.
    pub path: PathBuf,
    /// The failing operation.
    pub kind: DiagnosticKind,
    /// Human-readable error message.
    pub message: String,
}

impl ConfigDiagnostic {
    pub(crate) fn new(path: impl Into<PathBuf>, kind: DiagnosticKind, err: impl ToString) -> Self {
        Self {
            path: path.into(),
            kind,
            message: err.to_string(),
        }
    }
}

impl std::fmt::Display for ConfigDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self.kind {
            DiagnosticKind::Load => "load",
            DiagnosticKind::Store => "store",
            DiagnosticKind::Url => "url",
        };
        write!(f, "{op} {}: {}", self.path.display(), self.message)
    }
}

/// A value produced by a best-effort operation, together with the failure
/// (if any) that was absorbed while producing it.
#[derive(Clone, Debug)]
pub struct Loaded<T> {
    /// The produced value. Empty or default when `diagnostic` is set.
    pub value: T,
    /// The absorbed failure.
    pub diagnostic: Option<ConfigDiagnostic>,
}

impl<T> Loaded<T> {
    pub(crate) fn ok(value: T) -> Self {
        Self {
            value,
            diagnostic: None,
        }
    }

    pub(crate) fn degraded(value: T, diagnostic: ConfigDiagnostic) -> Self {
        Self {
            value,
            diagnostic: Some(diagnostic),
        }
    }
}
