//! Unified error type for the genohive library.
//!
//! Library code returns `HiveError`; the CLI and the config loader use
//! `anyhow::Result` for convenience.
//!
//! # Error Categories
//!
//! - **Io**: File system operations (open, create, list)
//! - **Config**: Invalid parameters (bucket count, group size, thread count)
//! - **Input**: Unusable input data (missing `id` column, null ids, schema mismatch)
//! - **Parquet**: Arrow/Parquet encoding or decoding failures
//! - **Worker**: Any of the above raised inside a pool worker
//! - **Internal**: Broken internal invariant (a bug, not bad input)

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Unified error type for the genohive library.
#[derive(Debug)]
pub enum HiveError {
    /// I/O error with path context.
    Io {
        path: PathBuf,
        operation: &'static str,
        source: std::io::Error,
    },

    /// Invalid configuration (bucket count, group size, thread count, manifest).
    Config(String),

    /// Input data that cannot be partitioned.
    Input { path: PathBuf, detail: String },

    /// Parquet or Arrow error.
    Parquet {
        context: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failure raised by a pool worker while processing one work group.
    Worker {
        label: String,
        group: usize,
        source: Box<HiveError>,
    },

    /// Internal invariant violated.
    Internal(String),
}

impl fmt::Display for HiveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HiveError::Io {
                path,
                operation,
                source,
            } => {
                write!(
                    f,
                    "I/O error during {} on '{}': {}",
                    operation,
                    path.display(),
                    source
                )
            }
            HiveError::Config(msg) => write!(f, "Configuration error: {}", msg),
            HiveError::Input { path, detail } => {
                write!(f, "Invalid input '{}': {}", path.display(), detail)
            }
            HiveError::Parquet { context, source } => {
                if let Some(src) = source {
                    write!(f, "Parquet error ({}): {}", context, src)
                } else {
                    write!(f, "Parquet error: {}", context)
                }
            }
            HiveError::Worker {
                label,
                group,
                source,
            } => write!(f, "worker {} failed on group {}: {}", label, group, source),
            HiveError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for HiveError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HiveError::Io { source, .. } => Some(source),
            HiveError::Parquet {
                source: Some(s), ..
            } => Some(s.as_ref()),
            HiveError::Worker { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

// ============================================================================
// Conversion traits
// ============================================================================

impl From<std::io::Error> for HiveError {
    fn from(err: std::io::Error) -> Self {
        HiveError::Io {
            path: PathBuf::new(),
            operation: "unknown",
            source: err,
        }
    }
}

impl From<parquet::errors::ParquetError> for HiveError {
    fn from(err: parquet::errors::ParquetError) -> Self {
        HiveError::Parquet {
            context: "parquet operation".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<arrow::error::ArrowError> for HiveError {
    fn from(err: arrow::error::ArrowError) -> Self {
        HiveError::Parquet {
            context: "arrow operation".to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// Convenience type alias for Results using HiveError.
pub type Result<T> = std::result::Result<T, HiveError>;

// ============================================================================
// Helper constructors
// ============================================================================

impl HiveError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, operation: &'static str, source: std::io::Error) -> Self {
        HiveError::Io {
            path: path.into(),
            operation,
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        HiveError::Config(msg.into())
    }

    /// Create an internal invariant error.
    pub fn internal(msg: impl Into<String>) -> Self {
        HiveError::Internal(msg.into())
    }

    /// Create an input error for a specific file.
    pub fn input(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        HiveError::Input {
            path: path.into(),
            detail: detail.into(),
        }
    }

    /// Wrap an Arrow/Parquet error with the path it happened on.
    pub fn parquet_at(
        path: impl Into<PathBuf>,
        operation: &str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        HiveError::Parquet {
            context: format!("{} '{}'", operation, path.into().display()),
            source: Some(Box::new(source)),
        }
    }

    /// Attach the worker label and group index to an error raised inside a worker.
    pub fn worker(label: impl Into<String>, group: usize, source: HiveError) -> Self {
        HiveError::Worker {
            label: label.into(),
            group,
            source: Box::new(source),
        }
    }
}

// ============================================================================
// Thread-safe error capture
// ============================================================================

/// Thread-safe error capture that stores only the first error.
///
/// Pool workers keep going after a sibling fails; the orchestrator reads the
/// captured error once every group has been processed.
pub struct FirstErrorCapture {
    has_error: AtomicBool,
    error: Mutex<Option<HiveError>>,
}

impl FirstErrorCapture {
    /// Create a new, empty error capture.
    pub fn new() -> Self {
        Self {
            has_error: AtomicBool::new(false),
            error: Mutex::new(None),
        }
    }

    /// Store an error, but only if no error has been stored yet.
    /// Returns true if this error was stored, false if an error already existed.
    pub fn store(&self, err: HiveError) -> bool {
        if self
            .has_error
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            if let Ok(mut guard) = self.error.lock() {
                *guard = Some(err);
            }
            true
        } else {
            false
        }
    }

    /// Retrieve the stored error, if any.
    pub fn get(&self) -> Option<HiveError> {
        if self.has_error.load(Ordering::SeqCst) {
            self.error.lock().ok().and_then(|mut g| g.take())
        } else {
            None
        }
    }

    /// Check if an error has been stored.
    pub fn has_error(&self) -> bool {
        self.has_error.load(Ordering::SeqCst)
    }
}

impl Default for FirstErrorCapture {
    fn default() -> Self {
        Self::new()
    }
}
