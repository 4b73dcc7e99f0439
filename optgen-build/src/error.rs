use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

/// Every way an accessor generation run can fail.
///
/// None of these are recovered from; the run stops at the first one.
#[derive(Debug, Error)]
pub enum GenerateError {
    /// The source file could not be read or the output file could not be written.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source file is not valid Rust.
    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    /// No declaration carries the requested name.
    #[error("type `{name}` not found")]
    TypeNotFound { name: String },

    /// The first declaration with the requested name is not a struct.
    #[error("type `{name}` is declared as {found}, not a struct")]
    TypeMismatch { name: String, found: &'static str },

    /// A field has no name (tuple struct).
    #[error("bad name: field #{index} of `{type_name}` has no name")]
    UnnamedField { type_name: String, index: usize },

    /// A scalar field is not wrapped in `Option`, so unset and zero look alike.
    #[error("field `{field}` has scalar storage but is not declared as Option<_>")]
    MissingIndirection { field: String },

    /// A private field cannot be reached from the generated sibling module.
    #[error("field `{field}` is private; declare it `pub` or `pub(crate)` to generate accessors")]
    PrivateField { field: String },

    /// The template could not be rendered into valid Rust.
    #[error("render failed: {message}")]
    Render { message: String },

    /// An external post-processing tool could not be run or exited non-zero.
    #[error("{tool} failed{}: {stderr}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    Tool {
        tool: String,
        status: Option<ExitStatus>,
        stderr: String,
    },
}

impl GenerateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }
}

pub type Result<T, E = GenerateError> = std::result::Result<T, E>;
