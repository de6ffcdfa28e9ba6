//! Errors reported by scene-level collaborators.
//!
//! Scene, geometry, and output failures all happen single-threaded, either
//! before any worker exists or after every worker has joined. They are
//! always fatal and always name the offending path.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of an external scene collaborator (environment file, geometry
/// file, or output file).
#[derive(Debug, Error)]
pub enum SceneError {
    /// A file could not be found or opened for reading.
    #[error("Cannot open file \"{}\"", path.display())]
    Open {
        /// The file that could not be opened.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// A file was readable but its content is not usable.
    #[error("Malformed file \"{}\" at line {line}: {reason}", path.display())]
    Malformed {
        /// The offending file.
        path: PathBuf,
        /// 1-based line number of the first bad line.
        line: usize,
        /// Description of the problem.
        reason: String,
    },

    /// A required setting was never provided.
    #[error("File \"{}\" does not specify {setting}", path.display())]
    Missing {
        /// The file that should have contained the setting.
        path: PathBuf,
        /// Name of the missing setting.
        setting: &'static str,
    },

    /// The output file could not be written.
    #[error("Cannot write file \"{}\"", path.display())]
    Write {
        /// The output path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// An output operation was requested before `open_output`.
    #[error("output is not open")]
    OutputNotOpen,
}

impl SceneError {
    /// Construct an [`SceneError::Open`] for `path`.
    pub fn open(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Construct a [`SceneError::Malformed`] for `path` at `line`.
    pub fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }
}
