use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RdbError>;

#[derive(Debug, Error)]
pub enum RdbError {
    #[error("cannot read source directory {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("destination directory does not exist: {0}")]
    MissingDestinationDir(PathBuf),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A section length or offset does not fit the u32 fields of the format.
    #[error("database too large: {what} needs {value} which exceeds u32")]
    TooLarge { what: &'static str, value: usize },

    #[error("bad magic {found:?} (expected \"RDB1\")")]
    BadMagic { found: [u8; 4] },

    #[error("corrupt database: {0}")]
    Corrupt(String),

    #[error("tag worker thread panicked")]
    WorkerPanicked,
}

impl RdbError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        RdbError::Io {
            path: path.into(),
            source,
        }
    }
}
