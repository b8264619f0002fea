use std::path::PathBuf;

/// error type for kit operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("repository not found at {0}")]
    NoRepo(PathBuf),

    #[error("repository already exists at {0}")]
    RepoExists(PathBuf),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("unknown ref: {0}")]
    UnknownRef(String),

    #[error("branch already exists: {0}")]
    BranchExists(String),

    #[error("cannot delete checked-out branch: {0}")]
    BranchCheckedOut(String),

    #[error("commit has no parent")]
    NoParent,

    #[error("remote already exists: {0}")]
    RemoteExists(String),

    #[error("remote not found: {0}")]
    RemoteNotFound(String),

    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("network error: {0}")]
    Network(String),

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("corrupt repository: {0}")]
    Corruption(String),

    #[error("cbor serialization error: {0}")]
    Encode(#[from] ciborium::ser::Error<std::io::Error>),
}

pub type Result<T> = std::result::Result<T, Error>;

/// helper to wrap io errors with path context
pub trait IoResultExt<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| Error::Io {
            path: path.into(),
            source,
        })
    }
}
