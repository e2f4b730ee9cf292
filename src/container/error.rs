use std::path::PathBuf;

/// Errors reported by container handles and resolvers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("container `{0}` does not exist")]
    NotFound(String),
    #[error("invalid container name: {0}")]
    InvalidName(String),
    #[error("failed to read `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Open(#[from] crate::fsutil::FileOpenError),
}

pub type Result<T> = std::result::Result<T, Error>;
