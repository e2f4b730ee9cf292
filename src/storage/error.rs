#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no stats stored for container `{0}`")]
    UnknownContainer(String),
    #[error("storage backend failure: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type Result<T> = std::result::Result<T, Error>;
