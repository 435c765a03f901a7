/// Errors that can occur while copying blocks.
#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    /// The copier parameters are unusable.
    #[error("invalid copy configuration: {0}")]
    InvalidConfig(String),

    /// Reading from the source failed.
    #[error("reading source: {0}")]
    Read(#[source] std::io::Error),

    /// Writing a block to the destination failed.
    #[error("writing block: {0}")]
    Write(#[source] std::io::Error),

    /// A worker thread could not be started.
    #[error("spawning copy worker: {0}")]
    Spawn(#[source] std::io::Error),

    /// The copy was cancelled before completion.
    #[error("copy cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, CopyError>;
