use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(
        "sample has {have} keys but {shards} shards x {samples_per_shard} samples per shard need {need}"
    )]
    InsufficientSample {
        have: usize,
        need: usize,
        shards: usize,
        samples_per_shard: usize,
    },

    #[error("partitioner queried before boundaries were loaded")]
    NotReady,

    #[error("partitioner boundaries are already loaded")]
    AlreadyConfigured,

    #[error("malformed boundary file at line {line}: {reason}")]
    MalformedBoundaryFile { line: usize, reason: String },

    #[error("key {0:?} contains a newline and can't be stored in a boundary file")]
    InvalidKey(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("can't parse config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("can't serialize job summary: {0}")]
    Summary(#[from] serde_json::Error),

    #[error("task failed: {0}")]
    Task(String),
}
