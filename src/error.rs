use thiserror::Error;

pub type Result<T> = core::result::Result<T, Error>;

// Absence of content is never an error here, lookups return `None` for that.
// These only cover malformed input handed to us by callers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid name URI {uri:?}: {reason}")]
    InvalidUri { uri: String, reason: &'static str },

    #[error("bloom filter seed must be 4 bytes, got {len}")]
    InvalidBloomSeed { len: usize },

    #[error("malformed bloom filter: {0}")]
    MalformedBloom(&'static str),

    #[error("exclude literals must be strictly increasing with no adjacent fillers")]
    UnorderedExclude,
}
