//! Error types shared by the quiz core and the front ends.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while scanning the question files.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode {path}")]
    Decode { path: PathBuf },
    #[error("no questions available")]
    Exhausted,
}

/// Errors raised by a session store backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session store unavailable: {0}")]
    Unavailable(#[from] redis::RedisError),
    #[error("session store lock poisoned: {0}")]
    Poisoned(String),
}

/// Errors that abort the handling of a single inbound event.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error(transparent)]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),
    #[error("unknown text encoding '{0}'")]
    UnknownEncoding(String),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Errors raised by the VK long poll client.
#[derive(Debug, Error)]
pub enum VkError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("VK API error {code}: {message}")]
    Api { code: i64, message: String },
    #[error("unexpected VK response: {0}")]
    UnexpectedResponse(String),
}
