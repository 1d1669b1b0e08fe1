use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum Error {
    /// One or more of the settings needed to reach the provider are empty.
    #[error("missing required settings: {}", .missing.join(", "))]
    MissingCredentials { missing: Vec<&'static str> },

    #[error("Invalid config property: {0}")]
    InvalidConfigKey(String),

    #[error("invalid value for {key}: {reason}")]
    InvalidConfigValue {
        key: &'static str,
        reason: &'static str,
    },

    /// Network or provider failure while requesting or streaming a reply.
    #[error("completion failed: {context}")]
    CompletionFailed {
        context: String,
        #[source]
        source: BoxError,
    },

    #[error("malformed config file {} at line {line}: {content:?}", .path.display())]
    ConfigParse {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("failed to access config file {}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("terminal I/O failed")]
    Terminal(#[from] io::Error),
}

impl Error {
    pub fn completion(context: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::CompletionFailed {
            context: context.into(),
            source: source.into(),
        }
    }

    pub fn config_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }
}
