//! Error types for the disk cache

use std::fmt;

#[derive(Debug)]
pub enum DiskCacheError {
    /// A budget or interval setting was rejected at startup
    Config(String),
    /// The key could not be read, for whatever reason
    NotFound,
    Write {
        key: String,
        source: Box<std::io::Error>,
    },
    /// The cache root could not be listed during a sweep
    Sweep(Box<std::io::Error>),
    Io(Box<std::io::Error>),
}

impl fmt::Display for DiskCacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskCacheError::Config(msg) => write!(f, "Configuration error: {}", msg),
            DiskCacheError::NotFound => write!(f, "Item not found"),
            DiskCacheError::Write { key, source } => {
                write!(f, "Failed to write cache entry {}: {}", key, source)
            }
            DiskCacheError::Sweep(err) => write!(f, "Sweep error: {}", err),
            DiskCacheError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for DiskCacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiskCacheError::Write { source, .. } => Some(source.as_ref()),
            DiskCacheError::Sweep(err) => Some(err.as_ref()),
            DiskCacheError::Io(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DiskCacheError {
    fn from(err: std::io::Error) -> Self {
        DiskCacheError::Io(Box::new(err))
    }
}

pub type Result<T> = std::result::Result<T, DiskCacheError>;
