use std::path::PathBuf;

use thiserror::Error;

/// Why a [`Loader`](crate::import::Loader) could not produce a stylesheet.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("{} not found", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The loader does not fetch remote stylesheets.
    #[error("remote stylesheet {0} not fetched")]
    Remote(String),
}

impl LoadError {
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound(path)
        } else {
            LoadError::Io { path, source }
        }
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    #[error("Invalid options: {0}")]
    Options(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
