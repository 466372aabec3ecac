use std::fmt::Debug;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("error loading {}: {source}", .path.display())]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("error loading {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("no auth service specified ('ptc' or 'google')")]
    MissingAuthService,
    #[error("invalid auth service specified: {0:?} ('ptc' or 'google')")]
    InvalidAuthService(String),
    #[error("needs either --location-cache or --location")]
    MissingLocation,
    #[error("failed to read credentials: {0}")]
    Prompt(#[source] std::io::Error),
    #[error("bot failure: {0}")]
    Bot(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Errors caused by how the program was invoked rather than by its environment.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::MissingAuthService | Error::InvalidAuthService(_) | Error::MissingLocation
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
