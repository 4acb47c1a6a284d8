//! Server startup errors

use thiserror::Error;

pub type ServerResult<T> = std::result::Result<T, ServerError>;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment error: {0}")]
    Env(#[from] foodfacts_common::CommonError),
}

impl ServerError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
