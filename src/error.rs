use thiserror::Error;

use crate::interpreter::BridgeError;

/// Top-level failures that end the program.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("python failed to load: {0}")]
    Load(#[source] BridgeError),

    #[error("unknown theme: {0}")]
    UnknownTheme(String),
}
