use crate::protocol::ProtocolError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Socket error: {0}")]
    Socket(String),

    #[error("Not connected; call connect() first")]
    NotConnected,
}

pub type Result<T> = std::result::Result<T, ClientError>;
