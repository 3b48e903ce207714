use thiserror::Error;

/// Protocol-level errors for frame and message encoding/decoding
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame length {len} exceeds maximum {max}")]
    FrameTooLarge { len: usize, max: usize },

    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Message has no `type` discriminator")]
    MissingType,

    #[error("Message is missing required field `{0}`")]
    MissingField(&'static str),
}

pub type Result<T> = std::result::Result<T, ProtocolError>;
