use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum PadaError {
    #[error("bitrate ladder is empty")]
    EmptyLadder,
    #[error("bitrate {bitrate} at index {index} is not positive")]
    InvalidBitrate { index: usize, bitrate: u64 },
    #[error("rules context is missing collaborator: {0}")]
    MissingCollaborator(&'static str),
    #[error("invalid options: {0}")]
    InvalidOptions(String),
    #[error("invalid adaptation state: {0}")]
    InvalidState(String),
}

pub type PadaResult<T> = Result<T, PadaError>;
