use thiserror::Error;

/// Errors raised by the spectrogram engine.
///
/// Every variant is terminal for the invocation that produced it; nothing in
/// the engine retries or substitutes a fallback.
#[derive(Debug, Error)]
pub enum Error {
    /// The audio container could not be identified or decoded.
    #[error("unsupported audio format: {0}")]
    UnsupportedFormat(String),
    /// Decoding succeeded but produced no samples.
    #[error("audio contains no samples")]
    EmptyAudio,
    /// Transform or loader parameters are out of range.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
    #[error("unknown theme: {0}")]
    UnknownTheme(String),
    /// A registration tried to change the coordinate system of an existing theme.
    #[error("theme {0} is already registered with a different coordinate system")]
    ThemeConflict(String),
    #[error("render error: {0}")]
    Render(String),
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
    #[error("theme definition error: {0}")]
    ThemeDefinition(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias so callers can write `Result<T>` instead of `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
