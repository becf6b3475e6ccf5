/// Result alias that carries the custom [`LuminaError`] type.
pub type Result<T> = std::result::Result<T, LuminaError>;

/// Common error type for the core crate.
#[derive(Debug, thiserror::Error)]
pub enum LuminaError {
    /// Free-form error used by callers that only need a readable message.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// Preset files that fail to parse or serialize.
    #[error("preset: {0}")]
    Preset(#[from] serde_json::Error),
    /// Forward FFT failures from the spectrum processor.
    #[error("fft: {0}")]
    Fft(#[from] realfft::FftError),
    /// Caller handed the engine data it cannot work with.
    #[error("invalid input: {0}")]
    InvalidInput(&'static str),
    /// The audio input device could not be acquired at enable time. The
    /// engine stays disabled; nothing in the tick path raises this.
    #[error("audio capture unavailable: {0}")]
    CaptureUnavailable(String),
}

impl LuminaError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for LuminaError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for LuminaError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
