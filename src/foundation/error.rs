/// Crate-wide result alias.
pub type StimResult<T> = Result<T, StimError>;

/// Errors surfaced by engine construction, configuration decoding, and presentation.
///
/// Stimulus parameter values never produce an error: out-of-range inputs are absorbed by the
/// calibration floor and the luminance clamp.
#[derive(thiserror::Error, Debug)]
pub enum StimError {
    /// Configuration values that cannot be absorbed (e.g. an inverted DPR range).
    #[error("validation error: {0}")]
    Validation(String),

    /// The output surface could not be acquired or refused a frame.
    #[error("surface error: {0}")]
    Surface(String),

    /// Rasterizer setup failure (e.g. worker pool construction).
    #[error("render error: {0}")]
    Render(String),

    /// Parameter or configuration JSON could not be decoded.
    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StimError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn surface(msg: impl Into<String>) -> Self {
        Self::Surface(msg.into())
    }

    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for StimError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}
