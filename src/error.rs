use thiserror::Error;

use crate::api::ApiError;

#[derive(Debug, Error)]
pub enum NrxError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("No input file selected. Upload an audio file first.")]
    NoArtifact,

    #[error("No style selected")]
    NoStyleSelected,

    #[error("Unknown style: {0}")]
    UnknownStyle(String),

    #[error("Remix service error: {0}")]
    Api(#[from] ApiError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_errors_convert() {
        let err: NrxError = ApiError::NotFound("Job not found".into()).into();
        assert_eq!(err.to_string(), "Remix service error: not found: Job not found");
    }

    #[test]
    fn unknown_style_display() {
        let err = NrxError::UnknownStyle("polka".into());
        assert_eq!(err.to_string(), "Unknown style: polka");
    }
}
