use thiserror::Error;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio playback is not supported by this host")]
    Unsupported,
    #[error("failed to open {src}: {reason}")]
    Open { src: String, reason: String },
    #[error("playback failed: {0}")]
    Playback(String),
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("config field `{field}` has invalid value {value}")]
    Invalid { field: &'static str, value: f64 },
}
