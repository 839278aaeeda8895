#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("not found")]
    NotFound,

    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("stream ended before the search completed")]
    StreamEnded,

    #[error("reqwest error: {0:?}")]
    Reqwest(#[from] reqwest::Error),

    #[error("json error: {0:?}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected error: {0:?}")]
    Other(#[from] anyhow::Error),
}
