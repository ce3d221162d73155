use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("alpha API error (code {code}): {msg}")]
    AlphaApi { code: String, msg: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
