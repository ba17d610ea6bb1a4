use thiserror::Error;

/// Caller errors detected before any external service is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown emotion bucket '{0}' (expected one of: 기쁨, 평온, 슬픔, 분노, 불안, 중립)")]
    UnknownBucket(String),
    #[error("unknown content category '{0}' (expected books, movies, music or quotes)")]
    UnknownCategory(String),
    #[error("unknown emotion label '{0}'")]
    UnknownEmotion(String),
    #[error("invalid mode '{0}' (expected T or F)")]
    InvalidMode(String),
    #[error("{0} must not be empty")]
    EmptyInput(&'static str),
}

impl CoreError {
    /// Stable machine-readable kind for error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnknownBucket(_) => "unknown_bucket",
            Self::UnknownCategory(_) => "unknown_category",
            Self::UnknownEmotion(_) => "unknown_emotion",
            Self::InvalidMode(_) => "invalid_mode",
            Self::EmptyInput(_) => "empty_input",
        }
    }
}
