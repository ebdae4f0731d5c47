use thiserror::Error;

use crate::capabilities::HttpError;
use crate::captcha::CaptchaError;
use crate::config::ConfigError;

/// Why a request produced no usable payload.
///
/// `success: false` replies are not errors; they are decoded into
/// `ApiOutcome::Rejected` and shown verbatim.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(#[from] HttpError),

    #[error("server answered with HTTP {status}")]
    Status { status: u16 },

    #[error("malformed response: {reason}")]
    Malformed { reason: String },

    #[error("invalid CAPTCHA image: {0}")]
    Captcha(#[from] CaptchaError),

    #[error("cannot build request: {0}")]
    Config(#[from] ConfigError),

    #[error("incomplete search criteria: {0}")]
    Incomplete(#[from] SearchCriteriaError),
}

impl ApiError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Transport(HttpError::Timeout { .. }))
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SearchCriteriaError {
    #[error("missing {0}")]
    Missing(&'static str),
}
