// src/handlers/error.rs
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

use crate::services::pipeline::PipelineError;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub message: String,
    pub kind: &'static str,
    pub status: StatusCode,
}

impl ApiError {
    pub fn new(message: impl Into<String>, kind: &'static str, status: StatusCode) -> Self {
        ApiError {
            message: message.into(),
            kind,
            status,
        }
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(message, "internal", StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let status = match err {
            PipelineError::Input(_) => StatusCode::BAD_REQUEST,
            PipelineError::Fetch(_) => StatusCode::BAD_GATEWAY,
        };
        ApiError::new(err.to_string(), err.kind(), status)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}
