use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use crate::stats::StatsError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("No data provided")]
    NoData,

    #[error(transparent)]
    Stats(#[from] StatsError),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            AppError::NoData => StatusCode::BAD_REQUEST,
            AppError::Stats(StatsError::Validation(_)) => StatusCode::BAD_REQUEST,
            AppError::Stats(StatsError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Stats(StatsError::Store(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // store details stay in the log
        let message = match &self {
            AppError::Stats(StatsError::Store(e)) => {
                error!("Store failure: {e}");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
