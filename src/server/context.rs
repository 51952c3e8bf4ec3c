//! 共享上下文与错误类型
//!
//! 提供 handler 共享状态，以及各路由统一转换为 HTTP 响应的错误类型。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::config::PluginConfig;
use crate::server::file_api::FileApiError;

/// Handler context: immutable config shared by all requests
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: Arc<PluginConfig>,
}

impl AppContext {
    pub fn new(config: PluginConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

/// Unified application error, rendered as `{"detail": ...}` with the matching status
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<FileApiError> for AppError {
    fn from(e: FileApiError) -> Self {
        match e {
            FileApiError::PathEscape => {
                AppError::Forbidden("Requested path is outside the project root".to_string())
            }
            FileApiError::Excluded => {
                AppError::Forbidden("Access to plugin files is forbidden".to_string())
            }
            FileApiError::NotFound | FileApiError::NotADirectory => {
                AppError::NotFound("Path does not exist".to_string())
            }
            FileApiError::NotAFile => AppError::NotFound("File not found".to_string()),
            FileApiError::InvalidUtf8(_) | FileApiError::ReadFailure(_) => {
                AppError::Internal(format!("Error reading file: {}", e))
            }
        }
    }
}

/// 从 tokio JoinError 转换
impl From<tokio::task::JoinError> for AppError {
    fn from(e: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Task failed: {}", e))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
