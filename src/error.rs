//! # 에러 처리 모듈
//!
//! 검색 서비스에서 발생할 수 있는 에러 타입을 정의합니다.
//!
//! 이 모듈의 핵심:
//! - `AppError` 열거형(enum): 쿼리/인덱스/저장소 에러를 하나의 타입으로 통합
//! - `IntoResponse` 구현: 에러를 HTTP 응답으로 자동 변환
//!
//! 쿼리 엔진에서 올라온 실패는 모두 500과 일반적인 메시지로 변환됩니다.
//! 실제 원인은 로그에만 남깁니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::config::ConfigError;

/// 요청 처리와 인덱스 관리 중 발생하는 에러
///
/// 핸들러에서 `Result<T, AppError>`를 반환하면,
/// Axum이 자동으로 `IntoResponse`를 호출하여 HTTP 응답으로 변환합니다.
#[derive(Debug, Error)]
pub enum AppError {
    /// 잘못된 요청 (HTTP 400): 현재는 JSONP 콜백 이름 검증 실패에만 사용
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// `open()`이 아직 성공하지 않은 상태에서 조회를 시도함
    #[error("Search index is not open")]
    IndexNotOpen,

    /// 인덱스 스냅샷이나 데이터 파일의 형식이 잘못됨
    #[error("Invalid index data: {0}")]
    InvalidIndex(String),

    /// SQLite(인덱스 스냅샷) 조회 오류
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// 파일 입출력 오류
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 블롭 저장소 HTTP 요청 오류
    #[error("Storage error: {0}")]
    Storage(#[from] reqwest::Error),

    /// JSON 직렬화/역직렬화 오류
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// 설정 에러: 시작 단계에서만 발생합니다
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl IntoResponse for AppError {
    /// AppError를 HTTP 응답으로 변환합니다.
    ///
    /// 400을 제외한 모든 에러는 500으로 통일합니다.
    /// 내부 에러 내용은 로그에만 기록하고, 클라이언트에는 일반적인 메시지만 반환합니다.
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            AppError::BadRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", msg.clone())
            }
            AppError::IndexNotOpen => {
                tracing::error!("Query attempted before the search index was opened");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "index_not_open",
                    "The search index is not available".to_string(),
                )
            }
            AppError::Database(ref e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "A database error occurred".to_string(),
                )
            }
            AppError::InvalidIndex(_)
            | AppError::Io(_)
            | AppError::Storage(_)
            | AppError::Json(_)
            | AppError::Config(_) => {
                tracing::error!("Internal error: {}", self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                )
            }
        };

        // 결과: { "error": { "code": "bad_request", "message": "..." } }
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_keeps_its_message_and_status() {
        let response = AppError::BadRequest("nope".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn engine_failures_map_to_internal_server_error() {
        let errors = [
            AppError::IndexNotOpen,
            AppError::InvalidIndex("truncated".to_string()),
            AppError::Database(sqlx::Error::RowNotFound),
            AppError::Io(std::io::Error::other("disk gone")),
        ];
        for error in errors {
            assert_eq!(
                error.into_response().status(),
                StatusCode::INTERNAL_SERVER_ERROR
            );
        }
    }
}
