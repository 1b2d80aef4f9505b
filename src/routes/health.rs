//! # 루트(헬스체크)와 폴백 핸들러
//!
//! ## 엔드포인트
//! - `/` → `200 OK`, 본문 `OK` (로드밸런서 상태 확인용, JSON 프레이밍 없음)
//! - 그 외 모든 경로 → `404`, 본문 `unrecognized`

use super::jsonp::NO_CACHE;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// `/`: 어떤 HTTP 메서드든 같은 응답을 돌려줍니다.
pub async fn root() -> Response {
    (StatusCode::OK, NO_CACHE, "OK").into_response()
}

/// 라우트 테이블에 없는 경로
pub async fn unrecognized() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "unrecognized")
}
