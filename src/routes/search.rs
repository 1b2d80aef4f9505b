//! # 검색 API 라우트 핸들러
//!
//! ## 엔드포인트
//! | 경로 | 설명 |
//! |------|------|
//! | /query?q=키워드 | 패키지 전문검색 |
//! | /autocomplete?q=접두사 | 패키지 ID 자동완성 |
//! | /autocomplete?id=패키지 | 패키지 버전 목록 |
//!
//! 모든 엔드포인트는 `callback` 파라미터가 있으면 JSONP로 응답합니다.

use super::jsonp::{self, Callback};
use super::AppState;
use crate::{error::AppError, services};
use axum::{
    extract::{Query, State},
    http::{HeaderMap, Uri},
    response::Response,
};

/// 등록 링크에 쓸 스킴을 고릅니다.
///
/// 리버스 프록시 뒤에서는 `X-Forwarded-Proto`를 따르고,
/// 그렇지 않으면 요청 URI의 스킴, 그것도 없으면 http입니다.
fn request_scheme(headers: &HeaderMap, uri: &Uri) -> &'static str {
    let forwarded = headers
        .get("x-forwarded-proto")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim);

    match forwarded.or(uri.scheme_str()) {
        Some(scheme) if scheme.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    }
}

/// `/query`: 전문검색
pub async fn query(
    State(state): State<AppState>,
    headers: HeaderMap,
    uri: Uri,
    Query(params): Query<services::Params>,
) -> Result<Response, AppError> {
    let callback = Callback::from_params(&params)?;
    let searcher = state.searcher.current()?;
    let prefix = state
        .searcher
        .registration_base_address()
        .prefix_for(request_scheme(&headers, &uri));

    let result = services::query(&searcher, &params, &prefix).await?;
    jsonp::frame(&result, &callback)
}

/// `/autocomplete`: ID 자동완성 또는 버전 목록
pub async fn autocomplete(
    State(state): State<AppState>,
    Query(params): Query<services::Params>,
) -> Result<Response, AppError> {
    let callback = Callback::from_params(&params)?;
    let searcher = state.searcher.current()?;

    let result = services::autocomplete(&searcher, &params).await?;
    jsonp::frame(&result, &callback)
}
