//! # 인덱스 메타데이터 라우트 핸들러
//!
//! 매개변수 없이 현재 스냅샷의 정보를 돌려주는 세 엔드포인트입니다.
//!
//! ## 엔드포인트 목록
//! | 경로 | 핸들러 | 설명 |
//! |------|--------|------|
//! | /targetframeworks | `target_frameworks` | 인덱스에 있는 대상 프레임워크 목록 |
//! | /segments | `segments` | 세그먼트 메타데이터 |
//! | /stats | `stats` | 문서 수, 마지막 갱신 시각 등 인덱스 통계 |
//!
//! ## 공통 흐름
//! 1. `callback` 파라미터 검증 (잘못된 이름이면 400)
//! 2. `current()`로 현재 스냅샷을 빌림 (아직 열리지 않았으면 500)
//! 3. 서비스 연산 실행 후 `jsonp::frame`으로 JSON/JSONP 응답 생성

// ── 의존성 가져오기 ──
use super::jsonp::{self, Callback}; // 응답 프레이밍(JSON/JSONP)과 검증된 콜백 이름
use super::AppState; // 공유 상태 (SearcherManager)
use crate::{
    error::AppError, // 에러 타입 (자동으로 HTTP 에러 응답으로 변환됨)
    services,        // 쿼리 엔진 연산들과 `Params` 타입
};
use axum::{
    extract::{Query, State}, // Axum 추출자: 쿼리 문자열, 앱 상태
    response::Response,      // 프레이밍이 끝난 완성된 HTTP 응답
};

/// `/targetframeworks` → `["net45","net6.0",...]`
pub async fn target_frameworks(
    State(state): State<AppState>,
    Query(params): Query<services::Params>,
) -> Result<Response, AppError> {
    let callback = Callback::from_params(&params)?;
    // Arc<Searcher>를 잡아 두면 도중에 갱신이 일어나도 같은 스냅샷을 봅니다
    let searcher = state.searcher.current()?;
    jsonp::frame(&services::target_frameworks(&searcher).await?, &callback)
}

/// `/segments` → `[{ "name", "documentCount", ... }]`
pub async fn segments(
    State(state): State<AppState>,
    Query(params): Query<services::Params>,
) -> Result<Response, AppError> {
    let callback = Callback::from_params(&params)?;
    let searcher = state.searcher.current()?;
    jsonp::frame(&services::segments(&searcher).await?, &callback)
}

/// `/stats` → `{ "numDocs", "numPackages", "lastReopen", ... }`
pub async fn stats(
    State(state): State<AppState>,
    Query(params): Query<services::Params>,
) -> Result<Response, AppError> {
    let callback = Callback::from_params(&params)?;
    let searcher = state.searcher.current()?;
    jsonp::frame(&services::stats(&searcher).await?, &callback)
}
