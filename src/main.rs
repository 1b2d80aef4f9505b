//! # secure-search 웹 서버 진입점
//!
//! 패키지 검색 인덱스를 HTTP로 노출하는 서비스의 시작점입니다.
//!
//! 이 파일이 수행하는 작업:
//! 1. 환경변수(.env) 로딩
//! 2. 로깅(tracing) 초기화
//! 3. 설정 로딩 후 SearcherManager 생성 (로컬 또는 블롭 저장소)
//! 4. 인덱스 열기 (실패하면 요청을 받기 전에 종료)
//! 5. 주기적 갱신 타이머 시작
//! 6. 라우터 설정 및 HTTP 서버 시작
//! 7. 종료 시 타이머 정지, 인덱스 닫기

// ── 모듈 선언 ──
mod config;
mod db;
mod error;
mod index;
mod models;
mod routes;
mod services;

use anyhow::Result; // 시작 단계의 어떤 에러든 담는 범용 Result
use config::Config;
use index::{create_searcher_manager, ReopenGate};
use routes::AppState; // 모든 핸들러가 공유하는 상태 (SearcherManager)
use std::sync::Arc; // 여러 태스크가 같은 SearcherManager를 공유하기 위한 참조 카운트 포인터
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt}; // 로깅 초기화 유틸리티

#[tokio::main]
async fn main() -> Result<()> {
    // ── 1단계: 환경변수 로딩 ──
    // .env 파일이 없어도 에러 없이 넘어갑니다.
    dotenvy::dotenv().ok();

    // ── 2단계: 로깅(tracing) 초기화 ──
    // RUST_LOG가 없으면 이 크레이트와 tower_http, axum을 debug 레벨로 출력합니다.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "secure_search=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 3단계: 설정 로딩 및 SearcherManager 생성 ──
    // 설정이 잘못되었으면 `?`로 바로 종료합니다.
    let config = Config::from_env()?;
    let searcher = Arc::new(create_searcher_manager(&config)?);
    tracing::info!(
        "Using {} index source '{}'",
        searcher.source().kind(),
        searcher.source().name()
    );

    // ── 4단계: 인덱스 열기 ──
    // 첫 스냅샷을 열지 못하면 서버를 띄우지 않습니다.
    searcher.open().await?;

    // ── 5단계: 주기적 갱신 ──
    // 이전 갱신이 아직 진행 중이면 그 틱은 건너뜁니다.
    let reopen = Arc::new(ReopenGate::new(searcher.clone())).spawn(config.reopen_interval);
    tracing::info!(
        "Reopening the index every {}s",
        config.reopen_interval.as_secs()
    );

    // ── 6단계: 라우터 ──
    // 라우트 테이블과 요청 로깅 레이어는 `routes::app`에서 한 번에 만듭니다.
    // 프리플라이트(OPTIONS)도 다른 메서드와 똑같이 라우트 테이블을 거칩니다.
    let app = routes::app(AppState {
        searcher: searcher.clone(),
    });

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // ── 7단계: 정리 ──
    reopen.stop().await;
    searcher.close().await;
    tracing::info!("Server stopped");

    Ok(())
}

/// Ctrl+C를 기다립니다. 시그널 핸들러를 설치하지 못하면 바로 종료 절차로 넘어갑니다.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}
