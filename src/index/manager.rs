//! # SearcherManager: 공유 인덱스 핸들
//!
//! 프로세스에 하나만 존재하며 모든 요청 핸들러와 주기적 갱신 작업이 공유합니다.
//!
//! - `open()`: 현재 스냅샷을 엽니다. 서버가 요청을 받기 전에 반드시 성공해야 합니다.
//! - `maybe_reopen()`: 새 스냅샷이 있으면 교체하고, 없으면 가볍게 아무것도 하지 않습니다.
//! - `current()`: 요청 처리용 `Arc<Searcher>`를 돌려줍니다.
//!
//! ## 스냅샷 고정
//! 요청은 시작할 때 잡은 `Arc<Searcher>`로 끝까지 조회합니다.
//! `Searcher`는 열릴 때 풀의 연결을 모두 미리 열어 두고 닫지 않습니다
//! (유휴 타임아웃, 수명 제한, 획득 전 검사 모두 끔). 그래서 작성기가 새 파일을
//! rename으로 덮어쓰거나 캐시 정리가 옛 파일을 지워도, 이미 열린 연결은
//! 처음 연 파일을 계속 읽습니다 (POSIX 파일 시맨틱).
//!
//! 예외: 연결 하나가 SQLite 에러로 풀에서 버려지면 다시 채워지는 연결은
//! 그 시점에 경로에 있는 파일을 엽니다.

use super::address::RegistrationBaseAddress;
use super::downloads::Downloads;
use super::gate::Refresh;
use super::source::{Generation, IndexSource, Snapshot};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::sync::Arc;

/// 스냅샷 하나가 고정해 두는 읽기 연결 수
pub const SNAPSHOT_CONNECTIONS: u32 = 4;

/// 열려 있는 인덱스 스냅샷 하나
#[derive(Debug)]
pub struct Searcher {
    /// 읽기 전용 SQLite 연결 풀
    pub pool: SqlitePool,
    pub generation: Generation,
    pub downloads: Downloads,
    /// 이 스냅샷이 열린 시각 (응답의 `lastReopen`)
    pub opened_at: DateTime<Utc>,
    pub index_name: String,
}

impl Searcher {
    async fn load(snapshot: Snapshot, index_name: String) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::new()
            .filename(&snapshot.index_path)
            .read_only(true);
        // 연결을 재활용하거나 새로 열 일이 없도록 고정 크기 풀로 만듭니다
        let pool = SqlitePoolOptions::new()
            .min_connections(SNAPSHOT_CONNECTIONS)
            .max_connections(SNAPSHOT_CONNECTIONS)
            .idle_timeout(None)
            .max_lifetime(None)
            .test_before_acquire(false)
            .connect_with(options)
            .await?;

        // 연결을 모두 동시에 잡아서 지금 경로에 있는 파일로 열리게 하고,
        // 각 연결에서 스키마를 확인합니다. 잘못된 파일이면 교체하지 않습니다.
        let mut pinned = Vec::with_capacity(SNAPSHOT_CONNECTIONS as usize);
        for _ in 0..SNAPSHOT_CONNECTIONS {
            let mut conn = pool.acquire().await?;
            sqlx::query("SELECT 1 FROM packages LIMIT 1")
                .fetch_optional(&mut *conn)
                .await?;
            pinned.push(conn);
        }
        drop(pinned);

        if snapshot.downloads.is_empty() {
            tracing::warn!("No download counts loaded, ranking by relevance only");
        }

        Ok(Self {
            pool,
            generation: snapshot.generation,
            downloads: snapshot.downloads,
            opened_at: Utc::now(),
            index_name,
        })
    }
}

#[derive(Debug)]
pub struct SearcherManager {
    source: IndexSource,
    registration_base_address: RegistrationBaseAddress,
    current: RwLock<Option<Arc<Searcher>>>,
}

impl SearcherManager {
    pub fn new(source: IndexSource, registration_base_address: RegistrationBaseAddress) -> Self {
        Self {
            source,
            registration_base_address,
            current: RwLock::new(None),
        }
    }

    pub fn source(&self) -> &IndexSource {
        &self.source
    }

    pub fn registration_base_address(&self) -> &RegistrationBaseAddress {
        &self.registration_base_address
    }

    /// 현재 스냅샷을 엽니다. 실패하면 서버를 시작하면 안 됩니다.
    pub async fn open(&self) -> Result<(), AppError> {
        let snapshot = self
            .source
            .fetch(None)
            .await?
            .ok_or_else(|| AppError::InvalidIndex("index source returned no snapshot".to_string()))?;
        let searcher = Searcher::load(snapshot, self.source.name()).await?;
        tracing::info!(
            "Opened {} search index {} (generation {})",
            self.source.kind(),
            searcher.index_name,
            searcher.generation
        );
        self.install(searcher);
        Ok(())
    }

    /// 새 세대가 있으면 교체합니다. 교체했으면 `Ok(true)`.
    ///
    /// 실패해도 이전 스냅샷은 그대로 유지됩니다.
    pub async fn maybe_reopen(&self) -> Result<bool, AppError> {
        let known = self
            .current
            .read()
            .as_ref()
            .map(|searcher| searcher.generation.clone());

        let Some(snapshot) = self.source.fetch(known.as_ref()).await? else {
            return Ok(false);
        };
        let searcher = Searcher::load(snapshot, self.source.name()).await?;
        tracing::info!("Reopened search index (generation {})", searcher.generation);
        self.install(searcher);
        Ok(true)
    }

    pub fn current(&self) -> Result<Arc<Searcher>, AppError> {
        self.current.read().clone().ok_or(AppError::IndexNotOpen)
    }

    /// 핸들을 해제합니다. 종료 시에만 호출합니다.
    pub async fn close(&self) {
        let searcher = self.current.write().take();
        if let Some(searcher) = searcher {
            searcher.pool.close().await;
        }
    }

    fn install(&self, searcher: Searcher) {
        // 이전 Searcher는 마지막 요청이 Arc를 놓을 때 해제됩니다
        *self.current.write() = Some(Arc::new(searcher));
    }
}

impl Refresh for SearcherManager {
    async fn refresh(&self) {
        match self.maybe_reopen().await {
            Ok(true) => {}
            Ok(false) => tracing::debug!("Search index unchanged"),
            Err(e) => tracing::warn!("Search index reopen failed, keeping previous snapshot: {}", e),
        }
    }
}
