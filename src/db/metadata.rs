//! # 인덱스 메타데이터 쿼리
//!
//! `/targetframeworks`, `/segments`, `/stats`가 사용하는 매개변수 없는 조회들입니다.
//! 모든 함수는 스냅샷의 읽기 전용 `SqlitePool` 참조를 받아 비동기로 실행됩니다.
//!
//! ## 테이블 구조
//! - `package_frameworks`: 패키지 버전별 대상 프레임워크 (id, version, framework)
//! - `segments`: 작성기가 기록한 세그먼트 정보
//! - `commit_metadata`: 작성기가 남긴 키/값 쌍 (stats의 `commitUserData`)

use crate::error::AppError;
use crate::models::{CommitMetadata, Segment};
use sqlx::SqlitePool;

/// 인덱스에 등장하는 대상 프레임워크를 중복 없이 이름순으로 조회합니다.
///
/// 한 컬럼만 읽을 때는 구조체 대신 1-튜플 `(String,)`로 받으면 됩니다.
pub async fn list_target_frameworks(pool: &SqlitePool) -> Result<Vec<String>, AppError> {
    let rows: Vec<(String,)> =
        sqlx::query_as("SELECT DISTINCT framework FROM package_frameworks ORDER BY framework")
            .fetch_all(pool)
            .await?;

    // 튜플을 풀어서 문자열 목록으로
    Ok(rows.into_iter().map(|(framework,)| framework).collect())
}

/// 세그먼트 목록을 이름순으로 조회합니다.
///
/// `Segment`는 `#[serde(rename_all = "camelCase")]`이므로
/// `document_count` 컬럼이 응답에서는 `documentCount`가 됩니다.
pub async fn list_segments(pool: &SqlitePool) -> Result<Vec<Segment>, AppError> {
    let segments = sqlx::query_as::<_, Segment>(
        "SELECT name, document_count, deleted_count, size_bytes, created_at FROM segments ORDER BY name",
    )
    .fetch_all(pool)
    .await?;

    Ok(segments)
}

pub async fn list_commit_metadata(pool: &SqlitePool) -> Result<Vec<CommitMetadata>, AppError> {
    let rows = sqlx::query_as::<_, CommitMetadata>(
        "SELECT key, value FROM commit_metadata ORDER BY key",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// (문서 수, 서로 다른 패키지 ID 수)
///
/// 문서 하나는 패키지 버전 하나입니다. 목록에서 내린(unlisted) 버전도 셉니다.
/// 집계 쿼리는 항상 한 행을 돌려주므로 `fetch_one`을 씁니다.
pub async fn count_documents(pool: &SqlitePool) -> Result<(i64, i64), AppError> {
    let counts: (i64, i64) =
        sqlx::query_as("SELECT COUNT(*), COUNT(DISTINCT id) FROM packages")
            .fetch_one(pool)
            .await?;

    Ok(counts)
}
