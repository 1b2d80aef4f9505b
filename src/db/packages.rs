//! # 패키지 조회 쿼리
//!
//! 검색 결과를 채우는 데 필요한 버전 정보와 자동완성용 ID 목록을 조회합니다.
//!
//! 모든 조회는 목록 공개(`listed = 1`) 버전만 보고, `include_prerelease`가 false이면
//! 프리릴리스 버전도 뺍니다. `(? OR is_prerelease = 0)`은 바인딩된 불리언 하나로
//! 조건 전체를 켜고 끄는 SQL 관용구입니다.

use crate::error::AppError; // sqlx 에러는 `?`로 AppError::Database가 됩니다
use crate::models::{PackageVersion, VersionRow}; // FromRow 구조체
use sqlx::{QueryBuilder, Sqlite, SqlitePool}; // QueryBuilder: 동적 SQL 조립 (바인딩 유지)
use std::collections::HashMap;

const PACKAGE_COLUMNS: &str = "id, version, title, description, summary, authors, tags, \
     icon_url, project_url, license_url, published, is_prerelease";

/// 여러 패키지의 대표 버전을 한 번의 쿼리로 조회합니다.
///
/// 작성기가 표시한 최신 플래그(`is_latest` / `is_latest_stable`)를 우선하고,
/// 플래그가 없으면 가장 최근에 게시된 버전을 고릅니다.
/// 조건에 맞는 버전이 하나도 없는 ID는 결과에 없습니다.
///
/// ## 윈도우 함수
/// `ROW_NUMBER() OVER (PARTITION BY id ORDER BY ...)`는 ID별로 행에 순번을 매깁니다.
/// 순번이 1인 행만 남기면 "ID마다 가장 앞선 버전 하나"가 됩니다.
pub async fn get_latest_versions(
    pool: &SqlitePool,
    ids: &[&str],
    include_prerelease: bool,
) -> Result<HashMap<String, PackageVersion>, AppError> {
    // `IN ()`은 SQL 문법 에러이므로 빈 목록은 바로 반환
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    // QueryBuilder: 개수가 정해지지 않은 `?` 자리표시자를 안전하게 이어 붙입니다
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT ");
    builder
        .push(PACKAGE_COLUMNS)
        .push(" FROM (SELECT *, ROW_NUMBER() OVER (PARTITION BY id ORDER BY (CASE WHEN ")
        .push_bind(include_prerelease)
        .push(" THEN is_latest ELSE is_latest_stable END) DESC, published DESC) AS version_rank")
        .push(" FROM packages WHERE listed = 1 AND (")
        .push_bind(include_prerelease)
        .push(" OR is_prerelease = 0) AND id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(")) WHERE version_rank = 1");

    let packages = builder
        .build_query_as::<PackageVersion>()
        .fetch_all(pool)
        .await?;

    Ok(packages
        .into_iter()
        .map(|package| (package.id.clone(), package))
        .collect())
}

/// 여러 패키지의 목록 공개 버전을 한 번의 쿼리로 조회해서 ID별로 묶습니다.
///
/// 각 목록은 게시 순서대로 정렬됩니다. ID는 정확히 일치해야 합니다.
pub async fn list_versions_by_id(
    pool: &SqlitePool,
    ids: &[&str],
    include_prerelease: bool,
) -> Result<HashMap<String, Vec<String>>, AppError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT id, version FROM packages WHERE listed = 1 AND (",
    );
    builder
        .push_bind(include_prerelease)
        .push(" OR is_prerelease = 0) AND id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(*id);
    }
    separated.push_unseparated(") ORDER BY id, published, version");

    let rows: Vec<(String, String)> = builder.build_query_as().fetch_all(pool).await?;

    // 행이 ID 순으로 오므로 같은 ID의 버전은 게시 순서를 유지한 채 모입니다
    let mut by_id: HashMap<String, Vec<String>> = HashMap::new();
    for (id, version) in rows {
        by_id.entry(id).or_default().push(version);
    }
    Ok(by_id)
}

/// 패키지의 목록 공개 버전을 게시 순서대로 조회합니다.
///
/// ID는 대소문자를 구분하지 않습니다.
pub async fn list_versions(
    pool: &SqlitePool,
    id: &str,
    include_prerelease: bool,
) -> Result<Vec<String>, AppError> {
    let rows = sqlx::query_as::<_, VersionRow>(
        r#"
        SELECT version
        FROM packages
        WHERE id = ? COLLATE NOCASE AND listed = 1 AND (? OR is_prerelease = 0)
        ORDER BY published, version
        "#,
    )
    .bind(id)
    .bind(include_prerelease)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(|row| row.version).collect())
}

/// ID가 `prefix`로 시작하는 패키지 ID 목록 (대소문자 무시)
pub async fn list_ids_with_prefix(
    pool: &SqlitePool,
    prefix: &str,
    include_prerelease: bool,
) -> Result<Vec<String>, AppError> {
    // 사용자가 입력한 `%`, `_`가 와일드카드로 해석되지 않게 이스케이프한 뒤 `%`를 붙입니다
    let pattern = format!("{}%", escape_like(prefix));
    let ids: Vec<(String,)> = sqlx::query_as(
        r#"
        SELECT DISTINCT id
        FROM packages
        WHERE listed = 1 AND (? OR is_prerelease = 0) AND id LIKE ? ESCAPE '\'
        "#,
    )
    .bind(include_prerelease)
    .bind(pattern)
    .fetch_all(pool)
    .await?;

    Ok(ids.into_iter().map(|(id,)| id).collect())
}

/// LIKE 패턴의 특수문자(`%`, `_`, `\`)를 이스케이프합니다.
fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
