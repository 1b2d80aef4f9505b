//! # FTS5 전문검색(Full-Text Search) 모듈
//!
//! 인덱스 스냅샷의 `packages_fts` 가상 테이블로 패키지를 검색합니다.
//!
//! ## 외부 콘텐츠 테이블(External Content Table) 구조
//! `packages_fts`는 `content='packages'`로 만들어져 있어서
//! 검색(MATCH)은 FTS5 자체 인덱스를 쓰고, 컬럼 값은 `packages` 테이블에서 읽습니다.
//! 두 테이블은 `rowid`로 연결됩니다.
//!
//! ## 검색어 변환
//! 사용자가 입력한 `q`를 그대로 MATCH에 넣으면 `json.net`처럼 점이 들어간 단어에서
//! FTS5 문법 에러가 납니다. 그래서 각 단어를 큰따옴표로 감싼 구문(phrase)으로 바꿉니다.
//! - `json` → `"json"*` (접두사 검색)
//! - `id:Newtonsoft.Json` → `id : "Newtonsoft.Json"` (특정 컬럼만)
//! - 여러 단어는 AND로 연결

use crate::error::AppError; // 에러 타입 (sqlx 에러는 `?`로 자동 변환)
use sqlx::SqlitePool; // 스냅샷의 읽기 전용 연결 풀

/// 검색 결과 한 행: 같은 패키지의 여러 버전이 각각 나올 수 있습니다.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchHit {
    pub id: String,
    /// BM25 점수. 작을수록(음수) 관련도가 높습니다. 검색어가 없으면 0.
    pub rank: f64,
}

/// 검색 필터
#[derive(Debug, Clone, Default)]
pub struct SearchFilter<'a> {
    pub include_prerelease: bool,
    /// 정확히 일치하는 대상 프레임워크를 가진 버전만
    pub framework: Option<&'a str>,
}

/// `q`를 FTS5 MATCH 식으로 변환합니다. 검색할 단어가 없으면 `None`.
pub fn build_match_expression(q: &str) -> Option<String> {
    let clauses: Vec<String> = q
        .split_whitespace()
        .filter_map(|term| {
            if let Some((field, value)) = term.split_once(':') {
                if let Some(column) = field_column(field) {
                    return has_token(value).then(|| format!("{column} : {}", quote(value)));
                }
            }
            has_token(term).then(|| format!("{}*", quote(term)))
        })
        .collect();

    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" AND "))
    }
}

fn field_column(field: &str) -> Option<&'static str> {
    match field.to_ascii_lowercase().as_str() {
        "id" | "packageid" => Some("id"),
        "title" => Some("title"),
        "description" => Some("description"),
        "summary" => Some("summary"),
        "tag" | "tags" => Some("tags"),
        "author" | "authors" => Some("authors"),
        _ => None,
    }
}

/// 토큰이 하나도 없는 단어(구두점만)는 빈 구문이 되므로 버립니다.
fn has_token(term: &str) -> bool {
    term.chars().any(char::is_alphanumeric)
}

fn quote(term: &str) -> String {
    format!("\"{}\"", term.replace('"', "\"\""))
}

/// 검색 조건에 맞는 (패키지 ID, 점수) 목록을 반환합니다.
///
/// 목록에 올라가지 않은(unlisted) 버전은 제외합니다.
/// `expression`이 `None`이면 필터에 맞는 모든 버전을 점수 0으로 돌려줍니다.
pub async fn search_packages(
    pool: &SqlitePool,
    expression: Option<&str>,
    filter: &SearchFilter<'_>,
) -> Result<Vec<SearchHit>, AppError> {
    const FILTER: &str = r#"
          p.listed = 1
          AND (? OR p.is_prerelease = 0)
          AND (? IS NULL OR EXISTS (
                SELECT 1 FROM package_frameworks f
                WHERE f.id = p.id AND f.version = p.version AND f.framework = ?))
    "#;

    let hits = match expression {
        Some(expression) => {
            let sql = format!(
                r#"
                SELECT p.id AS id, packages_fts.rank AS rank
                FROM packages_fts
                JOIN packages p ON p.rowid = packages_fts.rowid
                WHERE packages_fts MATCH ? AND {FILTER}
                ORDER BY packages_fts.rank
                "#
            );
            sqlx::query_as::<_, SearchHit>(&sql)
                .bind(expression)
                .bind(filter.include_prerelease)
                .bind(filter.framework)
                .bind(filter.framework)
                .fetch_all(pool)
                .await?
        }
        None => {
            let sql = format!(
                r#"
                SELECT p.id AS id, 0.0 AS rank
                FROM packages p
                WHERE {FILTER}
                "#
            );
            sqlx::query_as::<_, SearchHit>(&sql)
                .bind(filter.include_prerelease)
                .bind(filter.framework)
                .bind(filter.framework)
                .fetch_all(pool)
                .await?
        }
    };

    Ok(hits)
}
