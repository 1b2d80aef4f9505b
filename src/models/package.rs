//! # 패키지 모델 정의
//!
//! 인덱스 스냅샷의 `packages` 테이블 한 행에 대응하는 구조체입니다.

use serde::Serialize;

/// 패키지의 특정 버전: `sqlx::FromRow`로 SQL 결과 행이 자동 매핑됩니다.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct PackageVersion {
    pub id: String,
    pub version: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    /// 쉼표 구분 작성자 목록
    pub authors: Option<String>,
    /// 공백 구분 태그 목록
    pub tags: Option<String>,
    pub icon_url: Option<String>,
    pub project_url: Option<String>,
    pub license_url: Option<String>,
    pub published: String,
    pub is_prerelease: i64,
}

impl PackageVersion {
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .map(|tags| {
                tags.split(|c: char| c.is_whitespace() || c == ',')
                    .filter(|tag| !tag.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn author_list(&self) -> Vec<&str> {
        self.authors
            .as_deref()
            .map(|authors| {
                authors
                    .split(',')
                    .map(str::trim)
                    .filter(|author| !author.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}

/// 검색 결과에 들어가는 버전 목록의 한 항목
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VersionRow {
    pub version: String,
}
