use serde::Serialize;

/// 인덱스 세그먼트 메타데이터 (`/segments` 응답)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub name: String,
    pub document_count: i64,
    pub deleted_count: i64,
    pub size_bytes: i64,
    pub created_at: String,
}

/// 작성기가 남긴 커밋 메타데이터 한 쌍
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CommitMetadata {
    pub key: String,
    pub value: String,
}
