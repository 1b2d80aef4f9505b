//! # 인덱스 소스(Index Source)
//!
//! SearcherManager가 스냅샷을 어디서 가져오는지 추상화합니다.
//! 백엔드는 두 가지뿐이므로 트레이트 객체 대신 열거형으로 분기합니다.
//!
//! `fetch(current)`는 현재 세대(generation)와 비교해서 바뀐 것이 없으면 `None`을,
//! 새 데이터가 있으면 열 수 있는 `Snapshot`을 돌려줍니다.

use super::azure::AzureSource;
use super::downloads::Downloads;
use super::local::LocalSource;
use crate::error::AppError;
use std::fmt;
use std::path::PathBuf;

/// 인덱스 스냅샷 파일 이름
pub const INDEX_FILE: &str = "index.db";

/// 스냅샷 세대 식별자: 인덱스 파일과 데이터 파일의 태그로 구성됩니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub index: String,
    pub data: Option<String>,
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            Some(data) => write!(f, "{}+{}", self.index, data),
            None => write!(f, "{}", self.index),
        }
    }
}

/// 열 준비가 된 스냅샷
#[derive(Debug)]
pub struct Snapshot {
    pub generation: Generation,
    pub index_path: PathBuf,
    pub downloads: Downloads,
}

#[derive(Debug)]
pub enum IndexSource {
    Local(LocalSource),
    Azure(AzureSource),
}

impl IndexSource {
    pub fn kind(&self) -> &'static str {
        match self {
            IndexSource::Local(_) => "local",
            IndexSource::Azure(_) => "azure",
        }
    }

    /// stats 응답의 `indexName`에 들어가는 이름
    pub fn name(&self) -> String {
        match self {
            IndexSource::Local(source) => source.name(),
            IndexSource::Azure(source) => source.name(),
        }
    }

    pub async fn fetch(&self, current: Option<&Generation>) -> Result<Option<Snapshot>, AppError> {
        match self {
            IndexSource::Local(source) => source.fetch(current).await,
            IndexSource::Azure(source) => source.fetch(current).await,
        }
    }
}
