//! # 로컬 파일시스템 인덱스 소스
//!
//! `<인덱스 디렉토리>/index.db`와 선택적인 `<데이터 디렉토리>/downloads.v1.json`을 사용합니다.
//! 인덱스 작성기(외부 프로세스)는 새 스냅샷을 원자적 rename으로 게시한다고 가정합니다.
//!
//! 세대 태그는 파일 길이와 수정 시각으로 만듭니다.

use super::downloads::{Downloads, DOWNLOADS_FILE};
use super::source::{Generation, Snapshot, INDEX_FILE};
use crate::error::AppError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tokio::fs;

#[derive(Debug)]
pub struct LocalSource {
    index_directory: PathBuf,
    data_directory: Option<PathBuf>,
}

impl LocalSource {
    pub fn new(index_directory: PathBuf, data_directory: Option<PathBuf>) -> Self {
        Self {
            index_directory,
            data_directory,
        }
    }

    pub fn name(&self) -> String {
        self.index_directory.display().to_string()
    }

    pub async fn fetch(&self, current: Option<&Generation>) -> Result<Option<Snapshot>, AppError> {
        let index_path = self.index_directory.join(INDEX_FILE);
        // 인덱스 파일이 없으면 에러: open()에서는 치명적, 갱신 중에는 로그만 남김
        let index_tag = file_tag(&index_path)
            .await?
            .ok_or_else(|| AppError::InvalidIndex(format!("{} not found", index_path.display())))?;

        let data_path = self
            .data_directory
            .as_ref()
            .map(|dir| dir.join(DOWNLOADS_FILE));
        let data_tag = match &data_path {
            Some(path) => file_tag(path).await?,
            None => None,
        };

        let generation = Generation {
            index: index_tag,
            data: data_tag,
        };
        if current == Some(&generation) {
            return Ok(None);
        }

        let downloads = match (&data_path, &generation.data) {
            (Some(path), Some(_)) => Downloads::parse(&fs::read(path).await?)?,
            _ => Downloads::default(),
        };

        Ok(Some(Snapshot {
            generation,
            index_path,
            downloads,
        }))
    }
}

/// 파일 길이 + 수정 시각(ns). 파일이 없으면 `None`.
async fn file_tag(path: &Path) -> Result<Option<String>, AppError> {
    let metadata = match fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let modified = metadata
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    Ok(Some(format!("{}-{}", metadata.len(), modified)))
}
