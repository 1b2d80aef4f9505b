//! # 클라우드 블롭 저장소 인덱스 소스
//!
//! 인덱스 컨테이너의 `index.db`를 로컬 캐시 디렉토리로 내려받아 열고,
//! 데이터 컨테이너의 `downloads.v1.json`을 함께 읽습니다.
//!
//! ## 변경 감지
//! `If-None-Match` 조건부 요청을 사용합니다. 저장소가 304를 돌려주면 바뀐 것이 없고,
//! 200이면 응답의 ETag가 새 세대 태그가 됩니다.
//!
//! ## 연결 문자열
//! - `https://account.blob.core.windows.net/?sv=...` 같은 엔드포인트 URL (쿼리는 SAS로 사용)
//! - `UseDevelopmentStorage=true` (로컬 에뮬레이터)
//! - `DefaultEndpointsProtocol=https;AccountName=...;EndpointSuffix=...;SharedAccessSignature=...`
//! - `BlobEndpoint=...` (다른 키보다 우선)
//!
//! 공유 키 서명(AccountKey)은 구현하지 않습니다. 컨테이너가 공개되어 있거나
//! SAS 토큰으로 접근할 수 있어야 합니다.

use super::downloads::{Downloads, DOWNLOADS_FILE};
use super::source::{Generation, Snapshot, INDEX_FILE};
use crate::config::{ConfigError, STORAGE_PRIMARY};
use crate::error::AppError;
use reqwest::header::{ETAG, IF_NONE_MATCH, LAST_MODIFIED};
use reqwest::{Client, Response, StatusCode};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use url::Url;

const DEVELOPMENT_STORAGE_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// 블롭 서비스 엔드포인트 + 선택적 SAS 토큰
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEndpoint {
    base: Url,
    sas: Option<String>,
}

impl BlobEndpoint {
    pub fn parse(connection: &str) -> Result<Self, ConfigError> {
        let connection = connection.trim();

        if connection.starts_with("http://") || connection.starts_with("https://") {
            let mut base = Url::parse(connection).map_err(|e| invalid(e.to_string()))?;
            let sas = base.query().map(str::to_string);
            base.set_query(None);
            return Ok(Self { base, sas });
        }

        let mut protocol = "https".to_string();
        let mut account = None;
        let mut suffix = "core.windows.net".to_string();
        let mut blob_endpoint = None;
        let mut sas = None;

        for part in connection.split(';').filter(|part| !part.trim().is_empty()) {
            // AccountKey 값에는 '='가 포함될 수 있으므로 첫 번째 '='에서만 나눕니다
            let Some((key, value)) = part.split_once('=') else {
                return Err(invalid(format!("malformed segment {part:?}")));
            };
            let value = value.trim();
            match key.trim().to_ascii_lowercase().as_str() {
                "usedevelopmentstorage" if value.eq_ignore_ascii_case("true") => {
                    blob_endpoint = Some(DEVELOPMENT_STORAGE_ENDPOINT.to_string());
                }
                "defaultendpointsprotocol" => protocol = value.to_string(),
                "accountname" => account = Some(value.to_string()),
                "endpointsuffix" => suffix = value.to_string(),
                "blobendpoint" => blob_endpoint = Some(value.to_string()),
                "sharedaccesssignature" => {
                    sas = Some(value.trim_start_matches('?').to_string());
                }
                _ => {}
            }
        }

        let endpoint = match (blob_endpoint, account) {
            (Some(endpoint), _) => endpoint,
            (None, Some(account)) => format!("{protocol}://{account}.blob.{suffix}"),
            (None, None) => {
                return Err(invalid("neither BlobEndpoint nor AccountName is set".to_string()))
            }
        };
        let base = Url::parse(&endpoint).map_err(|e| invalid(e.to_string()))?;

        Ok(Self { base, sas })
    }

    /// `<엔드포인트>/<컨테이너>/<블롭>?<SAS>`
    pub fn blob_url(&self, container: &str, blob: &str) -> Result<Url, AppError> {
        let raw = format!(
            "{}/{}/{}",
            self.base.as_str().trim_end_matches('/'),
            container,
            blob
        );
        let mut url =
            Url::parse(&raw).map_err(|e| AppError::InvalidIndex(format!("bad blob url: {e}")))?;
        url.set_query(self.sas.as_deref());
        Ok(url)
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid {
        name: STORAGE_PRIMARY,
        reason,
    }
}

enum BlobResponse {
    NotModified,
    NotFound,
    Found { tag: String, response: Response },
}

#[derive(Debug)]
pub struct AzureSource {
    client: Client,
    endpoint: BlobEndpoint,
    index_container: String,
    data_container: String,
    cache_directory: PathBuf,
}

impl AzureSource {
    pub fn new(
        storage_primary: &str,
        index_container: String,
        data_container: String,
        cache_directory: PathBuf,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(concat!("secure-search/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            endpoint: BlobEndpoint::parse(storage_primary)?,
            index_container,
            data_container,
            cache_directory,
        })
    }

    pub fn name(&self) -> String {
        self.index_container.clone()
    }

    pub async fn fetch(&self, current: Option<&Generation>) -> Result<Option<Snapshot>, AppError> {
        let known_index = current.map(|generation| generation.index.as_str());

        let (index_tag, index_changed) = match self
            .get_blob(&self.index_container, INDEX_FILE, known_index)
            .await?
        {
            BlobResponse::Found { tag, response } => {
                self.store_index(&tag, response, known_index).await?;
                (tag, true)
            }
            BlobResponse::NotModified => match known_index {
                Some(tag) => (tag.to_string(), false),
                None => {
                    return Err(AppError::InvalidIndex(
                        "storage answered 304 to an unconditional request".to_string(),
                    ))
                }
            },
            BlobResponse::NotFound => {
                return Err(AppError::InvalidIndex(format!(
                    "{} not found in container {}",
                    INDEX_FILE, self.index_container
                )))
            }
        };

        // 인덱스가 바뀌었으면 데이터 파일은 무조건 다시 받습니다
        let known_data = if index_changed {
            None
        } else {
            current.and_then(|generation| generation.data.as_deref())
        };
        let data = self
            .get_blob(&self.data_container, DOWNLOADS_FILE, known_data)
            .await?;

        let (data_tag, downloads) = match data {
            BlobResponse::NotModified if !index_changed => return Ok(None),
            BlobResponse::NotFound if !index_changed && known_data.is_none() => return Ok(None),
            BlobResponse::NotModified => {
                return Err(AppError::InvalidIndex(
                    "storage answered 304 to an unconditional request".to_string(),
                ))
            }
            BlobResponse::NotFound => (None, Downloads::default()),
            BlobResponse::Found { tag, response } => {
                let bytes = response.bytes().await?;
                (Some(tag), Downloads::parse(&bytes)?)
            }
        };

        Ok(Some(Snapshot {
            index_path: self.cached_index_path(&index_tag),
            generation: Generation {
                index: index_tag,
                data: data_tag,
            },
            downloads,
        }))
    }

    async fn get_blob(
        &self,
        container: &str,
        blob: &str,
        if_none_match: Option<&str>,
    ) -> Result<BlobResponse, AppError> {
        let url = self.endpoint.blob_url(container, blob)?;
        let mut request = self.client.get(url);
        if let Some(tag) = if_none_match {
            request = request.header(IF_NONE_MATCH, tag);
        }

        let response = request.send().await?;
        match response.status() {
            StatusCode::NOT_MODIFIED => Ok(BlobResponse::NotModified),
            StatusCode::NOT_FOUND => Ok(BlobResponse::NotFound),
            _ => {
                let response = response.error_for_status()?;
                let tag = response
                    .headers()
                    .get(ETAG)
                    .or_else(|| response.headers().get(LAST_MODIFIED))
                    .and_then(|value| value.to_str().ok())
                    .map(str::to_string)
                    .unwrap_or_else(|| chrono::Utc::now().timestamp_millis().to_string());
                Ok(BlobResponse::Found { tag, response })
            }
        }
    }

    fn cache_root(&self) -> PathBuf {
        self.cache_directory.join(&self.index_container)
    }

    fn cached_index_path(&self, tag: &str) -> PathBuf {
        self.cache_root().join(cache_file_name(tag))
    }

    /// 응답 본문을 임시 파일에 스트리밍한 뒤 rename으로 게시합니다.
    async fn store_index(
        &self,
        tag: &str,
        mut response: Response,
        previous: Option<&str>,
    ) -> Result<(), AppError> {
        let root = self.cache_root();
        fs::create_dir_all(&root).await?;

        let target = self.cached_index_path(tag);
        let partial = target.with_extension("partial");
        let mut file = fs::File::create(&partial).await?;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        drop(file);
        fs::rename(&partial, &target).await?;
        tracing::debug!("Downloaded index snapshot to {}", target.display());

        let keep = previous.map(|tag| self.cached_index_path(tag));
        prune_cache(&root, &target, keep.as_deref()).await;
        Ok(())
    }
}

/// ETag는 따옴표 등을 포함하므로 영숫자만 남겨 파일 이름으로 씁니다.
fn cache_file_name(tag: &str) -> String {
    let cleaned: String = tag.chars().filter(char::is_ascii_alphanumeric).collect();
    if cleaned.is_empty() {
        "index-current.db".to_string()
    } else {
        format!("index-{cleaned}.db")
    }
}

/// 현재/직전 스냅샷을 제외한 캐시 파일 삭제 (best-effort)
///
/// 아직 살아 있는 더 오래된 `Searcher`는 연결을 열어 둔 채 고정하고 있으므로
/// 파일 이름이 사라져도 계속 읽을 수 있습니다.
async fn prune_cache(root: &Path, current: &Path, previous: Option<&Path>) {
    let Ok(mut entries) = fs::read_dir(root).await else {
        return;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        let is_snapshot = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("index-") && name.ends_with(".db"));
        if is_snapshot && path != current && Some(path.as_path()) != previous {
            let _ = fs::remove_file(&path).await;
        }
    }
}
