//! # 애플리케이션 설정(Configuration) 모듈
//!
//! 이름이 붙은 문자열 설정값에서 서비스 설정을 읽어옵니다.
//! 운영 환경에서는 `.env` 파일이나 시스템 환경변수가 설정 소스이고,
//! 테스트에서는 `HashMap`을 그대로 설정 소스로 사용할 수 있습니다.
//!
//! 설정 항목:
//! - `LOCAL_INDEX_DIRECTORY`: 로컬 인덱스 디렉토리 (있으면 무조건 로컬 모드)
//! - `LOCAL_DATA_DIRECTORY`: 로컬 데이터 디렉토리 (선택)
//! - `STORAGE_PRIMARY`: 블롭 저장소 연결 문자열
//! - `SEARCH_INDEX_CONTAINER`: 인덱스 스냅샷이 들어있는 컨테이너 이름
//! - `SEARCH_DATA_CONTAINER`: 데이터 파일이 들어있는 컨테이너 이름
//! - `SEARCH_REGISTRATION_BASE_ADDRESS`: 결과 링크를 만들 때 쓰는 기본 주소 (필수)
//! - `INDEX_CACHE_DIRECTORY`: 다운로드한 스냅샷을 저장할 디렉토리
//! - `HOST`, `PORT`: 서버 바인딩 주소
//! - `REOPEN_INTERVAL_SECS`: 인덱스 갱신 주기 (기본 180초)

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const LOCAL_INDEX_DIRECTORY: &str = "LOCAL_INDEX_DIRECTORY";
pub const LOCAL_DATA_DIRECTORY: &str = "LOCAL_DATA_DIRECTORY";
pub const STORAGE_PRIMARY: &str = "STORAGE_PRIMARY";
pub const SEARCH_INDEX_CONTAINER: &str = "SEARCH_INDEX_CONTAINER";
pub const SEARCH_DATA_CONTAINER: &str = "SEARCH_DATA_CONTAINER";
pub const SEARCH_REGISTRATION_BASE_ADDRESS: &str = "SEARCH_REGISTRATION_BASE_ADDRESS";
pub const INDEX_CACHE_DIRECTORY: &str = "INDEX_CACHE_DIRECTORY";

/// 갱신 주기 기본값: 180초
pub const DEFAULT_REOPEN_INTERVAL: Duration = Duration::from_secs(180);

/// 설정 로딩 실패: 시작 단계에서 치명적입니다 (서버가 요청을 받기 전에 종료).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for setting {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// 이름으로 문자열 설정값을 조회하는 설정 소스
pub trait Settings {
    fn get(&self, name: &str) -> Option<String>;
}

/// 프로세스 환경변수를 설정 소스로 사용합니다.
pub struct EnvSettings;

impl Settings for EnvSettings {
    fn get(&self, name: &str) -> Option<String> {
        env::var(name).ok()
    }
}

impl Settings for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// 인덱스 저장소 위치: 어떤 백엔드로 SearcherManager를 만들지 결정합니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexLocation {
    /// 파일시스템 기반 인덱스
    Local {
        index_directory: PathBuf,
        data_directory: Option<PathBuf>,
    },
    /// 클라우드 블롭 저장소 기반 인덱스
    Azure {
        storage_primary: String,
        index_container: String,
        data_container: String,
        cache_directory: PathBuf,
    },
}

/// 서비스 전체 설정
///
/// 서버 시작 시 한 번 읽어온 후 변경되지 않습니다.
#[derive(Debug, Clone)]
pub struct Config {
    pub index: IndexLocation,
    /// 아직 파싱하지 않은 등록 기본 주소. 파싱은 `index::address`에서 합니다.
    pub registration_base_address: String,
    pub host: String,
    pub port: u16,
    pub reopen_interval: Duration,
}

impl Config {
    /// 환경변수에서 설정을 읽어 Config를 생성합니다.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(&EnvSettings)
    }

    /// 임의의 설정 소스에서 Config를 생성합니다.
    ///
    /// `LOCAL_INDEX_DIRECTORY`가 비어있지 않으면 클라우드 설정이 있더라도
    /// 로컬 모드가 선택됩니다. 그렇지 않으면 클라우드 설정 세 개가 모두 필요합니다.
    pub fn load(settings: &impl Settings) -> Result<Self, ConfigError> {
        let index = match non_empty(settings, LOCAL_INDEX_DIRECTORY) {
            Some(index_directory) => IndexLocation::Local {
                index_directory: PathBuf::from(index_directory),
                data_directory: non_empty(settings, LOCAL_DATA_DIRECTORY).map(PathBuf::from),
            },
            None => IndexLocation::Azure {
                storage_primary: required(settings, STORAGE_PRIMARY)?,
                index_container: required(settings, SEARCH_INDEX_CONTAINER)?,
                data_container: required(settings, SEARCH_DATA_CONTAINER)?,
                cache_directory: non_empty(settings, INDEX_CACHE_DIRECTORY)
                    .map(PathBuf::from)
                    .unwrap_or_else(|| env::temp_dir().join("secure-search-cache")),
            },
        };

        Ok(Self {
            index,
            registration_base_address: required(settings, SEARCH_REGISTRATION_BASE_ADDRESS)?,
            host: non_empty(settings, "HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: non_empty(settings, "PORT")
                .and_then(|port| port.parse().ok())
                .unwrap_or(3000),
            reopen_interval: non_empty(settings, "REOPEN_INTERVAL_SECS")
                .and_then(|secs| secs.parse::<u64>().ok())
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REOPEN_INTERVAL),
        })
    }
}

/// 빈 문자열(공백만 있는 경우 포함)은 설정이 없는 것으로 취급합니다.
fn non_empty(settings: &impl Settings, name: &str) -> Option<String> {
    settings.get(name).filter(|value| !value.trim().is_empty())
}

fn required(settings: &impl Settings, name: &'static str) -> Result<String, ConfigError> {
    non_empty(settings, name).ok_or(ConfigError::Missing(name))
}
