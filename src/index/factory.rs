//! # SearcherManager 생성
//!
//! 설정을 읽어 백엔드를 고르고, 등록 기본 주소의 두 스킴 변형을 붙인
//! SearcherManager 하나를 만듭니다. 반환된 매니저는 아직 열리지 않은 상태이므로
//! 호출자가 `open()`을 해야 합니다.

use super::address::RegistrationBaseAddress;
use super::azure::AzureSource;
use super::local::LocalSource;
use super::manager::SearcherManager;
use super::source::IndexSource;
use crate::config::{Config, IndexLocation};
use crate::error::AppError;

pub fn create_searcher_manager(config: &Config) -> Result<SearcherManager, AppError> {
    let source = match &config.index {
        IndexLocation::Local {
            index_directory,
            data_directory,
        } => IndexSource::Local(LocalSource::new(
            index_directory.clone(),
            data_directory.clone(),
        )),
        IndexLocation::Azure {
            storage_primary,
            index_container,
            data_container,
            cache_directory,
        } => IndexSource::Azure(AzureSource::new(
            storage_primary,
            index_container.clone(),
            data_container.clone(),
            cache_directory.clone(),
        )?),
    };

    let registration_base_address =
        RegistrationBaseAddress::from_configured(&config.registration_base_address)?;

    Ok(SearcherManager::new(source, registration_base_address))
}
