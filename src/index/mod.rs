//! # 인덱스 핸들 계층
//!
//! 검색 인덱스를 열고, 최신 상태로 유지하고, 요청 핸들러에 빌려주는 모듈입니다.
//!
//! 각 하위 모듈:
//! - `address`: 등록 기본 주소의 http/https 변형 계산
//! - `azure`: 클라우드 블롭 저장소 소스
//! - `downloads`: 다운로드 수 데이터 파일
//! - `factory`: 설정 → SearcherManager
//! - `gate`: 겹치지 않는 주기적 갱신
//! - `local`: 로컬 파일시스템 소스
//! - `manager`: 공유 인덱스 핸들(SearcherManager)
//! - `source`: 소스 열거형과 스냅샷 세대

pub mod address;
pub mod azure;
pub mod downloads;
pub mod factory;
pub mod gate;
pub mod local;
pub mod manager;
pub mod source;

#[cfg(test)]
pub mod fixture;

pub use factory::create_searcher_manager;
pub use gate::ReopenGate;
pub use manager::{Searcher, SearcherManager};
