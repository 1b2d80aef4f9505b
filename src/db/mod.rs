//! # 인덱스 조회 계층 (Data Access Layer)
//!
//! 열려 있는 인덱스 스냅샷(SQLite)에 직접 SQL을 실행하는 함수들입니다.
//! `services`의 쿼리 연산이 이 모듈을 호출합니다.
//!
//! 각 하위 모듈:
//! - `metadata`: 대상 프레임워크, 세그먼트, 통계용 집계
//! - `packages`: 버전 목록, 자동완성용 ID 조회
//! - `search`: FTS5 전문검색

pub mod metadata;
pub mod packages;
pub mod search;

pub use metadata::*;
pub use packages::*;
pub use search::*;
