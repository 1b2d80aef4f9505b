//! # 데이터 모델 모듈
//!
//! 인덱스 스냅샷에서 읽어오는 행(row) 구조체들입니다.
//! - `package`: 패키지 버전
//! - `segment`: 세그먼트/커밋 메타데이터

pub mod package;
pub mod segment;

pub use package::*;
pub use segment::*;
