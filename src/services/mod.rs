//! # 서비스 계층
//!
//! 인덱스 조회 결과를 응답용 JSON으로 조립하는 쿼리 엔진 연산들입니다.

pub mod search;

pub use search::*;
