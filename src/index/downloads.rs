//! # 다운로드 수 데이터
//!
//! 데이터 위치(로컬 데이터 디렉토리 또는 데이터 컨테이너)의 `downloads.v1.json`을 읽어
//! 패키지별/버전별 다운로드 수를 메모리에 보관합니다.
//!
//! ## 파일 형식
//! ```json
//! [
//!   ["Newtonsoft.Json", ["12.0.1", 1500], ["13.0.1", 9000]],
//!   ["Serilog", ["2.10.0", 700]]
//! ]
//! ```
//! 각 항목의 첫 번째 원소는 패키지 ID, 나머지는 `[버전, 다운로드 수]` 쌍입니다.

use crate::error::AppError;
use serde_json::Value;
use std::collections::HashMap;

/// 데이터 파일 이름: 로컬/클라우드 모두 같은 이름을 사용합니다.
pub const DOWNLOADS_FILE: &str = "downloads.v1.json";

/// 패키지 ID(소문자) → 버전(소문자) → 다운로드 수
#[derive(Debug, Clone, Default)]
pub struct Downloads {
    by_package: HashMap<String, HashMap<String, u64>>,
}

impl Downloads {
    /// `downloads.v1.json` 내용을 파싱합니다.
    pub fn parse(bytes: &[u8]) -> Result<Self, AppError> {
        let root: Value = serde_json::from_slice(bytes)?;
        let entries = root
            .as_array()
            .ok_or_else(|| AppError::InvalidIndex("downloads data is not an array".to_string()))?;

        let mut by_package: HashMap<String, HashMap<String, u64>> = HashMap::new();
        for entry in entries {
            let Some(items) = entry.as_array() else {
                continue;
            };
            let Some(id) = items.first().and_then(Value::as_str) else {
                continue;
            };

            let versions = by_package.entry(id.to_lowercase()).or_default();
            for pair in &items[1..] {
                // 형식이 맞지 않는 항목은 건너뜁니다
                if let (Some(version), Some(count)) = (
                    pair.get(0).and_then(Value::as_str),
                    pair.get(1).and_then(Value::as_u64),
                ) {
                    // 외부 데이터이므로 합계가 넘쳐도 u64::MAX에서 멈춥니다
                    let total = versions.entry(version.to_lowercase()).or_default();
                    *total = total.saturating_add(count);
                }
            }
        }

        Ok(Self { by_package })
    }

    /// 패키지 전체 다운로드 수 (모든 버전 합계)
    pub fn total(&self, id: &str) -> u64 {
        self.by_package
            .get(&id.to_lowercase())
            .map(|versions| {
                versions
                    .values()
                    .fold(0u64, |total, count| total.saturating_add(*count))
            })
            .unwrap_or(0)
    }

    pub fn version(&self, id: &str, version: &str) -> u64 {
        self.by_package
            .get(&id.to_lowercase())
            .and_then(|versions| versions.get(&version.to_lowercase()))
            .copied()
            .unwrap_or(0)
    }

    /// 다운로드 데이터가 있는 패키지 수
    pub fn len(&self) -> usize {
        self.by_package.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_package.is_empty()
    }
}
