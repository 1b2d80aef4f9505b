//! # 응답 프레이밍(JSON / JSONP)
//!
//! 쿼리 결과를 최종 HTTP 응답으로 만듭니다.
//!
//! | `callback` 파라미터 | 본문 | Content-Type |
//! |--------------------|------|--------------|
//! | 없음 / 빈 값 | `<json>` | `application/json` |
//! | `foo` | `foo(<json>)` | `application/javascript` |
//!
//! 모든 프레이밍된 응답은 200이며 캐시를 끄는 헤더 세 개가 붙습니다.
//!
//! ## 콜백 이름 제한
//! 콜백 이름은 스크립트 본문에 그대로 들어가므로, 아무 문자열이나 허용하면
//! 공격자가 원하는 자바스크립트를 응답에 심을 수 있습니다.
//! 그래서 `[A-Za-z_$][A-Za-z0-9_$.]*` 형태의 식별자만 받고, 나머지는 400으로 거절합니다.

use crate::error::AppError;
use crate::services::Params;
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::Value;

const MAX_CALLBACK_LEN: usize = 128;

/// 캐시 비활성화 헤더: 검색 응답은 절대 캐시되면 안 됩니다.
pub const NO_CACHE: [(header::HeaderName, &str); 3] = [
    (header::PRAGMA, "no-cache"),
    (header::CACHE_CONTROL, "no-cache"),
    (header::EXPIRES, "0"),
];

/// 검증된 JSONP 콜백 이름 (없으면 일반 JSON)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback(Option<String>);

impl Callback {
    #[cfg(test)]
    pub fn none() -> Self {
        Self(None)
    }

    /// 요청 파라미터에서 `callback`을 꺼내 검증합니다.
    ///
    /// 파라미터 이름은 대소문자를 구분하지 않습니다 (`Callback`, `CALLBACK`도 같음).
    /// 값은 다듬지 않고 그대로 검증합니다.
    pub fn from_params(params: &Params) -> Result<Self, AppError> {
        let value = params
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("callback"))
            .map(|(_, value)| value.as_str());

        match value {
            None | Some("") => Ok(Self(None)),
            Some(name) if is_safe_identifier(name) => Ok(Self(Some(name.to_string()))),
            Some(_) => Err(AppError::BadRequest(
                "callback must be a JavaScript identifier".to_string(),
            )),
        }
    }
}

fn is_safe_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    name.len() <= MAX_CALLBACK_LEN
        && (first.is_ascii_alphabetic() || first == '_' || first == '$')
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '$' | '.'))
}

/// 결과 값을 JSON 또는 JSONP 응답으로 변환합니다.
pub fn frame(value: &Value, callback: &Callback) -> Result<Response, AppError> {
    let json = serde_json::to_string(value)?;
    let (body, content_type) = match &callback.0 {
        None => (json, "application/json"),
        Some(name) => (format!("{name}({json})"), "application/javascript"),
    };

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        NO_CACHE,
        body,
    )
        .into_response())
}
