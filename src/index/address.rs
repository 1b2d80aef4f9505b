//! # 등록(registration) 기본 주소
//!
//! 쿼리 결과에 들어가는 패키지 링크는 설정된 기본 주소 하나에서 만들어집니다.
//! 요청이 http로 왔는지 https로 왔는지에 따라 링크의 스킴도 달라져야 하므로,
//! 시작 시 두 가지 변형을 미리 계산해 둡니다.
//!
//! 규칙: 설정된 주소의 스킴이 목표 스킴과 같으면 그대로 쓰고,
//! 다르면 스킴을 바꾸고 명시적 포트를 지웁니다.

use crate::config::{ConfigError, SEARCH_REGISTRATION_BASE_ADDRESS};
use url::Url;

/// 스킴별(`http`, `https`) 등록 기본 주소. 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationBaseAddress {
    http: Url,
    https: Url,
}

impl RegistrationBaseAddress {
    /// 설정값 하나에서 두 스킴 변형을 계산합니다.
    ///
    /// 절대 http/https URL이 아니면 설정 에러입니다.
    pub fn from_configured(raw: &str) -> Result<Self, ConfigError> {
        let original = Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
        if !matches!(original.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", original.scheme())));
        }

        Ok(Self {
            http: make_registration_base_address("http", &original)?,
            https: make_registration_base_address("https", &original)?,
        })
    }

    pub fn get(&self, scheme: &str) -> Option<&Url> {
        match scheme {
            "http" => Some(&self.http),
            "https" => Some(&self.https),
            _ => None,
        }
    }

    /// 요청 스킴에 맞는 기본 주소를 `/`로 끝나는 문자열로 돌려줍니다.
    /// 알 수 없는 스킴이면 http 변형을 씁니다.
    pub fn prefix_for(&self, scheme: &str) -> String {
        let url = self.get(scheme).unwrap_or(&self.http);
        let mut prefix = url.as_str().to_string();
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        prefix
    }
}

/// 목표 스킴의 기본 주소를 만듭니다.
fn make_registration_base_address(scheme: &str, original: &Url) -> Result<Url, ConfigError> {
    if original.scheme() == scheme {
        return Ok(original.clone());
    }

    let mut rebuilt = original.clone();
    rebuilt
        .set_scheme(scheme)
        .map_err(|_| invalid(format!("cannot switch scheme to {scheme}")))?;
    rebuilt
        .set_port(None)
        .map_err(|_| invalid("cannot clear port".to_string()))?;
    Ok(rebuilt)
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid {
        name: SEARCH_REGISTRATION_BASE_ADDRESS,
        reason,
    }
}
