//! # 라우트 모듈
//!
//! 요청 경로를 정확히 문자열 비교해서 핸들러 하나를 고릅니다.
//! 슬래시 정규화, 패턴 매칭, 하위 경로는 없고, HTTP 메서드도 구분하지 않습니다.
//!
//! | 경로 | 핸들러 |
//! |------|--------|
//! | `/` | `health::root` |
//! | `/query` | `search::query` |
//! | `/autocomplete` | `search::autocomplete` |
//! | `/targetframeworks` | `metadata::target_frameworks` |
//! | `/segments` | `metadata::segments` |
//! | `/stats` | `metadata::stats` |
//! | 그 외 | `health::unrecognized` (404) |

pub mod health;
pub mod jsonp;
pub mod metadata;
pub mod search;

use crate::index::SearcherManager;
use axum::{routing::any, Router}; // any(): 메서드와 무관하게 같은 핸들러로 연결
use std::sync::Arc;
use tower_http::trace::TraceLayer; // HTTP 요청/응답 자동 로깅

/// 애플리케이션 공유 상태
///
/// 프로세스에 하나뿐인 SearcherManager를 모든 핸들러가 공유합니다.
#[derive(Clone)]
pub struct AppState {
    pub searcher: Arc<SearcherManager>,
}

/// 라우트 테이블을 만듭니다. 시작 후에는 변경되지 않습니다.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(health::root))
        .route("/query", any(search::query))
        .route("/autocomplete", any(search::autocomplete))
        .route("/targetframeworks", any(metadata::target_frameworks))
        .route("/segments", any(metadata::segments))
        .route("/stats", any(metadata::stats))
        .fallback(health::unrecognized)
        .with_state(state)
}

/// 서버가 실제로 띄우는 애플리케이션: 라우트 테이블 + 요청 로깅
///
/// 요청을 가로채서 직접 응답하는 레이어는 두지 않습니다.
/// 모든 요청(OPTIONS 포함)은 라우트 테이블의 판정을 그대로 받습니다.
pub fn app(state: AppState) -> Router {
    router(state).layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::fixture::{self, Fixture};
    use axum::{
        body::Body,
        http::{header, HeaderMap, Method, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn send(app: &Router, method: Method, uri: &str) -> (StatusCode, HeaderMap, String) {
        send_request(app, Request::builder().method(method).uri(uri)).await
    }

    async fn send_request(
        app: &Router,
        request: axum::http::request::Builder,
    ) -> (StatusCode, HeaderMap, String) {
        let response = app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    async fn serve(fixture: &Fixture) -> Router {
        app(AppState {
            searcher: fixture.opened().await,
        })
    }

    #[tokio::test]
    async fn root_answers_ok_for_any_method() {
        let fixture = Fixture::new().await;
        let app = serve(&fixture).await;

        for method in [Method::GET, Method::POST, Method::DELETE] {
            let (status, headers, body) = send(&app, method, "/").await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, "OK");
            assert_eq!(headers[header::CACHE_CONTROL], "no-cache");
        }
    }

    #[tokio::test]
    async fn unknown_paths_are_unrecognized() {
        let fixture = Fixture::new().await;
        let app = serve(&fixture).await;

        for path in ["//", "/foo", "/query/", "/Query", "/stats/extra", "/autocomplete/x"] {
            let (status, _, body) = send(&app, Method::GET, path).await;
            assert_eq!(status, StatusCode::NOT_FOUND, "{path}");
            assert_eq!(body, "unrecognized", "{path}");
        }
    }

    #[tokio::test]
    async fn preflight_requests_go_through_the_route_table() {
        let fixture = Fixture::new().await;
        let app = serve(&fixture).await;
        let preflight = |uri: &str| {
            Request::builder()
                .method(Method::OPTIONS)
                .uri(uri)
                .header(header::ORIGIN, "https://www.example.org")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
        };

        let (status, headers, body) = send_request(&app, preflight("/foo")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "unrecognized");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());

        let (status, headers, body) = send_request(&app, preflight("/query?q=json")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/json");
        assert!(headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
        let result: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(result["totalHits"], 2);
    }

    #[tokio::test]
    async fn callback_parameter_name_ignores_case() {
        let fixture = Fixture::new().await;
        let app = serve(&fixture).await;

        for uri in ["/stats?Callback=foo", "/stats?CALLBACK=foo"] {
            let (status, headers, body) = send(&app, Method::GET, uri).await;
            assert_eq!(status, StatusCode::OK, "{uri}");
            assert_eq!(headers[header::CONTENT_TYPE], "application/javascript", "{uri}");
            assert!(body.starts_with("foo({"), "{uri}");
        }
    }

    #[tokio::test]
    async fn every_defined_route_is_framed() {
        let fixture = Fixture::new().await;
        let app = serve(&fixture).await;

        for path in ["/query?q=json", "/autocomplete?q=ser", "/targetframeworks", "/segments", "/stats"] {
            let (status, headers, body) = send(&app, Method::GET, path).await;
            assert_eq!(status, StatusCode::OK, "{path}");
            assert_eq!(headers[header::CONTENT_TYPE], "application/json", "{path}");
            assert_eq!(headers[header::PRAGMA], "no-cache", "{path}");
            assert_eq!(headers[header::EXPIRES], "0", "{path}");
            serde_json::from_str::<Value>(&body).unwrap();
        }
    }

    #[tokio::test]
    async fn target_frameworks_as_json_and_jsonp() {
        let fixture = Fixture::new().await;
        let app = serve(&fixture).await;
        let expected = r#"["net45","net6.0","netstandard2.0"]"#;

        let (_, _, body) = send(&app, Method::GET, "/targetframeworks").await;
        assert_eq!(body, expected);

        let (status, headers, body) =
            send(&app, Method::POST, "/targetframeworks?callback=foo").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers[header::CONTENT_TYPE], "application/javascript");
        assert_eq!(body, format!("foo({expected})"));
    }

    #[tokio::test]
    async fn unsafe_callback_is_rejected() {
        let fixture = Fixture::new().await;
        let app = serve(&fixture).await;

        let (status, _, _) = send(&app, Method::GET, "/stats?callback=foo%28%29").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn query_links_follow_request_scheme() {
        let fixture = Fixture::new().await;
        let app = serve(&fixture).await;

        let (_, _, body) = send(&app, Method::GET, "/query?q=bson").await;
        let result: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            result["data"][0]["registration"],
            "http://api.example.org/v3/registration/newtonsoft.json.bson/index.json"
        );

        let (_, _, body) = send_request(
            &app,
            Request::builder()
                .uri("/query?q=bson")
                .header("x-forwarded-proto", "https"),
        )
        .await;
        let result: Value = serde_json::from_str(&body).unwrap();
        assert_eq!(
            result["data"][0]["registration"],
            "https://api.example.org/v3/registration/newtonsoft.json.bson/index.json"
        );
    }

    #[tokio::test]
    async fn query_failure_maps_to_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(AppState {
            searcher: Arc::new(fixture::manager_for(dir.path())),
        });

        let (status, _, body) = send(&app, Method::GET, "/stats").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.contains("index_not_open"));

        // 루트와 폴백은 인덱스 상태와 무관합니다
        let (status, _, _) = send(&app, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
    }
}
