//! # 검색 서비스 연산
//!
//! 라우터가 호출하는 쿼리 엔진 연산들입니다. 각 연산은 현재 스냅샷(`Searcher`)과
//! 요청의 쿼리 파라미터를 받아 구조화된 JSON 값을 돌려주고,
//! JSON/JSONP 변환은 라우트 쪽에서 합니다.
//!
//! - `query()`: 전문검색 (`/query`)
//! - `autocomplete()`: ID 자동완성 / 버전 목록 (`/autocomplete`)
//! - `target_frameworks()`: 대상 프레임워크 목록 (`/targetframeworks`)
//! - `segments()`: 세그먼트 메타데이터 (`/segments`)
//! - `stats()`: 인덱스 통계 (`/stats`)

use crate::db::{self, SearchFilter};
use crate::error::AppError;
use crate::index::downloads::Downloads;
use crate::index::Searcher;
use crate::models::PackageVersion;
use serde_json::{json, Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;

const SCHEMA_VOCAB: &str = "http://schema.nuget.org/schema#";
const DEFAULT_TAKE: usize = 20;
const MAX_TAKE: usize = 1000;

/// 요청 쿼리 파라미터 (이름은 대소문자 무시)
pub type Params = HashMap<String, String>;

fn param<'a>(params: &'a Params, name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

/// 잘못된 숫자는 기본값으로 처리합니다. 이 계층은 요청을 검증하지 않습니다.
fn paging(params: &Params) -> (usize, usize) {
    let skip = param(params, "skip")
        .and_then(|skip| skip.parse().ok())
        .unwrap_or(0);
    let take = param(params, "take")
        .and_then(|take| take.parse().ok())
        .unwrap_or(DEFAULT_TAKE)
        .min(MAX_TAKE);
    (skip, take)
}

fn include_prerelease(params: &Params) -> bool {
    param(params, "prerelease").is_some_and(|value| value.eq_ignore_ascii_case("true"))
}

fn envelope(searcher: &Searcher, base: Option<&str>, total_hits: usize, data: Vec<Value>) -> Value {
    let mut context = Map::new();
    context.insert("@vocab".to_string(), json!(SCHEMA_VOCAB));
    if let Some(base) = base {
        context.insert("@base".to_string(), json!(base));
    }

    json!({
        "@context": context,
        "totalHits": total_hits,
        "lastReopen": searcher.opened_at.to_rfc3339(),
        "index": searcher.index_name,
        "data": data,
    })
}

/// 전문검색. `registration_prefix`는 요청 스킴에 맞는 등록 기본 주소(`/`로 끝남)입니다.
pub async fn query(
    searcher: &Searcher,
    params: &Params,
    registration_prefix: &str,
) -> Result<Value, AppError> {
    let q = param(params, "q").unwrap_or("");
    let (skip, take) = paging(params);
    let filter = SearchFilter {
        include_prerelease: include_prerelease(params),
        framework: param(params, "supportedFramework"),
    };

    let expression = db::build_match_expression(q);
    let hits = db::search_packages(&searcher.pool, expression.as_deref(), &filter).await?;
    let ranked = rank_packages(hits, &searcher.downloads);

    // 페이지에 들어갈 패키지의 대표 버전과 버전 목록을 각각 쿼리 한 번으로 가져옵니다
    let page: Vec<&str> = ranked.iter().skip(skip).take(take).map(String::as_str).collect();
    let mut latest =
        db::get_latest_versions(&searcher.pool, &page, filter.include_prerelease).await?;
    let mut version_lists =
        db::list_versions_by_id(&searcher.pool, &page, filter.include_prerelease).await?;

    let data = page
        .iter()
        .filter_map(|id| {
            let package = latest.remove(*id)?;
            let versions = version_lists.remove(*id).unwrap_or_default();
            Some(package_json(&package, &versions, &searcher.downloads, registration_prefix))
        })
        .collect();

    Ok(envelope(searcher, Some(registration_prefix), ranked.len(), data))
}

/// 버전별 검색 결과를 패키지 단위로 묶고 정렬합니다.
///
/// 관련도(가장 좋은 버전의 점수) → 전체 다운로드 수 → ID 순.
fn rank_packages(hits: Vec<db::SearchHit>, downloads: &Downloads) -> Vec<String> {
    let mut best: HashMap<String, f64> = HashMap::new();
    for hit in hits {
        best.entry(hit.id)
            .and_modify(|rank| *rank = rank.min(hit.rank))
            .or_insert(hit.rank);
    }

    let mut ranked: Vec<(String, f64, u64)> = best
        .into_iter()
        .map(|(id, rank)| {
            let total = downloads.total(&id);
            (id, rank, total)
        })
        .collect();
    ranked.sort_by(|a, b| {
        a.1.total_cmp(&b.1)
            .then_with(|| b.2.cmp(&a.2))
            .then_with(|| compare_ids(&a.0, &b.0))
    });
    ranked.into_iter().map(|(id, _, _)| id).collect()
}

fn compare_ids(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

fn package_json(
    package: &PackageVersion,
    versions: &[String],
    downloads: &Downloads,
    prefix: &str,
) -> Value {
    let id_lower = package.id.to_lowercase();
    let registration = format!("{prefix}{id_lower}/index.json");

    let versions: Vec<Value> = versions
        .iter()
        .map(|version| {
            json!({
                "version": version,
                "downloads": downloads.version(&package.id, version),
                "@id": format!("{prefix}{id_lower}/{}.json", version.to_lowercase()),
            })
        })
        .collect();

    json!({
        "@id": registration,
        "@type": "Package",
        "registration": registration,
        "id": package.id,
        "version": package.version,
        "description": package.description.as_deref().unwrap_or(""),
        "summary": package.summary.as_deref().unwrap_or(""),
        "title": package.title.as_deref().unwrap_or(&package.id),
        "iconUrl": package.icon_url.as_deref().unwrap_or(""),
        "projectUrl": package.project_url.as_deref().unwrap_or(""),
        "licenseUrl": package.license_url.as_deref().unwrap_or(""),
        "tags": package.tag_list(),
        "authors": package.author_list(),
        "totalDownloads": downloads.total(&package.id),
        "versions": versions,
    })
}

/// 자동완성.
///
/// - `id`가 있으면 그 패키지의 버전 목록
/// - 없으면 `q`로 시작하는 패키지 ID 목록 (다운로드 수 순)
pub async fn autocomplete(searcher: &Searcher, params: &Params) -> Result<Value, AppError> {
    let prerelease = include_prerelease(params);

    if let Some(id) = param(params, "id") {
        let versions = db::list_versions(&searcher.pool, id, prerelease).await?;
        let total = versions.len();
        let data = versions.into_iter().map(Value::String).collect();
        return Ok(envelope(searcher, None, total, data));
    }

    let q = param(params, "q").unwrap_or("");
    let (skip, take) = paging(params);
    let mut ids = db::list_ids_with_prefix(&searcher.pool, q, prerelease).await?;
    ids.sort_by(|a, b| {
        searcher
            .downloads
            .total(b)
            .cmp(&searcher.downloads.total(a))
            .then_with(|| compare_ids(a, b))
    });

    let total = ids.len();
    let data = ids
        .into_iter()
        .skip(skip)
        .take(take)
        .map(Value::String)
        .collect();
    Ok(envelope(searcher, None, total, data))
}

pub async fn target_frameworks(searcher: &Searcher) -> Result<Value, AppError> {
    let frameworks = db::list_target_frameworks(&searcher.pool).await?;
    Ok(json!(frameworks))
}

pub async fn segments(searcher: &Searcher) -> Result<Value, AppError> {
    let segments = db::list_segments(&searcher.pool).await?;
    Ok(serde_json::to_value(segments)?)
}

pub async fn stats(searcher: &Searcher) -> Result<Value, AppError> {
    let (num_docs, num_packages) = db::count_documents(&searcher.pool).await?;
    let commit_user_data: Map<String, Value> = db::list_commit_metadata(&searcher.pool)
        .await?
        .into_iter()
        .map(|row| (row.key, Value::String(row.value)))
        .collect();

    Ok(json!({
        "numDocs": num_docs,
        "numPackages": num_packages,
        "indexName": searcher.index_name,
        "lastReopen": searcher.opened_at.to_rfc3339(),
        "generation": searcher.generation.to_string(),
        "downloadsLoaded": searcher.downloads.len(),
        "commitUserData": commit_user_data,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::fixture::{Fixture, BASE_ADDRESS};

    fn params(pairs: &[(&str, &str)]) -> Params {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn ids(result: &Value) -> Vec<String> {
        result["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|package| package["id"].as_str().unwrap().to_string())
            .collect()
    }

    #[tokio::test]
    async fn empty_query_lists_packages_by_downloads() {
        let fixture = Fixture::new().await;
        let manager = fixture.opened().await;
        let searcher = manager.current().unwrap();

        let result = query(&searcher, &params(&[]), BASE_ADDRESS).await.unwrap();

        assert_eq!(result["totalHits"], 3);
        assert_eq!(
            ids(&result),
            ["Newtonsoft.Json", "Serilog", "Newtonsoft.Json.Bson"]
        );
        assert_eq!(result["@context"]["@base"], BASE_ADDRESS);
    }

    #[tokio::test]
    async fn text_query_groups_versions_and_skips_unlisted() {
        let fixture = Fixture::new().await;
        let manager = fixture.opened().await;
        let searcher = manager.current().unwrap();

        let result = query(&searcher, &params(&[("q", "json")]), BASE_ADDRESS)
            .await
            .unwrap();

        assert_eq!(result["totalHits"], 2);
        let mut found = ids(&result);
        found.sort();
        assert_eq!(found, ["Newtonsoft.Json", "Newtonsoft.Json.Bson"]);

        let package = result["data"]
            .as_array()
            .unwrap()
            .iter()
            .find(|package| package["id"] == "Newtonsoft.Json")
            .unwrap();
        assert_eq!(package["version"], "13.0.1");
        assert_eq!(package["totalDownloads"], 10500);
        assert_eq!(
            package["registration"],
            "https://api.example.org/v3/registration/newtonsoft.json/index.json"
        );
        assert_eq!(package["versions"].as_array().unwrap().len(), 2);
        assert_eq!(package["versions"][1]["downloads"], 9000);
        assert_eq!(package["tags"], json!(["json", "serialization"]));
    }

    #[tokio::test]
    async fn prerelease_flag_controls_latest_version() {
        let fixture = Fixture::new().await;
        let manager = fixture.opened().await;
        let searcher = manager.current().unwrap();

        let stable = query(&searcher, &params(&[("q", "serilog")]), BASE_ADDRESS)
            .await
            .unwrap();
        assert_eq!(stable["data"][0]["version"], "2.10.0");
        assert_eq!(stable["data"][0]["versions"].as_array().unwrap().len(), 1);

        let pre = query(
            &searcher,
            &params(&[("q", "serilog"), ("prerelease", "true")]),
            BASE_ADDRESS,
        )
        .await
        .unwrap();
        assert_eq!(pre["data"][0]["version"], "3.0.0-beta1");
        assert_eq!(pre["data"][0]["versions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn framework_filter_and_paging() {
        let fixture = Fixture::new().await;
        let manager = fixture.opened().await;
        let searcher = manager.current().unwrap();

        let filtered = query(
            &searcher,
            &params(&[("supportedFramework", "netstandard2.0")]),
            BASE_ADDRESS,
        )
        .await
        .unwrap();
        assert_eq!(filtered["totalHits"], 2);

        let page = query(&searcher, &params(&[("skip", "1"), ("take", "1")]), BASE_ADDRESS)
            .await
            .unwrap();
        assert_eq!(page["totalHits"], 3);
        assert_eq!(ids(&page), ["Serilog"]);
    }

    #[tokio::test]
    async fn autocomplete_ids_and_versions() {
        let fixture = Fixture::new().await;
        let manager = fixture.opened().await;
        let searcher = manager.current().unwrap();

        let result = autocomplete(&searcher, &params(&[("q", "newt")])).await.unwrap();
        assert_eq!(result["data"], json!(["Newtonsoft.Json", "Newtonsoft.Json.Bson"]));

        let everything = autocomplete(&searcher, &params(&[])).await.unwrap();
        assert_eq!(everything["totalHits"], 3);

        let versions = autocomplete(&searcher, &params(&[("id", "serilog"), ("prerelease", "true")]))
            .await
            .unwrap();
        assert_eq!(versions["data"], json!(["2.10.0", "3.0.0-beta1"]));
    }

    #[tokio::test]
    async fn metadata_operations() {
        let fixture = Fixture::new().await;
        let manager = fixture.opened().await;
        let searcher = manager.current().unwrap();

        assert_eq!(
            target_frameworks(&searcher).await.unwrap(),
            json!(["net45", "net6.0", "netstandard2.0"])
        );

        let segments = segments(&searcher).await.unwrap();
        assert_eq!(segments[0]["name"], "_0");
        assert_eq!(segments[0]["documentCount"], 5);

        let stats = stats(&searcher).await.unwrap();
        assert_eq!(stats["numDocs"], 6);
        assert_eq!(stats["numPackages"], 4);
        assert_eq!(stats["downloadsLoaded"], 3);
        assert_eq!(stats["commitUserData"]["description"], "full rebuild");
    }
}
