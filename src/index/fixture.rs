//! 테스트용 인덱스 픽스처: 임시 디렉토리에 작은 index.db와 downloads.v1.json을 만듭니다.

use super::address::RegistrationBaseAddress;
use super::downloads::DOWNLOADS_FILE;
use super::local::LocalSource;
use super::manager::SearcherManager;
use super::source::{IndexSource, INDEX_FILE};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const SCHEMA: &str = include_str!("schema.sql");

pub const BASE_ADDRESS: &str = "https://api.example.org/v3/registration/";

const SAMPLE_DATA: &str = r#"
INSERT INTO packages (id, version, title, description, summary, authors, tags, icon_url, project_url, license_url, published, is_prerelease, is_latest, is_latest_stable, listed) VALUES
  ('Newtonsoft.Json', '12.0.1', 'Json.NET', 'Json.NET is a popular high-performance JSON framework for .NET', 'JSON framework', 'James Newton-King', 'json serialization', NULL, 'https://www.newtonsoft.com/json', NULL, '2018-11-27T00:00:00Z', 0, 0, 0, 1),
  ('Newtonsoft.Json', '13.0.1', 'Json.NET', 'Json.NET is a popular high-performance JSON framework for .NET', 'JSON framework', 'James Newton-King', 'json serialization', 'https://example.org/icon.png', 'https://www.newtonsoft.com/json', 'https://licenses.nuget.org/MIT', '2021-03-22T00:00:00Z', 0, 1, 1, 1),
  ('Newtonsoft.Json.Bson', '1.0.2', 'Json.NET BSON', 'Json.NET BSON adds support for reading and writing BSON', NULL, 'James Newton-King', 'json bson', NULL, NULL, NULL, '2018-12-01T00:00:00Z', 0, 1, 1, 1),
  ('Serilog', '2.10.0', 'Serilog', 'Simple .NET logging with fully-structured events', NULL, 'Serilog Contributors', 'logging semantic structured', NULL, 'https://serilog.net', NULL, '2020-09-01T00:00:00Z', 0, 0, 1, 1),
  ('Serilog', '3.0.0-beta1', 'Serilog', 'Simple .NET logging with fully-structured events', NULL, 'Serilog Contributors', 'logging semantic structured', NULL, 'https://serilog.net', NULL, '2023-01-01T00:00:00Z', 1, 1, 0, 1),
  ('Legacy.Tool', '1.0.0', 'Legacy Tool', 'An unlisted json helper', NULL, 'Nobody', 'json', NULL, NULL, NULL, '2010-01-01T00:00:00Z', 0, 1, 1, 0);

INSERT INTO package_frameworks (id, version, framework) VALUES
  ('Newtonsoft.Json', '12.0.1', 'net45'),
  ('Newtonsoft.Json', '13.0.1', 'net45'),
  ('Newtonsoft.Json', '13.0.1', 'netstandard2.0'),
  ('Newtonsoft.Json.Bson', '1.0.2', 'netstandard2.0'),
  ('Serilog', '2.10.0', 'net45'),
  ('Serilog', '3.0.0-beta1', 'net6.0');

INSERT INTO segments (name, document_count, deleted_count, size_bytes, created_at) VALUES
  ('_0', 5, 1, 4096, '2024-01-01T00:00:00Z');

INSERT INTO commit_metadata (key, value) VALUES
  ('commitTimeStamp', '2024-01-01T00:00:00Z'),
  ('description', 'full rebuild');
"#;

const SAMPLE_DOWNLOADS: &str = r#"[
  ["Newtonsoft.Json", ["12.0.1", 1500], ["13.0.1", 9000]],
  ["Newtonsoft.Json.Bson", ["1.0.2", 50]],
  ["Serilog", ["2.10.0", 700], ["3.0.0-beta1", 10]]
]"#;

pub struct Fixture {
    pub index_dir: TempDir,
    pub data_dir: TempDir,
}

impl Fixture {
    pub async fn new() -> Self {
        let fixture = Self {
            index_dir: tempfile::tempdir().unwrap(),
            data_dir: tempfile::tempdir().unwrap(),
        };
        write_index(&fixture.index_dir.path().join(INDEX_FILE), 0).await;
        std::fs::write(fixture.data_dir.path().join(DOWNLOADS_FILE), SAMPLE_DOWNLOADS).unwrap();
        fixture
    }

    pub fn manager(&self) -> SearcherManager {
        SearcherManager::new(
            IndexSource::Local(LocalSource::new(
                self.index_dir.path().to_path_buf(),
                Some(self.data_dir.path().to_path_buf()),
            )),
            RegistrationBaseAddress::from_configured(BASE_ADDRESS).unwrap(),
        )
    }

    pub async fn opened(&self) -> Arc<SearcherManager> {
        let manager = self.manager();
        manager.open().await.unwrap();
        Arc::new(manager)
    }

    /// 더 큰 스냅샷을 만들어 rename으로 게시합니다.
    pub async fn publish_extra_packages(&self, count: usize) {
        let staging = self.index_dir.path().join("staging.db");
        write_index(&staging, count).await;
        std::fs::rename(&staging, self.index_dir.path().join(INDEX_FILE)).unwrap();
    }

    pub fn remove_index(&self) {
        std::fs::remove_file(self.index_dir.path().join(INDEX_FILE)).unwrap();
    }
}

/// 데이터 디렉토리 없이 `dir`을 인덱스 디렉토리로 쓰는 매니저
pub fn manager_for(dir: &Path) -> SearcherManager {
    SearcherManager::new(
        IndexSource::Local(LocalSource::new(dir.to_path_buf(), None)),
        RegistrationBaseAddress::from_configured(BASE_ADDRESS).unwrap(),
    )
}

async fn write_index(path: &Path, extra: usize) {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();

    sqlx::raw_sql(SCHEMA).execute(&pool).await.unwrap();
    sqlx::raw_sql(SAMPLE_DATA).execute(&pool).await.unwrap();
    for i in 0..extra {
        sqlx::query(
            "INSERT INTO packages (id, version, description, published, is_latest, is_latest_stable) VALUES (?, '1.0.0', 'generated filler package', '2024-01-01T00:00:00Z', 1, 1)",
        )
        .bind(format!("Filler.Package{i}"))
        .execute(&pool)
        .await
        .unwrap();
    }
    sqlx::query("INSERT INTO packages_fts(packages_fts) VALUES('rebuild')")
        .execute(&pool)
        .await
        .unwrap();

    pool.close().await;
}
