use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

use crate::domain::{CustomerId, Product};

/// 設定の読み込みエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key} must be a valid {expected} (got {value:?})")]
    InvalidValue {
        key: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("DATABASE_URL is required when STORAGE_BACKEND=postgres")]
    MissingDatabaseUrl,

    #[error("Failed to read seed data from {path}")]
    SeedRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse seed data from {path}")]
    SeedParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// 永続化の方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// インメモリのアダプター（開発・デモ用）
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

/// 実行時設定
///
/// すべて環境変数から読む。`.env`があれば先に読み込む。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_backend: StorageBackend,
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// メモリモードで読み込む商品・顧客のJSON
    pub seed_data_path: Option<PathBuf>,
    /// 起動時にイベントログからRead Modelを作り直す
    pub rebuild_read_model: bool,
}

fn parse_or<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match lookup(key) {
        Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
            key,
            expected,
            value,
        }),
        None => Ok(default),
    }
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意のキー参照関数から設定を組み立てる
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage_backend = parse_or(
            &lookup,
            "STORAGE_BACKEND",
            "storage backend (postgres|memory)",
            StorageBackend::Postgres,
        )?;

        let database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());
        if storage_backend == StorageBackend::Postgres && database_url.is_none() {
            return Err(ConfigError::MissingDatabaseUrl);
        }

        Ok(Self {
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", "port number", 3000)?,
            storage_backend,
            database_url,
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                "connection count",
                5,
            )?,
            seed_data_path: lookup("SEED_DATA_PATH").map(PathBuf::from),
            rebuild_read_model: parse_or(&lookup, "REBUILD_READ_MODEL", "boolean", false)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// メモリモードの初期データ
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub customers: Vec<CustomerId>,
}

impl SeedData {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::SeedRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::SeedParse {
            path: path.to_path_buf(),
            source,
        })
    }
}
