use crate::infra::api::{
    ArticleProvider, HttpClient, NewsApiClient, NewsApiConfig, WebSearchClient, WebSearchConfig,
};
use crate::infra::storage::file::load_yaml_from_file;
use crate::types::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;
use std::sync::Arc;

/// 外部APIへの1リクエストあたりのタイムアウト（秒）
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// 定期実行で処理する直近の設定数
pub const DEFAULT_SCHEDULED_BATCH_SIZE: usize = 3;

/// アプリケーション設定
///
/// 環境変数（`.env`を含む）またはYAMLファイルから読み込む。
/// APIキーが設定されたプロバイダーだけが有効になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default)]
    pub news: Option<NewsApiConfig>,
    #[serde(default)]
    pub web_search: Option<WebSearchConfig>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_scheduled_batch_size")]
    pub scheduled_batch_size: usize,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

fn default_scheduled_batch_size() -> usize {
    DEFAULT_SCHEDULED_BATCH_SIZE
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            news: None,
            web_search: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            scheduled_batch_size: DEFAULT_SCHEDULED_BATCH_SIZE,
        }
    }
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// YAMLファイルから設定を読み込む
    ///
    /// ファイルが無い、読めない、YAMLとして解釈できない場合は`UnreadableConfigFile`
    pub fn from_yaml_file(path: &str) -> ConfigResult<Self> {
        load_yaml_from_file(path).map_err(|e| ConfigError::unreadable_config_file(path, e))
    }

    /// 名前から値を引く関数で設定を組み立てる（空文字は未設定扱い）
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let news = match get("NEWS_API_KEY") {
            Some(api_key) => {
                let mut config = NewsApiConfig::new(api_key);
                if let Some(base_url) = get("NEWS_API_BASE_URL") {
                    config.base_url = base_url;
                }
                config.language = get("NEWS_API_LANGUAGE");
                config.region = get("NEWS_API_REGION");
                if let Some(value) = get("NEWS_API_MAX_RESULTS") {
                    config.max_results = parse_value("NEWS_API_MAX_RESULTS", &value)?;
                }
                Some(config)
            }
            None => None,
        };

        let web_search = match get("SEARCH_API_KEY") {
            Some(api_key) => {
                let engine_id =
                    get("SEARCH_ENGINE_ID").ok_or_else(|| ConfigError::missing_env_var("SEARCH_ENGINE_ID"))?;
                let mut config = WebSearchConfig::new(api_key, engine_id);
                if let Some(base_url) = get("SEARCH_API_BASE_URL") {
                    config.base_url = base_url;
                }
                if let Some(value) = get("SEARCH_MAX_RESULTS") {
                    config.max_results = parse_value("SEARCH_MAX_RESULTS", &value)?;
                }
                Some(config)
            }
            None => None,
        };

        let request_timeout_secs = match get("REQUEST_TIMEOUT_SECS") {
            Some(value) => parse_value("REQUEST_TIMEOUT_SECS", &value)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };
        let scheduled_batch_size = match get("SCHEDULED_BATCH_SIZE") {
            Some(value) => parse_value("SCHEDULED_BATCH_SIZE", &value)?,
            None => DEFAULT_SCHEDULED_BATCH_SIZE,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            news,
            web_search,
            request_timeout_secs,
            scheduled_batch_size,
        })
    }

    /// DB接続文字列（未設定ならエラー）
    pub fn require_database_url(&self) -> ConfigResult<&str> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::missing_env_var("DATABASE_URL"))
    }

    /// 有効なプロバイダーを作成する（ニュース検索、Web検索の順）
    pub fn build_providers(
        &self,
        http: Arc<dyn HttpClient>,
    ) -> ConfigResult<Vec<Arc<dyn ArticleProvider>>> {
        let mut providers: Vec<Arc<dyn ArticleProvider>> = Vec::new();
        if let Some(ref news) = self.news {
            providers.push(Arc::new(NewsApiClient::new(
                http.clone(),
                news.clone(),
                self.request_timeout_secs,
            )));
        }
        if let Some(ref web_search) = self.web_search {
            providers.push(Arc::new(WebSearchClient::new(
                http,
                web_search.clone(),
                self.request_timeout_secs,
            )));
        }

        if providers.is_empty() {
            return Err(ConfigError::NoProviderEnabled);
        }
        Ok(providers)
    }
}

fn parse_value<T>(name: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: ToString,
{
    value
        .trim()
        .parse()
        .map_err(|e: T::Err| ConfigError::invalid_value(name, value, e))
}
