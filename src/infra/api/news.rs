use super::http::HttpClient;
use super::provider::{ArticleProvider, ProviderResponse, SourceKind};
use crate::domain::article::{NewArticle, DEFAULT_LANGUAGE};
use crate::infra::parser::published_date_or;
use crate::types::{FetchError, FetchResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use url::Url;

pub const DEFAULT_NEWS_API_BASE_URL: &str = "https://newsapi.org/v2";

/// ニュース検索APIの接続設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: String,
    /// 検索言語（例: "en"）。記事の言語コードにも使う
    #[serde(default)]
    pub language: Option<String>,
    /// 地域（例: "us"）
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_base_url() -> String {
    DEFAULT_NEWS_API_BASE_URL.to_string()
}

fn default_max_results() -> u32 {
    20
}

impl NewsApiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            api_key: api_key.into(),
            language: None,
            region: None,
            max_results: default_max_results(),
        }
    }

    /// 記事に付与する言語コード（検索言語が無ければEN）
    pub fn article_language(&self) -> String {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|language| !language.is_empty())
            .map(str::to_uppercase)
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string())
    }
}

/// ニュース検索APIのレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub articles: Option<Vec<NewsApiArticle>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsApiArticle {
    pub title: Option<String>,
    pub description: Option<String>,
    pub source: Option<NewsApiSource>,
    pub url: Option<String>,
    pub published_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsApiSource {
    pub name: Option<String>,
}

/// ニュース検索APIクライアント
pub struct NewsApiClient {
    http: Arc<dyn HttpClient>,
    config: NewsApiConfig,
    timeout_secs: u64,
}

impl NewsApiClient {
    pub fn new(http: Arc<dyn HttpClient>, config: NewsApiConfig, timeout_secs: u64) -> Self {
        Self {
            http,
            config,
            timeout_secs,
        }
    }

    /// 検索リクエストのURLを組み立てる
    pub fn request_url(&self, keywords: &str) -> FetchResult<Url> {
        let endpoint = format!("{}/everything", self.config.base_url.trim_end_matches('/'));
        let page_size = self.config.max_results.to_string();

        let mut params: Vec<(&str, &str)> = vec![("q", keywords)];
        if let Some(ref language) = self.config.language {
            params.push(("language", language.as_str()));
        }
        if let Some(ref region) = self.config.region {
            params.push(("country", region.as_str()));
        }
        params.push(("pageSize", page_size.as_str()));
        params.push(("apiKey", self.config.api_key.as_str()));

        Url::parse_with_params(&endpoint, &params).map_err(|e| {
            FetchError::external_provider(SourceKind::NewsSearch.as_str(), e.to_string())
        })
    }
}

/// レスポンス本文を解析する。provider側のエラー報告も失敗として扱う
pub fn parse_news_response(body: &str) -> FetchResult<NewsApiResponse> {
    let provider = SourceKind::NewsSearch.as_str();
    let response: NewsApiResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::external_provider(provider, format!("レスポンスの解析に失敗: {}", e))
    })?;

    if response.status.as_deref() == Some("error") {
        let message = response
            .message
            .clone()
            .unwrap_or_else(|| "不明なエラー".to_string());
        return Err(FetchError::external_provider(provider, message));
    }
    if response.articles.is_none() {
        return Err(FetchError::external_provider(
            provider,
            "レスポンスにarticlesがありません",
        ));
    }
    Ok(response)
}

/// ニュース検索APIの記事を共通の記事形式に変換する
///
/// タイトルかURLが無い記事は除外する。概要が無い場合はタイトルを使う。
pub fn normalize_news_articles(
    response: NewsApiResponse,
    language: &str,
    today: NaiveDate,
) -> Vec<NewArticle> {
    response
        .articles
        .unwrap_or_default()
        .into_iter()
        .filter_map(|item| {
            let title = non_empty(item.title)?;
            let url = non_empty(item.url)?;
            let summary = non_empty(item.description).unwrap_or_else(|| title.clone());
            let source = item
                .source
                .and_then(|source| non_empty(source.name))
                .or_else(|| host_of(&url))
                .unwrap_or_else(|| url.clone());

            Some(NewArticle {
                date: published_date_or(item.published_at.as_deref(), today),
                title,
                summary,
                source,
                url,
                language: language.to_string(),
            })
        })
        .collect()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// URLのホスト名
pub(crate) fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
}

#[async_trait]
impl ArticleProvider for NewsApiClient {
    fn kind(&self) -> SourceKind {
        SourceKind::NewsSearch
    }

    async fn search(&self, keywords: &str) -> FetchResult<ProviderResponse> {
        let url = self.request_url(keywords)?;
        debug!("ニュース検索API呼び出し: q={}", keywords);

        let body = self
            .http
            .fetch_text(url.as_str(), self.timeout_secs)
            .await
            .map_err(|e| {
                // URLにAPIキーが含まれるためエラー文からは除く
                let mut message = format!("{:#}", e);
                if !self.config.api_key.is_empty() {
                    message = message.replace(&self.config.api_key, "***");
                }
                FetchError::external_provider(SourceKind::NewsSearch.as_str(), message)
            })?;

        Ok(ProviderResponse::News {
            response: parse_news_response(&body)?,
            language: self.config.article_language(),
        })
    }
}
