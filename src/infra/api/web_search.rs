use super::http::HttpClient;
use super::news::host_of;
use super::provider::{ArticleProvider, ProviderResponse, SourceKind};
use crate::domain::article::{NewArticle, DEFAULT_LANGUAGE};
use crate::infra::parser::published_date_or;
use crate::infra::scrape::{truncate_summary, PageMetadata, MAX_SUMMARY_CHARS};
use crate::types::{FetchError, FetchResult};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_SEARCH_API_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// 汎用Web検索API（Google Custom Search形式）の接続設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebSearchConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub api_key: String,
    /// 検索エンジンID（cx）
    pub engine_id: String,
    #[serde(default = "default_max_results")]
    pub max_results: u32,
}

fn default_base_url() -> String {
    DEFAULT_SEARCH_API_BASE_URL.to_string()
}

fn default_max_results() -> u32 {
    10
}

impl WebSearchConfig {
    pub fn new(api_key: impl Into<String>, engine_id: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            api_key: api_key.into(),
            engine_id: engine_id.into(),
            max_results: default_max_results(),
        }
    }
}

/// Web検索APIのレスポンス
#[derive(Debug, Clone, Deserialize)]
pub struct WebSearchResponse {
    /// 検索結果が0件の場合は省略される
    #[serde(default)]
    pub items: Vec<WebSearchItem>,
    #[serde(default)]
    pub error: Option<WebSearchApiError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSearchItem {
    pub title: Option<String>,
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebSearchApiError {
    #[serde(default)]
    pub message: Option<String>,
}

/// 検索結果1件とリンク先ページから抽出した情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedSearchResult {
    pub title: String,
    pub link: String,
    pub snippet: Option<String>,
    pub page: PageMetadata,
}

/// 汎用Web検索APIクライアント
///
/// 検索結果のリンク先を1件ずつ取得し、概要をスクレイピングする。
pub struct WebSearchClient {
    http: Arc<dyn HttpClient>,
    config: WebSearchConfig,
    timeout_secs: u64,
}

impl WebSearchClient {
    pub fn new(http: Arc<dyn HttpClient>, config: WebSearchConfig, timeout_secs: u64) -> Self {
        Self {
            http,
            config,
            timeout_secs,
        }
    }

    /// 検索リクエストのURLを組み立てる
    pub fn request_url(&self, keywords: &str) -> FetchResult<Url> {
        let num = self.config.max_results.clamp(1, 10).to_string();
        Url::parse_with_params(
            &self.config.base_url,
            &[
                ("key", self.config.api_key.as_str()),
                ("cx", self.config.engine_id.as_str()),
                ("q", keywords),
                ("num", num.as_str()),
            ],
        )
        .map_err(|e| FetchError::external_provider(SourceKind::WebSearch.as_str(), e.to_string()))
    }

    /// リンク先ページを取得して概要を抽出する。取得できなければNone
    async fn scrape(&self, title: String, link: String, snippet: Option<String>) -> Option<ScrapedSearchResult> {
        match self.http.fetch_text(&link, self.timeout_secs).await {
            Ok(html) => Some(ScrapedSearchResult {
                page: PageMetadata::from_html(&html),
                title,
                link,
                snippet,
            }),
            Err(e) => {
                warn!("  リンク先の取得に失敗したためスキップ: {} - {:#}", link, e);
                None
            }
        }
    }
}

/// レスポンス本文を解析する
pub fn parse_search_response(body: &str) -> FetchResult<WebSearchResponse> {
    let provider = SourceKind::WebSearch.as_str();
    let response: WebSearchResponse = serde_json::from_str(body).map_err(|e| {
        FetchError::external_provider(provider, format!("レスポンスの解析に失敗: {}", e))
    })?;

    if let Some(ref error) = response.error {
        let message = error
            .message
            .clone()
            .unwrap_or_else(|| "不明なエラー".to_string());
        return Err(FetchError::external_provider(provider, message));
    }
    Ok(response)
}

/// スクレイピング済みの検索結果を共通の記事形式に変換する
///
/// 概要はページの説明、検索スニペット、タイトルの順で採用する。
/// 掲載元はリンクのホスト名。言語はEN。
pub fn normalize_search_results(results: Vec<ScrapedSearchResult>, today: NaiveDate) -> Vec<NewArticle> {
    results
        .into_iter()
        .map(|result| {
            let summary = result
                .page
                .summary
                .or_else(|| {
                    result
                        .snippet
                        .map(|s| s.split_whitespace().collect::<Vec<_>>().join(" "))
                        .filter(|s| !s.is_empty())
                        .map(|s| truncate_summary(&s, MAX_SUMMARY_CHARS))
                })
                .unwrap_or_else(|| result.title.clone());

            NewArticle {
                source: host_of(&result.link).unwrap_or_else(|| result.link.clone()),
                date: published_date_or(result.page.published_at.as_deref(), today),
                title: result.title,
                summary,
                url: result.link,
                language: DEFAULT_LANGUAGE.to_string(),
            }
        })
        .collect()
}

#[async_trait]
impl ArticleProvider for WebSearchClient {
    fn kind(&self) -> SourceKind {
        SourceKind::WebSearch
    }

    async fn search(&self, keywords: &str) -> FetchResult<ProviderResponse> {
        let url = self.request_url(keywords)?;
        debug!("Web検索API呼び出し: q={}", keywords);

        let body = self
            .http
            .fetch_text(url.as_str(), self.timeout_secs)
            .await
            .map_err(|e| {
                let mut message = format!("{:#}", e);
                if !self.config.api_key.is_empty() {
                    message = message.replace(&self.config.api_key, "***");
                }
                FetchError::external_provider(SourceKind::WebSearch.as_str(), message)
            })?;
        let response = parse_search_response(&body)?;
        debug!("  検索結果{}件のリンク先を取得", response.items.len());

        let mut results = Vec::new();
        for item in response.items {
            let (Some(title), Some(link)) = (item.title, item.link) else {
                continue;
            };
            if let Some(result) = self.scrape(title, link, item.snippet).await {
                results.push(result);
            }
        }

        Ok(ProviderResponse::WebSearch(results))
    }
}
