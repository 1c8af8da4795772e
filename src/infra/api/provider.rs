use super::news::{normalize_news_articles, NewsApiResponse};
use super::web_search::{normalize_search_results, ScrapedSearchResult};
use crate::domain::article::NewArticle;
use crate::types::FetchResult;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// 記事取得の方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// ニュース検索API（タイトル・概要などを直接返す）
    NewsSearch,
    /// 汎用Web検索API（リンク先をスクレイピングする）
    WebSearch,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::NewsSearch => "news_search",
            SourceKind::WebSearch => "web_search",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// プロバイダーごとに形の異なるレスポンス
#[derive(Debug, Clone)]
pub enum ProviderResponse {
    News {
        response: NewsApiResponse,
        /// 記事に付与する言語コード
        language: String,
    },
    WebSearch(Vec<ScrapedSearchResult>),
}

impl ProviderResponse {
    /// 方式ごとの正規化関数で共通の記事形式に変換する
    pub fn into_articles(self, today: NaiveDate) -> Vec<NewArticle> {
        match self {
            ProviderResponse::News { response, language } => {
                normalize_news_articles(response, &language, today)
            }
            ProviderResponse::WebSearch(results) => normalize_search_results(results, today),
        }
    }
}

/// 外部の記事取得元の抽象化トレイト
#[async_trait]
pub trait ArticleProvider: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// クリーニング済みキーワードで検索する。
    /// 通信エラー、非成功ステータス、不正なレスポンスは`FetchError::ExternalProvider`。
    async fn search(&self, keywords: &str) -> FetchResult<ProviderResponse>;
}
