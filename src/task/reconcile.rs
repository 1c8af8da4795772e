use crate::{
    domain::{
        article::ArticleRepository,
        fetch_config::FetchConfiguration,
        history::{FetchStatus, HistoryRepository, NewFetchHistoryEntry},
        keyword::clean_keywords,
    },
    infra::api::{ArticleProvider, SourceKind},
    types::{FetchError, FetchResult},
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// 設定1件・取得方式1つ分の処理結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigOutcome {
    pub configuration_id: Uuid,
    /// キーワードが不正で取得まで進まなかった場合はNone
    pub source: Option<SourceKind>,
    pub count: usize,
    pub status: FetchStatus,
    pub error: Option<String>,
    /// 履歴の書き込みに成功したか
    pub history_recorded: bool,
}

/// リコンサイル1回分の集計結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationResult {
    pub total_articles: usize,
    pub per_config: Vec<ConfigOutcome>,
}

impl ReconciliationResult {
    /// エラーになった取得の数
    pub fn error_count(&self) -> usize {
        self.per_config
            .iter()
            .filter(|outcome| outcome.status == FetchStatus::Error)
            .count()
    }
}

/// 記事取得設定を外部プロバイダーの検索結果と突き合わせて記事を保存する
///
/// 設定は1件ずつ順番に処理し、設定単位のエラーは履歴に記録して次へ進む。
pub struct Reconciler {
    providers: Vec<Arc<dyn ArticleProvider>>,
    articles: Arc<dyn ArticleRepository>,
    history: Arc<dyn HistoryRepository>,
}

impl Reconciler {
    pub fn new(
        providers: Vec<Arc<dyn ArticleProvider>>,
        articles: Arc<dyn ArticleRepository>,
        history: Arc<dyn HistoryRepository>,
    ) -> Self {
        Self {
            providers,
            articles,
            history,
        }
    }

    /// 有効なプロバイダーの取得方式（設定順）
    pub fn source_kinds(&self) -> Vec<SourceKind> {
        self.providers.iter().map(|provider| provider.kind()).collect()
    }

    /// 設定を順番に処理する。全件失敗しても結果は返す
    pub async fn reconcile(&self, configs: &[FetchConfiguration]) -> ReconciliationResult {
        info!("--- 記事取得開始: 設定{}件 ---", configs.len());
        let mut result = ReconciliationResult::default();

        for config in configs {
            info!("設定処理中: {}", config);

            let keywords = match clean_keywords(&config.keywords) {
                Ok(keywords) => keywords,
                Err(e) => {
                    warn!("  キーワードエラー: {}", e);
                    let outcome = self.record(config.id, None, Err(e)).await;
                    result.per_config.push(outcome);
                    continue;
                }
            };

            for provider in &self.providers {
                let kind = provider.kind();
                let fetched = self.fetch_and_store(provider.as_ref(), &keywords).await;
                match fetched {
                    Ok(count) => info!("  [{}] {}件の記事を保存", kind, count),
                    Err(ref e) => warn!("  [{}] 取得エラー: {}", kind, e),
                }

                let outcome = self.record(config.id, Some(kind), fetched).await;
                result.total_articles += outcome.count;
                result.per_config.push(outcome);
            }
        }

        info!(
            "--- 記事取得完了: 保存{}件, エラー{}件 ---",
            result.total_articles,
            result.error_count()
        );
        result
    }

    /// 1つのプロバイダーで検索し、正規化した記事を保存して件数を返す
    async fn fetch_and_store(
        &self,
        provider: &dyn ArticleProvider,
        keywords: &str,
    ) -> FetchResult<usize> {
        let response = provider.search(keywords).await?;
        let articles = response.into_articles(Utc::now().date_naive());
        if articles.is_empty() {
            return Ok(0);
        }

        self.articles
            .insert_many(&articles)
            .await
            .map_err(|e| FetchError::persistence("insert_many", &e))
    }

    /// 処理結果を履歴に書き込み、集計用の結果にする
    async fn record(
        &self,
        configuration_id: Uuid,
        source: Option<SourceKind>,
        fetched: FetchResult<usize>,
    ) -> ConfigOutcome {
        let (entry, count, error_message) = match fetched {
            Ok(count) => (
                NewFetchHistoryEntry::success(configuration_id, count),
                count,
                None,
            ),
            Err(e) => {
                let message = e.to_string();
                (
                    NewFetchHistoryEntry::error(configuration_id, message.clone()),
                    0,
                    Some(message),
                )
            }
        };

        let history_recorded = match self.history.insert(&entry).await {
            Ok(_) => true,
            Err(e) => {
                error!("  履歴の保存に失敗: {} - {:#}", configuration_id, e);
                false
            }
        };

        ConfigOutcome {
            configuration_id,
            source,
            count,
            status: entry.status(),
            error: error_message,
            history_recorded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::article::{Article, ArticlePatch, ArticleQuery, NewArticle};
    use crate::domain::fetch_config::{ConfigurationRepository, NewFetchConfiguration};
    use crate::infra::api::{
        MockHttpClient, NewsApiClient, NewsApiConfig, WebSearchClient, WebSearchConfig,
    };
    use crate::infra::storage::MemoryStore;
    use anyhow::{bail, Result};
    use async_trait::async_trait;
    use serde_json::json;

    const NEWS_URL: &str = "https://news.test/v2/everything";
    const SEARCH_URL: &str = "https://search.test/customsearch/v1";

    fn news_body() -> String {
        json!({
            "status": "ok",
            "articles": [
                {"source": {"name": "Variety"}, "title": "Premiere", "description": "d1",
                 "url": "https://variety.com/1", "publishedAt": "2025-01-20T00:00:00Z"},
                {"source": {"name": "IndieWire"}, "title": "Review", "description": "d2",
                 "url": "https://indiewire.com/2", "publishedAt": "2025-01-18T00:00:00Z"},
                {"source": {"name": "Variety"}, "title": "Interview", "description": "d3",
                 "url": "https://variety.com/3", "publishedAt": "2025-01-22T00:00:00Z"}
            ]
        })
        .to_string()
    }

    fn search_body() -> String {
        json!({
            "items": [
                {"title": "Blog post", "link": "https://www.filmblog.test/post", "snippet": "s1"},
                {"title": "Magazine", "link": "https://magazine.test/story", "snippet": "s2"}
            ]
        })
        .to_string()
    }

    fn routed_http() -> MockHttpClient {
        MockHttpClient::new_error("未登録URL")
            .route(NEWS_URL, &news_body())
            .route(SEARCH_URL, &search_body())
            .route(
                "https://www.filmblog.test/",
                r#"<meta name="description" content="Blog summary">"#,
            )
            .route("https://magazine.test/", "<p>Magazine paragraph</p>")
    }

    fn providers(http: Arc<MockHttpClient>) -> Vec<Arc<dyn ArticleProvider>> {
        let mut news = NewsApiConfig::new("news-key");
        news.base_url = "https://news.test/v2".to_string();
        let mut search = WebSearchConfig::new("search-key", "engine");
        search.base_url = SEARCH_URL.to_string();

        let news: Arc<dyn ArticleProvider> = Arc::new(NewsApiClient::new(http.clone(), news, 5));
        let search: Arc<dyn ArticleProvider> = Arc::new(WebSearchClient::new(http, search, 5));
        vec![news, search]
    }

    fn setup(http: MockHttpClient) -> (Arc<MockHttpClient>, Arc<MemoryStore>, Reconciler) {
        let http = Arc::new(http);
        let store = Arc::new(MemoryStore::new());
        let reconciler = Reconciler::new(providers(http.clone()), store.clone(), store.clone());
        (http, store, reconciler)
    }

    async fn new_config(store: &MemoryStore, keywords: &str) -> FetchConfiguration {
        ConfigurationRepository::insert(store, &NewFetchConfiguration::new(keywords, "admin"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_reconcile_both_sources() {
        let (_, store, reconciler) = setup(routed_http());
        let config = new_config(&store, "documentary film").await;

        let result = reconciler.reconcile(&[config.clone()]).await;

        assert_eq!(result.total_articles, 5, "ニュース3件 + Web検索2件");
        assert_eq!(store.article_count().await, 5);

        let history = store.history_entries().await;
        assert_eq!(history.len(), 2, "取得方式ごとに1件ずつ履歴を記録");
        assert!(history.iter().all(|h| h.status == FetchStatus::Success));
        assert_eq!(history[0].articles_count, 3);
        assert_eq!(history[1].articles_count, 2);
        assert!(history.iter().all(|h| h.configuration_id == config.id));

        let sources: Vec<Option<SourceKind>> = result.per_config.iter().map(|o| o.source).collect();
        assert_eq!(
            sources,
            vec![Some(SourceKind::NewsSearch), Some(SourceKind::WebSearch)]
        );
        println!("✅ 2方式のリコンサイル完了: {}件", result.total_articles);
    }

    #[tokio::test]
    async fn test_provider_failure_does_not_stop_batch() {
        // 1件目の設定はニュース検索が500、2件目は成功（Web検索は無効）
        let http = Arc::new(MockHttpClient::new_success(&news_body()).route_error(
            "https://news.test/v2/everything?q=broken",
            "HTTP 500 Internal Server Error",
        ));
        let store = Arc::new(MemoryStore::new());
        let mut news = NewsApiConfig::new("news-key");
        news.base_url = "https://news.test/v2".to_string();
        let provider: Arc<dyn ArticleProvider> = Arc::new(NewsApiClient::new(http, news, 5));
        let reconciler = Reconciler::new(
            vec![provider],
            store.clone(),
            store.clone(),
        );

        let first = new_config(&store, "broken").await;
        let second = new_config(&store, "documentary").await;
        let result = reconciler.reconcile(&[first, second]).await;

        assert_eq!(result.total_articles, 3);
        assert_eq!(result.per_config.len(), 2);
        assert_eq!(result.per_config[0].status, FetchStatus::Error);
        assert_eq!(result.per_config[0].count, 0);
        assert!(result.per_config[0]
            .error
            .as_deref()
            .unwrap()
            .contains("HTTP 500"));
        assert_eq!(result.per_config[1].status, FetchStatus::Success);
        assert_eq!(result.per_config[1].count, 3);

        let history = store.history_entries().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, FetchStatus::Error);
        assert!(history[0].error.is_some());
        assert_eq!(history[1].articles_count, 3);
        println!("✅ プロバイダーエラー後も処理継続");
    }

    #[tokio::test]
    async fn test_invalid_keyword_records_error_without_http() {
        let (http, store, reconciler) = setup(routed_http());
        let config = new_config(&store, "!!!").await;

        let result = reconciler.reconcile(&[config]).await;

        assert_eq!(result.total_articles, 0);
        assert_eq!(result.per_config.len(), 1, "キーワードエラーは設定につき1件");
        assert_eq!(result.per_config[0].source, None);
        assert_eq!(result.per_config[0].status, FetchStatus::Error);
        assert!(http.requested_urls().is_empty(), "外部APIは呼ばれない");

        let history = store.history_entries().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].articles_count, 0);
        assert!(history[0].error.as_deref().unwrap().contains("!!!"));
    }

    #[tokio::test]
    async fn test_reconcile_twice_inserts_duplicates() {
        let (_, store, reconciler) = setup(routed_http());
        let config = new_config(&store, "documentary").await;

        reconciler.reconcile(&[config.clone()]).await;
        let second = reconciler.reconcile(&[config]).await;

        assert_eq!(second.total_articles, 5);
        assert_eq!(store.article_count().await, 10, "重複排除は行わない");
        assert_eq!(store.history_entries().await.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_input() {
        let (http, _, reconciler) = setup(routed_http());
        let result = reconciler.reconcile(&[]).await;
        assert_eq!(result, ReconciliationResult::default());
        assert!(http.requested_urls().is_empty());
    }

    struct FailingArticles;

    #[async_trait]
    impl ArticleRepository for FailingArticles {
        async fn insert_many(&self, _: &[NewArticle]) -> Result<usize> {
            bail!("接続が切断されました")
        }
        async fn list_all(&self, _: Option<ArticleQuery>) -> Result<Vec<Article>> {
            Ok(Vec::new())
        }
        async fn find_by_id(&self, _: Uuid) -> Result<Option<Article>> {
            Ok(None)
        }
        async fn delete_by_id(&self, _: Uuid) -> Result<()> {
            Ok(())
        }
        async fn update_by_id(&self, _: Uuid, _: &ArticlePatch) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_persistence_failure_is_isolated() {
        let http = Arc::new(routed_http());
        let store = Arc::new(MemoryStore::new());
        let reconciler = Reconciler::new(providers(http), Arc::new(FailingArticles), store.clone());

        let first = new_config(&store, "one").await;
        let second = new_config(&store, "two").await;
        let result = reconciler.reconcile(&[first, second]).await;

        assert_eq!(result.total_articles, 0);
        assert_eq!(result.per_config.len(), 4, "設定2件 × 取得方式2つ");
        for outcome in &result.per_config {
            assert_eq!(outcome.status, FetchStatus::Error);
            assert!(outcome.error.as_deref().unwrap().contains("接続が切断されました"));
            assert!(outcome.history_recorded);
        }
    }

    #[tokio::test]
    async fn test_history_failure_is_reported() {
        // 設定を保存していないストアでは履歴の書き込みが失敗する
        let http = Arc::new(routed_http());
        let store = Arc::new(MemoryStore::new());
        let reconciler = Reconciler::new(providers(http), store.clone(), store.clone());
        let orphan = FetchConfiguration {
            id: Uuid::new_v4(),
            keywords: "documentary".to_string(),
            created_by: "admin".to_string(),
            created_at: Utc::now(),
        };

        let result = reconciler.reconcile(&[orphan]).await;

        assert_eq!(result.total_articles, 5, "記事の保存は履歴と独立");
        assert!(result.per_config.iter().all(|o| !o.history_recorded));
        assert!(store.history_entries().await.is_empty());
    }
}
