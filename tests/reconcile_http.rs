//! 記事取得の統合テスト
//!
//! 実際のHTTPクライアント（reqwest）でモックサーバーに接続し、
//! 設定の読み込みから記事・履歴の保存、掲載元ごとの一覧表示までを確認する。


use filmpress::app::{workflow, AppConfig};
use filmpress::domain::history::FetchStatus;
use filmpress::infra::api::{ReqwestHttpClient, SourceKind};
use filmpress::infra::storage::MemoryStore;
use filmpress::task::Reconciler;
use mock_server::ProviderMockServer;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn app_config(server: &ProviderMockServer, timeout_secs: u64) -> AppConfig {
    let vars = [
        ("NEWS_API_KEY", "news-key".to_string()),
        ("NEWS_API_BASE_URL", server.news_base_url()),
        ("NEWS_API_LANGUAGE", "en".to_string()),
        ("SEARCH_API_KEY", "search-key".to_string()),
        ("SEARCH_ENGINE_ID", "engine".to_string()),
        ("SEARCH_API_BASE_URL", server.search_url()),
        ("REQUEST_TIMEOUT_SECS", timeout_secs.to_string()),
    ];
    AppConfig::from_lookup(|name| {
        vars.iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone())
    })
    .expect("設定の読み込みに失敗")
}

fn setup(server: &ProviderMockServer) -> (Arc<MemoryStore>, Reconciler) {
    setup_with_timeout(server, 5)
}

fn setup_with_timeout(
    server: &ProviderMockServer,
    timeout_secs: u64,
) -> (Arc<MemoryStore>, Reconciler) {
    let config = app_config(server, timeout_secs);
    let providers = config
        .build_providers(Arc::new(ReqwestHttpClient::new()))
        .expect("プロバイダーが有効になっていない");
    let store = Arc::new(MemoryStore::new());
    let reconciler = Reconciler::new(providers, store.clone(), store.clone());
    (store, reconciler)
}

fn news_articles() -> serde_json::Value {
    json!([
        {"source": {"name": "www.variety.com"}, "title": "Premiere at Sundance",
         "description": "The documentary premieres", "url": "https://variety.com/premiere",
         "publishedAt": "2025-01-20T15:00:00Z"},
        {"source": {"name": "variety.com"}, "title": "Interview with the director",
         "description": "A conversation", "url": "https://variety.com/interview",
         "publishedAt": "2025-01-25T09:00:00Z"},
        {"source": {"name": "IndieWire"}, "title": "Review",
         "description": "Four stars", "url": "https://indiewire.com/review",
         "publishedAt": "2025-01-22T12:00:00Z"}
    ])
}

#[tokio::test]
async fn test_manual_fetch_end_to_end() {
    let server = ProviderMockServer::start();
    server.mock_news_success("documentary", news_articles());
    server.mock_search_results(
        "documentary",
        &[
            ("Festival blog", server.page_url("blog")),
            ("Magazine story", server.page_url("magazine")),
            ("Removed page", server.page_url("removed")),
        ],
    );
    server.mock_page(
        "blog",
        r#"<html><head><meta name="description" content="A festival favourite"></head></html>"#,
    );
    server.mock_page(
        "magazine",
        &format!("<html><body><p>{}</p></body></html>", "x".repeat(700)),
    );
    server.mock_page_not_found("removed");

    let (store, reconciler) = setup(&server);
    let result = workflow::trigger_manual(store.as_ref(), &reconciler, "documentary!!", "admin")
        .await
        .expect("手動トリガーが失敗");

    assert_eq!(result.total_articles, 5, "ニュース3件 + Web検索2件");
    assert_eq!(result.per_config.len(), 2);
    assert_eq!(result.per_config[0].source, Some(SourceKind::NewsSearch));
    assert_eq!(result.per_config[0].count, 3);
    assert_eq!(result.per_config[1].source, Some(SourceKind::WebSearch));
    assert_eq!(result.per_config[1].count, 2);

    let history = store.history_entries().await;
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|h| h.status == FetchStatus::Success));

    let groups = workflow::list_grouped_articles(store.as_ref(), None)
        .await
        .expect("一覧の取得に失敗");
    let variety = groups
        .iter()
        .find(|group| group.source == "variety.com")
        .expect("www.の有無に関わらず同じ掲載元になる");
    assert_eq!(variety.articles.len(), 2);
    assert_eq!(variety.articles[0].title, "Interview with the director");

    let magazine = groups
        .iter()
        .flat_map(|group| group.articles.iter())
        .find(|article| article.title == "Magazine story")
        .expect("スクレイピングした記事が保存されていない");
    assert_eq!(magazine.summary.chars().count(), 503);
    assert!(magazine.summary.ends_with("..."));

    println!("✅ 手動記事取得の統合テスト完了: {}件", result.total_articles);
}

#[tokio::test]
async fn test_scheduled_fetch_continues_after_server_error() {
    let server = ProviderMockServer::start();
    server.mock_news_server_error("broken");
    server.mock_search_results("broken", &[]);
    server.mock_news_success("festival", news_articles());
    server.mock_search_results("festival", &[]);

    let (store, reconciler) = setup(&server);
    // 古い順に保存し、定期実行では新しい順に処理される
    for keywords in ["festival", "broken"] {
        filmpress::domain::fetch_config::ConfigurationRepository::insert(
            store.as_ref(),
            &filmpress::domain::fetch_config::NewFetchConfiguration::new(keywords, "scheduler"),
        )
        .await
        .expect("設定の保存に失敗");
    }

    let result = workflow::trigger_scheduled(store.as_ref(), &reconciler, 3)
        .await
        .expect("定期トリガーが失敗");

    assert_eq!(result.total_articles, 3);
    let statuses: Vec<(Option<SourceKind>, FetchStatus, usize)> = result
        .per_config
        .iter()
        .map(|outcome| (outcome.source, outcome.status, outcome.count))
        .collect();
    assert_eq!(
        statuses,
        vec![
            (Some(SourceKind::NewsSearch), FetchStatus::Error, 0),
            (Some(SourceKind::WebSearch), FetchStatus::Success, 0),
            (Some(SourceKind::NewsSearch), FetchStatus::Success, 3),
            (Some(SourceKind::WebSearch), FetchStatus::Success, 0),
        ]
    );
    let error = result.per_config[0].error.as_deref().unwrap();
    assert!(error.contains("HTTP 500"), "{}", error);
    assert!(!error.contains("news-key"), "APIキーが漏れている: {}", error);

    let history = workflow::list_history(store.as_ref(), 10)
        .await
        .expect("履歴の取得に失敗");
    assert_eq!(history.len(), 4);
    assert_eq!(history[3].keywords.as_deref(), Some("broken"));
    assert_eq!(history[3].entry.status, FetchStatus::Error);
}

#[tokio::test]
async fn test_provider_timeout_is_recorded_and_batch_continues() {
    let server = ProviderMockServer::start();
    server.mock_news_slow("slow", Duration::from_secs(3));
    server.mock_search_results("slow", &[]);
    server.mock_news_success("festival", news_articles());
    server.mock_search_results("festival", &[]);

    let (store, reconciler) = setup_with_timeout(&server, 1);
    for keywords in ["festival", "slow"] {
        filmpress::domain::fetch_config::ConfigurationRepository::insert(
            store.as_ref(),
            &filmpress::domain::fetch_config::NewFetchConfiguration::new(keywords, "scheduler"),
        )
        .await
        .expect("設定の保存に失敗");
    }

    let result = workflow::trigger_scheduled(store.as_ref(), &reconciler, 3)
        .await
        .expect("定期トリガーが失敗");

    // "slow"が先に処理され、ニュース検索だけがタイムアウトする
    assert_eq!(result.per_config[0].source, Some(SourceKind::NewsSearch));
    assert_eq!(result.per_config[0].status, FetchStatus::Error);
    assert_eq!(result.per_config[0].count, 0);
    assert!(result.per_config[0].history_recorded);
    assert_eq!(result.per_config[1].status, FetchStatus::Success);
    assert_eq!(result.per_config[2].status, FetchStatus::Success);
    assert_eq!(result.per_config[2].count, 3);
    assert_eq!(result.total_articles, 3, "タイムアウト後も残りの設定を処理する");

    let history = store.history_entries().await;
    assert_eq!(history.len(), 4);
    assert_eq!(history[0].status, FetchStatus::Error);
    assert_eq!(history[0].articles_count, 0);
    assert!(history[0].error.is_some());

    println!("✅ タイムアウトを履歴に記録して処理継続");
}
