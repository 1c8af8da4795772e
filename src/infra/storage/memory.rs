use crate::domain::article::{Article, ArticlePatch, ArticleQuery, ArticleRepository, NewArticle};
use crate::domain::fetch_config::{
    ConfigurationRepository, FetchConfiguration, NewFetchConfiguration,
};
use crate::domain::history::{
    FetchHistoryEntry, FetchHistoryRecord, HistoryRepository, NewFetchHistoryEntry,
};
use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Reverse;
use tokio::sync::RwLock;
use uuid::Uuid;

/// インメモリのストレージ実装
///
/// 記事・記事取得設定・履歴の3つのリポジトリを1つで提供する。
/// テストとDBを使わない実行（--memory）で使用する。
#[derive(Default)]
pub struct MemoryStore {
    articles: RwLock<Vec<Article>>,
    configurations: RwLock<Vec<FetchConfiguration>>,
    history: RwLock<Vec<FetchHistoryEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存済みの記事数
    pub async fn article_count(&self) -> usize {
        self.articles.read().await.len()
    }

    /// 保存済みの履歴（挿入順）
    pub async fn history_entries(&self) -> Vec<FetchHistoryEntry> {
        self.history.read().await.clone()
    }
}

#[async_trait]
impl ArticleRepository for MemoryStore {
    async fn insert_many(&self, articles: &[NewArticle]) -> Result<usize> {
        let now = Utc::now();
        let mut stored = self.articles.write().await;
        stored.extend(
            articles
                .iter()
                .cloned()
                .map(|article| article.into_article(Uuid::new_v4(), now)),
        );
        Ok(articles.len())
    }

    async fn list_all(&self, query: Option<ArticleQuery>) -> Result<Vec<Article>> {
        let query = query.unwrap_or_default();
        let mut articles: Vec<Article> = self
            .articles
            .read()
            .await
            .iter()
            .filter(|article| match query.language {
                Some(ref language) => article.language == *language,
                None => true,
            })
            .cloned()
            .collect();

        // 日付の降順（解釈できない日付は末尾）。同日は新しく挿入した順
        articles.reverse();
        articles.sort_by_key(|article| Reverse(article.parsed_date()));
        Ok(articles)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>> {
        Ok(self
            .articles
            .read()
            .await
            .iter()
            .find(|article| article.id == id)
            .cloned())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<()> {
        let mut articles = self.articles.write().await;
        let before = articles.len();
        articles.retain(|article| article.id != id);
        if articles.len() == before {
            bail!("記事が見つかりません: {}", id);
        }
        Ok(())
    }

    async fn update_by_id(&self, id: Uuid, patch: &ArticlePatch) -> Result<()> {
        let mut articles = self.articles.write().await;
        let Some(article) = articles.iter_mut().find(|article| article.id == id) else {
            bail!("記事が見つかりません: {}", id);
        };
        if !patch.is_empty() {
            patch.apply_to(article);
            article.updated_at = Some(Utc::now());
        }
        Ok(())
    }
}

#[async_trait]
impl ConfigurationRepository for MemoryStore {
    async fn insert(&self, config: &NewFetchConfiguration) -> Result<FetchConfiguration> {
        let saved = FetchConfiguration {
            id: Uuid::new_v4(),
            keywords: config.keywords.clone(),
            created_by: config.created_by.clone(),
            created_at: Utc::now(),
        };
        self.configurations.write().await.push(saved.clone());
        Ok(saved)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<FetchConfiguration>> {
        Ok(self
            .configurations
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn find_by_keywords(&self, keywords: &str) -> Result<Option<FetchConfiguration>> {
        Ok(self
            .configurations
            .read()
            .await
            .iter()
            .rev()
            .find(|config| config.keywords == keywords)
            .cloned())
    }
}

#[async_trait]
impl HistoryRepository for MemoryStore {
    async fn insert(&self, entry: &NewFetchHistoryEntry) -> Result<FetchHistoryEntry> {
        let known = self
            .configurations
            .read()
            .await
            .iter()
            .any(|config| config.id == entry.configuration_id());
        if !known {
            bail!("記事取得設定が存在しません: {}", entry.configuration_id());
        }

        let saved = entry.clone().into_entry(Uuid::new_v4(), Utc::now());
        self.history.write().await.push(saved.clone());
        Ok(saved)
    }

    async fn list_recent(
        &self,
        limit: usize,
        with_config: bool,
    ) -> Result<Vec<FetchHistoryRecord>> {
        let configurations = self.configurations.read().await;
        Ok(self
            .history
            .read()
            .await
            .iter()
            .rev()
            .take(limit)
            .map(|entry| FetchHistoryRecord {
                keywords: with_config
                    .then(|| {
                        configurations
                            .iter()
                            .find(|config| config.id == entry.configuration_id)
                            .map(|config| config.keywords.clone())
                    })
                    .flatten(),
                entry: entry.clone(),
            })
            .collect())
    }
}
