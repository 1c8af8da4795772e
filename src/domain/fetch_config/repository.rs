use super::model::{FetchConfiguration, NewFetchConfiguration};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

/// 記事取得設定ストレージの抽象化トレイト
#[async_trait]
pub trait ConfigurationRepository: Send + Sync {
    /// 設定を保存し、id・作成日時が付与された設定を返す
    async fn insert(&self, config: &NewFetchConfiguration) -> Result<FetchConfiguration>;

    /// 作成日時の新しい順に最大`limit`件を取得する
    async fn list_recent(&self, limit: usize) -> Result<Vec<FetchConfiguration>>;

    /// キーワードが完全一致する最新の設定を取得する
    async fn find_by_keywords(&self, keywords: &str) -> Result<Option<FetchConfiguration>>;
}

/// PostgreSQLによる記事取得設定ストレージ
#[derive(Clone)]
pub struct PgConfigurationRepository {
    pool: PgPool,
}

impl PgConfigurationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConfigurationRepository for PgConfigurationRepository {
    async fn insert(&self, config: &NewFetchConfiguration) -> Result<FetchConfiguration> {
        sqlx::query_as::<_, FetchConfiguration>(
            r#"
            INSERT INTO fetch_configurations (keywords, created_by)
            VALUES ($1, $2)
            RETURNING id, keywords, created_by, created_at
            "#,
        )
        .bind(&config.keywords)
        .bind(&config.created_by)
        .fetch_one(&self.pool)
        .await
        .context("記事取得設定の保存に失敗")
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<FetchConfiguration>> {
        sqlx::query_as::<_, FetchConfiguration>(
            r#"
            SELECT id, keywords, created_by, created_at
            FROM fetch_configurations
            ORDER BY created_at DESC
            LIMIT $1
            "#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .context("記事取得設定一覧の取得に失敗")
    }

    async fn find_by_keywords(&self, keywords: &str) -> Result<Option<FetchConfiguration>> {
        sqlx::query_as::<_, FetchConfiguration>(
            r#"
            SELECT id, keywords, created_by, created_at
            FROM fetch_configurations
            WHERE keywords = $1
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(keywords)
        .fetch_optional(&self.pool)
        .await
        .context("キーワードによる記事取得設定の検索に失敗")
    }
}
