use super::model::{FetchHistoryEntry, FetchHistoryRecord, FetchHistoryRow, NewFetchHistoryEntry};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

/// 記事取得履歴ストレージの抽象化トレイト
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// 履歴を1件保存する
    async fn insert(&self, entry: &NewFetchHistoryEntry) -> Result<FetchHistoryEntry>;

    /// 作成日時の新しい順に最大`limit`件を取得する。
    /// `with_config`がtrueなら設定のキーワードも結合する。
    async fn list_recent(&self, limit: usize, with_config: bool)
        -> Result<Vec<FetchHistoryRecord>>;
}

/// PostgreSQLによる記事取得履歴ストレージ
#[derive(Clone)]
pub struct PgHistoryRepository {
    pool: PgPool,
}

impl PgHistoryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryRepository for PgHistoryRepository {
    async fn insert(&self, entry: &NewFetchHistoryEntry) -> Result<FetchHistoryEntry> {
        let row = sqlx::query_as::<_, FetchHistoryRow>(
            r#"
            INSERT INTO fetch_history (configuration_id, articles_count, status, error)
            VALUES ($1, $2, $3, $4)
            RETURNING id, configuration_id, articles_count, status, error, created_at,
                NULL::text AS keywords
            "#,
        )
        .bind(entry.configuration_id())
        .bind(entry.articles_count())
        .bind(entry.status().as_str())
        .bind(entry.error_message())
        .fetch_one(&self.pool)
        .await
        .context("記事取得履歴の保存に失敗")?;

        Ok(FetchHistoryRecord::try_from(row)?.entry)
    }

    async fn list_recent(
        &self,
        limit: usize,
        with_config: bool,
    ) -> Result<Vec<FetchHistoryRecord>> {
        let sql = if with_config {
            r#"
            SELECT h.id, h.configuration_id, h.articles_count, h.status, h.error, h.created_at,
                c.keywords
            FROM fetch_history h
            LEFT JOIN fetch_configurations c ON c.id = h.configuration_id
            ORDER BY h.created_at DESC
            LIMIT $1
            "#
        } else {
            r#"
            SELECT id, configuration_id, articles_count, status, error, created_at,
                NULL::text AS keywords
            FROM fetch_history
            ORDER BY created_at DESC
            LIMIT $1
            "#
        };

        let rows = sqlx::query_as::<_, FetchHistoryRow>(sql)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .context("記事取得履歴の取得に失敗")?;

        rows.into_iter().map(FetchHistoryRecord::try_from).collect()
    }
}
