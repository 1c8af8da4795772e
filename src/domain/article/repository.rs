use super::model::{Article, ArticlePatch, NewArticle};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

// 記事一覧の絞り込み条件
#[derive(Debug, Default, Clone)]
pub struct ArticleQuery {
    /// 言語コードで絞り込む（Noneは全言語）
    pub language: Option<String>,
}

impl ArticleQuery {
    pub fn from_language(language: &str) -> Self {
        Self {
            language: Some(language.to_string()),
        }
    }
}

/// 記事ストレージの抽象化トレイト
///
/// PostgreSQL実装とインメモリ実装を同じインターフェースで扱う。
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// 記事をまとめて挿入し、挿入件数を返す。
    /// 一部でも失敗した場合はバッチ全体をエラーとする。
    async fn insert_many(&self, articles: &[NewArticle]) -> Result<usize>;

    /// 記事一覧を日付の降順で取得する
    async fn list_all(&self, query: Option<ArticleQuery>) -> Result<Vec<Article>>;

    /// idで記事を1件取得する
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>>;

    /// idで記事を削除する（存在しない場合はエラー）
    async fn delete_by_id(&self, id: Uuid) -> Result<()>;

    /// idで記事を部分更新する（存在しない場合はエラー）
    async fn update_by_id(&self, id: Uuid, patch: &ArticlePatch) -> Result<()>;
}

const ARTICLE_COLUMNS: &str =
    "id, title, summary, source, url, date::text AS date, language, created_at, updated_at";

/// PostgreSQLによる記事ストレージ
#[derive(Clone)]
pub struct PgArticleRepository {
    pool: PgPool,
}

impl PgArticleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleRepository for PgArticleRepository {
    async fn insert_many(&self, articles: &[NewArticle]) -> Result<usize> {
        if articles.is_empty() {
            return Ok(0);
        }

        // バッチ単位で全件成功か全件失敗にする
        let mut tx = self
            .pool
            .begin()
            .await
            .context("トランザクションの開始に失敗")?;

        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(
            "INSERT INTO articles (title, summary, source, url, date, language) ",
        );
        qb.push_values(articles, |mut row, article| {
            row.push_bind(&article.title)
                .push_bind(&article.summary)
                .push_bind(&article.source)
                .push_bind(&article.url)
                .push_bind(&article.date)
                .push_unseparated("::date")
                .push_bind(&article.language);
        });

        let result = qb
            .build()
            .execute(&mut *tx)
            .await
            .context("記事の一括挿入に失敗")?;

        tx.commit().await.context("記事挿入のコミットに失敗")?;

        Ok(result.rows_affected() as usize)
    }

    async fn list_all(&self, query: Option<ArticleQuery>) -> Result<Vec<Article>> {
        let query = query.unwrap_or_default();
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {} FROM articles",
            ARTICLE_COLUMNS
        ));

        if let Some(ref language) = query.language {
            qb.push(" WHERE language = ").push_bind(language);
        }
        qb.push(" ORDER BY date DESC, created_at DESC");

        qb.build_query_as::<Article>()
            .fetch_all(&self.pool)
            .await
            .context("記事一覧の取得に失敗")
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Article>> {
        let sql = format!("SELECT {} FROM articles WHERE id = $1", ARTICLE_COLUMNS);
        sqlx::query_as::<_, Article>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("記事の取得に失敗")
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM articles WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("記事の削除に失敗")?;

        if result.rows_affected() == 0 {
            bail!("記事が見つかりません: {}", id);
        }
        Ok(())
    }

    async fn update_by_id(&self, id: Uuid, patch: &ArticlePatch) -> Result<()> {
        let mut qb = sqlx::QueryBuilder::<sqlx::Postgres>::new("UPDATE articles SET ");
        let mut separated = qb.separated(", ");
        if let Some(ref title) = patch.title {
            separated.push("title = ").push_bind_unseparated(title);
        }
        if let Some(ref summary) = patch.summary {
            separated.push("summary = ").push_bind_unseparated(summary);
        }
        if let Some(ref source) = patch.source {
            separated.push("source = ").push_bind_unseparated(source);
        }
        if let Some(ref url) = patch.url {
            separated.push("url = ").push_bind_unseparated(url);
        }
        if let Some(ref date) = patch.date {
            separated
                .push("date = ")
                .push_bind_unseparated(date)
                .push_unseparated("::date");
        }
        if let Some(ref language) = patch.language {
            separated.push("language = ").push_bind_unseparated(language);
        }
        separated.push("updated_at = CURRENT_TIMESTAMP");
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .context("記事の更新に失敗")?;

        if result.rows_affected() == 0 {
            bail!("記事が見つかりません: {}", id);
        }
        Ok(())
    }
}
