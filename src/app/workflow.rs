use crate::{
    domain::{
        article::{
            group_articles_by_source, Article, ArticleGroup, ArticlePatch, ArticleQuery,
            ArticleRepository, Language, NewArticle,
        },
        fetch_config::{ConfigurationRepository, FetchConfiguration, NewFetchConfiguration},
        history::{FetchHistoryRecord, HistoryRepository},
    },
    infra::parser::{parse_calendar_date, CALENDAR_DATE_FORMAT},
    task::reconcile::{Reconciler, ReconciliationResult},
};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

/// 管理画面の履歴一覧で表示する件数
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// 手動トリガー: キーワードを新しい設定として保存し、その1件を処理する
pub async fn trigger_manual(
    configs: &dyn ConfigurationRepository,
    reconciler: &Reconciler,
    keywords: &str,
    created_by: &str,
) -> Result<ReconciliationResult> {
    info!("=== 手動記事取得開始: '{}' ===", keywords);

    let config = configs
        .insert(&NewFetchConfiguration::new(keywords, created_by))
        .await
        .context("記事取得設定の保存に失敗")?;
    let result = reconciler.reconcile(&[config]).await;

    info!("=== 手動記事取得完了: {}件 ===", result.total_articles);
    Ok(result)
}

/// 定期トリガー: 直近`limit`件の設定を処理する。設定の読み込み失敗はエラーを返す
pub async fn trigger_scheduled(
    configs: &dyn ConfigurationRepository,
    reconciler: &Reconciler,
    limit: usize,
) -> Result<ReconciliationResult> {
    info!("=== 定期記事取得開始（直近{}件の設定）===", limit);

    let recent: Vec<FetchConfiguration> = configs
        .list_recent(limit)
        .await
        .context("記事取得設定の読み込みに失敗")?;
    if recent.is_empty() {
        info!("処理対象の設定がありません");
    }
    let result = reconciler.reconcile(&recent).await;

    info!("=== 定期記事取得完了: {}件 ===", result.total_articles);
    Ok(result)
}

/// 記事を手動で追加する（日付は当日）
pub async fn add_article(
    articles: &dyn ArticleRepository,
    title: &str,
    summary: &str,
    source: &str,
    url: &str,
    language: Option<Language>,
) -> Result<()> {
    for (name, value) in [("title", title), ("summary", summary), ("source", source), ("url", url)] {
        if value.trim().is_empty() {
            bail!("{}は必須です", name);
        }
    }

    let article = NewArticle::manual(
        title.trim(),
        summary.trim(),
        source.trim(),
        url.trim(),
        language,
        Utc::now().date_naive(),
    );
    articles
        .insert_many(std::slice::from_ref(&article))
        .await
        .context("記事の追加に失敗")?;
    info!("記事を追加しました: {}", article.title);
    Ok(())
}

/// 記事を部分更新する。空文字への変更は受け付けない
pub async fn edit_article(
    articles: &dyn ArticleRepository,
    id: Uuid,
    patch: &ArticlePatch,
) -> Result<Article> {
    if patch.is_empty() {
        bail!("変更項目がありません");
    }
    let fields = [
        ("title", &patch.title),
        ("summary", &patch.summary),
        ("source", &patch.source),
        ("url", &patch.url),
        ("date", &patch.date),
        ("language", &patch.language),
    ];
    for (name, value) in fields {
        if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
            bail!("{}を空にすることはできません", name);
        }
    }
    // 日付は"YYYY-MM-DD"にそろえて保存する
    let mut patch = patch.clone();
    if let Some(ref date) = patch.date {
        let parsed = parse_calendar_date(date)
            .with_context(|| format!("日付を解釈できません: {}", date))?;
        patch.date = Some(parsed.format(CALENDAR_DATE_FORMAT).to_string());
    }

    articles
        .update_by_id(id, &patch)
        .await
        .with_context(|| format!("記事の更新に失敗: {}", id))?;
    articles
        .find_by_id(id)
        .await?
        .with_context(|| format!("更新後の記事が見つかりません: {}", id))
}

/// 記事を削除する
pub async fn delete_article(articles: &dyn ArticleRepository, id: Uuid) -> Result<()> {
    articles
        .delete_by_id(id)
        .await
        .with_context(|| format!("記事の削除に失敗: {}", id))?;
    info!("記事を削除しました: {}", id);
    Ok(())
}

/// 記事一覧を掲載元ごとにまとめて返す（公開ページの表示順）
pub async fn list_grouped_articles(
    articles: &dyn ArticleRepository,
    language: Option<Language>,
) -> Result<Vec<ArticleGroup>> {
    let query = language.map(|language| ArticleQuery::from_language(language.code()));
    let list = articles
        .list_all(query)
        .await
        .context("記事一覧の取得に失敗")?;
    Ok(group_articles_by_source(&list))
}

/// 記事取得履歴を設定のキーワード付きで新しい順に返す
pub async fn list_history(
    history: &dyn HistoryRepository,
    limit: usize,
) -> Result<Vec<FetchHistoryRecord>> {
    history
        .list_recent(limit, true)
        .await
        .context("記事取得履歴の取得に失敗")
}
