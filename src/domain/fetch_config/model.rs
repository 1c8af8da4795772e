use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// 記事取得設定（キーワード検索リクエスト1件）
///
/// 作成後は変更しない。新しいリクエストは常に新しい設定として保存する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct FetchConfiguration {
    pub id: Uuid,
    /// クリーニング前のキーワード
    pub keywords: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Display for FetchConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' ({}, {})", self.keywords, self.created_by, self.id)
    }
}

// 記事取得設定の新規作成用データ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFetchConfiguration {
    pub keywords: String,
    pub created_by: String,
}

impl NewFetchConfiguration {
    pub fn new(keywords: impl Into<String>, created_by: impl Into<String>) -> Self {
        Self {
            keywords: keywords.into(),
            created_by: created_by.into(),
        }
    }
}
