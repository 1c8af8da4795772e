use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

// 記事取得1回分の結果ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStatus {
    Success,
    Error,
}

impl FetchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStatus::Success => "success",
            FetchStatus::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Result<Self> {
        match value {
            "success" => Ok(FetchStatus::Success),
            "error" => Ok(FetchStatus::Error),
            other => bail!("不明な取得ステータス: {}", other),
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 記事取得履歴（監査記録）
///
/// 作成後に変更されることはない。`error`はstatusがErrorのときだけSome。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchHistoryEntry {
    pub id: Uuid,
    pub configuration_id: Uuid,
    pub articles_count: i32,
    pub status: FetchStatus,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

// 履歴の新規作成用データ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFetchHistoryEntry {
    configuration_id: Uuid,
    articles_count: i32,
    status: FetchStatus,
    error: Option<String>,
}

impl NewFetchHistoryEntry {
    /// 成功履歴を作成
    pub fn success(configuration_id: Uuid, articles_count: usize) -> Self {
        Self {
            configuration_id,
            articles_count: i32::try_from(articles_count).unwrap_or(i32::MAX),
            status: FetchStatus::Success,
            error: None,
        }
    }

    /// エラー履歴を作成（件数は常に0）
    pub fn error(configuration_id: Uuid, message: impl Into<String>) -> Self {
        Self {
            configuration_id,
            articles_count: 0,
            status: FetchStatus::Error,
            error: Some(message.into()),
        }
    }

    pub fn configuration_id(&self) -> Uuid {
        self.configuration_id
    }

    pub fn articles_count(&self) -> i32 {
        self.articles_count
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// idと作成日時を付与して履歴エンティティにする
    pub fn into_entry(self, id: Uuid, created_at: DateTime<Utc>) -> FetchHistoryEntry {
        FetchHistoryEntry {
            id,
            configuration_id: self.configuration_id,
            articles_count: self.articles_count,
            status: self.status,
            error: self.error,
            created_at,
        }
    }
}

/// 設定のキーワードを結合した履歴（管理画面の履歴一覧用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchHistoryRecord {
    pub entry: FetchHistoryEntry,
    /// `with_config`を指定しなかった場合はNone
    pub keywords: Option<String>,
}

// DBの行表現（statusはTEXT列）
#[derive(Debug, FromRow)]
pub(crate) struct FetchHistoryRow {
    pub id: Uuid,
    pub configuration_id: Uuid,
    pub articles_count: i32,
    pub status: String,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub keywords: Option<String>,
}

impl TryFrom<FetchHistoryRow> for FetchHistoryRecord {
    type Error = anyhow::Error;

    fn try_from(row: FetchHistoryRow) -> Result<Self> {
        Ok(Self {
            entry: FetchHistoryEntry {
                id: row.id,
                configuration_id: row.configuration_id,
                articles_count: row.articles_count,
                status: FetchStatus::parse(&row.status)?,
                error: row.error,
                created_at: row.created_at,
            },
            keywords: row.keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_present_iff_status_error() {
        let id = Uuid::new_v4();

        let success = NewFetchHistoryEntry::success(id, 4);
        assert_eq!(success.status(), FetchStatus::Success);
        assert_eq!(success.articles_count(), 4);
        assert!(success.error_message().is_none());

        let error = NewFetchHistoryEntry::error(id, "HTTP 500");
        assert_eq!(error.status(), FetchStatus::Error);
        assert_eq!(error.articles_count(), 0);
        assert_eq!(error.error_message(), Some("HTTP 500"));
    }

    #[test]
    fn test_status_round_trip_through_text() {
        for status in [FetchStatus::Success, FetchStatus::Error] {
            assert_eq!(FetchStatus::parse(status.as_str()).unwrap(), status);
        }
        assert!(FetchStatus::parse("pending").is_err());
    }
}
