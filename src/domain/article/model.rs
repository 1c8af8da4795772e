use crate::infra::parser::{parse_calendar_date, CALENDAR_DATE_FORMAT};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// 記事の言語コードのデフォルト値
pub const DEFAULT_LANGUAGE: &str = "EN";

// 記事エンティティ（外部の報道記事1件）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    /// 暦日（"YYYY-MM-DD"）。並び順にのみ使用する
    pub date: String,
    /// 言語コード。`Language`に無い値もそのまま保持する
    pub language: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Article {
    /// 日付を暦日として解釈する。解釈できない場合はNone
    pub fn parsed_date(&self) -> Option<NaiveDate> {
        parse_calendar_date(&self.date)
    }

    /// 言語コードが既知の言語であればそれを返す
    pub fn known_language(&self) -> Option<Language> {
        Language::from_code(&self.language)
    }
}

// 記事の新規作成用データ（idとタイムスタンプはストレージ側で付与）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewArticle {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    pub date: String,
    pub language: String,
}

impl NewArticle {
    /// 管理者が手動で追加する記事を作成する（日付は当日）
    pub fn manual(
        title: impl Into<String>,
        summary: impl Into<String>,
        source: impl Into<String>,
        url: impl Into<String>,
        language: Option<Language>,
        today: NaiveDate,
    ) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            source: source.into(),
            url: url.into(),
            date: today.format(CALENDAR_DATE_FORMAT).to_string(),
            language: language.unwrap_or_default().code().to_string(),
        }
    }

    /// idを付与して記事エンティティにする
    pub fn into_article(self, id: Uuid, created_at: DateTime<Utc>) -> Article {
        Article {
            id,
            title: self.title,
            summary: self.summary,
            source: self.source,
            url: self.url,
            date: self.date,
            language: self.language,
            created_at: Some(created_at),
            updated_at: None,
        }
    }
}

// 記事の部分更新（Noneの項目は変更しない）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticlePatch {
    pub title: Option<String>,
    pub summary: Option<String>,
    pub source: Option<String>,
    pub url: Option<String>,
    pub date: Option<String>,
    pub language: Option<String>,
}

impl ArticlePatch {
    /// 変更項目が1つも無いかどうか
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.summary.is_none()
            && self.source.is_none()
            && self.url.is_none()
            && self.date.is_none()
            && self.language.is_none()
    }

    /// 記事に変更を適用する
    pub fn apply_to(&self, article: &mut Article) {
        if let Some(ref title) = self.title {
            article.title = title.clone();
        }
        if let Some(ref summary) = self.summary {
            article.summary = summary.clone();
        }
        if let Some(ref source) = self.source {
            article.source = source.clone();
        }
        if let Some(ref url) = self.url {
            article.url = url.clone();
        }
        if let Some(ref date) = self.date {
            article.date = date.clone();
        }
        if let Some(ref language) = self.language {
            article.language = language.clone();
        }
    }
}

// サイトで扱う言語
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[default]
    En,
    Es,
    Fr,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Es, Language::Fr];

    /// 保存用の言語コード
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "EN",
            Language::Es => "ES",
            Language::Fr => "FR",
        }
    }

    /// 言語コードから変換する（大文字小文字は区別しない）
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|language| language.code().eq_ignore_ascii_case(code.trim()))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
