//! ドメイン層
//!
//! - article: 記事エンティティ、ストレージ、掲載元ごとのグループ化
//! - fetch_config: 記事取得設定
//! - history: 記事取得履歴
//! - keyword: 検索キーワードのクリーニング
//! - share: 共有リンク

pub mod article;
pub mod fetch_config;
pub mod history;
pub mod keyword;
pub mod share;
