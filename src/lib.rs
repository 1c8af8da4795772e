//! ドキュメンタリー映画の公式サイト向けバックエンド
//!
//! 外部の報道記事をキーワード検索で取得・保存し、掲載元ごとにまとめて表示する。

pub mod app;
pub mod domain;
pub mod infra;
pub mod task;
pub mod types;
