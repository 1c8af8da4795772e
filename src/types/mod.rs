//! 型定義モジュール
//!
//! アプリケーション全体で使用されるエラー型を管理します。
//! - 設定エラー: 環境変数・YAML設定の検証
//! - インフラエラー: DB接続、ファイル、シリアライゼーション
//! - 記事取得エラー: 設定単位で履歴に記録されるエラー

pub mod config;
pub mod error;
pub mod infra;

// 便利な再エクスポート
pub use config::{ConfigError, ConfigResult};
pub use error::{FetchError, FetchResult};
pub use infra::{InfraError, InfraResult};
