use thiserror::Error;

/// 設定関連のエラー型
/// 環境変数、YAML設定ファイル、プロバイダー設定の検証エラーを定義
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 必須の環境変数が見つからない
    #[error("環境変数が見つかりません: {name}")]
    MissingEnvironmentVariable { name: String },

    /// 数値などに変換できない設定値
    #[error("設定値が不正です: {name}='{value}' ({reason})")]
    InvalidValue {
        name: String,
        value: String,
        reason: String,
    },

    /// 設定ファイルが見つからない、または読めない
    #[error("設定ファイルを読み込めません: {path} - {reason}")]
    UnreadableConfigFile { path: String, reason: String },

    /// 記事取得プロバイダーが1つも有効になっていない
    #[error("記事取得プロバイダーが設定されていません（NEWS_API_KEYまたはSEARCH_API_KEYを設定してください）")]
    NoProviderEnabled,
}

impl ConfigError {
    /// 環境変数不足エラーを作成
    pub fn missing_env_var<N: Into<String>>(name: N) -> Self {
        Self::MissingEnvironmentVariable { name: name.into() }
    }

    /// 不正な設定値エラーを作成
    pub fn invalid_value<N: Into<String>, V: Into<String>, R: ToString>(
        name: N,
        value: V,
        reason: R,
    ) -> Self {
        Self::InvalidValue {
            name: name.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    /// 設定ファイル読み込みエラーを作成
    pub fn unreadable_config_file<P: Into<String>, R: ToString>(path: P, reason: R) -> Self {
        Self::UnreadableConfigFile {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// 設定エラーのResult型エイリアス
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
