use thiserror::Error;

/// 記事取得（リコンサイル）処理のエラー型
///
/// いずれも設定1件単位で致命的なエラーであり、
/// 履歴に記録されたうえで次の設定の処理に進む。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// キーワードのクリーニング結果が空になった
    #[error("キーワードが不正です: '{raw}'")]
    InvalidKeyword { raw: String },

    /// 外部プロバイダーの呼び出し失敗（通信エラー、非成功ステータス、不正なレスポンス）
    #[error("外部プロバイダーエラー: {provider} - {message}")]
    ExternalProvider { provider: String, message: String },

    /// ストレージへの書き込み失敗
    #[error("永続化エラー: {operation} - {message}")]
    Persistence { operation: String, message: String },
}

impl FetchError {
    /// 不正キーワードエラーを作成
    pub fn invalid_keyword<R: Into<String>>(raw: R) -> Self {
        Self::InvalidKeyword { raw: raw.into() }
    }

    /// 外部プロバイダーエラーを作成
    pub fn external_provider<P: Into<String>, M: Into<String>>(provider: P, message: M) -> Self {
        Self::ExternalProvider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// 永続化エラーを作成
    ///
    /// anyhowのエラーチェーンは`{:#}`で1行にまとめて保持する
    pub fn persistence<O: Into<String>>(operation: O, source: &anyhow::Error) -> Self {
        Self::Persistence {
            operation: operation.into(),
            message: format!("{:#}", source),
        }
    }
}

/// 記事取得エラーのResult型エイリアス
pub type FetchResult<T> = std::result::Result<T, FetchError>;
