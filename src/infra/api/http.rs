use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Mutex;
use std::time::Duration;

/// HTTPクライアントの抽象化トレイト
///
/// このトレイトは、実際のHTTP通信とモック実装の両方を
/// 統一的に扱えるようにするためのインターフェースです。
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// 指定されたURLからテキストを取得する
    ///
    /// 非成功ステータス（2xx以外）とタイムアウトはエラーとして返す。
    ///
    /// # Arguments
    /// * `url` - 取得対象のURL
    /// * `timeout_secs` - タイムアウト時間（秒）
    async fn fetch_text(&self, url: &str, timeout_secs: u64) -> Result<String>;
}

/// レスポンス本文の上限（バイト）
pub const DEFAULT_MAX_BODY_BYTES: usize = 5 * 1024 * 1024;

/// `reqwest` を使用した本番用のHTTPクライアント実装
///
/// 本文は`max_body_bytes`まで読み込み、超えた時点でエラーにする。
pub struct ReqwestHttpClient {
    client: Client,
    max_body_bytes: usize,
}

impl ReqwestHttpClient {
    /// 新しいHTTPクライアントを作成
    pub fn new() -> Self {
        Self {
            client: Client::builder()
                .user_agent(concat!("filmpress/", env!("CARGO_PKG_VERSION")))
                .build()
                .unwrap_or_else(|_| Client::new()),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// 本文の上限を変更する
    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn fetch_text(&self, url: &str, timeout_secs: u64) -> Result<String> {
        let mut response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(timeout_secs))
            .send()
            .await
            .with_context(|| format!("HTTPリクエストの送信に失敗: {}", url))?;

        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("HTTP {}: {}", status.as_u16(), url));
        }

        let too_large = || {
            anyhow!(
                "レスポンスが上限({}バイト)を超えています: {}",
                self.max_body_bytes,
                url
            )
        };
        if response
            .content_length()
            .is_some_and(|length| length > self.max_body_bytes as u64)
        {
            return Err(too_large());
        }

        // Content-Lengthが無い場合もあるので読み込みながら確認する
        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .context("レスポンステキストの取得に失敗")?
        {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// モックが返す応答
#[derive(Debug, Clone)]
pub enum MockResponse {
    Body(String),
    Error(String),
}

/// テスト用のモックHTTPクライアント
///
/// URLの前方一致でレスポンスを切り替える。どれにも一致しない場合は`fallback`を返す。
/// 呼び出されたURLは`requested_urls`で確認できる。
pub struct MockHttpClient {
    routes: Vec<(String, MockResponse)>,
    fallback: MockResponse,
    requests: Mutex<Vec<String>>,
}

impl MockHttpClient {
    /// 全URLで成功レスポンスを返すモッククライアントを作成
    pub fn new_success(mock_response: &str) -> Self {
        Self::with_fallback(MockResponse::Body(mock_response.to_string()))
    }

    /// 全URLでエラーを返すモッククライアントを作成
    pub fn new_error(error_message: &str) -> Self {
        Self::with_fallback(MockResponse::Error(error_message.to_string()))
    }

    fn with_fallback(fallback: MockResponse) -> Self {
        Self {
            routes: Vec::new(),
            fallback,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 前方一致するURLに対して成功レスポンスを返すよう設定する
    pub fn route(mut self, url_prefix: &str, body: &str) -> Self {
        self.routes
            .push((url_prefix.to_string(), MockResponse::Body(body.to_string())));
        self
    }

    /// 前方一致するURLに対してエラーを返すよう設定する
    pub fn route_error(mut self, url_prefix: &str, error_message: &str) -> Self {
        self.routes.push((
            url_prefix.to_string(),
            MockResponse::Error(error_message.to_string()),
        ));
        self
    }

    /// これまでに要求されたURL
    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn fetch_text(&self, url: &str, _timeout_secs: u64) -> Result<String> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(url.to_string());
        }

        let response = self
            .routes
            .iter()
            .find(|(prefix, _)| url.starts_with(prefix.as_str()))
            .map(|(_, response)| response)
            .unwrap_or(&self.fallback);

        match response {
            MockResponse::Body(body) => Ok(body.clone()),
            MockResponse::Error(message) => Err(anyhow!("モックHTTPエラー: {}", message)),
        }
    }
}
