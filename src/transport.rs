//! 全リクエスト共通ヘッダーの付与と HTTP 送信。

use std::time::Duration;

use reqwest::header::{ACCEPT, ACCEPT_CHARSET, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{RequestBuilder, Response};
use tracing::error;

use crate::config::ClientConfig;
use crate::error::{ApplianceClientError, Result};

/// API キーのヘッダー名。
pub const API_KEY_HEADER: &str = "x-api-key";

/// HeaderDecorator は送信前のリクエストに固定ヘッダーを付与する。
///
/// エンドポイントに関係なく同じヘッダーを付ける。状態は API キーと User-Agent のみ。
#[derive(Clone)]
pub struct HeaderDecorator {
    api_key: String,
    user_agent: String,
}

impl HeaderDecorator {
    /// API キーと User-Agent を指定して HeaderDecorator を生成する。
    pub fn new(api_key: &str, user_agent: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            user_agent: user_agent.to_string(),
        }
    }

    /// 固定ヘッダーを付与したリクエストビルダーを返す。
    pub fn decorate(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header(API_KEY_HEADER, &self.api_key)
            .header(USER_AGENT, &self.user_agent)
            .header(ACCEPT, "application/json")
            .header(ACCEPT_CHARSET, "UTF-8")
            .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
    }
}

/// Transport は reqwest クライアントに HeaderDecorator を組み合わせた送信路。
#[derive(Clone)]
pub struct Transport {
    http_client: reqwest::Client,
    decorator: HeaderDecorator,
}

impl Transport {
    /// `config.timeout_secs` のタイムアウトを持つ HTTP クライアントを生成する。
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApplianceClientError::Transport(e.to_string()))?;
        Ok(Self {
            http_client,
            decorator: HeaderDecorator::new(&config.api_key, &config.user_agent),
        })
    }

    /// GET リクエストビルダーを返す。ヘッダーは送信時に付与する。
    pub fn get(&self, url: &str) -> RequestBuilder {
        self.http_client.get(url)
    }

    /// POST リクエストビルダーを返す。ヘッダーは送信時に付与する。
    pub fn post(&self, url: &str) -> RequestBuilder {
        self.http_client.post(url)
    }

    /// 共通ヘッダーを付与して送信する。ネットワーク失敗は `Transport` になる。
    pub async fn send(&self, request: RequestBuilder) -> Result<Response> {
        Self::execute(self.decorator.decorate(request)).await
    }

    /// 共通ヘッダーを付与せずに送信する。
    ///
    /// API キーを渡してはならない外部ホスト（アイデンティティプロバイダー）向け。
    pub async fn send_plain(&self, request: RequestBuilder) -> Result<Response> {
        Self::execute(request).await
    }

    async fn execute(request: RequestBuilder) -> Result<Response> {
        request.send().await.map_err(|e| {
            error!(error = %e, "HTTP リクエストの送信に失敗しました");
            ApplianceClientError::Transport(e.to_string())
        })
    }
}
