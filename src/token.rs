//! クライアントトークン・ユーザートークンと有効期限の管理。

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ApplianceClientError, Result};

/// トークンエンドポイントのリクエストボディ。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TokenRequest<'a> {
    pub grant_type: &'a str,
    pub client_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<&'a str>,
    pub scope: &'a str,
}

pub(crate) const GRANT_CLIENT_CREDENTIALS: &str = "client_credentials";
pub(crate) const GRANT_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
pub(crate) const GRANT_REFRESH_TOKEN: &str = "refresh_token";

/// トークンエンドポイントのレスポンス（デコード直後の生の値）。
///
/// 有効期限の確定は `ClientToken::finalize` / `AuthToken::finalize` で行う。
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
    /// 有効期間（秒）。
    pub expires_in: i64,
    /// サーバーが絶対時刻で期限を返した場合のみ存在する。
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    pub token_type: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    /// 範囲外の `expiresIn` は `Decode` エラーになる。
    fn resolve_expires_at(&self, issued_at: DateTime<Utc>) -> Result<DateTime<Utc>> {
        if let Some(expires_at) = self.expires_at {
            return Ok(expires_at);
        }
        Duration::try_seconds(self.expires_in)
            .and_then(|d| issued_at.checked_add_signed(d))
            .ok_or_else(|| ApplianceClientError::Decode("expiresIn out of range".to_string()))
    }
}

/// アプリ単位（ユーザー非依存）の API 呼び出しに使うアクセストークン。
///
/// 発行後は変更せず、更新時は新しいインスタンスで置き換える。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientToken {
    pub access_token: String,
    pub expires_in: i64,
    pub expires_at: DateTime<Utc>,
    /// 通常は "Bearer"。
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

impl ClientToken {
    /// デコード済みレスポンスから有効期限を確定させてトークンを生成する。
    ///
    /// サーバーが `expiresAt` を返していない場合は `issued_at + expiresIn` とする。
    pub fn finalize(response: TokenResponse, issued_at: DateTime<Utc>) -> Result<Self> {
        let expires_at = response.resolve_expires_at(issued_at)?;
        Ok(Self {
            access_token: response.access_token,
            expires_in: response.expires_in,
            expires_at,
            token_type: response.token_type,
            scope: response.scope.unwrap_or_default(),
        })
    }

    /// 指定時刻において期限切れかどうかを返す（`now >= expires_at`）。
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// 現在時刻において期限切れかどうかを返す。
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Authorization ヘッダーの値を返す。
    pub fn authorization(&self) -> String {
        format!("{} {}", self.token_type, self.access_token)
    }
}

/// ユーザー認可 API に使うアクセストークンとリフレッシュトークンの組。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    #[serde(flatten)]
    pub token: ClientToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl AuthToken {
    /// デコード済みレスポンスからユーザートークンを生成する。
    ///
    /// レスポンスにリフレッシュトークンがなければ `previous_refresh_token` を引き継ぐ。
    pub fn finalize(
        response: TokenResponse,
        issued_at: DateTime<Utc>,
        previous_refresh_token: Option<&str>,
    ) -> Result<Self> {
        let refresh_token = response
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .or_else(|| previous_refresh_token.map(str::to_string));
        Ok(Self {
            token: ClientToken::finalize(response, issued_at)?,
            refresh_token,
        })
    }

    /// 空でないリフレッシュトークンを返す。
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// 指定時刻においてアクセストークンが期限切れかどうかを返す。
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.token.is_expired_at(now)
    }

    /// 現在時刻においてアクセストークンが期限切れかどうかを返す。
    pub fn is_expired(&self) -> bool {
        self.token.is_expired()
    }

    /// アクセストークンの Authorization ヘッダーの値を返す。
    pub fn authorization(&self) -> String {
        self.token.authorization()
    }
}
