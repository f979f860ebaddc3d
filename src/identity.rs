//! 外部アイデンティティプロバイダー（Gigya 互換）でのログインと JWT 発行。
//!
//! 1. `accounts.login` で資格情報を送り、セッショントークン/シークレットを得る。
//! 2. `accounts.getJWT` にセッションを渡し、ID トークン（JWT）を得る。
//!
//! どちらのステップも HTTP 200 のままボディ内の `errorCode` で失敗を返すことがある。

use serde::Deserialize;
use tracing::{debug, error};

use crate::error::{ApplianceClientError, Result};
use crate::transport::Transport;

/// プロバイダーが全レスポンスに含める共通フィールド。
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProviderStatus {
    #[serde(default)]
    error_code: i64,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    error_details: Option<String>,
    #[serde(default)]
    call_id: Option<String>,
}

impl ProviderStatus {
    /// `errorCode` が 0 以外なら `Authentication` エラーにする。
    fn check(&self) -> Result<()> {
        if self.error_code == 0 {
            return Ok(());
        }
        let message = self
            .error_message
            .clone()
            .or_else(|| self.error_details.clone())
            .unwrap_or_default();
        error!(
            error_code = self.error_code,
            call_id = self.call_id.as_deref().unwrap_or(""),
            message = %message,
            "アイデンティティプロバイダーがエラーを返しました"
        );
        Err(ApplianceClientError::Authentication {
            code: self.error_code,
            message,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionInfo {
    session_token: String,
    session_secret: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    #[serde(flatten)]
    status: ProviderStatus,
    #[serde(rename = "UID", default)]
    uid: Option<String>,
    #[serde(default)]
    session_info: Option<SessionInfo>,
}

#[derive(Debug, Deserialize)]
struct JwtResponse {
    #[serde(flatten)]
    status: ProviderStatus,
    #[serde(default)]
    id_token: Option<String>,
}

/// ログイン成功後のセッション。
struct ProviderSession {
    uid: String,
    session_token: String,
    session_secret: String,
}

/// IdentityClient はディスカバリーで得たドメインと API キーを使うプロバイダークライアント。
///
/// 送信にはタイムアウトのみ共有し、アプライアンス API の共通ヘッダー（`x-api-key` 等）は付けない。
pub struct IdentityClient {
    transport: Transport,
    base_url: String,
    api_key: String,
}

impl IdentityClient {
    /// `base_url_override` がなければ `https://accounts.{domain}` を使う。
    pub fn new(
        transport: Transport,
        domain: &str,
        api_key: &str,
        base_url_override: Option<&str>,
    ) -> Self {
        let base_url = match base_url_override {
            Some(url) if !url.trim().is_empty() => url.trim_end_matches('/').to_string(),
            _ => format!("https://accounts.{domain}"),
        };
        Self {
            transport,
            base_url,
            api_key: api_key.to_string(),
        }
    }

    /// プロバイダーのベース URL を返す。
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// ユーザー名とパスワードでログインし、ID トークンを返す。
    ///
    /// どちらかのステップが失敗した時点で中断する。リトライはしない。
    pub async fn login(&self, user: &str, password: &str) -> Result<String> {
        let session = self
            .accounts_login(user, password)
            .await
            .map_err(|e| e.context("accounts.login"))?;
        self.get_jwt(&session)
            .await
            .map_err(|e| e.context("accounts.getJWT"))
    }

    async fn accounts_login(&self, user: &str, password: &str) -> Result<ProviderSession> {
        debug!(base_url = %self.base_url, "アイデンティティプロバイダーにログインします");

        let form = [
            ("apikey", self.api_key.as_str()),
            ("format", "json"),
            ("httpStatusCodes", "false"),
            ("loginID", user),
            ("password", password),
            ("targetEnv", "mobile"),
        ];
        let res: LoginResponse = self.post_form("accounts.login", &form).await?;
        res.status.check()?;

        let uid = res
            .uid
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ApplianceClientError::Decode("UID がありません".to_string()))?;
        let info = res
            .session_info
            .ok_or_else(|| ApplianceClientError::Decode("sessionInfo がありません".to_string()))?;

        Ok(ProviderSession {
            uid,
            session_token: info.session_token,
            session_secret: info.session_secret,
        })
    }

    async fn get_jwt(&self, session: &ProviderSession) -> Result<String> {
        let form = [
            ("apikey", self.api_key.as_str()),
            ("fields", "country"),
            ("format", "json"),
            ("httpStatusCodes", "false"),
            ("targetUID", session.uid.as_str()),
            ("oauth_token", session.session_token.as_str()),
            ("secret", session.session_secret.as_str()),
            ("targetEnv", "mobile"),
        ];
        let res: JwtResponse = self.post_form("accounts.getJWT", &form).await?;
        res.status.check()?;

        let id_token = res
            .id_token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApplianceClientError::Decode("id_token がありません".to_string()))?;
        debug!("ID トークンを取得しました");
        Ok(id_token)
    }

    async fn post_form<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, method);
        let response = self
            .transport
            .send_plain(self.transport.post(&url).form(form))
            .await?;
        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, method = method, "プロバイダーレスポンスの解析に失敗しました");
            ApplianceClientError::Decode(e.to_string())
        })
    }
}
