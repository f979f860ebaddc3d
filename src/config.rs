//! アプライアンス API クライアントの設定構造体。

use serde::{Deserialize, Serialize};

use crate::error::{ApplianceClientError, Result};
use crate::state::SessionState;

/// グローバル API のデフォルト URL。
pub const DEFAULT_API_URL: &str = "https://api.ocp.electrolux.one";

/// ベンダーアプリと同じ User-Agent。
pub const DEFAULT_USER_AGENT: &str = "Ktor client";

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

/// timeout_secs のデフォルト値（30 秒）。
fn default_timeout_secs() -> u64 {
    30
}

/// ClientConfig はアプライアンス API クライアントの設定を表す。
///
/// 必須項目は `api_key`・`brand`・`client_id`・`client_secret`・`country_code`。
/// 欠落はクライアント生成時に `ApplianceClientError::Config` として検出される。
/// YAML からもデシリアライズ可能。
#[derive(Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// グローバル API の URL（デフォルト: `https://api.ocp.electrolux.one`）。
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// 全リクエストに `x-api-key` として付与する API キー。
    #[serde(default)]
    pub api_key: String,

    /// ブランド名。例: `electrolux`
    #[serde(default)]
    pub brand: String,

    /// OAuth クライアント ID。例: `ElxOneApp`
    #[serde(default)]
    pub client_id: String,

    #[serde(default)]
    pub client_secret: String,

    /// アカウントの国コード。例: `FI`
    #[serde(default)]
    pub country_code: String,

    /// アイデンティティプロバイダーの URL 上書き。
    /// 省略時は `https://accounts.{domain}` を使う。
    #[serde(default)]
    pub identity_base_url: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP タイムアウト秒数（デフォルト: 30 秒）。
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// 復元するセッション状態。
    #[serde(default)]
    pub state: SessionState,
}

impl std::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("brand", &self.brand)
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("country_code", &self.country_code)
            .field("identity_base_url", &self.identity_base_url)
            .field("user_agent", &self.user_agent)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// 必須項目を指定して ClientConfig を生成する。
    ///
    /// `api_url`・`user_agent`・`timeout_secs` はデフォルト値が使用される。
    pub fn new(
        api_key: &str,
        brand: &str,
        client_id: &str,
        client_secret: &str,
        country_code: &str,
    ) -> Self {
        Self {
            api_url: default_api_url(),
            api_key: api_key.to_string(),
            brand: brand.to_string(),
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
            country_code: country_code.to_string(),
            identity_base_url: None,
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            state: SessionState::default(),
        }
    }

    /// YAML 文字列から設定を読み込み、検証する。
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)
            .map_err(|e| ApplianceClientError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// グローバル API の URL を設定する。
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.to_string();
        self
    }

    /// アイデンティティプロバイダーの URL を上書きする。
    pub fn with_identity_base_url(mut self, url: &str) -> Self {
        self.identity_base_url = Some(url.to_string());
        self
    }

    /// User-Agent ヘッダーの値を設定する。
    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }

    /// タイムアウト秒数を設定する。
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// 以前に保存したセッション状態を設定する。
    pub fn with_state(mut self, state: SessionState) -> Self {
        self.state = state;
        self
    }

    /// 必須項目を検証する。最初に見つかった欠落項目をエラーとして返す。
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("api_key", &self.api_key),
            ("brand", &self.brand),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("country_code", &self.country_code),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ApplianceClientError::Config(name));
            }
        }
        url::Url::parse(&self.effective_api_url())
            .map_err(|_| ApplianceClientError::Config("api_url"))?;
        Ok(())
    }

    /// 末尾のスラッシュを除いたグローバル API URL。空ならデフォルトを使う。
    pub(crate) fn effective_api_url(&self) -> String {
        let url = self.api_url.trim().trim_end_matches('/');
        if url.is_empty() {
            DEFAULT_API_URL.to_string()
        } else {
            url.to_string()
        }
    }
}
