//! アプライアンス API クライアントのトレイトと HTTP 実装。
//!
//! ログインは ディスカバリー → 国の検証 → プロバイダーログイン → トークン交換 の順で行い、
//! 以降のデータ取得はセッション状態のトークンを使う。期限切れのトークンは
//! 呼び出しのたびにその場で更新し、バックグラウンド更新は行わない。

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::AUTHORIZATION;
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::appliance::{Appliance, ApplianceId, ApplianceInfo, ApplianceInfoRequest};
use crate::config::ClientConfig;
use crate::error::{ApplianceClientError, Result};
use crate::identity::IdentityClient;
use crate::provider::{self, Country, IdentityProvider};
use crate::state::SessionState;
use crate::token::{
    AuthToken, ClientToken, TokenRequest, TokenResponse, GRANT_CLIENT_CREDENTIALS,
    GRANT_REFRESH_TOKEN, GRANT_TOKEN_EXCHANGE,
};
use crate::transport::Transport;

#[cfg(feature = "mock")]
use mockall::automock;

const TOKEN_PATH: &str = "/one-account-authorization/api/v1/token";
const IDENTITY_PROVIDERS_PATH: &str = "/one-account-user/api/v1/identity-providers";
const COUNTRIES_PATH: &str = "/one-account-user/api/v1/countries";
const APPLIANCES_PATH: &str = "/appliance/api/v2/appliances";
const APPLIANCES_INFO_PATH: &str = "/appliance/api/v2/appliances/info";

/// リージョン別トークンエンドポイントに付与する国コードヘッダー。
pub const ORIGIN_COUNTRY_HEADER: &str = "Origin-Country-Code";

/// ブランドを指定するディスカバリー用ヘッダー。
pub const CONTEXT_BRAND_HEADER: &str = "Context-Brand";

/// ApplianceApi はアプライアンス API の公開操作を表すトレイト。
///
/// `ApplianceClient` がデフォルト実装。テスト時は `MockApplianceApi` が使用可能。
#[async_trait]
#[cfg_attr(feature = "mock", automock)]
pub trait ApplianceApi: Send + Sync {
    /// メールアドレスとパスワードでログインする。
    ///
    /// 復元済みのセッションがあればネットワークに出ずに成功する。
    async fn login(&self, email: &str, password: &str) -> Result<()>;

    /// アカウントの全アプライアンスを取得する。
    async fn appliances(&self, include_metadata: bool) -> Result<Vec<Appliance>>;

    /// 指定したアプライアンスの製品情報を取得する。
    async fn appliances_info(&self, appliance_ids: &[ApplianceId]) -> Result<Vec<ApplianceInfo>>;

    /// 現在のセッション状態を返す（永続化用）。
    async fn state(&self) -> SessionState;

    /// セッション状態を置き換える（復元用）。
    async fn set_state(&self, state: SessionState);
}

/// ApplianceClient は reqwest を使った ApplianceApi の HTTP 実装。
///
/// セッション状態は `tokio::sync::Mutex` で保護し、トークンの確認と更新を
/// 1 つのクリティカルセクションで行う。並行呼び出しでも二重リフレッシュは起きない。
pub struct ApplianceClient {
    config: ClientConfig,
    api_url: String,
    transport: Transport,
    state: Mutex<SessionState>,
}

impl ApplianceClient {
    /// 設定を検証してクライアントを生成する。
    ///
    /// 必須項目の欠落は `ApplianceClientError::Config` になる。
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let transport = Transport::new(&config)?;
        let api_url = config.effective_api_url();
        let state = Mutex::new(config.state.clone());

        debug!(
            api_url = %api_url,
            brand = %config.brand,
            country_code = %config.country_code,
            "アプライアンスクライアントを生成しました"
        );

        Ok(Self {
            config,
            api_url,
            transport,
            state,
        })
    }

    /// クライアントの設定を返す。
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// アカウントに対応するアイデンティティプロバイダーの一覧を取得する。
    pub async fn identity_providers(&self, email: &str) -> Result<Vec<IdentityProvider>> {
        let mut url = url::Url::parse(&format!("{}{}", self.api_url, IDENTITY_PROVIDERS_PATH))
            .map_err(|_| ApplianceClientError::Config("api_url"))?;
        url.query_pairs_mut()
            .append_pair("brand", &self.config.brand)
            .append_pair("email", email);

        let request = self
            .transport
            .get(url.as_str())
            .header(CONTEXT_BRAND_HEADER, &self.config.brand);

        self.do_client_auth(request)
            .await
            .map_err(|e| e.context("identity_providers"))
    }

    /// プロバイダーを 1 件に確定し、そのリージョン URL をセッションに設定する。
    pub async fn resolve_provider(&self, email: &str) -> Result<IdentityProvider> {
        let providers = self
            .identity_providers(email)
            .await
            .map_err(|e| e.context("resolve_provider"))?;

        let provider = provider::select_single_provider(providers).map_err(|e| {
            warn!(error = %e, "アイデンティティプロバイダーを確定できません");
            e.context("resolve_provider")
        })?;

        debug!(
            domain = %provider.domain,
            regional_base_url = %provider.http_regional_base_url,
            "アイデンティティプロバイダーを確定しました"
        );
        self.state.lock().await.regional_base_url =
            Some(provider.http_regional_base_url.trim_end_matches('/').to_string());

        Ok(provider)
    }

    /// リージョン API からサービス対象国の一覧を取得する。
    pub async fn countries(&self) -> Result<Vec<Country>> {
        let regional = self
            .regional_base_url()
            .await
            .map_err(|e| e.context("countries"))?;
        let request = self.transport.get(&format!("{regional}{COUNTRIES_PATH}"));

        self.do_client_auth(request)
            .await
            .map_err(|e| e.context("countries"))
    }

    /// 国コードがサービス対象国に含まれているか検証する。
    pub async fn validate_country(&self, country_code: &str) -> Result<()> {
        let countries = self
            .countries()
            .await
            .map_err(|e| e.context("validate_country"))?;
        provider::ensure_country_supported(&countries, country_code)
            .map_err(|e| e.context("validate_country"))
    }

    /// Client Credentials でクライアントトークンを発行する（グローバル API）。
    pub async fn issue_client_token(&self) -> Result<ClientToken> {
        debug!(client_id = %self.config.client_id, "クライアントトークンを取得します");

        let body = TokenRequest {
            grant_type: GRANT_CLIENT_CREDENTIALS,
            client_id: &self.config.client_id,
            client_secret: Some(&self.config.client_secret),
            id_token: None,
            refresh_token: None,
            scope: "",
        };
        let issued_at = Utc::now();
        let request = self
            .transport
            .post(&format!("{}{}", self.api_url, TOKEN_PATH))
            .json(&body);

        let response: TokenResponse = self
            .dispatch(request, None)
            .await
            .map_err(|e| e.context("issue_client_token"))?;

        let token = ClientToken::finalize(response, issued_at)
            .map_err(|e| e.context("issue_client_token"))?;
        debug!(expires_at = %token.expires_at, "クライアントトークンを取得しました");
        Ok(token)
    }

    /// ID トークンをユーザートークンに交換する（リージョン API）。
    pub async fn exchange_identity_token(&self, id_token: &str) -> Result<AuthToken> {
        let regional = self
            .regional_base_url()
            .await
            .map_err(|e| e.context("exchange_identity_token"))?;

        let body = TokenRequest {
            grant_type: GRANT_TOKEN_EXCHANGE,
            client_id: &self.config.client_id,
            client_secret: None,
            id_token: Some(id_token),
            refresh_token: None,
            scope: "",
        };
        self.request_user_token(&regional, &body, None)
            .await
            .map_err(|e| e.context("exchange_identity_token"))
    }

    /// リフレッシュトークンでユーザートークンを更新する（リージョン API）。
    pub async fn refresh_user_token(&self, current: &AuthToken) -> Result<AuthToken> {
        let regional = self
            .regional_base_url()
            .await
            .map_err(|e| e.context("refresh_user_token"))?;
        self.refresh_with(&regional, current).await
    }

    /// ログインする。
    ///
    /// リージョン URL とリフレッシュ可能なユーザートークンが既にあれば何もしない。
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        self.login_inner(email, password)
            .await
            .map_err(|e| e.context("login"))
    }

    async fn login_inner(&self, email: &str, password: &str) -> Result<()> {
        {
            let state = self.state.lock().await;
            if state.regional_base_url().is_some() && state.has_refreshable_user_token() {
                debug!("復元済みのセッションを使用します");
                return Ok(());
            }
        }

        let provider = self.resolve_provider(email).await?;

        if self.state.lock().await.has_refreshable_user_token() {
            debug!("リージョン URL を補完し、既存のユーザートークンを使用します");
            return Ok(());
        }

        self.validate_country(&self.config.country_code).await?;

        let identity = IdentityClient::new(
            self.transport.clone(),
            &provider.domain,
            &provider.api_key,
            self.config.identity_base_url.as_deref(),
        );
        let id_token = identity
            .login(email, password)
            .await
            .map_err(|e| e.context("identity_login"))?;

        let user_token = self.exchange_identity_token(&id_token).await?;
        self.state.lock().await.user_token = Some(user_token);

        info!(
            data_center = provider.data_center.as_deref().unwrap_or(""),
            "ログインしました"
        );
        Ok(())
    }

    /// アカウントの全アプライアンスを取得する。
    pub async fn appliances(&self, include_metadata: bool) -> Result<Vec<Appliance>> {
        let result: Result<Vec<Appliance>> = async {
            let regional = self.regional_base_url().await?;
            let request = self.transport.get(&format!(
                "{regional}{APPLIANCES_PATH}?includeMetadata={include_metadata}"
            ));
            self.do_user_auth(request).await
        }
        .await;
        result.map_err(|e| e.context("appliances"))
    }

    /// 指定したアプライアンスの製品情報を取得する。
    pub async fn appliances_info(&self, appliance_ids: &[ApplianceId]) -> Result<Vec<ApplianceInfo>> {
        let result: Result<Vec<ApplianceInfo>> = async {
            let regional = self.regional_base_url().await?;
            let request = self
                .transport
                .post(&format!("{regional}{APPLIANCES_INFO_PATH}"))
                .json(&ApplianceInfoRequest { appliance_ids });
            self.do_user_auth(request).await
        }
        .await;
        result.map_err(|e| e.context("appliances_info"))
    }

    /// 現在のセッション状態のコピーを返す。
    pub async fn state(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// セッション状態を置き換える。
    pub async fn set_state(&self, state: SessionState) {
        *self.state.lock().await = state;
    }

    async fn regional_base_url(&self) -> Result<String> {
        self.state
            .lock()
            .await
            .regional_base_url()
            .map(str::to_string)
            .ok_or(ApplianceClientError::MissingRegion)
    }

    async fn refresh_with(&self, regional: &str, current: &AuthToken) -> Result<AuthToken> {
        let refresh_token = current
            .refresh_token()
            .ok_or(ApplianceClientError::MissingRefreshToken)
            .map_err(|e| e.context("refresh_user_token"))?;

        let body = TokenRequest {
            grant_type: GRANT_REFRESH_TOKEN,
            client_id: &self.config.client_id,
            client_secret: None,
            id_token: None,
            refresh_token: Some(refresh_token),
            scope: "",
        };
        self.request_user_token(regional, &body, Some(refresh_token))
            .await
            .map_err(|e| {
                error!(error = %e, "ユーザートークンのリフレッシュに失敗しました");
                ApplianceClientError::RefreshFailed(Box::new(e)).context("refresh_user_token")
            })
    }

    async fn request_user_token(
        &self,
        regional: &str,
        body: &TokenRequest<'_>,
        previous_refresh_token: Option<&str>,
    ) -> Result<AuthToken> {
        debug!(grant_type = body.grant_type, "ユーザートークンを取得します");

        let issued_at = Utc::now();
        let request = self
            .transport
            .post(&format!("{regional}{TOKEN_PATH}"))
            .header(AUTHORIZATION, "Bearer ")
            .header(ORIGIN_COUNTRY_HEADER, &self.config.country_code)
            .json(body);

        let response: TokenResponse = self.dispatch(request, None).await?;
        let token = AuthToken::finalize(response, issued_at, previous_refresh_token)?;
        debug!(expires_at = %token.token.expires_at, "ユーザートークンを取得しました");
        Ok(token)
    }

    /// クライアントトークンで認可して送信する。
    ///
    /// トークンがないか期限切れなら先に取得する。ログイン前でも失敗しない。
    async fn do_client_auth<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let authorization = {
            let mut state = self.state.lock().await;
            let valid = state.client_token.as_ref().filter(|t| !t.is_expired());
            match valid {
                Some(token) => token.authorization(),
                None => {
                    debug!("クライアントトークンがないか期限切れのため取得します");
                    let token = self.issue_client_token().await?;
                    let authorization = token.authorization();
                    state.client_token = Some(token);
                    authorization
                }
            }
        };
        self.dispatch(request, Some(authorization)).await
    }

    /// ユーザートークンで認可して送信する。
    ///
    /// 未ログイン（アクセストークンが空の場合を含む）ならネットワークに出ずに `NotLoggedIn`。
    /// 期限切れなら 1 回だけリフレッシュし、失敗すれば `SessionExpired` で終了する。
    async fn do_user_auth<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let authorization = {
            let mut state = self.state.lock().await;
            let Some(current) = state
                .user_token
                .clone()
                .filter(|t| !t.token.access_token.is_empty())
            else {
                return Err(ApplianceClientError::NotLoggedIn);
            };
            if current.is_expired() {
                warn!("ユーザートークンの有効期限が切れたためリフレッシュします");
                let regional = state
                    .regional_base_url()
                    .map(str::to_string)
                    .ok_or(ApplianceClientError::MissingRegion)?;
                let refreshed = self
                    .refresh_with(&regional, &current)
                    .await
                    .map_err(|e| ApplianceClientError::SessionExpired(Box::new(e)))?;
                let authorization = refreshed.authorization();
                state.user_token = Some(refreshed);
                authorization
            } else {
                current.authorization()
            }
        };
        self.dispatch(request, Some(authorization)).await
    }

    /// リクエストを送信し、200 ならボディを JSON としてデコードする。
    async fn dispatch<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        authorization: Option<String>,
    ) -> Result<T> {
        let request = match authorization {
            Some(value) => request.header(AUTHORIZATION, value),
            None => request,
        };

        let response = self.transport.send(request).await?;
        let status = response.status();
        let path = response.url().path().to_string();
        let body = response.text().await?;

        if status != StatusCode::OK {
            error!(
                status = %status,
                path = %path,
                body = %body,
                "予期しないステータスコードを受信しました"
            );
            return Err(ApplianceClientError::UnexpectedStatus {
                status: status.as_u16(),
                path,
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, path = %path, "レスポンスの解析に失敗しました");
            ApplianceClientError::Decode(e.to_string())
        })
    }
}

#[async_trait]
impl ApplianceApi for ApplianceClient {
    async fn login(&self, email: &str, password: &str) -> Result<()> {
        ApplianceClient::login(self, email, password).await
    }

    async fn appliances(&self, include_metadata: bool) -> Result<Vec<Appliance>> {
        ApplianceClient::appliances(self, include_metadata).await
    }

    async fn appliances_info(&self, appliance_ids: &[ApplianceId]) -> Result<Vec<ApplianceInfo>> {
        ApplianceClient::appliances_info(self, appliance_ids).await
    }

    async fn state(&self) -> SessionState {
        ApplianceClient::state(self).await
    }

    async fn set_state(&self, state: SessionState) {
        ApplianceClient::set_state(self, state).await;
    }
}
