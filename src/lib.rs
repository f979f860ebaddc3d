//! k1s0-appliance-client: クラウド型アプライアンス制御 API のクライアントライブラリ。
//!
//! 外部アイデンティティプロバイダーでユーザーを認証し、得られた ID トークンを
//! リージョン別認可エンドポイントでアクセストークン/リフレッシュトークンに交換したうえで、
//! アプライアンスの状態を取得する。トークンの期限切れは呼び出し時に検出して自動で更新する。
//!
//! # 使い方
//!
//! ```ignore
//! use k1s0_appliance_client::{ApplianceClient, ClientConfig, SessionState};
//!
//! let config = ClientConfig::new("api-key", "electrolux", "ElxOneApp", "client-secret", "FI");
//! let client = ApplianceClient::new(config)?;
//!
//! client.login("user@example.com", "password").await?;
//! let appliances = client.appliances(true).await?;
//!
//! // セッションを保存し、次回はログインを省略する
//! let saved = client.state().await.to_json()?;
//! let restored = ApplianceClient::new(
//!     ClientConfig::new("api-key", "electrolux", "ElxOneApp", "client-secret", "FI")
//!         .with_state(SessionState::from_json(&saved)?),
//! )?;
//! ```

pub mod appliance;
pub mod client;
pub mod config;
pub mod error;
pub mod identity;
pub mod provider;
pub mod state;
pub mod token;
pub mod transport;

pub use appliance::{Appliance, ApplianceId, ApplianceInfo};
pub use client::{ApplianceApi, ApplianceClient};
pub use config::ClientConfig;
pub use error::{ApplianceClientError, Result};
pub use identity::IdentityClient;
pub use provider::{Country, IdentityProvider};
pub use state::SessionState;
pub use token::{AuthToken, ClientToken, TokenResponse};
pub use transport::{HeaderDecorator, Transport};

#[cfg(feature = "mock")]
pub use client::MockApplianceApi;
