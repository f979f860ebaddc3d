//! セッション状態（リージョン URL とトークン）の保存・復元。

use serde::{Deserialize, Serialize};

use crate::token::{AuthToken, ClientToken};

/// SessionState はクライアントが保持する可変状態を表す。
///
/// `ApplianceClient::state` で取り出して永続化し、`ApplianceClient::set_state`
/// または `ClientConfig::with_state` で復元できる。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    /// ディスカバリーで確定したリージョン別 API の URL。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regional_base_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_token: Option<ClientToken>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_token: Option<AuthToken>,
}

impl SessionState {
    /// 空でないリージョン URL を返す。
    pub fn regional_base_url(&self) -> Option<&str> {
        self.regional_base_url.as_deref().filter(|u| !u.is_empty())
    }

    /// リフレッシュ可能なユーザートークンを持っているかどうか。
    pub fn has_refreshable_user_token(&self) -> bool {
        self.user_token
            .as_ref()
            .is_some_and(|t| t.refresh_token().is_some())
    }

    /// JSON 文字列に変換する。
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// JSON 文字列から復元する。
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
