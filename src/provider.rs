//! アイデンティティプロバイダーとサービス対象国のディスカバリー結果。

use serde::{Deserialize, Serialize};

use crate::error::{ApplianceClientError, Result};

/// IdentityProvider はアカウントに対応するプロバイダーとリージョンの情報。
///
/// ログインのたびに取得し直し、セッションをまたいでキャッシュしない。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProvider {
    /// 例: `eu1.gigya.com`
    pub domain: String,
    pub api_key: String,
    /// 例: `electrolux`
    #[serde(default)]
    pub brand: Option<String>,
    /// 例: `https://api.eu.ocp.electrolux.one`
    pub http_regional_base_url: String,
    /// 例: `wss://ws.eu.ocp.electrolux.one`
    #[serde(default)]
    pub web_socket_regional_base_url: Option<String>,
    /// 例: `EU`
    #[serde(default)]
    pub data_center: Option<String>,
}

/// Country はサービス対象国の情報。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Country {
    #[serde(default)]
    pub name: Option<String>,
    pub country_code: String,
    /// 例: `APMEA`, `EU (GDPR)`, `LAM`, `US`
    #[serde(default)]
    pub legal_region: Option<String>,
    /// 例: `BA-APMEA`, `BA-EU`, `BA-LATAM`, `BA-NA`
    #[serde(default)]
    pub business_region: Option<String>,
    /// 例: `AU`, `US`, `EU`
    #[serde(default)]
    pub data_center: Option<String>,
}

/// ディスカバリー結果から唯一のプロバイダーを選ぶ。
///
/// 0 件なら `NoProvider`、複数なら `AmbiguousProvider`。
pub fn select_single_provider(providers: Vec<IdentityProvider>) -> Result<IdentityProvider> {
    let count = providers.len();
    let mut iter = providers.into_iter();
    match (iter.next(), count) {
        (None, _) => Err(ApplianceClientError::NoProvider),
        (Some(provider), 1) => Ok(provider),
        (Some(_), count) => Err(ApplianceClientError::AmbiguousProvider { count }),
    }
}

/// 一覧に含まれる国コードを順に返す。
pub fn country_codes(countries: &[Country]) -> Vec<String> {
    countries.iter().map(|c| c.country_code.clone()).collect()
}

/// 国コードが一覧に含まれているか検証する。
pub fn ensure_country_supported(countries: &[Country], code: &str) -> Result<()> {
    if countries.iter().any(|c| c.country_code == code) {
        return Ok(());
    }
    Err(ApplianceClientError::UnsupportedCountry {
        code: code.to_string(),
        available: country_codes(countries),
    })
}
