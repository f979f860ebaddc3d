use chrono::{Duration, Utc};
use k1s0_appliance_client::{
    ApplianceClient, ApplianceClientError, ApplianceId, AuthToken, ClientConfig, SessionState,
    TokenResponse,
};
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CLIENT_TOKEN_PATH: &str = "/one-account-authorization/api/v1/token";
const REGIONAL_TOKEN_PATH: &str = "/eu/one-account-authorization/api/v1/token";
const PROVIDERS_PATH: &str = "/one-account-user/api/v1/identity-providers";
const COUNTRIES_PATH: &str = "/eu/one-account-user/api/v1/countries";
const APPLIANCES_PATH: &str = "/eu/appliance/api/v2/appliances";
const APPLIANCES_INFO_PATH: &str = "/eu/appliance/api/v2/appliances/info";

fn make_config(server: &MockServer) -> ClientConfig {
    ClientConfig::new("ocp-api-key", "electrolux", "ElxOneApp", "client-secret", "FI")
        .with_api_url(&server.uri())
        .with_identity_base_url(&server.uri())
}

fn regional_url(server: &MockServer) -> String {
    format!("{}/eu", server.uri())
}

fn token_json(access: &str, refresh: Option<&str>) -> serde_json::Value {
    let mut json = serde_json::json!({
        "accessToken": access,
        "expiresIn": 43200,
        "tokenType": "Bearer",
        "scope": ""
    });
    if let Some(r) = refresh {
        json["refreshToken"] = serde_json::Value::String(r.to_string());
    }
    json
}

fn provider_json(server: &MockServer) -> serde_json::Value {
    serde_json::json!({
        "domain": "eu1.gigya.com",
        "apiKey": "gigya-api-key",
        "brand": "electrolux",
        "httpRegionalBaseUrl": regional_url(server),
        "webSocketRegionalBaseUrl": "wss://ws.eu.example",
        "dataCenter": "EU"
    })
}

fn user_token(access: &str, refresh: Option<&str>, issued_secs_ago: i64) -> AuthToken {
    AuthToken::finalize(
        TokenResponse {
            access_token: access.to_string(),
            expires_in: 60,
            expires_at: None,
            token_type: "Bearer".to_string(),
            refresh_token: refresh.map(str::to_string),
            scope: None,
        },
        Utc::now() - Duration::seconds(issued_secs_ago),
        None,
    )
    .unwrap()
}

fn logged_in_state(server: &MockServer, token: AuthToken) -> SessionState {
    SessionState {
        regional_base_url: Some(regional_url(server)),
        client_token: None,
        user_token: Some(token),
    }
}

async fn mount_client_token(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path(CLIENT_TOKEN_PATH))
        .and(body_partial_json(serde_json::json!({
            "grantType": "client_credentials",
            "clientId": "ElxOneApp",
            "clientSecret": "client-secret",
            "scope": ""
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("client-access", None)))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_providers(server: &MockServer, providers: serde_json::Value, expected: u64) {
    Mock::given(method("GET"))
        .and(path(PROVIDERS_PATH))
        .and(query_param("brand", "electrolux"))
        .and(query_param("email", "user@example.com"))
        .and(header("Context-Brand", "electrolux"))
        .and(header("authorization", "Bearer client-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(providers))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_countries(server: &MockServer, codes: &[&str], expected: u64) {
    let countries: Vec<serde_json::Value> = codes
        .iter()
        .map(|c| serde_json::json!({"name": c, "countryCode": c, "dataCenter": "EU"}))
        .collect();
    Mock::given(method("GET"))
        .and(path(COUNTRIES_PATH))
        .and(header("authorization", "Bearer client-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(countries))
        .expect(expected)
        .mount(server)
        .await;
}

fn without_api_key(req: &wiremock::Request) -> bool {
    !req.headers.contains_key("x-api-key")
}

async fn mount_identity(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path("/accounts.login"))
        .and(without_api_key)
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errorCode": 0,
            "UID": "uid-1",
            "sessionInfo": {"sessionToken": "st-1", "sessionSecret": "ss-1"}
        })))
        .expect(expected)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/accounts.getJWT"))
        .and(without_api_key)
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errorCode": 0,
            "id_token": "id-jwt"
        })))
        .expect(expected)
        .mount(server)
        .await;
}

async fn mount_token_exchange(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path(REGIONAL_TOKEN_PATH))
        .and(header("Origin-Country-Code", "FI"))
        .and(body_partial_json(serde_json::json!({
            "grantType": "urn:ietf:params:oauth:grant-type:token-exchange",
            "clientId": "ElxOneApp",
            "idToken": "id-jwt"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(token_json("user-access", Some("user-refresh"))),
        )
        .expect(expected)
        .mount(server)
        .await;
}

fn appliance_json() -> serde_json::Value {
    serde_json::json!([{
        "applianceId": "950011538111111115087076",
        "applianceData": {"applianceName": "Bedroom", "modelName": "PUREA9"},
        "properties": {"reported": {"Workmode": "Auto", "PM2_5": 3}},
        "connectionState": "Connected"
    }])
}

#[tokio::test]
async fn test_login_end_to_end() {
    let server = MockServer::start().await;
    mount_client_token(&server, 1).await;
    mount_providers(&server, serde_json::json!([provider_json(&server)]), 1).await;
    mount_countries(&server, &["FI", "SE"], 1).await;
    mount_identity(&server, 1).await;
    mount_token_exchange(&server, 1).await;

    let client = ApplianceClient::new(make_config(&server)).unwrap();
    client.login("user@example.com", "pw").await.unwrap();

    let state = client.state().await;
    assert_eq!(state.regional_base_url.as_deref(), Some(regional_url(&server).as_str()));
    let user = state.user_token.unwrap();
    assert_eq!(user.token.access_token, "user-access");
    assert_eq!(user.refresh_token(), Some("user-refresh"));
    assert!(!user.is_expired());
    assert_eq!(state.client_token.unwrap().access_token, "client-access");

    server.verify().await;
}

#[tokio::test]
async fn test_login_sends_api_key_and_user_agent_everywhere() {
    let server = MockServer::start().await;
    // 共通ヘッダーがないリクエストはどのモックにも一致せず 404 になる
    Mock::given(header("x-api-key", "ocp-api-key"))
        .and(header("user-agent", "Ktor client"))
        .and(header("accept", "application/json"))
        .and(method("POST"))
        .and(path(CLIENT_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("client-access", None)))
        .mount(&server)
        .await;
    Mock::given(header("x-api-key", "ocp-api-key"))
        .and(header("user-agent", "Ktor client"))
        .and(method("GET"))
        .and(path(PROVIDERS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApplianceClient::new(make_config(&server)).unwrap();
    let err = client.login("user@example.com", "pw").await.unwrap_err();
    assert!(matches!(err.root(), ApplianceClientError::NoProvider));
}

#[tokio::test]
async fn test_resolve_provider_none() {
    let server = MockServer::start().await;
    mount_client_token(&server, 1).await;
    mount_providers(&server, serde_json::json!([]), 1).await;

    let client = ApplianceClient::new(make_config(&server)).unwrap();
    let err = client.login("user@example.com", "pw").await.unwrap_err();
    assert!(matches!(err.root(), ApplianceClientError::NoProvider));
    assert_eq!(err.operations(), vec!["login", "resolve_provider"]);
    assert!(client.state().await.regional_base_url.is_none());
}

#[tokio::test]
async fn test_resolve_provider_ambiguous() {
    let server = MockServer::start().await;
    mount_client_token(&server, 1).await;
    mount_providers(
        &server,
        serde_json::json!([provider_json(&server), provider_json(&server)]),
        1,
    )
    .await;
    mount_identity(&server, 0).await;

    let client = ApplianceClient::new(make_config(&server)).unwrap();
    let err = client.login("user@example.com", "pw").await.unwrap_err();
    assert!(matches!(
        err.root(),
        ApplianceClientError::AmbiguousProvider { count: 2 }
    ));
    server.verify().await;
}

#[tokio::test]
async fn test_resolve_provider_sets_regional_base_url() {
    let server = MockServer::start().await;
    mount_client_token(&server, 1).await;
    mount_providers(&server, serde_json::json!([provider_json(&server)]), 1).await;

    let client = ApplianceClient::new(make_config(&server)).unwrap();
    let provider = client.resolve_provider("user@example.com").await.unwrap();
    assert_eq!(provider.domain, "eu1.gigya.com");
    assert_eq!(
        client.state().await.regional_base_url,
        Some(regional_url(&server))
    );
}

#[tokio::test]
async fn test_unsupported_country_stops_before_identity_login() {
    let server = MockServer::start().await;
    mount_client_token(&server, 1).await;
    mount_providers(&server, serde_json::json!([provider_json(&server)]), 1).await;
    mount_countries(&server, &["SE", "NO"], 1).await;
    mount_identity(&server, 0).await;
    mount_token_exchange(&server, 0).await;

    let client = ApplianceClient::new(make_config(&server)).unwrap();
    let err = client.login("user@example.com", "pw").await.unwrap_err();
    match err.root() {
        ApplianceClientError::UnsupportedCountry { code, available } => {
            assert_eq!(code, "FI");
            assert_eq!(available, &vec!["SE".to_string(), "NO".to_string()]);
        }
        other => panic!("unexpected {other:?}"),
    }
    server.verify().await;
}

#[tokio::test]
async fn test_identity_provider_error_fails_login() {
    let server = MockServer::start().await;
    mount_client_token(&server, 1).await;
    mount_providers(&server, serde_json::json!([provider_json(&server)]), 1).await;
    mount_countries(&server, &["FI"], 1).await;
    Mock::given(method("POST"))
        .and(path("/accounts.login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "errorCode": 403042,
            "errorMessage": "Invalid LoginID"
        })))
        .mount(&server)
        .await;
    mount_token_exchange(&server, 0).await;

    let client = ApplianceClient::new(make_config(&server)).unwrap();
    let err = client.login("user@example.com", "bad").await.unwrap_err();
    assert!(matches!(
        err.root(),
        ApplianceClientError::Authentication { code: 403042, .. }
    ));
    assert!(client.state().await.user_token.is_none());
    server.verify().await;
}

#[tokio::test]
async fn test_restored_state_without_region_resolves_provider_only() {
    let server = MockServer::start().await;
    mount_client_token(&server, 1).await;
    mount_providers(&server, serde_json::json!([provider_json(&server)]), 1).await;
    mount_countries(&server, &["FI"], 0).await;
    mount_identity(&server, 0).await;

    let state = SessionState {
        regional_base_url: None,
        client_token: None,
        user_token: Some(user_token("user-access", Some("user-refresh"), 0)),
    };
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    client.login("user@example.com", "pw").await.unwrap();
    assert_eq!(
        client.state().await.regional_base_url,
        Some(regional_url(&server))
    );
    server.verify().await;
}

#[tokio::test]
async fn test_client_token_is_reused_until_expired() {
    let server = MockServer::start().await;
    mount_client_token(&server, 1).await;
    mount_providers(&server, serde_json::json!([provider_json(&server)]), 2).await;

    let client = ApplianceClient::new(make_config(&server)).unwrap();
    client.identity_providers("user@example.com").await.unwrap();
    client.identity_providers("user@example.com").await.unwrap();
    server.verify().await;
}

#[tokio::test]
async fn test_expired_client_token_is_reissued() {
    let server = MockServer::start().await;
    mount_client_token(&server, 1).await;
    mount_providers(&server, serde_json::json!([provider_json(&server)]), 1).await;

    let mut stale = user_token("stale-client", None, 120).token;
    stale.expires_at = Utc::now() - Duration::seconds(1);
    let state = SessionState {
        client_token: Some(stale),
        ..Default::default()
    };
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    client.identity_providers("user@example.com").await.unwrap();
    assert_eq!(
        client.state().await.client_token.unwrap().access_token,
        "client-access"
    );
    server.verify().await;
}

#[tokio::test]
async fn test_appliances_returns_decoded_records() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(APPLIANCES_PATH))
        .and(query_param("includeMetadata", "true"))
        .and(header("authorization", "Bearer user-access"))
        .and(header("x-api-key", "ocp-api-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(appliance_json()))
        .expect(1)
        .mount(&server)
        .await;

    let state = logged_in_state(&server, user_token("user-access", Some("r1"), 0));
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    let appliances = client.appliances(true).await.unwrap();
    assert_eq!(appliances.len(), 1);
    assert_eq!(appliances[0].appliance_id.serial(), Some("11111111"));
    let reported = appliances[0]
        .properties
        .as_ref()
        .and_then(|p| p.reported.as_ref())
        .unwrap();
    assert_eq!(reported.pm25, Some(3));
    assert_eq!(reported.fanspeed, None);
}

#[tokio::test]
async fn test_appliances_unexpected_status_keeps_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(APPLIANCES_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"error":"boom"}"#))
        .mount(&server)
        .await;

    let state = logged_in_state(&server, user_token("user-access", Some("r1"), 0));
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    let err = client.appliances(false).await.unwrap_err();
    assert_eq!(err.status(), Some(500));
    match err.root() {
        ApplianceClientError::UnexpectedStatus { status, path, body } => {
            assert_eq!(*status, 500);
            assert_eq!(path, APPLIANCES_PATH);
            assert_eq!(body, r#"{"error":"boom"}"#);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(err.to_string().contains(r#"{"error":"boom"}"#));
}

#[tokio::test]
async fn test_appliances_malformed_json_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(APPLIANCES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("[{"))
        .mount(&server)
        .await;

    let state = logged_in_state(&server, user_token("user-access", Some("r1"), 0));
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    let err = client.appliances(false).await.unwrap_err();
    assert!(matches!(err.root(), ApplianceClientError::Decode(_)));
}

#[tokio::test]
async fn test_appliances_info_posts_ids() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(APPLIANCES_INFO_PATH))
        .and(header("authorization", "Bearer user-access"))
        .and(body_partial_json(serde_json::json!({
            "applianceIds": ["950011538111111115087076"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"pnc": "950011538", "brand": "ELECTROLUX", "model": "PUREA9"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let state = logged_in_state(&server, user_token("user-access", Some("r1"), 0));
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    let info = client
        .appliances_info(&[ApplianceId::from("950011538111111115087076")])
        .await
        .unwrap();
    assert_eq!(info[0].model.as_deref(), Some("PUREA9"));
    assert!(info[0].variant.is_none());
}

#[tokio::test]
async fn test_expired_user_token_refreshes_once() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGIONAL_TOKEN_PATH))
        .and(header("Origin-Country-Code", "FI"))
        .and(body_partial_json(serde_json::json!({
            "grantType": "refresh_token",
            "clientId": "ElxOneApp",
            "refreshToken": "r1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("refreshed-access", None)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(APPLIANCES_PATH))
        .and(header("authorization", "Bearer refreshed-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(appliance_json()))
        .expect(2)
        .mount(&server)
        .await;

    let state = logged_in_state(&server, user_token("old-access", Some("r1"), 120));
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    client.appliances(false).await.unwrap();
    client.appliances(false).await.unwrap();

    let user = client.state().await.user_token.unwrap();
    assert_eq!(user.token.access_token, "refreshed-access");
    // サーバーが新しいリフレッシュトークンを返さなければ引き継ぐ
    assert_eq!(user.refresh_token(), Some("r1"));
    server.verify().await;
}

#[tokio::test]
async fn test_concurrent_calls_share_one_refresh() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGIONAL_TOKEN_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(token_json("refreshed-access", Some("r2")))
                .set_delay(std::time::Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(APPLIANCES_PATH))
        .and(header("authorization", "Bearer refreshed-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(appliance_json()))
        .expect(3)
        .mount(&server)
        .await;

    let state = logged_in_state(&server, user_token("old-access", Some("r1"), 120));
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    let (a, b, c) = tokio::join!(
        client.appliances(false),
        client.appliances(false),
        client.appliances(true)
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());
    assert_eq!(
        client.state().await.user_token.unwrap().refresh_token(),
        Some("r2")
    );
    server.verify().await;
}

#[tokio::test]
async fn test_rejected_refresh_is_session_expired() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGIONAL_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string(r#"{"error":"invalid_grant"}"#))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(APPLIANCES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(appliance_json()))
        .expect(0)
        .mount(&server)
        .await;

    let state = logged_in_state(&server, user_token("old-access", Some("r1"), 120));
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    let err = client.appliances(false).await.unwrap_err();
    match err.root() {
        ApplianceClientError::SessionExpired(inner) => {
            assert!(matches!(
                inner.root(),
                ApplianceClientError::RefreshFailed(_)
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(err.status(), Some(401));
    server.verify().await;
}

#[tokio::test]
async fn test_expired_token_without_refresh_token_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGIONAL_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(token_json("x", None)))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(APPLIANCES_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(appliance_json()))
        .expect(0)
        .mount(&server)
        .await;

    let state = logged_in_state(&server, user_token("old-access", None, 120));
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    let err = client.appliances(false).await.unwrap_err();
    match err.root() {
        ApplianceClientError::SessionExpired(inner) => {
            assert!(matches!(
                inner.root(),
                ApplianceClientError::MissingRefreshToken
            ));
        }
        other => panic!("unexpected {other:?}"),
    }
    server.verify().await;
}

#[tokio::test]
async fn test_not_logged_in_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(wiremock::matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let state = SessionState {
        regional_base_url: Some(regional_url(&server)),
        ..Default::default()
    };
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    let err = client
        .appliances_info(&[ApplianceId::from("950011538111111115087076")])
        .await
        .unwrap_err();
    assert!(matches!(err.root(), ApplianceClientError::NotLoggedIn));
    server.verify().await;
}

#[tokio::test]
async fn test_session_state_roundtrip_skips_login() {
    let server = MockServer::start().await;
    mount_client_token(&server, 1).await;
    mount_providers(&server, serde_json::json!([provider_json(&server)]), 1).await;
    mount_countries(&server, &["FI"], 1).await;
    mount_identity(&server, 1).await;
    mount_token_exchange(&server, 1).await;
    Mock::given(method("GET"))
        .and(path(APPLIANCES_PATH))
        .and(header("authorization", "Bearer user-access"))
        .respond_with(ResponseTemplate::new(200).set_body_json(appliance_json()))
        .expect(1)
        .mount(&server)
        .await;

    let first = ApplianceClient::new(make_config(&server)).unwrap();
    first.login("user@example.com", "pw").await.unwrap();
    let saved = first.state().await.to_json().unwrap();

    let restored_state = SessionState::from_json(&saved).unwrap();
    let second = ApplianceClient::new(make_config(&server).with_state(restored_state.clone())).unwrap();
    // 復元したセッションではログインがネットワークに出ない
    second.login("user@example.com", "pw").await.unwrap();
    let appliances = second.appliances(false).await.unwrap();
    assert_eq!(appliances.len(), 1);
    assert_eq!(second.state().await, restored_state);

    server.verify().await;
}

#[tokio::test]
async fn test_out_of_range_expires_in_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CLIENT_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": "a",
            "expiresIn": 10_000_000_000_000i64,
            "tokenType": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApplianceClient::new(make_config(&server)).unwrap();
    let err = client.issue_client_token().await.unwrap_err();
    assert!(matches!(err.root(), ApplianceClientError::Decode(_)));
    assert_eq!(err.operations(), vec!["issue_client_token"]);
    assert!(client.state().await.client_token.is_none());
    server.verify().await;
}

#[tokio::test]
async fn test_refresh_with_out_of_range_expires_in_keeps_old_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REGIONAL_TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "accessToken": "refreshed-access",
            "expiresIn": i64::MAX,
            "tokenType": "Bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let old = user_token("old-access", Some("r1"), 120);
    let state = logged_in_state(&server, old.clone());
    let client = ApplianceClient::new(make_config(&server).with_state(state)).unwrap();
    let err = client.appliances(false).await.unwrap_err();
    match err.root() {
        ApplianceClientError::SessionExpired(inner) => match inner.root() {
            ApplianceClientError::RefreshFailed(cause) => {
                assert!(matches!(cause.root(), ApplianceClientError::Decode(_)));
            }
            other => panic!("unexpected {other:?}"),
        },
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(client.state().await.user_token, Some(old));
    server.verify().await;
}

#[tokio::test]
async fn test_issued_token_expiry_is_derived_from_expires_in() {
    let server = MockServer::start().await;
    mount_client_token(&server, 1).await;

    let client = ApplianceClient::new(make_config(&server)).unwrap();
    let before = Utc::now();
    let token = client.issue_client_token().await.unwrap();
    let after = Utc::now();

    let issued_at = token.expires_at - Duration::seconds(token.expires_in);
    assert!(issued_at >= before && issued_at <= after);
    assert_eq!(token.expires_in, 43200);
}

#[test]
fn test_new_rejects_each_missing_field() {
    for field in ["api_key", "brand", "client_id", "client_secret", "country_code"] {
        let mut config = ClientConfig::new("k", "electrolux", "ElxOneApp", "secret", "FI");
        match field {
            "api_key" => config.api_key.clear(),
            "brand" => config.brand.clear(),
            "client_id" => config.client_id.clear(),
            "client_secret" => config.client_secret.clear(),
            _ => config.country_code.clear(),
        }
        match ApplianceClient::new(config) {
            Err(ApplianceClientError::Config(name)) => assert_eq!(name, field),
            Err(other) => panic!("{field}: unexpected {other:?}"),
            Ok(_) => panic!("{field}: expected config error"),
        }
    }
}
