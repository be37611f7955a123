use admin_console::config::ApiSettings;
use admin_console::services::{ApiGateway, GatewayError, RequestOptions};
use admin_console::session::{CredentialStore, MemoryCredentialStore};
use reqwest::header::{HeaderName, HeaderValue, AUTHORIZATION};
use secrecy::ExposeSecret;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const EVENTS: &str = "/api/events/events/";
const REFRESH: &str = "/api/token/refresh/";

async fn setup() -> (MockServer, ApiGateway, MemoryCredentialStore) {
    let server = MockServer::start().await;
    let gateway = ApiGateway::new(ApiSettings::new(server.uri())).unwrap();
    let store = MemoryCredentialStore::new();
    store.save("a1", "r1").await.unwrap();
    store.set_role("admin").await.unwrap();
    (server, gateway, store)
}

async fn mock_events(server: &MockServer, token: &str, status: u16, calls: u64) {
    Mock::given(method("GET"))
        .and(path(EVENTS))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(status).set_body_json(json!({"results": []})))
        .expect(calls)
        .mount(server)
        .await;
}

async fn access_token(store: &MemoryCredentialStore) -> Option<String> {
    store
        .read()
        .await
        .unwrap()
        .map(|credentials| credentials.access_token.expose_secret().clone())
}

#[tokio::test]
async fn successful_call_needs_no_renewal() {
    let (server, gateway, store) = setup().await;
    mock_events(&server, "a1", 200, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = gateway
        .get(&store, EVENTS, RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(access_token(&store).await.as_deref(), Some("a1"));
}

#[tokio::test]
async fn unauthorized_call_is_renewed_and_retried_once() {
    let (server, gateway, store) = setup().await;
    mock_events(&server, "a1", 401, 1).await;
    mock_events(&server, "a2", 200, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .and(body_json(json!({"refresh": "r1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = gateway
        .get(&store, EVENTS, RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    assert_eq!(access_token(&store).await.as_deref(), Some("a2"));
    assert_eq!(store.raw("refresh_token").as_deref(), Some("r1"));
    assert_eq!(store.raw("user_role").as_deref(), Some("admin"));
}

#[tokio::test]
async fn rotated_refresh_credential_is_persisted() {
    let (server, gateway, store) = setup().await;
    mock_events(&server, "a1", 401, 1).await;
    mock_events(&server, "a2", 200, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access": "a2", "refresh": "r2"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    gateway
        .get(&store, EVENTS, RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(store.raw("refresh_token").as_deref(), Some("r2"));
}

#[tokio::test]
async fn rejected_renewal_clears_the_store() {
    let (server, gateway, store) = setup().await;
    mock_events(&server, "a1", 401, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = gateway.get(&store, EVENTS, RequestOptions::default()).await;

    assert!(matches!(result, Err(GatewayError::SessionExpired)));
    assert!(store.read().await.unwrap().is_none());
    assert_eq!(store.raw("refresh_token"), None);
    assert_eq!(store.raw("user_role"), None);
}

#[tokio::test]
async fn missing_refresh_credential_expires_the_session() {
    let server = MockServer::start().await;
    let gateway = ApiGateway::new(ApiSettings::new(server.uri())).unwrap();
    let store = MemoryCredentialStore::new();
    store.insert_raw("access_token", "a1");
    mock_events(&server, "a1", 401, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let result = gateway.get(&store, EVENTS, RequestOptions::default()).await;

    assert!(matches!(result, Err(GatewayError::SessionExpired)));
    assert!(store.read().await.unwrap().is_none());
}

#[tokio::test]
async fn server_errors_are_returned_without_renewal() {
    let (server, gateway, store) = setup().await;
    mock_events(&server, "a1", 500, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let response = gateway
        .get(&store, EVENTS, RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(response.status(), 500);
    assert_eq!(access_token(&store).await.as_deref(), Some("a1"));
}

#[tokio::test]
async fn second_unauthorized_answer_is_returned_as_is() {
    let (server, gateway, store) = setup().await;
    mock_events(&server, "a1", 401, 1).await;
    mock_events(&server, "a2", 401, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = gateway
        .get(&store, EVENTS, RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    assert_eq!(access_token(&store).await.as_deref(), Some("a2"));
}

#[tokio::test]
async fn caller_headers_cannot_replace_the_credential() {
    let (server, gateway, store) = setup().await;
    Mock::given(method("POST"))
        .and(path(EVENTS))
        .and(header("authorization", "Bearer a1"))
        .and(header("x-client", "console"))
        .and(body_json(json!({"name": "Spring Cup"})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let options = RequestOptions::default()
        .with_header(AUTHORIZATION, HeaderValue::from_static("Bearer forged"))
        .with_header(
            HeaderName::from_static("x-client"),
            HeaderValue::from_static("console"),
        );
    let response = gateway
        .send_json(
            &store,
            reqwest::Method::POST,
            EVENTS,
            json!({"name": "Spring Cup"}),
            options,
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn concurrent_rejections_share_one_renewal() {
    let (server, gateway, store) = setup().await;
    mock_events(&server, "a1", 401, 2).await;
    mock_events(&server, "a2", 200, 2).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "a2"}))
                .set_delay(Duration::from_millis(300)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (first, second) = tokio::join!(
        gateway.get(&store, EVENTS, RequestOptions::default()),
        gateway.get(&store, EVENTS, RequestOptions::default()),
    );

    assert_eq!(first.unwrap().status(), 200);
    assert_eq!(second.unwrap().status(), 200);
}

#[tokio::test]
async fn unreachable_api_is_a_transport_error() {
    let gateway = ApiGateway::new(ApiSettings::new("http://127.0.0.1:1")).unwrap();
    let store = MemoryCredentialStore::new();
    store.save("a1", "r1").await.unwrap();

    let result = gateway.get(&store, EVENTS, RequestOptions::default()).await;

    assert!(matches!(result, Err(GatewayError::Transport(_))));
    assert!(store.read().await.unwrap().is_some());
}

#[tokio::test]
async fn retried_call_resends_the_json_body() {
    let (server, gateway, store) = setup().await;
    for (token, status) in [("a1", 401), ("a2", 201)] {
        Mock::given(method("POST"))
            .and(path("/api/teams/registrations/"))
            .and(header("authorization", format!("Bearer {}", token).as_str()))
            .and(body_json(json!({"team": 4, "sport_event": 9})))
            .respond_with(ResponseTemplate::new(status))
            .expect(1)
            .mount(&server)
            .await;
    }
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access": "a2"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = gateway
        .send_json(
            &store,
            reqwest::Method::POST,
            "/api/teams/registrations/",
            json!({"team": 4, "sport_event": 9}),
            RequestOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
}

#[tokio::test]
async fn delete_carries_the_credential() {
    let (server, gateway, store) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/api/teams/teams/12/"))
        .and(header("authorization", "Bearer a1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let response = gateway
        .delete(&store, "/api/teams/teams/12/", RequestOptions::default())
        .await
        .unwrap();

    assert_eq!(response.status(), 204);
}

#[tokio::test]
async fn renewal_does_not_restore_a_credential_cleared_meanwhile() {
    let (server, gateway, store) = setup().await;
    mock_events(&server, "a1", 401, 1).await;
    mock_events(&server, "a2", 200, 0).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "a2", "refresh": "r2"}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let (result, _) = tokio::join!(
        gateway.get(&store, EVENTS, RequestOptions::default()),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            store.clear().await.unwrap();
        }
    );

    assert!(matches!(result, Err(GatewayError::SessionExpired)));
    assert!(store.read().await.unwrap().is_none());
    assert_eq!(store.raw("refresh_token"), None);
}

#[tokio::test]
async fn rejected_renewal_keeps_a_credential_rotated_meanwhile() {
    let (server, gateway, store) = setup().await;
    mock_events(&server, "a1", 401, 1).await;
    mock_events(&server, "a3", 200, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(ResponseTemplate::new(401).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let (result, _) = tokio::join!(
        gateway.get(&store, EVENTS, RequestOptions::default()),
        async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            store.replace_access("a1", "a3", Some("r3")).await.unwrap();
        }
    );

    assert_eq!(result.unwrap().status(), 200);
    assert_eq!(access_token(&store).await.as_deref(), Some("a3"));
}

#[tokio::test]
async fn abandoned_renewal_is_unregistered() {
    let (server, gateway, store) = setup().await;
    mock_events(&server, "a1", 401, 1).await;
    Mock::given(method("POST"))
        .and(path(REFRESH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"access": "a2"}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let result = tokio::time::timeout(
        Duration::from_millis(150),
        gateway.get(&store, EVENTS, RequestOptions::default()),
    )
    .await;

    assert!(result.is_err());
    assert_eq!(gateway.pending_renewals(), 0);
    assert_eq!(access_token(&store).await.as_deref(), Some("a1"));
}
