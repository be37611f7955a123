#![allow(dead_code)]

use admin_console::config::{ApiSettings, ServerSettings};
use admin_console::services::ApiGateway;
use admin_console::session::CredentialVault;
use admin_console::startup::build_router;
use admin_console::AppState;
use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tower::util::ServiceExt;
use wiremock::matchers::{body_partial_json, header as header_is, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestApp {
    pub api: MockServer,
    pub gateway: Arc<ApiGateway>,
    pub vault: CredentialVault,
    pub router: Router,
}

impl TestApp {
    /// Console wired to a mock sports API.
    pub async fn spawn() -> Self {
        let api = MockServer::start().await;
        let gateway = Arc::new(
            ApiGateway::new(ApiSettings::new(api.uri())).expect("Failed to build gateway"),
        );
        let server = ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 0,
            session_idle_hours: 1,
            secure_cookies: false,
            static_dir: "static".to_string(),
        };
        let vault = CredentialVault::new(Duration::from_secs(3600));
        let router = build_router(AppState::new(gateway.clone(), vault.clone()), &server);

        Self {
            api,
            gateway,
            vault,
            router,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_form(&self, uri: &str, form: &str, cookie: Option<&str>) -> Response<Body> {
        let mut request = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        self.router
            .clone()
            .oneshot(request.body(Body::from(form.to_string())).unwrap())
            .await
            .unwrap()
    }

    /// Token endpoint answering `access-<login>` / `refresh-<login>` for `login`.
    pub async fn mock_token(&self, login: &str) {
        Mock::given(method("POST"))
            .and(path("/api/token/"))
            .and(body_partial_json(json!({ "login": login })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access": format!("access-{}", login),
                "refresh": format!("refresh-{}", login),
            })))
            .mount(&self.api)
            .await;
    }

    /// Profile endpoint reporting `role` to the bearer of `access-<login>`.
    pub async fn mock_profile(&self, login: &str, role: &str) {
        Mock::given(method("GET"))
            .and(path("/api/users/profile/"))
            .and(header_is("authorization", format!("Bearer access-{}", login).as_str()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 7,
                "email": format!("{}@example.com", login),
                "username": login,
                "first_name": "Sam",
                "last_name": "Lee",
                "role": role,
            })))
            .mount(&self.api)
            .await;
    }

    /// Mock the token and profile endpoints for a user whose login is the
    /// role tag, then sign in through the form. Returns the session cookie.
    pub async fn login_as(&self, role: &str) -> String {
        self.mock_token(role).await;
        self.mock_profile(role, role).await;

        let response = self
            .post_form("/", &format!("identifier={}&password=secret", role), None)
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/dashboard");
        session_cookie(&response).expect("login did not set a session cookie")
    }
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// `name=value` part of the Set-Cookie header, if any.
pub fn session_cookie(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
