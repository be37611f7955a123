//! Authenticated access to the remote sports API.
//!
//! Every call carries the stored access credential. A 401 answer triggers
//! one renewal exchange with the refresh credential followed by one retry of
//! the original call; a rejected renewal ends the session.

use dashmap::DashMap;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use service_core::observability::TracedClientExt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;

use crate::config::ApiSettings;
use crate::models::{RefreshRequest, RefreshResponse};
use crate::services::metrics;
use crate::session::{CredentialStore, StoreError};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The API could not be reached.
    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The refresh credential was rejected; the store has been cleared.
    #[error("Session expired")]
    SessionExpired,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Failed to encode request body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Per-call options. Caller headers are merged over the defaults but can
/// never replace the bearer credential.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Method,
    pub headers: HeaderMap,
    pub body: Option<serde_json::Value>,
    pub request_id: Option<String>,
}

impl RequestOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Default::default()
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }
}

#[derive(Debug, Clone)]
enum RenewalOutcome {
    Renewed {
        access: String,
        refresh: Option<String>,
    },
    Rejected,
}

impl RenewalOutcome {
    fn label(&self) -> &'static str {
        match self {
            RenewalOutcome::Renewed { .. } => "renewed",
            RenewalOutcome::Rejected => "rejected",
        }
    }
}

type RenewalFlight = Arc<OnceCell<RenewalOutcome>>;

/// Unregisters a flight when its waiter finishes or is cancelled.
struct FlightRegistration<'a> {
    renewals: &'a DashMap<String, RenewalFlight>,
    refresh: &'a str,
    flight: RenewalFlight,
}

impl Drop for FlightRegistration<'_> {
    fn drop(&mut self) {
        self.renewals
            .remove_if(self.refresh, |_, current| Arc::ptr_eq(current, &self.flight));
    }
}

pub struct ApiGateway {
    client: Client,
    settings: ApiSettings,
    /// In-flight renewals keyed by the refresh credential they present.
    renewals: DashMap<String, RenewalFlight>,
}

impl ApiGateway {
    pub fn new(settings: ApiSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            settings,
            renewals: DashMap::new(),
        })
    }

    pub fn settings(&self) -> &ApiSettings {
        &self.settings
    }

    pub fn url(&self, path: &str) -> String {
        let base = self.settings.base_url.trim_end_matches('/');
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }

    /// Issue `options.method path` with the stored access credential,
    /// renewing it once if the API answers 401.
    ///
    /// Any status other than 401 is returned as-is. The response of the
    /// retried call is returned whatever its status, including a second 401.
    pub async fn request(
        &self,
        store: &dyn CredentialStore,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, GatewayError> {
        let url = self.url(path);
        let body = options.body.as_ref().map(serde_json::to_vec).transpose()?;
        let credentials = store.read().await?;
        let access = credentials
            .as_ref()
            .map(|credentials| credentials.access_token.expose_secret().clone());

        let response = self
            .send(&url, &options, body.clone(), access.as_deref())
            .await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::info!(method = %options.method, url = %url, "Access credential rejected, renewing");
        let rejected = access.unwrap_or_default();
        let refresh = credentials
            .and_then(|credentials| credentials.refresh_token)
            .map(|token| token.expose_secret().clone());
        let outcome = match refresh {
            Some(refresh) => self.renew(&refresh).await,
            None => RenewalOutcome::Rejected,
        };

        let renewed = match outcome {
            RenewalOutcome::Renewed { access, refresh } => {
                if !store
                    .replace_access(&rejected, &access, refresh.as_deref())
                    .await?
                    && store.read().await?.is_none()
                {
                    tracing::info!(url = %url, "Session ended during renewal");
                    return Err(GatewayError::SessionExpired);
                }
                access
            }
            RenewalOutcome::Rejected => match self.replaced_meanwhile(store, &rejected).await? {
                // A concurrent request already renewed with a rotated refresh credential
                Some(current) => current,
                None => {
                    store.clear().await?;
                    tracing::info!(url = %url, "Session expired, credentials cleared");
                    return Err(GatewayError::SessionExpired);
                }
            },
        };

        let retried = self.send(&url, &options, body, Some(&renewed)).await?;
        if retried.status() == StatusCode::UNAUTHORIZED {
            tracing::warn!(url = %url, "Renewed access credential was rejected");
        }
        Ok(retried)
    }

    /// Access credential now in the store, if it differs from `rejected`.
    async fn replaced_meanwhile(
        &self,
        store: &dyn CredentialStore,
        rejected: &str,
    ) -> Result<Option<String>, GatewayError> {
        Ok(store
            .read()
            .await?
            .map(|credentials| credentials.access_token.expose_secret().clone())
            .filter(|current| current != rejected))
    }

    pub async fn get(
        &self,
        store: &dyn CredentialStore,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, GatewayError> {
        self.request(store, path, options.with_method(Method::GET))
            .await
    }

    pub async fn send_json(
        &self,
        store: &dyn CredentialStore,
        method: Method,
        path: &str,
        body: serde_json::Value,
        options: RequestOptions,
    ) -> Result<Response, GatewayError> {
        self.request(store, path, options.with_method(method).with_json(body))
            .await
    }

    pub async fn delete(
        &self,
        store: &dyn CredentialStore,
        path: &str,
        options: RequestOptions,
    ) -> Result<Response, GatewayError> {
        self.request(store, path, options.with_method(Method::DELETE))
            .await
    }

    /// Renewal exchanges currently in flight.
    pub fn pending_renewals(&self) -> usize {
        self.renewals.len()
    }

    /// POST without a credential, for the token issuance endpoint.
    pub async fn post_unauthenticated<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Response, reqwest::Error> {
        self.client.traced_post(&self.url(path)).json(body).send().await
    }

    async fn send(
        &self,
        url: &str,
        options: &RequestOptions,
        body: Option<Vec<u8>>,
        access: Option<&str>,
    ) -> Result<Response, reqwest::Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.extend(options.headers.clone());
        headers.remove(AUTHORIZATION);

        if let Some(token) = access {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("Stored access credential is not a valid header value"),
            }
        }

        let mut request = self
            .client
            .traced_request(options.method.clone(), url)
            .headers(headers)
            .request_id(options.request_id.as_deref());
        if let Some(body) = body {
            request = request.body(body);
        }

        request.send().await.inspect_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to send API request");
        })
    }

    /// Renew with `refresh`, sharing the exchange with any concurrent
    /// renewal that presents the same refresh credential.
    async fn renew(&self, refresh: &str) -> RenewalOutcome {
        let flight = self
            .renewals
            .entry(refresh.to_string())
            .or_default()
            .value()
            .clone();

        let registration = FlightRegistration {
            renewals: &self.renewals,
            refresh,
            flight: flight.clone(),
        };

        let outcome = flight
            .get_or_init(|| self.exchange_refresh(refresh))
            .await
            .clone();

        drop(registration);
        outcome
    }

    async fn exchange_refresh(&self, refresh: &str) -> RenewalOutcome {
        let url = self.url(&self.settings.refresh_path);
        let outcome = match self
            .client
            .traced_post(&url)
            .json(&RefreshRequest { refresh })
            .send()
            .await
        {
            Err(e) => {
                tracing::warn!(error = %e, "Credential renewal request failed");
                RenewalOutcome::Rejected
            }
            Ok(response) if !response.status().is_success() => {
                tracing::info!(status = %response.status(), "Refresh credential rejected");
                RenewalOutcome::Rejected
            }
            Ok(response) => match response.json::<RefreshResponse>().await {
                Ok(body) => RenewalOutcome::Renewed {
                    access: body.access,
                    refresh: body.refresh,
                },
                Err(e) => {
                    tracing::warn!(error = %e, "Malformed renewal response");
                    RenewalOutcome::Rejected
                }
            },
        };

        metrics::record_renewal(outcome.label());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path() {
        let gateway = ApiGateway::new(ApiSettings::new("http://api.local/")).unwrap();
        assert_eq!(gateway.url("/api/events/"), "http://api.local/api/events/");
        assert_eq!(gateway.url("api/events/"), "http://api.local/api/events/");
    }

    #[test]
    fn options_builder_sets_fields() {
        let options = RequestOptions::new(Method::PUT)
            .with_json(serde_json::json!({"name": "Cup"}))
            .with_header(
                HeaderName::from_static("x-trace"),
                HeaderValue::from_static("1"),
            )
            .with_request_id(Some("req-1".to_string()));

        assert_eq!(options.method, Method::PUT);
        assert!(options.body.is_some());
        assert_eq!(options.headers["x-trace"], "1");
        assert_eq!(options.request_id.as_deref(), Some("req-1"));
    }
}
