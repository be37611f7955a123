use reqwest::StatusCode;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{LoginRequest, TokenPair, UserProfile};
use crate::services::api_gateway::{ApiGateway, GatewayError, RequestOptions};
use crate::session::{CredentialStore, Role, StoreError, UnknownRole};

#[derive(Debug, Error)]
pub enum SignInError {
    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("Token endpoint answered {0}")]
    Upstream(StatusCode),

    #[error("Failed to load profile: {0}")]
    Profile(String),

    #[error(transparent)]
    UnknownRole(#[from] UnknownRole),

    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Establishes and tears down the signed-in identity.
pub struct AuthClient {
    gateway: Arc<ApiGateway>,
}

impl AuthClient {
    pub fn new(gateway: Arc<ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Exchange login and password for a token pair, persist it, then look
    /// up the profile to learn and persist the role.
    ///
    /// On any failure after the tokens were saved the store is cleared, so a
    /// session never exists without its role.
    pub async fn sign_in(
        &self,
        store: &dyn CredentialStore,
        identifier: &str,
        password: &str,
        request_id: Option<String>,
    ) -> Result<UserProfile, SignInError> {
        let tokens = self.obtain_tokens(identifier, password).await?;
        store.save(&tokens.access, &tokens.refresh).await?;

        match self.load_role(store, request_id).await {
            Ok((profile, role)) => {
                store.set_role(role.as_str()).await?;
                tracing::info!(user = %profile.email, role = %role, "User signed in");
                Ok(profile)
            }
            Err(e) => {
                store.clear().await?;
                tracing::warn!(error = %e, "Sign-in aborted after token issuance");
                Err(e)
            }
        }
    }

    pub async fn sign_out(&self, store: &dyn CredentialStore) -> Result<(), StoreError> {
        store.clear().await?;
        tracing::info!("User signed out");
        Ok(())
    }

    /// Profile of the current session's user.
    pub async fn profile(
        &self,
        store: &dyn CredentialStore,
        request_id: Option<String>,
    ) -> Result<UserProfile, SignInError> {
        let path = self.gateway.settings().profile_path.clone();
        let response = self
            .gateway
            .get(
                store,
                &path,
                RequestOptions::default().with_request_id(request_id),
            )
            .await?;

        if !response.status().is_success() {
            return Err(SignInError::Profile(format!(
                "profile endpoint answered {}",
                response.status()
            )));
        }
        Ok(response.json::<UserProfile>().await?)
    }

    async fn obtain_tokens(&self, identifier: &str, password: &str) -> Result<TokenPair, SignInError> {
        let token_path = self.gateway.settings().token_path.clone();
        let response = self
            .gateway
            .post_unauthenticated(
                &token_path,
                &LoginRequest {
                    login: identifier,
                    password,
                },
            )
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json::<TokenPair>().await?),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED => {
                tracing::info!("Login rejected by token endpoint");
                Err(SignInError::InvalidCredentials)
            }
            status => Err(SignInError::Upstream(status)),
        }
    }

    async fn load_role(
        &self,
        store: &dyn CredentialStore,
        request_id: Option<String>,
    ) -> Result<(UserProfile, Role), SignInError> {
        let profile = self.profile(store, request_id).await?;
        let role = profile.role.parse::<Role>()?;
        Ok((profile, role))
    }
}
