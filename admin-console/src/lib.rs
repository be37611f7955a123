pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod routing;
pub mod services;
pub mod session;
pub mod startup;

use axum::extract::FromRef;
use services::{ApiGateway, AuthClient};
use session::CredentialVault;
use std::sync::Arc;

/// Shared application state containing the API clients
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<ApiGateway>,
    pub auth_client: Arc<AuthClient>,
    pub vault: CredentialVault,
}

impl AppState {
    pub fn new(gateway: Arc<ApiGateway>, vault: CredentialVault) -> Self {
        let auth_client = Arc::new(AuthClient::new(gateway.clone()));
        Self {
            gateway,
            auth_client,
            vault,
        }
    }
}

impl FromRef<AppState> for CredentialVault {
    fn from_ref(state: &AppState) -> Self {
        state.vault.clone()
    }
}
