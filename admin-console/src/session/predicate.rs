use super::role::Role;
use super::store::{CredentialStore, Credentials};

/// Outcome of reading the credential store for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated { role: Option<Role> },
}

impl AuthState {
    pub fn from_credentials(credentials: Option<&Credentials>) -> Self {
        match credentials {
            None => AuthState::Anonymous,
            Some(credentials) => AuthState::Authenticated {
                role: credentials.role.as_deref().and_then(parse_role),
            },
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            AuthState::Anonymous => None,
            AuthState::Authenticated { role } => *role,
        }
    }
}

fn parse_role(tag: &str) -> Option<Role> {
    match tag.parse() {
        Ok(role) => Some(role),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring unrecognised role in session");
            None
        }
    }
}

/// Read the store once and classify the caller. Expiry is not predicted
/// here; the request gateway discovers it when the API rejects a call.
pub async fn resolve(store: &dyn CredentialStore) -> AuthState {
    match store.read().await {
        Ok(credentials) => AuthState::from_credentials(credentials.as_ref()),
        Err(e) => {
            tracing::error!(error = %e, "Failed to read session credentials");
            AuthState::Anonymous
        }
    }
}

pub async fn is_authenticated(store: &dyn CredentialStore) -> bool {
    resolve(store).await.is_authenticated()
}

/// `None` is the "no role" sentinel.
pub async fn get_role(store: &dyn CredentialStore) -> Option<Role> {
    resolve(store).await.role()
}
