use axum::response::{IntoResponse, Redirect, Response};
use service_core::error::AppError;
use thiserror::Error;

use crate::routing::LOGIN_PATH;
use crate::services::GatewayError;
use crate::session::StoreError;

/// Failure of a page handler.
///
/// Only an expired session leaves the page flow: the store has already been
/// cleared and the browser is sent back to the login form. Everything else
/// becomes a JSON error response.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Session expired")]
    SessionExpired,

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<GatewayError> for ConsoleError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::SessionExpired => ConsoleError::SessionExpired,
            GatewayError::Transport(e) => ConsoleError::App(AppError::from(e)),
            GatewayError::Store(e) => ConsoleError::from(e),
            GatewayError::Encode(e) => ConsoleError::App(AppError::InternalError(e.into())),
        }
    }
}

impl From<StoreError> for ConsoleError {
    fn from(err: StoreError) -> Self {
        ConsoleError::App(AppError::InternalError(err.into()))
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        ConsoleError::App(AppError::from(err))
    }
}

impl IntoResponse for ConsoleError {
    fn into_response(self) -> Response {
        match self {
            ConsoleError::SessionExpired => Redirect::to(LOGIN_PATH).into_response(),
            ConsoleError::App(err) => err.into_response(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};

    #[test]
    fn expired_session_redirects_to_login() {
        let response = ConsoleError::from(GatewayError::SessionExpired).into_response();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[test]
    fn other_failures_are_json_errors() {
        let response =
            ConsoleError::App(AppError::BadGateway("upstream down".into())).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
