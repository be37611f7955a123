pub mod api_gateway;
pub mod auth_client;
pub mod metrics;

pub use api_gateway::{ApiGateway, GatewayError, RequestOptions};
pub use auth_client::{AuthClient, SignInError};
