use axum::{extract::Request, http::header, middleware::Next, response::IntoResponse};

/// Hardening headers for server-rendered pages.
///
/// Pages rendered for a signed-in user are marked `no-store` so the browser
/// cannot replay them from its cache after logout.
pub async fn security_headers_middleware(req: Request, next: Next) -> impl IntoResponse {
    let is_static_asset = req.uri().path().starts_with("/static/");

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        header::HeaderValue::from_static(
            "default-src 'self'; \
             img-src 'self' data:; \
             form-action 'self'; \
             frame-ancestors 'none'",
        ),
    );

    if !is_static_asset {
        headers.insert(
            header::CACHE_CONTROL,
            header::HeaderValue::from_static("no-store"),
        );
    }

    response
}
