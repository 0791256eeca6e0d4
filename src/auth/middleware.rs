use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::config::AuthenticationInfo;

/// Paths served without credentials.
const UNAUTHENTICATED_PATHS: &[&str] = &["/healthz"];

pub async fn authenticate(
    State(authn): State<Arc<AuthenticationInfo>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    if UNAUTHENTICATED_PATHS.contains(&request.uri().path()) {
        return Ok(next.run(request).await);
    }

    let Some(authenticator) = authn.authenticator.as_ref() else {
        return Ok(next.run(request).await);
    };

    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match token {
        Some(token) => match authenticator.authenticate(token) {
            Some(user) => {
                tracing::debug!(user = %user.name, path = %request.uri().path(), "Request authenticated");
                let user = user.clone();
                request.extensions_mut().insert(user);
                Ok(next.run(request).await)
            }
            None => Err(StatusCode::UNAUTHORIZED),
        },
        None if authn.anonymous => Ok(next.run(request).await),
        None => Err(StatusCode::UNAUTHORIZED),
    }
}
