use axum::{
    extract::{Request, State},
    http::{HeaderValue, header},
    middleware::Next,
    response::Response,
};
use thiserror::Error;
use tracing::warn;

use folio_types::api::Claims;

use crate::error::ApiError;
use crate::state::AppState;
use crate::token::{TOKEN_TYPE, TokenService};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("authorization header missing")]
    MissingToken,
    #[error("authorization header is not '<scheme> <token>'")]
    MalformedHeader,
    #[error("authorization scheme is not bearer")]
    UnsupportedScheme,
    #[error("token rejected")]
    InvalidToken,
}

/// Split an `Authorization` header value into its bearer token.
pub fn bearer_token(header: Option<&HeaderValue>) -> Result<&str, AuthError> {
    let raw = header.ok_or(AuthError::MissingToken)?;
    let raw = raw.to_str().map_err(|_| AuthError::MalformedHeader)?;

    let mut parts = raw.split_whitespace();
    let (scheme, token) = match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) => (scheme, token),
        _ => return Err(AuthError::MalformedHeader),
    };

    if !scheme.eq_ignore_ascii_case(TOKEN_TYPE) {
        return Err(AuthError::UnsupportedScheme);
    }
    Ok(token)
}

/// The full gate: header shape first, then the token itself.
pub fn authorize(header: Option<&HeaderValue>, tokens: &TokenService) -> Result<Claims, AuthError> {
    let token = bearer_token(header)?;
    tokens.verify(token).map_err(|_| AuthError::InvalidToken)
}

/// Reject the request unless it carries a valid admin bearer token. Runs
/// before the handler's extractors, so nothing is parsed or written for an
/// unauthorized caller.
pub async fn require_admin(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authorize(req.headers().get(header::AUTHORIZATION), &state.tokens).map_err(|e| {
        warn!(method = %req.method(), path = %req.uri().path(), "Unauthorized request: {}", e);
        e
    })?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
