use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString, rand_core::OsRng},
};
use axum::{Json, extract::State};
use axum_extra::extract::WithRejection;
use tracing::{info, warn};

use folio_types::api::{LoginRequest, LoginResponse};

use crate::error::ApiError;
use crate::state::AppState;
use crate::token::TOKEN_TYPE;

/// Hash a password with Argon2id and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// The one admin password, held only as an Argon2 PHC string.
pub struct AdminCredential {
    hash: String,
}

impl AdminCredential {
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn verify(&self, password: &str) -> bool {
        if password.is_empty() {
            return false;
        }
        let Ok(parsed) = PasswordHash::new(&self.hash) else {
            warn!("Stored admin password hash is unparseable");
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

/// POST /api/auth/login: exchange the admin password for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, ApiError>,
) -> Result<Json<LoginResponse>, ApiError> {
    // Argon2 is CPU-bound; run it on the blocking pool.
    let verifier = state.clone();
    let ok = tokio::task::spawn_blocking(move || verifier.admin.verify(&req.password)).await?;

    if !ok {
        warn!("Login failed: invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let access_token = state
        .tokens
        .issue()
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    info!("Admin login succeeded");
    Ok(Json(LoginResponse {
        access_token,
        token_type: TOKEN_TYPE.to_string(),
    }))
}
