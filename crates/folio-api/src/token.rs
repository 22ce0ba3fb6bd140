//! Admin bearer tokens: HS256 JWTs with a fixed 24 hour validity window.
//!
//! The algorithm is pinned on both sides. A token whose header names any other
//! algorithm is rejected before its signature is looked at. Expiry is checked
//! here against an explicit clock reading rather than by `jsonwebtoken`, so
//! callers (and tests) control what "now" means; there is no leeway.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use folio_types::api::Claims;

pub const TOKEN_TYPE: &str = "bearer";
pub const TOKEN_VALIDITY_HOURS: i64 = 24;

const ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid or expired token")]
    Invalid,
    #[error("failed to sign token: {0}")]
    Signing(String),
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validity: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validity: Duration::hours(TOKEN_VALIDITY_HOURS),
        }
    }

    pub fn issue(&self) -> Result<String, TokenError> {
        self.issue_at(Utc::now())
    }

    pub fn issue_at(&self, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims::admin(now.timestamp(), (now + self.validity).timestamp());
        encode(&Header::new(ALGORITHM), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Valid iff the signature checks out, the admin claim is set, and
    /// `now` is strictly before `exp`.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.set_required_spec_claims(&["exp"]);

        let claims = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| TokenError::Invalid)?
            .claims;

        if !claims.admin || now.timestamp() >= claims.exp {
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn issued_token_verifies() {
        let tokens = TokenService::new("secret");
        let token = tokens.issue_at(t0()).unwrap();
        let claims = tokens.verify_at(&token, t0()).unwrap();
        assert!(claims.admin);
        assert_eq!(claims.iat, t0().timestamp());
        assert_eq!(claims.exp, (t0() + Duration::hours(24)).timestamp());
    }

    #[test]
    fn token_expires_after_validity_window() {
        let tokens = TokenService::new("secret");
        let token = tokens.issue_at(t0()).unwrap();

        let just_before = t0() + Duration::hours(24) - Duration::seconds(1);
        assert!(tokens.verify_at(&token, just_before).is_ok());

        let at_expiry = t0() + Duration::hours(24);
        assert_eq!(tokens.verify_at(&token, at_expiry), Err(TokenError::Invalid));

        let after = t0() + Duration::hours(24) + Duration::seconds(1);
        assert_eq!(tokens.verify_at(&token, after), Err(TokenError::Invalid));
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenService::new("secret").issue_at(t0()).unwrap();
        let other = TokenService::new("another-secret");
        assert_eq!(other.verify_at(&token, t0()), Err(TokenError::Invalid));
    }

    #[test]
    fn other_algorithms_are_rejected() {
        let claims = Claims::admin(t0().timestamp(), (t0() + Duration::hours(1)).timestamp());
        let token = encode(
            &Header::new(Algorithm::HS384),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let tokens = TokenService::new("secret");
        assert_eq!(tokens.verify_at(&token, t0()), Err(TokenError::Invalid));
    }

    #[test]
    fn non_admin_claims_are_rejected() {
        let claims = Claims {
            admin: false,
            iat: t0().timestamp(),
            exp: (t0() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(ALGORITHM),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();

        let tokens = TokenService::new("secret");
        assert_eq!(tokens.verify_at(&token, t0()), Err(TokenError::Invalid));
    }

    #[test]
    fn garbage_is_rejected() {
        let tokens = TokenService::new("secret");
        assert_eq!(tokens.verify_at("invalid.jwt.token", t0()), Err(TokenError::Invalid));
        assert_eq!(tokens.verify_at("", t0()), Err(TokenError::Invalid));
    }
}
