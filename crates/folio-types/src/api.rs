use serde::{Deserialize, Serialize};

// -- Token claims --

/// Claims carried by every admin bearer token. There is a single admin
/// subject, so `admin` is always `true` on tokens this service issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn admin(issued_at: i64, expires_at: i64) -> Self {
        Self {
            admin: true,
            iat: issued_at,
            exp: expires_at,
        }
    }
}

// -- Auth --

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
}

// -- Uploads --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub image_url: String,
}

// -- Generic responses --

/// Acknowledgment body for operations that return no document.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Body of every error response. `detail` is human readable, `code` is the
/// stable machine-readable failure kind.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
}
