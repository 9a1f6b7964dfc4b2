/// JWT Claims structure
///
/// Represents the payload of an access or refresh token: the user it was
/// issued for, its kind, and the standard RFC 7519 timestamps.

use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// Which credential a token is. Serialized as `"access"` / `"refresh"`.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (user id as a decimal string)
    pub sub: String,
    /// User email
    pub email: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    #[serde(rename = "type")]
    pub token_type: TokenType,
}

impl Claims {
    /// Create claims for `user_id` valid for `expiry_seconds` from now
    pub fn new(user_id: i64, email: String, token_type: TokenType, expiry_seconds: i64) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id.to_string(),
            email,
            exp: now.saturating_add(expiry_seconds),
            iat: now,
            token_type,
        }
    }

    /// Extract user ID from claims
    ///
    /// # Errors
    /// Returns `TokenInvalid` if the subject is not a numeric id
    pub fn user_id(&self) -> Result<i64, AuthError> {
        self.sub.parse::<i64>().map_err(|_| AuthError::TokenInvalid)
    }

    /// A token is expired from the second its `exp` is reached
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.exp
    }

    /// Fails with `WrongTokenType` unless the claims are of `expected` type
    pub fn require_type(&self, expected: TokenType) -> Result<(), AuthError> {
        if self.token_type == expected {
            Ok(())
        } else {
            Err(AuthError::WrongTokenType)
        }
    }
}
