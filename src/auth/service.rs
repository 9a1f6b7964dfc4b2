/// Auth Core
///
/// Stateless orchestration of credential checks and token issuance over an
/// injected `UserStore`. Nothing is kept between calls; a token's validity
/// comes only from its signature and `exp`.
///
/// Outcomes:
/// - credential mismatch, unknown user, bad or expired tokens: `AppError::Auth`
/// - taken email/username: `AppError::Database(UniqueConstraintViolation)`
/// - bad registration input: `AppError::Validation`
/// - store connectivity and signing faults: fatal, propagated as-is

use std::sync::Arc;

use serde::Serialize;

use crate::auth::claims::Claims;
use crate::auth::jwt::{
    generate_access_token, generate_refresh_token, validate_access_token, validate_refresh_token,
    TokenSettings,
};
use crate::auth::password::{hash_password, verify_dummy_password, verify_password};
use crate::configuration::AuthSettings;
use crate::error::{AppError, AuthError, ConfigError, DatabaseError};
use crate::store::{NewUser, User, UserStore};
use crate::validators::{normalize_email, validate_email, validate_password, validate_username};

/// Access and refresh token issued together
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

pub struct AuthService {
    store: Arc<dyn UserStore>,
    tokens: TokenSettings,
    rotate_refresh_tokens: bool,
}

impl AuthService {
    /// # Errors
    /// Returns `ConfigError` if the signing or lifetime settings are invalid
    pub fn new(store: Arc<dyn UserStore>, settings: &AuthSettings) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            tokens: TokenSettings::from_auth_settings(settings)?,
            rotate_refresh_tokens: settings.rotate_refresh_tokens,
        })
    }

    pub fn token_settings(&self) -> &TokenSettings {
        &self.tokens
    }

    /// Check an email/password pair.
    ///
    /// An unknown email and a wrong password produce the same
    /// `InvalidCredentials`, and both run one full key derivation.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, AppError> {
        let user = self.store.find_by_email(&normalize_email(email)).await?;

        match user {
            Some(user) if verify_password(password, &user.password_hash) => Ok(user),
            Some(_) => Err(AuthError::InvalidCredentials.into()),
            None => {
                verify_dummy_password(password);
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    /// Mint a fresh access and refresh token for `user`
    pub fn issue_token_pair(&self, user: &User) -> Result<TokenPair, AppError> {
        let access_token = generate_access_token(user.id, &user.email, &self.tokens)?;
        let refresh_token = generate_refresh_token(user.id, &user.email, &self.tokens)?;
        Ok(self.pair(access_token, refresh_token))
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// The presented refresh token is echoed back unless rotation is enabled,
    /// in which case a new one is minted. There is no revocation store, so the
    /// old refresh token stays usable until it expires either way.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, AppError> {
        let claims = validate_refresh_token(refresh_token, &self.tokens)?;
        let user = self.resolve_subject(&claims).await?;

        let access_token = generate_access_token(user.id, &user.email, &self.tokens)?;
        let refresh_token = if self.rotate_refresh_tokens {
            generate_refresh_token(user.id, &user.email, &self.tokens)?
        } else {
            refresh_token.to_string()
        };

        tracing::info!(user_id = user.id, rotated = self.rotate_refresh_tokens, "Token refreshed");
        Ok(self.pair(access_token, refresh_token))
    }

    /// Validate input, hash the password and hand the record to the store.
    ///
    /// The pre-checks only give friendlier messages; the store's own
    /// uniqueness enforcement decides concurrent races.
    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<User, AppError> {
        let email = validate_email(email)?;
        let username = validate_username(username)?;
        validate_password(password)?;

        if self.store.find_by_email(&email).await?.is_some() {
            return Err(DatabaseError::UniqueConstraintViolation(format!(
                "User with email {} already exists",
                email
            ))
            .into());
        }
        if self.store.find_by_username(&username).await?.is_some() {
            return Err(DatabaseError::UniqueConstraintViolation(format!(
                "User with username {} already exists",
                username
            ))
            .into());
        }

        let password_hash = hash_password(password)?;
        let user = self
            .store
            .create(NewUser {
                email,
                username,
                password_hash,
            })
            .await?;

        tracing::info!(user_id = user.id, "User registered");
        Ok(user)
    }

    /// Decode a bearer token, requiring an access token
    pub fn verify_access_token(&self, token: &str) -> Result<Claims, AuthError> {
        validate_access_token(token, &self.tokens)
    }

    /// Load the user an access token was issued for
    pub async fn current_user(&self, claims: &Claims) -> Result<User, AppError> {
        self.resolve_subject(claims).await
    }

    async fn resolve_subject(&self, claims: &Claims) -> Result<User, AppError> {
        let user_id = claims.user_id()?;
        self.store
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AuthError::UserNotFound.into())
    }

    fn pair(&self, access_token: String, refresh_token: String) -> TokenPair {
        TokenPair {
            access_token,
            refresh_token,
            token_type: "bearer",
            expires_in: self.tokens.access_ttl_seconds(),
        }
    }
}
