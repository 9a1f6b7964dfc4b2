/// JWT Token Generation and Validation
///
/// Encodes and decodes signed, expiring claims with a shared secret. The
/// verifying side only ever accepts the configured algorithm; the `alg`
/// field inside a token header is checked against it, never trusted.

use std::fmt;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{Claims, TokenType};
use crate::configuration::AuthSettings;
use crate::error::{AuthError, ConfigError, TokenError};

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
/// Upper bound for either lifetime (ten years). Keeps `iat + ttl` far from overflow.
const MAX_TTL_SECONDS: i64 = 10 * 365 * SECONDS_PER_DAY;

/// Signing parameters and token lifetimes, resolved from `AuthSettings`.
#[derive(Clone)]
pub struct TokenSettings {
    secret: String,
    algorithm: Algorithm,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"[redacted]")
            .field("algorithm", &self.algorithm)
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}

impl TokenSettings {
    /// Validate auth configuration and convert lifetimes to seconds
    ///
    /// # Errors
    /// - empty secret
    /// - unknown or non-HMAC algorithm
    /// - non-positive lifetimes, or a refresh lifetime not longer than the
    ///   access lifetime
    pub fn from_auth_settings(settings: &AuthSettings) -> Result<Self, ConfigError> {
        if settings.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }

        let algorithm = parse_algorithm(&settings.jwt_algorithm)?;

        if settings.access_token_expire_minutes <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.access_token_expire_minutes must be positive".to_string(),
            ));
        }
        if settings.refresh_token_expire_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.refresh_token_expire_days must be positive".to_string(),
            ));
        }

        let access_ttl_seconds = ttl_seconds(
            "auth.access_token_expire_minutes",
            settings.access_token_expire_minutes,
            SECONDS_PER_MINUTE,
        )?;
        let refresh_ttl_seconds = ttl_seconds(
            "auth.refresh_token_expire_days",
            settings.refresh_token_expire_days,
            SECONDS_PER_DAY,
        )?;

        if refresh_ttl_seconds <= access_ttl_seconds {
            return Err(ConfigError::InvalidValue(
                "refresh token lifetime must be longer than access token lifetime".to_string(),
            ));
        }

        Ok(Self {
            secret: settings.jwt_secret.clone(),
            algorithm,
            access_ttl_seconds,
            refresh_ttl_seconds,
        })
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_seconds
    }

    fn ttl_for(&self, token_type: TokenType) -> i64 {
        match token_type {
            TokenType::Access => self.access_ttl_seconds,
            TokenType::Refresh => self.refresh_ttl_seconds,
        }
    }
}

fn ttl_seconds(key: &str, amount: i64, unit_seconds: i64) -> Result<i64, ConfigError> {
    amount
        .checked_mul(unit_seconds)
        .filter(|ttl| *ttl <= MAX_TTL_SECONDS)
        .ok_or_else(|| ConfigError::InvalidValue(format!("{} exceeds ten years", key)))
}

/// Resolve an algorithm name. Only HMAC algorithms work with a shared secret.
pub fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    match name.trim().to_ascii_uppercase().as_str() {
        "HS256" => Ok(Algorithm::HS256),
        "HS384" => Ok(Algorithm::HS384),
        "HS512" => Ok(Algorithm::HS512),
        other => Err(ConfigError::InvalidValue(format!(
            "unsupported jwt algorithm '{}'",
            other
        ))),
    }
}

/// Sign `claims` into a compact JWT
///
/// # Errors
/// Returns `TokenError::Encoding` if serialization or signing fails
pub fn encode_token(claims: &Claims, secret: &str, algorithm: Algorithm) -> Result<String, TokenError> {
    encode(
        &Header::new(algorithm),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| TokenError::Encoding(e.to_string()))
}

/// Verify a JWT signed with `secret` under exactly `algorithm` and return its claims
///
/// # Errors
/// - `Expired` once the current time has reached `exp`
/// - `InvalidSignature` for a bad signature or a header naming another algorithm
/// - `Malformed` for anything structurally invalid
pub fn decode_token(token: &str, secret: &str, algorithm: Algorithm) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(algorithm);
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| {
        tracing::debug!("JWT validation error: {}", e);
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        }
    })?;

    // jsonwebtoken only rejects `exp < now`; the token is already dead at `exp`.
    if claims.is_expired() {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

fn generate_token(
    user_id: i64,
    email: &str,
    token_type: TokenType,
    settings: &TokenSettings,
) -> Result<String, TokenError> {
    let claims = Claims::new(user_id, email.to_string(), token_type, settings.ttl_for(token_type));
    encode_token(&claims, &settings.secret, settings.algorithm)
}

/// Generate a short-lived access token for a user
pub fn generate_access_token(
    user_id: i64,
    email: &str,
    settings: &TokenSettings,
) -> Result<String, TokenError> {
    generate_token(user_id, email, TokenType::Access, settings)
}

/// Generate a long-lived refresh token for a user
pub fn generate_refresh_token(
    user_id: i64,
    email: &str,
    settings: &TokenSettings,
) -> Result<String, TokenError> {
    generate_token(user_id, email, TokenType::Refresh, settings)
}

fn validate_token(
    token: &str,
    expected: TokenType,
    settings: &TokenSettings,
) -> Result<Claims, AuthError> {
    let claims = decode_token(token, &settings.secret, settings.algorithm)?;
    claims.require_type(expected)?;
    Ok(claims)
}

/// Decode a token and require it to be an access token
pub fn validate_access_token(token: &str, settings: &TokenSettings) -> Result<Claims, AuthError> {
    validate_token(token, TokenType::Access, settings)
}

/// Decode a token and require it to be a refresh token
pub fn validate_refresh_token(token: &str, settings: &TokenSettings) -> Result<Claims, AuthError> {
    validate_token(token, TokenType::Refresh, settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine as _;

    const SECRET: &str = "test-secret-key-at-least-32-characters-long";

    fn get_test_settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: SECRET.to_string(),
            jwt_algorithm: "HS256".to_string(),
            access_token_expire_minutes: 15,
            refresh_token_expire_days: 7,
            rotate_refresh_tokens: false,
        }
    }

    fn get_token_settings() -> TokenSettings {
        TokenSettings::from_auth_settings(&get_test_settings()).expect("valid settings")
    }

    #[test]
    fn test_encode_and_decode_round_trip() {
        let claims = Claims::new(3, "test@example.com".to_string(), TokenType::Access, 600);

        let token = encode_token(&claims, SECRET, Algorithm::HS256).expect("Failed to encode");
        let decoded = decode_token(&token, SECRET, Algorithm::HS256).expect("Failed to decode");

        assert_eq!(decoded, claims);
    }

    #[test]
    fn test_expired_token() {
        let mut claims = Claims::new(3, "test@example.com".to_string(), TokenType::Access, 600);
        claims.iat -= 1200;
        claims.exp = claims.iat + 600;

        let token = encode_token(&claims, SECRET, Algorithm::HS256).unwrap();

        assert_eq!(decode_token(&token, SECRET, Algorithm::HS256), Err(TokenError::Expired));
    }

    #[test]
    fn test_expiry_boundary_is_expired() {
        let claims = Claims::new(3, "test@example.com".to_string(), TokenType::Access, 0);
        let token = encode_token(&claims, SECRET, Algorithm::HS256).unwrap();

        assert_eq!(decode_token(&token, SECRET, Algorithm::HS256), Err(TokenError::Expired));
    }

    #[test]
    fn test_invalid_token() {
        let result = decode_token("invalid.token.here", SECRET, Algorithm::HS256);
        assert_eq!(result, Err(TokenError::Malformed));

        let result = decode_token("", SECRET, Algorithm::HS256);
        assert_eq!(result, Err(TokenError::Malformed));
    }

    #[test]
    fn test_wrong_secret() {
        let claims = Claims::new(3, "test@example.com".to_string(), TokenType::Access, 600);
        let token = encode_token(&claims, SECRET, Algorithm::HS256).unwrap();

        let result = decode_token(&token, "another-secret-entirely", Algorithm::HS256);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_tampered_payload() {
        let claims = Claims::new(3, "test@example.com".to_string(), TokenType::Access, 600);
        let token = encode_token(&claims, SECRET, Algorithm::HS256).unwrap();
        let parts: Vec<&str> = token.split('.').collect();

        let mut forged = claims.clone();
        forged.sub = "1".to_string();
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let tampered = format!("{}.{}.{}", parts[0], forged_payload, parts[2]);

        let result = decode_token(&tampered, SECRET, Algorithm::HS256);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_rejects_other_algorithm_in_header() {
        let claims = Claims::new(3, "test@example.com".to_string(), TokenType::Access, 600);
        let token = encode_token(&claims, SECRET, Algorithm::HS512).unwrap();

        let result = decode_token(&token, SECRET, Algorithm::HS256);
        assert_eq!(result, Err(TokenError::InvalidSignature));
    }

    #[test]
    fn test_rejects_unsigned_token() {
        let claims = Claims::new(3, "test@example.com".to_string(), TokenType::Access, 600);
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());
        let unsigned = format!("{}.{}.", header, payload);

        assert!(decode_token(&unsigned, SECRET, Algorithm::HS256).is_err());
    }

    #[test]
    fn test_generated_tokens_carry_type_and_lifetime() {
        let settings = get_token_settings();

        let access = generate_access_token(9, "a@example.com", &settings).unwrap();
        let refresh = generate_refresh_token(9, "a@example.com", &settings).unwrap();

        let access_claims = validate_access_token(&access, &settings).unwrap();
        let refresh_claims = validate_refresh_token(&refresh, &settings).unwrap();

        assert_eq!(access_claims.token_type, TokenType::Access);
        assert_eq!(refresh_claims.token_type, TokenType::Refresh);
        assert_eq!(access_claims.exp - access_claims.iat, 15 * 60);
        assert_eq!(refresh_claims.exp - refresh_claims.iat, 7 * 24 * 60 * 60);
        assert!(refresh_claims.exp > access_claims.exp);
    }

    #[test]
    fn test_token_type_separation() {
        let settings = get_token_settings();

        let access = generate_access_token(9, "a@example.com", &settings).unwrap();
        let refresh = generate_refresh_token(9, "a@example.com", &settings).unwrap();

        assert_eq!(
            validate_refresh_token(&access, &settings),
            Err(AuthError::WrongTokenType)
        );
        assert_eq!(
            validate_access_token(&refresh, &settings),
            Err(AuthError::WrongTokenType)
        );
    }

    #[test]
    fn test_settings_validation() {
        let mut settings = get_test_settings();
        settings.jwt_secret = "  ".to_string();
        assert!(matches!(
            TokenSettings::from_auth_settings(&settings),
            Err(ConfigError::MissingRequired(_))
        ));

        let mut settings = get_test_settings();
        settings.jwt_algorithm = "RS256".to_string();
        assert!(TokenSettings::from_auth_settings(&settings).is_err());

        let mut settings = get_test_settings();
        settings.access_token_expire_minutes = 2 * 24 * 60;
        settings.refresh_token_expire_days = 1;
        assert!(TokenSettings::from_auth_settings(&settings).is_err());

        let mut settings = get_test_settings();
        settings.access_token_expire_minutes = 0;
        assert!(TokenSettings::from_auth_settings(&settings).is_err());

        let mut settings = get_test_settings();
        settings.access_token_expire_minutes = i64::MAX / 2;
        assert!(matches!(
            TokenSettings::from_auth_settings(&settings),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut settings = get_test_settings();
        settings.refresh_token_expire_days = i64::MAX;
        assert!(matches!(
            TokenSettings::from_auth_settings(&settings),
            Err(ConfigError::InvalidValue(_))
        ));

        let mut settings = get_test_settings();
        settings.refresh_token_expire_days = 11 * 365;
        assert!(TokenSettings::from_auth_settings(&settings).is_err());

        let mut settings = get_test_settings();
        settings.refresh_token_expire_days = 10 * 365;
        assert!(TokenSettings::from_auth_settings(&settings).is_ok());
    }

    #[test]
    fn test_parse_algorithm() {
        assert_eq!(parse_algorithm("HS256"), Ok(Algorithm::HS256));
        assert_eq!(parse_algorithm("hs512"), Ok(Algorithm::HS512));
        assert!(parse_algorithm("none").is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", get_token_settings());
        assert!(!rendered.contains(SECRET));
    }
}
