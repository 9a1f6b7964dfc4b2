/// Authentication module
///
/// Password hashing, JWT encoding/validation, and the auth service that
/// ties them to the user store.

mod claims;
mod jwt;
mod password;
mod service;

pub use claims::{Claims, TokenType};
pub use jwt::{
    decode_token, encode_token, generate_access_token, generate_refresh_token, parse_algorithm,
    validate_access_token, validate_refresh_token, TokenSettings,
};
pub use password::{hash_password, verify_password};
pub use service::{AuthService, TokenPair};
