/// Password Hashing and Verification
///
/// Stored format is `<salt>$<hash>`:
/// - `salt`: 16 random bytes from the OS CSPRNG, hex-encoded
/// - `hash`: base64 of PBKDF2-HMAC-SHA256(password, salt) at 100,000 rounds
///
/// The hex salt string itself is the PBKDF2 salt input.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{AppError, ValidationError};

const PBKDF2_ITERATIONS: u32 = 100_000;
const SALT_BYTES: usize = 16;
const HASH_BYTES: usize = 32;
const SEPARATOR: char = '$';

lazy_static! {
    /// Verified against when no account matches, so that an unknown email
    /// costs the same derivation as a wrong password.
    static ref DUMMY_PASSWORD_HASH: String = {
        let salt = "0".repeat(SALT_BYTES * 2);
        let hash = derive("dummy-password", &salt);
        format!("{}{}{}", salt, SEPARATOR, hash)
    };
}

fn derive(password: &str, salt: &str) -> String {
    let mut key = [0u8; HASH_BYTES];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), PBKDF2_ITERATIONS, &mut key);
    STANDARD.encode(key)
}

fn generate_salt() -> String {
    let mut salt = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut salt);
    hex::encode(salt)
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Hash a password with a fresh random salt
///
/// # Errors
/// Returns `ValidationError::EmptyField` if `password` is empty
pub fn hash_password(password: &str) -> Result<String, AppError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password").into());
    }

    let salt = generate_salt();
    let hash = derive(password, &salt);
    Ok(format!("{}{}{}", salt, SEPARATOR, hash))
}

/// Verify a password against a stored `<salt>$<hash>` string
///
/// Never fails: a stored value without a separator simply does not match.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Some((salt, expected)) = stored_hash.split_once(SEPARATOR) else {
        return false;
    };

    let actual = derive(password, salt);
    constant_time_eq(actual.as_bytes(), expected.as_bytes())
}

/// Run a full verification against a fixed hash. Always returns `false`.
pub fn verify_dummy_password(password: &str) -> bool {
    std::hint::black_box(verify_password(password, &DUMMY_PASSWORD_HASH));
    false
}
