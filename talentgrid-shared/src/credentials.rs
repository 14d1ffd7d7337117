/// Password credentials for identities
///
/// An identity may carry an optional password credential. It is stored as an
/// Argon2id PHC string (`$argon2id$v=19$m=65536,t=3,p=4$...`); parameters
/// travel inside the hash, so verification needs nothing else.
///
/// # Example
///
/// ```
/// use talentgrid_shared::credentials::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Corr3ct-Horse!")?;
/// assert!(verify_password("Corr3ct-Horse!", &hash)?);
/// assert!(!verify_password("wrong", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Minimum password length in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// Argon2id memory cost in KiB (64 MiB)
const M_COST: u32 = 65536;
const T_COST: u32 = 3;
const P_COST: u32 = 4;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("password too weak: {0}")]
    Weak(&'static str),

    #[error("failed to hash password: {0}")]
    Hash(String),

    #[error("invalid password hash: {0}")]
    InvalidHash(String),
}

fn hasher() -> Result<Argon2<'static>, PasswordError> {
    let params = Params::new(M_COST, T_COST, P_COST, Some(32))
        .map_err(|e| PasswordError::Hash(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hashes a password with Argon2id and a random 16-byte salt
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verifies a password against a stored PHC hash
///
/// Returns `Ok(false)` for a wrong password and an error only when the
/// stored hash itself is unusable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::InvalidHash(e.to_string())),
    }
}

/// Checks a new password against the strength policy
///
/// At least 8 characters with upper- and lowercase letters, a digit and a
/// symbol.
pub fn validate_password_strength(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::Weak("must be at least 8 characters long"));
    }
    if !password.chars().any(char::is_uppercase) {
        return Err(PasswordError::Weak("must contain an uppercase letter"));
    }
    if !password.chars().any(char::is_lowercase) {
        return Err(PasswordError::Weak("must contain a lowercase letter"));
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(PasswordError::Weak("must contain a digit"));
    }
    if password.chars().all(char::is_alphanumeric) {
        return Err(PasswordError::Weak("must contain a special character"));
    }
    Ok(())
}
