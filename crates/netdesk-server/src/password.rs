//! argon2 password hashing.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
  password_hash::SaltString,
};
use rand_core::OsRng;

use crate::error::ApiError;

/// A well-formed PHC string with the default parameters that no password
/// matches.
const DUMMY_PHC: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Hash `password` into a PHC string with a fresh random salt.
pub fn hash(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Hash(e.to_string()))
}

/// Whether `password` matches the stored PHC string. A malformed stored
/// hash never matches.
pub fn verify(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc)
    .and_then(|h| Argon2::default().verify_password(password.as_bytes(), &h))
    .is_ok()
}

/// Do the work of [`verify`] when there is no stored hash to check against,
/// so an unknown account is not faster to reject. Always `false`.
pub fn verify_dummy(password: &str) -> bool {
  verify(password, DUMMY_PHC);
  false
}
