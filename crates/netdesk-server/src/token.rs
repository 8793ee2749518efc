//! Opaque bearer tokens.
//!
//! A client receives `"{id}|{secret}"`; the store keeps only the SHA-256 hex
//! digest of the secret. A bare secret without the id prefix is accepted as
//! well.

use netdesk_core::store::IdentityStore;
use rand_core::{OsRng, RngCore as _};
use sha2::{Digest as _, Sha256};

const SECRET_BYTES: usize = 20;

/// A token as presented in an `Authorization` header.
#[derive(Debug, PartialEq, Eq)]
pub struct Presented<'a> {
  pub id:     Option<i64>,
  pub secret: &'a str,
}

pub fn generate_secret() -> String {
  let mut bytes = [0u8; SECRET_BYTES];
  OsRng.fill_bytes(&mut bytes);
  hex::encode(bytes)
}

pub fn hash_secret(secret: &str) -> String {
  hex::encode(Sha256::digest(secret.as_bytes()))
}

/// Split a presented token. Returns `None` when the id prefix is not a
/// number or either half is empty.
pub fn parse(token: &str) -> Option<Presented<'_>> {
  let presented = match token.split_once('|') {
    Some((id, secret)) => Presented { id: Some(id.parse().ok()?), secret },
    None => Presented { id: None, secret: token },
  };
  (!presented.secret.is_empty()).then_some(presented)
}

/// Create a token for `user_id` named `name` and return its plaintext form.
/// The plaintext is not recoverable afterwards.
pub async fn issue<S: IdentityStore>(
  store: &S,
  user_id: i64,
  name: &str,
) -> Result<String, S::Error> {
  let secret = generate_secret();
  let id = store
    .issue_token(user_id, name.to_owned(), hash_secret(&secret))
    .await?;
  Ok(format!("{id}|{secret}"))
}
