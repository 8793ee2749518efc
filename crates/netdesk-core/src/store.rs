//! The store traits.
//!
//! Implemented by storage backends (e.g. `netdesk-store-sqlite`). The HTTP
//! layer depends on these abstractions, not on any concrete backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use crate::{
  directory::DeviceType,
  identity::{AccessToken, Credentials, NewUser, ProfileChanges, User},
  internet_user::{
    Deletion, InternetUser, InternetUserDetail, InternetUserFields,
    InternetUserRow,
  },
  validation::FieldErrors,
};

// ─── Identity ────────────────────────────────────────────────────────────────

/// Accounts and their bearer tokens.
pub trait IdentityStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Look up an account by e-mail, including its password hash.
  fn find_credentials<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Credentials>, Self::Error>> + Send + 'a;

  /// Retrieve an account by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Whether any account other than `except` already uses `email`.
  fn email_taken<'a>(
    &'a self,
    email: &'a str,
    except: Option<i64>,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Overwrite name and e-mail (and the password hash, when given). Returns
  /// `None` if the account does not exist.
  fn update_user(
    &self,
    id: i64,
    changes: ProfileChanges,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Persist a new token for `user_id` and return its id. Only the hash of
  /// the token secret is handed to the store.
  fn issue_token(
    &self,
    user_id: i64,
    name: String,
    token_hash: String,
  ) -> impl Future<Output = Result<i64, Self::Error>> + Send + '_;

  /// Resolve a token hash to its owner, recording the use. Returns `None`
  /// for unknown or revoked tokens.
  fn find_token(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<Option<AccessToken>, Self::Error>> + Send + '_;

  /// Revoke exactly one token. Returns `false` if it was already gone.
  fn revoke_token(
    &self,
    token_id: i64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Provisioning ────────────────────────────────────────────────────────────

/// Persons and their internet users, handled as one aggregate.
///
/// Every write touches both records inside a single transaction: either both
/// rows change or neither does.
pub trait ProvisioningStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// The full listing with per-user violation counts. No pagination.
  fn list_internet_users(
    &self,
  ) -> impl Future<Output = Result<Vec<InternetUserRow>, Self::Error>> + Send + '_;

  /// One internet user with its person and the person's references.
  fn get_internet_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Option<InternetUserDetail>, Self::Error>>
  + Send
  + '_;

  /// Evaluate the database-backed rules for `fields`: uniqueness of
  /// username, phone and e-mail, and existence of the directorate, position
  /// and employment type.
  ///
  /// `current` is the internet user being updated; its own username and its
  /// person's phone and e-mail never count as conflicts.
  fn check_internet_user<'a>(
    &'a self,
    fields: &'a InternetUserFields,
    current: Option<i64>,
  ) -> impl Future<Output = Result<FieldErrors, Self::Error>> + Send + 'a;

  /// Insert a new person and its internet user.
  fn create_internet_user(
    &self,
    fields: InternetUserFields,
  ) -> impl Future<Output = Result<InternetUser, Self::Error>> + Send + '_;

  /// Update an internet user and its person. Returns `None` if `id` does not
  /// exist.
  fn update_internet_user(
    &self,
    id: i64,
    fields: InternetUserFields,
  ) -> impl Future<Output = Result<Option<InternetUser>, Self::Error>> + Send + '_;

  /// Delete an internet user together with its person. An internet user
  /// with recorded violations is left in place.
  fn delete_internet_user(
    &self,
    id: i64,
  ) -> impl Future<Output = Result<Deletion, Self::Error>> + Send + '_;

  fn list_device_types(
    &self,
  ) -> impl Future<Output = Result<Vec<DeviceType>, Self::Error>> + Send + '_;
}
