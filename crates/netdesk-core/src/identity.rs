//! Accounts, roles and bearer tokens, plus the request DTOs of the identity
//! endpoints.
//!
//! Request DTOs carrying passwords deliberately do not derive `Debug`.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{FieldErrors, FormInt, FormText};

/// Name of the role allowed to register accounts and edit other profiles.
pub const ADMIN_ROLE: &str = "Admin";

/// Seeded id of the [`ADMIN_ROLE`] row.
pub const ADMIN_ROLE_ID: i64 = 1;

/// Role assigned to accounts created through registration.
pub const DEFAULT_ROLE_ID: i64 = 2;

pub const PASSWORD_MIN: usize = 6;
pub const NAME_MAX: usize = 255;

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
  pub id:   i64,
  pub name: String,
}

impl Role {
  pub fn is_admin(&self) -> bool { self.name == ADMIN_ROLE }
}

/// An operator of the admin backend. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
  pub id:         i64,
  pub name:       String,
  pub email:      String,
  pub role:       Option<Role>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl User {
  pub fn is_admin(&self) -> bool { self.role.as_ref().is_some_and(Role::is_admin) }
}

/// A user together with their stored argon2 PHC string, for login only.
#[derive(Clone)]
pub struct Credentials {
  pub user:          User,
  pub password_hash: String,
}

/// Input to [`IdentityStore::create_user`](crate::store::IdentityStore::create_user).
#[derive(Clone)]
pub struct NewUser {
  pub name:          String,
  pub email:         String,
  pub password_hash: String,
  pub role_id:       i64,
}

/// Input to [`IdentityStore::update_user`](crate::store::IdentityStore::update_user).
/// `password_hash` is `None` when the password is left unchanged.
#[derive(Clone)]
pub struct ProfileChanges {
  pub name:          String,
  pub email:         String,
  pub password_hash: Option<String>,
}

/// A bearer token resolved to its owner.
#[derive(Debug, Clone)]
pub struct AccessToken {
  pub token_id: i64,
  pub user:     User,
}

// ─── Login ───────────────────────────────────────────────────────────────────

/// Body of `POST /login`.
#[derive(Default, Deserialize)]
pub struct LoginRequest {
  pub email:    Option<FormText>,
  pub password: Option<FormText>,
}

pub struct Login {
  pub email:    String,
  pub password: String,
}

impl LoginRequest {
  pub fn validate(&self) -> Result<Login, FieldErrors> {
    let mut errors = FieldErrors::new();
    let email = errors
      .required("email", self.email.as_ref())
      .filter(|e| errors.email("email", e));
    let password = errors
      .required_secret("password", self.password.as_ref())
      .filter(|p| errors.min_chars("password", p, PASSWORD_MIN));

    match (email, password) {
      (Some(email), Some(password)) => Ok(Login {
        email:    email.into_owned(),
        password: password.into_owned(),
      }),
      _ => Err(errors),
    }
  }
}

// ─── Profile update ──────────────────────────────────────────────────────────

/// Body of `POST /profile`.
#[derive(Default, Deserialize)]
pub struct UpdateProfileRequest {
  pub user_id:  Option<FormInt>,
  pub name:     Option<FormText>,
  pub email:    Option<FormText>,
  pub password: Option<FormText>,
}

pub struct ProfileUpdate {
  pub user_id:  i64,
  pub name:     String,
  pub email:    String,
  /// `None` when the request left the password blank.
  pub password: Option<String>,
}

impl UpdateProfileRequest {
  /// The account the request wants to modify, if `user_id` parses.
  pub fn target_id(&self) -> Option<i64> {
    self.user_id.as_ref().and_then(FormInt::as_i64)
  }

  pub fn validate(&self) -> Result<ProfileUpdate, FieldErrors> {
    let mut errors = FieldErrors::new();
    let user_id = errors.required_int("user_id", self.user_id.as_ref());
    let name = errors
      .required("name", self.name.as_ref())
      .filter(|n| errors.max_chars("name", n, NAME_MAX));
    let email = errors
      .required("email", self.email.as_ref())
      .filter(|e| errors.email("email", e));
    // An empty password means "keep the current one".
    let password = errors.optional_secret("password", self.password.as_ref());
    if let Some(p) = &password {
      errors.min_chars("password", p, PASSWORD_MIN);
    }

    match (user_id, name, email) {
      (Some(user_id), Some(name), Some(email)) if errors.is_empty() => {
        Ok(ProfileUpdate {
          user_id,
          name: name.into_owned(),
          email: email.into_owned(),
          password: password.map(Cow::into_owned),
        })
      }
      _ => Err(errors),
    }
  }
}

// ─── Registration ────────────────────────────────────────────────────────────

/// Body of `POST /register`.
#[derive(Default, Deserialize)]
pub struct RegisterRequest {
  pub name:                  Option<FormText>,
  pub email:                 Option<FormText>,
  pub password:              Option<FormText>,
  pub password_confirmation: Option<FormText>,
}

pub struct Registration {
  pub name:     String,
  pub email:    String,
  pub password: String,
}

impl RegisterRequest {
  pub fn validate(&self) -> Result<Registration, FieldErrors> {
    let mut errors = FieldErrors::new();
    let name = errors
      .required("name", self.name.as_ref())
      .filter(|n| errors.max_chars("name", n, NAME_MAX));
    let email = errors
      .required("email", self.email.as_ref())
      .filter(|e| errors.email("email", e));
    let confirmation =
      self.password_confirmation.as_ref().and_then(FormText::as_text);
    let password = errors
      .required_secret("password", self.password.as_ref())
      .filter(|p| errors.min_chars("password", p, PASSWORD_MIN))
      .filter(|p| errors.confirmed("password", p, confirmation.as_deref()));

    match (name, email, password) {
      (Some(name), Some(email), Some(password)) => Ok(Registration {
        name:     name.into_owned(),
        email:    email.into_owned(),
        password: password.into_owned(),
      }),
      _ => Err(errors),
    }
  }
}
