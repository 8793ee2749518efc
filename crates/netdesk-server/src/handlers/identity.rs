//! Handlers for login, profile, registration and logout.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/login` | Issues a bearer token |
//! | `GET`  | `/profile` | Caller's own account |
//! | `POST` | `/profile` | Own account, or any account for an Admin |
//! | `POST` | `/register` | Admin only; responds 201 |
//! | `POST` | `/logout` | Revokes the token used for the request |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use netdesk_core::{
  FieldErrors, FormText,
  identity::{
    DEFAULT_ROLE_ID, LoginRequest, NewUser, ProfileChanges, RegisterRequest,
    Role, UpdateProfileRequest, User,
  },
  store::IdentityStore,
};
use serde::Serialize;
use serde_json::{Value, json};

use crate::{
  AppState, Store, auth::Caller, error::ApiError, extract::ApiJson, password,
  token,
};

// ─── Response shapes ─────────────────────────────────────────────────────────

/// Login reports the role by name only.
#[derive(Serialize)]
struct LoginUser<'a> {
  id:    i64,
  name:  &'a str,
  email: &'a str,
  role:  Option<&'a str>,
}

impl<'a> From<&'a User> for LoginUser<'a> {
  fn from(u: &'a User) -> Self {
    Self {
      id:    u.id,
      name:  &u.name,
      email: &u.email,
      role:  u.role.as_ref().map(|r| r.name.as_str()),
    }
  }
}

/// Every other endpoint reports the role as `{id, name}` or `null`.
#[derive(Serialize)]
struct ProfileUser<'a> {
  id:    i64,
  name:  &'a str,
  email: &'a str,
  role:  Option<&'a Role>,
}

impl<'a> From<&'a User> for ProfileUser<'a> {
  fn from(u: &'a User) -> Self {
    Self { id: u.id, name: &u.name, email: &u.email, role: u.role.as_ref() }
  }
}

/// The e-mail to test for uniqueness: present, and not already rejected by
/// the field rules.
fn email_to_check(email: Option<&FormText>, errors: &FieldErrors) -> Option<String> {
  if errors.contains("email") {
    return None;
  }
  email
    .and_then(FormText::as_text)
    .map(|e| e.trim().to_owned())
    .filter(|e| !e.is_empty())
}

// ─── Login ───────────────────────────────────────────────────────────────────

/// `POST /login`
pub async fn login<S: Store>(
  State(state): State<AppState<S>>,
  ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Json<Value>, ApiError> {
  let login = body.validate().map_err(ApiError::Validation)?;

  let credentials = state
    .store
    .find_credentials(&login.email)
    .await
    .map_err(ApiError::store)?;

  // An unknown e-mail still pays for one argon2 verification.
  let verified = match &credentials {
    Some(c) => password::verify(&login.password, &c.password_hash),
    None => password::verify_dummy(&login.password),
  };
  let Some(credentials) = credentials.filter(|_| verified) else {
    tracing::warn!(email = %login.email, "login rejected");
    return Err(ApiError::InvalidCredentials);
  };

  let user = credentials.user;
  let token = token::issue(&*state.store, user.id, &state.config.token_name)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = user.id, "login");
  Ok(Json(json!({
    "success": true,
    "token": token,
    "user": LoginUser::from(&user),
    "message": "Login successful",
  })))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /profile`
pub async fn profile(caller: Caller) -> Json<Value> {
  Json(json!({
    "success": true,
    "user": ProfileUser::from(&caller.user),
  }))
}

/// `POST /profile`
///
/// Checked in order: authorization (403), target existence (404), then the
/// field rules (400).
pub async fn update_profile<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  ApiJson(body): ApiJson<UpdateProfileRequest>,
) -> Result<Json<Value>, ApiError> {
  let target = body.target_id();

  if let Some(target) = target {
    if target != caller.user.id && !caller.user.is_admin() {
      tracing::warn!(
        caller = caller.user.id,
        target,
        "profile update of another account rejected"
      );
      return Err(ApiError::Unauthorized);
    }
    if state
      .store
      .get_user(target)
      .await
      .map_err(ApiError::store)?
      .is_none()
    {
      return Err(ApiError::NotFound("User not found".into()));
    }
  }

  let (update, mut errors) = match body.validate() {
    Ok(update) => (Some(update), FieldErrors::new()),
    Err(errors) => (None, errors),
  };
  if let Some(email) = email_to_check(body.email.as_ref(), &errors)
    && state
      .store
      .email_taken(&email, target)
      .await
      .map_err(ApiError::store)?
  {
    errors.taken("email");
  }
  let update = match update {
    Some(update) if errors.is_empty() => update,
    _ => return Err(ApiError::Validation(errors)),
  };

  let password_hash = update.password.as_deref().map(password::hash).transpose()?;
  let user = state
    .store
    .update_user(update.user_id, ProfileChanges {
      name: update.name,
      email: update.email,
      password_hash,
    })
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

  tracing::info!(caller = caller.user.id, user_id = user.id, "profile updated");
  Ok(Json(json!({
    "success": true,
    "message": "Profile updated successfully",
    "user": ProfileUser::from(&user),
  })))
}

// ─── Registration ────────────────────────────────────────────────────────────

/// `POST /register`
pub async fn register<S: Store>(
  State(state): State<AppState<S>>,
  caller: Option<Caller>,
  ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
  let Some(caller) = caller.filter(|c| c.user.is_admin()) else {
    tracing::warn!("registration by a non-admin rejected");
    return Err(ApiError::Unauthorized);
  };

  let (registration, mut errors) = match body.validate() {
    Ok(registration) => (Some(registration), FieldErrors::new()),
    Err(errors) => (None, errors),
  };
  if let Some(email) = email_to_check(body.email.as_ref(), &errors)
    && state
      .store
      .email_taken(&email, None)
      .await
      .map_err(ApiError::store)?
  {
    errors.taken("email");
  }
  let registration = match registration {
    Some(registration) if errors.is_empty() => registration,
    _ => return Err(ApiError::Validation(errors)),
  };

  let user = state
    .store
    .create_user(NewUser {
      name:          registration.name,
      email:         registration.email,
      password_hash: password::hash(&registration.password)?,
      role_id:       DEFAULT_ROLE_ID,
    })
    .await
    .map_err(ApiError::store)?;

  let token = token::issue(&*state.store, user.id, &state.config.token_name)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(caller = caller.user.id, user_id = user.id, "user registered");
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "success": true,
      "token": token,
      "user": ProfileUser::from(&user),
      "message": "User created successfully",
    })),
  ))
}

// ─── Logout ──────────────────────────────────────────────────────────────────

/// `POST /logout`
pub async fn logout<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
) -> Result<Json<Value>, ApiError> {
  state
    .store
    .revoke_token(caller.token_id)
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = caller.user.id, "logout");
  Ok(Json(json!({ "message": "Logged out successfully." })))
}
