//! Handlers for `/internet-users` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/internet-users` | Listing with violation counts |
//! | `POST`   | `/internet-users` | Creates a person and its internet user |
//! | `GET`    | `/internet-users/{id}` | 404 if not found |
//! | `PUT`    | `/internet-users/{id}` | 404 if not found |
//! | `DELETE` | `/internet-users/{id}` | Removes the person as well; 409 while violations exist |

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use netdesk_core::{
  internet_user::{Deletion, InternetUserRequest, InternetUserRow},
  store::ProvisioningStore,
};
use serde_json::{Value, json};

use crate::{
  AppState, Store,
  auth::Caller,
  error::ResourceError,
  extract::{ResourceId, ResourceJson},
};

const LIST_FAILED: &str = "An error occurred while loading internet users.";
const LOAD_FAILED: &str = "An error occurred while loading the user.";
const CREATE_FAILED: &str = "An error occurred while creating the user.";
const UPDATE_FAILED: &str = "An error occurred while updating the user.";
const DELETE_FAILED: &str = "An error occurred while deleting the user.";

// ─── List ────────────────────────────────────────────────────────────────────

/// `GET /internet-users`
pub async fn list<S: Store>(
  State(state): State<AppState<S>>,
  _caller: Caller,
) -> Result<Json<Vec<InternetUserRow>>, ResourceError> {
  let rows = state
    .store
    .list_internet_users()
    .await
    .map_err(ResourceError::failed(LIST_FAILED))?;
  Ok(Json(rows))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// `POST /internet-users`
pub async fn create<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  ResourceJson(body): ResourceJson<InternetUserRequest>,
) -> Result<impl IntoResponse, ResourceError> {
  let fields = body.validate().map_err(ResourceError::Validation)?;
  state
    .store
    .check_internet_user(&fields, None)
    .await
    .map_err(ResourceError::failed(CREATE_FAILED))?
    .into_result()
    .map_err(ResourceError::Validation)?;

  let created = state
    .store
    .create_internet_user(fields)
    .await
    .map_err(ResourceError::failed(CREATE_FAILED))?;

  tracing::info!(
    caller = caller.user.id,
    id = created.id,
    username = %created.username,
    "internet user created"
  );
  Ok((
    StatusCode::CREATED,
    Json(json!({
      "message": "Internet user successfully created.",
      "data": created,
    })),
  ))
}

// ─── Edit ────────────────────────────────────────────────────────────────────

/// `GET /internet-users/{id}`
pub async fn edit<S: Store>(
  State(state): State<AppState<S>>,
  _caller: Caller,
  ResourceId(id): ResourceId,
) -> Result<Json<Value>, ResourceError> {
  let detail = state
    .store
    .get_internet_user(id)
    .await
    .map_err(ResourceError::failed(LOAD_FAILED))?
    .ok_or(ResourceError::NotFound(id))?;

  Ok(Json(json!({
    "message": "Internet user found.",
    "data": detail,
  })))
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// `PUT /internet-users/{id}`
pub async fn update<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  ResourceId(id): ResourceId,
  ResourceJson(body): ResourceJson<InternetUserRequest>,
) -> Result<Json<Value>, ResourceError> {
  if state
    .store
    .get_internet_user(id)
    .await
    .map_err(ResourceError::failed(UPDATE_FAILED))?
    .is_none()
  {
    return Err(ResourceError::NotFound(id));
  }

  let fields = body.validate().map_err(ResourceError::Validation)?;
  state
    .store
    .check_internet_user(&fields, Some(id))
    .await
    .map_err(ResourceError::failed(UPDATE_FAILED))?
    .into_result()
    .map_err(ResourceError::Validation)?;

  let updated = state
    .store
    .update_internet_user(id, fields)
    .await
    .map_err(ResourceError::failed(UPDATE_FAILED))?
    .ok_or(ResourceError::NotFound(id))?;

  tracing::info!(caller = caller.user.id, id, "internet user updated");
  Ok(Json(json!({
    "message": "Internet user successfully updated.",
    "data": updated,
  })))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /internet-users/{id}`
pub async fn delete<S: Store>(
  State(state): State<AppState<S>>,
  caller: Caller,
  ResourceId(id): ResourceId,
) -> Result<Json<Value>, ResourceError> {
  match state
    .store
    .delete_internet_user(id)
    .await
    .map_err(ResourceError::failed(DELETE_FAILED))?
  {
    Deletion::Deleted => {}
    Deletion::NotFound => return Err(ResourceError::NotFound(id)),
    Deletion::HasViolations(violations) => {
      tracing::warn!(caller = caller.user.id, id, violations, "delete refused");
      return Err(ResourceError::HasViolations { id, violations });
    }
  }

  tracing::info!(caller = caller.user.id, id, "internet user deleted");
  Ok(Json(json!({
    "message": "Internet user and associated person successfully deleted.",
  })))
}
