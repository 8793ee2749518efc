//! Error types and axum `IntoResponse` implementations.
//!
//! Existing clients expect two JSON envelopes. The identity endpoints answer
//! `{"success": false, "errors" | "error": ...}` ([`ApiError`]); the
//! internet-user endpoints answer `{"message": ..., "errors" | "error": ...}`
//! ([`ResourceError`]).

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use netdesk_core::FieldErrors;
use serde_json::json;
use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

// ─── Identity envelope ───────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ApiError {
  #[error("validation failed: {0:?}")]
  Validation(FieldErrors),

  /// Unknown e-mail and wrong password are deliberately the same variant.
  #[error("invalid credentials")]
  InvalidCredentials,

  /// Missing, malformed or revoked bearer token.
  #[error("unauthenticated")]
  Unauthenticated,

  #[error("unauthorized")]
  Unauthorized,

  #[error("{0}")]
  NotFound(String),

  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("store error: {0}")]
  Store(#[source] BoxError),
}

impl ApiError {
  pub fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, error) = match self {
      ApiError::Validation(errors) => {
        return (
          StatusCode::BAD_REQUEST,
          Json(json!({ "success": false, "errors": errors })),
        )
          .into_response();
      }
      ApiError::InvalidCredentials => {
        (StatusCode::UNAUTHORIZED, "Invalid credentials".to_owned())
      }
      ApiError::Unauthenticated => {
        (StatusCode::UNAUTHORIZED, "Unauthenticated".to_owned())
      }
      ApiError::Unauthorized => (StatusCode::FORBIDDEN, "Unauthorized".to_owned()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::Hash(m) => {
        tracing::error!(error = %m, "password hashing failed");
        (StatusCode::INTERNAL_SERVER_ERROR, m)
      }
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store error");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "success": false, "error": error }))).into_response()
  }
}

// ─── Resource envelope ───────────────────────────────────────────────────────

pub const INVALID_DATA: &str = "The given data was invalid.";
pub const NOT_FOUND: &str = "Internet user not found.";
pub const HAS_VIOLATIONS: &str =
  "Internet user has recorded violations and cannot be deleted.";

#[derive(Debug, Error)]
pub enum ResourceError {
  #[error("validation failed: {0:?}")]
  Validation(FieldErrors),

  #[error("internet user {0} not found")]
  NotFound(i64),

  /// Violations must be cleared before the internet user can be deleted.
  #[error("internet user {id} has {violations} violation(s)")]
  HasViolations { id: i64, violations: i64 },

  /// A store failure. `message` is the client-facing summary; the source's
  /// text is surfaced as `error`.
  #[error("{message}: {source}")]
  Failed {
    message: &'static str,
    #[source]
    source:  BoxError,
  },
}

impl ResourceError {
  /// Build a `map_err` adapter that wraps a store error under `message`.
  pub fn failed<E>(message: &'static str) -> impl FnOnce(E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    move |e| Self::Failed { message, source: Box::new(e) }
  }
}

impl IntoResponse for ResourceError {
  fn into_response(self) -> Response {
    match self {
      ResourceError::Validation(errors) => (
        StatusCode::BAD_REQUEST,
        Json(json!({ "message": INVALID_DATA, "errors": errors })),
      )
        .into_response(),
      ResourceError::NotFound(id) => (
        StatusCode::NOT_FOUND,
        Json(json!({
          "message": NOT_FOUND,
          "error": format!("No internet user with id {id}."),
        })),
      )
        .into_response(),
      ResourceError::HasViolations { id, violations } => (
        StatusCode::CONFLICT,
        Json(json!({
          "message": HAS_VIOLATIONS,
          "error": format!(
            "{violations} violation(s) reference internet user {id}."
          ),
        })),
      )
        .into_response(),
      ResourceError::Failed { message, source } => {
        tracing::error!(error = %source, "{message}");
        (
          StatusCode::INTERNAL_SERVER_ERROR,
          Json(json!({ "message": message, "error": source.to_string() })),
        )
          .into_response()
      }
    }
  }
}
