//! Body and path extractors that reject in the endpoint's own envelope.
//!
//! axum's `Json` and `Path` answer malformed input with plain-text 4xx
//! responses. The wrappers here turn those rejections into 400 validation
//! errors, so clients always receive the `errors` map they already parse.
//! Wrongly typed fields never get this far: every request DTO field is a
//! [`FormText`](netdesk_core::FormText) or [`FormInt`](netdesk_core::FormInt)
//! and is reported by the field rules instead.

use axum::{
  Json,
  extract::{
    FromRequest, FromRequestParts, Path, Request,
    rejection::JsonRejection,
  },
  http::request::Parts,
};
use netdesk_core::FieldErrors;
use serde::de::DeserializeOwned;

use crate::error::{ApiError, ResourceError};

/// A JSON body for the identity endpoints.
pub struct ApiJson<T>(pub T);

/// A JSON body for the internet-user endpoints.
pub struct ResourceJson<T>(pub T);

/// The numeric `{id}` segment of an internet-user route.
pub struct ResourceId(pub i64);

/// Reported under the `body` key, since no single field is to blame.
fn body_errors(rejection: &JsonRejection) -> FieldErrors {
  tracing::debug!(error = %rejection.body_text(), "request body rejected");
  let message = match rejection {
    JsonRejection::MissingJsonContentType(_) => {
      "The request body must be sent as application/json."
    }
    JsonRejection::JsonSyntaxError(_) => "The request body must be valid JSON.",
    JsonRejection::JsonDataError(_) => "The request body must be a JSON object.",
    _ => "The request body could not be read.",
  };
  let mut errors = FieldErrors::new();
  errors.add("body", message);
  errors
}

impl<T, S> FromRequest<S> for ApiJson<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    Json::<T>::from_request(req, state)
      .await
      .map(|Json(value)| Self(value))
      .map_err(|rejection| ApiError::Validation(body_errors(&rejection)))
  }
}

impl<T, S> FromRequest<S> for ResourceJson<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ResourceError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    Json::<T>::from_request(req, state)
      .await
      .map(|Json(value)| Self(value))
      .map_err(|rejection| ResourceError::Validation(body_errors(&rejection)))
  }
}

impl<S> FromRequestParts<S> for ResourceId
where
  S: Send + Sync,
{
  type Rejection = ResourceError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &S,
  ) -> Result<Self, Self::Rejection> {
    match Path::<i64>::from_request_parts(parts, state).await {
      Ok(Path(id)) => Ok(Self(id)),
      Err(rejection) => {
        tracing::debug!(error = %rejection.body_text(), "path rejected");
        let mut errors = FieldErrors::new();
        errors.add("id", "The id field must be an integer.");
        Err(ResourceError::Validation(errors))
      }
    }
  }
}
