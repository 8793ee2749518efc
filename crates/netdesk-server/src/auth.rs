//! Bearer-token extractor.
//!
//! `Caller` rejects requests without a valid token; `Option<Caller>` lets the
//! handler decide (registration answers 403, not 401, to anonymous callers).

use axum::{
  extract::{FromRequestParts, OptionalFromRequestParts},
  http::{HeaderMap, header, request::Parts},
};
use netdesk_core::identity::User;

use crate::{AppState, Store, error::ApiError, token};

/// The authenticated user of the current request, and the token they used.
#[derive(Debug, Clone)]
pub struct Caller {
  pub token_id: i64,
  pub user:     User,
}

/// The raw token from an `Authorization: Bearer ...` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

async fn resolve<S: Store>(
  headers: &HeaderMap,
  state: &AppState<S>,
) -> Result<Option<Caller>, ApiError> {
  let Some(presented) = bearer_token(headers).and_then(token::parse) else {
    return Ok(None);
  };

  let found = state
    .store
    .find_token(token::hash_secret(presented.secret))
    .await
    .map_err(ApiError::store)?;

  Ok(
    found
      .filter(|t| presented.id.is_none_or(|id| id == t.token_id))
      .map(|t| Caller { token_id: t.token_id, user: t.user }),
  )
}

impl<S: Store> FromRequestParts<AppState<S>> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    resolve(&parts.headers, state)
      .await?
      .ok_or(ApiError::Unauthenticated)
  }
}

impl<S: Store> OptionalFromRequestParts<AppState<S>> for Caller {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Option<Self>, Self::Rejection> {
    resolve(&parts.headers, state).await
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use axum::{body::Body, http::Request};
  use netdesk_core::{identity::NewUser, store::IdentityStore};
  use netdesk_store_sqlite::SqliteStore;

  use super::*;
  use crate::ServerConfig;

  async fn make_state() -> (AppState<SqliteStore>, i64) {
    let store = SqliteStore::open_in_memory().await.unwrap();
    let user = store
      .create_user(NewUser {
        name:          "Dana".into(),
        email:         "dana@example.com".into(),
        password_hash: "$argon2id$stub".into(),
        role_id:       2,
      })
      .await
      .unwrap();
    let state = AppState {
      store:  Arc::new(store),
      config: Arc::new(ServerConfig::default()),
    };
    (state, user.id)
  }

  async fn extract(
    req: Request<Body>,
    state: &AppState<SqliteStore>,
  ) -> Result<Caller, ApiError> {
    let (mut parts, _) = req.into_parts();
    <Caller as FromRequestParts<_>>::from_request_parts(&mut parts, state).await
  }

  fn bearer(token: &str) -> Request<Body> {
    Request::builder()
      .header(header::AUTHORIZATION, format!("Bearer {token}"))
      .body(Body::empty())
      .unwrap()
  }

  #[tokio::test]
  async fn issued_token_resolves_to_its_user() {
    let (state, user_id) = make_state().await;
    let token = token::issue(&*state.store, user_id, "test").await.unwrap();

    let caller = extract(bearer(&token), &state).await.unwrap();
    assert_eq!(caller.user.id, user_id);
  }

  #[tokio::test]
  async fn bare_secret_is_accepted() {
    let (state, user_id) = make_state().await;
    let token = token::issue(&*state.store, user_id, "test").await.unwrap();
    let (_, secret) = token.split_once('|').unwrap();

    assert!(extract(bearer(secret), &state).await.is_ok());
  }

  #[tokio::test]
  async fn mismatched_id_prefix_is_rejected() {
    let (state, user_id) = make_state().await;
    let token = token::issue(&*state.store, user_id, "test").await.unwrap();
    let (_, secret) = token.split_once('|').unwrap();

    let forged = format!("999|{secret}");
    assert!(matches!(
      extract(bearer(&forged), &state).await,
      Err(ApiError::Unauthenticated)
    ));
  }

  #[tokio::test]
  async fn missing_header() {
    let (state, _) = make_state().await;
    let req = Request::builder().body(Body::empty()).unwrap();
    assert!(matches!(extract(req, &state).await, Err(ApiError::Unauthenticated)));
  }

  #[tokio::test]
  async fn basic_scheme_is_not_a_bearer_token() {
    let (state, _) = make_state().await;
    let req = Request::builder()
      .header(header::AUTHORIZATION, "Basic dXNlcjpzZWNyZXQ=")
      .body(Body::empty())
      .unwrap();
    assert!(matches!(extract(req, &state).await, Err(ApiError::Unauthenticated)));
  }

  #[tokio::test]
  async fn optional_caller_is_none_for_unknown_token() {
    let (state, _) = make_state().await;
    let (mut parts, _) = bearer("1|nope").into_parts();
    let caller =
      <Caller as OptionalFromRequestParts<_>>::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert!(caller.is_none());
  }
}
