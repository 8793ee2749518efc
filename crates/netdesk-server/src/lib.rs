//! HTTP layer for netdesk.
//!
//! Exposes an axum [`Router`] serving the identity endpoints (login,
//! profile, registration, logout) and the internet-user provisioning
//! endpoints, backed by any type implementing both store traits.

pub mod auth;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod password;
pub mod token;

pub use error::{ApiError, ResourceError};

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use netdesk_core::store::{IdentityStore, ProvisioningStore};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use handlers::{device_types, identity, internet_users};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `NETDESK_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:          String,
  pub port:          u16,
  pub database_path: PathBuf,
  /// Name recorded on every issued access token.
  pub token_name:    String,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:          "127.0.0.1".to_string(),
      port:          8000,
      database_path: PathBuf::from("netdesk.sqlite3"),
      token_name:    "netdesk".to_string(),
    }
  }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Everything the router needs from a backend.
pub trait Store: IdentityStore + ProvisioningStore + Clone + 'static {}

impl<T> Store for T where T: IdentityStore + ProvisioningStore + Clone + 'static {}

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: Store> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full netdesk [`Router`].
pub fn router<S: Store>(state: AppState<S>) -> Router {
  Router::new()
    // Identity
    .route("/login", post(identity::login::<S>))
    .route(
      "/profile",
      get(identity::profile).post(identity::update_profile::<S>),
    )
    .route("/register", post(identity::register::<S>))
    .route("/logout", post(identity::logout::<S>))
    // Provisioning
    .route(
      "/internet-users",
      get(internet_users::list::<S>).post(internet_users::create::<S>),
    )
    .route(
      "/internet-users/{id}",
      get(internet_users::edit::<S>)
        .put(internet_users::update::<S>)
        .delete(internet_users::delete::<S>),
    )
    .route("/device-types", get(device_types::list::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
