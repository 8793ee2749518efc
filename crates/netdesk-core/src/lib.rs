//! Core types and trait definitions for the netdesk admin backend.
//!
//! This crate is deliberately free of HTTP and database dependencies. Request
//! DTOs, their pure validation, and the store traits live here; the SQLite
//! backend and the axum server depend on it.

pub mod directory;
pub mod identity;
pub mod internet_user;
pub mod store;
pub mod validation;

pub use validation::{FieldErrors, FormInt, FormText};
