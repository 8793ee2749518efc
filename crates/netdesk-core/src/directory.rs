//! Organisational reference data and the `Person` record.
//!
//! Directorates, positions, employment types and device types are read-only
//! from this system's point of view; they are seeded by an administrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An organisational unit. A directorate may sit under a parent directorate,
/// which listings report as its "deputy".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directorate {
  pub id:        i64,
  pub name:      String,
  pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
  pub id:   i64,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmploymentType {
  pub id:   i64,
  pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceType {
  pub id:   i64,
  pub name: String,
}

/// A member of staff. Every person handled by this system owns exactly one
/// internet user and shares its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub id:                 i64,
  pub name:               Option<String>,
  pub lastname:           Option<String>,
  pub email:              String,
  pub phone:              String,
  pub directorate_id:     i64,
  pub position_id:        i64,
  pub employment_type_id: i64,
  pub created_at:         DateTime<Utc>,
  pub updated_at:         DateTime<Utc>,
}

/// A person with its references resolved. A reference is `None` only if the
/// row it points at has disappeared.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonDetail {
  #[serde(flatten)]
  pub person:          Person,
  pub directorate:     Option<Directorate>,
  pub position:        Option<Position>,
  pub employment_type: Option<EmploymentType>,
}
