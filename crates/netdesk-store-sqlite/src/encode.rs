//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and status as `0` / `1`. Rows
//! are first read into plain `Raw*` structs inside the connection closure and
//! converted to domain types afterwards, so decode failures surface as
//! [`Error`]s rather than `rusqlite` errors.

use chrono::{DateTime, Utc};
use netdesk_core::{
  directory::{Directorate, EmploymentType, Person, PersonDetail, Position},
  identity::{Role, User},
  internet_user::{InternetUser, InternetUserDetail, InternetUserRow, Status},
};
use rusqlite::Row;

use crate::{Error, Result};

// ─── Column lists ────────────────────────────────────────────────────────────

/// Read with [`RawUser::read`]. Requires `FROM users u LEFT JOIN roles r`.
pub const USER_COLUMNS: &str =
  "u.id, u.name, u.email, r.id, r.name, u.created_at, u.updated_at";
pub const USER_COLUMN_COUNT: usize = 7;

/// Read with [`RawInternetUser::read`]. Requires `internet_users iu`.
pub const INTERNET_USER_COLUMNS: &str = "iu.id, iu.person_id, iu.username, \
   iu.status, iu.phone, iu.directorate_id, iu.device_limit, iu.mac_address, \
   iu.created_at, iu.updated_at";
pub const INTERNET_USER_COLUMN_COUNT: usize = 10;

/// Read with [`RawPerson::read`]. Requires `persons p`.
pub const PERSON_COLUMNS: &str = "p.id, p.name, p.lastname, p.email, p.phone, \
   p.directorate_id, p.position_id, p.employment_type_id, p.created_at, \
   p.updated_at";
pub const PERSON_COLUMN_COUNT: usize = 10;

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Status ──────────────────────────────────────────────────────────────────

pub fn encode_status(s: Status) -> i64 { i64::from(u8::from(s)) }

pub fn decode_status(v: i64) -> Result<Status> {
  u8::try_from(v)
    .map_err(|_| Error::Decode(format!("status out of range: {v}")))
    .and_then(|v| Status::try_from(v).map_err(Error::Decode))
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub struct RawUser {
  pub id:         i64,
  pub name:       String,
  pub email:      String,
  pub role_id:    Option<i64>,
  pub role_name:  Option<String>,
  pub created_at: String,
  pub updated_at: String,
}

impl RawUser {
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(at)?,
      name:       row.get(at + 1)?,
      email:      row.get(at + 2)?,
      role_id:    row.get(at + 3)?,
      role_name:  row.get(at + 4)?,
      created_at: row.get(at + 5)?,
      updated_at: row.get(at + 6)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    let role = match (self.role_id, self.role_name) {
      (Some(id), Some(name)) => Some(Role { id, name }),
      _ => None,
    };
    Ok(User {
      id: self.id,
      name: self.name,
      email: self.email,
      role,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Internet users ──────────────────────────────────────────────────────────

pub struct RawInternetUser {
  pub id:             i64,
  pub person_id:      i64,
  pub username:       String,
  pub status:         i64,
  pub phone:          String,
  pub directorate_id: i64,
  pub device_limit:   i64,
  pub mac_address:    Option<String>,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawInternetUser {
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:             row.get(at)?,
      person_id:      row.get(at + 1)?,
      username:       row.get(at + 2)?,
      status:         row.get(at + 3)?,
      phone:          row.get(at + 4)?,
      directorate_id: row.get(at + 5)?,
      device_limit:   row.get(at + 6)?,
      mac_address:    row.get(at + 7)?,
      created_at:     row.get(at + 8)?,
      updated_at:     row.get(at + 9)?,
    })
  }

  pub fn into_internet_user(self) -> Result<InternetUser> {
    Ok(InternetUser {
      id:             self.id,
      person_id:      self.person_id,
      username:       self.username,
      status:         decode_status(self.status)?,
      phone:          self.phone,
      directorate_id: self.directorate_id,
      device_limit:   self.device_limit,
      mac_address:    self.mac_address,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Persons ─────────────────────────────────────────────────────────────────

pub struct RawPerson {
  pub id:                 i64,
  pub name:               Option<String>,
  pub lastname:           Option<String>,
  pub email:              String,
  pub phone:              String,
  pub directorate_id:     i64,
  pub position_id:        i64,
  pub employment_type_id: i64,
  pub created_at:         String,
  pub updated_at:         String,
}

impl RawPerson {
  pub fn read(row: &Row<'_>, at: usize) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                 row.get(at)?,
      name:               row.get(at + 1)?,
      lastname:           row.get(at + 2)?,
      email:              row.get(at + 3)?,
      phone:              row.get(at + 4)?,
      directorate_id:     row.get(at + 5)?,
      position_id:        row.get(at + 6)?,
      employment_type_id: row.get(at + 7)?,
      created_at:         row.get(at + 8)?,
      updated_at:         row.get(at + 9)?,
    })
  }

  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      id:                 self.id,
      name:               self.name,
      lastname:           self.lastname,
      email:              self.email,
      phone:              self.phone,
      directorate_id:     self.directorate_id,
      position_id:        self.position_id,
      employment_type_id: self.employment_type_id,
      created_at:         decode_dt(&self.created_at)?,
      updated_at:         decode_dt(&self.updated_at)?,
    })
  }
}

/// An internet user row joined with its person and the person's
/// (left-joined, hence optional) references.
pub struct RawInternetUserDetail {
  pub internet_user:   RawInternetUser,
  pub person:          RawPerson,
  pub directorate:     Option<Directorate>,
  pub position:        Option<Position>,
  pub employment_type: Option<EmploymentType>,
}

impl RawInternetUserDetail {
  pub fn into_detail(self) -> Result<InternetUserDetail> {
    Ok(InternetUserDetail {
      internet_user: self.internet_user.into_internet_user()?,
      person:        PersonDetail {
        person:          self.person.into_person()?,
        directorate:     self.directorate,
        position:        self.position,
        employment_type: self.employment_type,
      },
    })
  }
}

// ─── Listing ─────────────────────────────────────────────────────────────────

pub struct RawInternetUserRow {
  pub id:          i64,
  pub name:        Option<String>,
  pub lastname:    Option<String>,
  pub username:    String,
  pub phone:       String,
  pub directorate: String,
  pub status:      i64,
  pub count:       i64,
  pub deputy:      Option<String>,
}

impl RawInternetUserRow {
  pub fn into_row(self) -> Result<InternetUserRow> {
    Ok(InternetUserRow {
      id:          self.id,
      name:        self.name,
      lastname:    self.lastname,
      username:    self.username,
      phone:       self.phone,
      directorate: self.directorate,
      status:      decode_status(self.status)?,
      count:       self.count,
      deputy:      self.deputy,
    })
  }
}
