//! Internet users: the network accounts provisioned for a [`Person`].
//!
//! A person and its internet user are created, updated and deleted as one
//! unit. The request DTO carries the fields of both records.
//!
//! [`Person`]: crate::directory::Person

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  directory::PersonDetail,
  validation::{FieldErrors, FormInt, FormText},
};

pub const USERNAME_MAX: usize = 255;
pub const PHONE_MAX: usize = 15;
pub const NAME_MAX: usize = 255;

// ─── Status ──────────────────────────────────────────────────────────────────

/// Whether the account may connect. Stored and serialised as `0` / `1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Status {
  Disabled,
  Enabled,
}

impl From<Status> for u8 {
  fn from(s: Status) -> Self {
    match s {
      Status::Disabled => 0,
      Status::Enabled => 1,
    }
  }
}

impl TryFrom<u8> for Status {
  type Error = String;

  fn try_from(v: u8) -> Result<Self, Self::Error> {
    match v {
      0 => Ok(Self::Disabled),
      1 => Ok(Self::Enabled),
      other => Err(format!("unknown status: {other}")),
    }
  }
}

// ─── Records ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternetUser {
  pub id:             i64,
  pub person_id:      i64,
  pub username:       String,
  pub status:         Status,
  /// Copy of the owning person's phone.
  pub phone:          String,
  pub directorate_id: i64,
  pub device_limit:   i64,
  pub mac_address:    Option<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// An internet user together with its person and the person's references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InternetUserDetail {
  #[serde(flatten)]
  pub internet_user: InternetUser,
  pub person:        PersonDetail,
}

/// One line of the internet-user listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InternetUserRow {
  pub id:          i64,
  pub name:        Option<String>,
  pub lastname:    Option<String>,
  pub username:    String,
  /// The person's phone.
  pub phone:       String,
  pub directorate: String,
  pub status:      Status,
  /// Number of violations recorded against this internet user.
  pub count:       i64,
  /// Name of the directorate's parent, if any.
  pub deputy:      Option<String>,
}

/// Outcome of [`ProvisioningStore::delete_internet_user`].
///
/// [`ProvisioningStore::delete_internet_user`]:
/// crate::store::ProvisioningStore::delete_internet_user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deletion {
  Deleted,
  NotFound,
  /// Recorded violations still reference the internet user. Nothing was
  /// removed.
  HasViolations(i64),
}

// ─── Request ─────────────────────────────────────────────────────────────────

/// Body of `POST /internet-users` and `PUT /internet-users/{id}`.
///
/// Every field is optional at the type level; [`validate`](Self::validate)
/// decides what is missing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InternetUserRequest {
  pub username:         Option<FormText>,
  pub status:           Option<FormInt>,
  pub phone:            Option<FormText>,
  pub email:            Option<FormText>,
  pub directorate_id:   Option<FormInt>,
  pub employee_type_id: Option<FormInt>,
  pub position:         Option<FormInt>,
  /// Accepted for client compatibility and ignored: create always makes a
  /// new person, update reaches the person through the internet user.
  pub person_id:        Option<FormInt>,
  pub device_limit:     Option<FormInt>,
  pub mac_address:      Option<FormText>,
  pub name:             Option<FormText>,
  pub lastname:         Option<FormText>,
}

/// The validated field set written to a person and its internet user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternetUserFields {
  pub username:           String,
  pub status:             Status,
  pub phone:              String,
  pub email:              String,
  pub directorate_id:     i64,
  pub employment_type_id: i64,
  pub position_id:        i64,
  pub device_limit:       i64,
  pub mac_address:        Option<String>,
  pub name:               Option<String>,
  pub lastname:           Option<String>,
}

impl InternetUserRequest {
  /// Apply every rule that does not need the database.
  ///
  /// Uniqueness and reference existence are checked afterwards by
  /// [`ProvisioningStore::check_internet_user`].
  ///
  /// [`ProvisioningStore::check_internet_user`]:
  /// crate::store::ProvisioningStore::check_internet_user
  pub fn validate(&self) -> Result<InternetUserFields, FieldErrors> {
    let mut errors = FieldErrors::new();

    let username = errors
      .required("username", self.username.as_ref())
      .filter(|u| errors.max_chars("username", u, USERNAME_MAX));

    let status = errors
      .required_int("status", self.status.as_ref())
      .filter(|s| errors.one_of("status", *s, &[0, 1]))
      .map(|s| if s == 1 { Status::Enabled } else { Status::Disabled });

    let phone = errors
      .required("phone", self.phone.as_ref())
      .filter(|p| errors.max_chars("phone", p, PHONE_MAX));

    let email = errors
      .required("email", self.email.as_ref())
      .filter(|e| errors.email("email", e));

    let directorate_id =
      errors.required_int("directorate_id", self.directorate_id.as_ref());
    let employment_type_id =
      errors.required_int("employee_type_id", self.employee_type_id.as_ref());
    let position_id = errors.required_int("position", self.position.as_ref());

    let device_limit = errors
      .required_int("device_limit", self.device_limit.as_ref())
      .filter(|d| errors.min_value("device_limit", *d, 1));

    let mac_address = errors.optional("mac_address", self.mac_address.as_ref());
    if let Some(mac) = &mac_address {
      errors.mac_address("mac_address", mac);
    }

    let name = errors.optional("name", self.name.as_ref());
    if let Some(n) = &name {
      errors.max_chars("name", n, NAME_MAX);
    }
    let lastname = errors.optional("lastname", self.lastname.as_ref());
    if let Some(n) = &lastname {
      errors.max_chars("lastname", n, NAME_MAX);
    }

    match (
      username,
      status,
      phone,
      email,
      directorate_id,
      employment_type_id,
      position_id,
      device_limit,
    ) {
      (
        Some(username),
        Some(status),
        Some(phone),
        Some(email),
        Some(directorate_id),
        Some(employment_type_id),
        Some(position_id),
        Some(device_limit),
      ) if errors.is_empty() => Ok(InternetUserFields {
        username: username.into_owned(),
        status,
        phone: phone.into_owned(),
        email: email.into_owned(),
        directorate_id,
        employment_type_id,
        position_id,
        device_limit,
        mac_address: mac_address.map(Cow::into_owned),
        name: name.map(Cow::into_owned),
        lastname: lastname.map(Cow::into_owned),
      }),
      _ => Err(errors),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request() -> InternetUserRequest {
    InternetUserRequest {
      username: Some("jdoe".into()),
      status: Some(FormInt::Int(1)),
      phone: Some("5551234".into()),
      email: Some("j@x.com".into()),
      directorate_id: Some(FormInt::Int(1)),
      employee_type_id: Some(FormInt::Text("2".into())),
      position: Some(FormInt::Int(3)),
      person_id: None,
      device_limit: Some(FormInt::Int(2)),
      mac_address: None,
      name: Some("John".into()),
      lastname: Some("Doe".into()),
    }
  }

  #[test]
  fn valid_request_produces_fields() {
    let fields = request().validate().unwrap();
    assert_eq!(fields.username, "jdoe");
    assert_eq!(fields.status, Status::Enabled);
    assert_eq!(fields.employment_type_id, 2);
    assert_eq!(fields.position_id, 3);
    assert_eq!(fields.mac_address, None);
  }

  #[test]
  fn empty_request_reports_every_required_field() {
    let errors = InternetUserRequest::default().validate().unwrap_err();
    for field in [
      "username",
      "status",
      "phone",
      "email",
      "directorate_id",
      "employee_type_id",
      "position",
      "device_limit",
    ] {
      assert!(errors.contains(field), "missing error for {field}");
    }
    assert!(!errors.contains("person_id"));
    assert!(!errors.contains("mac_address"));
  }

  #[test]
  fn status_must_be_zero_or_one() {
    let mut req = request();
    req.status = Some(FormInt::Int(2));
    let errors = req.validate().unwrap_err();
    assert_eq!(errors.get("status").unwrap(), &["The selected status is invalid."]);
  }

  #[test]
  fn phone_longer_than_fifteen_is_rejected() {
    let mut req = request();
    req.phone = Some("1234567890123456".into());
    assert!(req.validate().unwrap_err().contains("phone"));
  }

  #[test]
  fn device_limit_must_be_positive() {
    let mut req = request();
    req.device_limit = Some(FormInt::Int(0));
    assert!(req.validate().unwrap_err().contains("device_limit"));
  }

  #[test]
  fn malformed_mac_address_is_rejected() {
    let mut req = request();
    req.mac_address = Some("not-a-mac".into());
    assert!(req.validate().unwrap_err().contains("mac_address"));

    req.mac_address = Some("aa:bb:cc:dd:ee:ff".into());
    assert_eq!(
      req.validate().unwrap().mac_address.as_deref(),
      Some("aa:bb:cc:dd:ee:ff")
    );
  }

  #[test]
  fn blank_mac_address_counts_as_absent() {
    let mut req = request();
    req.mac_address = Some("  ".into());
    assert_eq!(req.validate().unwrap().mac_address, None);
  }

  #[test]
  fn form_clients_may_send_numbers_for_text_fields() {
    let req: InternetUserRequest = serde_json::from_value(serde_json::json!({
      "username": 1001,
      "status": "1",
      "phone": 5551234,
      "email": "j@x.com",
      "directorate_id": 1,
      "employee_type_id": "2",
      "position": 3,
      "device_limit": 2,
      "name": "John",
    }))
    .unwrap();
    let fields = req.validate().unwrap();
    assert_eq!(fields.username, "1001");
    assert_eq!(fields.phone, "5551234");
  }

  #[test]
  fn wrongly_typed_fields_are_reported_per_field() {
    let req: InternetUserRequest = serde_json::from_value(serde_json::json!({
      "username": ["jdoe"],
      "status": true,
      "phone": { "number": "5551234" },
      "mac_address": false,
    }))
    .unwrap();
    let errors = req.validate().unwrap_err();
    assert_eq!(errors.get("username").unwrap(), &["The username field must be a string."]);
    assert_eq!(errors.get("status").unwrap(), &["The status field must be an integer."]);
    assert_eq!(errors.get("phone").unwrap(), &["The phone field must be a string."]);
    assert!(errors.contains("mac_address"));
  }

  #[test]
  fn status_serialises_as_integer() {
    assert_eq!(serde_json::to_value(Status::Enabled).unwrap(), 1);
    assert_eq!(
      serde_json::from_value::<Status>(serde_json::json!(0)).unwrap(),
      Status::Disabled
    );
    assert!(serde_json::from_value::<Status>(serde_json::json!(7)).is_err());
  }
}
