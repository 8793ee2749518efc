//! Field-level validation shared by every request DTO.
//!
//! Validation is a pure function from a DTO to either a validated value or a
//! [`FieldErrors`] map. Rules that need the database (uniqueness, foreign-key
//! existence) are evaluated by the store and reported through the same map.

use std::{borrow::Cow, collections::BTreeMap};

use serde::{Deserialize, Serialize, de::IgnoredAny};
use thiserror::Error;
use validator::ValidateEmail as _;

// ─── FieldErrors ─────────────────────────────────────────────────────────────

/// Per-field error messages, keyed by the request field name.
///
/// Serialises as a plain JSON object: `{"email": ["..."], ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Error)]
#[serde(transparent)]
#[error("{} field(s) failed validation", .0.len())]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
  pub fn new() -> Self { Self::default() }

  pub fn is_empty(&self) -> bool { self.0.is_empty() }

  pub fn contains(&self, field: &str) -> bool { self.0.contains_key(field) }

  pub fn get(&self, field: &str) -> Option<&[String]> {
    self.0.get(field).map(Vec::as_slice)
  }

  pub fn add(&mut self, field: &str, message: impl Into<String>) {
    self.0.entry(field.to_owned()).or_default().push(message.into());
  }

  /// Fold another error map into this one, preserving message order.
  pub fn merge(&mut self, other: FieldErrors) {
    for (field, messages) in other.0 {
      self.0.entry(field).or_default().extend(messages);
    }
  }

  /// `Ok(())` when no error was recorded.
  pub fn into_result(self) -> Result<(), FieldErrors> {
    if self.is_empty() { Ok(()) } else { Err(self) }
  }

  // ── Rules ────────────────────────────────────────────────────────────────

  /// Returns the trimmed value if present and non-blank.
  pub fn required<'a>(
    &mut self,
    field: &str,
    value: Option<&'a FormText>,
  ) -> Option<Cow<'a, str>> {
    let Some(value) = value else {
      self.missing(field);
      return None;
    };
    let text = self.text(field, value)?;
    if text.trim().is_empty() {
      self.missing(field);
      return None;
    }
    Some(trim(text))
  }

  /// Like [`required`](Self::required) but never trims: passwords keep
  /// their surrounding whitespace.
  pub fn required_secret<'a>(
    &mut self,
    field: &str,
    value: Option<&'a FormText>,
  ) -> Option<Cow<'a, str>> {
    let Some(value) = value else {
      self.missing(field);
      return None;
    };
    let text = self.text(field, value)?;
    if text.is_empty() {
      self.missing(field);
      return None;
    }
    Some(text)
  }

  /// Trimmed value of an optional field; blank counts as absent.
  pub fn optional<'a>(
    &mut self,
    field: &str,
    value: Option<&'a FormText>,
  ) -> Option<Cow<'a, str>> {
    self.text(field, value?).filter(|v| !v.trim().is_empty()).map(trim)
  }

  /// Untrimmed value of an optional secret; empty counts as absent.
  pub fn optional_secret<'a>(
    &mut self,
    field: &str,
    value: Option<&'a FormText>,
  ) -> Option<Cow<'a, str>> {
    self.text(field, value?).filter(|v| !v.is_empty())
  }

  /// Returns the parsed integer if present and numeric.
  pub fn required_int(
    &mut self,
    field: &str,
    value: Option<&FormInt>,
  ) -> Option<i64> {
    match value {
      None => {
        self.missing(field);
        None
      }
      Some(FormInt::Text(t)) if t.trim().is_empty() => {
        self.missing(field);
        None
      }
      Some(v) => {
        let parsed = v.as_i64();
        if parsed.is_none() {
          self
            .add(field, format!("The {} field must be an integer.", label(field)));
        }
        parsed
      }
    }
  }

  fn missing(&mut self, field: &str) {
    self.add(field, format!("The {} field is required.", label(field)));
  }

  /// Only strings and numbers carry text.
  fn text<'a>(&mut self, field: &str, value: &'a FormText) -> Option<Cow<'a, str>> {
    let text = value.as_text();
    if text.is_none() {
      self.add(field, format!("The {} field must be a string.", label(field)));
    }
    text
  }

  pub fn max_chars(&mut self, field: &str, value: &str, max: usize) -> bool {
    let ok = value.chars().count() <= max;
    if !ok {
      self.add(
        field,
        format!(
          "The {} field must not be greater than {max} characters.",
          label(field)
        ),
      );
    }
    ok
  }

  pub fn min_chars(&mut self, field: &str, value: &str, min: usize) -> bool {
    let ok = value.chars().count() >= min;
    if !ok {
      self.add(
        field,
        format!("The {} field must be at least {min} characters.", label(field)),
      );
    }
    ok
  }

  pub fn min_value(&mut self, field: &str, value: i64, min: i64) -> bool {
    let ok = value >= min;
    if !ok {
      self
        .add(field, format!("The {} field must be at least {min}.", label(field)));
    }
    ok
  }

  pub fn email(&mut self, field: &str, value: &str) -> bool {
    let ok = value.validate_email();
    if !ok {
      self.add(
        field,
        format!("The {} field must be a valid email address.", label(field)),
      );
    }
    ok
  }

  pub fn one_of(&mut self, field: &str, value: i64, allowed: &[i64]) -> bool {
    let ok = allowed.contains(&value);
    if !ok {
      self.invalid_selection(field);
    }
    ok
  }

  pub fn mac_address(&mut self, field: &str, value: &str) -> bool {
    let ok = is_mac_address(value);
    if !ok {
      self.add(
        field,
        format!("The {} field must be a valid MAC address.", label(field)),
      );
    }
    ok
  }

  pub fn confirmed(
    &mut self,
    field: &str,
    value: &str,
    confirmation: Option<&str>,
  ) -> bool {
    let ok = confirmation == Some(value);
    if !ok {
      self.add(
        field,
        format!("The {} field confirmation does not match.", label(field)),
      );
    }
    ok
  }

  /// A uniqueness rule failed against the database.
  pub fn taken(&mut self, field: &str) {
    self.add(field, format!("The {} has already been taken.", label(field)));
  }

  /// A value is outside the allowed set, or references a missing row.
  pub fn invalid_selection(&mut self, field: &str) {
    self.add(field, format!("The selected {} is invalid.", label(field)));
  }
}

fn trim(value: Cow<'_, str>) -> Cow<'_, str> {
  match value {
    Cow::Borrowed(v) => Cow::Borrowed(v.trim()),
    Cow::Owned(v) => Cow::Owned(v.trim().to_owned()),
  }
}

/// Human-readable field name used in messages: `directorate_id` becomes
/// `directorate id`.
fn label(field: &str) -> String { field.replace('_', " ") }

/// Six hex octets separated consistently by `:` or `-`.
fn is_mac_address(value: &str) -> bool {
  let sep = if value.contains(':') { ':' } else { '-' };
  let octets: Vec<&str> = value.split(sep).collect();
  octets.len() == 6
    && octets
      .iter()
      .all(|o| o.len() == 2 && o.chars().all(|c| c.is_ascii_hexdigit()))
}

// ─── Form fields ─────────────────────────────────────────────────────────────

/// A numeric request field. Form-driven clients send numbers as strings, so
/// both `3` and `"3"` are accepted; anything else fails validation rather
/// than deserialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FormInt {
  Int(i64),
  Text(String),
  Other(IgnoredAny),
}

impl FormInt {
  pub fn as_i64(&self) -> Option<i64> {
    match self {
      Self::Int(n) => Some(*n),
      Self::Text(t) => t.trim().parse().ok(),
      Self::Other(_) => None,
    }
  }
}

impl From<i64> for FormInt {
  fn from(n: i64) -> Self { Self::Int(n) }
}

/// A text request field. Numbers are taken in their JSON spelling, so a
/// phone sent as `5551234` reads as `"5551234"`; any other JSON type fails
/// validation rather than deserialisation.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FormText {
  Text(String),
  Int(i64),
  Float(f64),
  Other(IgnoredAny),
}

impl FormText {
  pub fn as_text(&self) -> Option<Cow<'_, str>> {
    match self {
      Self::Text(t) => Some(Cow::Borrowed(t.as_str())),
      Self::Int(n) => Some(Cow::Owned(n.to_string())),
      Self::Float(n) => Some(Cow::Owned(n.to_string())),
      Self::Other(_) => None,
    }
  }
}

impl From<&str> for FormText {
  fn from(s: &str) -> Self { Self::Text(s.to_owned()) }
}

impl From<String> for FormText {
  fn from(s: String) -> Self { Self::Text(s) }
}
