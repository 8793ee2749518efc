//! Integration tests for `SqliteStore` against an in-memory database.

use netdesk_core::{
  identity::{DEFAULT_ROLE_ID, NewUser, ProfileChanges},
  internet_user::{Deletion, InternetUserFields, Status},
  store::{IdentityStore, ProvisioningStore},
};

use crate::SqliteStore;

const REFERENCE_DATA: &str = "
INSERT INTO directorates (id, name, parent_id) VALUES
  (1, 'Finance', NULL),
  (2, 'Payroll', 1);
INSERT INTO positions (id, name) VALUES (1, 'Clerk'), (2, 'Manager');
INSERT INTO employment_types (id, name) VALUES (1, 'Permanent'), (2, 'Contract');
INSERT INTO device_types (id, name) VALUES (2, 'Phone'), (1, 'Laptop');
";

async fn store() -> SqliteStore {
  let s = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  s.run_script(REFERENCE_DATA).await.expect("reference data");
  s
}

fn new_user(email: &str, role_id: i64) -> NewUser {
  NewUser {
    name: "Dana".into(),
    email: email.into(),
    password_hash: "$argon2id$stub".into(),
    role_id,
  }
}

fn fields(username: &str, phone: &str, email: &str) -> InternetUserFields {
  InternetUserFields {
    username:           username.into(),
    status:             Status::Enabled,
    phone:              phone.into(),
    email:              email.into(),
    directorate_id:     2,
    employment_type_id: 1,
    position_id:        1,
    device_limit:       2,
    mac_address:        Some("AA:BB:CC:DD:EE:FF".into()),
    name:               Some("Ada".into()),
    lastname:           Some("Lovelace".into()),
  }
}

// ─── Users ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_user_loads_role() {
  let s = store().await;

  let admin = s.create_user(new_user("admin@example.com", 1)).await.unwrap();
  assert!(admin.is_admin());

  let user = s
    .create_user(new_user("user@example.com", DEFAULT_ROLE_ID))
    .await
    .unwrap();
  assert!(!user.is_admin());
  assert_eq!(user.role.as_ref().map(|r| r.name.as_str()), Some("User"));
}

#[tokio::test]
async fn duplicate_email_is_rejected_by_the_schema() {
  let s = store().await;
  s.create_user(new_user("dup@example.com", 2)).await.unwrap();
  assert!(s.create_user(new_user("dup@example.com", 2)).await.is_err());
  assert!(s.create_user(new_user("Dup@Example.com", 2)).await.is_err());
}

#[tokio::test]
async fn emails_compare_case_insensitively() {
  let s = store().await;
  let user = s.create_user(new_user("dana@example.com", 2)).await.unwrap();

  assert!(s.email_taken("DANA@example.com", None).await.unwrap());
  let creds = s.find_credentials("Dana@Example.com").await.unwrap().unwrap();
  assert_eq!(creds.user.id, user.id);

  s.create_internet_user(fields("ada", "0700000001", "ada@example.com"))
    .await
    .unwrap();
  let errors = s
    .check_internet_user(&fields("grace", "0700000002", "ADA@example.com"), None)
    .await
    .unwrap();
  assert!(errors.contains("email"));
}

#[tokio::test]
async fn find_credentials_returns_hash() {
  let s = store().await;
  let user = s.create_user(new_user("dana@example.com", 2)).await.unwrap();

  let creds = s.find_credentials("dana@example.com").await.unwrap().unwrap();
  assert_eq!(creds.user.id, user.id);
  assert_eq!(creds.password_hash, "$argon2id$stub");

  assert!(s.find_credentials("nobody@example.com").await.unwrap().is_none());
}

#[tokio::test]
async fn email_taken_honours_exception() {
  let s = store().await;
  let user = s.create_user(new_user("dana@example.com", 2)).await.unwrap();

  assert!(s.email_taken("dana@example.com", None).await.unwrap());
  assert!(!s.email_taken("dana@example.com", Some(user.id)).await.unwrap());
  assert!(!s.email_taken("free@example.com", None).await.unwrap());
}

#[tokio::test]
async fn update_user_keeps_password_when_absent() {
  let s = store().await;
  let user = s.create_user(new_user("dana@example.com", 2)).await.unwrap();

  let updated = s
    .update_user(user.id, ProfileChanges {
      name:          "Dana Scully".into(),
      email:         "scully@example.com".into(),
      password_hash: None,
    })
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.name, "Dana Scully");
  assert_eq!(updated.email, "scully@example.com");

  let creds = s.find_credentials("scully@example.com").await.unwrap().unwrap();
  assert_eq!(creds.password_hash, "$argon2id$stub");

  s.update_user(user.id, ProfileChanges {
    name:          "Dana Scully".into(),
    email:         "scully@example.com".into(),
    password_hash: Some("$argon2id$new".into()),
  })
  .await
  .unwrap();
  let creds = s.find_credentials("scully@example.com").await.unwrap().unwrap();
  assert_eq!(creds.password_hash, "$argon2id$new");
}

#[tokio::test]
async fn update_missing_user_returns_none() {
  let s = store().await;
  let result = s
    .update_user(42, ProfileChanges {
      name:          "Ghost".into(),
      email:         "ghost@example.com".into(),
      password_hash: None,
    })
    .await
    .unwrap();
  assert!(result.is_none());
}

// ─── Tokens ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn token_lookup_and_revocation() {
  let s = store().await;
  let user = s.create_user(new_user("dana@example.com", 2)).await.unwrap();

  let first = s
    .issue_token(user.id, "auth_token".into(), "hash-1".into())
    .await
    .unwrap();
  let second = s
    .issue_token(user.id, "auth_token".into(), "hash-2".into())
    .await
    .unwrap();

  let found = s.find_token("hash-1".into()).await.unwrap().unwrap();
  assert_eq!(found.token_id, first);
  assert_eq!(found.user.id, user.id);

  assert!(s.revoke_token(first).await.unwrap());
  assert!(!s.revoke_token(first).await.unwrap());
  assert!(s.find_token("hash-1".into()).await.unwrap().is_none());

  // Revoking one token leaves the user's other tokens alone.
  let still = s.find_token("hash-2".into()).await.unwrap().unwrap();
  assert_eq!(still.token_id, second);
}

#[tokio::test]
async fn unknown_token_is_none() {
  let s = store().await;
  assert!(s.find_token("nope".into()).await.unwrap().is_none());
}

// ─── Internet users ──────────────────────────────────────────────────────────

#[tokio::test]
async fn create_writes_person_and_internet_user() {
  let s = store().await;

  let created = s
    .create_internet_user(fields("ada", "0700000001", "ada@example.com"))
    .await
    .unwrap();
  assert_eq!(created.username, "ada");
  assert_eq!(created.status, Status::Enabled);
  assert_eq!(created.phone, "0700000001");
  assert_eq!(created.directorate_id, 2);

  let detail = s.get_internet_user(created.id).await.unwrap().unwrap();
  assert_eq!(detail.internet_user, created);
  assert_eq!(detail.person.person.id, created.person_id);
  assert_eq!(detail.person.person.email, "ada@example.com");
  assert_eq!(detail.person.person.phone, "0700000001");
  assert_eq!(detail.person.directorate.as_ref().unwrap().name, "Payroll");
  assert_eq!(detail.person.position.as_ref().unwrap().name, "Clerk");
  assert_eq!(detail.person.employment_type.as_ref().unwrap().name, "Permanent");
}

#[tokio::test]
async fn get_missing_internet_user_returns_none() {
  let s = store().await;
  assert!(s.get_internet_user(99).await.unwrap().is_none());
}

#[tokio::test]
async fn list_rows_carry_parent_directorate_and_violation_count() {
  let s = store().await;
  let ada = s
    .create_internet_user(fields("ada", "0700000001", "ada@example.com"))
    .await
    .unwrap();
  let mut top = fields("grace", "0700000002", "grace@example.com");
  top.directorate_id = 1;
  top.status = Status::Disabled;
  let grace = s.create_internet_user(top).await.unwrap();

  s.run_script(format!(
    "INSERT INTO violations (internet_user_id, description, created_at) VALUES
       ({id}, 'p2p', '2024-01-01T00:00:00+00:00'),
       ({id}, 'spam', '2024-01-02T00:00:00+00:00');",
    id = ada.id
  ))
  .await
  .unwrap();

  let rows = s.list_internet_users().await.unwrap();
  assert_eq!(rows.len(), 2);

  assert_eq!(rows[0].id, ada.id);
  assert_eq!(rows[0].directorate, "Payroll");
  assert_eq!(rows[0].deputy.as_deref(), Some("Finance"));
  assert_eq!(rows[0].count, 2);
  assert_eq!(rows[0].name.as_deref(), Some("Ada"));

  assert_eq!(rows[1].id, grace.id);
  assert_eq!(rows[1].directorate, "Finance");
  assert_eq!(rows[1].deputy, None);
  assert_eq!(rows[1].count, 0);
  assert_eq!(rows[1].status, Status::Disabled);
}

#[tokio::test]
async fn empty_list() {
  let s = store().await;
  assert!(s.list_internet_users().await.unwrap().is_empty());
}

#[tokio::test]
async fn update_rewrites_both_rows() {
  let s = store().await;
  let created = s
    .create_internet_user(fields("ada", "0700000001", "ada@example.com"))
    .await
    .unwrap();

  let mut changed = fields("ada.l", "0700000009", "ada.l@example.com");
  changed.device_limit = 5;
  changed.mac_address = None;
  let updated = s
    .update_internet_user(created.id, changed)
    .await
    .unwrap()
    .unwrap();
  assert_eq!(updated.id, created.id);
  assert_eq!(updated.person_id, created.person_id);
  assert_eq!(updated.username, "ada.l");
  assert_eq!(updated.phone, "0700000009");
  assert_eq!(updated.device_limit, 5);
  assert_eq!(updated.mac_address, None);

  let detail = s.get_internet_user(created.id).await.unwrap().unwrap();
  assert_eq!(detail.person.person.phone, "0700000009");
  assert_eq!(detail.person.person.email, "ada.l@example.com");
}

#[tokio::test]
async fn update_missing_internet_user_returns_none() {
  let s = store().await;
  let result = s
    .update_internet_user(7, fields("x", "1", "x@example.com"))
    .await
    .unwrap();
  assert!(result.is_none());
}

#[tokio::test]
async fn delete_removes_both_rows() {
  let s = store().await;
  let created = s
    .create_internet_user(fields("ada", "0700000001", "ada@example.com"))
    .await
    .unwrap();

  assert_eq!(s.delete_internet_user(created.id).await.unwrap(), Deletion::Deleted);
  assert!(s.get_internet_user(created.id).await.unwrap().is_none());
  assert_eq!(s.delete_internet_user(created.id).await.unwrap(), Deletion::NotFound);

  // The person's phone and email are free again.
  let errors = s
    .check_internet_user(&fields("ada", "0700000001", "ada@example.com"), None)
    .await
    .unwrap();
  assert!(errors.is_empty(), "{errors:?}");
}

// ─── Atomicity ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn failed_create_leaves_no_person_behind() {
  let s = store().await;
  s.run_script(
    "CREATE TRIGGER block_internet_users BEFORE INSERT ON internet_users
     BEGIN SELECT RAISE(ABORT, 'locked'); END;",
  )
  .await
  .unwrap();

  let result = s
    .create_internet_user(fields("ada", "0700000001", "ada@example.com"))
    .await;
  assert!(result.is_err());

  let errors = s
    .check_internet_user(&fields("ada", "0700000001", "ada@example.com"), None)
    .await
    .unwrap();
  assert!(!errors.contains("phone"));
  assert!(!errors.contains("email"));
}

#[tokio::test]
async fn failed_update_leaves_person_unchanged() {
  let s = store().await;
  let created = s
    .create_internet_user(fields("ada", "0700000001", "ada@example.com"))
    .await
    .unwrap();
  s.run_script(
    "CREATE TRIGGER block_updates BEFORE UPDATE ON internet_users
     BEGIN SELECT RAISE(ABORT, 'locked'); END;",
  )
  .await
  .unwrap();

  let result = s
    .update_internet_user(
      created.id,
      fields("ada", "0700000009", "changed@example.com"),
    )
    .await;
  assert!(result.is_err());

  let detail = s.get_internet_user(created.id).await.unwrap().unwrap();
  assert_eq!(detail.person.person.phone, "0700000001");
  assert_eq!(detail.person.person.email, "ada@example.com");
}

#[tokio::test]
async fn failed_delete_keeps_both_rows() {
  let s = store().await;
  let created = s
    .create_internet_user(fields("ada", "0700000001", "ada@example.com"))
    .await
    .unwrap();
  s.run_script(
    "CREATE TRIGGER block_person_delete BEFORE DELETE ON persons
     BEGIN SELECT RAISE(ABORT, 'locked'); END;",
  )
  .await
  .unwrap();

  assert!(s.delete_internet_user(created.id).await.is_err());

  let detail = s.get_internet_user(created.id).await.unwrap();
  assert!(detail.is_some());
}

#[tokio::test]
async fn delete_refused_while_violations_exist() {
  let s = store().await;
  let created = s
    .create_internet_user(fields("ada", "0700000001", "ada@example.com"))
    .await
    .unwrap();
  s.run_script(format!(
    "INSERT INTO violations (internet_user_id, description, created_at)
     VALUES ({}, 'p2p', '2024-01-01T00:00:00+00:00');",
    created.id
  ))
  .await
  .unwrap();

  assert_eq!(
    s.delete_internet_user(created.id).await.unwrap(),
    Deletion::HasViolations(1)
  );
  assert!(s.get_internet_user(created.id).await.unwrap().is_some());

  // Once the violations are cleared the pair can go.
  s.run_script(format!(
    "DELETE FROM violations WHERE internet_user_id = {};",
    created.id
  ))
  .await
  .unwrap();
  assert_eq!(s.delete_internet_user(created.id).await.unwrap(), Deletion::Deleted);
}

// ─── Database-backed validation ──────────────────────────────────────────────

#[tokio::test]
async fn check_reports_taken_values() {
  let s = store().await;
  s.create_internet_user(fields("ada", "0700000001", "ada@example.com"))
    .await
    .unwrap();

  let errors = s
    .check_internet_user(&fields("ada", "0700000001", "ada@example.com"), None)
    .await
    .unwrap();
  assert_eq!(
    errors.get("username").unwrap(),
    ["The username has already been taken."]
  );
  assert!(errors.contains("phone"));
  assert!(errors.contains("email"));
}

#[tokio::test]
async fn check_ignores_the_record_being_updated() {
  let s = store().await;
  let ada = s
    .create_internet_user(fields("ada", "0700000001", "ada@example.com"))
    .await
    .unwrap();
  let grace = s
    .create_internet_user(fields("grace", "0700000002", "grace@example.com"))
    .await
    .unwrap();

  let own = s
    .check_internet_user(
      &fields("ada", "0700000001", "ada@example.com"),
      Some(ada.id),
    )
    .await
    .unwrap();
  assert!(own.is_empty(), "{own:?}");

  let stolen = s
    .check_internet_user(
      &fields("ada", "0700000001", "ada@example.com"),
      Some(grace.id),
    )
    .await
    .unwrap();
  assert!(stolen.contains("username"));
  assert!(stolen.contains("phone"));
  assert!(stolen.contains("email"));
}

#[tokio::test]
async fn check_reports_missing_references() {
  let s = store().await;
  let mut bad = fields("ada", "0700000001", "ada@example.com");
  bad.directorate_id = 40;
  bad.employment_type_id = 41;
  bad.position_id = 42;

  let errors = s.check_internet_user(&bad, None).await.unwrap();
  assert_eq!(
    errors.get("directorate_id").unwrap(),
    ["The selected directorate id is invalid."]
  );
  assert!(errors.contains("employee_type_id"));
  assert!(errors.contains("position"));
  assert!(!errors.contains("username"));
}

// ─── Device types ────────────────────────────────────────────────────────────

#[tokio::test]
async fn device_types_are_ordered_by_id() {
  let s = store().await;
  let types = s.list_device_types().await.unwrap();
  let names: Vec<_> = types.iter().map(|t| t.name.as_str()).collect();
  assert_eq!(names, ["Laptop", "Phone"]);
}
