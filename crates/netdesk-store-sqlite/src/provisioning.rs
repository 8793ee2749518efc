//! [`ProvisioningStore`] implementation: persons and their internet users.
//!
//! Each write opens one transaction and touches both rows. Any `?` that
//! fires before `commit` drops the transaction, which rolls it back, so the
//! pair is never left half-written.

use chrono::Utc;
use netdesk_core::{
  FieldErrors,
  directory::{DeviceType, Directorate, EmploymentType, Position},
  internet_user::{
    Deletion, InternetUser, InternetUserDetail, InternetUserFields,
    InternetUserRow,
  },
  store::ProvisioningStore,
};
use rusqlite::{Connection, OptionalExtension as _, ToSql};

use crate::{
  Error, Result, SqliteStore,
  encode::{
    INTERNET_USER_COLUMNS, INTERNET_USER_COLUMN_COUNT, PERSON_COLUMNS,
    PERSON_COLUMN_COUNT, RawInternetUser, RawInternetUserDetail,
    RawInternetUserRow, RawPerson, encode_dt, encode_status,
  },
};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn exists(
  conn: &Connection,
  sql: &str,
  params: &[&dyn ToSql],
) -> rusqlite::Result<bool> {
  Ok(conn.query_row(sql, params, |_| Ok(true)).optional()?.unwrap_or(false))
}

fn person_id_of(
  conn: &Connection,
  internet_user_id: i64,
) -> rusqlite::Result<Option<i64>> {
  conn
    .query_row(
      "SELECT person_id FROM internet_users WHERE id = ?1",
      rusqlite::params![internet_user_id],
      |row| row.get(0),
    )
    .optional()
}

fn select_internet_user(
  conn: &Connection,
  id: i64,
) -> rusqlite::Result<Option<RawInternetUser>> {
  conn
    .query_row(
      &format!("SELECT {INTERNET_USER_COLUMNS} FROM internet_users iu WHERE iu.id = ?1"),
      rusqlite::params![id],
      |row| RawInternetUser::read(row, 0),
    )
    .optional()
}

/// Reload a row written earlier in the same transaction.
fn reload_internet_user(
  conn: &Connection,
  id: i64,
) -> rusqlite::Result<RawInternetUser> {
  select_internet_user(conn, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
}

/// Column values shared by the person INSERT and UPDATE statements.
struct PersonColumns {
  name:               Option<String>,
  lastname:           Option<String>,
  email:              String,
  phone:              String,
  directorate_id:     i64,
  position_id:        i64,
  employment_type_id: i64,
}

/// Column values shared by the internet-user INSERT and UPDATE statements.
struct InternetUserColumns {
  username:       String,
  status:         i64,
  phone:          String,
  directorate_id: i64,
  device_limit:   i64,
  mac_address:    Option<String>,
}

fn split_fields(fields: InternetUserFields) -> (PersonColumns, InternetUserColumns) {
  let person = PersonColumns {
    name:               fields.name,
    lastname:           fields.lastname,
    email:              fields.email,
    phone:              fields.phone.clone(),
    directorate_id:     fields.directorate_id,
    position_id:        fields.position_id,
    employment_type_id: fields.employment_type_id,
  };
  let internet_user = InternetUserColumns {
    username:       fields.username,
    status:         encode_status(fields.status),
    phone:          fields.phone,
    directorate_id: fields.directorate_id,
    device_limit:   fields.device_limit,
    mac_address:    fields.mac_address,
  };
  (person, internet_user)
}

// ─── ProvisioningStore impl ──────────────────────────────────────────────────

impl ProvisioningStore for SqliteStore {
  type Error = Error;

  async fn list_internet_users(&self) -> Result<Vec<InternetUserRow>> {
    let raws: Vec<RawInternetUserRow> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT
             iu.id, p.name, p.lastname, iu.username, p.phone,
             d.name      AS directorate,
             iu.status,
             COUNT(v.id) AS count,
             parent.name AS deputy
           FROM internet_users iu
           JOIN persons p            ON p.id = iu.person_id
           JOIN directorates d       ON d.id = p.directorate_id
           LEFT JOIN directorates parent ON parent.id = d.parent_id
           LEFT JOIN violations v    ON v.internet_user_id = iu.id
           GROUP BY
             iu.id, p.name, p.lastname, iu.username, p.phone,
             p.directorate_id, iu.status, d.name, parent.name
           ORDER BY iu.id",
        )?;

        let rows = stmt
          .query_map([], |row| {
            Ok(RawInternetUserRow {
              id:          row.get(0)?,
              name:        row.get(1)?,
              lastname:    row.get(2)?,
              username:    row.get(3)?,
              phone:       row.get(4)?,
              directorate: row.get(5)?,
              status:      row.get(6)?,
              count:       row.get(7)?,
              deputy:      row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawInternetUserRow::into_row).collect()
  }

  async fn get_internet_user(&self, id: i64) -> Result<Option<InternetUserDetail>> {
    let raw: Option<RawInternetUserDetail> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {INTERNET_USER_COLUMNS}, {PERSON_COLUMNS},
                   d.id, d.name, d.parent_id,
                   pos.id, pos.name,
                   et.id, et.name
                 FROM internet_users iu
                 JOIN persons p                  ON p.id = iu.person_id
                 LEFT JOIN directorates d        ON d.id = p.directorate_id
                 LEFT JOIN positions pos         ON pos.id = p.position_id
                 LEFT JOIN employment_types et   ON et.id = p.employment_type_id
                 WHERE iu.id = ?1"
              ),
              rusqlite::params![id],
              |row| {
                let at = INTERNET_USER_COLUMN_COUNT + PERSON_COLUMN_COUNT;
                let directorate: (Option<i64>, Option<String>) =
                  (row.get(at)?, row.get(at + 1)?);
                let position: (Option<i64>, Option<String>) =
                  (row.get(at + 3)?, row.get(at + 4)?);
                let employment_type: (Option<i64>, Option<String>) =
                  (row.get(at + 5)?, row.get(at + 6)?);
                let directorate = match directorate {
                  (Some(id), Some(name)) => Some(Directorate {
                    id,
                    name,
                    parent_id: row.get(at + 2)?,
                  }),
                  _ => None,
                };
                let position = match position {
                  (Some(id), Some(name)) => Some(Position { id, name }),
                  _ => None,
                };
                let employment_type = match employment_type {
                  (Some(id), Some(name)) => Some(EmploymentType { id, name }),
                  _ => None,
                };
                Ok(RawInternetUserDetail {
                  internet_user: RawInternetUser::read(row, 0)?,
                  person: RawPerson::read(row, INTERNET_USER_COLUMN_COUNT)?,
                  directorate,
                  position,
                  employment_type,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawInternetUserDetail::into_detail).transpose()
  }

  async fn check_internet_user(
    &self,
    fields: &InternetUserFields,
    current: Option<i64>,
  ) -> Result<FieldErrors> {
    let username           = fields.username.clone();
    let phone              = fields.phone.clone();
    let email              = fields.email.clone();
    let directorate_id     = fields.directorate_id;
    let position_id        = fields.position_id;
    let employment_type_id = fields.employment_type_id;

    let errors = self
      .conn
      .call(move |conn| {
        let mut errors = FieldErrors::new();
        let person = match current {
          Some(id) => person_id_of(conn, id)?,
          None => None,
        };

        if exists(
          conn,
          "SELECT 1 FROM internet_users WHERE username = ?1 AND (?2 IS NULL OR id != ?2)",
          &[&username, &current],
        )? {
          errors.taken("username");
        }
        if exists(
          conn,
          "SELECT 1 FROM persons WHERE phone = ?1 AND (?2 IS NULL OR id != ?2)",
          &[&phone, &person],
        )? {
          errors.taken("phone");
        }
        if exists(
          conn,
          "SELECT 1 FROM persons
           WHERE email = ?1 COLLATE NOCASE AND (?2 IS NULL OR id != ?2)",
          &[&email, &person],
        )? {
          errors.taken("email");
        }

        if !exists(conn, "SELECT 1 FROM directorates WHERE id = ?1", &[&directorate_id])? {
          errors.invalid_selection("directorate_id");
        }
        if !exists(
          conn,
          "SELECT 1 FROM employment_types WHERE id = ?1",
          &[&employment_type_id],
        )? {
          errors.invalid_selection("employee_type_id");
        }
        if !exists(conn, "SELECT 1 FROM positions WHERE id = ?1", &[&position_id])? {
          errors.invalid_selection("position");
        }

        Ok(errors)
      })
      .await?;

    Ok(errors)
  }

  async fn create_internet_user(
    &self,
    fields: InternetUserFields,
  ) -> Result<InternetUser> {
    let now = encode_dt(Utc::now());
    let (person, account) = split_fields(fields);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        tx.execute(
          "INSERT INTO persons (
             name, lastname, email, phone,
             directorate_id, position_id, employment_type_id,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            person.name,
            person.lastname,
            person.email,
            person.phone,
            person.directorate_id,
            person.position_id,
            person.employment_type_id,
            now,
          ],
        )?;
        let person_id = tx.last_insert_rowid();

        tx.execute(
          "INSERT INTO internet_users (
             person_id, username, status, phone,
             directorate_id, device_limit, mac_address,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            person_id,
            account.username,
            account.status,
            account.phone,
            account.directorate_id,
            account.device_limit,
            account.mac_address,
            now,
          ],
        )?;

        let raw = reload_internet_user(&tx, tx.last_insert_rowid())?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_internet_user()
  }

  async fn update_internet_user(
    &self,
    id: i64,
    fields: InternetUserFields,
  ) -> Result<Option<InternetUser>> {
    let now = encode_dt(Utc::now());
    let (person, account) = split_fields(fields);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(person_id) = person_id_of(&tx, id)? else {
          return Ok(None);
        };

        tx.execute(
          "UPDATE persons
           SET name = ?2, lastname = ?3, email = ?4, phone = ?5,
               directorate_id = ?6, position_id = ?7, employment_type_id = ?8,
               updated_at = ?9
           WHERE id = ?1",
          rusqlite::params![
            person_id,
            person.name,
            person.lastname,
            person.email,
            person.phone,
            person.directorate_id,
            person.position_id,
            person.employment_type_id,
            now,
          ],
        )?;

        tx.execute(
          "UPDATE internet_users
           SET username = ?2, status = ?3, phone = ?4, directorate_id = ?5,
               device_limit = ?6, mac_address = ?7, updated_at = ?8
           WHERE id = ?1",
          rusqlite::params![
            id,
            account.username,
            account.status,
            account.phone,
            account.directorate_id,
            account.device_limit,
            account.mac_address,
            now,
          ],
        )?;

        let raw = reload_internet_user(&tx, id)?;
        tx.commit()?;
        Ok(Some(raw))
      })
      .await?;

    raw.map(RawInternetUser::into_internet_user).transpose()
  }

  async fn delete_internet_user(&self, id: i64) -> Result<Deletion> {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let Some(person_id) = person_id_of(&tx, id)? else {
          return Ok(Deletion::NotFound);
        };

        let violations: i64 = tx.query_row(
          "SELECT COUNT(*) FROM violations WHERE internet_user_id = ?1",
          rusqlite::params![id],
          |row| row.get(0),
        )?;
        if violations > 0 {
          return Ok(Deletion::HasViolations(violations));
        }

        tx.execute("DELETE FROM internet_users WHERE id = ?1", rusqlite::params![id])?;
        tx.execute("DELETE FROM persons WHERE id = ?1", rusqlite::params![person_id])?;

        tx.commit()?;
        Ok(Deletion::Deleted)
      })
      .await?;

    Ok(outcome)
  }

  async fn list_device_types(&self) -> Result<Vec<DeviceType>> {
    let types = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare("SELECT id, name FROM device_types ORDER BY id")?;
        let rows = stmt
          .query_map([], |row| Ok(DeviceType { id: row.get(0)?, name: row.get(1)? }))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(types)
  }
}
