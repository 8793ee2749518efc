//! [`IdentityStore`] implementation: accounts and bearer tokens.

use chrono::Utc;
use netdesk_core::{
  identity::{AccessToken, Credentials, NewUser, ProfileChanges, User},
  store::IdentityStore,
};
use rusqlite::{Connection, OptionalExtension as _};

use crate::{
  Error, Result, SqliteStore,
  encode::{RawUser, USER_COLUMNS, USER_COLUMN_COUNT, encode_dt},
};

fn select_user(conn: &Connection, id: i64) -> rusqlite::Result<Option<RawUser>> {
  conn
    .query_row(
      &format!(
        "SELECT {USER_COLUMNS}
         FROM users u LEFT JOIN roles r ON r.id = u.role_id
         WHERE u.id = ?1"
      ),
      rusqlite::params![id],
      |row| RawUser::read(row, 0),
    )
    .optional()
}

impl IdentityStore for SqliteStore {
  type Error = Error;

  async fn find_credentials(&self, email: &str) -> Result<Option<Credentials>> {
    let email = email.to_owned();

    let raw: Option<(RawUser, String)> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {USER_COLUMNS}, u.password_hash
                 FROM users u LEFT JOIN roles r ON r.id = u.role_id
                 WHERE u.email = ?1 COLLATE NOCASE"
              ),
              rusqlite::params![email],
              |row| Ok((RawUser::read(row, 0)?, row.get(USER_COLUMN_COUNT)?)),
            )
            .optional()?,
        )
      })
      .await?;

    raw
      .map(|(user, password_hash)| -> Result<Credentials> {
        Ok(Credentials { user: user.into_user()?, password_hash })
      })
      .transpose()
  }

  async fn get_user(&self, id: i64) -> Result<Option<User>> {
    let raw = self
      .conn
      .call(move |conn| Ok(select_user(conn, id)?))
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn email_taken(&self, email: &str, except: Option<i64>) -> Result<bool> {
    let email = email.to_owned();

    let taken = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM users
               WHERE email = ?1 COLLATE NOCASE AND (?2 IS NULL OR id != ?2)",
              rusqlite::params![email, except],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;

    Ok(taken)
  }

  async fn create_user(&self, input: NewUser) -> Result<User> {
    let now = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (name, email, password_hash, role_id, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![
            input.name,
            input.email,
            input.password_hash,
            input.role_id,
            now,
          ],
        )?;
        let raw = select_user(&tx, tx.last_insert_rowid())?
          .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.into_user()
  }

  async fn update_user(
    &self,
    id: i64,
    changes: ProfileChanges,
  ) -> Result<Option<User>> {
    let now = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE users
           SET name = ?2,
               email = ?3,
               password_hash = COALESCE(?4, password_hash),
               updated_at = ?5
           WHERE id = ?1",
          rusqlite::params![
            id,
            changes.name,
            changes.email,
            changes.password_hash,
            now,
          ],
        )?;
        if updated == 0 {
          return Ok(None);
        }
        let raw = select_user(&tx, id)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn issue_token(
    &self,
    user_id: i64,
    name: String,
    token_hash: String,
  ) -> Result<i64> {
    let now = encode_dt(Utc::now());

    let id = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO access_tokens (user_id, name, token_hash, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![user_id, name, token_hash, now],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(id)
  }

  async fn find_token(&self, token_hash: String) -> Result<Option<AccessToken>> {
    let now = encode_dt(Utc::now());

    let raw: Option<(i64, RawUser)> = self
      .conn
      .call(move |conn| {
        let found = conn
          .query_row(
            &format!(
              "SELECT t.id, {USER_COLUMNS}
               FROM access_tokens t
               JOIN users u ON u.id = t.user_id
               LEFT JOIN roles r ON r.id = u.role_id
               WHERE t.token_hash = ?1"
            ),
            rusqlite::params![token_hash],
            |row| Ok((row.get(0)?, RawUser::read(row, 1)?)),
          )
          .optional()?;

        if let Some((token_id, _)) = &found {
          conn.execute(
            "UPDATE access_tokens SET last_used_at = ?2 WHERE id = ?1",
            rusqlite::params![token_id, now],
          )?;
        }
        Ok(found)
      })
      .await?;

    raw
      .map(|(token_id, user)| -> Result<AccessToken> {
        Ok(AccessToken { token_id, user: user.into_user()? })
      })
      .transpose()
  }

  async fn revoke_token(&self, token_id: i64) -> Result<bool> {
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM access_tokens WHERE id = ?1",
          rusqlite::params![token_id],
        )?)
      })
      .await?;

    Ok(deleted > 0)
  }
}
