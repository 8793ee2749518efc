//! SQL schema for the netdesk SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS` and
/// `INSERT OR IGNORE`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS roles (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL UNIQUE
);

INSERT OR IGNORE INTO roles (id, name) VALUES (1, 'Admin'), (2, 'User');

CREATE TABLE IF NOT EXISTS users (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    email          TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash  TEXT NOT NULL,      -- argon2 PHC string
    role_id        INTEGER REFERENCES roles(id),
    created_at     TEXT NOT NULL,
    updated_at     TEXT NOT NULL
);

-- Only the SHA-256 of each token secret is stored.
CREATE TABLE IF NOT EXISTS access_tokens (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id       INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    name          TEXT NOT NULL,
    token_hash    TEXT NOT NULL UNIQUE,
    last_used_at  TEXT,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS directorates (
    id         INTEGER PRIMARY KEY,
    name       TEXT NOT NULL,
    parent_id  INTEGER REFERENCES directorates(id)
);

CREATE TABLE IF NOT EXISTS positions (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS employment_types (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS device_types (
    id    INTEGER PRIMARY KEY,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS persons (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    name                TEXT,
    lastname            TEXT,
    email               TEXT NOT NULL UNIQUE COLLATE NOCASE,
    phone               TEXT NOT NULL UNIQUE,
    directorate_id      INTEGER NOT NULL REFERENCES directorates(id),
    position_id         INTEGER NOT NULL REFERENCES positions(id),
    employment_type_id  INTEGER NOT NULL REFERENCES employment_types(id),
    created_at          TEXT NOT NULL,
    updated_at          TEXT NOT NULL
);

-- Deleted together with its person by the store, not by a cascade.
CREATE TABLE IF NOT EXISTS internet_users (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    person_id       INTEGER NOT NULL REFERENCES persons(id),
    username        TEXT NOT NULL UNIQUE,
    status          INTEGER NOT NULL CHECK (status IN (0, 1)),
    phone           TEXT NOT NULL,     -- copy of persons.phone
    directorate_id  INTEGER NOT NULL REFERENCES directorates(id),
    device_limit    INTEGER NOT NULL CHECK (device_limit >= 1),
    mac_address     TEXT,
    created_at      TEXT NOT NULL,
    updated_at      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS violations (
    id                INTEGER PRIMARY KEY AUTOINCREMENT,
    internet_user_id  INTEGER NOT NULL REFERENCES internet_users(id),
    description       TEXT,
    created_at        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS access_tokens_user_idx    ON access_tokens(user_id);
CREATE INDEX IF NOT EXISTS internet_users_person_idx ON internet_users(person_id);
CREATE INDEX IF NOT EXISTS violations_user_idx       ON violations(internet_user_id);

PRAGMA user_version = 1;
";
