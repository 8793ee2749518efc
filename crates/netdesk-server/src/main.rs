//! netdesk server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`) layered under
//! `NETDESK_*` environment variables, opens the SQLite database, and serves
//! the JSON API over HTTP.
//!
//! # Bootstrapping
//!
//! Reference data (directorates, positions, employment and device types) is
//! loaded from an SQL script, and the first Admin account is created from the
//! command line, since registration itself requires an Admin:
//!
//! ```text
//! cargo run -p netdesk-server --bin server -- --seed reference.sql
//! cargo run -p netdesk-server --bin server -- --create-admin root@example.com --name Root
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use netdesk_core::{
  identity::{ADMIN_ROLE_ID, NewUser, RegisterRequest},
  store::IdentityStore,
};
use netdesk_server::{AppState, ServerConfig, password};
use netdesk_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "netdesk admin backend")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Run an SQL script against the database before serving.
  #[arg(long, value_name = "FILE")]
  seed: Option<PathBuf>,

  /// Create an Admin account with a password read from stdin, then exit.
  #[arg(long, value_name = "EMAIL", requires = "name")]
  create_admin: Option<String>,

  /// Display name for `--create-admin`.
  #[arg(long, requires = "create_admin")]
  name: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    println!("{}", password::hash(&password)?);
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config.as_path()).required(false))
    .add_source(config::Environment::with_prefix("NETDESK"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let database_path = expand_tilde(&server_cfg.database_path);
  let store = SqliteStore::open(&database_path)
    .await
    .with_context(|| format!("failed to open database at {database_path:?}"))?;

  if let Some(script) = &cli.seed {
    let sql = std::fs::read_to_string(script)
      .with_context(|| format!("failed to read {script:?}"))?;
    store
      .run_script(sql)
      .await
      .with_context(|| format!("failed to run {script:?}"))?;
    tracing::info!(script = ?script, "seed script applied");
  }

  if let (Some(email), Some(name)) = (cli.create_admin, cli.name) {
    return create_admin(&store, email, name).await;
  }

  let state = AppState {
    store:  Arc::new(store),
    config: Arc::new(server_cfg.clone()),
  };

  let app = netdesk_server::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Create an Admin account, applying the registration rules.
async fn create_admin(
  store: &SqliteStore,
  email: String,
  name: String,
) -> anyhow::Result<()> {
  let password = read_password()?;
  let registration = RegisterRequest {
    name:                  Some(name.into()),
    email:                 Some(email.into()),
    password:              Some(password.clone().into()),
    password_confirmation: Some(password.into()),
  }
  .validate()
  .map_err(|errors| anyhow::anyhow!("invalid admin account: {errors:?}"))?;

  if store.email_taken(&registration.email, None).await? {
    anyhow::bail!("an account for {} already exists", registration.email);
  }

  let user = store
    .create_user(NewUser {
      name:          registration.name,
      email:         registration.email,
      password_hash: password::hash(&registration.password)?,
      role_id:       ADMIN_ROLE_ID,
    })
    .await
    .context("failed to create admin account")?;

  tracing::info!(user_id = user.id, email = %user.email, "admin account created");
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
