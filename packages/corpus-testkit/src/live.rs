//! Helpers for the `#[ignore]`d integration tests that talk to a real
//! Postgres or Qdrant. Gated on `CORPUS_PG_DSN` / `CORPUS_QDRANT_URL` so the
//! default test run stays hermetic.

use std::{env, str::FromStr};

use color_eyre::{Result, eyre};
use sqlx::{
	ConnectOptions, Connection, Executor,
	postgres::{PgConnectOptions, PgConnection},
};
use uuid::Uuid;

const ADMIN_DATABASES: [&str; 2] = ["postgres", "template1"];

pub fn env_dsn() -> Option<String> {
	env::var("CORPUS_PG_DSN").ok()
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("CORPUS_QDRANT_URL").ok()
}

/// Unique collection name for one live Qdrant test, so parallel runs never
/// step on each other. The caller deletes the collection when done.
pub fn scratch_collection(prefix: &str) -> String {
	format!("{prefix}_{}", Uuid::new_v4().simple())
}

/// A freshly created, uniquely named database on the server behind
/// `CORPUS_PG_DSN`. Call [`TestDatabase::cleanup`] at the end of the test;
/// a leaked instance only prints a reminder, it never blocks the run.
pub struct TestDatabase {
	name: String,
	dsn: String,
	admin_options: PgConnectOptions,
	cleaned: bool,
}
impl TestDatabase {
	pub async fn new(base_dsn: &str) -> Result<Self> {
		let base_options = PgConnectOptions::from_str(base_dsn)
			.map_err(|err| eyre::eyre!("Failed to parse CORPUS_PG_DSN: {err}."))?;
		let (admin_options, mut admin_conn) = connect_admin(&base_options).await?;
		let name = format!("corpus_test_{}", Uuid::new_v4().simple());

		admin_conn
			.execute(format!(r#"CREATE DATABASE "{name}""#).as_str())
			.await
			.map_err(|err| eyre::eyre!("Failed to create test database: {err}."))?;

		let dsn = base_options.database(&name).to_url_lossy().to_string();

		Ok(Self { name, dsn, admin_options, cleaned: false })
	}

	pub fn dsn(&self) -> &str {
		&self.dsn
	}

	pub async fn cleanup(mut self) -> Result<()> {
		let mut admin_conn = PgConnection::connect_with(&self.admin_options)
			.await
			.map_err(|err| eyre::eyre!("Failed to reconnect for test database cleanup: {err}."))?;

		// Lingering pool connections would otherwise block the drop.
		let _ = sqlx::query(
			"\
SELECT pg_terminate_backend(pid)
FROM pg_stat_activity
WHERE datname = $1 AND pid <> pg_backend_pid()",
		)
		.bind(&self.name)
		.fetch_all(&mut admin_conn)
		.await;

		sqlx::query(format!(r#"DROP DATABASE IF EXISTS "{}""#, self.name).as_str())
			.execute(&mut admin_conn)
			.await
			.map_err(|err| eyre::eyre!("Failed to drop test database: {err}."))?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestDatabase {
	fn drop(&mut self) {
		if !self.cleaned {
			eprintln!("Test database {} was not cleaned up; drop it manually.", self.name);
		}
	}
}

async fn connect_admin(
	base_options: &PgConnectOptions,
) -> Result<(PgConnectOptions, PgConnection)> {
	let mut last_err = None;

	for database in ADMIN_DATABASES {
		let options = base_options.clone().database(database);

		match PgConnection::connect_with(&options).await {
			Ok(conn) => return Ok((options, conn)),
			Err(err) => last_err = Some(err),
		}
	}

	Err(eyre::eyre!("Failed to connect to an admin database: {last_err:?}."))
}
