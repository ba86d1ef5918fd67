use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &corpus_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		// Line comments are dropped so a comment cannot swallow the statement
		// that follows it after splitting on ';'.
		let sql = schema::render_schema()
			.lines()
			.filter(|line| !line.trim_start().starts_with("--"))
			.collect::<Vec<_>>()
			.join("\n");
		let lock_id: i64 = 6_360_312;
		// Advisory locks are held per connection. A single transaction scopes the
		// lock to one connection and releases it when the transaction ends.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)").bind(lock_id).execute(&mut *tx).await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		Ok(())
	}
}
