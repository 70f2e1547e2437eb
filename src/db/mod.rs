// Database module - provides data access layer

use color_eyre::{eyre::OptionExt, Result};
use std::sync::Arc;

// Re-export models for convenience
pub mod models;
pub use models::*;

// Internal modules
mod analysis;
mod attempt;
mod class;
mod helpers;
mod passage;
mod progress;
mod schema;
mod settings;
mod user;

pub use attempt::{AttemptMeta, RecordError};

// Main database handle
#[derive(Clone)]
pub struct Db {
    db: Arc<libsql::Database>,
}

impl Db {
    pub async fn new(url: String, auth_token: String) -> Result<Self> {
        let is_local = url.starts_with("file:");
        let db = if is_local {
            // Local SQLite file
            let path = url.strip_prefix("file:").unwrap_or(&url);
            libsql::Builder::new_local(path).build().await?
        } else {
            // Remote Turso database
            libsql::Builder::new_remote(url.to_owned(), auth_token)
                .build()
                .await?
        };

        let conn = db.connect()?;

        // WAL keeps reads from blocking on attempt writes. The mode is
        // persistent, so setting it once at startup covers every connection.
        // Remote servers manage their own journal mode.
        if is_local {
            conn.query("PRAGMA journal_mode = WAL", ()).await?;
        }

        // Verify connection
        let one = conn
            .query("SELECT 1", ())
            .await?
            .next()
            .await?
            .ok_or_eyre("connection check failed")?
            .get::<i32>(0)?;
        assert_eq!(one, 1);

        // Initialize schema
        schema::create_schema(&conn).await?;

        tracing::info!("database connection has been verified");

        Ok(Self { db: Arc::new(db) })
    }
}
