use color_eyre::Result;
use libsql::params;

use super::helpers::query_all;
use super::models::Setting;
use super::Db;

impl Db {
    pub async fn get_settings(&self) -> Result<Vec<Setting>> {
        let conn = self.db.connect()?;
        query_all(&conn, "SELECT key, value FROM settings ORDER BY key", ()).await
    }

    pub async fn upsert_setting(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.db.connect()?;
        conn.execute(
            r#"INSERT INTO settings (key, value, updated_at)
               VALUES (?, ?, datetime('now'))
               ON CONFLICT(key)
               DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at"#,
            params![key, value],
        )
        .await?;

        tracing::info!("setting {key} updated");
        Ok(())
    }
}
