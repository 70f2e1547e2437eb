use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use color_eyre::{eyre::OptionExt, Result};
use libsql::params;
use ulid::Ulid;

use super::helpers::{query_all, query_flag, query_optional};
use super::models::{AuthUser, StudentListItem, UserAdminRow};
use super::Db;
use crate::names;

impl Db {
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        role: &str,
    ) -> Result<i64> {
        let password_hash = hash_password(password)?;
        let conn = self.db.connect()?;

        let user_id = conn
            .query(
                r#"INSERT INTO users (email, password_hash, first_name, last_name, role)
                   VALUES (?, ?, ?, ?, ?) RETURNING id"#,
                params![email, password_hash, first_name, last_name, role],
            )
            .await?
            .next()
            .await?
            .ok_or_eyre("could not get user id")?
            .get::<i64>(0)?;

        tracing::info!("new user created: id={user_id}, email={email}, role={role}");
        Ok(user_id)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<AuthUser>> {
        let conn = self.db.connect()?;
        query_optional(
            &conn,
            r#"SELECT id, email, first_name, last_name, role
               FROM users WHERE email = ? AND is_active = 1"#,
            params![email],
        )
        .await
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        query_flag(&conn, "SELECT 1 FROM users WHERE email = ?", params![email]).await
    }

    pub async fn verify_user_password(&self, email: &str, password: &str) -> Result<bool> {
        let conn = self.db.connect()?;
        let row = conn
            .query(
                "SELECT password_hash FROM users WHERE email = ? AND is_active = 1",
                params![email],
            )
            .await?
            .next()
            .await?;

        match row {
            Some(row) => {
                let stored_hash = row.get::<String>(0)?;
                Ok(verify_password(password, &stored_hash))
            }
            None => Ok(false),
        }
    }

    pub async fn create_session(&self, user_id: i64) -> Result<String> {
        let session = Ulid::new().to_string();
        let conn = self.db.connect()?;

        conn.execute(
            "INSERT INTO sessions (id, user_id) VALUES (?, ?)",
            params![session.clone(), user_id],
        )
        .await?;

        tracing::info!("new session created for user_id={user_id}");
        Ok(session)
    }

    /// Resolve a session cookie to its user. Deactivated accounts resolve to
    /// nothing, which invalidates their outstanding sessions in one place.
    pub async fn get_user_by_session(&self, session_id: &str) -> Result<Option<AuthUser>> {
        let conn = self.db.connect()?;
        query_optional(
            &conn,
            r#"
            SELECT u.id, u.email, u.first_name, u.last_name, u.role
            FROM sessions s
            JOIN users u ON u.id = s.user_id
            WHERE s.id = ? AND u.is_active = 1
            "#,
            params![session_id],
        )
        .await
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        let conn = self.db.connect()?;
        conn.execute("DELETE FROM sessions WHERE id = ?", params![session_id])
            .await?;
        Ok(())
    }

    pub async fn list_students(&self) -> Result<Vec<StudentListItem>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"SELECT id, email, first_name, last_name, created_at
               FROM users
               WHERE role = ? AND is_active = 1
               ORDER BY last_name, first_name"#,
            params![names::ROLE_STUDENT],
        )
        .await
    }

    pub async fn find_student(&self, student_id: i64) -> Result<Option<StudentListItem>> {
        let conn = self.db.connect()?;
        query_optional(
            &conn,
            r#"SELECT id, email, first_name, last_name, created_at
               FROM users
               WHERE id = ? AND role = ? AND is_active = 1"#,
            params![student_id, names::ROLE_STUDENT],
        )
        .await
    }

    pub async fn list_users(&self) -> Result<Vec<UserAdminRow>> {
        let conn = self.db.connect()?;
        query_all(
            &conn,
            r#"SELECT id, email, first_name, last_name, role, is_active, created_at
               FROM users
               ORDER BY created_at DESC, id DESC"#,
            (),
        )
        .await
    }

    /// Flip an account's active flag. Returns the new state, or `None` when
    /// the user does not exist.
    pub async fn toggle_user_active(&self, user_id: i64) -> Result<Option<bool>> {
        let conn = self.db.connect()?;
        let affected = conn
            .execute(
                r#"UPDATE users
                   SET is_active = NOT is_active, updated_at = datetime('now')
                   WHERE id = ?"#,
                params![user_id],
            )
            .await?;

        if affected == 0 {
            return Ok(None);
        }

        let is_active = conn
            .query(
                "SELECT is_active FROM users WHERE id = ?",
                params![user_id],
            )
            .await?
            .next()
            .await?
            .ok_or_eyre("user vanished during toggle")?
            .get::<bool>(0)?;

        tracing::info!("user {user_id} active flag set to {is_active}");
        Ok(Some(is_active))
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| color_eyre::eyre::eyre!("could not hash password: {e}"))?;
    Ok(hash.to_string())
}

fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
