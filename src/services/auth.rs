use std::future::Future;

use color_eyre::Result;

use crate::db::models::AuthUser;
use crate::db::Db;
use crate::names;

// ---------------------------------------------------------------------------
// AuthRepository trait (DIP: service defines the abstraction it needs)
// ---------------------------------------------------------------------------

#[cfg_attr(test, mockall::automock)]
pub trait AuthRepository: Send + Sync {
    fn email_exists(&self, email: &str) -> impl Future<Output = Result<bool>> + Send;

    fn create_user(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        role: &str,
    ) -> impl Future<Output = Result<i64>> + Send;

    fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<bool>> + Send;

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<AuthUser>>> + Send;

    fn create_session(&self, user_id: i64) -> impl Future<Output = Result<String>> + Send;

    fn delete_session(&self, session_id: &str) -> impl Future<Output = Result<()>> + Send;
}

impl AuthRepository for Db {
    fn email_exists(&self, email: &str) -> impl Future<Output = Result<bool>> + Send {
        Db::email_exists(self, email)
    }

    fn create_user(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        role: &str,
    ) -> impl Future<Output = Result<i64>> + Send {
        Db::create_user(self, email, password, first_name, last_name, role)
    }

    fn verify_user_password(
        &self,
        email: &str,
        password: &str,
    ) -> impl Future<Output = Result<bool>> + Send {
        Db::verify_user_password(self, email, password)
    }

    fn find_user_by_email(
        &self,
        email: &str,
    ) -> impl Future<Output = Result<Option<AuthUser>>> + Send {
        Db::find_user_by_email(self, email)
    }

    fn create_session(&self, user_id: i64) -> impl Future<Output = Result<String>> + Send {
        Db::create_session(self, user_id)
    }

    fn delete_session(&self, session_id: &str) -> impl Future<Output = Result<()>> + Send {
        Db::delete_session(self, session_id)
    }
}

// ---------------------------------------------------------------------------
// Outcome enums
// ---------------------------------------------------------------------------

pub enum RegisterOutcome {
    /// Account created and session started. Carries the user and the
    /// session token.
    LoggedIn(AuthUser, String),
    /// Required fields were empty.
    EmptyFields,
    /// Email does not look like an address.
    InvalidEmail,
    /// Password does not meet minimum requirements.
    WeakPassword,
    /// Email already in use.
    EmailTaken,
}

pub enum LoginOutcome {
    /// Login succeeded. Carries the user and the session token.
    Success(AuthUser, String),
    /// Password was incorrect, email unknown, or account deactivated.
    InvalidCredentials,
}

const MIN_PASSWORD_LENGTH: usize = 6;

// ---------------------------------------------------------------------------
// AuthService
// ---------------------------------------------------------------------------

pub struct AuthService<R: AuthRepository = Db> {
    repo: R,
}

impl<R: AuthRepository + Clone> Clone for AuthService<R> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
        }
    }
}

impl<R: AuthRepository> AuthService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome> {
        let verified = self.repo.verify_user_password(email, password).await?;
        if !verified {
            return Ok(LoginOutcome::InvalidCredentials);
        }

        let user =
            self.repo.find_user_by_email(email).await?.ok_or_else(|| {
                color_eyre::eyre::eyre!("user not found after password verification")
            })?;

        let session_token = self.repo.create_session(user.id).await?;

        Ok(LoginOutcome::Success(user, session_token))
    }

    /// Register a new account and log it in. Self-service registration only
    /// hands out the student and teacher roles; anything else is coerced to
    /// student.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
        role: Option<&str>,
    ) -> Result<RegisterOutcome> {
        if email.is_empty() || password.is_empty() || first_name.is_empty() || last_name.is_empty()
        {
            return Ok(RegisterOutcome::EmptyFields);
        }

        if !is_valid_email(email) {
            return Ok(RegisterOutcome::InvalidEmail);
        }

        if password.len() < MIN_PASSWORD_LENGTH {
            return Ok(RegisterOutcome::WeakPassword);
        }

        let exists = self.repo.email_exists(email).await?;
        if exists {
            return Ok(RegisterOutcome::EmailTaken);
        }

        let role = match role {
            Some(names::ROLE_TEACHER) => names::ROLE_TEACHER,
            _ => names::ROLE_STUDENT,
        };

        let user_id = self
            .repo
            .create_user(email, password, first_name, last_name, role)
            .await?;
        let session_token = self.repo.create_session(user_id).await?;

        let user = AuthUser {
            id: user_id,
            email: email.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role: role.to_string(),
        };

        Ok(RegisterOutcome::LoggedIn(user, session_token))
    }

    pub async fn logout(&self, session_id: &str) -> Result<()> {
        self.repo.delete_session(session_id).await
    }
}

/// Just enough shape checking to catch typos: a local part, one `@`, and a
/// dotted domain ending in an alphabetic TLD of two or more characters.
fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => {
            !host.is_empty() && tld.len() >= 2 && tld.chars().all(|c| c.is_ascii_alphabetic())
        }
        None => false,
    }
}
