//! Registration, credential verification and account administration.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use log::*;

use crate::{
    db_types::{NewUser, PendingUser, Role, User, UserStatus},
    traits::{AuthApiError, UserManagement},
};

pub struct AuthApi<B> {
    db: B,
}

impl<B> AuthApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> AuthApi<B>
where B: UserManagement
{
    /// Registers a new account. The password is hashed with Argon2id before it goes anywhere near the database.
    /// New accounts start in `Pending` status and cannot log in until an admin approves them.
    pub async fn register(&self, email: &str, password: &str, contact: Option<String>) -> Result<User, AuthApiError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthApiError::PasswordHash(e.to_string()))?
            .to_string();
        let user = self.db.insert_user(NewUser { email: email.to_string(), password_hash: hash, contact }).await?;
        info!("🔐️ New account registered for [{}], awaiting approval", user.email);
        Ok(user)
    }

    /// Checks a login attempt. Unknown emails and wrong passwords both come back as
    /// [`AuthApiError::InvalidCredentials`]; a correct password on an unapproved account is
    /// [`AuthApiError::AccountNotActivated`].
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<User, AuthApiError> {
        let Some(user) = self.db.fetch_user_by_email(email).await? else {
            debug!("🔐️ Login attempt for unknown email");
            return Err(AuthApiError::InvalidCredentials);
        };
        let hash = PasswordHash::new(&user.password_hash).map_err(|e| AuthApiError::PasswordHash(e.to_string()))?;
        if Argon2::default().verify_password(password.as_bytes(), &hash).is_err() {
            debug!("🔐️ Password mismatch for [{}]", user.email);
            return Err(AuthApiError::InvalidCredentials);
        }
        if user.status == UserStatus::Pending {
            debug!("🔐️ [{}] logged in with a valid password but is not approved yet", user.email);
            return Err(AuthApiError::AccountNotActivated);
        }
        Ok(user)
    }

    pub async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AuthApiError> {
        self.db.fetch_user_by_id(user_id).await
    }

    pub async fn pending_users(&self) -> Result<Vec<PendingUser>, AuthApiError> {
        self.db.fetch_pending_users().await
    }

    pub async fn approve_user(&self, user_id: i64) -> Result<User, AuthApiError> {
        self.db.activate_user(user_id).await
    }

    /// Makes sure the account with this email is an active admin. Called at startup for the configured
    /// administrator address. Missing accounts are not an error; the promotion happens when they register.
    pub async fn ensure_admin(&self, email: &str) -> Result<(), AuthApiError> {
        match self.db.fetch_user_by_email(email).await? {
            Some(user) => {
                if user.role != Role::Admin {
                    self.db.assign_role(user.id, Role::Admin).await?;
                    info!("🔐️ [{email}] has been promoted to admin");
                }
                if user.status == UserStatus::Pending {
                    self.db.activate_user(user.id).await?;
                }
                Ok(())
            },
            None => {
                warn!("🔐️ Admin account [{email}] does not exist yet. It will need promoting once registered.");
                Ok(())
            },
        }
    }
}
