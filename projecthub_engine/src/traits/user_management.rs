use thiserror::Error;

use crate::db_types::{NewUser, PendingUser, Role, User};

#[derive(Debug, Clone, Error)]
pub enum AuthApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("An account with this email already exists")]
    EmailAlreadyExists,
    #[error("User {0} does not exist")]
    UserNotFound(i64),
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("This account has not been approved yet")]
    AccountNotActivated,
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl From<sqlx::Error> for AuthApiError {
    fn from(e: sqlx::Error) -> Self {
        AuthApiError::DatabaseError(e.to_string())
    }
}

/// Registration and account administration. Password hashes are opaque strings here; hashing and verification
/// live with the caller so the backend never sees a plaintext credential.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Creates a new account in `Pending` status with the `User` role. Fails with [`AuthApiError::EmailAlreadyExists`]
    /// if the email is taken.
    async fn insert_user(&self, user: NewUser) -> Result<User, AuthApiError>;

    /// Fetches a user by email, or `None`. The email match is exact.
    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, AuthApiError>;

    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, AuthApiError>;

    /// All accounts still awaiting approval, oldest first.
    async fn fetch_pending_users(&self) -> Result<Vec<PendingUser>, AuthApiError>;

    /// Flips a pending account to `Active`. Activating an already active account is a no-op.
    async fn activate_user(&self, user_id: i64) -> Result<User, AuthApiError>;

    /// Sets the account's role. Used at startup to promote the configured admin address.
    async fn assign_role(&self, user_id: i64, role: Role) -> Result<(), AuthApiError>;
}
