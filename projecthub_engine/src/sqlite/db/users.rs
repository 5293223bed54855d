use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, PendingUser, Role, User, UserStatus},
    traits::AuthApiError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AuthApiError> {
    let result = sqlx::query_as::<_, User>(
        r#"INSERT INTO users (email, password_hash, contact) VALUES ($1, $2, $3) RETURNING *"#,
    )
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.contact)
    .fetch_one(conn)
    .await;
    match result {
        Ok(u) => {
            debug!("📝️ New account registered for [{}]", u.email);
            Ok(u)
        },
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AuthApiError::EmailAlreadyExists),
        Err(e) => Err(e.into()),
    }
}

pub async fn user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, AuthApiError> {
    let result = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(conn)
        .await?;
    Ok(result)
}

pub async fn user_by_id(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, AuthApiError> {
    let result =
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await?;
    Ok(result)
}

pub async fn pending_users(conn: &mut SqliteConnection) -> Result<Vec<PendingUser>, AuthApiError> {
    let users = sqlx::query_as::<_, PendingUser>(
        "SELECT id, email, contact, created_at FROM users WHERE status = $1 ORDER BY created_at ASC",
    )
    .bind(UserStatus::Pending)
    .fetch_all(conn)
    .await?;
    Ok(users)
}

pub async fn activate_user(user_id: i64, conn: &mut SqliteConnection) -> Result<User, AuthApiError> {
    let result = sqlx::query_as::<_, User>(
        "UPDATE users SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(UserStatus::Active)
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    result.ok_or(AuthApiError::UserNotFound(user_id))
}

pub async fn assign_role(user_id: i64, role: Role, conn: &mut SqliteConnection) -> Result<(), AuthApiError> {
    let result = sqlx::query("UPDATE users SET role = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(role)
        .bind(user_id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(AuthApiError::UserNotFound(user_id));
    }
    debug!("📝️ User {user_id} assigned role {role}");
    Ok(())
}
