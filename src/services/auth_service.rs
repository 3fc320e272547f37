use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use sqlx::FromRow;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::auth::LoginForm,
    error::{AppError, AppResult},
    middleware::auth::CurrentAdmin,
    models::{UserRole, UserStatus},
};

#[derive(FromRow)]
struct LoginRow {
    id: i64,
    first_name: String,
    last_name: String,
    password_hash: String,
    role: String,
    status: String,
}

/// Verify credentials and produce the session auth context. Only active
/// admin accounts get one.
pub async fn login_admin(pool: &DbPool, payload: LoginForm) -> AppResult<CurrentAdmin> {
    let LoginForm { email, password } = payload;

    let row: Option<LoginRow> = sqlx::query_as(
        "SELECT id, first_name, last_name, password_hash, role, status FROM users WHERE email = $1",
    )
    .bind(email.trim())
    .fetch_optional(pool)
    .await?;

    let row = match row {
        Some(r) => r,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    let parsed_hash = PasswordHash::new(&row.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    if Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let role = UserRole::parse(&row.role)?;
    let status = UserStatus::parse(&row.status)?;
    if role != UserRole::Admin || status != UserStatus::Active {
        return Err(AppError::BadRequest(
            "This account cannot access the admin panel".into(),
        ));
    }

    if let Err(err) = log_audit(
        pool,
        Some(row.id),
        "admin_login",
        Some("users"),
        Some(serde_json::json!({ "user_id": row.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(CurrentAdmin {
        user_id: row.id,
        name: format!("{} {}", row.first_name, row.last_name),
        role,
    })
}
