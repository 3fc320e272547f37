use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use sqlx::FromRow;

use crate::{
    audit::log_audit,
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        users::{ActiveModel as UserActive, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::CurrentAdmin,
    models::{Order, User, UserRole, UserStatus},
    routes::params::CustomerListQuery,
    services::order_service::order_from_entity,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct CustomerListRow {
    pub user: User,
    pub order_count: i64,
    pub total_spent: Decimal,
}

#[derive(Debug)]
pub struct CustomerPage {
    pub items: Vec<CustomerListRow>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(FromRow)]
struct CustomerRowDb {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    role: String,
    status: String,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
    order_count: i64,
    total_spent: Decimal,
}

pub async fn list_customers(
    state: &AppState,
    query: CustomerListQuery,
) -> AppResult<CustomerPage> {
    let (page, per_page, offset) = query.pagination().normalize();

    let status = query.status.as_ref().filter(|s| !s.is_empty()).cloned();
    if let Some(ref s) = status {
        UserStatus::parse(s)?;
    }
    let search = query
        .search
        .as_ref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("%{}%", s.trim()));

    let filter_sql = r#"
        FROM users u
        WHERE u.role = 'customer'
          AND ($1::text IS NULL OR u.status = $1)
          AND ($2::text IS NULL
               OR u.first_name ILIKE $2
               OR u.last_name ILIKE $2
               OR u.email ILIKE $2)
    "#;

    let rows = sqlx::query_as::<_, CustomerRowDb>(&format!(
        r#"
        SELECT u.id, u.first_name, u.last_name, u.email, u.phone, u.address,
               u.role, u.status, u.created_at, u.updated_at,
               COUNT(o.id) AS order_count,
               COALESCE(SUM(o.total_price) FILTER (WHERE o.status <> 'canceled'), 0) AS total_spent
        FROM users u
        LEFT JOIN orders o ON o.user_id = u.id
        WHERE u.role = 'customer'
          AND ($1::text IS NULL OR u.status = $1)
          AND ($2::text IS NULL
               OR u.first_name ILIKE $2
               OR u.last_name ILIKE $2
               OR u.email ILIKE $2)
        GROUP BY u.id
        ORDER BY u.created_at DESC
        LIMIT $3 OFFSET $4
        "#
    ))
    .bind(status.clone())
    .bind(search.clone())
    .bind(per_page)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {filter_sql}"))
        .bind(status)
        .bind(search)
        .fetch_one(&state.pool)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(CustomerListRow {
            user: User {
                id: row.id,
                first_name: row.first_name,
                last_name: row.last_name,
                email: row.email,
                phone: row.phone,
                address: row.address,
                role: UserRole::parse(&row.role)?,
                status: UserStatus::parse(&row.status)?,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            order_count: row.order_count,
            total_spent: row.total_spent,
        });
    }

    Ok(CustomerPage {
        items,
        page,
        per_page,
        total: total.0,
        total_pages: (total.0 + per_page - 1) / per_page,
    })
}

/// Customer profile with their order history, newest first.
pub async fn get_customer(state: &AppState, id: i64) -> AppResult<(User, Vec<Order>)> {
    let user = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let user = user_from_entity(user)?;
    if user.role != UserRole::Customer {
        return Err(AppError::NotFound);
    }

    let orders = Orders::find()
        .filter(OrderCol::UserId.eq(id))
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;
    let orders = orders
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok((user, orders))
}

pub async fn update_customer_status(
    state: &AppState,
    admin: &CurrentAdmin,
    id: i64,
    status: &str,
) -> AppResult<User> {
    let parsed = UserStatus::parse(status)?;

    let existing = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if existing.role != UserRole::Customer.as_str() {
        return Err(AppError::NotFound);
    }

    let mut active: UserActive = existing.into();
    active.status = Set(parsed.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let user = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "customer_status_update",
        Some("users"),
        Some(serde_json::json!({ "customer_id": user.id, "status": user.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    user_from_entity(user)
}

pub(crate) fn user_from_entity(model: UserModel) -> AppResult<User> {
    Ok(User {
        id: model.id,
        first_name: model.first_name,
        last_name: model.last_name,
        email: model.email,
        phone: model.phone,
        address: model.address,
        role: UserRole::parse(&model.role)?,
        status: UserStatus::parse(&model.status)?,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
