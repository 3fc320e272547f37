use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, Set};
use sqlx::FromRow;

use crate::{
    audit::log_audit,
    entity::{
        categories::{ActiveModel as CategoryActive, Entity as Categories, Model as CategoryModel},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult},
    middleware::auth::CurrentAdmin,
    models::Category,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct CategoryWithCount {
    pub category: Category,
    pub product_count: i64,
}

pub async fn list_categories(state: &AppState) -> AppResult<Vec<CategoryWithCount>> {
    #[derive(FromRow)]
    struct Row {
        id: i64,
        name: String,
        description: Option<String>,
        image: Option<String>,
        created_at: chrono::DateTime<Utc>,
        updated_at: chrono::DateTime<Utc>,
        product_count: i64,
    }

    let rows = sqlx::query_as::<_, Row>(
        r#"
        SELECT c.id, c.name, c.description, c.image, c.created_at, c.updated_at,
               COUNT(p.id) AS product_count
        FROM categories c
        LEFT JOIN products p ON p.category_id = c.id
        GROUP BY c.id
        ORDER BY c.name
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| CategoryWithCount {
            category: Category {
                id: row.id,
                name: row.name,
                description: row.description,
                image: row.image,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            product_count: row.product_count,
        })
        .collect())
}

pub async fn create_category(
    state: &AppState,
    admin: &CurrentAdmin,
    name: String,
    description: Option<String>,
) -> AppResult<Category> {
    let category = CategoryActive {
        id: NotSet,
        name: Set(name),
        description: Set(description),
        image: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "category_create",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id, "name": category.name })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(category_from_entity(category))
}

pub async fn update_category(
    state: &AppState,
    admin: &CurrentAdmin,
    id: i64,
    name: String,
    description: Option<String>,
) -> AppResult<Category> {
    let existing = Categories::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    let mut active: CategoryActive = existing.into();
    active.name = Set(name);
    active.description = Set(description);
    active.updated_at = Set(Utc::now().into());
    let category = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "category_update",
        Some("categories"),
        Some(serde_json::json!({ "category_id": category.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(category_from_entity(category))
}

/// A category with products (live or soft-deleted) cannot be removed.
pub async fn delete_category(state: &AppState, admin: &CurrentAdmin, id: i64) -> AppResult<()> {
    let existing = Categories::find_by_id(id).one(&state.orm).await?;
    if existing.is_none() {
        return Err(AppError::NotFound);
    }

    let product_count = Products::find()
        .filter(ProdCol::CategoryId.eq(id))
        .count(&state.orm)
        .await?;

    if product_count > 0 {
        return Err(AppError::BadRequest(format!(
            "Cannot delete a category that still has {product_count} products"
        )));
    }

    Categories::delete_by_id(id).exec(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "category_delete",
        Some("categories"),
        Some(serde_json::json!({ "category_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(())
}

pub(crate) fn category_from_entity(model: CategoryModel) -> Category {
    Category {
        id: model.id,
        name: model.name,
        description: model.description,
        image: model.image,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
