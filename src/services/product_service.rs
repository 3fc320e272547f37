use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};

use crate::{
    audit::log_audit,
    dto::products::ValidProduct,
    entity::{
        categories::Entity as Categories,
        order_items::{Column as OrderItemCol, Entity as OrderItems},
        products::{
            self, ActiveModel as ProductActive, Column as ProdCol, Entity as Products,
            Model as ProductModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::CurrentAdmin,
    models::{DeleteOutcome, Product, ProductStatus},
    routes::params::ProductListQuery,
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct ProductWithCategory {
    pub product: Product,
    pub category_name: String,
}

#[derive(Debug)]
pub struct ProductPage {
    pub items: Vec<ProductWithCategory>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// Paginated listing for the products table. Soft-deleted rows never show
/// up here; they stay reachable through historic orders only.
pub async fn list_products(state: &AppState, query: ProductListQuery) -> AppResult<ProductPage> {
    let (page, per_page, offset) = query.pagination().normalize();

    let mut condition = Condition::all().add(ProdCol::DeletedAt.is_null());

    if let Some(category_id) = query.category_id() {
        condition = condition.add(ProdCol::CategoryId.eq(category_id));
    }

    if let Some(search) = query.search.as_ref().filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        condition = condition.add(
            Condition::any()
                .add(Expr::col((products::Entity, ProdCol::Name)).ilike(pattern.clone()))
                .add(Expr::col((products::Entity, ProdCol::Sku)).ilike(pattern)),
        );
    }

    let finder = Products::find()
        .filter(condition)
        .order_by_desc(ProdCol::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;

    let rows = finder
        .find_also_related(Categories)
        .limit(per_page as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for (product, category) in rows {
        items.push(ProductWithCategory {
            product: product_from_entity(product)?,
            category_name: category.map(|c| c.name).unwrap_or_default(),
        });
    }

    Ok(ProductPage {
        items,
        page,
        per_page,
        total,
        total_pages: (total + per_page - 1) / per_page,
    })
}

pub async fn get_product(state: &AppState, id: i64) -> AppResult<Product> {
    let product = Products::find_by_id(id)
        .filter(ProdCol::DeletedAt.is_null())
        .one(&state.orm)
        .await?;
    match product {
        Some(p) => product_from_entity(p),
        None => Err(AppError::NotFound),
    }
}

pub async fn create_product(
    state: &AppState,
    admin: &CurrentAdmin,
    payload: ValidProduct,
) -> AppResult<Product> {
    ProductStatus::parse(&payload.status)?;
    ensure_category_exists(state, payload.category_id).await?;

    let product = ProductActive {
        id: NotSet,
        name: Set(payload.name),
        description: Set(payload.description),
        price: Set(payload.price),
        stock: Set(payload.stock),
        category_id: Set(payload.category_id),
        image: Set(payload.image),
        status: Set(payload.status),
        is_customizable: Set(payload.is_customizable),
        sku: Set(payload.sku),
        weight: Set(payload.weight),
        dimensions: Set(payload.dimensions),
        deleted_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id, "name": product.name })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    product_from_entity(product)
}

pub async fn update_product(
    state: &AppState,
    admin: &CurrentAdmin,
    id: i64,
    payload: ValidProduct,
) -> AppResult<Product> {
    ProductStatus::parse(&payload.status)?;
    ensure_category_exists(state, payload.category_id).await?;

    let existing = Products::find_by_id(id)
        .filter(ProdCol::DeletedAt.is_null())
        .one(&state.orm)
        .await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    // A form submitted without a new upload keeps the stored image.
    let image = payload.image.or_else(|| existing.image.clone());

    let mut active: ProductActive = existing.into();
    active.name = Set(payload.name);
    active.description = Set(payload.description);
    active.price = Set(payload.price);
    active.stock = Set(payload.stock);
    active.category_id = Set(payload.category_id);
    active.image = Set(image);
    active.status = Set(payload.status);
    active.is_customizable = Set(payload.is_customizable);
    active.sku = Set(payload.sku);
    active.weight = Set(payload.weight);
    active.dimensions = Set(payload.dimensions);
    active.updated_at = Set(Utc::now().into());
    let product = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    product_from_entity(product)
}

/// Soft delete when historic orders still reference the product; hard
/// delete otherwise. `force` purges the row and its order_items outright.
pub async fn delete_product(
    state: &AppState,
    admin: &CurrentAdmin,
    id: i64,
    force: bool,
) -> AppResult<DeleteOutcome> {
    let txn = state.orm.begin().await?;

    let product = Products::find_by_id(id).one(&txn).await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let referencing_items = OrderItems::find()
        .filter(OrderItemCol::ProductId.eq(id))
        .count(&txn)
        .await?;

    let outcome = if force {
        OrderItems::delete_many()
            .filter(OrderItemCol::ProductId.eq(id))
            .exec(&txn)
            .await?;
        Products::delete_by_id(id).exec(&txn).await?;
        DeleteOutcome::Purged
    } else if referencing_items > 0 {
        let mut active: ProductActive = product.into();
        active.deleted_at = Set(Some(Utc::now().into()));
        active.updated_at = Set(Utc::now().into());
        active.update(&txn).await?;
        DeleteOutcome::SoftDeleted
    } else {
        Products::delete_by_id(id).exec(&txn).await?;
        DeleteOutcome::Purged
    };

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({
            "product_id": id,
            "outcome": match outcome {
                DeleteOutcome::SoftDeleted => "soft_deleted",
                DeleteOutcome::Purged => "purged",
            },
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(outcome)
}

async fn ensure_category_exists(state: &AppState, category_id: i64) -> AppResult<()> {
    let exists = Categories::find_by_id(category_id).one(&state.orm).await?;
    if exists.is_none() {
        return Err(AppError::BadRequest("Unknown category".into()));
    }
    Ok(())
}

pub(crate) fn product_from_entity(model: ProductModel) -> AppResult<Product> {
    Ok(Product {
        id: model.id,
        name: model.name,
        description: model.description,
        price: model.price,
        stock: model.stock,
        category_id: model.category_id,
        image: model.image,
        status: ProductStatus::parse(&model.status)?,
        is_customizable: model.is_customizable,
        sku: model.sku,
        weight: model.weight,
        dimensions: model.dimensions,
        deleted_at: model.deleted_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
