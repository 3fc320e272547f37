use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
};
use tower_sessions::Session;

use crate::{
    dto::products::{DeleteProductForm, ProductForm},
    error::{AppError, AppResult},
    middleware::{
        auth::RequireAdmin,
        flash::{Flash, push_flash, take_flash},
    },
    models::{DeleteOutcome, Product, ProductStatus},
    reports::format_money,
    routes::params::ProductListQuery,
    services::{category_service, product_service, settings_service},
    state::AppState,
    uploads,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/new", get(new_product))
        .route("/{id}", post(update_product))
        .route("/{id}/edit", get(edit_product))
        .route("/{id}/delete", post(delete_product))
}

pub const PRODUCT_STATUSES: [ProductStatus; 3] = [
    ProductStatus::Active,
    ProductStatus::Inactive,
    ProductStatus::Featured,
];

pub struct CategoryOption {
    pub id: String,
    pub name: String,
}

async fn category_options(state: &AppState) -> AppResult<Vec<CategoryOption>> {
    let categories = category_service::list_categories(state).await?;
    Ok(categories
        .into_iter()
        .map(|c| CategoryOption {
            id: c.category.id.to_string(),
            name: c.category.name,
        })
        .collect())
}

pub struct ProductRowView {
    pub id: i64,
    pub name: String,
    pub sku: String,
    pub category_name: String,
    pub price: String,
    pub stock: i32,
    pub status: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "products/list.html")]
pub struct ProductsListTemplate {
    pub flashes: Vec<Flash>,
    pub items: Vec<ProductRowView>,
    pub categories: Vec<CategoryOption>,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
    pub search: String,
    pub category_id: String,
}

pub async fn list_products(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Query(query): Query<ProductListQuery>,
) -> AppResult<ProductsListTemplate> {
    let search = query.search.clone().unwrap_or_default();
    let category_id = query
        .category_id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();

    let page = product_service::list_products(&state, query).await?;
    let currency = settings_service::currency_symbol(&state).await?;

    Ok(ProductsListTemplate {
        flashes: take_flash(&session).await,
        items: page
            .items
            .iter()
            .map(|row| ProductRowView {
                id: row.product.id,
                name: row.product.name.clone(),
                sku: row.product.sku.clone().unwrap_or_default(),
                category_name: row.category_name.clone(),
                price: format_money(&currency, row.product.price),
                stock: row.product.stock,
                status: row.product.status.as_str().to_string(),
            })
            .collect(),
        categories: category_options(&state).await?,
        page: page.page,
        total_pages: page.total_pages,
        total: page.total,
        search,
        category_id,
    })
}

#[derive(Template, WebTemplate)]
#[template(path = "products/form.html")]
pub struct ProductFormTemplate {
    pub flashes: Vec<Flash>,
    pub heading: String,
    pub action: String,
    pub errors: Vec<String>,
    pub form: ProductForm,
    pub categories: Vec<CategoryOption>,
    pub statuses: Vec<String>,
}

pub async fn new_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> AppResult<ProductFormTemplate> {
    Ok(ProductFormTemplate {
        flashes: take_flash(&session).await,
        heading: "Add product".to_string(),
        action: "/admin/products".to_string(),
        errors: Vec::new(),
        form: ProductForm::default(),
        categories: category_options(&state).await?,
        statuses: PRODUCT_STATUSES.iter().map(|s| s.as_str().to_string()).collect(),
    })
}

pub async fn edit_product(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
) -> AppResult<ProductFormTemplate> {
    let product = product_service::get_product(&state, id).await?;
    Ok(ProductFormTemplate {
        flashes: take_flash(&session).await,
        heading: format!("Edit {}", product.name),
        action: format!("/admin/products/{id}"),
        errors: Vec::new(),
        form: form_from_product(&product),
        categories: category_options(&state).await?,
        statuses: PRODUCT_STATUSES.iter().map(|s| s.as_str().to_string()).collect(),
    })
}

pub async fn create_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = parse_product_form(&state, multipart).await?;

    match form.validate() {
        Ok(valid) => {
            let product = product_service::create_product(&state, &admin, valid).await?;
            push_flash(&session, Flash::success(format!("Added {}", product.name))).await?;
            Ok(Redirect::to("/admin/products").into_response())
        }
        Err(errors) => Ok(ProductFormTemplate {
            flashes: Vec::new(),
            heading: "Add product".to_string(),
            action: "/admin/products".to_string(),
            errors,
            form,
            categories: category_options(&state).await?,
            statuses: PRODUCT_STATUSES.iter().map(|s| s.as_str().to_string()).collect(),
        }
        .into_response()),
    }
}

pub async fn update_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = parse_product_form(&state, multipart).await?;

    match form.validate() {
        Ok(valid) => {
            let product = product_service::update_product(&state, &admin, id, valid).await?;
            push_flash(&session, Flash::success(format!("Updated {}", product.name))).await?;
            Ok(Redirect::to("/admin/products").into_response())
        }
        Err(errors) => Ok(ProductFormTemplate {
            flashes: Vec::new(),
            heading: "Edit product".to_string(),
            action: format!("/admin/products/{id}"),
            errors,
            form,
            categories: category_options(&state).await?,
            statuses: PRODUCT_STATUSES.iter().map(|s| s.as_str().to_string()).collect(),
        }
        .into_response()),
    }
}

pub async fn delete_product(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<DeleteProductForm>,
) -> AppResult<Redirect> {
    let outcome = product_service::delete_product(&state, &admin, id, form.force_delete).await?;
    let flash = match outcome {
        DeleteOutcome::SoftDeleted => Flash::success(
            "Product hidden from the catalog; it stays on historic orders",
        ),
        DeleteOutcome::Purged => Flash::success("Product permanently deleted"),
    };
    push_flash(&session, flash).await?;
    Ok(Redirect::to("/admin/products"))
}

fn form_from_product(product: &Product) -> ProductForm {
    ProductForm {
        name: product.name.clone(),
        description: product.description.clone().unwrap_or_default(),
        price: product.price.to_string(),
        stock: product.stock.to_string(),
        category_id: product.category_id.to_string(),
        status: product.status.as_str().to_string(),
        is_customizable: product.is_customizable,
        sku: product.sku.clone().unwrap_or_default(),
        weight: product
            .weight
            .map(|w| w.to_string())
            .unwrap_or_default(),
        dimensions: product.dimensions.clone().unwrap_or_default(),
        image: product.image.clone(),
    }
}

/// Collect the multipart product form, writing an uploaded image to disk
/// as a side effect and recording only the stored filename.
async fn parse_product_form(state: &AppState, mut multipart: Multipart) -> AppResult<ProductForm> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let filename = field.file_name().map(|f| f.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            if let Some(filename) = filename.filter(|f| !f.is_empty()) {
                if !bytes.is_empty() {
                    let stored =
                        uploads::save_image(&state.config.uploads_dir, &filename, &bytes).await?;
                    form.image = Some(stored);
                }
            }
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        match name.as_str() {
            "name" => form.name = value,
            "description" => form.description = value,
            "price" => form.price = value,
            "stock" => form.stock = value,
            "category_id" => form.category_id = value,
            "status" => form.status = value,
            "is_customizable" => {
                form.is_customizable = value == "true" || value == "on" || value == "1";
            }
            "sku" => form.sku = value,
            "weight" => form.weight = value,
            "dimensions" => form.dimensions = value,
            _ => {}
        }
    }

    Ok(form)
}
