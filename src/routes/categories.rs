use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::{
    dto::categories::CategoryForm,
    error::{AppError, AppResult},
    middleware::{
        auth::RequireAdmin,
        flash::{Flash, push_flash, take_flash},
    },
    services::category_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id}", post(update_category))
        .route("/{id}/delete", post(delete_category))
}

pub struct CategoryRowView {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub product_count: i64,
}

#[derive(Template, WebTemplate)]
#[template(path = "categories/list.html")]
pub struct CategoriesTemplate {
    pub flashes: Vec<Flash>,
    pub items: Vec<CategoryRowView>,
}

pub async fn list_categories(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
) -> AppResult<CategoriesTemplate> {
    let categories = category_service::list_categories(&state).await?;
    Ok(CategoriesTemplate {
        flashes: take_flash(&session).await,
        items: categories
            .into_iter()
            .map(|row| CategoryRowView {
                id: row.category.id,
                name: row.category.name,
                description: row.category.description.unwrap_or_default(),
                product_count: row.product_count,
            })
            .collect(),
    })
}

pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Form(form): Form<CategoryForm>,
) -> AppResult<Redirect> {
    match form.validate() {
        Ok((name, description)) => {
            let category =
                category_service::create_category(&state, &admin, name, description).await?;
            push_flash(&session, Flash::success(format!("Added {}", category.name))).await?;
        }
        Err(errors) => {
            push_flash(&session, Flash::error(errors.join("; "))).await?;
        }
    }
    Ok(Redirect::to("/admin/categories"))
}

pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<CategoryForm>,
) -> AppResult<Redirect> {
    match form.validate() {
        Ok((name, description)) => {
            let category =
                category_service::update_category(&state, &admin, id, name, description).await?;
            push_flash(&session, Flash::success(format!("Updated {}", category.name))).await?;
        }
        Err(errors) => {
            push_flash(&session, Flash::error(errors.join("; "))).await?;
        }
    }
    Ok(Redirect::to("/admin/categories"))
}

pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    match category_service::delete_category(&state, &admin, id).await {
        Ok(()) => {
            push_flash(&session, Flash::success("Category deleted")).await?;
        }
        Err(AppError::BadRequest(message)) => {
            push_flash(&session, Flash::error(message)).await?;
        }
        Err(err) => return Err(err),
    }
    Ok(Redirect::to("/admin/categories"))
}
