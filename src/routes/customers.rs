use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::{
    dto::customers::CustomerStatusForm,
    error::AppResult,
    middleware::{
        auth::RequireAdmin,
        flash::{Flash, push_flash, take_flash},
    },
    models::UserStatus,
    reports::format_money,
    routes::params::CustomerListQuery,
    services::{customer_service, settings_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_customers))
        .route("/{id}", get(customer_detail))
        .route("/{id}/status", post(update_status))
}

pub const USER_STATUSES: [UserStatus; 3] = [
    UserStatus::Active,
    UserStatus::Inactive,
    UserStatus::Suspended,
];

pub struct CustomerRowView {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub status: String,
    pub order_count: i64,
    pub total_spent: String,
    pub registered: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "customers/list.html")]
pub struct CustomersListTemplate {
    pub flashes: Vec<Flash>,
    pub items: Vec<CustomerRowView>,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
    pub search: String,
    pub status: String,
    pub statuses: Vec<String>,
}

pub async fn list_customers(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Query(query): Query<CustomerListQuery>,
) -> AppResult<CustomersListTemplate> {
    let search = query.search.clone().unwrap_or_default();
    let status = query.status.clone().unwrap_or_default();

    let page = customer_service::list_customers(&state, query).await?;
    let currency = settings_service::currency_symbol(&state).await?;

    Ok(CustomersListTemplate {
        flashes: take_flash(&session).await,
        items: page
            .items
            .iter()
            .map(|row| CustomerRowView {
                id: row.user.id,
                name: row.user.full_name(),
                email: row.user.email.clone(),
                status: row.user.status.as_str().to_string(),
                order_count: row.order_count,
                total_spent: format_money(&currency, row.total_spent),
                registered: row.user.created_at.format("%Y-%m-%d").to_string(),
            })
            .collect(),
        page: page.page,
        total_pages: page.total_pages,
        total: page.total,
        search,
        status,
        statuses: USER_STATUSES.iter().map(|s| s.as_str().to_string()).collect(),
    })
}

pub struct CustomerOrderView {
    pub id: i64,
    pub status: String,
    pub total: String,
    pub placed: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "customers/detail.html")]
pub struct CustomerDetailTemplate {
    pub flashes: Vec<Flash>,
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub status: String,
    pub registered: String,
    pub orders: Vec<CustomerOrderView>,
    pub statuses: Vec<String>,
}

pub async fn customer_detail(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
) -> AppResult<CustomerDetailTemplate> {
    let (customer, orders) = customer_service::get_customer(&state, id).await?;
    let currency = settings_service::currency_symbol(&state).await?;

    Ok(CustomerDetailTemplate {
        flashes: take_flash(&session).await,
        id: customer.id,
        name: customer.full_name(),
        email: customer.email.clone(),
        phone: customer.phone.clone().unwrap_or_default(),
        address: customer.address.clone().unwrap_or_default(),
        status: customer.status.as_str().to_string(),
        registered: customer.created_at.format("%Y-%m-%d").to_string(),
        orders: orders
            .iter()
            .map(|order| CustomerOrderView {
                id: order.id,
                status: order.status.as_str().to_string(),
                total: format_money(&currency, order.total_price),
                placed: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
            })
            .collect(),
        statuses: USER_STATUSES.iter().map(|s| s.as_str().to_string()).collect(),
    })
}

pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<CustomerStatusForm>,
) -> AppResult<Redirect> {
    let customer =
        customer_service::update_customer_status(&state, &admin, id, &form.status).await?;
    push_flash(
        &session,
        Flash::success(format!(
            "{} is now {}",
            customer.full_name(),
            customer.status.as_str()
        )),
    )
    .await?;
    Ok(Redirect::to(&format!("/admin/customers/{id}")))
}
