use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tower_sessions::Session;

use crate::{
    error::AppResult,
    middleware::{
        auth::RequireAdmin,
        flash::{Flash, take_flash},
    },
    reports::format_money,
    routes::orders::OrderRowView,
    services::{report_service, settings_service},
    state::AppState,
};

#[derive(Template, WebTemplate)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub admin_name: String,
    pub flashes: Vec<Flash>,
    pub total_products: i64,
    pub total_orders: i64,
    pub total_customers: i64,
    pub pending_orders: i64,
    pub total_revenue: String,
    pub recent_orders: Vec<OrderRowView>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
) -> AppResult<DashboardTemplate> {
    let data = report_service::dashboard(&state).await?;
    let currency = settings_service::currency_symbol(&state).await?;

    Ok(DashboardTemplate {
        admin_name: admin.name,
        flashes: take_flash(&session).await,
        total_products: data.total_products,
        total_orders: data.total_orders,
        total_customers: data.total_customers,
        pending_orders: data.pending_orders,
        total_revenue: format_money(&currency, data.total_revenue),
        recent_orders: data
            .recent_orders
            .iter()
            .map(|row| OrderRowView::from_row(row, &currency))
            .collect(),
    })
}
