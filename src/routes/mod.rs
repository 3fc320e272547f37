use axum::{Router, routing::get};

use crate::state::AppState;

pub mod ajax;
pub mod auth;
pub mod categories;
pub mod customers;
pub mod dashboard;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod reports;
pub mod settings;

// Build the app router without binding state; it is provided at the top level.
pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/admin", admin_router())
}

fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::dashboard))
        .route("/invoice/{order_id}", get(orders::invoice))
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/orders", orders::router())
        .nest("/customers", customers::router())
        .nest("/settings", settings::router())
        .nest("/reports", reports::router())
        .nest("/ajax", ajax::router())
}
