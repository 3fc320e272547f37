use axum::{
    Form, Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use crate::{
    dto::orders::{OrderDetails, PaymentValidationRequest, ValidateStatusRequest},
    error::{AppError, AppResult},
    middleware::auth::RequireAdmin,
    response::ApiResponse,
    routes::params::AjaxOrderQuery,
    rules::StatusDecision,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/order-details", get(order_details))
        .route("/validate-status-update", post(validate_status_update))
        .route("/payment-validation", post(payment_validation))
}

fn order_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<serde_json::Value>::error("Order not found")),
    )
        .into_response()
}

#[utoipa::path(
    get,
    path = "/admin/ajax/order-details",
    params(
        ("id" = i64, Query, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with customer, payment and items", body = ApiResponse<OrderDetails>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Ajax"
)]
pub async fn order_details(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<AjaxOrderQuery>,
) -> AppResult<Response> {
    match order_service::get_order_details(&state, query.id).await {
        Ok(details) => Ok(Json(ApiResponse::success(details)).into_response()),
        Err(AppError::NotFound) => Ok(order_not_found()),
        Err(err) => Err(err),
    }
}

#[utoipa::path(
    post,
    path = "/admin/ajax/validate-status-update",
    request_body = ValidateStatusRequest,
    responses(
        (status = 200, description = "Whether the transition is allowed", body = StatusDecision),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Ajax"
)]
pub async fn validate_status_update(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Form(payload): Form<ValidateStatusRequest>,
) -> AppResult<Response> {
    match order_service::validate_status_update(&state, payload.order_id, &payload.new_status).await
    {
        Ok(decision) => Ok(Json(decision).into_response()),
        Err(AppError::NotFound) => Ok(order_not_found()),
        Err(err) => Err(err),
    }
}

#[utoipa::path(
    post,
    path = "/admin/ajax/payment-validation",
    request_body = PaymentValidationRequest,
    responses(
        (status = 200, description = "Payment summary and advance decision", body = crate::dto::orders::PaymentValidationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Order not found"),
    ),
    tag = "Ajax"
)]
pub async fn payment_validation(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Form(payload): Form<PaymentValidationRequest>,
) -> AppResult<Response> {
    match order_service::payment_validation(&state, payload.order_id).await {
        Ok(response) => Ok(Json(response).into_response()),
        Err(AppError::NotFound) => Ok(order_not_found()),
        Err(err) => Err(err),
    }
}
