use utoipa::OpenApi;
use utoipa::openapi::OpenApi as OpenApiSpec;
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::orders::{
        OrderCustomer, OrderDetails, OrderItemDetail, PaymentValidationRequest,
        PaymentValidationResponse, ValidateStatusRequest,
    },
    models::{Order, OrderItem, OrderStatus, Payment, PaymentStatus},
    response::ApiResponse,
    routes::{ajax, health},
    rules::{DecisionCode, PaymentSummary, StatusDecision},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        ajax::order_details,
        ajax::validate_status_update,
        ajax::payment_validation,
    ),
    components(
        schemas(
            Order,
            OrderItem,
            OrderStatus,
            Payment,
            PaymentStatus,
            OrderCustomer,
            OrderItemDetail,
            OrderDetails,
            ValidateStatusRequest,
            PaymentValidationRequest,
            PaymentValidationResponse,
            StatusDecision,
            DecisionCode,
            PaymentSummary,
            health::HealthData,
            ApiResponse<OrderDetails>,
        )
    ),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Ajax", description = "JSON endpoints consumed by the admin pages"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
