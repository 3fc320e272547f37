use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Order, OrderItem, Payment};
use crate::rules::{PaymentSummary, StatusDecision};

/// Customer block embedded in the order details payload. Deliberately a
/// subset of the user row.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrderCustomer {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetails {
    pub order: Order,
    pub customer: OrderCustomer,
    pub payment: Option<Payment>,
    pub items: Vec<OrderItemDetail>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateStatusRequest {
    pub order_id: i64,
    pub new_status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentValidationRequest {
    pub order_id: i64,
}

/// `{success, validation, payment_summary}` per the payment-validation
/// endpoint contract.
#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentValidationResponse {
    pub success: bool,
    pub validation: StatusDecision,
    pub payment_summary: PaymentSummary,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusForm {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePaymentForm {
    pub status: String,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    pub amount: Option<String>,
}
