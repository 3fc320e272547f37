use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Customer,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Customer => "customer",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "admin" => Ok(UserRole::Admin),
            "customer" => Ok(UserRole::Customer),
            _ => Err(AppError::BadRequest(format!("Invalid role: {value}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
    Suspended,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Active => "active",
            UserStatus::Inactive => "inactive",
            UserStatus::Suspended => "suspended",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "active" => Ok(UserStatus::Active),
            "inactive" => Ok(UserStatus::Inactive),
            "suspended" => Ok(UserStatus::Suspended),
            _ => Err(AppError::BadRequest(format!("Invalid user status: {value}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Canceled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "canceled" => Ok(OrderStatus::Canceled),
            _ => Err(AppError::BadRequest(format!(
                "Invalid order status: {value}"
            ))),
        }
    }

    /// The next stage on the fulfilment track; terminal states return
    /// themselves.
    pub fn next_forward(&self) -> OrderStatus {
        match self {
            OrderStatus::Pending => OrderStatus::Processing,
            OrderStatus::Processing => OrderStatus::Shipped,
            OrderStatus::Shipped => OrderStatus::Delivered,
            OrderStatus::Delivered => OrderStatus::Delivered,
            OrderStatus::Canceled => OrderStatus::Canceled,
        }
    }

    /// Position on the fulfilment track. Cancellation sits outside it.
    pub fn fulfillment_rank(&self) -> Option<u8> {
        match self {
            OrderStatus::Pending => Some(0),
            OrderStatus::Processing => Some(1),
            OrderStatus::Shipped => Some(2),
            OrderStatus::Delivered => Some(3),
            OrderStatus::Canceled => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
    Refunded,
    Canceled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
            PaymentStatus::Canceled => "canceled",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "pending" => Ok(PaymentStatus::Pending),
            "processing" => Ok(PaymentStatus::Processing),
            "completed" => Ok(PaymentStatus::Completed),
            "failed" => Ok(PaymentStatus::Failed),
            "refunded" => Ok(PaymentStatus::Refunded),
            "canceled" => Ok(PaymentStatus::Canceled),
            _ => Err(AppError::BadRequest(format!(
                "Invalid payment status: {value}"
            ))),
        }
    }
}

impl std::fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    Active,
    Inactive,
    Featured,
}

impl ProductStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductStatus::Active => "active",
            ProductStatus::Inactive => "inactive",
            ProductStatus::Featured => "featured",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "active" => Ok(ProductStatus::Active),
            "inactive" => Ok(ProductStatus::Inactive),
            "featured" => Ok(ProductStatus::Featured),
            _ => Err(AppError::BadRequest(format!(
                "Invalid product status: {value}"
            ))),
        }
    }
}

/// Explicit lifecycle tag for a product row. A purged product has no row
/// at all, so only the first two states are observable on reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductLifecycle {
    Active,
    SoftDeleted,
}

/// What a delete request actually did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    SoftDeleted,
    Purged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SettingType {
    Text,
    Number,
    Boolean,
    Select,
    Color,
    Image,
    Json,
}

impl SettingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingType::Text => "text",
            SettingType::Number => "number",
            SettingType::Boolean => "boolean",
            SettingType::Select => "select",
            SettingType::Color => "color",
            SettingType::Image => "image",
            SettingType::Json => "json",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "text" => Ok(SettingType::Text),
            "number" => Ok(SettingType::Number),
            "boolean" => Ok(SettingType::Boolean),
            "select" => Ok(SettingType::Select),
            "color" => Ok(SettingType::Color),
            "image" => Ok(SettingType::Image),
            "json" => Ok(SettingType::Json),
            _ => Err(AppError::BadRequest(format!(
                "Invalid setting type: {value}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: UserRole,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = String)]
    pub price: Decimal,
    pub stock: i32,
    pub category_id: i64,
    pub image: Option<String>,
    pub status: ProductStatus,
    pub is_customizable: bool,
    pub sku: Option<String>,
    #[schema(value_type = Option<String>)]
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn lifecycle(&self) -> ProductLifecycle {
        if self.deleted_at.is_some() {
            ProductLifecycle::SoftDeleted
        } else {
            ProductLifecycle::Active
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: i64,
    pub user_id: i64,
    pub status: OrderStatus,
    #[schema(value_type = String)]
    pub total_price: Decimal,
    pub shipping_address: String,
    pub shipping_city: Option<String>,
    pub shipping_postal_code: Option<String>,
    #[schema(value_type = String)]
    pub shipping_cost: Decimal,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Payment {
    pub id: i64,
    pub order_id: i64,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    #[schema(value_type = String)]
    pub amount: Decimal,
    pub payment_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub quantity: i32,
    /// Unit price snapshot taken at purchase time, independent of the
    /// product's current price.
    #[schema(value_type = String)]
    pub price: Decimal,
    pub customization_text: Option<String>,
    pub customization_image: Option<String>,
    pub customization_color: Option<String>,
    pub customization_size: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Setting {
    pub id: i64,
    pub setting_key: String,
    pub setting_value: Option<String>,
    pub setting_type: SettingType,
    pub setting_group: String,
    pub label: String,
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn product(deleted_at: Option<DateTime<Utc>>) -> Product {
        Product {
            id: 1,
            name: "Mug".into(),
            description: None,
            price: Decimal::from(500),
            stock: 10,
            category_id: 1,
            image: None,
            status: ProductStatus::Active,
            is_customizable: false,
            sku: None,
            weight: None,
            dimensions: None,
            deleted_at,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn lifecycle_follows_deleted_marker() {
        assert_eq!(product(None).lifecycle(), ProductLifecycle::Active);
        assert_eq!(
            product(Some(Utc::now())).lifecycle(),
            ProductLifecycle::SoftDeleted
        );
    }

    #[test]
    fn fulfillment_ranks_order_the_track() {
        assert!(
            OrderStatus::Pending.fulfillment_rank()
                < OrderStatus::Processing.fulfillment_rank()
        );
        assert!(
            OrderStatus::Shipped.fulfillment_rank()
                < OrderStatus::Delivered.fulfillment_rank()
        );
        assert_eq!(OrderStatus::Canceled.fulfillment_rank(), None);
    }

    #[test]
    fn statuses_round_trip_through_parse() {
        for status in ["pending", "processing", "shipped", "delivered", "canceled"] {
            assert_eq!(OrderStatus::parse(status).unwrap().as_str(), status);
        }
        assert!(OrderStatus::parse("unknown").is_err());
        assert!(PaymentStatus::parse("completed").is_ok());
        assert!(PaymentStatus::parse("paid").is_err());
    }
}
