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
    dto::orders::{UpdatePaymentForm, UpdateStatusForm},
    error::AppResult,
    middleware::{
        auth::RequireAdmin,
        flash::{Flash, push_flash, take_flash},
    },
    models::{OrderStatus, PaymentStatus},
    reports::format_money,
    routes::params::OrderListQuery,
    services::{
        order_service::{self, OrderListRow},
        settings_service,
    },
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/{id}", get(order_detail))
        .route("/{id}/status", post(update_status))
        .route("/{id}/payment-status", post(update_payment_status))
}

pub const ORDER_STATUSES: [OrderStatus; 5] = [
    OrderStatus::Pending,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Canceled,
];

pub const PAYMENT_STATUSES: [PaymentStatus; 6] = [
    PaymentStatus::Pending,
    PaymentStatus::Processing,
    PaymentStatus::Completed,
    PaymentStatus::Failed,
    PaymentStatus::Refunded,
    PaymentStatus::Canceled,
];

/// Row shape shared by the orders table and the dashboard's recent list.
pub struct OrderRowView {
    pub id: i64,
    pub customer_name: String,
    pub status: String,
    pub payment_status: String,
    pub total: String,
    pub created_at: String,
}

impl OrderRowView {
    pub fn from_row(row: &OrderListRow, currency: &str) -> Self {
        Self {
            id: row.order.id,
            customer_name: row.customer_name.clone(),
            status: row.order.status.as_str().to_string(),
            payment_status: row.payment_status.as_str().to_string(),
            total: format_money(currency, row.order.total_price),
            created_at: row.order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/list.html")]
pub struct OrdersListTemplate {
    pub flashes: Vec<Flash>,
    pub items: Vec<OrderRowView>,
    pub page: i64,
    pub total_pages: i64,
    pub total: i64,
    pub status: String,
    pub search: String,
    pub start_date: String,
    pub end_date: String,
    pub statuses: Vec<String>,
}

pub async fn list_orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Query(query): Query<OrderListQuery>,
) -> AppResult<OrdersListTemplate> {
    let status = query.status.clone().unwrap_or_default();
    let search = query.search.clone().unwrap_or_default();
    let start_date = query.start_date.clone().unwrap_or_default();
    let end_date = query.end_date.clone().unwrap_or_default();

    let page = order_service::list_orders(&state, query).await?;
    let currency = settings_service::currency_symbol(&state).await?;

    Ok(OrdersListTemplate {
        flashes: take_flash(&session).await,
        items: page
            .items
            .iter()
            .map(|row| OrderRowView::from_row(row, &currency))
            .collect(),
        page: page.page,
        total_pages: page.total_pages,
        total: page.total,
        status,
        search,
        start_date,
        end_date,
        statuses: ORDER_STATUSES.iter().map(|s| s.as_str().to_string()).collect(),
    })
}

pub struct ItemView {
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
    pub customizations: Vec<String>,
}

pub struct PaymentView {
    pub status: String,
    pub method: String,
    pub transaction_id: String,
    pub amount: String,
    pub payment_date: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "orders/detail.html")]
pub struct OrderDetailTemplate {
    pub flashes: Vec<Flash>,
    pub id: i64,
    pub status: String,
    pub created_at: String,
    pub total: String,
    pub shipping_cost: String,
    pub shipping_address: String,
    pub shipping_city: String,
    pub shipping_postal_code: String,
    pub phone: String,
    pub notes: String,
    pub customer_name: String,
    pub customer_email: String,
    pub payment: Option<PaymentView>,
    pub items: Vec<ItemView>,
    /// The status form renders only when payment is completed; the AJAX
    /// validator enforces its own rules independently.
    pub can_update_status: bool,
    pub statuses: Vec<String>,
    pub payment_statuses: Vec<String>,
}

pub async fn order_detail(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
) -> AppResult<OrderDetailTemplate> {
    let details = order_service::get_order_details(&state, id).await?;
    let currency = settings_service::currency_symbol(&state).await?;

    let can_update_status = details
        .payment
        .as_ref()
        .is_some_and(|p| p.status == PaymentStatus::Completed);

    let payment = details.payment.as_ref().map(|p| PaymentView {
        status: p.status.as_str().to_string(),
        method: p.payment_method.clone().unwrap_or_default(),
        transaction_id: p.transaction_id.clone().unwrap_or_default(),
        amount: format_money(&currency, p.amount),
        payment_date: p
            .payment_date
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default(),
    });

    let items = details
        .items
        .iter()
        .map(|detail| {
            let item = &detail.item;
            let mut customizations = Vec::new();
            if let Some(text) = &item.customization_text {
                customizations.push(format!("Text: {text}"));
            }
            if let Some(color) = &item.customization_color {
                customizations.push(format!("Color: {color}"));
            }
            if let Some(size) = &item.customization_size {
                customizations.push(format!("Size: {size}"));
            }
            if item.customization_image.is_some() {
                customizations.push("Custom image attached".to_string());
            }
            ItemView {
                product_name: detail.product_name.clone(),
                quantity: item.quantity,
                unit_price: format_money(&currency, item.price),
                line_total: format_money(
                    &currency,
                    item.price * rust_decimal::Decimal::from(item.quantity),
                ),
                customizations,
            }
        })
        .collect();

    let order = &details.order;
    Ok(OrderDetailTemplate {
        flashes: take_flash(&session).await,
        id: order.id,
        status: order.status.as_str().to_string(),
        created_at: order.created_at.format("%Y-%m-%d %H:%M").to_string(),
        total: format_money(&currency, order.total_price),
        shipping_cost: format_money(&currency, order.shipping_cost),
        shipping_address: order.shipping_address.clone(),
        shipping_city: order.shipping_city.clone().unwrap_or_default(),
        shipping_postal_code: order.shipping_postal_code.clone().unwrap_or_default(),
        phone: order.phone.clone().unwrap_or_default(),
        notes: order.notes.clone().unwrap_or_default(),
        customer_name: details.customer.name.clone(),
        customer_email: details.customer.email.clone(),
        payment,
        items,
        can_update_status,
        statuses: ORDER_STATUSES.iter().map(|s| s.as_str().to_string()).collect(),
        payment_statuses: PAYMENT_STATUSES.iter().map(|s| s.as_str().to_string()).collect(),
    })
}

pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<UpdateStatusForm>,
) -> AppResult<Redirect> {
    let (decision, updated) =
        order_service::update_order_status(&state, &admin, id, &form.status).await?;

    let flash = match updated {
        Some(order) => Flash::success(format!("Order #{} marked {}", order.id, order.status)),
        None => Flash::error(decision.message),
    };
    push_flash(&session, flash).await?;

    Ok(Redirect::to(&format!("/admin/orders/{id}")))
}

pub async fn update_payment_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    session: Session,
    Path(id): Path<i64>,
    Form(form): Form<UpdatePaymentForm>,
) -> AppResult<Redirect> {
    match order_service::update_payment_status(&state, &admin, id, form).await {
        Ok(payment) => {
            push_flash(
                &session,
                Flash::success(format!("Payment marked {}", payment.status)),
            )
            .await?;
        }
        Err(crate::error::AppError::BadRequest(message)) => {
            push_flash(&session, Flash::error(message)).await?;
        }
        Err(err) => return Err(err),
    }

    Ok(Redirect::to(&format!("/admin/orders/{id}")))
}

pub struct InvoiceItemView {
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
}

#[derive(Template, WebTemplate)]
#[template(path = "invoice.html")]
pub struct InvoiceTemplate {
    pub invoice_number: String,
    pub order_id: i64,
    pub order_date: String,
    pub store_name: String,
    pub store_email: String,
    pub store_address: String,
    pub customer_name: String,
    pub customer_email: String,
    pub shipping_address: String,
    pub items: Vec<InvoiceItemView>,
    pub subtotal: String,
    pub shipping: String,
    pub tax: String,
    pub has_tax: bool,
    pub total: String,
}

pub async fn invoice(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(order_id): Path<i64>,
) -> AppResult<InvoiceTemplate> {
    let data = order_service::invoice_data(&state, order_id).await?;
    let currency = &data.currency;

    let items = data
        .items
        .iter()
        .map(|detail| InvoiceItemView {
            product_name: detail.product_name.clone(),
            quantity: detail.item.quantity,
            unit_price: format_money(currency, detail.item.price),
            line_total: format_money(
                currency,
                detail.item.price * rust_decimal::Decimal::from(detail.item.quantity),
            ),
        })
        .collect();

    Ok(InvoiceTemplate {
        invoice_number: data.invoice_number,
        order_id: data.order.id,
        order_date: data.order.created_at.format("%Y-%m-%d").to_string(),
        store_name: data.store_name,
        store_email: data.store_email.unwrap_or_default(),
        store_address: data.store_address.unwrap_or_default(),
        customer_name: data.customer.full_name(),
        customer_email: data.customer.email.clone(),
        shipping_address: data.order.shipping_address.clone(),
        items,
        subtotal: format_money(currency, data.totals.subtotal),
        shipping: format_money(currency, data.totals.shipping),
        tax: format_money(currency, data.totals.tax),
        has_tax: !data.totals.tax.is_zero(),
        total: format_money(currency, data.totals.total),
    })
}
