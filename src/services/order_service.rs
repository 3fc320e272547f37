use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, TransactionTrait,
};
use sqlx::FromRow;

use crate::{
    audit::log_audit,
    dto::orders::{
        OrderCustomer, OrderDetails, OrderItemDetail, PaymentValidationResponse, UpdatePaymentForm,
    },
    entity::{
        orders::{ActiveModel as OrderActive, Entity as Orders, Model as OrderModel},
        payments::{
            ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments,
            Model as PaymentModel,
        },
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    invoice::{InvoiceTotals, compute_totals, invoice_number},
    middleware::auth::CurrentAdmin,
    models::{Order, OrderItem, OrderStatus, Payment, PaymentStatus, User},
    routes::params::OrderListQuery,
    rules::{self, StatusDecision},
    services::{customer_service::user_from_entity, settings_service},
    state::AppState,
};

#[derive(Debug, Clone)]
pub struct OrderListRow {
    pub order: Order,
    pub customer_name: String,
    pub payment_status: PaymentStatus,
}

#[derive(Debug)]
pub struct OrderPage {
    pub items: Vec<OrderListRow>,
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(FromRow)]
struct OrderRowDb {
    id: i64,
    user_id: i64,
    status: String,
    total_price: Decimal,
    shipping_address: String,
    shipping_city: Option<String>,
    shipping_postal_code: Option<String>,
    shipping_cost: Decimal,
    phone: Option<String>,
    notes: Option<String>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
    customer_name: String,
    payment_status: String,
}

/// Orders table with customer name and payment state. All filters are bound
/// parameters; absent filters collapse to `IS NULL` guards.
pub async fn list_orders(state: &AppState, query: OrderListQuery) -> AppResult<OrderPage> {
    let (page, per_page, offset) = query.pagination().normalize();

    let status = query.status.as_ref().filter(|s| !s.is_empty()).cloned();
    if let Some(ref s) = status {
        OrderStatus::parse(s)?;
    }
    let search = query
        .search
        .as_ref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| format!("%{}%", s.trim()));

    let filter_sql = r#"
        FROM orders o
        JOIN users u ON u.id = o.user_id
        LEFT JOIN payments p ON p.order_id = o.id
        WHERE ($1::text IS NULL OR o.status = $1)
          AND ($2::text IS NULL
               OR u.first_name ILIKE $2
               OR u.last_name ILIKE $2
               OR u.email ILIKE $2
               OR CAST(o.id AS TEXT) ILIKE $2)
          AND ($3::date IS NULL OR o.created_at::date >= $3)
          AND ($4::date IS NULL OR o.created_at::date <= $4)
    "#;

    let rows = sqlx::query_as::<_, OrderRowDb>(&format!(
        r#"
        SELECT o.id, o.user_id, o.status, o.total_price, o.shipping_address,
               o.shipping_city, o.shipping_postal_code, o.shipping_cost,
               o.phone, o.notes, o.created_at, o.updated_at,
               u.first_name || ' ' || u.last_name AS customer_name,
               COALESCE(p.status, 'pending') AS payment_status
        {filter_sql}
        ORDER BY o.created_at DESC
        LIMIT $5 OFFSET $6
        "#
    ))
    .bind(status.clone())
    .bind(search.clone())
    .bind(query.start_date())
    .bind(query.end_date())
    .bind(per_page)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) {filter_sql}"))
        .bind(status)
        .bind(search)
        .bind(query.start_date())
        .bind(query.end_date())
        .fetch_one(&state.pool)
        .await?;

    let mut items = Vec::with_capacity(rows.len());
    for row in rows {
        items.push(OrderListRow {
            order: Order {
                id: row.id,
                user_id: row.user_id,
                status: OrderStatus::parse(&row.status)?,
                total_price: row.total_price,
                shipping_address: row.shipping_address,
                shipping_city: row.shipping_city,
                shipping_postal_code: row.shipping_postal_code,
                shipping_cost: row.shipping_cost,
                phone: row.phone,
                notes: row.notes,
                created_at: row.created_at,
                updated_at: row.updated_at,
            },
            customer_name: row.customer_name,
            payment_status: PaymentStatus::parse(&row.payment_status)?,
        });
    }

    Ok(OrderPage {
        items,
        page,
        per_page,
        total: total.0,
        total_pages: (total.0 + per_page - 1) / per_page,
    })
}

#[derive(FromRow)]
struct ItemRowDb {
    id: i64,
    order_id: i64,
    product_id: i64,
    quantity: i32,
    price: Decimal,
    customization_text: Option<String>,
    customization_image: Option<String>,
    customization_color: Option<String>,
    customization_size: Option<String>,
    created_at: chrono::DateTime<Utc>,
    product_name: String,
}

async fn fetch_items(state: &AppState, order_id: i64) -> AppResult<Vec<OrderItemDetail>> {
    let rows = sqlx::query_as::<_, ItemRowDb>(
        r#"
        SELECT oi.id, oi.order_id, oi.product_id, oi.quantity, oi.price,
               oi.customization_text, oi.customization_image,
               oi.customization_color, oi.customization_size,
               oi.created_at, p.name AS product_name
        FROM order_items oi
        JOIN products p ON p.id = oi.product_id
        WHERE oi.order_id = $1
        ORDER BY oi.id
        "#,
    )
    .bind(order_id)
    .fetch_all(&state.pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| OrderItemDetail {
            item: OrderItem {
                id: row.id,
                order_id: row.order_id,
                product_id: row.product_id,
                quantity: row.quantity,
                price: row.price,
                customization_text: row.customization_text,
                customization_image: row.customization_image,
                customization_color: row.customization_color,
                customization_size: row.customization_size,
                created_at: row.created_at,
            },
            product_name: row.product_name,
        })
        .collect())
}

async fn fetch_order(state: &AppState, id: i64) -> AppResult<OrderModel> {
    let order = Orders::find_by_id(id).one(&state.orm).await?;
    order.ok_or(AppError::NotFound)
}

async fn fetch_payment(state: &AppState, order_id: i64) -> AppResult<Option<PaymentModel>> {
    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(order_id))
        .one(&state.orm)
        .await?;
    Ok(payment)
}

/// Full order payload for the detail page and the order-details AJAX call.
pub async fn get_order_details(state: &AppState, id: i64) -> AppResult<OrderDetails> {
    let order_model = fetch_order(state, id).await?;
    let customer = Users::find_by_id(order_model.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let customer = user_from_entity(customer)?;

    let payment = match fetch_payment(state, id).await? {
        Some(p) => Some(payment_from_entity(p)?),
        None => None,
    };

    let items = fetch_items(state, id).await?;

    Ok(OrderDetails {
        order: order_from_entity(order_model)?,
        customer: OrderCustomer {
            id: customer.id,
            name: customer.full_name(),
            email: customer.email,
            phone: customer.phone,
        },
        payment,
        items,
    })
}

/// Run the §status rules for a proposed transition without writing anything.
pub async fn validate_status_update(
    state: &AppState,
    order_id: i64,
    new_status: &str,
) -> AppResult<StatusDecision> {
    let proposed = OrderStatus::parse(new_status)?;
    let order = fetch_order(state, order_id).await?;
    let current = OrderStatus::parse(&order.status)?;
    let payment_status = match fetch_payment(state, order_id).await? {
        Some(p) => PaymentStatus::parse(&p.status)?,
        None => PaymentStatus::Pending,
    };
    Ok(rules::validate_status_change(current, payment_status, proposed))
}

/// Validate and, when allowed, apply a status change. The decision is
/// returned either way so the caller can surface the rejection message.
pub async fn update_order_status(
    state: &AppState,
    admin: &CurrentAdmin,
    order_id: i64,
    new_status: &str,
) -> AppResult<(StatusDecision, Option<Order>)> {
    let decision = validate_status_update(state, order_id, new_status).await?;
    if !decision.allowed {
        return Ok((decision, None));
    }

    let order = fetch_order(state, order_id).await?;
    let mut active: OrderActive = order.into();
    active.status = Set(new_status.to_string());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "order_status_update",
        Some("orders"),
        Some(serde_json::json!({ "order_id": updated.id, "status": updated.status })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let updated = order_from_entity(updated)?;
    Ok((decision, Some(updated)))
}

/// Administrative payment update: no guard, to allow manual reconciliation
/// of out-of-band confirmations. Creates the payment row when missing.
pub async fn update_payment_status(
    state: &AppState,
    admin: &CurrentAdmin,
    order_id: i64,
    form: UpdatePaymentForm,
) -> AppResult<Payment> {
    let new_status = PaymentStatus::parse(&form.status)?;
    let amount = match form.amount.as_ref().filter(|a| !a.trim().is_empty()) {
        Some(raw) => Some(
            raw.trim()
                .parse::<Decimal>()
                .map_err(|_| AppError::BadRequest("Amount must be a number".into()))?,
        ),
        None => None,
    };

    let txn = state.orm.begin().await?;

    let order = Orders::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let existing = Payments::find()
        .filter(PaymentCol::OrderId.eq(order_id))
        .one(&txn)
        .await?;

    let now = Utc::now();
    let payment = match existing {
        Some(p) => {
            let payment_date = if new_status == PaymentStatus::Completed {
                Some(p.payment_date.unwrap_or_else(|| now.into()))
            } else {
                p.payment_date
            };
            let mut active: PaymentActive = p.into();
            active.status = Set(new_status.as_str().to_string());
            if let Some(method) = form.payment_method.filter(|m| !m.is_empty()) {
                active.payment_method = Set(Some(method));
            }
            if let Some(txid) = form.transaction_id.filter(|t| !t.is_empty()) {
                active.transaction_id = Set(Some(txid));
            }
            if let Some(amount) = amount {
                active.amount = Set(amount);
            }
            active.payment_date = Set(payment_date);
            active.updated_at = Set(now.into());
            active.update(&txn).await?
        }
        None => PaymentActive {
            id: NotSet,
            order_id: Set(order_id),
            status: Set(new_status.as_str().to_string()),
            payment_method: Set(form.payment_method.filter(|m| !m.is_empty())),
            transaction_id: Set(form.transaction_id.filter(|t| !t.is_empty())),
            amount: Set(amount.unwrap_or(order.total_price)),
            payment_date: Set((new_status == PaymentStatus::Completed).then(|| now.into())),
            created_at: NotSet,
            updated_at: NotSet,
        }
        .insert(&txn)
        .await?,
    };

    let mut order_active: OrderActive = order.into();
    order_active.updated_at = Set(now.into());
    order_active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(admin.user_id),
        "payment_status_update",
        Some("payments"),
        Some(serde_json::json!({ "order_id": order_id, "status": new_status.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    payment_from_entity(payment)
}

/// Payment read model plus the decision for advancing the order to its next
/// fulfilment stage; the UI renders warning banners from this.
pub async fn payment_validation(
    state: &AppState,
    order_id: i64,
) -> AppResult<PaymentValidationResponse> {
    let order = fetch_order(state, order_id).await?;
    let current = OrderStatus::parse(&order.status)?;

    let payment_model = fetch_payment(state, order_id).await?;
    let payment = match payment_model {
        Some(p) => Some(payment_from_entity(p)?),
        None => None,
    };
    let payment_status = payment.as_ref().map_or(PaymentStatus::Pending, |p| p.status);

    let validation = rules::validate_status_change(current, payment_status, current.next_forward());
    let payment_summary = rules::summarize_payment(order.total_price, payment.as_ref());

    Ok(PaymentValidationResponse {
        success: true,
        validation,
        payment_summary,
    })
}

#[derive(Debug)]
pub struct InvoiceData {
    pub order: Order,
    pub customer: User,
    pub items: Vec<OrderItemDetail>,
    pub totals: InvoiceTotals,
    pub invoice_number: String,
    pub store_name: String,
    pub store_email: Option<String>,
    pub store_address: Option<String>,
    pub currency: String,
}

pub async fn invoice_data(state: &AppState, order_id: i64) -> AppResult<InvoiceData> {
    use chrono::Datelike;

    let order_model = fetch_order(state, order_id).await?;
    let customer = Users::find_by_id(order_model.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let customer = user_from_entity(customer)?;

    let order = order_from_entity(order_model)?;
    let items = fetch_items(state, order_id).await?;
    let plain_items: Vec<OrderItem> = items.iter().map(|d| d.item.clone()).collect();

    let tax_rate = settings_service::tax_rate(state).await?;
    let totals = compute_totals(&plain_items, order.shipping_cost, tax_rate);
    let number = invoice_number(order.id, order.created_at.year());

    Ok(InvoiceData {
        invoice_number: number,
        store_name: settings_service::get_value(state, "store_name")
            .await?
            .unwrap_or_else(|| "Terral".to_string()),
        store_email: settings_service::get_value(state, "store_email").await?,
        store_address: settings_service::get_value(state, "store_address").await?,
        currency: settings_service::currency_symbol(state).await?,
        order,
        customer,
        items,
        totals,
    })
}

pub(crate) fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        user_id: model.user_id,
        status: OrderStatus::parse(&model.status)?,
        total_price: model.total_price,
        shipping_address: model.shipping_address,
        shipping_city: model.shipping_city,
        shipping_postal_code: model.shipping_postal_code,
        shipping_cost: model.shipping_cost,
        phone: model.phone,
        notes: model.notes,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

pub(crate) fn payment_from_entity(model: PaymentModel) -> AppResult<Payment> {
    Ok(Payment {
        id: model.id,
        order_id: model.order_id,
        status: PaymentStatus::parse(&model.status)?,
        payment_method: model.payment_method,
        transaction_id: model.transaction_id,
        amount: model.amount,
        payment_date: model.payment_date.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
