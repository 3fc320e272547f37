use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::FromRow;

use crate::{
    error::AppResult,
    reports::{CustomerRow, OverviewReport, ProductRow, SalesRow},
    routes::params::OrderListQuery,
    services::order_service::{self, OrderListRow},
    state::AppState,
};

/// Aggregates for the `[start, end]` range (inclusive, by order date).
/// Revenue always excludes canceled orders.
pub async fn overview(
    state: &AppState,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<OverviewReport> {
    #[derive(FromRow)]
    struct Row {
        total_orders: i64,
        billable_orders: i64,
        total_revenue: Decimal,
        total_customers: i64,
    }

    let row: Row = sqlx::query_as(
        r#"
        SELECT COUNT(*) AS total_orders,
               COUNT(*) FILTER (WHERE status <> 'canceled') AS billable_orders,
               COALESCE(SUM(total_price) FILTER (WHERE status <> 'canceled'), 0) AS total_revenue,
               COUNT(DISTINCT user_id) AS total_customers
        FROM orders
        WHERE created_at::date BETWEEN $1 AND $2
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_one(&state.pool)
    .await?;

    let average_order_value = if row.billable_orders > 0 {
        (row.total_revenue / Decimal::from(row.billable_orders)).round_dp(2)
    } else {
        Decimal::ZERO
    };

    Ok(OverviewReport {
        total_orders: row.total_orders,
        total_revenue: row.total_revenue,
        total_customers: row.total_customers,
        average_order_value,
    })
}

pub async fn sales(state: &AppState, start: NaiveDate, end: NaiveDate) -> AppResult<Vec<SalesRow>> {
    #[derive(FromRow)]
    struct Row {
        date: NaiveDate,
        orders: i64,
        revenue: Decimal,
    }

    let rows: Vec<Row> = sqlx::query_as(
        r#"
        SELECT created_at::date AS date,
               COUNT(*) AS orders,
               COALESCE(SUM(total_price) FILTER (WHERE status <> 'canceled'), 0) AS revenue
        FROM orders
        WHERE created_at::date BETWEEN $1 AND $2
        GROUP BY created_at::date
        ORDER BY date
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&state.pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| SalesRow {
            date: r.date,
            orders: r.orders,
            revenue: r.revenue,
        })
        .collect())
}

/// Per-product sales in range. Only products actually sold in the range
/// appear; an empty range exports as a bare header.
pub async fn products(
    state: &AppState,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<ProductRow>> {
    #[derive(FromRow)]
    struct Row {
        name: String,
        price: Decimal,
        stock: i32,
        units_sold: i64,
        revenue: Decimal,
    }

    let rows: Vec<Row> = sqlx::query_as(
        r#"
        SELECT p.name, p.price, p.stock,
               COALESCE(SUM(oi.quantity), 0)::BIGINT AS units_sold,
               COALESCE(SUM(oi.quantity * oi.price), 0) AS revenue
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        JOIN products p ON p.id = oi.product_id
        WHERE o.created_at::date BETWEEN $1 AND $2
          AND o.status <> 'canceled'
        GROUP BY p.id, p.name, p.price, p.stock
        ORDER BY revenue DESC, p.name
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&state.pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| ProductRow {
            name: r.name,
            price: r.price,
            stock: r.stock,
            units_sold: r.units_sold,
            revenue: r.revenue,
        })
        .collect())
}

pub async fn customers(
    state: &AppState,
    start: NaiveDate,
    end: NaiveDate,
) -> AppResult<Vec<CustomerRow>> {
    #[derive(FromRow)]
    struct Row {
        name: String,
        email: String,
        orders: i64,
        total_spent: Decimal,
    }

    let rows: Vec<Row> = sqlx::query_as(
        r#"
        SELECT u.first_name || ' ' || u.last_name AS name, u.email,
               COUNT(o.id) AS orders,
               COALESCE(SUM(o.total_price) FILTER (WHERE o.status <> 'canceled'), 0) AS total_spent
        FROM users u
        JOIN orders o ON o.user_id = u.id
        WHERE o.created_at::date BETWEEN $1 AND $2
        GROUP BY u.id, u.first_name, u.last_name, u.email
        ORDER BY total_spent DESC, u.email
        "#,
    )
    .bind(start)
    .bind(end)
    .fetch_all(&state.pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| CustomerRow {
            name: r.name,
            email: r.email,
            orders: r.orders,
            total_spent: r.total_spent,
        })
        .collect())
}

#[derive(Debug)]
pub struct DashboardData {
    pub total_products: i64,
    pub total_orders: i64,
    pub total_customers: i64,
    pub pending_orders: i64,
    pub total_revenue: Decimal,
    pub recent_orders: Vec<OrderListRow>,
}

pub async fn dashboard(state: &AppState) -> AppResult<DashboardData> {
    #[derive(FromRow)]
    struct Counts {
        total_products: i64,
        total_orders: i64,
        total_customers: i64,
        pending_orders: i64,
        total_revenue: Decimal,
    }

    let counts: Counts = sqlx::query_as(
        r#"
        SELECT
            (SELECT COUNT(*) FROM products WHERE deleted_at IS NULL) AS total_products,
            (SELECT COUNT(*) FROM orders) AS total_orders,
            (SELECT COUNT(*) FROM users WHERE role = 'customer') AS total_customers,
            (SELECT COUNT(*) FROM orders WHERE status = 'pending') AS pending_orders,
            (SELECT COALESCE(SUM(total_price), 0) FROM orders WHERE status <> 'canceled')
                AS total_revenue
        "#,
    )
    .fetch_one(&state.pool)
    .await?;

    let recent = order_service::list_orders(
        state,
        OrderListQuery {
            page: Some(1),
            per_page: Some(5),
            ..Default::default()
        },
    )
    .await?;

    Ok(DashboardData {
        total_products: counts.total_products,
        total_orders: counts.total_orders,
        total_customers: counts.total_customers,
        pending_orders: counts.pending_orders,
        total_revenue: counts.total_revenue,
        recent_orders: recent.items,
    })
}
