use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form, Router,
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::{Duration, NaiveDate, Utc};
use tower_sessions::Session;

use crate::{
    error::AppResult,
    middleware::{
        auth::RequireAdmin,
        flash::{Flash, take_flash},
    },
    reports::{
        ExportFormat, ReportType, customers_csv, export_filename, format_money, overview_csv,
        products_csv, sales_csv,
    },
    routes::params::{ExportForm, ReportQuery},
    services::{report_service, settings_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(reports_page))
        .route("/export", axum::routing::post(export_report))
}

fn default_range() -> (NaiveDate, NaiveDate) {
    let today = Utc::now().date_naive();
    (today - Duration::days(30), today)
}

/// Column headers and stringified rows for one report type, shared by the
/// HTML page and the HTML export.
async fn report_table(
    state: &AppState,
    report_type: ReportType,
    start: NaiveDate,
    end: NaiveDate,
    currency: &str,
) -> AppResult<(Vec<String>, Vec<Vec<String>>)> {
    let table = match report_type {
        ReportType::Overview => {
            let report = report_service::overview(state, start, end).await?;
            (
                vec!["Metric".to_string(), "Value".to_string()],
                vec![
                    vec!["Total Orders".to_string(), report.total_orders.to_string()],
                    vec![
                        "Total Revenue".to_string(),
                        format_money(currency, report.total_revenue),
                    ],
                    vec![
                        "Total Customers".to_string(),
                        report.total_customers.to_string(),
                    ],
                    vec![
                        "Average Order Value".to_string(),
                        format_money(currency, report.average_order_value),
                    ],
                ],
            )
        }
        ReportType::Sales => {
            let rows = report_service::sales(state, start, end).await?;
            (
                vec![
                    "Date".to_string(),
                    "Orders".to_string(),
                    "Revenue".to_string(),
                ],
                rows.iter()
                    .map(|r| {
                        vec![
                            r.date.format("%Y-%m-%d").to_string(),
                            r.orders.to_string(),
                            format_money(currency, r.revenue),
                        ]
                    })
                    .collect(),
            )
        }
        ReportType::Products => {
            let rows = report_service::products(state, start, end).await?;
            (
                vec![
                    "Product Name".to_string(),
                    "Price".to_string(),
                    "Stock Quantity".to_string(),
                    "Units Sold".to_string(),
                    "Total Revenue".to_string(),
                ],
                rows.iter()
                    .map(|r| {
                        vec![
                            r.name.clone(),
                            format_money(currency, r.price),
                            r.stock.to_string(),
                            r.units_sold.to_string(),
                            format_money(currency, r.revenue),
                        ]
                    })
                    .collect(),
            )
        }
        ReportType::Customers => {
            let rows = report_service::customers(state, start, end).await?;
            (
                vec![
                    "Customer Name".to_string(),
                    "Email".to_string(),
                    "Orders".to_string(),
                    "Total Spent".to_string(),
                ],
                rows.iter()
                    .map(|r| {
                        vec![
                            r.name.clone(),
                            r.email.clone(),
                            r.orders.to_string(),
                            format_money(currency, r.total_spent),
                        ]
                    })
                    .collect(),
            )
        }
    };
    Ok(table)
}

#[derive(Template, WebTemplate)]
#[template(path = "reports/index.html")]
pub struct ReportsTemplate {
    pub flashes: Vec<Flash>,
    pub report_type: String,
    pub start_date: String,
    pub end_date: String,
    pub total_orders: i64,
    pub total_revenue: String,
    pub total_customers: i64,
    pub average_order_value: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub types: Vec<String>,
}

pub async fn reports_page(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    session: Session,
    Query(query): Query<ReportQuery>,
) -> AppResult<ReportsTemplate> {
    let (default_start, default_end) = default_range();
    let start = query.start_date().unwrap_or(default_start);
    let end = query.end_date().unwrap_or(default_end);
    let report_type = match query.report_type.as_deref().filter(|t| !t.is_empty()) {
        Some(t) => ReportType::parse(t)?,
        None => ReportType::Overview,
    };

    let currency = settings_service::currency_symbol(&state).await?;
    let overview = report_service::overview(&state, start, end).await?;
    let (headers, rows) = report_table(&state, report_type, start, end, &currency).await?;

    Ok(ReportsTemplate {
        flashes: take_flash(&session).await,
        report_type: report_type.as_str().to_string(),
        start_date: start.to_string(),
        end_date: end.to_string(),
        total_orders: overview.total_orders,
        total_revenue: format_money(&currency, overview.total_revenue),
        total_customers: overview.total_customers,
        average_order_value: format_money(&currency, overview.average_order_value),
        headers,
        rows,
        types: ["overview", "sales", "products", "customers"]
            .iter()
            .map(|t| t.to_string())
            .collect(),
    })
}

#[derive(Template)]
#[template(path = "reports/export.html")]
pub struct ReportExportTemplate {
    pub title: String,
    pub start_date: String,
    pub end_date: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// File download: CSV, or a print-styled HTML document for the "pdf"
/// format. Either way the response carries an attachment disposition.
pub async fn export_report(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Form(form): Form<ExportForm>,
) -> AppResult<Response> {
    let format = ExportFormat::parse(&form.export_format)?;
    let report_type = ReportType::parse(&form.export_type)?;
    let (default_start, default_end) = default_range();
    let start = form.start_date().unwrap_or(default_start);
    let end = form.end_date().unwrap_or(default_end);

    let currency = settings_service::currency_symbol(&state).await?;

    let body = match format {
        ExportFormat::Csv => match report_type {
            ReportType::Overview => {
                let report = report_service::overview(&state, start, end).await?;
                overview_csv(&report, &currency)
            }
            ReportType::Sales => {
                let rows = report_service::sales(&state, start, end).await?;
                sales_csv(&rows, &currency)
            }
            ReportType::Products => {
                let rows = report_service::products(&state, start, end).await?;
                products_csv(&rows, &currency)
            }
            ReportType::Customers => {
                let rows = report_service::customers(&state, start, end).await?;
                customers_csv(&rows, &currency)
            }
        },
        ExportFormat::Pdf => {
            let (headers, rows) = report_table(&state, report_type, start, end, &currency).await?;
            ReportExportTemplate {
                title: format!("{} report", report_type.as_str()),
                start_date: start.to_string(),
                end_date: end.to_string(),
                headers,
                rows,
            }
            .render()?
        }
    };

    let filename = export_filename(report_type, format, start, end);
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}
