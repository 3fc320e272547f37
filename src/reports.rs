//! Report row types, money formatting and CSV assembly.
//!
//! The SQL aggregation lives in `services::report_service`; everything here
//! is a pure projection so the column sets and formatting stay testable.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    Overview,
    Sales,
    Products,
    Customers,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::Overview => "overview",
            ReportType::Sales => "sales",
            ReportType::Products => "products",
            ReportType::Customers => "customers",
        }
    }

    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "overview" => Ok(ReportType::Overview),
            "sales" => Ok(ReportType::Sales),
            "products" => Ok(ReportType::Products),
            "customers" => Ok(ReportType::Customers),
            _ => Err(AppError::BadRequest(format!("Invalid report type: {value}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    pub fn parse(value: &str) -> Result<Self, AppError> {
        match value {
            "csv" => Ok(ExportFormat::Csv),
            "pdf" => Ok(ExportFormat::Pdf),
            _ => Err(AppError::BadRequest(format!(
                "Invalid export format: {value}"
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            // The "pdf" export is a print-styled HTML document.
            ExportFormat::Pdf => "html",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv",
            ExportFormat::Pdf => "text/html; charset=utf-8",
        }
    }
}

#[derive(Debug, Clone)]
pub struct OverviewReport {
    pub total_orders: i64,
    pub total_revenue: Decimal,
    pub total_customers: i64,
    pub average_order_value: Decimal,
}

#[derive(Debug, Clone)]
pub struct SalesRow {
    pub date: NaiveDate,
    pub orders: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone)]
pub struct ProductRow {
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
    pub units_sold: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Clone)]
pub struct CustomerRow {
    pub name: String,
    pub email: String,
    pub orders: i64,
    pub total_spent: Decimal,
}

/// Two decimals, currency prefix. `KSh 1250.00`.
pub fn format_money(symbol: &str, amount: Decimal) -> String {
    format!("{symbol} {amount:.2}")
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_line(fields: &[String]) -> String {
    let escaped: Vec<String> = fields.iter().map(|f| csv_field(f)).collect();
    escaped.join(",")
}

pub fn overview_csv(report: &OverviewReport, symbol: &str) -> String {
    let mut csv = String::from("Metric,Value\n");
    csv.push_str(&csv_line(&[
        "Total Orders".into(),
        report.total_orders.to_string(),
    ]));
    csv.push('\n');
    csv.push_str(&csv_line(&[
        "Total Revenue".into(),
        format_money(symbol, report.total_revenue),
    ]));
    csv.push('\n');
    csv.push_str(&csv_line(&[
        "Total Customers".into(),
        report.total_customers.to_string(),
    ]));
    csv.push('\n');
    csv.push_str(&csv_line(&[
        "Average Order Value".into(),
        format_money(symbol, report.average_order_value),
    ]));
    csv.push('\n');
    csv
}

pub fn sales_csv(rows: &[SalesRow], symbol: &str) -> String {
    let mut csv = String::from("Date,Orders,Revenue\n");
    for row in rows {
        csv.push_str(&csv_line(&[
            row.date.format("%Y-%m-%d").to_string(),
            row.orders.to_string(),
            format_money(symbol, row.revenue),
        ]));
        csv.push('\n');
    }
    csv
}

pub fn products_csv(rows: &[ProductRow], symbol: &str) -> String {
    let mut csv = String::from("Product Name,Price,Stock Quantity,Units Sold,Total Revenue\n");
    for row in rows {
        csv.push_str(&csv_line(&[
            row.name.clone(),
            format_money(symbol, row.price),
            row.stock.to_string(),
            row.units_sold.to_string(),
            format_money(symbol, row.revenue),
        ]));
        csv.push('\n');
    }
    csv
}

pub fn customers_csv(rows: &[CustomerRow], symbol: &str) -> String {
    let mut csv = String::from("Customer Name,Email,Orders,Total Spent\n");
    for row in rows {
        csv.push_str(&csv_line(&[
            row.name.clone(),
            row.email.clone(),
            row.orders.to_string(),
            format_money(symbol, row.total_spent),
        ]));
        csv.push('\n');
    }
    csv
}

pub fn export_filename(
    report_type: ReportType,
    format: ExportFormat,
    start: NaiveDate,
    end: NaiveDate,
) -> String {
    format!(
        "{}-report-{}-{}.{}",
        report_type.as_str(),
        start.format("%Y-%m-%d"),
        end.format("%Y-%m-%d"),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_renders_two_decimals_with_prefix() {
        assert_eq!(format_money("KSh", Decimal::new(125050, 2)), "KSh 1250.50");
        assert_eq!(format_money("KSh", Decimal::from(2000)), "KSh 2000.00");
    }

    #[test]
    fn products_csv_with_no_rows_is_header_only() {
        let csv = products_csv(&[], "KSh");
        assert_eq!(
            csv,
            "Product Name,Price,Stock Quantity,Units Sold,Total Revenue\n"
        );
    }

    #[test]
    fn products_csv_rows_follow_the_header() {
        let rows = vec![ProductRow {
            name: "Mug, ceramic".into(),
            price: Decimal::from(500),
            stock: 12,
            units_sold: 3,
            revenue: Decimal::from(1500),
        }];
        let csv = products_csv(&rows, "KSh");
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Product Name,Price,Stock Quantity,Units Sold,Total Revenue")
        );
        assert_eq!(
            lines.next(),
            Some("\"Mug, ceramic\",KSh 500.00,12,3,KSh 1500.00")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn fields_with_quotes_are_escaped() {
        assert_eq!(csv_field("plain"), "plain");
        assert_eq!(csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn export_filename_carries_range_and_extension() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            export_filename(ReportType::Products, ExportFormat::Csv, start, end),
            "products-report-2024-01-01-2024-01-31.csv"
        );
        assert_eq!(
            export_filename(ReportType::Sales, ExportFormat::Pdf, start, end),
            "sales-report-2024-01-01-2024-01-31.html"
        );
    }
}
