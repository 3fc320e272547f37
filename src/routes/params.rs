use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

// Browser forms submit empty strings for untouched filters, so numeric and
// date filters arrive as strings and are parsed leniently.
fn parse_id(value: &Option<String>) -> Option<i64> {
    value.as_deref().and_then(|s| s.trim().parse().ok())
}

fn parse_date(value: &Option<String>) -> Option<NaiveDate> {
    value.as_deref().and_then(|s| s.trim().parse().ok())
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub category_id: Option<String>,
    pub search: Option<String>,
}

impl ProductListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn category_id(&self) -> Option<i64> {
        parse_id(&self.category_id)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_date(&self.start_date)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        parse_date(&self.end_date)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CustomerListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
    pub status: Option<String>,
}

impl CustomerListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(rename = "type")]
    pub report_type: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ReportQuery {
    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_date(&self.start_date)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        parse_date(&self.end_date)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExportForm {
    pub export_format: String,
    pub export_type: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

impl ExportForm {
    pub fn start_date(&self) -> Option<NaiveDate> {
        parse_date(&self.start_date)
    }

    pub fn end_date(&self) -> Option<NaiveDate> {
        parse_date(&self.end_date)
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AjaxOrderQuery {
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_clamps_and_offsets() {
        let p = Pagination {
            page: Some(3),
            per_page: Some(10),
        };
        assert_eq!(p.normalize(), (3, 10, 20));

        let p = Pagination {
            page: Some(0),
            per_page: Some(1000),
        };
        assert_eq!(p.normalize(), (1, 100, 0));

        assert_eq!(Pagination::default().normalize(), (1, 20, 0));
    }

    #[test]
    fn empty_filter_strings_parse_to_none() {
        let q = OrderListQuery {
            start_date: Some(String::new()),
            end_date: Some("2024-02-01".into()),
            ..Default::default()
        };
        assert_eq!(q.start_date(), None);
        assert_eq!(
            q.end_date(),
            Some(NaiveDate::from_ymd_opt(2024, 2, 1).unwrap())
        );

        let q = ProductListQuery {
            category_id: Some("not-a-number".into()),
            ..Default::default()
        };
        assert_eq!(q.category_id(), None);
    }
}
