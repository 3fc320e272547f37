use rust_decimal::Decimal;

/// Fields collected from the product form (multipart, because of the image
/// upload). Parsed manually in the route; kept as submitted so a failed
/// validation can re-render the form with the user's input.
#[derive(Debug, Default, Clone)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub price: String,
    pub stock: String,
    pub category_id: String,
    pub status: String,
    pub is_customizable: bool,
    pub sku: String,
    pub weight: String,
    pub dimensions: String,
    /// Stored filename, set once the upload is written to disk.
    pub image: Option<String>,
}

/// The same form after validation.
#[derive(Debug, Clone)]
pub struct ValidProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: i64,
    pub status: String,
    pub is_customizable: bool,
    pub sku: Option<String>,
    pub weight: Option<Decimal>,
    pub dimensions: Option<String>,
    pub image: Option<String>,
}

impl ProductForm {
    /// Validate the submitted fields, collecting every error so the form
    /// can show them all at once.
    pub fn validate(&self) -> Result<ValidProduct, Vec<String>> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Product name is required".to_string());
        }

        let price = match self.price.trim().parse::<Decimal>() {
            Ok(p) if p >= Decimal::ZERO => Some(p),
            Ok(_) => {
                errors.push("Price cannot be negative".to_string());
                None
            }
            Err(_) => {
                errors.push("Price must be a number".to_string());
                None
            }
        };

        let stock = match self.stock.trim().parse::<i32>() {
            Ok(s) if s >= 0 => Some(s),
            Ok(_) => {
                errors.push("Stock cannot be negative".to_string());
                None
            }
            Err(_) => {
                errors.push("Stock must be a whole number".to_string());
                None
            }
        };

        let category_id = match self.category_id.trim().parse::<i64>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.push("Category is required".to_string());
                None
            }
        };

        let weight = if self.weight.trim().is_empty() {
            None
        } else {
            match self.weight.trim().parse::<Decimal>() {
                Ok(w) => Some(w),
                Err(_) => {
                    errors.push("Weight must be a number".to_string());
                    None
                }
            }
        };

        match (price, stock, category_id) {
            (Some(price), Some(stock), Some(category_id)) if errors.is_empty() => {
                Ok(ValidProduct {
                    name: self.name.trim().to_string(),
                    description: none_if_empty(&self.description),
                    price,
                    stock,
                    category_id,
                    status: if self.status.trim().is_empty() {
                        "active".to_string()
                    } else {
                        self.status.trim().to_string()
                    },
                    is_customizable: self.is_customizable,
                    sku: none_if_empty(&self.sku),
                    weight,
                    dimensions: none_if_empty(&self.dimensions),
                    image: self.image.clone(),
                })
            }
            _ => Err(errors),
        }
    }
}

fn none_if_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct DeleteProductForm {
    #[serde(default)]
    pub force_delete: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_form_passes() {
        let form = ProductForm {
            name: "Tote Bag".into(),
            price: "1200.50".into(),
            stock: "15".into(),
            category_id: "3".into(),
            ..Default::default()
        };
        let valid = form.validate().unwrap();
        assert_eq!(valid.price, Decimal::new(120050, 2));
        assert_eq!(valid.status, "active");
        assert_eq!(valid.sku, None);
    }

    #[test]
    fn errors_are_collected_not_short_circuited() {
        let form = ProductForm {
            name: "".into(),
            price: "abc".into(),
            stock: "-3".into(),
            category_id: "".into(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
    }
}
