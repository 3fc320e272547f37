//! Invoice numbering and totals.

use rust_decimal::Decimal;

use crate::models::OrderItem;

/// Deterministic invoice number: `INV-<year>-<order id, zero-padded to 6>`.
/// The year is taken from the order's creation date.
pub fn invoice_number(order_id: i64, year: i32) -> String {
    format!("INV-{year}-{order_id:06}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

/// Compute invoice totals from item snapshots. `tax_rate` is a percentage
/// (settings key `tax_rate`); tax is rounded to two decimal places.
pub fn compute_totals(items: &[OrderItem], shipping: Decimal, tax_rate: Decimal) -> InvoiceTotals {
    let subtotal: Decimal = items
        .iter()
        .map(|item| item.price * Decimal::from(item.quantity))
        .sum();
    let tax = (subtotal * tax_rate / Decimal::from(100)).round_dp(2);
    InvoiceTotals {
        subtotal,
        shipping,
        tax,
        total: subtotal + shipping + tax,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn item(quantity: i32, price: i64) -> OrderItem {
        OrderItem {
            id: 0,
            order_id: 1,
            product_id: 1,
            quantity,
            price: Decimal::from(price),
            customization_text: None,
            customization_image: None,
            customization_color: None,
            customization_size: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn invoice_number_is_zero_padded() {
        assert_eq!(invoice_number(42, 2024), "INV-2024-000042");
        assert_eq!(invoice_number(1234567, 2025), "INV-2025-1234567");
    }

    #[test]
    fn subtotal_sums_item_snapshots() {
        let items = [item(2, 500), item(1, 1000)];
        let totals = compute_totals(&items, Decimal::ZERO, Decimal::ZERO);
        assert_eq!(totals.subtotal, Decimal::from(2000));
        assert_eq!(totals.total, Decimal::from(2000));
    }

    #[test]
    fn total_adds_shipping_and_tax() {
        let items = [item(2, 500), item(1, 1000)];
        let totals = compute_totals(&items, Decimal::from(200), Decimal::from(16));
        assert_eq!(totals.subtotal, Decimal::from(2000));
        assert_eq!(totals.shipping, Decimal::from(200));
        assert_eq!(totals.tax, Decimal::from(320));
        assert_eq!(totals.total, Decimal::from(2520));
    }

    #[test]
    fn total_without_tax_is_subtotal_plus_shipping() {
        let items = [item(2, 500), item(1, 1000)];
        let totals = compute_totals(&items, Decimal::from(150), Decimal::ZERO);
        assert_eq!(totals.total, Decimal::from(2150));
    }
}
