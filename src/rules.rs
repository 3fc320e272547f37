//! Order/payment status validation.
//!
//! Pure functions consulted by the order endpoints before any write. The
//! surrounding handler does the lookups; nothing here touches the database.

use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{OrderStatus, Payment, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionCode {
    Allowed,
    PaymentNotCompleted,
    PaymentRequiredForDelivery,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusDecision {
    pub allowed: bool,
    pub message: String,
    pub code: DecisionCode,
}

impl StatusDecision {
    fn allow() -> Self {
        Self {
            allowed: true,
            message: "Status change allowed".to_string(),
            code: DecisionCode::Allowed,
        }
    }

    fn reject(code: DecisionCode, message: impl Into<String>) -> Self {
        Self {
            allowed: false,
            message: message.into(),
            code,
        }
    }
}

/// Decide whether an order may move from `current` to `proposed` given the
/// state of its payment.
///
/// Two independent guards, checked in order:
/// 1. `delivered` is never recorded while payment is outstanding.
/// 2. any forward move on the fulfilment track requires a completed payment.
///
/// Backward moves, cancellation and same-status updates carry no guard.
pub fn validate_status_change(
    current: OrderStatus,
    payment: PaymentStatus,
    proposed: OrderStatus,
) -> StatusDecision {
    if payment == PaymentStatus::Completed {
        return StatusDecision::allow();
    }

    if proposed == OrderStatus::Delivered {
        return StatusDecision::reject(
            DecisionCode::PaymentRequiredForDelivery,
            "Order cannot be marked as delivered until its payment is completed",
        );
    }

    if let (Some(from), Some(to)) = (current.fulfillment_rank(), proposed.fulfillment_rank()) {
        if to > from {
            return StatusDecision::reject(
                DecisionCode::PaymentNotCompleted,
                "Payment must be completed before the order status can advance",
            );
        }
    }

    StatusDecision::allow()
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaymentSummary {
    pub exists: bool,
    pub status: PaymentStatus,
    pub payment_method: Option<String>,
    pub transaction_id: Option<String>,
    #[schema(value_type = String)]
    pub amount: Decimal,
    #[schema(value_type = String)]
    pub order_total: Decimal,
    pub amount_matches: bool,
    pub is_valid: bool,
}

/// Project an order's payment into the read model the UI renders warning
/// banners from. A missing payment row reads as a pending payment of zero.
pub fn summarize_payment(order_total: Decimal, payment: Option<&Payment>) -> PaymentSummary {
    match payment {
        Some(p) => {
            let amount_matches = p.amount == order_total;
            PaymentSummary {
                exists: true,
                status: p.status,
                payment_method: p.payment_method.clone(),
                transaction_id: p.transaction_id.clone(),
                amount: p.amount,
                order_total,
                amount_matches,
                is_valid: p.status == PaymentStatus::Completed && amount_matches,
            }
        }
        None => PaymentSummary {
            exists: false,
            status: PaymentStatus::Pending,
            payment_method: None,
            transaction_id: None,
            amount: Decimal::ZERO,
            order_total,
            amount_matches: false,
            is_valid: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn payment(status: PaymentStatus, amount: i64) -> Payment {
        Payment {
            id: 1,
            order_id: 1,
            status,
            payment_method: Some("mpesa".into()),
            transaction_id: Some("TX123".into()),
            amount: Decimal::new(amount, 2),
            payment_date: Some(Utc::now()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn delivery_requires_completed_payment() {
        for payment in [
            PaymentStatus::Pending,
            PaymentStatus::Processing,
            PaymentStatus::Failed,
            PaymentStatus::Refunded,
            PaymentStatus::Canceled,
        ] {
            let decision = validate_status_change(
                OrderStatus::Shipped,
                payment,
                OrderStatus::Delivered,
            );
            assert!(!decision.allowed);
            assert_eq!(decision.code, DecisionCode::PaymentRequiredForDelivery);
        }
    }

    #[test]
    fn delivery_code_wins_even_from_pending() {
        // Delivered is also a forward move; the specific code takes priority.
        let decision = validate_status_change(
            OrderStatus::Pending,
            PaymentStatus::Pending,
            OrderStatus::Delivered,
        );
        assert_eq!(decision.code, DecisionCode::PaymentRequiredForDelivery);
    }

    #[test]
    fn forward_moves_blocked_without_completed_payment() {
        let cases = [
            (OrderStatus::Pending, OrderStatus::Processing),
            (OrderStatus::Pending, OrderStatus::Shipped),
            (OrderStatus::Processing, OrderStatus::Shipped),
        ];
        for (current, proposed) in cases {
            let decision =
                validate_status_change(current, PaymentStatus::Pending, proposed);
            assert!(!decision.allowed, "{current:?} -> {proposed:?}");
            assert_eq!(decision.code, DecisionCode::PaymentNotCompleted);
        }
    }

    #[test]
    fn completed_payment_allows_every_forward_move() {
        let cases = [
            (OrderStatus::Pending, OrderStatus::Processing),
            (OrderStatus::Processing, OrderStatus::Shipped),
            (OrderStatus::Shipped, OrderStatus::Delivered),
            (OrderStatus::Pending, OrderStatus::Delivered),
        ];
        for (current, proposed) in cases {
            let decision =
                validate_status_change(current, PaymentStatus::Completed, proposed);
            assert!(decision.allowed, "{current:?} -> {proposed:?}");
            assert_eq!(decision.code, DecisionCode::Allowed);
        }
    }

    #[test]
    fn backward_and_cancel_moves_are_unguarded() {
        let cases = [
            (OrderStatus::Processing, OrderStatus::Pending),
            (OrderStatus::Shipped, OrderStatus::Processing),
            (OrderStatus::Pending, OrderStatus::Canceled),
            (OrderStatus::Processing, OrderStatus::Canceled),
            (OrderStatus::Pending, OrderStatus::Pending),
        ];
        for (current, proposed) in cases {
            let decision =
                validate_status_change(current, PaymentStatus::Pending, proposed);
            assert!(decision.allowed, "{current:?} -> {proposed:?}");
        }
    }

    #[test]
    fn missing_payment_reads_as_pending_zero() {
        let summary = summarize_payment(Decimal::new(250000, 2), None);
        assert!(!summary.exists);
        assert_eq!(summary.status, PaymentStatus::Pending);
        assert_eq!(summary.amount, Decimal::ZERO);
        assert!(!summary.amount_matches);
        assert!(!summary.is_valid);
    }

    #[test]
    fn mismatched_amount_is_flagged() {
        let p = payment(PaymentStatus::Completed, 100000);
        let summary = summarize_payment(Decimal::new(250000, 2), Some(&p));
        assert!(summary.exists);
        assert!(!summary.amount_matches);
        assert!(!summary.is_valid);
    }

    #[test]
    fn completed_matching_payment_is_valid() {
        let p = payment(PaymentStatus::Completed, 250000);
        let summary = summarize_payment(Decimal::new(250000, 2), Some(&p));
        assert!(summary.amount_matches);
        assert!(summary.is_valid);
    }

    #[test]
    fn incomplete_payment_is_never_valid_even_when_amounts_match() {
        let p = payment(PaymentStatus::Pending, 250000);
        let summary = summarize_payment(Decimal::new(250000, 2), Some(&p));
        assert!(summary.amount_matches);
        assert!(!summary.is_valid);
    }
}
