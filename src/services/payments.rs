use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::PaymentDetail;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub total_paid: Decimal,
    pub pending_balance: Decimal,
    pub is_paid: bool,
}

// Exact comparison, no epsilon: a booking is paid when the sum of its
// payments reaches the price.
pub fn reconcile(price: Decimal, payments: &[PaymentDetail]) -> PaymentSummary {
    let total_paid: Decimal = payments.iter().map(|p| p.amount).sum();

    if price <= Decimal::ZERO {
        return PaymentSummary {
            total_paid,
            pending_balance: Decimal::ZERO,
            is_paid: true,
        };
    }

    let is_paid = total_paid >= price;
    let pending_balance = std::cmp::max(price - total_paid, Decimal::ZERO);

    PaymentSummary {
        total_paid,
        pending_balance,
        is_paid,
    }
}

// Payments arrive from cash desk and forms in arbitrary order; the ledger
// stays sorted by receipt time, unstamped entries at the end.
pub fn merge_payments(
    mut existing: Vec<PaymentDetail>,
    incoming: Vec<PaymentDetail>,
) -> Vec<PaymentDetail> {
    existing.extend(incoming);
    existing.sort_by_key(|p| (p.received_at.is_none(), p.received_at));
    existing
}
