//! Source of external deposits and redemptions for a bond holding

use crate::month::YearMonth;
use rust_decimal::Decimal;

/// Supplies the net external activity for a month: positive for deposits,
/// negative for redemptions, zero when nothing happened. Asked once per
/// month walked.
pub trait ExternalCashFlowProvider {
    fn net_change(&mut self, month: YearMonth) -> Decimal;
}

impl<F: FnMut(YearMonth) -> Decimal> ExternalCashFlowProvider for F {
    fn net_change(&mut self, month: YearMonth) -> Decimal {
        self(month)
    }
}

/// A single purchase in the issue month and no later activity
#[derive(Debug, Clone, Copy)]
pub struct SinglePurchase {
    pub issue_month: YearMonth,
    pub amount: Decimal,
}

impl ExternalCashFlowProvider for SinglePurchase {
    fn net_change(&mut self, month: YearMonth) -> Decimal {
        if month == self.issue_month {
            self.amount
        } else {
            Decimal::ZERO
        }
    }
}
