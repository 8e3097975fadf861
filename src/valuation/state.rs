//! Balance tracking for a single bond holding during an interest walk

use crate::month::YearMonth;
use rust_decimal::Decimal;

/// Intermediate balances while calculating interest payments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceRec {
    /// Full balance: deposits, redemptions and all credited interest
    total_bal: Decimal,

    /// Portion of the balance earning interest this epoch. Interest credited
    /// within an epoch joins it only at the next semiannual boundary.
    eligible_bal: Decimal,

    /// Month the balances apply to
    month: YearMonth,
}

impl BalanceRec {
    /// Initialize state from the net deposits of the issue month
    pub fn seed(month: YearMonth, opening_bal: Decimal) -> Self {
        Self {
            total_bal: opening_bal,
            eligible_bal: opening_bal,
            month,
        }
    }

    pub fn total_bal(&self) -> Decimal {
        self.total_bal
    }

    pub fn eligible_bal(&self) -> Decimal {
        self.eligible_bal
    }

    pub fn month(&self) -> YearMonth {
        self.month
    }

    /// Advance to the next month and credit the interest earned in the prior one.
    /// Returns the balance before this month's external change.
    pub fn credit_interest(&mut self, interest: Decimal) -> Decimal {
        self.advance();
        self.total_bal += interest;
        self.total_bal
    }

    /// Advance to the next month without crediting interest
    pub fn advance(&mut self) {
        self.month = self.month.plus_months(1);
    }

    /// Fold a month's net deposits/redemptions into the balances. A redemption
    /// removes a matching share of the interest-earning balance, not a fixed
    /// dollar amount. The share is taken of the balance the holder can see:
    /// the total less interest credited but not yet paid (`deferred`). With
    /// nothing visible on deposit there is nothing to shrink.
    pub fn apply_change(&mut self, change: Decimal, deferred: Decimal) {
        let visible_bal = self.total_bal - deferred;

        if visible_bal > Decimal::ZERO {
            let factor = Decimal::ONE + change / visible_bal;
            self.eligible_bal = (self.eligible_bal * factor).max(Decimal::ZERO);
        }
        self.total_bal += change;
    }

    /// Drop credited interest that will never be paid
    pub fn forfeit(&mut self, interest: Decimal) {
        self.total_bal -= interest;
    }

    /// Semiannual boundary: accrued interest joins the earning balance
    pub fn reset_eligible(&mut self) {
        self.eligible_bal = self.total_bal;
    }
}
