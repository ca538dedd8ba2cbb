//! Withdrawal fee calculation
//!
//! Rates are per payment-method kind. The fee is informational at
//! reservation time: the full requested amount is reserved and the fee
//! settles against the payout, so no rounding is applied here. Display
//! rounding to the currency's minor unit happens at the API edge.

use rust_decimal::Decimal;

use super::types::MethodKind;

/// Fee rate for a payment-method kind: bank 2%, crypto 1%, paypal 3%.
pub fn fee_rate(kind: MethodKind) -> Decimal {
    match kind {
        MethodKind::Bank => Decimal::new(2, 2),   // 0.02
        MethodKind::Crypto => Decimal::new(1, 2), // 0.01
        MethodKind::Paypal => Decimal::new(3, 2), // 0.03
    }
}

/// Calculate the fee for a withdrawal: `amount * rate(kind)`.
#[inline]
pub fn withdrawal_fee(kind: MethodKind, amount: Decimal) -> Decimal {
    amount * fee_rate(kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_fee_basic() {
        // 200 via bank * 2% = 4
        assert_eq!(
            withdrawal_fee(MethodKind::Bank, Decimal::from(200)),
            Decimal::from(4)
        );
        // 200 via crypto * 1% = 2
        assert_eq!(
            withdrawal_fee(MethodKind::Crypto, Decimal::from(200)),
            Decimal::from(2)
        );
        // 200 via paypal * 3% = 6
        assert_eq!(
            withdrawal_fee(MethodKind::Paypal, Decimal::from(200)),
            Decimal::from(6)
        );
    }

    #[test]
    fn test_fee_keeps_sub_unit_precision() {
        // 33.33 * 2% = 0.6666 - kept exact, not rounded at reservation time
        let fee = withdrawal_fee(MethodKind::Bank, Decimal::from_str("33.33").unwrap());
        assert_eq!(fee, Decimal::from_str("0.6666").unwrap());
    }

    #[test]
    fn test_fee_zero_amount() {
        assert_eq!(
            withdrawal_fee(MethodKind::Bank, Decimal::ZERO),
            Decimal::ZERO
        );
    }
}
