//! # Payment Settlement
//!
//! Pure math for settling a cart total against a tendered payment.
//!
//! ## Settlement Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Method      amount_paid given?      amount_paid       change           │
//! │  ──────      ──────────────────      ───────────       ──────           │
//! │  cash        required, >= total      as tendered       paid - total     │
//! │  cash        missing or < total      ── InsufficientCash error ──       │
//! │  non-cash    optional                defaults to       0                │
//! │                                      the total                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The checkout engine calls [`settle`] after all cart-level validation and
//! before any stock is touched, so a payment failure never mutates anything.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::PaymentMethod;

/// A payment offer: the method plus the amount the customer handed over.
///
/// `amount_paid` is optional because non-cash methods settle for exactly
/// the total, and the terminal does not report an amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tender {
    pub method: PaymentMethod,
    pub amount_paid: Option<Money>,
}

impl Tender {
    pub fn new(method: PaymentMethod, amount_paid: Option<Money>) -> Self {
        Tender {
            method,
            amount_paid,
        }
    }
}

/// The settled outcome recorded on the sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    /// What the sale records as paid. Always >= the total.
    pub amount_paid: Money,
    /// Cash returned to the customer. Zero for non-cash methods.
    pub change: Money,
}

/// Settles a total against a tender.
///
/// ## Errors
/// `InsufficientCash` when the method is cash and the tendered amount is
/// missing or below the total.
///
/// ## Example
/// ```rust
/// use tillpoint_core::money::Money;
/// use tillpoint_core::tender::{settle, Tender};
/// use tillpoint_core::types::PaymentMethod;
///
/// let total = Money::from_cents(2150);
/// let tender = Tender::new(PaymentMethod::Cash, Some(Money::from_cents(2200)));
///
/// let settlement = settle(total, &tender).unwrap();
/// assert_eq!(settlement.change.cents(), 50);
/// ```
pub fn settle(total: Money, tender: &Tender) -> CoreResult<Settlement> {
    if tender.method.is_cash() {
        let paid = match tender.amount_paid {
            Some(paid) if paid >= total => paid,
            other => {
                return Err(CoreError::InsufficientCash {
                    paid: other.map(|paid| paid.cents()).unwrap_or(0),
                    required: total.cents(),
                })
            }
        };
        return Ok(Settlement {
            amount_paid: paid,
            change: paid - total,
        });
    }

    // Non-cash settles for exactly the total; a reported amount is accepted
    // as-is but still has to cover the total.
    match tender.amount_paid {
        Some(paid) if paid < total => Err(CoreError::InsufficientCash {
            paid: paid.cents(),
            required: total.cents(),
        }),
        Some(paid) => Ok(Settlement {
            amount_paid: paid,
            change: Money::zero(),
        }),
        None => Ok(Settlement {
            amount_paid: total,
            change: Money::zero(),
        }),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_with_exact_amount() {
        let total = Money::from_cents(2150);
        let tender = Tender::new(PaymentMethod::Cash, Some(Money::from_cents(2150)));

        let s = settle(total, &tender).unwrap();
        assert_eq!(s.amount_paid.cents(), 2150);
        assert_eq!(s.change.cents(), 0);
    }

    #[test]
    fn test_cash_change_is_exact() {
        let total = Money::from_cents(2150);
        let tender = Tender::new(PaymentMethod::Cash, Some(Money::from_cents(2200)));

        let s = settle(total, &tender).unwrap();
        assert_eq!(s.amount_paid.cents(), 2200);
        assert_eq!(s.change.cents(), 50);
    }

    #[test]
    fn test_cash_underpayment_rejected() {
        let total = Money::from_cents(2150);
        let tender = Tender::new(PaymentMethod::Cash, Some(Money::from_cents(2000)));

        let err = settle(total, &tender).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InsufficientCash {
                paid: 2000,
                required: 2150
            }
        ));
    }

    #[test]
    fn test_cash_missing_amount_rejected() {
        let total = Money::from_cents(100);
        let tender = Tender::new(PaymentMethod::Cash, None);

        assert!(matches!(
            settle(total, &tender).unwrap_err(),
            CoreError::InsufficientCash { .. }
        ));
    }

    #[test]
    fn test_non_cash_defaults_to_total() {
        let total = Money::from_cents(4999);

        for method in [
            PaymentMethod::Card,
            PaymentMethod::MobileMoney,
            PaymentMethod::BankTransfer,
        ] {
            let s = settle(total, &Tender::new(method, None)).unwrap();
            assert_eq!(s.amount_paid, total);
            assert_eq!(s.change, Money::zero());
        }
    }

    #[test]
    fn test_non_cash_never_makes_change() {
        let total = Money::from_cents(1000);
        let tender = Tender::new(PaymentMethod::Card, Some(Money::from_cents(1000)));

        let s = settle(total, &tender).unwrap();
        assert_eq!(s.change, Money::zero());
    }
}
