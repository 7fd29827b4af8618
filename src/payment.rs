use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    Declined(String),
    Unavailable(String),
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentError::Declined(msg) => write!(f, "payment declined: {msg}"),
            PaymentError::Unavailable(msg) => write!(f, "payment provider unavailable: {msg}"),
        }
    }
}

impl std::error::Error for PaymentError {}

/// Authorizes the charge for a booking. Called after admission, outside the
/// room lock.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Returns the provider's payment reference.
    async fn authorize(&self, booking_id: Ulid, amount: Decimal) -> Result<String, PaymentError>;
}

/// In-memory gateway. Succeeds unless told to fail the next call.
#[derive(Debug, Default)]
pub struct MockPaymentGateway {
    fail_next: AtomicBool,
    authorized: AtomicUsize,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_next(&self, fail: bool) {
        self.fail_next.store(fail, Ordering::SeqCst);
    }

    pub fn authorized_count(&self) -> usize {
        self.authorized.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn authorize(&self, _booking_id: Ulid, amount: Decimal) -> Result<String, PaymentError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PaymentError::Declined("mock configured to fail".into()));
        }
        if amount <= Decimal::ZERO {
            return Err(PaymentError::Declined("amount must be greater than zero".into()));
        }
        self.authorized.fetch_add(1, Ordering::SeqCst);
        Ok(mock_reference())
    }
}

/// `pi_mock_` followed by 24 lowercase base32 characters.
fn mock_reference() -> String {
    let raw = Ulid::new().to_string().to_lowercase();
    format!("pi_mock_{}", &raw[..24])
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardExpiryError {
    Malformed,
    Expired,
}

impl std::fmt::Display for CardExpiryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CardExpiryError::Malformed => write!(f, "card expiry must be MM/YY"),
            CardExpiryError::Expired => write!(f, "card has expired"),
        }
    }
}

/// Validate an `MM/YY` expiry. A card stays valid through the last day of its
/// expiry month.
pub fn validate_card_expiry(expiry: &str, today: NaiveDate) -> Result<(), CardExpiryError> {
    let (mm, yy) = expiry
        .trim()
        .split_once('/')
        .ok_or(CardExpiryError::Malformed)?;
    if mm.len() != 2 || yy.len() != 2 {
        return Err(CardExpiryError::Malformed);
    }
    let month: u32 = mm.parse().map_err(|_| CardExpiryError::Malformed)?;
    let year: i32 = yy.parse().map_err(|_| CardExpiryError::Malformed)?;
    let last_day = last_day_of_month(2000 + year, month).ok_or(CardExpiryError::Malformed)?;
    if last_day < today {
        return Err(CardExpiryError::Expired);
    }
    Ok(())
}

fn last_day_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    next.pred_opt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn expiry_valid_through_end_of_month() {
        assert_eq!(validate_card_expiry("06/25", d("2025-06-30")), Ok(()));
        assert_eq!(
            validate_card_expiry("06/25", d("2025-07-01")),
            Err(CardExpiryError::Expired)
        );
    }

    #[test]
    fn expiry_december_rolls_year() {
        assert_eq!(validate_card_expiry("12/25", d("2025-12-31")), Ok(()));
        assert_eq!(
            validate_card_expiry("12/25", d("2026-01-01")),
            Err(CardExpiryError::Expired)
        );
    }

    #[test]
    fn expiry_malformed() {
        for bad in ["", "1225", "13/25", "00/25", "1/25", "ab/cd", "12/2025"] {
            assert_eq!(
                validate_card_expiry(bad, d("2025-01-01")),
                Err(CardExpiryError::Malformed),
                "{bad}"
            );
        }
    }

    #[tokio::test]
    async fn mock_reference_shape() {
        let gw = MockPaymentGateway::new();
        let r = gw.authorize(Ulid::new(), Decimal::new(36000, 2)).await.unwrap();
        assert!(r.starts_with("pi_mock_"));
        assert_eq!(r.len(), "pi_mock_".len() + 24);
        assert_eq!(gw.authorized_count(), 1);
    }

    #[tokio::test]
    async fn mock_fail_next_is_one_shot() {
        let gw = MockPaymentGateway::new();
        gw.set_fail_next(true);
        assert!(gw.authorize(Ulid::new(), Decimal::ONE).await.is_err());
        assert!(gw.authorize(Ulid::new(), Decimal::ONE).await.is_ok());
    }
}
