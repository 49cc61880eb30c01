// 💸 Loan Entity - Money lent to a person
//
// A loan points at its borrower through the person's UUID, never through
// the list position, so filtering and re-sorting the person list is safe.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// MONEY
// ============================================================================

/// Positive amount stored as whole cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

impl Money {
    pub const MESSAGE_CONSTRAINTS: &'static str =
        "Loan amounts should be positive numbers with at most 2 decimal places";

    pub fn from_cents(cents: u64) -> Self {
        Money(cents)
    }

    /// Parse "500", "12.5" or "12.50"
    pub fn parse(raw: &str) -> Result<Self, &'static str> {
        let trimmed = raw.trim();
        let (whole, fraction) = match trimmed.split_once('.') {
            Some((_, "")) => return Err(Self::MESSAGE_CONSTRAINTS),
            Some((whole, fraction)) => (whole, fraction),
            None => (trimmed, ""),
        };

        let digits_only = |s: &str| s.chars().all(|c| c.is_ascii_digit());
        if whole.is_empty() || !digits_only(whole) || !digits_only(fraction) || fraction.len() > 2 {
            return Err(Self::MESSAGE_CONSTRAINTS);
        }

        let whole: u64 = whole.parse().map_err(|_| Self::MESSAGE_CONSTRAINTS)?;
        let fraction: u64 = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| Self::MESSAGE_CONSTRAINTS)? * 10,
            _ => fraction.parse().map_err(|_| Self::MESSAGE_CONSTRAINTS)?,
        };

        let cents = whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(fraction))
            .ok_or(Self::MESSAGE_CONSTRAINTS)?;

        if cents == 0 {
            return Err(Self::MESSAGE_CONSTRAINTS);
        }

        Ok(Money(cents))
    }

    pub fn cents(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// LOAN ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: Uuid,

    /// `Person::id` of the borrower
    pub assignee: Uuid,

    pub amount: Money,
    pub start_date: NaiveDate,
    pub return_date: NaiveDate,

    /// Marked loans have been paid back
    pub is_returned: bool,
}

impl Loan {
    pub const MESSAGE_DATE_ORDER: &'static str = "Return date cannot be before the start date";

    /// Create an active (unmarked) loan
    pub fn new(
        assignee: Uuid,
        amount: Money,
        start_date: NaiveDate,
        return_date: NaiveDate,
    ) -> Result<Self, &'static str> {
        if return_date < start_date {
            return Err(Self::MESSAGE_DATE_ORDER);
        }

        Ok(Loan {
            id: Uuid::new_v4(),
            assignee,
            amount,
            start_date,
            return_date,
            is_returned: false,
        })
    }

    pub fn is_active(&self) -> bool {
        !self.is_returned
    }

    /// Active and past its return date
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_active() && self.return_date < today
    }

    pub fn status_label(&self, today: NaiveDate) -> &'static str {
        if self.is_returned {
            "returned"
        } else if self.is_overdue(today) {
            "overdue"
        } else {
            "active"
        }
    }
}

impl fmt::Display for Loan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}, {} to {}{}",
            self.amount,
            self.start_date.format(DATE_FORMAT),
            self.return_date.format(DATE_FORMAT),
            if self.is_returned { " (returned)" } else { "" }
        )
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| format!("Invalid date `{}` (use YYYY-MM-DD)", raw.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_money_parse() {
        assert_eq!(Money::parse("500").unwrap().cents(), 50_000);
        assert_eq!(Money::parse("12.5").unwrap().cents(), 1_250);
        assert_eq!(Money::parse("12.05").unwrap().cents(), 1_205);
        assert_eq!(Money::parse("0.01").unwrap().cents(), 1);
    }

    #[test]
    fn test_money_rejects_bad_amounts() {
        for raw in ["", "0", "0.00", "-5", "1.234", "abc", ".5", "1.", "1e3", "99999999999999999999"] {
            assert!(Money::parse(raw).is_err(), "expected {:?} to be rejected", raw);
        }
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(50_000).to_string(), "$500.00");
        assert_eq!(Money::from_cents(1_205).to_string(), "$12.05");
    }

    #[test]
    fn test_loan_date_order() {
        let who = Uuid::new_v4();
        let amount = Money::from_cents(100);
        assert!(Loan::new(who, amount, date("2024-01-10"), date("2024-01-10")).is_ok());
        assert_eq!(
            Loan::new(who, amount, date("2024-01-10"), date("2024-01-09")).unwrap_err(),
            Loan::MESSAGE_DATE_ORDER
        );
    }

    #[test]
    fn test_loan_status() {
        let mut loan = Loan::new(
            Uuid::new_v4(),
            Money::from_cents(100),
            date("2024-01-01"),
            date("2024-02-01"),
        )
        .unwrap();

        assert!(loan.is_active());
        assert!(!loan.is_overdue(date("2024-02-01")));
        assert!(loan.is_overdue(date("2024-02-02")));
        assert_eq!(loan.status_label(date("2024-03-01")), "overdue");

        loan.is_returned = true;
        assert!(!loan.is_overdue(date("2024-03-01")));
        assert_eq!(loan.status_label(date("2024-03-01")), "returned");
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date("2024-02-30").is_err());
        assert!(parse_date("01/02/2024").is_err());
        assert_eq!(date(" 2024-02-29 "), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }
}
