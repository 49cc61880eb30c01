// 📊 Loan Analytics - summary numbers for the analytics panel
// Computed from a slice of loans, never stored.

use crate::entities::Loan;
use chrono::NaiveDate;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Analytics {
    pub num_loans: usize,
    pub num_active_loans: usize,
    pub num_overdue_loans: usize,

    /// Totals in cents
    pub total_loaned: u64,
    pub total_active: u64,
    pub total_overdue: u64,

    pub earliest_loan_date: Option<NaiveDate>,
    pub latest_loan_date: Option<NaiveDate>,
    /// Earliest return date among loans not yet returned
    pub earliest_return_date: Option<NaiveDate>,
    /// Latest return date among loans not yet returned
    pub latest_return_date: Option<NaiveDate>,
}

impl Analytics {
    pub fn from_loans<'a, I>(loans: I, today: NaiveDate) -> Self
    where
        I: IntoIterator<Item = &'a Loan>,
    {
        let mut stats = Analytics::default();

        for loan in loans {
            let cents = loan.amount.cents();
            stats.num_loans += 1;
            stats.total_loaned += cents;

            stats.earliest_loan_date = min_date(stats.earliest_loan_date, loan.start_date);
            stats.latest_loan_date = max_date(stats.latest_loan_date, loan.start_date);

            if loan.is_active() {
                stats.num_active_loans += 1;
                stats.total_active += cents;
                stats.earliest_return_date = min_date(stats.earliest_return_date, loan.return_date);
                stats.latest_return_date = max_date(stats.latest_return_date, loan.return_date);
            }

            if loan.is_overdue(today) {
                stats.num_overdue_loans += 1;
                stats.total_overdue += cents;
            }
        }

        stats
    }

    pub fn average_loan_value(&self) -> f64 {
        average(self.total_loaned, self.num_loans)
    }

    pub fn average_active_value(&self) -> f64 {
        average(self.total_active, self.num_active_loans)
    }

    pub fn average_overdue_value(&self) -> f64 {
        average(self.total_overdue, self.num_overdue_loans)
    }

    pub fn proportion_active(&self) -> f64 {
        ratio(self.num_active_loans, self.num_loans)
    }

    pub fn proportion_overdue(&self) -> f64 {
        ratio(self.num_overdue_loans, self.num_loans)
    }
}

fn min_date(current: Option<NaiveDate>, candidate: NaiveDate) -> Option<NaiveDate> {
    Some(current.map_or(candidate, |d| d.min(candidate)))
}

fn max_date(current: Option<NaiveDate>, candidate: NaiveDate) -> Option<NaiveDate> {
    Some(current.map_or(candidate, |d| d.max(candidate)))
}

/// Average in dollars
fn average(total_cents: u64, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        total_cents as f64 / 100.0 / count as f64
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{parse_date, Money};
    use uuid::Uuid;

    fn loan(cents: u64, start: &str, end: &str, returned: bool) -> Loan {
        let mut loan = Loan::new(
            Uuid::new_v4(),
            Money::from_cents(cents),
            parse_date(start).unwrap(),
            parse_date(end).unwrap(),
        )
        .unwrap();
        loan.is_returned = returned;
        loan
    }

    #[test]
    fn test_empty_analytics() {
        let loans: Vec<Loan> = Vec::new();
        let stats = Analytics::from_loans(&loans, parse_date("2024-06-01").unwrap());
        assert_eq!(stats, Analytics::default());
        assert_eq!(stats.average_loan_value(), 0.0);
        assert_eq!(stats.proportion_overdue(), 0.0);
    }

    #[test]
    fn test_counts_and_totals() {
        let loans = vec![
            loan(10_000, "2024-01-01", "2024-03-01", false), // overdue
            loan(5_000, "2024-02-01", "2024-12-01", false),  // active
            loan(2_000, "2023-12-01", "2024-01-01", true),   // returned
        ];
        let stats = Analytics::from_loans(&loans, parse_date("2024-06-01").unwrap());

        assert_eq!(stats.num_loans, 3);
        assert_eq!(stats.num_active_loans, 2);
        assert_eq!(stats.num_overdue_loans, 1);
        assert_eq!(stats.total_loaned, 17_000);
        assert_eq!(stats.total_active, 15_000);
        assert_eq!(stats.total_overdue, 10_000);
        assert_eq!(stats.average_active_value(), 75.0);
        assert_eq!(stats.average_overdue_value(), 100.0);

        assert_eq!(stats.earliest_loan_date, Some(parse_date("2023-12-01").unwrap()));
        assert_eq!(stats.latest_loan_date, Some(parse_date("2024-02-01").unwrap()));
        // returned loan does not count towards return dates
        assert_eq!(stats.earliest_return_date, Some(parse_date("2024-03-01").unwrap()));
        assert_eq!(stats.latest_return_date, Some(parse_date("2024-12-01").unwrap()));
    }
}
