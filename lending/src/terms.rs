//! Loan-term quotes.
//!
//! Terms are fixed: 7, 14 or 30 days with a base rate per term. Savings
//! contributions unlock a lower rate and a higher maximum amount.

use microcred_utils::round_dp;
use serde::{Deserialize, Serialize};

use crate::LendingError;

pub const BASE_MAX_LOAN_AMOUNT: f64 = 5.0;

const MIN_QUOTE_AMOUNT: f64 = 0.5;
const MIN_INTEREST_RATE: f64 = 0.1;
const PURPOSE_CHARS: std::ops::RangeInclusive<usize> = 5..=300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanTerm {
    Week,
    Fortnight,
    Month,
}

impl LoanTerm {
    pub const ALL: [LoanTerm; 3] = [Self::Week, Self::Fortnight, Self::Month];

    pub fn from_days(days: u32) -> Option<Self> {
        match days {
            7 => Some(Self::Week),
            14 => Some(Self::Fortnight),
            30 => Some(Self::Month),
            _ => None,
        }
    }

    pub fn days(&self) -> u32 {
        match self {
            Self::Week => 7,
            Self::Fortnight => 14,
            Self::Month => 30,
        }
    }

    /// Base interest over the whole term, in percent.
    pub fn base_rate(&self) -> f64 {
        match self {
            Self::Week => 2.0,
            Self::Fortnight => 3.5,
            Self::Month => 5.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContributionTier {
    pub min_contributions: u32,
    pub rate_modifier: f64,
    pub max_loan_bonus: f64,
}

pub const TIER_ONE: ContributionTier = ContributionTier {
    min_contributions: 3,
    rate_modifier: -0.2,
    max_loan_bonus: 1.0,
};

pub const TIER_TWO: ContributionTier = ContributionTier {
    min_contributions: 6,
    rate_modifier: -0.5,
    max_loan_bonus: 2.5,
};

fn tier_for(contributions: u32) -> Option<ContributionTier> {
    [TIER_TWO, TIER_ONE]
        .into_iter()
        .find(|t| contributions >= t.min_contributions)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanQuote {
    pub requested_amount: f64,
    pub term_days: u32,
    pub interest_rate: f64,
    pub interest_amount: f64,
    pub repayment_amount: f64,
    pub max_amount: f64,
    pub purpose: String,
    pub contributions: u32,
}

/// Price a loan. Pure and deterministic.
pub fn quote(
    amount: f64,
    term_days: u32,
    purpose: &str,
    contributions: u32,
) -> Result<LoanQuote, LendingError> {
    let tier = tier_for(contributions);
    let max_amount = BASE_MAX_LOAN_AMOUNT + tier.map_or(0.0, |t| t.max_loan_bonus);

    if !amount.is_finite() || amount < MIN_QUOTE_AMOUNT || amount > max_amount {
        return Err(LendingError::validation(format!(
            "amount must be between {MIN_QUOTE_AMOUNT} and {max_amount:.1} USDC for {contributions} contributions"
        )));
    }
    let term = LoanTerm::from_days(term_days).ok_or_else(|| {
        let valid: Vec<String> = LoanTerm::ALL.iter().map(|t| t.days().to_string()).collect();
        LendingError::validation(format!(
            "invalid loan term; valid options: {} days",
            valid.join(", ")
        ))
    })?;
    let purpose = purpose.trim();
    if !PURPOSE_CHARS.contains(&purpose.chars().count()) {
        return Err(LendingError::validation(
            "purpose must be between 5 and 300 characters",
        ));
    }

    let rate = term.base_rate() + tier.map_or(0.0, |t| t.rate_modifier);
    let rate = round_dp(rate, 1).max(MIN_INTEREST_RATE);
    let interest = amount * rate / 100.0;

    Ok(LoanQuote {
        requested_amount: amount,
        term_days: term.days(),
        interest_rate: rate,
        interest_amount: round_dp(interest, 2),
        repayment_amount: round_dp(amount + interest, 2),
        max_amount,
        purpose: purpose.to_string(),
        contributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_terms() {
        let q = quote(4.0, 30, "  school books  ", 0).unwrap();
        assert_eq!(q.interest_rate, 5.0);
        assert_eq!(q.interest_amount, 0.2);
        assert_eq!(q.repayment_amount, 4.2);
        assert_eq!(q.max_amount, 5.0);
        assert_eq!(q.purpose, "school books");
    }

    #[test]
    fn tiers_lower_rate_and_raise_max() {
        let q = quote(5.5, 14, "market stall", 3).unwrap();
        assert_eq!(q.interest_rate, 3.3);
        assert_eq!(q.max_amount, 6.0);

        let q = quote(7.5, 7, "market stall", 10).unwrap();
        assert_eq!(q.interest_rate, 1.5);
        assert_eq!(q.max_amount, 7.5);
        assert_eq!(q.interest_amount, 0.11);
        assert_eq!(q.repayment_amount, 7.61);
    }

    #[test]
    fn rejects_out_of_range_input() {
        assert!(quote(0.4, 7, "groceries", 0).is_err());
        assert!(quote(5.5, 7, "groceries", 2).is_err());
        assert!(quote(2.0, 10, "groceries", 0).is_err());
        assert!(quote(2.0, 7, "food", 0).is_err());
        assert!(quote(2.0, 7, &"x".repeat(301), 0).is_err());
        assert!(quote(f64::INFINITY, 7, "groceries", 0).is_err());
    }

    #[test]
    fn quotes_are_deterministic() {
        assert_eq!(
            quote(3.0, 14, "repair bike", 4).unwrap(),
            quote(3.0, 14, "repair bike", 4).unwrap()
        );
    }
}
