//! Simulated WLD to USDC exchange at a fixed rate.

use microcred_utils::round_dp;
use serde::Serialize;

use crate::LendingError;

pub const WLD_TO_USDC_RATE: f64 = 0.75;

pub const EXCHANGE_FEE_PERCENT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeQuote {
    #[serde(rename = "exchangedWLD")]
    pub exchanged_wld: f64,
    #[serde(rename = "receivedUSDC")]
    pub received_usdc: f64,
    #[serde(rename = "feePaid")]
    pub fee_paid: f64,
    #[serde(rename = "exchangeRateUsed")]
    pub exchange_rate_used: f64,
}

pub fn simulate_exchange(amount: Option<f64>) -> Result<ExchangeQuote, LendingError> {
    let amount = match amount {
        Some(a) if a.is_finite() && a > 0.0 => a,
        _ => return Err(LendingError::validation("amount must be a positive number")),
    };
    let converted = amount * WLD_TO_USDC_RATE;
    let fee = converted * (EXCHANGE_FEE_PERCENT / 100.0);
    let received = converted - fee;
    if received <= 0.0 {
        return Err(LendingError::validation(
            "amount received after the fee is zero or negative",
        ));
    }
    Ok(ExchangeQuote {
        exchanged_wld: amount,
        received_usdc: round_dp(received, 4),
        fee_paid: round_dp(fee, 4),
        exchange_rate_used: WLD_TO_USDC_RATE,
    })
}
