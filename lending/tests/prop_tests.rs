use microcred_lending::{quote, simulate_exchange, WLD_TO_USDC_RATE};
use proptest::prelude::*;

proptest! {
    #[test]
    fn repayment_covers_principal(
        amount in 0.5f64..=5.0,
        term in prop::sample::select(vec![7u32, 14, 30]),
        contributions in 0u32..20,
    ) {
        let q = quote(amount, term, "pay rent", contributions).unwrap();
        prop_assert!(q.interest_rate >= 0.1);
        prop_assert!(q.repayment_amount + 0.005 >= amount);
        prop_assert!(q.max_amount >= 5.0);
    }

    #[test]
    fn more_contributions_never_cost_more(
        amount in 0.5f64..=5.0,
        term in prop::sample::select(vec![7u32, 14, 30]),
        low in 0u32..10,
        extra in 0u32..10,
    ) {
        let a = quote(amount, term, "pay rent", low).unwrap();
        let b = quote(amount, term, "pay rent", low + extra).unwrap();
        prop_assert!(b.interest_rate <= a.interest_rate);
    }

    #[test]
    fn exchange_splits_converted_amount(amount in 0.01f64..1_000_000.0) {
        let q = simulate_exchange(Some(amount)).unwrap();
        let converted = amount * WLD_TO_USDC_RATE;
        prop_assert!((q.received_usdc + q.fee_paid - converted).abs() < 0.0002);
    }
}
