/// Round half away from zero to `decimals` places.
pub fn round_dp(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::round_dp;

    #[test]
    fn rounds_to_places() {
        assert_eq!(round_dp(1.23456, 2), 1.23);
        assert_eq!(round_dp(0.74255, 4), 0.7426);
        assert_eq!(round_dp(2.35, 1), 2.4);
        assert_eq!(round_dp(-1.005, 0), -1.0);
    }
}
