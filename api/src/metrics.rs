//! Prometheus counters for the API.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Counters exposed at `/metrics`, registered on a private registry.
pub struct ApiMetrics {
    registry: Registry,
    pub nonces_issued: IntCounter,
    /// Labelled by `outcome`: `success` or `failure`.
    pub logins: IntCounterVec,
    /// Labelled by `outcome`: `verified`, `rejected` or `error`.
    pub proof_verifications: IntCounterVec,
    pub users_created: IntCounter,
    pub loans_created: IntCounter,
    pub deposits_confirmed: IntCounter,
}

impl ApiMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();
        Ok(Self {
            nonces_issued: register_int_counter_with_registry!(
                Opts::new("microcred_nonces_issued_total", "SIWE nonces issued"),
                registry
            )?,
            logins: register_int_counter_vec_with_registry!(
                Opts::new("microcred_logins_total", "Wallet sign-in attempts"),
                &["outcome"],
                registry
            )?,
            proof_verifications: register_int_counter_vec_with_registry!(
                Opts::new(
                    "microcred_proof_verifications_total",
                    "World ID proof verifications"
                ),
                &["outcome"],
                registry
            )?,
            users_created: register_int_counter_with_registry!(
                Opts::new("microcred_users_created_total", "Users created"),
                registry
            )?,
            loans_created: register_int_counter_with_registry!(
                Opts::new("microcred_loans_created_total", "Loan requests recorded"),
                registry
            )?,
            deposits_confirmed: register_int_counter_with_registry!(
                Opts::new(
                    "microcred_deposits_confirmed_total",
                    "Survey deposits confirmed on chain"
                ),
                registry
            )?,
            registry,
        })
    }

    pub fn login(&self, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.logins.with_label_values(&[outcome]).inc();
    }

    pub fn proof(&self, outcome: &str) {
        self.proof_verifications.with_label_values(&[outcome]).inc();
    }

    /// Render every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_show_up_in_output() {
        let metrics = ApiMetrics::new().unwrap();
        metrics.nonces_issued.inc();
        metrics.login(true);
        metrics.proof("rejected");
        let text = metrics.encode().unwrap();
        assert!(text.contains("microcred_nonces_issued_total 1"));
        assert!(text.contains("microcred_logins_total{outcome=\"success\"} 1"));
        assert!(text.contains("microcred_proof_verifications_total{outcome=\"rejected\"} 1"));
    }

    #[test]
    fn registries_are_independent() {
        let a = ApiMetrics::new().unwrap();
        let b = ApiMetrics::new().unwrap();
        a.users_created.inc();
        assert_eq!(b.users_created.get(), 0);
    }
}
