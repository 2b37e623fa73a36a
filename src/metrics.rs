use serde::{Deserialize, Serialize};

/// Service counters reported by `GET /api/metrics`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    pub uptime_sec: u64,
    pub requests_total: u64,
    pub requests_success: u64,
    pub requests_failed: u64,
    pub rewards_granted: u64,
    pub purchases: u64,
    pub generation_calls: u64,
    pub generation_failures: u64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request that completed with a 2xx status
    pub fn record_success(&mut self) {
        self.requests_total += 1;
        self.requests_success += 1;
    }

    /// Record a request rejected or failed at the handler boundary
    pub fn record_failure(&mut self) {
        self.requests_total += 1;
        self.requests_failed += 1;
    }

    pub fn record_reward(&mut self) {
        self.rewards_granted += 1;
    }

    pub fn record_purchase(&mut self) {
        self.purchases += 1;
    }

    pub fn record_generation(&mut self, ok: bool) {
        self.generation_calls += 1;
        if !ok {
            self.generation_failures += 1;
        }
    }

    /// Get success rate as percentage
    pub fn success_rate(&self) -> f64 {
        if self.requests_total == 0 {
            return 100.0;
        }
        (self.requests_success as f64 / self.requests_total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = Metrics::new();
        assert_eq!(metrics.requests_total, 0);
        assert_eq!(metrics.rewards_granted, 0);
        assert_eq!(metrics, Metrics::default());
    }

    #[test]
    fn test_record_mixed() {
        let mut metrics = Metrics::new();
        metrics.record_success();
        metrics.record_success();
        metrics.record_failure();
        metrics.record_success();

        assert_eq!(metrics.requests_total, 4);
        assert_eq!(metrics.requests_success, 3);
        assert_eq!(metrics.requests_failed, 1);
        assert_eq!(metrics.success_rate(), 75.0);
    }

    #[test]
    fn test_success_rate_zero_requests() {
        assert_eq!(Metrics::new().success_rate(), 100.0);
    }

    #[test]
    fn test_generation_counters() {
        let mut metrics = Metrics::new();
        metrics.record_generation(true);
        metrics.record_generation(false);
        assert_eq!(metrics.generation_calls, 2);
        assert_eq!(metrics.generation_failures, 1);
    }

    #[test]
    fn test_metrics_serialization() {
        let mut metrics = Metrics::new();
        metrics.record_reward();
        metrics.record_purchase();
        let json = serde_json::to_string(&metrics).unwrap();
        assert!(json.contains("\"rewardsGranted\":1"));
        assert!(json.contains("\"uptimeSec\":0"));
        let back: Metrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back.rewards_granted, 1);
        assert_eq!(back.purchases, 1);
    }
}
