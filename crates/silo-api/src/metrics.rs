//! Prometheus registry for pipeline runs
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

pub struct Metrics {
    registry: Registry,
    runs: IntCounterVec,
    revisions: HistogramVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let runs = IntCounterVec::new(
            Opts::new("silo_pipeline_runs_total", "Pipeline runs by tenant and outcome"),
            &["tenant", "outcome"],
        )?;
        let revisions = HistogramVec::new(
            HistogramOpts::new("silo_pipeline_revisions", "Revisions used per completed run")
                .buckets(vec![0.0, 1.0, 2.0, 3.0, 5.0, 8.0]),
            &["tenant"],
        )?;

        registry.register(Box::new(runs.clone()))?;
        registry.register(Box::new(revisions.clone()))?;

        Ok(Self {
            registry,
            runs,
            revisions,
        })
    }

    /// `outcome` is one of verified, unverified, cancelled, failed
    pub fn record_run(&self, tenant: &str, outcome: &str, revision_count: Option<u32>) {
        self.runs.with_label_values(&[tenant, outcome]).inc();
        if let Some(count) = revision_count {
            self.revisions
                .with_label_values(&[tenant])
                .observe(f64::from(count));
        }
    }

    pub fn runs(&self, tenant: &str, outcome: &str) -> u64 {
        self.runs.with_label_values(&[tenant, outcome]).get()
    }

    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_encode() {
        let metrics = Metrics::new().unwrap();
        metrics.record_run("hedge_fund_a", "verified", Some(0));
        metrics.record_run("hedge_fund_a", "verified", Some(1));
        metrics.record_run("bank_b", "failed", None);

        assert_eq!(metrics.runs("hedge_fund_a", "verified"), 2);
        assert_eq!(metrics.runs("bank_b", "verified"), 0);

        let text = metrics.encode().unwrap();
        assert!(text.contains("silo_pipeline_runs_total"));
        assert!(text.contains("outcome=\"failed\""));
    }
}
