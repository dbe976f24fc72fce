use serde::Deserialize;

use crate::types::{clamp_score, PerformanceMetrics, Score};

/// Supplies runtime metrics for a target page.
pub trait MetricsSupplier {
    fn collect(&self, target: &str) -> PerformanceMetrics;
}

/// Fixed-value metrics used when no instrumented browser is available.
///
/// Each field can be overridden, typically from the `[metrics]` table of the
/// config file.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct StubMetricsSupplier {
    pub cpu_time: Option<f64>,
    pub memory_usage: Option<f64>,
    pub network_requests: Option<u32>,
    pub image_size: Option<f64>,
    pub js_execution_time: Option<f64>,
}

impl MetricsSupplier for StubMetricsSupplier {
    fn collect(&self, target: &str) -> PerformanceMetrics {
        log::info!("using stub performance metrics for {target}");
        PerformanceMetrics {
            cpu_time: self.cpu_time.unwrap_or(100.0),
            memory_usage: self.memory_usage.unwrap_or(50_000_000.0),
            network_requests: self.network_requests.unwrap_or(15),
            image_size: self.image_size.or(Some(1500.0)),
            js_execution_time: self.js_execution_time.or(Some(250.0)),
        }
    }
}

/// `(threshold, points)` pairs; each exceeded threshold deducts its points.
const CPU_TIME_MS: &[(f64, i64)] = &[(200.0, 10), (500.0, 10)];
const MEMORY_BYTES: &[(f64, i64)] = &[(100_000_000.0, 10), (200_000_000.0, 10)];
const NETWORK_REQUESTS: &[(f64, i64)] = &[(20.0, 10), (40.0, 10)];
const IMAGE_KB: &[(f64, i64)] = &[(2000.0, 10), (5000.0, 10)];
const JS_EXECUTION_MS: &[(f64, i64)] = &[(500.0, 10), (1000.0, 10)];

fn deduction(value: f64, steps: &[(f64, i64)]) -> i64 {
    steps
        .iter()
        .filter(|(threshold, _)| value > *threshold)
        .map(|(_, points)| points)
        .sum()
}

/// Resource-usage score: lower usage scores higher.
pub fn performance_score(metrics: &PerformanceMetrics) -> Score {
    let mut deducted = deduction(metrics.cpu_time, CPU_TIME_MS)
        + deduction(metrics.memory_usage, MEMORY_BYTES)
        + deduction(f64::from(metrics.network_requests), NETWORK_REQUESTS);
    if let Some(kb) = metrics.image_size {
        deducted += deduction(kb, IMAGE_KB);
    }
    if let Some(ms) = metrics.js_execution_time {
        deducted += deduction(ms, JS_EXECUTION_MS);
    }
    clamp_score(100 - deducted)
}
