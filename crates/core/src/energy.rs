use crate::types::{EnergyBreakdown, PerformanceMetrics, Score};

/// Watt-hours per second of CPU time.
const WH_PER_CPU_SECOND: f64 = 0.001;
/// Watt-hours per network request.
const WH_PER_REQUEST: f64 = 0.01;
/// Watt-hours per MiB of memory in use.
const WH_PER_MIB: f64 = 0.005;

const BYTES_PER_MIB: f64 = 1_048_576.0;

/// Grid carbon intensity in kg CO2e per kWh used when none is configured.
pub const DEFAULT_CARBON_INTENSITY: f64 = 0.475;

/// `(ceiling in Wh, score)` checked in order; anything above the last ceiling scores 0.
const SCORE_LADDER: &[(f64, Score)] = &[(1.5, 100), (2.0, 80), (3.0, 60), (4.0, 40), (5.0, 20)];

#[derive(Debug, Clone, Copy, Default)]
pub struct EnergyEstimator;

impl EnergyEstimator {
    pub fn new() -> Self {
        Self
    }

    pub fn estimate_energy_consumption(&self, metrics: &PerformanceMetrics) -> EnergyBreakdown {
        EnergyBreakdown {
            cpu: (metrics.cpu_time / 1000.0) * WH_PER_CPU_SECOND,
            network: f64::from(metrics.network_requests) * WH_PER_REQUEST,
            memory: (metrics.memory_usage / BYTES_PER_MIB) * WH_PER_MIB,
        }
    }

    pub fn calculate_score(&self, breakdown: &EnergyBreakdown) -> Score {
        let total = breakdown.total();
        SCORE_LADDER
            .iter()
            .find(|(ceiling, _)| total <= *ceiling)
            .map(|(_, score)| *score)
            .unwrap_or(0)
    }
}

/// Grams of CO2e for `watt_hours` at `intensity_kg_per_kwh`.
pub fn estimate_carbon_grams(watt_hours: f64, intensity_kg_per_kwh: f64) -> f64 {
    watt_hours * intensity_kg_per_kwh * 1000.0
}
