use std::fmt;

use serde::{Deserialize, Serialize};

/// 0-100 score for one dimension or for the whole page.
pub type Score = u32;

/// Clamps a raw score (which may have gone negative after deductions) into `[0, 100]`.
pub fn clamp_score(raw: i64) -> Score {
    raw.clamp(0, 100) as Score
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceType {
    Script,
    Style,
    Image,
    Font,
    Video,
    Other,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Script => "script",
            ResourceType::Style => "style",
            ResourceType::Image => "image",
            ResourceType::Font => "font",
            ResourceType::Video => "video",
            ResourceType::Other => "other",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Inline,
    External,
    ThirdParty,
    Optimization,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Inline => "inline",
            Category::External => "external",
            Category::ThirdParty => "third-party",
            Category::Optimization => "optimization",
        })
    }
}

/// Ordinal severity. `High` is the most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Impact {
    Low,
    Medium,
    High,
}

impl Impact {
    /// Ranking key used for ordering recommendations: high=0, medium=1, low=2.
    pub fn rank(&self) -> u8 {
        match self {
            Impact::High => 0,
            Impact::Medium => 1,
            Impact::Low => 2,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Impact::Low => "low",
            Impact::Medium => "medium",
            Impact::High => "high",
        })
    }
}

/// Step function from an occurrence count to an [`Impact`].
///
/// `count <= low_max` is low, `count <= medium_max` is medium, anything above is high.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImpactLadder {
    pub low_max: usize,
    pub medium_max: usize,
}

impl ImpactLadder {
    pub const fn new(low_max: usize, medium_max: usize) -> Self {
        Self {
            low_max,
            medium_max,
        }
    }

    /// Ladder that never reports `Low`: medium up to `medium_max`, high above.
    pub const fn medium_until(medium_max: usize) -> Self {
        Self::new(0, medium_max)
    }

    /// Ladder that always reports the same impact regardless of count.
    pub const fn fixed(impact: Impact) -> Self {
        match impact {
            Impact::Low => Self::new(usize::MAX, usize::MAX),
            Impact::Medium => Self::new(0, usize::MAX),
            Impact::High => Self::new(0, 0),
        }
    }

    pub fn classify(&self, count: usize) -> Impact {
        if count <= self.low_max {
            Impact::Low
        } else if count <= self.medium_max {
            Impact::Medium
        } else {
            Impact::High
        }
    }
}

/// One structured detection emitted by a resource analyzer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Finding {
    pub resource_type: ResourceType,
    pub category: Category,
    pub count: usize,
    pub total_size: u64,
    pub impact: Impact,
    /// Empty when no trigger threshold fired.
    pub recommendation: String,
}

/// Runtime metrics supplied by an external collaborator for one run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PerformanceMetrics {
    /// Milliseconds.
    pub cpu_time: f64,
    /// Bytes.
    pub memory_usage: f64,
    pub network_requests: u32,
    /// Kilobytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_size: Option<f64>,
    /// Milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub js_execution_time: Option<f64>,
}

/// Energy estimate in watt-hours, split by source.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct EnergyBreakdown {
    pub cpu: f64,
    pub network: f64,
    pub memory: f64,
}

impl EnergyBreakdown {
    pub fn total(&self) -> f64 {
        self.cpu + self.network + self.memory
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub message: String,
    pub impact: Impact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_score_bounds_pathological_values() {
        assert_eq!(clamp_score(-250), 0);
        assert_eq!(clamp_score(42), 42);
        assert_eq!(clamp_score(i64::MAX), 100);
    }

    #[test]
    fn ladder_is_monotone_step() {
        let ladder = ImpactLadder::new(2, 5);
        assert_eq!(ladder.classify(0), Impact::Low);
        assert_eq!(ladder.classify(2), Impact::Low);
        assert_eq!(ladder.classify(3), Impact::Medium);
        assert_eq!(ladder.classify(5), Impact::Medium);
        assert_eq!(ladder.classify(6), Impact::High);
    }

    #[test]
    fn fixed_ladders_ignore_count() {
        for count in [1, 7, 1_000] {
            assert_eq!(ImpactLadder::fixed(Impact::Low).classify(count), Impact::Low);
            assert_eq!(
                ImpactLadder::fixed(Impact::Medium).classify(count),
                Impact::Medium
            );
            assert_eq!(ImpactLadder::fixed(Impact::High).classify(count), Impact::High);
        }
    }

    #[test]
    fn categories_serialize_kebab_case() {
        let json = serde_json::to_string(&Category::ThirdParty).unwrap();
        assert_eq!(json, "\"third-party\"");
    }

    #[test]
    fn impact_rank_puts_high_first() {
        assert!(Impact::High.rank() < Impact::Medium.rank());
        assert!(Impact::Medium.rank() < Impact::Low.rank());
    }
}
