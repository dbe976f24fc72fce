use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{
    clamp_score, Finding, Impact, PerformanceMetrics, Recommendation, ResourceType, Score,
};

static RE_TYPE_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[^\]]*\]\s*").expect("valid regex"));

/// A fixed-text recommendation raised when an optional metric exceeds `above`.
struct MetricRule {
    metric: fn(&PerformanceMetrics) -> Option<f64>,
    above: f64,
    impact: Impact,
    message: &'static str,
    action: &'static str,
}

const METRIC_RULES: &[MetricRule] = &[
    MetricRule {
        metric: |m| m.image_size,
        above: 1000.0,
        impact: Impact::High,
        message: "Consider compressing images to reduce load time and energy consumption.",
        action: "Serve compressed WebP/AVIF images sized for their display dimensions",
    },
    MetricRule {
        metric: |m| m.js_execution_time,
        above: 200.0,
        impact: Impact::Medium,
        message: "Minimize JavaScript execution time by reducing the number of scripts or optimizing existing code.",
        action: "Defer non-critical scripts and split large bundles",
    },
];

/// Style findings above this count get a relocation example appended.
const STYLE_EXAMPLE_ABOVE: usize = 5;

const STYLE_RELOCATION_EXAMPLE: &str = "\n  Example:\n    Before: <div style=\"color: #333; margin: 0 auto\">...</div>\n    After:  <div class=\"content\">...</div>  /* styles.css: .content { color: #333; margin: 0 auto; } */";

#[derive(Debug, Clone, Copy, Default)]
pub struct RecommendationEngine;

impl RecommendationEngine {
    pub fn new() -> Self {
        Self
    }

    /// Baseline recommendations driven by runtime metrics alone.
    pub fn generate_recommendations(&self, metrics: &PerformanceMetrics) -> Vec<Recommendation> {
        METRIC_RULES
            .iter()
            .filter(|rule| (rule.metric)(metrics).is_some_and(|v| v > rule.above))
            .map(|rule| Recommendation {
                message: rule.message.to_string(),
                impact: rule.impact,
                suggested_action: Some(rule.action.to_string()),
            })
            .collect()
    }

    /// One recommendation per finding that carries advice, tagged with its resource type.
    pub fn merge_resource_recommendations(&self, findings: &[Finding]) -> Vec<Recommendation> {
        findings
            .iter()
            .filter(|f| !f.recommendation.trim().is_empty())
            .map(|f| {
                let mut message = format!(
                    "[{}] {}",
                    f.resource_type.as_str().to_ascii_uppercase(),
                    f.recommendation
                );
                if f.resource_type == ResourceType::Style && f.count > STYLE_EXAMPLE_ABOVE {
                    message.push_str(STYLE_RELOCATION_EXAMPLE);
                }
                Recommendation {
                    message,
                    impact: f.impact,
                    suggested_action: None,
                }
            })
            .collect()
    }

    /// Deduplicates by normalized message, keeping the most severe instance,
    /// and orders the result high-impact first. Ties keep first-seen order.
    pub fn consolidate(&self, recommendations: Vec<Recommendation>) -> Vec<Recommendation> {
        let mut index: HashMap<String, usize> = HashMap::new();
        let mut unique: Vec<Recommendation> = Vec::new();

        for rec in recommendations {
            let key = normalize_message(&rec.message);
            match index.get(&key) {
                Some(&i) => {
                    if rec.impact.rank() < unique[i].impact.rank() {
                        unique[i] = rec;
                    }
                }
                None => {
                    index.insert(key, unique.len());
                    unique.push(rec);
                }
            }
        }

        unique.sort_by_key(|r| r.impact.rank());
        unique
    }

    pub fn calculate_score(&self, recommendations: &[Recommendation]) -> Score {
        let deducted: i64 = recommendations
            .iter()
            .map(|r| match r.impact {
                Impact::High => 15,
                Impact::Medium => 7,
                Impact::Low => 3,
            })
            .sum();
        clamp_score(100 - deducted)
    }
}

/// Message text with any leading `[TYPE]` tag and surrounding whitespace removed.
pub fn normalize_message(message: &str) -> String {
    RE_TYPE_TAG.replace(message, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;

    fn rec(message: &str, impact: Impact) -> Recommendation {
        Recommendation {
            message: message.to_string(),
            impact,
            suggested_action: None,
        }
    }

    fn finding(resource_type: ResourceType, count: usize, recommendation: &str) -> Finding {
        Finding {
            resource_type,
            category: Category::Inline,
            count,
            total_size: 0,
            impact: Impact::Medium,
            recommendation: recommendation.to_string(),
        }
    }

    #[test]
    fn baseline_rules_fire_on_thresholds() {
        let engine = RecommendationEngine::new();
        let metrics = PerformanceMetrics {
            cpu_time: 100.0,
            memory_usage: 0.0,
            network_requests: 1,
            image_size: Some(1500.0),
            js_execution_time: Some(250.0),
        };
        let recs = engine.generate_recommendations(&metrics);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].impact, Impact::High);
        assert!(recs[0].message.contains("compressing images"));
        assert_eq!(recs[1].impact, Impact::Medium);
        assert!(recs[1].suggested_action.is_some());
    }

    #[test]
    fn absent_metrics_raise_nothing() {
        let metrics = PerformanceMetrics {
            cpu_time: 0.0,
            memory_usage: 0.0,
            network_requests: 0,
            image_size: None,
            js_execution_time: Some(200.0),
        };
        assert!(RecommendationEngine::new()
            .generate_recommendations(&metrics)
            .is_empty());
    }

    #[test]
    fn merge_tags_messages_and_skips_silent_findings() {
        let findings = vec![
            finding(ResourceType::Script, 4, "Bundle scripts"),
            finding(ResourceType::Image, 1, ""),
        ];
        let recs = RecommendationEngine::new().merge_resource_recommendations(&findings);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].message, "[SCRIPT] Bundle scripts");
        assert_eq!(recs[0].impact, Impact::Medium);
    }

    #[test]
    fn large_style_findings_get_relocation_example() {
        let engine = RecommendationEngine::new();
        let small =
            engine.merge_resource_recommendations(&[finding(ResourceType::Style, 3, "Use classes")]);
        assert_eq!(small[0].message, "[STYLE] Use classes");

        let large =
            engine.merge_resource_recommendations(&[finding(ResourceType::Style, 6, "Use classes")]);
        assert!(large[0].message.starts_with("[STYLE] Use classes"));
        assert!(large[0].message.contains("Before:"));
        assert!(large[0].message.contains("After:"));
    }

    #[test]
    fn consolidate_keeps_most_severe_duplicate() {
        let recs = vec![
            rec("[STYLE] Minify assets", Impact::Low),
            rec("Cache aggressively", Impact::Medium),
            rec("  [SCRIPT]   Minify assets ", Impact::High),
        ];
        let out = RecommendationEngine::new().consolidate(recs);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].impact, Impact::High);
        assert_eq!(normalize_message(&out[0].message), "Minify assets");
        assert_eq!(out[1].message, "Cache aggressively");
    }

    #[test]
    fn consolidate_orders_high_first_and_is_stable() {
        let recs = vec![
            rec("a", Impact::Low),
            rec("b", Impact::Medium),
            rec("c", Impact::Low),
            rec("d", Impact::High),
        ];
        let out = RecommendationEngine::new().consolidate(recs);
        let messages: Vec<&str> = out.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(messages, vec!["d", "b", "a", "c"]);
    }

    #[test]
    fn consolidate_is_idempotent() {
        let engine = RecommendationEngine::new();
        let recs = vec![
            rec("[IMAGE] Lazy load", Impact::Medium),
            rec("Lazy load", Impact::Low),
            rec("Compress", Impact::High),
        ];
        let once = engine.consolidate(recs);
        let twice = engine.consolidate(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn score_deducts_by_impact_and_clamps() {
        let engine = RecommendationEngine::new();
        let recs = vec![
            rec("a", Impact::High),
            rec("b", Impact::Medium),
            rec("c", Impact::Low),
        ];
        assert_eq!(engine.calculate_score(&recs), 75);
        assert_eq!(engine.calculate_score(&vec![rec("x", Impact::High); 10]), 0);
        assert_eq!(engine.calculate_score(&[]), 100);
    }
}
