use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{Finding, PerformanceMetrics, ResourceType, Score};

/// Per-dimension scores of one run.
///
/// Resource dimensions are `None` when their analyzer produced no findings;
/// such dimensions are left out of the composite.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DimensionScores {
    pub static_analysis: Score,
    pub script: Option<Score>,
    pub style: Option<Score>,
    pub image: Option<Score>,
    pub performance: Score,
    pub energy: Score,
    /// Reported alongside the others but never part of the composite.
    pub recommendation: Score,
}

impl DimensionScores {
    /// Scores that take part in the composite, in a fixed order.
    pub fn included(&self) -> Vec<Score> {
        let mut scores = vec![self.static_analysis];
        scores.extend(self.script);
        scores.extend(self.style);
        scores.extend(self.image);
        scores.push(self.performance);
        scores.push(self.energy);
        scores
    }

    pub fn composite(&self) -> Score {
        aggregate(&self.included())
    }
}

/// Rounded arithmetic mean. An empty slice aggregates to 0.
pub fn aggregate(scores: &[Score]) -> Score {
    if scores.is_empty() {
        return 0;
    }
    let sum: f64 = scores.iter().map(|s| f64::from(*s)).sum();
    let mean = sum / scores.len() as f64;
    mean.round().clamp(0.0, 100.0) as Score
}

/// Kilobytes per resource type, summed over that type's findings and
/// rounded to two decimals. Every listed type appears, even when zero.
pub fn resource_size_breakdown<'a, I>(groups: I) -> BTreeMap<ResourceType, f64>
where
    I: IntoIterator<Item = (ResourceType, &'a [Finding])>,
{
    groups
        .into_iter()
        .map(|(ty, findings)| {
            let bytes: u64 = findings.iter().map(|f| f.total_size).sum();
            (ty, round2(bytes as f64 / 1024.0))
        })
        .collect()
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Advisory consistency checks between supplied metrics and image findings.
pub fn validate_metrics(metrics: &PerformanceMetrics, image_findings: &[Finding]) -> Vec<String> {
    let mut warnings = Vec::new();

    let reported_kb = metrics.image_size.filter(|kb| *kb > 0.0);
    let resolved_bytes: u64 = image_findings.iter().map(|f| f.total_size).sum();

    if let Some(kb) = reported_kb {
        if image_findings.is_empty() {
            warnings.push(format!(
                "metrics report {kb} KB of images but no image resources were found in the page"
            ));
        }
    } else if resolved_bytes > 0 {
        warnings.push(format!(
            "metrics report no image payload but {resolved_bytes} bytes of images were resolved"
        ));
    }

    let referenced = image_findings.iter().map(|f| f.count).max().unwrap_or(0);
    if referenced > metrics.network_requests as usize {
        warnings.push(format!(
            "metrics report {} network requests but the page references at least {referenced} images",
            metrics.network_requests
        ));
    }

    for warning in &warnings {
        log::warn!("{warning}");
    }
    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Category, Impact};

    fn image(count: usize, total_size: u64) -> Finding {
        Finding {
            resource_type: ResourceType::Image,
            category: Category::External,
            count,
            total_size,
            impact: Impact::Low,
            recommendation: String::new(),
        }
    }

    fn metrics(image_size: Option<f64>, network_requests: u32) -> PerformanceMetrics {
        PerformanceMetrics {
            cpu_time: 0.0,
            memory_usage: 0.0,
            network_requests,
            image_size,
            js_execution_time: None,
        }
    }

    #[test]
    fn aggregate_rounds_mean() {
        assert_eq!(aggregate(&[100, 90, 80, 70, 100]), 88);
        assert_eq!(aggregate(&[100, 99]), 100);
        assert_eq!(aggregate(&[0, 1]), 1);
        assert_eq!(aggregate(&[]), 0);
    }

    #[test]
    fn empty_resource_dimensions_are_excluded() {
        let scores = DimensionScores {
            static_analysis: 90,
            script: None,
            style: Some(70),
            image: None,
            performance: 100,
            energy: 80,
            recommendation: 10,
        };
        assert_eq!(scores.included(), vec![90, 70, 100, 80]);
        assert_eq!(scores.composite(), 85);
    }

    #[test]
    fn breakdown_converts_to_rounded_kilobytes() {
        let images = vec![image(2, 1536), image(1, 100)];
        let breakdown = resource_size_breakdown([
            (ResourceType::Image, images.as_slice()),
            (ResourceType::Script, &[][..]),
        ]);
        assert_eq!(breakdown[&ResourceType::Image], 1.6);
        assert_eq!(breakdown[&ResourceType::Script], 0.0);
    }

    #[test]
    fn image_size_without_images_warns() {
        let warnings = validate_metrics(&metrics(Some(1500.0), 15), &[]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("no image resources"));
    }

    #[test]
    fn consistent_metrics_produce_no_warnings() {
        assert!(validate_metrics(&metrics(Some(1500.0), 15), &[image(3, 0)]).is_empty());
        assert!(validate_metrics(&metrics(None, 0), &[]).is_empty());
    }

    #[test]
    fn resolved_bytes_without_reported_size_warn() {
        let warnings = validate_metrics(&metrics(None, 15), &[image(1, 4096)]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("4096 bytes"));
    }

    #[test]
    fn more_images_than_requests_warns() {
        let warnings = validate_metrics(&metrics(Some(10.0), 2), &[image(5, 0)]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("at least 5 images"));
    }
}
