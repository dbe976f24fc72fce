use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    scoring::DimensionScores,
    types::{EnergyBreakdown, Finding, PerformanceMetrics, Recommendation, ResourceType, Score},
};

pub const REPORT_VERSION: &str = "0.3.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub report_version: String,
    pub target: Option<String>,
    pub composite_score: Score,
    pub scores: DimensionScores,
    pub metrics: PerformanceMetrics,
    pub energy: EnergySummary,
    pub static_findings: Vec<String>,
    pub resources: ResourceFindings,
    pub recommendations: Vec<Recommendation>,
    /// Kilobytes per resource type.
    pub resource_breakdown: BTreeMap<ResourceType, f64>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnergySummary {
    pub breakdown: EnergyBreakdown,
    pub total_wh: f64,
    pub carbon_grams: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceFindings {
    pub script: Vec<Finding>,
    pub style: Vec<Finding>,
    pub image: Vec<Finding>,
}

impl ResourceFindings {
    pub fn groups(&self) -> [(ResourceType, &[Finding]); 3] {
        [
            (ResourceType::Script, self.script.as_slice()),
            (ResourceType::Style, self.style.as_slice()),
            (ResourceType::Image, self.image.as_slice()),
        ]
    }

    pub fn all(&self) -> impl Iterator<Item = &Finding> {
        self.script.iter().chain(&self.style).chain(&self.image)
    }
}

fn score_cell(score: Option<Score>) -> String {
    match score {
        Some(s) => format!("`{s}`"),
        None => "n/a (no findings)".to_string(),
    }
}

impl Report {
    pub fn to_markdown(&self) -> String {
        let mut s = String::new();
        s.push_str("# webeco report\n\n");
        s.push_str(&format!("- report_version: `{}`\n", self.report_version));
        if let Some(target) = &self.target {
            s.push_str(&format!("- target: `{}`\n", target));
        }
        s.push_str(&format!("- composite_score: `{}`\n", self.composite_score));
        s.push('\n');

        s.push_str("## Scores\n\n");
        s.push_str(&format!("- static: `{}`\n", self.scores.static_analysis));
        s.push_str(&format!("- script: {}\n", score_cell(self.scores.script)));
        s.push_str(&format!("- style: {}\n", score_cell(self.scores.style)));
        s.push_str(&format!("- image: {}\n", score_cell(self.scores.image)));
        s.push_str(&format!("- performance: `{}`\n", self.scores.performance));
        s.push_str(&format!("- energy: `{}`\n", self.scores.energy));
        s.push_str(&format!(
            "- recommendation: `{}`\n",
            self.scores.recommendation
        ));
        s.push('\n');

        s.push_str("## Energy\n\n");
        s.push_str(&format!("- cpu_wh: `{:.4}`\n", self.energy.breakdown.cpu));
        s.push_str(&format!(
            "- network_wh: `{:.4}`\n",
            self.energy.breakdown.network
        ));
        s.push_str(&format!("- memory_wh: `{:.4}`\n", self.energy.breakdown.memory));
        s.push_str(&format!("- total_wh: `{:.4}`\n", self.energy.total_wh));
        s.push_str(&format!("- carbon_g: `{:.3}`\n", self.energy.carbon_grams));
        s.push('\n');

        s.push_str("## Static analysis\n\n");
        if self.static_findings.is_empty() {
            s.push_str("- (none)\n");
        } else {
            for msg in &self.static_findings {
                s.push_str(&format!("- {}\n", msg));
            }
        }
        s.push('\n');

        s.push_str("## Resources\n\n");
        for (ty, findings) in self.resources.groups() {
            let kb = self.resource_breakdown.get(&ty).copied().unwrap_or(0.0);
            s.push_str(&format!("### {} ({:.2} KB)\n", ty, kb));
            if findings.is_empty() {
                s.push_str("- (none)\n");
            }
            for f in findings {
                s.push_str(&format!(
                    "- {} x{} impact `{}`\n",
                    f.category, f.count, f.impact
                ));
                if !f.recommendation.is_empty() {
                    s.push_str(&format!("  - {}\n", f.recommendation));
                }
            }
            s.push('\n');
        }

        s.push_str("## Recommendations\n\n");
        if self.recommendations.is_empty() {
            s.push_str("- (none)\n");
        } else {
            for r in &self.recommendations {
                s.push_str(&format!("- **{}** {}\n", r.impact, r.message));
                if let Some(action) = &r.suggested_action {
                    s.push_str(&format!("  - action: {}\n", action));
                }
            }
        }

        if !self.warnings.is_empty() {
            s.push_str("\n## Warnings\n\n");
            for w in &self.warnings {
                s.push_str(&format!("- {}\n", w));
            }
        }

        s
    }
}
