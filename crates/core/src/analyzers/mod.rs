mod image;
mod script;
mod style;

use regex::Regex;
use url::Url;

use crate::types::{clamp_score, Category, Finding, Impact, ImpactLadder, ResourceType, Score};

pub use image::ImageAnalyzer;
pub use script::ScriptAnalyzer;
pub use style::StyleAnalyzer;

/// Caller-supplied facts about the page being analyzed.
///
/// `own_host` decides first- vs third-party. When it is absent every
/// network reference counts as third-party.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageContext {
    pub base_url: Option<Url>,
    pub own_host: Option<String>,
}

impl PageContext {
    /// Context for a page served from `url`: relative references resolve
    /// against it and its host is the own host.
    pub fn for_url(url: &Url) -> Self {
        Self {
            base_url: Some(url.clone()),
            own_host: url.host_str().map(str::to_string),
        }
    }

    pub fn with_own_host(mut self, host: impl Into<String>) -> Self {
        self.own_host = Some(host.into());
        self
    }

    pub fn is_third_party(&self, reference: &str) -> bool {
        if !is_network_reference(reference) {
            return false;
        }
        let Some(own) = self.own_host.as_deref() else {
            return true;
        };
        match network_url(reference).as_ref().and_then(Url::host_str) {
            Some(host) => !host.eq_ignore_ascii_case(own),
            None => true,
        }
    }

    /// Absolute `http(s)` form of `reference`, joining relative references
    /// onto `base_url`. `None` when no network URL can be formed.
    pub fn absolute_url(&self, reference: &str) -> Option<Url> {
        let url = if is_network_reference(reference) {
            network_url(reference)?
        } else {
            self.base_url.as_ref()?.join(reference).ok()?
        };
        matches!(url.scheme(), "http" | "https").then_some(url)
    }
}

fn is_network_reference(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

fn network_url(reference: &str) -> Option<Url> {
    let reference = reference.trim();
    if reference.starts_with("//") {
        Url::parse(&format!("https:{reference}")).ok()
    } else {
        Url::parse(reference).ok()
    }
}

/// An analyzer over raw page text for one resource type.
pub trait ResourceAnalyzer {
    fn resource_type(&self) -> ResourceType;

    /// Blank input yields no findings.
    fn analyze(&self, page: &str, ctx: &PageContext) -> Vec<Finding>;

    fn calculate_score(&self, findings: &[Finding]) -> Score;
}

/// Declarative description of one counted finding.
#[derive(Debug, Clone, Copy)]
pub struct CountRule {
    pub category: Category,
    pub ladder: ImpactLadder,
    /// The finding is only emitted when the count is above this.
    pub emit_above: usize,
    /// `message` is attached only when the count is above this.
    pub advise_above: usize,
    pub message: &'static str,
}

impl CountRule {
    pub fn apply(&self, resource_type: ResourceType, count: usize, total_size: u64) -> Option<Finding> {
        if count == 0 || count <= self.emit_above {
            return None;
        }
        let recommendation = if count > self.advise_above {
            self.message.to_string()
        } else {
            String::new()
        };
        Some(Finding {
            resource_type,
            category: self.category,
            count,
            total_size,
            impact: self.ladder.classify(count),
            recommendation,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub enum PenaltyTrigger {
    /// Finding of `category` whose count is above `above`.
    CountAbove { category: Category, above: usize },
    /// Finding of `category` with exactly this impact.
    ImpactIs { category: Category, impact: Impact },
    /// Finding whose recommendation contains the marker text.
    Mentions(&'static str),
}

/// Points deducted from 100 for every finding matching `trigger`.
#[derive(Debug, Clone, Copy)]
pub struct Penalty {
    pub trigger: PenaltyTrigger,
    pub points: i64,
}

impl Penalty {
    pub const fn count_above(category: Category, above: usize, points: i64) -> Self {
        Self {
            trigger: PenaltyTrigger::CountAbove { category, above },
            points,
        }
    }

    pub const fn impact(category: Category, impact: Impact, points: i64) -> Self {
        Self {
            trigger: PenaltyTrigger::ImpactIs { category, impact },
            points,
        }
    }

    pub const fn mentions(marker: &'static str, points: i64) -> Self {
        Self {
            trigger: PenaltyTrigger::Mentions(marker),
            points,
        }
    }

    fn matches(&self, finding: &Finding) -> bool {
        match self.trigger {
            PenaltyTrigger::CountAbove { category, above } => {
                finding.category == category && finding.count > above
            }
            PenaltyTrigger::ImpactIs { category, impact } => {
                finding.category == category && finding.impact == impact
            }
            PenaltyTrigger::Mentions(marker) => finding.recommendation.contains(marker),
        }
    }
}

/// 100 minus every matching penalty, clamped.
pub fn score_with_penalties(findings: &[Finding], penalties: &[Penalty]) -> Score {
    let deducted: i64 = findings
        .iter()
        .flat_map(|f| penalties.iter().filter(move |p| p.matches(f)))
        .map(|p| p.points)
        .sum();
    clamp_score(100 - deducted)
}

/// Non-empty captures of `group` for every match of `re`.
pub(crate) fn captures<'t>(re: &Regex, text: &'t str, group: usize) -> Vec<&'t str> {
    re.captures_iter(text)
        .filter_map(|cap| cap.get(group))
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .collect()
}

pub(crate) fn byte_len(parts: &[&str]) -> u64 {
    parts.iter().map(|s| s.len() as u64).sum()
}
