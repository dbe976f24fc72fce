use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    byte_len, captures, score_with_penalties, CountRule, PageContext, Penalty, ResourceAnalyzer,
};
use crate::types::{Category, Finding, ImpactLadder, ResourceType, Score};

static RE_SCRIPT_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<script[^>]*>(.*?)</script>").expect("valid regex"));

static RE_SCRIPT_SRC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<script[^>]*src=["']([^"']+)["'][^>]*>"#).expect("valid regex")
});

const LADDER: ImpactLadder = ImpactLadder::new(3, 8);

const INLINE_BLOCKS: CountRule = CountRule {
    category: Category::Inline,
    ladder: LADDER,
    emit_above: 0,
    advise_above: 3,
    message: "Consider combining inline scripts into a single external file to improve caching",
};

const THIRD_PARTY: CountRule = CountRule {
    category: Category::ThirdParty,
    ladder: LADDER,
    emit_above: 0,
    advise_above: 5,
    message: "Reduce the number of third-party scripts to minimize network overhead and processing time",
};

const EXTERNAL: CountRule = CountRule {
    category: Category::External,
    ladder: LADDER,
    emit_above: 0,
    advise_above: 8,
    message: "Consider bundling external scripts to reduce HTTP requests",
};

const PENALTIES: &[Penalty] = &[
    Penalty::count_above(Category::Inline, 3, 5),
    Penalty::count_above(Category::Inline, 8, 10),
    Penalty::count_above(Category::External, 8, 10),
    Penalty::count_above(Category::External, 15, 10),
    Penalty::count_above(Category::ThirdParty, 5, 10),
    Penalty::count_above(Category::ThirdParty, 10, 10),
];

/// Inline `<script>` bodies and `src`-referenced scripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptAnalyzer;

impl ScriptAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceAnalyzer for ScriptAnalyzer {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Script
    }

    fn analyze(&self, page: &str, ctx: &PageContext) -> Vec<Finding> {
        if page.trim().is_empty() {
            return Vec::new();
        }
        let ty = ResourceType::Script;
        let mut findings = Vec::new();

        let blocks: Vec<&str> = captures(&RE_SCRIPT_BLOCK, page, 1)
            .into_iter()
            .filter(|body| !body.trim().is_empty())
            .collect();
        findings.extend(INLINE_BLOCKS.apply(ty, blocks.len(), byte_len(&blocks)));

        let sources = captures(&RE_SCRIPT_SRC, page, 1);
        let third_party = sources.iter().filter(|src| ctx.is_third_party(src)).count();
        findings.extend(THIRD_PARTY.apply(ty, third_party, 0));
        findings.extend(EXTERNAL.apply(ty, sources.len(), 0));

        findings
    }

    fn calculate_score(&self, findings: &[Finding]) -> Score {
        score_with_penalties(findings, PENALTIES)
    }
}
