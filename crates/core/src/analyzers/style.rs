use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    byte_len, captures, score_with_penalties, CountRule, PageContext, Penalty, ResourceAnalyzer,
};
use crate::types::{Category, Finding, Impact, ImpactLadder, ResourceType, Score};

static RE_STYLE_BLOCK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<style[^>]*>(.*?)</style>").expect("valid regex"));

static RE_STYLESHEET_LINK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<link[^>]*rel=["']stylesheet["'][^>]*href=["']([^"']+)["'][^>]*>"#)
        .expect("valid regex")
});

static RE_STYLE_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)style=["']([^"']+)["']"#).expect("valid regex"));

static RE_ANIMATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)@keyframes\s+\w+|animation\s*:|transition\s*:").expect("valid regex")
});

static RE_CUSTOM_PROPERTY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--[\w-]+\s*:").expect("valid regex"));

static RE_IMPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)@import\s+url\(").expect("valid regex"));

static RE_FONT_FACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)@font-face\s*\{[^}]*\}").expect("valid regex"));

static RE_FONT_DISPLAY_SWAP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"font-display\s*:\s*swap").expect("valid regex"));

const LADDER: ImpactLadder = ImpactLadder::new(2, 5);

const INLINE_BLOCKS: CountRule = CountRule {
    category: Category::Inline,
    ladder: LADDER,
    emit_above: 0,
    advise_above: 2,
    message: "It is recommended to merge multiple inline styles into a single external stylesheet to improve caching efficiency",
};

const THIRD_PARTY: CountRule = CountRule {
    category: Category::ThirdParty,
    ladder: LADDER,
    emit_above: 0,
    advise_above: 3,
    message: "Reduce the number of third-party stylesheets to lower network load",
};

const EXTERNAL: CountRule = CountRule {
    category: Category::External,
    ladder: LADDER,
    emit_above: 0,
    advise_above: 4,
    message: "It is recommended to merge external stylesheets to reduce HTTP requests",
};

const INLINE_ATTRIBUTES: CountRule = CountRule {
    category: Category::Optimization,
    ladder: ImpactLadder::medium_until(20),
    emit_above: 5,
    advise_above: 0,
    message: "Too many inline styles will bloat the HTML and make it hard to maintain. It is recommended to use CSS classes instead.",
};

const ANIMATIONS: CountRule = CountRule {
    category: Category::Optimization,
    ladder: ImpactLadder::medium_until(10),
    emit_above: 5,
    advise_above: 0,
    message: "Too many CSS animations will increase CPU load and power consumption. It is recommended to reduce or optimize animations.",
};

const IMPORTS: CountRule = CountRule {
    category: Category::Optimization,
    ladder: ImpactLadder::medium_until(2),
    emit_above: 0,
    advise_above: 0,
    message: "Avoid excessive use of @import in CSS. Prefer combining stylesheets to reduce blocking requests.",
};

const fn advisory(impact: Impact, message: &'static str) -> CountRule {
    CountRule {
        category: Category::Optimization,
        ladder: ImpactLadder::fixed(impact),
        emit_above: 0,
        advise_above: 0,
        message,
    }
}

const MINIFY: CountRule = advisory(
    Impact::Medium,
    "Minify CSS using tools like cssnano or CleanCSS to reduce file size and improve load speed.",
);

const CRITICAL_CSS: CountRule = advisory(
    Impact::Medium,
    "Consider extracting and inlining critical CSS for above-the-fold content to speed up first paint.",
);

const CUSTOM_PROPERTIES: CountRule = advisory(
    Impact::Low,
    "Use CSS custom properties (variables) for colors and spacing to improve maintainability and reduce duplication.",
);

const MODERN_LAYOUT: CountRule = advisory(
    Impact::Low,
    "Consider using modern CSS features like flexbox and grid for layout to reduce reliance on heavy frameworks.",
);

const UNUSED_CSS: CountRule = advisory(
    Impact::Medium,
    "Remove unused CSS with tools like PurgeCSS or UnCSS to reduce CSS size and improve efficiency.",
);

const FONT_DISPLAY: CountRule = advisory(
    Impact::Low,
    "Add `font-display: swap` to @font-face rules to improve text rendering speed and user experience.",
);

/// External stylesheets above this count also get the critical-CSS advisory.
const CRITICAL_CSS_ABOVE: usize = 2;

const PENALTIES: &[Penalty] = &[
    Penalty::count_above(Category::Inline, 2, 5),
    Penalty::count_above(Category::Inline, 10, 10),
    Penalty::count_above(Category::Inline, 20, 15),
    Penalty::count_above(Category::External, 4, 10),
    Penalty::count_above(Category::External, 8, 15),
    Penalty::count_above(Category::ThirdParty, 2, 5),
    Penalty::count_above(Category::ThirdParty, 5, 10),
    Penalty::mentions("animations", 5),
    Penalty::impact(Category::Optimization, Impact::High, 10),
    Penalty::impact(Category::Optimization, Impact::Medium, 5),
    Penalty::impact(Category::Optimization, Impact::Low, 2),
];

/// Stylesheet usage: `<style>` blocks, linked sheets, `style=` attributes
/// and a set of optimization advisories.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleAnalyzer;

impl StyleAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

impl ResourceAnalyzer for StyleAnalyzer {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Style
    }

    fn analyze(&self, page: &str, ctx: &PageContext) -> Vec<Finding> {
        if page.trim().is_empty() {
            return Vec::new();
        }
        let ty = ResourceType::Style;
        let mut findings = Vec::new();

        let blocks: Vec<&str> = captures(&RE_STYLE_BLOCK, page, 1)
            .into_iter()
            .filter(|body| !body.trim().is_empty())
            .collect();
        findings.extend(INLINE_BLOCKS.apply(ty, blocks.len(), byte_len(&blocks)));

        let sheets = captures(&RE_STYLESHEET_LINK, page, 1);
        let third_party = sheets.iter().filter(|href| ctx.is_third_party(href)).count();
        findings.extend(THIRD_PARTY.apply(ty, third_party, 0));
        findings.extend(EXTERNAL.apply(ty, sheets.len(), 0));

        let attributes = captures(&RE_STYLE_ATTR, page, 1).len();
        findings.extend(INLINE_ATTRIBUTES.apply(ty, attributes, 0));

        let animations = RE_ANIMATION.find_iter(page).count();
        findings.extend(ANIMATIONS.apply(ty, animations, 0));

        let has_styles = !blocks.is_empty() || !sheets.is_empty();

        if has_styles {
            findings.extend(MINIFY.apply(ty, 1, 0));
        }
        if sheets.len() > CRITICAL_CSS_ABOVE {
            findings.extend(CRITICAL_CSS.apply(ty, 1, 0));
        }
        if has_styles && !RE_CUSTOM_PROPERTY.is_match(page) {
            findings.extend(CUSTOM_PROPERTIES.apply(ty, 1, 0));
        }

        let imports = RE_IMPORT.find_iter(page).count();
        findings.extend(IMPORTS.apply(ty, imports, 0));

        if has_styles {
            findings.extend(MODERN_LAYOUT.apply(ty, 1, 0));
            findings.extend(UNUSED_CSS.apply(ty, 1, 0));
        }
        if RE_FONT_FACE.is_match(page) && !RE_FONT_DISPLAY_SWAP.is_match(page) {
            findings.extend(FONT_DISPLAY.apply(ty, 1, 0));
        }

        log::debug!("style analyzer produced {} findings", findings.len());
        findings
    }

    fn calculate_score(&self, findings: &[Finding]) -> Score {
        score_with_penalties(findings, PENALTIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analyze(page: &str) -> Vec<Finding> {
        StyleAnalyzer::new().analyze(page, &PageContext::default())
    }

    fn inline_blocks(findings: &[Finding]) -> Vec<&Finding> {
        findings
            .iter()
            .filter(|f| f.category == Category::Inline)
            .collect()
    }

    #[test]
    fn single_inline_block_has_no_recommendation() {
        let findings = analyze("<style>body { color: red; }</style>");
        let inline = inline_blocks(&findings);
        assert_eq!(inline.len(), 1);
        assert_eq!(inline[0].count, 1);
        assert_eq!(inline[0].recommendation, "");
        assert_eq!(inline[0].impact, Impact::Low);
        assert_eq!(inline[0].total_size, "body { color: red; }".len() as u64);
    }

    #[test]
    fn four_inline_blocks_trigger_merge_advice() {
        let page = "<style>a{}</style>".repeat(4);
        let findings = analyze(&page);
        let inline = inline_blocks(&findings);
        assert_eq!(inline[0].count, 4);
        assert_eq!(inline[0].impact, Impact::Medium);
        assert!(!inline[0].recommendation.is_empty());
    }

    #[test]
    fn blank_style_blocks_are_ignored() {
        let findings = analyze("<style>   </style><p>hi</p>");
        assert!(inline_blocks(&findings).is_empty());
    }

    #[test]
    fn stylesheets_split_into_external_and_third_party() {
        let page = r#"
            <link rel="stylesheet" href="/local.css">
            <link rel="stylesheet" href="https://example.com/site.css">
            <link rel="stylesheet" href="https://cdn.other.net/lib.css">
        "#;
        let ctx = PageContext::default().with_own_host("example.com");
        let findings = StyleAnalyzer::new().analyze(page, &ctx);

        let third = findings
            .iter()
            .find(|f| f.category == Category::ThirdParty)
            .unwrap();
        assert_eq!(third.count, 1);
        let external = findings
            .iter()
            .find(|f| f.category == Category::External)
            .unwrap();
        assert_eq!(external.count, 3);
        assert!(findings
            .iter()
            .any(|f| f.recommendation.contains("critical CSS")));
    }

    #[test]
    fn excessive_style_attributes_become_optimization_finding() {
        let page = r#"<p style="color:red">x</p>"#.repeat(6);
        let findings = analyze(&page);
        let attrs = findings
            .iter()
            .find(|f| f.recommendation.contains("CSS classes"))
            .unwrap();
        assert_eq!(attrs.category, Category::Optimization);
        assert_eq!(attrs.count, 6);
        assert_eq!(attrs.impact, Impact::Medium);
        assert_eq!(attrs.total_size, 0);
    }

    #[test]
    fn font_face_without_swap_is_flagged() {
        let page = "<style>@font-face { font-family: X; src: url(x.woff2); }</style>";
        assert!(analyze(page)
            .iter()
            .any(|f| f.recommendation.contains("font-display")));

        let swapped =
            "<style>@font-face { font-family: X; font-display: swap; src: url(x.woff2); }</style>";
        assert!(!analyze(swapped)
            .iter()
            .any(|f| f.recommendation.contains("font-display")));
    }

    #[test]
    fn custom_properties_suppress_variable_advice() {
        let page = "<style>:root { --brand: #0a0; } a { color: var(--brand); }</style>";
        assert!(!analyze(page)
            .iter()
            .any(|f| f.recommendation.contains("custom properties")));
    }

    #[test]
    fn imports_are_counted() {
        let page = "<style>@import url(a.css); @import url(b.css); @import url(c.css);</style>";
        let import = analyze(page)
            .into_iter()
            .find(|f| f.recommendation.contains("@import"))
            .unwrap();
        assert_eq!(import.count, 3);
        assert_eq!(import.impact, Impact::High);
    }

    #[test]
    fn blank_input_yields_nothing() {
        assert!(analyze("").is_empty());
        assert!(analyze("  \n\t ").is_empty());
    }

    #[test]
    fn score_for_single_block_counts_only_advisories() {
        let analyzer = StyleAnalyzer::new();
        let findings = analyze("<style>body { color: red; }</style>");
        // minify (-5), custom properties (-2), modern layout (-2), unused css (-5)
        assert_eq!(analyzer.calculate_score(&findings), 86);
    }

    #[test]
    fn score_of_no_findings_is_perfect() {
        assert_eq!(StyleAnalyzer::new().calculate_score(&[]), 100);
    }
}
