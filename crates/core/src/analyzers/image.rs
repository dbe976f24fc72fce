use std::sync::Arc;

use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;

use super::{captures, score_with_penalties, CountRule, PageContext, Penalty, ResourceAnalyzer};
use crate::source::SizeResolver;
use crate::types::{Category, Finding, ImpactLadder, ResourceType, Score};

static RE_IMG_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)<img[^>]*src=["']([^"']+)["'][^>]*>"#).expect("valid regex")
});

static RE_LEGACY_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpe?g|png|gif|bmp)$").expect("valid regex"));

static RE_BACKGROUND_IMAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i)background(-image)?\s*:\s*url\(['"]?([^'")]+)['"]?\)"#).expect("valid regex")
});

const MODERN_FORMAT_MARKERS: &[&str] = &["webp", "avif"];

const LADDER: ImpactLadder = ImpactLadder::new(5, 15);

const IMAGES: CountRule = CountRule {
    category: Category::External,
    ladder: LADDER,
    emit_above: 0,
    advise_above: 10,
    message: "High number of images detected. Consider using image sprites or lazy loading for better performance.",
};

const MISSING_DIMENSIONS: CountRule = CountRule {
    category: Category::External,
    ladder: LADDER,
    emit_above: 0,
    advise_above: 0,
    message: "Images without explicit width and height attributes cause layout shifts during page load. Add these attributes to all images.",
};

const LEGACY_FORMAT: CountRule = CountRule {
    category: Category::External,
    ladder: ImpactLadder::medium_until(5),
    emit_above: 0,
    advise_above: 0,
    message: "Consider using WebP or AVIF format for images which can reduce file size by up to 30% compared to JPEG/PNG.",
};

const BACKGROUND_IMAGES: CountRule = CountRule {
    category: Category::External,
    ladder: ImpactLadder::medium_until(7),
    emit_above: 3,
    advise_above: 0,
    message: "Multiple CSS background images detected. Consider combining them into CSS sprites or using modern CSS techniques like gradients where appropriate.",
};

const PENALTIES: &[Penalty] = &[
    Penalty::count_above(Category::External, 10, 10),
    Penalty::count_above(Category::External, 20, 10),
    Penalty::mentions("width and height attributes", 10),
    Penalty::mentions("WebP or AVIF", 10),
    Penalty::mentions("background images", 5),
];

/// `<img>` references, their attributes and formats, plus CSS background images.
///
/// With a [`SizeResolver`] attached, the aggregate image finding carries the
/// summed byte size of every reference that could be resolved.
#[derive(Clone, Default)]
pub struct ImageAnalyzer {
    resolver: Option<Arc<dyn SizeResolver>>,
}

impl std::fmt::Debug for ImageAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageAnalyzer")
            .field("resolves_sizes", &self.resolver.is_some())
            .finish()
    }
}

impl ImageAnalyzer {
    pub fn new() -> Self {
        Self { resolver: None }
    }

    pub fn with_resolver(resolver: Arc<dyn SizeResolver>) -> Self {
        Self {
            resolver: Some(resolver),
        }
    }

    fn total_size(&self, references: &[&str], ctx: &PageContext) -> u64 {
        let Some(resolver) = self.resolver.as_deref() else {
            return 0;
        };
        references
            .par_iter()
            .map(|reference| resolve_one(resolver, reference, ctx))
            .sum()
    }
}

fn resolve_one(resolver: &dyn SizeResolver, reference: &str, ctx: &PageContext) -> u64 {
    let Some(url) = ctx.absolute_url(reference) else {
        log::debug!("skip non-http image reference: {reference}");
        return 0;
    };
    match resolver.resolve(url.as_str()) {
        Ok(Some(bytes)) => {
            log::debug!("{url} size: {bytes}");
            bytes
        }
        Ok(None) => {
            log::warn!("{url}: size unavailable");
            0
        }
        Err(e) => {
            log::warn!("failed to resolve size of {url}: {e:#}");
            0
        }
    }
}

fn has_dimensions(tag: &str) -> bool {
    let tag = tag.to_ascii_lowercase();
    tag.contains("width=") && tag.contains("height=")
}

fn is_legacy_format(reference: &str) -> bool {
    let lower = reference.to_ascii_lowercase();
    RE_LEGACY_FORMAT.is_match(reference)
        && !MODERN_FORMAT_MARKERS.iter().any(|m| lower.contains(m))
}

impl ResourceAnalyzer for ImageAnalyzer {
    fn resource_type(&self) -> ResourceType {
        ResourceType::Image
    }

    fn analyze(&self, page: &str, ctx: &PageContext) -> Vec<Finding> {
        if page.trim().is_empty() {
            return Vec::new();
        }
        let ty = ResourceType::Image;

        let mut images: Vec<&str> = Vec::new();
        let mut missing_dimensions = 0;
        let mut legacy = 0;
        for cap in RE_IMG_TAG.captures_iter(page) {
            let (Some(tag), Some(src)) = (cap.get(0), cap.get(1)) else {
                continue;
            };
            let src = src.as_str();
            images.push(src);
            if !has_dimensions(tag.as_str()) {
                missing_dimensions += 1;
            }
            if is_legacy_format(src) {
                legacy += 1;
            }
        }

        let mut findings = Vec::new();
        if !images.is_empty() {
            let total = self.total_size(&images, ctx);
            findings.extend(IMAGES.apply(ty, images.len(), total));
        }
        findings.extend(MISSING_DIMENSIONS.apply(ty, missing_dimensions, 0));
        findings.extend(LEGACY_FORMAT.apply(ty, legacy, 0));

        let backgrounds = captures(&RE_BACKGROUND_IMAGE, page, 2).len();
        findings.extend(BACKGROUND_IMAGES.apply(ty, backgrounds, 0));

        findings
    }

    fn calculate_score(&self, findings: &[Finding]) -> Score {
        score_with_penalties(findings, PENALTIES)
    }
}
