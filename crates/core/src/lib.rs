pub mod analyzers;
pub mod config;
pub mod energy;
pub mod error;
pub mod performance;
pub mod recommendations;
pub mod report;
pub mod scoring;
pub mod source;
pub mod static_rules;
pub mod types;

use std::sync::Arc;

use url::Url;

use crate::{
    analyzers::{ImageAnalyzer, PageContext, ResourceAnalyzer, ScriptAnalyzer, StyleAnalyzer},
    energy::{estimate_carbon_grams, EnergyEstimator, DEFAULT_CARBON_INTENSITY},
    error::AnalysisError,
    performance::{performance_score, MetricsSupplier},
    recommendations::RecommendationEngine,
    report::{EnergySummary, Report, ResourceFindings, REPORT_VERSION},
    scoring::{resource_size_breakdown, validate_metrics, DimensionScores},
    source::{PageSource, SizeResolver},
    static_rules::StaticAnalyzer,
    types::{Finding, PerformanceMetrics, Score},
};

#[derive(Clone)]
pub struct AnalyzeOptions {
    pub context: PageContext,
    /// Enables byte-size resolution of image references.
    pub size_resolver: Option<Arc<dyn SizeResolver>>,
    /// kg CO2e per kWh.
    pub carbon_intensity: f64,
}

impl Default for AnalyzeOptions {
    fn default() -> Self {
        Self {
            context: PageContext::default(),
            size_resolver: None,
            carbon_intensity: DEFAULT_CARBON_INTENSITY,
        }
    }
}

impl std::fmt::Debug for AnalyzeOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzeOptions")
            .field("context", &self.context)
            .field("size_resolver", &self.size_resolver.is_some())
            .field("carbon_intensity", &self.carbon_intensity)
            .finish()
    }
}

/// Fetches the page and its metrics from the given suppliers, then runs the pipeline.
///
/// When the caller left `opts.context` without a base URL and `target` parses
/// as a URL, the context is derived from it. An explicitly configured own host
/// is kept.
pub fn analyze_page(
    target: &str,
    source: &dyn PageSource,
    metrics: &dyn MetricsSupplier,
    mut opts: AnalyzeOptions,
) -> Result<Report, AnalysisError> {
    if opts.context.base_url.is_none() {
        if let Ok(url) = Url::parse(target) {
            let derived = PageContext::for_url(&url);
            opts.context = PageContext {
                base_url: derived.base_url,
                own_host: opts.context.own_host.or(derived.own_host),
            };
        }
    }

    log::info!("fetching page content for {target}");
    let page = source.fetch(target);
    if page.trim().is_empty() {
        return Err(AnalysisError::EmptyPage {
            target: target.to_string(),
        });
    }

    log::info!("collecting performance metrics for {target}");
    let metrics = metrics.collect(target);

    let mut report = run_analysis(&page, &metrics, &opts)?;
    report.target = Some(target.to_string());
    Ok(report)
}

/// Single pass over one page snapshot: analyze, score, consolidate, aggregate.
pub fn run_analysis(
    page: &str,
    metrics: &PerformanceMetrics,
    opts: &AnalyzeOptions,
) -> Result<Report, AnalysisError> {
    let target = opts.context.base_url.as_ref().map(Url::to_string);
    if page.trim().is_empty() {
        return Err(AnalysisError::EmptyPage {
            target: target.unwrap_or_else(|| "<inline page>".to_string()),
        });
    }
    let ctx = &opts.context;

    log::info!("running static pattern analysis");
    let static_analyzer = StaticAnalyzer::new();
    let static_findings = static_analyzer.analyze(page);

    log::info!("analyzing page resources");
    let script = ScriptAnalyzer::new();
    let style = StyleAnalyzer::new();
    let image = match &opts.size_resolver {
        Some(resolver) => ImageAnalyzer::with_resolver(Arc::clone(resolver)),
        None => ImageAnalyzer::new(),
    };
    let resources = ResourceFindings {
        script: script.analyze(page, ctx),
        style: style.analyze(page, ctx),
        image: image.analyze(page, ctx),
    };

    log::info!("estimating energy consumption");
    let estimator = EnergyEstimator::new();
    let breakdown = estimator.estimate_energy_consumption(metrics);
    let total_wh = breakdown.total();

    log::info!("generating recommendations");
    let engine = RecommendationEngine::new();
    let all_findings: Vec<Finding> = resources.all().cloned().collect();
    let mut recommendations = engine.generate_recommendations(metrics);
    recommendations.extend(engine.merge_resource_recommendations(&all_findings));
    let recommendations = engine.consolidate(recommendations);

    let scores = DimensionScores {
        static_analysis: static_analyzer.calculate_score(&static_findings),
        script: dimension_score(&script, &resources.script),
        style: dimension_score(&style, &resources.style),
        image: dimension_score(&image, &resources.image),
        performance: performance_score(metrics),
        energy: estimator.calculate_score(&breakdown),
        recommendation: engine.calculate_score(&recommendations),
    };
    let composite_score = scores.composite();

    let resource_breakdown = resource_size_breakdown(resources.groups());
    let warnings = validate_metrics(metrics, &resources.image);

    log::info!("composite score {composite_score}");
    Ok(Report {
        report_version: REPORT_VERSION.to_string(),
        target,
        composite_score,
        scores,
        metrics: metrics.clone(),
        energy: EnergySummary {
            breakdown,
            total_wh,
            carbon_grams: estimate_carbon_grams(total_wh, opts.carbon_intensity),
        },
        static_findings,
        resources,
        recommendations,
        resource_breakdown,
        warnings,
    })
}

fn dimension_score(analyzer: &dyn ResourceAnalyzer, findings: &[Finding]) -> Option<Score> {
    (!findings.is_empty()).then(|| analyzer.calculate_score(findings))
}
