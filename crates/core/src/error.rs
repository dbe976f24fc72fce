use thiserror::Error;

/// Failures that abort a pipeline run. Everything else degrades locally.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no page content to analyze for {target}")]
    EmptyPage { target: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}
