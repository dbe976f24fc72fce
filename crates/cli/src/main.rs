mod http;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use webeco_core::analyzers::PageContext;
use webeco_core::config::Config;
use webeco_core::energy::DEFAULT_CARBON_INTENSITY;
use webeco_core::report::Report;
use webeco_core::source::{FilePageSource, PageSource, SizeResolver};
use webeco_core::types::{Impact, Score};
use webeco_core::{analyze_page, AnalyzeOptions};

use crate::http::{HttpPageSource, HttpSizeResolver};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Parser, Debug)]
#[command(
    name = "webeco",
    version,
    about = "Web page energy-efficiency analyzer (estimated)"
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Analyze {
        /// Page URL. Used as the base for relative references when --file is given.
        target: String,

        /// Read page text from this file instead of fetching TARGET.
        #[arg(long)]
        file: Option<PathBuf>,

        /// Host treated as first-party.
        #[arg(long)]
        own_host: Option<String>,

        /// Skip byte-size lookups for image references.
        #[arg(long)]
        no_image_sizes: bool,

        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
    Markdown,
}

struct Style {
    bold: &'static str,
    dim: &'static str,
    red: &'static str,
    green: &'static str,
    yellow: &'static str,
    reset: &'static str,
}

const COLOR: Style = Style {
    bold: "\x1b[1m",
    dim: "\x1b[2m",
    red: "\x1b[31m",
    green: "\x1b[32m",
    yellow: "\x1b[33m",
    reset: "\x1b[0m",
};

const PLAIN: Style = Style {
    bold: "",
    dim: "",
    red: "",
    green: "",
    yellow: "",
    reset: "",
};

fn style() -> &'static Style {
    if std::env::var_os("NO_COLOR").is_some() {
        &PLAIN
    } else {
        &COLOR
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let res = match cli.cmd {
        Commands::Analyze {
            target,
            file,
            own_host,
            no_image_sizes,
            config,
            format,
        } => {
            let cfg = load_config(config.as_deref());
            run_analyze(&target, file.as_deref(), own_host, no_image_sizes, &cfg, &format)
        }
    };

    match res {
        Ok(code) => code,
        Err(e) => {
            let s = style();
            eprintln!(
                "{}{red}error:{reset} {:#}",
                s.bold,
                e,
                red = s.red,
                reset = s.reset
            );
            std::process::ExitCode::from(1)
        }
    }
}

fn print_banner() {
    let s = style();
    eprintln!(
        "\n  {bold}web{reset}{green}eco{reset}  {dim}page energy-efficiency analysis{reset}\n",
        bold = s.bold,
        green = s.green,
        dim = s.dim,
        reset = s.reset,
    );
}

fn score_color(score: Score) -> &'static str {
    let s = style();
    if score >= 80 {
        s.green
    } else if score >= 50 {
        s.yellow
    } else {
        s.red
    }
}

fn impact_color(impact: &Impact) -> &'static str {
    let s = style();
    match impact {
        Impact::High => s.red,
        Impact::Medium => s.yellow,
        Impact::Low => s.dim,
    }
}

fn print_score_line(label: &str, score: Option<Score>) {
    let s = style();
    match score {
        Some(v) => eprintln!(
            "  {dim}{:<15}{reset}{sc}{bold}{}{reset}",
            label,
            v,
            dim = s.dim,
            sc = score_color(v),
            bold = s.bold,
            reset = s.reset
        ),
        None => eprintln!(
            "  {dim}{:<15}n/a{reset}",
            label,
            dim = s.dim,
            reset = s.reset
        ),
    }
}

fn print_report(report: &Report) {
    let s = style();

    print_score_line("static", Some(report.scores.static_analysis));
    print_score_line("script", report.scores.script);
    print_score_line("style", report.scores.style);
    print_score_line("image", report.scores.image);
    print_score_line("performance", Some(report.scores.performance));
    print_score_line("energy", Some(report.scores.energy));
    print_score_line("recommendation", Some(report.scores.recommendation));
    eprintln!();
    eprintln!(
        "  {dim}energy         {reset}{bold}{:.4} Wh{reset}  {dim}({:.2} g CO2e){reset}",
        report.energy.total_wh,
        report.energy.carbon_grams,
        dim = s.dim,
        bold = s.bold,
        reset = s.reset
    );

    if !report.static_findings.is_empty() {
        eprintln!();
        for msg in &report.static_findings {
            eprintln!("  {dim}\u{2022}{reset} {}", msg, dim = s.dim, reset = s.reset);
        }
    }

    if !report.recommendations.is_empty() {
        eprintln!();
        for r in &report.recommendations {
            eprintln!(
                "  {ic}{:<6}{reset}  {}",
                r.impact.to_string(),
                r.message,
                ic = impact_color(&r.impact),
                reset = s.reset
            );
        }
    }

    for w in &report.warnings {
        eprintln!(
            "  {yellow}warning:{reset} {}",
            w,
            yellow = s.yellow,
            reset = s.reset
        );
    }

    eprintln!();
    let sc = score_color(report.composite_score);
    eprintln!(
        "  {sc}{bold}COMPOSITE {}{reset}",
        report.composite_score,
        sc = sc,
        bold = s.bold,
        reset = s.reset
    );
    eprintln!();
}

fn load_config(path: Option<&Path>) -> Config {
    match path {
        Some(p) => Config::load(p).unwrap_or_else(|e| {
            eprintln!(
                "{}{}warning:{} failed to load config {}: {:#}",
                style().bold,
                style().yellow,
                style().reset,
                p.display(),
                e
            );
            Config::default()
        }),
        None => Config::discover().unwrap_or_default(),
    }
}

fn build_options(
    own_host: Option<String>,
    no_image_sizes: bool,
    cfg: &Config,
    client: &reqwest::blocking::Client,
) -> AnalyzeOptions {
    let resolve_sizes = !no_image_sizes && cfg.resolve_image_sizes.unwrap_or(true);
    AnalyzeOptions {
        context: PageContext {
            base_url: None,
            own_host: own_host.or_else(|| cfg.own_host.clone()),
        },
        size_resolver: resolve_sizes.then(|| {
            Arc::new(HttpSizeResolver::new(client.clone())) as Arc<dyn SizeResolver>
        }),
        carbon_intensity: cfg.carbon_intensity.unwrap_or(DEFAULT_CARBON_INTENSITY),
    }
}

fn run_analyze(
    target: &str,
    file: Option<&Path>,
    own_host: Option<String>,
    no_image_sizes: bool,
    cfg: &Config,
    format: &OutputFormat,
) -> anyhow::Result<std::process::ExitCode> {
    let timeout = Duration::from_secs(cfg.http_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS));
    let client = http::client(timeout)?;

    let source: Box<dyn PageSource> = match file {
        Some(path) => Box::new(FilePageSource::new(path)),
        None => Box::new(HttpPageSource::new(client.clone())),
    };
    let opts = build_options(own_host, no_image_sizes, cfg, &client);

    let report = analyze_page(target, source.as_ref(), &cfg.metrics, opts)
        .with_context(|| format!("analyze {target}"))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report).context("serialize report json")?;
            println!("{json}");
        }
        OutputFormat::Markdown => {
            print!("{}", report.to_markdown());
        }
        OutputFormat::Text => {
            print_banner();
            print_report(&report);
            // Machine-parseable line on stdout
            println!("composite_score={}", report.composite_score);
        }
    }

    Ok(std::process::ExitCode::from(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn score_color_thresholds() {
        assert_eq!(score_color(95), style().green);
        assert_eq!(score_color(60), style().yellow);
        assert_eq!(score_color(10), style().red);
    }

    #[test]
    fn impact_color_thresholds() {
        assert_eq!(impact_color(&Impact::High), style().red);
        assert_eq!(impact_color(&Impact::Medium), style().yellow);
        assert_eq!(impact_color(&Impact::Low), style().dim);
    }

    #[test]
    #[serial]
    fn style_respects_no_color() {
        std::env::set_var("NO_COLOR", "1");
        assert_eq!(style().bold, "");
        std::env::remove_var("NO_COLOR");
        assert_ne!(style().bold, "");
    }

    #[test]
    fn cli_flags_override_config() {
        let cfg = Config {
            own_host: Some("config.example".to_string()),
            resolve_image_sizes: Some(true),
            carbon_intensity: Some(0.2),
            ..Config::default()
        };
        let client = http::client(Duration::from_secs(1)).unwrap();
        let opts = build_options(Some("cli.example".to_string()), true, &cfg, &client);
        assert_eq!(opts.context.own_host.as_deref(), Some("cli.example"));
        assert!(opts.size_resolver.is_none());
        assert_eq!(opts.carbon_intensity, 0.2);
    }

    #[test]
    fn config_fills_unset_flags() {
        let cfg = Config {
            own_host: Some("config.example".to_string()),
            resolve_image_sizes: Some(false),
            ..Config::default()
        };
        let client = http::client(Duration::from_secs(1)).unwrap();
        let opts = build_options(None, false, &cfg, &client);
        assert_eq!(opts.context.own_host.as_deref(), Some("config.example"));
        assert!(opts.size_resolver.is_none());
        assert_eq!(opts.carbon_intensity, DEFAULT_CARBON_INTENSITY);
    }
}
