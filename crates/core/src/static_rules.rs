//! Text-level scan for energy-inefficient coding patterns.
//!
//! Unlike the resource analyzers this one reports plain messages. Each entry
//! of [`RULES`] either bounds a numeric timer argument or counts raw pattern
//! occurrences; two standalone checks cover animation density and heavyweight
//! front-end libraries.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{clamp_score, Score};

/// Reported for empty or whitespace-only input.
pub const NO_CODE_MESSAGE: &str = "No code to analyze";

/// Animation keyword occurrences above this are flagged.
const ANIMATION_MIN: usize = 5;

#[derive(Debug, Clone, Copy)]
enum Bound {
    /// Flag arguments strictly below the bound ("too frequent").
    Below(u64),
    /// Flag arguments strictly above the bound ("too long").
    Above(u64),
}

impl Bound {
    fn violated_by(&self, value: u64) -> bool {
        match *self {
            Bound::Below(min) => value < min,
            Bound::Above(max) => value > max,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum RuleKind {
    /// Capture group 1 is a millisecond argument checked against the bound.
    Interval(Bound),
    /// Any occurrence is flagged and the count appended.
    Count,
}

#[derive(Debug, Clone, Copy)]
struct RuleSpec {
    pattern: &'static str,
    kind: RuleKind,
    message: &'static str,
}

const RULES: &[RuleSpec] = &[
    RuleSpec {
        pattern: r"setInterval\s*\(\s*[^,]*,\s*([0-9]+)\s*\)",
        kind: RuleKind::Interval(Bound::Below(1000)),
        message: "Using too frequent setInterval (interval less than 1000ms)",
    },
    RuleSpec {
        pattern: r"setTimeout\s*\(\s*[^,]*,\s*([0-9]+)\s*\)",
        kind: RuleKind::Interval(Bound::Above(10_000)),
        message: "Using long-duration setTimeout (may cause memory leak)",
    },
    RuleSpec {
        pattern: r"for\s*\(\s*let\s+\w+\s*=\s*0\s*;\s*\w+\s*<\s*\d+\s*;\s*\w+\+\+\s*\)",
        kind: RuleKind::Count,
        message: "Detected potentially inefficient loop",
    },
    RuleSpec {
        pattern: r#"<img[^>]+src\s*=\s*['"][^'"]+['"][^>]*>"#,
        kind: RuleKind::Count,
        message: "Found unoptimized images (missing size attributes)",
    },
    RuleSpec {
        pattern: r"document\.write\(",
        kind: RuleKind::Count,
        message: "Using document.write (blocks page rendering)",
    },
    RuleSpec {
        pattern: r#"style\s*=\s*['"][^'"]*['"][^>]*"#,
        kind: RuleKind::Count,
        message: "Using inline styles (increases HTML size)",
    },
];

/// Deduction applied once per message containing the keyword.
const DEDUCTIONS: &[(&str, i64)] = &[
    ("setInterval", 10),
    ("setTimeout", 5),
    ("inefficient loop", 5),
    ("unoptimized images", 10),
    ("document.write", 10),
    ("inline styles", 5),
    ("CSS animations", 5),
    ("JavaScript libraries", 10),
];

static COMPILED: Lazy<Vec<(Regex, RuleSpec)>> = Lazy::new(|| {
    RULES
        .iter()
        .map(|spec| (Regex::new(spec.pattern).expect("valid regex"), *spec))
        .collect()
});

static RE_ANIMATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"@keyframes\s+\w+|animation\s*:|transition\s*:").expect("valid regex")
});

static RE_LIBRARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)jquery|react|angular|vue|gsap|three\.js").expect("valid regex"));

#[derive(Debug, Clone, Copy, Default)]
pub struct StaticAnalyzer;

impl StaticAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, code: &str) -> Vec<String> {
        if code.trim().is_empty() {
            return vec![NO_CODE_MESSAGE.to_string()];
        }

        let mut messages = Vec::new();
        for (re, spec) in COMPILED.iter() {
            match spec.kind {
                RuleKind::Interval(bound) => {
                    for cap in re.captures_iter(code) {
                        let Some(digits) = cap.get(1).map(|m| m.as_str()) else {
                            continue;
                        };
                        // Overflowing arguments saturate.
                        let ms = digits.parse::<u64>().unwrap_or(u64::MAX);
                        if bound.violated_by(ms) {
                            messages.push(format!("{}, time interval: {digits}ms", spec.message));
                        }
                    }
                }
                RuleKind::Count => {
                    let found = re.find_iter(code).count();
                    if found > 0 {
                        messages.push(format!("{}, found {found} instances", spec.message));
                    }
                }
            }
        }

        let animations = RE_ANIMATION.find_iter(code).count();
        if animations > ANIMATION_MIN {
            messages.push(format!(
                "Too many CSS animations or transitions ({animations} instances), may increase CPU load"
            ));
        }

        let libraries = detect_libraries(code);
        if !libraries.is_empty() {
            messages.push(format!(
                "Using large JavaScript libraries: {}",
                libraries.join(", ")
            ));
        }

        log::debug!("static analysis produced {} messages", messages.len());
        messages
    }

    pub fn calculate_score(&self, messages: &[String]) -> Score {
        let deducted: i64 = messages
            .iter()
            .map(|msg| {
                DEDUCTIONS
                    .iter()
                    .filter(|(keyword, _)| msg.contains(keyword))
                    .map(|(_, points)| points)
                    .sum::<i64>()
            })
            .sum();
        clamp_score(100 - deducted)
    }
}

/// Lowercased library names in first-seen order, without duplicates.
fn detect_libraries(code: &str) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for m in RE_LIBRARY.find_iter(code) {
        let name = m.as_str().to_ascii_lowercase();
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}
