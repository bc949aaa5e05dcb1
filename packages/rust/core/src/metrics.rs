//! Best-effort metric extraction from accumulated notebook text.
//!
//! Each metric has one pattern; the first match anywhere in the text wins.
//! Nothing is aggregated or validated.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use nbsteps_shared::Metrics;

/// A value in `[0, 1]` with 2-4 decimals, or a two-digit percentage.
const RATIO_OR_PERCENT: &str = r"([0-1]?\.\d{2,4}|[1-9]\d(?:\.\d{1,2})?%)";

static METRIC_PATTERNS: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("auc", r"(?:AUC|roc[_\s-]*auc)[^\d]*([0-1]\.\d{2,4})".to_string()),
        ("accuracy", format!(r"(?:accuracy|acc\b)[^\d]*{RATIO_OR_PERCENT}")),
        ("logloss", r"(?:log[-\s]*loss|binary[-\s]*logloss)[^\d]*([0-9]\.\d{2,4})".to_string()),
        ("precision", format!(r"(?:precision)[^\d]*{RATIO_OR_PERCENT}")),
        ("recall", format!(r"(?:recall)[^\d]*{RATIO_OR_PERCENT}")),
        ("brier", r"(?:brier)[^\d]*([0-9]\.\d{2,4})".to_string()),
    ]
    .into_iter()
    .map(|(key, pattern)| {
        let re = Regex::new(&format!("(?i){pattern}")).expect("valid regex");
        (key, re)
    })
    .collect()
});

/// Scan `text` for the known metrics. Keys without a match stay `None`.
pub fn extract_metrics(text: &str) -> Metrics {
    let mut metrics = Metrics::default();
    for (key, re) in METRIC_PATTERNS.iter() {
        if let Some(value) = re.captures(text).and_then(|c| c.get(1)) {
            metrics.set(key, value.as_str());
        }
    }
    debug!(found = ?metrics.found(), "metrics extracted");
    metrics
}
