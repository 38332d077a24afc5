// src/report.rs
// =============================================================================
// Builds the broken-links report, writes it, and prints the console summary.
//
// The report is generated once per run, after every check has finished, and
// replaces any previous report file. Shape:
//   {
//     "generatedAt": "2024-05-01T12:00:00Z",
//     "summary": { "ok": 7, "broken": 1, ... },   // only statuses that occurred
//     "totals": { "all": 10, "broken": 3 },
//     "results": [ ...every CheckResult... ],
//     "broken":  [ ...results with broken/timeout/error/invalid... ]
//   }
//
// Reading `reason` in the report:
//   "HTTP 404"            page answered with a failing status
//   "request timed out"   page did not answer within the timeout
//   "oembed-error"        video host says the video is gone or private
//   "oembed-timeout"      video lookup did not answer in time
//   "oembed-unreachable"  video lookup endpoint could not be reached at all;
//                         status is `error`, not `timeout`, and code is 0
//   ""                    ok, redirected and invalid results carry no reason
// =============================================================================

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::cache::write_file;
use crate::checker::{CheckResult, StatusKind};
use crate::error::SentinelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub all: usize,
    pub broken: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub generated_at: DateTime<Utc>,
    pub summary: BTreeMap<StatusKind, usize>,
    pub totals: Totals,
    pub results: Vec<CheckResult>,
    pub broken: Vec<CheckResult>,
}

impl Report {
    /// Tallies `results` into a report. The `broken` list keeps the order of
    /// `results`.
    pub fn build(results: Vec<CheckResult>, generated_at: DateTime<Utc>) -> Self {
        let mut summary = BTreeMap::new();
        for result in &results {
            *summary.entry(result.status).or_insert(0) += 1;
        }

        let broken: Vec<CheckResult> = results
            .iter()
            .filter(|r| r.status.is_failure())
            .cloned()
            .collect();

        Report {
            generated_at,
            summary,
            totals: Totals {
                all: results.len(),
                broken: broken.len(),
            },
            results,
            broken,
        }
    }

    /// Orders `results` and `broken` by chapter, pattern, then URL.
    ///
    /// Completion order depends on network timing, so this is the way to get
    /// byte-stable reports between runs.
    pub fn sort(&mut self) {
        fn key(r: &CheckResult) -> (i64, &str, &str) {
            (r.chapter, r.pattern.as_str(), r.url.as_str())
        }
        self.results.sort_by(|a, b| key(a).cmp(&key(b)));
        self.broken.sort_by(|a, b| key(a).cmp(&key(b)));
    }

    pub fn count(&self, status: StatusKind) -> usize {
        self.summary.get(&status).copied().unwrap_or(0)
    }

    /// Writes the report as pretty JSON, overwriting any previous file.
    pub fn write(&self, path: &Path) -> Result<(), SentinelError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|source| SentinelError::Serialize { what: "report", source })?;
        write_file(path, &json)
    }

    /// The short machine-readable summary printed with `--json`.
    pub fn console_json(&self, report_path: &Path) -> serde_json::Value {
        serde_json::json!({
            "report": report_path.display().to_string(),
            "all": self.totals.all,
            "broken": self.totals.broken,
            "summary": self.summary,
        })
    }
}

/// Prints the summary either as JSON or as a small table.
pub fn print_summary(report: &Report, report_path: &Path, json: bool) -> Result<(), SentinelError> {
    if json {
        let output = serde_json::to_string_pretty(&report.console_json(report_path))
            .map_err(|source| SentinelError::Serialize { what: "summary", source })?;
        println!("{}", output);
    } else {
        print_table(report, report_path);
    }
    Ok(())
}

fn print_table(report: &Report, report_path: &Path) {
    if !report.broken.is_empty() {
        println!("{:<60} {:<15} {:<30}", "URL", "STATUS", "DETAIL");
        println!("{}", "=".repeat(105));

        for result in &report.broken {
            // Truncate on a char boundary, catalog URLs are often non-ASCII
            let url_display = if result.url.chars().count() > 57 {
                format!("{}...", result.url.chars().take(57).collect::<String>())
            } else {
                result.url.clone()
            };
            let detail = if result.reason.is_empty() {
                format!("ch.{} {}", result.chapter, result.pattern)
            } else {
                result.reason.clone()
            };

            println!("{:<60} {:<15} {:<30}", url_display, format_status(result.status), detail);
        }
        println!();
    }

    println!("📊 Summary:");
    for status in StatusKind::ALL {
        let count = report.count(status);
        if count > 0 {
            println!("   {:<15} {}", format_status(status), count);
        }
    }
    println!("   📋 Total: {}", report.totals.all);
    println!("   ❌ Needs attention: {}", report.totals.broken);
    println!("   📄 Report: {}", report_path.display());
}

fn format_status(status: StatusKind) -> &'static str {
    match status {
        StatusKind::Ok => "✅ OK",
        StatusKind::Redirected => "🔀 REDIRECTED",
        StatusKind::Broken => "❌ BROKEN",
        StatusKind::Timeout => "⏱️  TIMEOUT",
        StatusKind::Error => "⚠️  ERROR",
        StatusKind::Invalid => "🚫 INVALID",
    }
}
