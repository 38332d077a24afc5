// src/config.rs
// =============================================================================
// Resolved settings for one run.
//
// Every value has a default, so running with no flags at all checks
// grammar.json with 10 workers, a 10 second timeout and a 24 hour cache.
// The CLI (and the environment variables behind it) only override them.
// =============================================================================

use std::path::PathBuf;
use std::time::Duration;

use crate::checker::{DEFAULT_CONCURRENCY, DEFAULT_OEMBED_ENDPOINT};
use crate::cli::Cli;

pub const DEFAULT_CATALOG_PATH: &str = "grammar.json";
pub const DEFAULT_REPORT_PATH: &str = "content/report-broken-links.json";
pub const DEFAULT_CACHE_PATH: &str = ".cache/link-status.json";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CACHE_TTL_HOURS: u64 = 24;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub catalog_path: PathBuf,
    pub report_path: PathBuf,
    /// None when caching is switched off
    pub cache_path: Option<PathBuf>,
    pub concurrency: usize,
    pub timeout: Duration,
    pub cache_ttl: Duration,
    pub oembed_endpoint: String,
    pub sort_results: bool,
    pub json_summary: bool,
    pub fail_on_broken: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            catalog_path: PathBuf::from(DEFAULT_CATALOG_PATH),
            report_path: PathBuf::from(DEFAULT_REPORT_PATH),
            cache_path: Some(PathBuf::from(DEFAULT_CACHE_PATH)),
            concurrency: DEFAULT_CONCURRENCY,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_HOURS * 60 * 60),
            oembed_endpoint: DEFAULT_OEMBED_ENDPOINT.to_string(),
            sort_results: false,
            json_summary: false,
            fail_on_broken: false,
        }
    }
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Settings {
            catalog_path: cli.catalog.clone(),
            report_path: cli.report.clone(),
            cache_path: if cli.no_cache {
                None
            } else {
                Some(cli.cache.clone())
            },
            // A limit of 0 would never start anything
            concurrency: cli.concurrency.max(1),
            timeout: Duration::from_secs(cli.timeout_secs.max(1)),
            cache_ttl: Duration::from_secs(cli.cache_ttl_hours.saturating_mul(60 * 60)),
            oembed_endpoint: cli.oembed_endpoint.clone(),
            sort_results: cli.sort,
            json_summary: cli.json,
            fail_on_broken: cli.fail_on_broken,
        }
    }
}
