// src/cli.rs
// =============================================================================
// Command-line interface, defined with clap's derive API.
//
// The tool has a single job, so there are no subcommands and no required
// arguments: `resource-sentinel` on its own runs a full check with defaults.
// Each flag can also be set through the environment variable named next to
// it (handy in CI, where the command line is fixed in a workflow file).
// =============================================================================

use clap::{ArgAction, Parser};
use std::path::PathBuf;

use crate::config::{
    DEFAULT_CACHE_PATH, DEFAULT_CACHE_TTL_HOURS, DEFAULT_CATALOG_PATH, DEFAULT_REPORT_PATH,
    DEFAULT_TIMEOUT_SECS,
};

#[derive(Parser, Debug)]
#[command(
    name = "resource-sentinel",
    version,
    about = "Checks every resource link in a content catalog and reports the broken ones",
    long_about = "resource-sentinel reads the catalog, probes every linked article and video \
                  (videos through oEmbed), caches results for a day and writes a JSON report \
                  listing everything that is broken, timed out, unreachable or malformed."
)]
pub struct Cli {
    /// Catalog document to check (a JSON array of items, or {"items": [...]})
    #[arg(long, env = "SENTINEL_CATALOG", default_value = DEFAULT_CATALOG_PATH)]
    pub catalog: PathBuf,

    /// Where the report is written (overwritten on every run)
    #[arg(long, env = "SENTINEL_REPORT", default_value = DEFAULT_REPORT_PATH)]
    pub report: PathBuf,

    /// Cache of previous results, keyed by URL
    #[arg(long, env = "SENTINEL_CACHE", default_value = DEFAULT_CACHE_PATH)]
    pub cache: PathBuf,

    /// Maximum number of links checked at the same time
    #[arg(long, env = "SENTINEL_CONCURRENCY", default_value_t = crate::checker::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Seconds before a single request counts as timed out
    #[arg(long, env = "SENTINEL_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Hours a cached result stays valid
    #[arg(long, env = "SENTINEL_CACHE_TTL_HOURS", default_value_t = DEFAULT_CACHE_TTL_HOURS)]
    pub cache_ttl_hours: u64,

    /// oEmbed endpoint used to confirm that videos exist
    #[arg(long, env = "SENTINEL_OEMBED_ENDPOINT", default_value = crate::checker::DEFAULT_OEMBED_ENDPOINT)]
    pub oembed_endpoint: String,

    /// Ignore the cache file entirely (neither read nor written)
    #[arg(long)]
    pub no_cache: bool,

    /// Sort report entries by chapter, pattern and URL instead of completion order
    #[arg(long)]
    pub sort: bool,

    /// Print the console summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Exit with code 1 when any link needs attention
    #[arg(long)]
    pub fail_on_broken: bool,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
