// src/main.rs
// =============================================================================
// Entry point: check every resource link in the catalog.
//
// One run:
// 1. Parse flags (all optional) and set up logging
// 2. Load the catalog (the only fatal failure: missing or malformed)
// 3. Load the cache and drop entries past their TTL
// 4. Settle invalid URLs and cache hits, probe the rest with bounded concurrency
// 5. Write the report and the updated cache, print a summary
//
// Exit codes: 0 = run completed, 1 = broken links found (only with
// --fail-on-broken), 2 = fatal error.
// =============================================================================

mod cache;
mod catalog;
mod checker;
mod cli;
mod config;
mod error;
mod logging;
mod report;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use cache::{now_millis, CacheStore};
use checker::HttpProber;
use cli::Cli;
use config::Settings;
use report::Report;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let settings = Settings::from(&cli);
    let report = check(&settings).await?;

    report::print_summary(&report, &settings.report_path, settings.json_summary)?;

    if settings.fail_on_broken && report.totals.broken > 0 {
        Ok(1)
    } else {
        Ok(0)
    }
}

// Runs a full check and persists both artifacts. Nothing is written unless
// every task has finished.
async fn check(settings: &Settings) -> Result<Report> {
    let items = catalog::load_catalog(&settings.catalog_path)?;

    let mut cache = match &settings.cache_path {
        Some(path) => CacheStore::load(path, settings.cache_ttl),
        None => CacheStore::in_memory(settings.cache_ttl),
    };
    let purged = cache.purge_expired(now_millis());
    if cache.is_empty() {
        info!(purged, "starting with an empty cache");
    } else {
        info!(fresh = cache.len(), purged, "cache ready");
    }

    let prober = HttpProber::new(settings.timeout, settings.oembed_endpoint.clone())
        .context("setting up the HTTP client")?;

    let results = checker::check_catalog(&items, &mut cache, &prober, settings.concurrency).await;

    let mut report = Report::build(results, chrono::Utc::now());
    if settings.sort_results {
        report.sort();
    }

    report.write(&settings.report_path)?;
    cache.persist()?;
    info!(path = %settings.report_path.display(), "report written");

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use checker::StatusKind;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings_in(dir: &std::path::Path, server: &MockServer) -> Settings {
        Settings {
            catalog_path: dir.join("grammar.json"),
            report_path: dir.join("content").join("report-broken-links.json"),
            cache_path: Some(dir.join(".cache").join("link-status.json")),
            timeout: Duration::from_secs(5),
            oembed_endpoint: format!("{}/oembed", server.uri()),
            sort_results: true,
            ..Settings::default()
        }
    }

    #[tokio::test]
    async fn test_full_run_writes_report_and_cache() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(path("/x"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/oembed"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), &server);
        let catalog = serde_json::json!({
            "items": [
                {"chapter": 1, "pattern": "-아요", "resources": [
                    {"type": "article", "url": format!("{}/page", server.uri()), "title": "Good"},
                    {"type": "video", "url": "https://youtu.be/abc123", "title": "Video"}
                ]},
                {"chapter": 2, "pattern": "-고", "resources": [
                    {"type": "article", "url": format!("{}/x", server.uri()), "title": "Dead"},
                    {"type": "article", "url": "not-a-url", "title": "Typo"}
                ]}
            ]
        });
        std::fs::write(&settings.catalog_path, catalog.to_string()).unwrap();

        let report = check(&settings).await.unwrap();

        assert_eq!(report.totals.all, 4);
        assert_eq!(report.totals.broken, 2);
        assert_eq!(report.count(StatusKind::Ok), 2);
        assert_eq!(report.count(StatusKind::Broken), 1);
        assert_eq!(report.count(StatusKind::Invalid), 1);

        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&settings.report_path).unwrap()).unwrap();
        assert_eq!(written["totals"]["broken"], 2);

        // Invalid URLs never reach the cache
        let cache_path = settings.cache_path.as_ref().unwrap();
        let cached: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(cache_path).unwrap()).unwrap();
        assert_eq!(cached.as_object().unwrap().len(), 3);
        assert!(cached.get("not-a-url").is_none());
        assert_eq!(cached["https://youtu.be/abc123"]["reason"], "oembed-ok");
    }

    #[tokio::test]
    async fn test_second_run_uses_cache() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), &server);
        let catalog = serde_json::json!([
            {"chapter": 1, "pattern": "-아요", "resources": [
                {"type": "article", "url": format!("{}/page", server.uri())}
            ]}
        ]);
        std::fs::write(&settings.catalog_path, catalog.to_string()).unwrap();

        let first = check(&settings).await.unwrap();
        let second = check(&settings).await.unwrap();

        assert_eq!(first.results, second.results);
    }

    #[tokio::test]
    async fn test_malformed_catalog_is_fatal_and_writes_nothing() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), &server);
        std::fs::write(&settings.catalog_path, "{ this is not json").unwrap();

        assert!(check(&settings).await.is_err());
        assert!(!settings.report_path.exists());
    }

    #[tokio::test]
    async fn test_missing_catalog_is_fatal() {
        let server = MockServer::start().await;
        let dir = tempfile::tempdir().unwrap();
        let settings = settings_in(dir.path(), &server);

        let err = check(&settings).await.unwrap_err();
        assert!(err.to_string().contains("grammar.json"));
    }
}
