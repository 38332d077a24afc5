// src/checker/dispatch.rs
// =============================================================================
// Turns the catalog into check tasks and runs them with bounded concurrency.
//
// Two phases:
// 1. plan_tasks: walk the catalog once, in order, producing one task per
//    resource. Tasks that need no network are settled right here:
//      - not an http(s) URL        -> invalid (cache untouched)
//      - fresh entry in the cache  -> cached result reused
//    Everything else is pending, routed to the page or the video probe.
// 2. Dispatcher::run: feed the finite list of pending tasks through at most
//    `concurrency` probes at a time, recording every outcome in the cache
//    as it arrives.
//
// All bookkeeping (cache writes, result pushes) happens in the single loop
// that drains the stream, so nothing needs a lock. Results come out in
// completion order, not catalog order.
// =============================================================================

use futures::stream::{self, StreamExt};
use tracing::{debug, info};

use super::classify::{is_video_url, normalize_url, valid_http_url};
use super::outcome::{CheckResult, Outcome};
use super::prober::Prober;
use crate::cache::{now_millis, CacheStore};
use crate::catalog::CatalogItem;

/// Baseline number of probes allowed in flight at once
pub const DEFAULT_CONCURRENCY: usize = 10;

/// Which probe a pending task goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Page,
    Video,
}

/// One resource waiting for a probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckTask {
    pub chapter: i64,
    pub pattern: String,
    pub kind: String,
    pub title: String,
    /// Normalized URL, also the cache key
    pub url: String,
    pub route: Route,
}

impl CheckTask {
    fn new(item: &CatalogItem, kind: &str, title: &str, url: String, route: Route) -> Self {
        CheckTask {
            chapter: item.chapter,
            pattern: item.pattern.clone(),
            kind: kind.to_string(),
            title: title.to_string(),
            url,
            route,
        }
    }

    /// Combines the task with the outcome it got into a report row.
    pub fn into_result(self, outcome: Outcome) -> CheckResult {
        let final_url = if outcome.final_url.is_empty() {
            self.url.clone()
        } else {
            outcome.final_url
        };

        CheckResult {
            chapter: self.chapter,
            pattern: self.pattern,
            kind: self.kind,
            title: self.title,
            url: self.url,
            status: outcome.status,
            code: outcome.code,
            final_url,
            reason: outcome.reason,
        }
    }
}

/// Output of the planning phase.
#[derive(Debug, Default)]
pub struct TaskPlan {
    /// Results known without probing (invalid URLs and cache hits)
    pub settled: Vec<CheckResult>,
    /// Tasks that still need a network probe, in catalog order
    pub pending: Vec<CheckTask>,
    pub cache_hits: usize,
}

impl TaskPlan {
    pub fn total(&self) -> usize {
        self.settled.len() + self.pending.len()
    }
}

/// Builds the complete task list before any probing starts.
///
/// The cache must already be purged; whatever `lookup` returns is reused.
pub fn plan_tasks(items: &[CatalogItem], cache: &CacheStore) -> TaskPlan {
    let mut plan = TaskPlan::default();

    // Catalog order: chapter by chapter, resources in the order listed
    for item in items {
        for resource in &item.resources {
            // Trimmed URL, used both for probing and as the cache key
            let url = normalize_url(&resource.url);

            // Not http(s): settle now, no network and no cache entry
            if !valid_http_url(&url) {
                debug!(url = %url, chapter = item.chapter, "invalid URL");
                let task = CheckTask::new(item, &resource.kind, &resource.title, url, Route::Page);
                let outcome = Outcome::invalid(&task.url);
                plan.settled.push(task.into_result(outcome));
                continue;
            }

            // Video-host links always go through oEmbed, whatever the
            // resource claims to be
            let route = if is_video_url(&url) {
                Route::Video
            } else {
                Route::Page
            };

            // Clone the outcome out so the task can take ownership of `url`
            let cached = cache.lookup(&url).map(|entry| entry.outcome.clone());
            let task = CheckTask::new(item, &resource.kind, &resource.title, url, route);

            // Fresh cache entry: reuse it. Otherwise queue a probe.
            match cached {
                Some(outcome) => {
                    plan.cache_hits += 1;
                    plan.settled.push(task.into_result(outcome));
                }
                None => plan.pending.push(task),
            }
        }
    }

    plan
}

/// Runs pending tasks through a prober with a fixed concurrency limit.
pub struct Dispatcher<'p, P: Prober + ?Sized> {
    prober: &'p P,
    concurrency: usize,
}

impl<'p, P: Prober + ?Sized> Dispatcher<'p, P> {
    pub fn new(prober: &'p P, concurrency: usize) -> Self {
        Dispatcher {
            prober,
            concurrency: concurrency.max(1),
        }
    }

    /// Probes every task exactly once.
    ///
    /// Each outcome is written to `cache` as soon as it arrives. The returned
    /// results are in completion order.
    pub async fn run(&self, tasks: Vec<CheckTask>, cache: &mut CacheStore) -> Vec<CheckResult> {
        if tasks.is_empty() {
            return Vec::new();
        }

        info!(
            tasks = tasks.len(),
            concurrency = self.concurrency,
            "probing links"
        );

        // Copy the reference out of self so each probe future only borrows
        // the prober, not the whole dispatcher
        let prober = self.prober;
        let mut results = Vec::with_capacity(tasks.len());

        // buffer_unordered keeps at most `concurrency` probes in flight and
        // pulls the next task only when one finishes
        let mut completed = stream::iter(tasks)
            .map(|task| async move {
                let outcome = match task.route {
                    Route::Page => prober.probe_page(&task.url).await,
                    Route::Video => prober.probe_video(&task.url).await,
                };
                (task, outcome)
            })
            .buffer_unordered(self.concurrency);

        // Drain outcomes as they finish. This loop is the only place that
        // touches the cache and the results, one outcome at a time.
        while let Some((task, outcome)) = completed.next().await {
            debug!(url = %task.url, status = %outcome.status, code = outcome.code, "checked");
            cache.record(&task.url, outcome.clone(), now_millis());
            results.push(task.into_result(outcome));
        }

        results
    }
}

/// Plans and runs a full check of `items`.
///
/// Settled results come first, followed by probed results in completion
/// order. Exactly one result per resource.
pub async fn check_catalog<P: Prober + ?Sized>(
    items: &[CatalogItem],
    cache: &mut CacheStore,
    prober: &P,
    concurrency: usize,
) -> Vec<CheckResult> {
    let plan = plan_tasks(items, cache);
    info!(
        resources = plan.total(),
        cached = plan.cache_hits,
        pending = plan.pending.len(),
        "tasks planned"
    );

    // Settled results first, then whatever the probes produce
    let mut results = plan.settled;
    let probed = Dispatcher::new(prober, concurrency).run(plan.pending, cache).await;
    results.extend(probed);
    results
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why buffer_unordered instead of spawning a task per link?
//    - It never has more than `concurrency` futures alive at once
//    - The futures run inside the loop that polls them, so they can borrow
//      the prober instead of needing Arc and 'static
//    - Outcomes come back one at a time to a single owner, which is why the
//      cache can be a plain `&mut CacheStore` with no Mutex
//
// 2. Why plan everything up front?
//    - The task list is finite and known before the first request
//    - Invalid URLs and cache hits never take a concurrency slot
//
// 3. Ordering
//    - `stream::iter` hands tasks out in catalog order
//    - Results arrive in whatever order the network finishes them
// -----------------------------------------------------------------------------
