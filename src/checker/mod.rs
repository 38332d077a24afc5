// src/checker/mod.rs
// =============================================================================
// Everything involved in checking links.
//
// Submodules:
// - outcome: StatusKind, Outcome and CheckResult
// - classify: URL normalization, validation and video-host detection
// - http: HEAD/GET probe for ordinary pages
// - video: oEmbed probe for video links
// - prober: the Prober trait and its reqwest-backed implementation
// - dispatch: task planning and the bounded-concurrency run
// =============================================================================

mod classify;
mod dispatch;
mod http;
mod outcome;
mod prober;
mod video;

pub use dispatch::{check_catalog, DEFAULT_CONCURRENCY};
pub use outcome::{CheckResult, Outcome, StatusKind};
pub use prober::HttpProber;
pub use video::DEFAULT_OEMBED_ENDPOINT;
