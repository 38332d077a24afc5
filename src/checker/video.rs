// src/checker/video.rs
// =============================================================================
// Video probe: checks a video link through the host's oEmbed endpoint.
//
// Fetching a video page directly says little about whether the video exists
// (consent pages, bot walls and "video unavailable" pages all answer 200).
// The oEmbed endpoint only answers 2xx for videos that are really there, so
// video links are checked exclusively through it, never with a plain GET.
//
// Outcomes, all reported against the canonical watch URL:
//   2xx                      -> ok       "oembed-ok"
//   any other status         -> broken   "oembed-error" (code kept)
//   deadline exceeded        -> timeout  "oembed-timeout"
//   endpoint not reachable   -> error    "oembed-unreachable" (code 0)
// The last one says nothing about the video itself, only that we could not
// ask, so it is kept apart from `timeout`.
// =============================================================================

use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use super::classify::to_watch_url;
use super::outcome::{Outcome, StatusKind};

/// Public oEmbed endpoint used when nothing else is configured
pub const DEFAULT_OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

/// Checks that the video behind `url` exists.
///
/// The URL is rewritten to its canonical watch form first; that form is what
/// the endpoint is asked about and what ends up in `final_url`.
pub async fn probe_video(client: &Client, endpoint: &str, url: &str, timeout: Duration) -> Outcome {
    let watch_url = to_watch_url(url);
    let request = client
        .get(endpoint)
        .query(&[("url", watch_url.as_str()), ("format", "json")]);

    match tokio::time::timeout(timeout, request.send()).await {
        Ok(Ok(response)) if response.status().is_success() => {
            Outcome::new(StatusKind::Ok, response.status().as_u16(), watch_url).with_reason("oembed-ok")
        }
        Ok(Ok(response)) => {
            debug!(url, status = response.status().as_u16(), "oEmbed lookup failed");
            Outcome::new(StatusKind::Broken, response.status().as_u16(), watch_url)
                .with_reason("oembed-error")
        }
        Ok(Err(e)) if e.is_timeout() => oembed_timeout(watch_url),
        Ok(Err(e)) => {
            debug!(url, error = %e, "oEmbed endpoint unreachable");
            Outcome::new(StatusKind::Error, 0, watch_url).with_reason("oembed-unreachable")
        }
        Err(_elapsed) => oembed_timeout(watch_url),
    }
}

fn oembed_timeout(watch_url: String) -> Outcome {
    Outcome::new(StatusKind::Timeout, 0, watch_url).with_reason("oembed-timeout")
}
