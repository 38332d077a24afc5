// src/checker/prober.rs
// =============================================================================
// The seam between the dispatcher and the network.
//
// The dispatcher only knows it can ask "check this page" or "check this
// video". HttpProber answers with real requests; tests plug in a double that
// records what it was asked.
// =============================================================================

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::http::probe_page;
use super::outcome::Outcome;
use super::video::probe_video;
use crate::error::SentinelError;

#[async_trait]
pub trait Prober: Send + Sync {
    /// Generic existence check (HEAD, falling back to GET once).
    async fn probe_page(&self, url: &str) -> Outcome;

    /// oEmbed existence check for a video-host URL.
    async fn probe_video(&self, url: &str) -> Outcome;
}

/// Prober backed by a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: Client,
    timeout: Duration,
    oembed_endpoint: String,
}

impl HttpProber {
    pub fn new(timeout: Duration, oembed_endpoint: impl Into<String>) -> Result<Self, SentinelError> {
        // One client for the whole run (connection pooling). Redirects are
        // followed here; the probes compare final and requested URLs.
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(10))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(HttpProber {
            client,
            timeout,
            oembed_endpoint: oembed_endpoint.into(),
        })
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe_page(&self, url: &str) -> Outcome {
        probe_page(&self.client, url, self.timeout).await
    }

    async fn probe_video(&self, url: &str) -> Outcome {
        probe_video(&self.client, &self.oembed_endpoint, url, self.timeout).await
    }
}
