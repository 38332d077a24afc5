// src/checker/classify.rs
// =============================================================================
// URL classification and normalization.
//
// Nothing in here touches the network. Given the raw string from the catalog
// we decide:
// 1. what the URL looks like once trimmed (this is also the cache key)
// 2. whether it is worth probing at all (absolute http/https only)
// 3. whether it points at a video host, which is checked through oEmbed
//    instead of a plain HTTP request
// =============================================================================

use url::Url;

// Host used for every canonical "watch" URL
const CANONICAL_VIDEO_HOST: &str = "www.youtube.com";

// The two video host families: long-form pages and the short-link domain
const LONG_FORM_DOMAIN: &str = "youtube.com";
const SHORT_LINK_DOMAIN: &str = "youtu.be";

/// Trims surrounding whitespace. The result is the key used in the cache.
pub fn normalize_url(raw: &str) -> String {
    raw.trim().to_string()
}

/// Parses `url` and keeps it only if it is an absolute http/https URL.
pub fn parse_http_url(url: &str) -> Option<Url> {
    let parsed = Url::parse(url).ok()?;
    match parsed.scheme() {
        "http" | "https" => Some(parsed),
        _ => None,
    }
}

pub fn valid_http_url(url: &str) -> bool {
    parse_http_url(url).is_some()
}

// Which of the two video host families a URL belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VideoHost {
    LongForm,
    ShortLink,
}

fn video_host(url: &Url) -> Option<VideoHost> {
    let host = url.host_str()?.to_ascii_lowercase();
    if host_matches(&host, SHORT_LINK_DOMAIN) {
        Some(VideoHost::ShortLink)
    } else if host_matches(&host, LONG_FORM_DOMAIN) {
        Some(VideoHost::LongForm)
    } else {
        None
    }
}

// Exact domain or any subdomain of it (www., m., music., ...)
fn host_matches(host: &str, domain: &str) -> bool {
    host == domain
        || host
            .strip_suffix(domain)
            .is_some_and(|prefix| prefix.ends_with('.'))
}

/// True when `url` is a valid http(s) URL on a known video host.
pub fn is_video_url(url: &str) -> bool {
    parse_http_url(url)
        .as_ref()
        .and_then(video_host)
        .is_some()
}

/// Rewrites a video URL to `https://www.youtube.com/watch?v=<id>`.
///
/// Long-form URLs take the id from the `v` query parameter, short links take
/// the first path segment. When no id can be found (channel pages, `/embed/`,
/// an empty short link) the input is returned unchanged and gets probed as-is.
pub fn to_watch_url(url: &str) -> String {
    canonical_watch_url(url).unwrap_or_else(|| url.to_string())
}

fn canonical_watch_url(url: &str) -> Option<String> {
    let id = extract_video_id(url)?;
    let mut watch = Url::parse(&format!("https://{}/watch", CANONICAL_VIDEO_HOST)).ok()?;
    watch.query_pairs_mut().append_pair("v", &id);
    Some(watch.to_string())
}

fn extract_video_id(url: &str) -> Option<String> {
    let parsed = parse_http_url(url)?;
    let id = match video_host(&parsed)? {
        VideoHost::ShortLink => parsed
            .path_segments()
            .and_then(|mut segments| segments.next())
            .map(str::to_string),
        VideoHost::LongForm => parsed
            .query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned()),
    }?;

    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}
