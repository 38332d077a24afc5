// src/checker/http.rs
// =============================================================================
// Generic HTTP probe: is there anything at this URL?
//
// How a page is checked:
// 1. HEAD request (lightweight, no body download), redirects followed
// 2. If the server answers 405 Method Not Allowed, or the HEAD request fails
//    at the transport level, try exactly once more with GET
// 3. Each attempt races a deadline; losing the race drops the request, which
//    also closes the underlying connection
//
// The final response is mapped onto a StatusKind:
//   200-399            -> ok, or redirected if we ended up somewhere else
//   anything else      -> broken (the code is kept)
//   deadline exceeded  -> timeout (code 0)
//   transport failure  -> error (code 0, reason says why)
// =============================================================================

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::classify::parse_http_url;
use super::outcome::{Outcome, StatusKind};

// Result of one request attempt, before it is interpreted
enum Attempt {
    Response(Response),
    Timeout,
    Failed(reqwest::Error),
}

// Sends a request, giving up once `timeout` has elapsed.
//
// tokio::time::timeout drops the send future when the deadline wins,
// so the in-flight request is cancelled rather than left running.
async fn send_with_deadline(request: RequestBuilder, timeout: Duration) -> Attempt {
    match tokio::time::timeout(timeout, request.send()).await {
        Ok(Ok(response)) => Attempt::Response(response),
        Ok(Err(e)) if e.is_timeout() => Attempt::Timeout,
        Ok(Err(e)) => Attempt::Failed(e),
        Err(_elapsed) => Attempt::Timeout,
    }
}

/// Checks a single page URL.
///
/// `url` is expected to be normalized already; anything that is not an
/// absolute http(s) URL comes back as `invalid` without a request being made.
pub async fn probe_page(client: &Client, url: &str, timeout: Duration) -> Outcome {
    let requested = match parse_http_url(url) {
        Some(parsed) => parsed,
        None => return Outcome::invalid(url),
    };

    let response = match send_with_deadline(client.head(requested.clone()), timeout).await {
        Attempt::Response(response) if response.status() != StatusCode::METHOD_NOT_ALLOWED => {
            response
        }
        Attempt::Timeout => return timed_out(url),
        Attempt::Response(_) => {
            debug!(url, "HEAD not allowed, retrying with GET");
            match fetch_with_get(client, &requested, timeout).await {
                Ok(response) => response,
                Err(outcome) => return outcome,
            }
        }
        Attempt::Failed(e) => {
            debug!(url, error = %e, "HEAD failed, retrying with GET");
            match fetch_with_get(client, &requested, timeout).await {
                Ok(response) => response,
                Err(outcome) => return outcome,
            }
        }
    };

    analyze_response(&requested, &response)
}

// The single fallback attempt. Only the status line matters, the body is
// never read.
async fn fetch_with_get(client: &Client, url: &Url, timeout: Duration) -> Result<Response, Outcome> {
    match send_with_deadline(client.get(url.clone()), timeout).await {
        Attempt::Response(response) => Ok(response),
        Attempt::Timeout => Err(timed_out(url.as_str())),
        Attempt::Failed(e) => Err(categorize_error(url.as_str(), e)),
    }
}

// Maps the final response (after redirects) to an outcome
fn analyze_response(requested: &Url, response: &Response) -> Outcome {
    let status_code = response.status();
    let code = status_code.as_u16();
    let final_url = response.url().as_str();

    if (200..400).contains(&code) {
        // reqwest follows redirects for us; a different final URL means at
        // least one hop happened
        let status = if response.url() != requested {
            StatusKind::Redirected
        } else {
            StatusKind::Ok
        };
        Outcome::new(status, code, final_url)
    } else {
        Outcome::new(StatusKind::Broken, code, final_url).with_reason(format!("HTTP {}", code))
    }
}

fn timed_out(url: &str) -> Outcome {
    Outcome::new(StatusKind::Timeout, 0, url).with_reason("request timed out")
}

// Turns a transport-level failure into an `error` outcome with a short,
// human readable reason
fn categorize_error(url: &str, error: reqwest::Error) -> Outcome {
    let error_string = error.to_string().to_lowercase();
    let detail = format!("{:?}", error).to_lowercase();

    let reason = if error.is_redirect() {
        "too many redirects".to_string()
    } else if detail.contains("dns") || detail.contains("failed to lookup") {
        "could not resolve hostname".to_string()
    } else if detail.contains("certificate") || detail.contains("tls") {
        "TLS handshake failed".to_string()
    } else if error.is_connect() {
        "connection failed".to_string()
    } else {
        error_string
    };

    Outcome::new(StatusKind::Error, 0, url).with_reason(reason)
}

// -----------------------------------------------------------------------------
// NOTES:
//
// 1. Why retry with GET after a failed HEAD?
//    - Some servers reset the connection or hang up on HEAD but serve GET fine
//    - The retry is a single attempt; its answer is final either way
//
// 2. Why no retry after a HEAD timeout?
//    - A second attempt could double the wait; one deadline per link keeps the
//      run time predictable
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_ok_without_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let url = format!("{}/page", server.uri());
        let outcome = probe_page(&Client::new(), &url, TIMEOUT).await;

        assert_eq!(outcome.status, StatusKind::Ok);
        assert_eq!(outcome.code, 200);
        assert_eq!(outcome.final_url, url);
    }

    #[tokio::test]
    async fn test_redirect_is_followed() {
        let server = MockServer::start().await;
        let new_url = format!("{}/new", server.uri());
        Mock::given(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("Location", new_url.as_str()))
            .mount(&server)
            .await;
        Mock::given(path("/new"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let url = format!("{}/old", server.uri());
        let outcome = probe_page(&Client::new(), &url, TIMEOUT).await;

        assert_eq!(outcome.status, StatusKind::Redirected);
        assert_eq!(outcome.code, 200);
        assert_eq!(outcome.final_url, new_url);
    }

    #[tokio::test]
    async fn test_not_found_is_broken() {
        let server = MockServer::start().await;
        Mock::given(path("/x"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let url = format!("{}/x", server.uri());
        let outcome = probe_page(&Client::new(), &url, TIMEOUT).await;

        assert_eq!(outcome.status, StatusKind::Broken);
        assert_eq!(outcome.code, 404);
    }

    #[tokio::test]
    async fn test_server_error_is_broken() {
        let server = MockServer::start().await;
        Mock::given(path("/down"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let url = format!("{}/down", server.uri());
        let outcome = probe_page(&Client::new(), &url, TIMEOUT).await;

        assert_eq!(outcome.status, StatusKind::Broken);
        assert_eq!(outcome.code, 503);
    }

    #[tokio::test]
    async fn test_head_not_allowed_falls_back_to_get() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .and(path("/no-head"))
            .respond_with(ResponseTemplate::new(405))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/no-head"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/no-head", server.uri());
        let outcome = probe_page(&Client::new(), &url, TIMEOUT).await;

        assert_eq!(outcome.status, StatusKind::Ok);
        assert_eq!(outcome.code, 200);
    }

    #[tokio::test]
    async fn test_get_fallback_result_is_final() {
        // No second retry after the GET fallback
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(405))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(405))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/never", server.uri());
        let outcome = probe_page(&Client::new(), &url, TIMEOUT).await;

        assert_eq!(outcome.status, StatusKind::Broken);
        assert_eq!(outcome.code, 405);
    }

    #[tokio::test]
    async fn test_slow_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(5)))
            .mount(&server)
            .await;

        let url = format!("{}/slow", server.uri());
        let started = std::time::Instant::now();
        let outcome = probe_page(&Client::new(), &url, Duration::from_millis(200)).await;

        assert_eq!(outcome.status, StatusKind::Timeout);
        assert_eq!(outcome.code, 0);
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_connection_refused_is_error() {
        // Grab a free port, then close the listener so nothing is there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let url = format!("http://127.0.0.1:{}/gone", port);
        let outcome = probe_page(&Client::new(), &url, TIMEOUT).await;

        assert_eq!(outcome.status, StatusKind::Error);
        assert_eq!(outcome.code, 0);
        assert!(!outcome.reason.is_empty());
    }

    #[tokio::test]
    async fn test_head_transport_failure_falls_back_to_get() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};
        use tokio::net::TcpListener;

        // A server that hangs up on the first connection (the HEAD request)
        // and answers the second one normally
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (first, _) = listener.accept().await.unwrap();
            drop(first);

            let (mut second, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let n = second.read(&mut buf).await.unwrap();
            let request_line = String::from_utf8_lossy(&buf[..n]).lines().next().unwrap_or("").to_string();
            second
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                .await
                .unwrap();
            request_line
        });

        let url = format!("http://{}/flaky", addr);
        let outcome = probe_page(&Client::new(), &url, TIMEOUT).await;

        assert_eq!(outcome.status, StatusKind::Ok);
        assert_eq!(outcome.code, 200);
        let request_line = server.await.unwrap();
        assert!(request_line.starts_with("GET /flaky"), "second request was {:?}", request_line);
    }

    #[tokio::test]
    async fn test_invalid_url_is_not_requested() {
        let outcome = probe_page(&Client::new(), "not-a-url", TIMEOUT).await;
        assert_eq!(outcome, Outcome::invalid("not-a-url"));
    }
}
