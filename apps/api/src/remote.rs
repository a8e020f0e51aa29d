//! Downloads résumé files linked from webhook events.
//!
//! Only allow-listed hosts are contacted. Their addresses are resolved once,
//! checked, and pinned for the request, and redirects are not followed, so a
//! caller cannot steer the service at loopback, link-local or private networks.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use reqwest::{redirect::Policy, Client, Url};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("{0}")]
    Rejected(String),

    #[error("linked file exceeds the {0} byte limit")]
    TooLarge(usize),

    #[error("{0}")]
    Upstream(String),
}

pub struct RemoteFileFetcher {
    allowed_hosts: Vec<String>,
    allow_private_networks: bool,
    timeout: Duration,
}

impl RemoteFileFetcher {
    pub fn new(allowed_hosts: Vec<String>, allow_private_networks: bool, timeout: Duration) -> Self {
        Self {
            allowed_hosts: allowed_hosts
                .into_iter()
                .map(|h| h.trim().trim_end_matches('.').to_ascii_lowercase())
                .filter(|h| !h.is_empty())
                .collect(),
            allow_private_networks,
            timeout,
        }
    }

    /// Streams the file at `raw_url`, giving up as soon as it passes `max_bytes`.
    pub async fn fetch(&self, raw_url: &str, max_bytes: usize) -> Result<Bytes, FetchError> {
        let url = Url::parse(raw_url)
            .map_err(|e| FetchError::Rejected(format!("file_url is not a valid URL: {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::Rejected(format!(
                "file_url scheme '{}' is not supported",
                url.scheme()
            )));
        }
        let host = url
            .host_str()
            .ok_or_else(|| FetchError::Rejected("file_url has no host".to_string()))?
            .to_ascii_lowercase();
        if !self.is_allowed_host(&host) {
            return Err(FetchError::Rejected(format!(
                "file_url host '{host}' is not an allowed webhook source"
            )));
        }
        let port = url
            .port_or_known_default()
            .ok_or_else(|| FetchError::Rejected("file_url has no port".to_string()))?;

        let addr = self.resolve(&host, port).await?;
        debug!(%host, %addr, "Downloading linked résumé");

        let client = Client::builder()
            .timeout(self.timeout)
            .redirect(Policy::none())
            .resolve(&host, addr)
            .build()
            .map_err(|e| FetchError::Upstream(format!("could not build download client: {e}")))?;

        let mut response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Upstream(format!("could not download {url}: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Upstream(format!(
                "download of {url} returned {status}"
            )));
        }
        if response
            .content_length()
            .is_some_and(|len| len > max_bytes as u64)
        {
            return Err(FetchError::TooLarge(max_bytes));
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Upstream(format!("download of {url} was interrupted: {e}")))?
        {
            if body.len() + chunk.len() > max_bytes {
                return Err(FetchError::TooLarge(max_bytes));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body.freeze())
    }

    /// Exact match or a subdomain of an allowed host.
    fn is_allowed_host(&self, host: &str) -> bool {
        self.allowed_hosts.iter().any(|allowed| {
            host == allowed
                || host
                    .strip_suffix(allowed.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Every resolved address must be public unless private networks are allowed.
    async fn resolve(&self, host: &str, port: u16) -> Result<SocketAddr, FetchError> {
        let lookup = host.trim_start_matches('[').trim_end_matches(']');
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((lookup, port))
            .await
            .map_err(|e| FetchError::Upstream(format!("could not resolve {host}: {e}")))?
            .collect();

        if !self.allow_private_networks {
            if let Some(blocked) = addrs.iter().find(|a| !is_public_address(a.ip())) {
                return Err(FetchError::Rejected(format!(
                    "file_url host '{host}' resolves to non-public address {}",
                    blocked.ip()
                )));
            }
        }
        addrs
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::Upstream(format!("{host} did not resolve")))
    }
}

pub fn is_public_address(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_public_v4(v4),
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_public_v4(v4),
            None => {
                let first = v6.segments()[0];
                let unique_local = first & 0xfe00 == 0xfc00;
                let link_local = first & 0xffc0 == 0xfe80;
                !(v6.is_loopback()
                    || v6.is_unspecified()
                    || v6.is_multicast()
                    || unique_local
                    || link_local)
            }
        },
    }
}

fn is_public_v4(ip: Ipv4Addr) -> bool {
    let [a, b, _, _] = ip.octets();
    let this_network = a == 0;
    let carrier_nat = a == 100 && (64..=127).contains(&b);
    !(ip.is_private()
        || ip.is_loopback()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || ip.is_documentation()
        || ip.is_multicast()
        || this_network
        || carrier_nat)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{
        extract::State,
        http::{header, StatusCode},
        response::IntoResponse,
        routing::get,
        Router,
    };

    use super::*;

    async fn serve_files(hits: Arc<AtomicUsize>) -> SocketAddr {
        let app = Router::new()
            .route(
                "/cv.txt",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    "5 years of Go and SQL experience"
                }),
            )
            .route(
                "/moved",
                get(|| async {
                    (
                        StatusCode::FOUND,
                        [(header::LOCATION, "http://169.254.169.254/latest/meta-data")],
                    )
                        .into_response()
                }),
            )
            .with_state(hits);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        addr
    }

    fn fetcher(hosts: &[&str], allow_private_networks: bool) -> RemoteFileFetcher {
        RemoteFileFetcher::new(
            hosts.iter().map(|h| h.to_string()).collect(),
            allow_private_networks,
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_loopback_target_is_refused_even_when_listed() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = serve_files(hits.clone()).await;

        let err = fetcher(&["127.0.0.1"], false)
            .fetch(&format!("http://{addr}/cv.txt"), 1024)
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Rejected(msg) if msg.contains("non-public")));
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_unlisted_host_is_refused() {
        let err = fetcher(&["forms.example.com"], false)
            .fetch("https://attacker.example.net/cv.pdf", 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Rejected(msg) if msg.contains("attacker.example.net")));
    }

    #[tokio::test]
    async fn test_empty_allowlist_refuses_everything() {
        let err = fetcher(&[], true)
            .fetch("https://forms.example.com/cv.pdf", 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Rejected(_)));
    }

    #[tokio::test]
    async fn test_unsupported_scheme_is_refused() {
        let err = fetcher(&["files.example.com"], false)
            .fetch("ftp://files.example.com/cv.pdf", 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Rejected(msg) if msg.contains("ftp")));
    }

    #[tokio::test]
    async fn test_listed_host_downloads_within_limit() {
        let hits = Arc::new(AtomicUsize::new(0));
        let addr = serve_files(hits.clone()).await;
        let fetcher = fetcher(&["127.0.0.1"], true);

        let bytes = fetcher
            .fetch(&format!("http://{addr}/cv.txt"), 1024)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"5 years of Go and SQL experience");

        let err = fetcher
            .fetch(&format!("http://{addr}/cv.txt"), 8)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::TooLarge(8)));
    }

    #[tokio::test]
    async fn test_redirects_are_not_followed() {
        let addr = serve_files(Arc::new(AtomicUsize::new(0))).await;
        let err = fetcher(&["127.0.0.1"], true)
            .fetch(&format!("http://{addr}/moved"), 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Upstream(msg) if msg.contains("302")));
    }

    #[test]
    fn test_subdomains_of_allowed_hosts_match() {
        let fetcher = fetcher(&["Example.com."], false);
        assert!(fetcher.is_allowed_host("example.com"));
        assert!(fetcher.is_allowed_host("forms.example.com"));
        assert!(!fetcher.is_allowed_host("badexample.com"));
    }

    #[test]
    fn test_public_address_classification() {
        for blocked in [
            "127.0.0.1",
            "10.1.2.3",
            "172.16.0.9",
            "192.168.1.1",
            "169.254.169.254",
            "100.64.0.1",
            "0.0.0.0",
            "::1",
            "fe80::1",
            "fd00::1",
            "::ffff:127.0.0.1",
        ] {
            assert!(!is_public_address(blocked.parse().unwrap()), "{blocked}");
        }
        for allowed in ["8.8.8.8", "142.250.72.14", "2606:4700::1111"] {
            assert!(is_public_address(allowed.parse().unwrap()), "{allowed}");
        }
    }
}
