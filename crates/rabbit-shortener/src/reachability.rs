//! Checks that a long URL is worth shortening.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use typed_builder::TypedBuilder;
use url::Url;

#[async_trait]
pub trait Reachability: Send + Sync + 'static {
    /// Returns `true` if `url` may be shortened.
    async fn check(&self, url: &str) -> bool;
}

#[async_trait]
impl<T: Reachability + ?Sized> Reachability for std::sync::Arc<T> {
    async fn check(&self, url: &str) -> bool {
        (**self).check(url).await
    }
}

#[derive(Debug, Error)]
pub enum ReachabilityError {
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, TypedBuilder)]
pub struct HttpCheckerConfig {
    /// Upper bound on the whole request, including redirects.
    #[builder(default = Duration::from_secs(5))]
    pub timeout: Duration,

    #[builder(default = format!("rabbit-shortener/{}", env!("CARGO_PKG_VERSION")), setter(into))]
    pub user_agent: String,

    /// Honour `HTTP_PROXY`/`HTTPS_PROXY` from the environment.
    #[builder(default = true)]
    pub use_system_proxy: bool,
}

impl Default for HttpCheckerConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// Probes the URL with an HTTP `GET`.
///
/// A URL is reachable if and only if the final response (after redirects)
/// has status `200 OK`. Any transport error, including the timeout, counts
/// as unreachable.
#[derive(Debug, Clone)]
pub struct HttpChecker {
    client: reqwest::Client,
}

impl HttpChecker {
    pub fn new(config: HttpCheckerConfig) -> Result<Self, ReachabilityError> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent);
        if !config.use_system_proxy {
            builder = builder.no_proxy();
        }
        Ok(Self {
            client: builder.build()?,
        })
    }
}

#[async_trait]
impl Reachability for HttpChecker {
    async fn check(&self, url: &str) -> bool {
        match self.client.get(url).send().await {
            Ok(response) => {
                let status = response.status();
                debug!(url, %status, "reachability probe answered");
                status == reqwest::StatusCode::OK
            }
            Err(e) => {
                debug!(url, error = %e, "reachability probe failed");
                false
            }
        }
    }
}

/// Accepts any syntactically valid `http` or `https` URL with a host.
///
/// Makes no network calls.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissiveChecker;

#[async_trait]
impl Reachability for PermissiveChecker {
    async fn check(&self, url: &str) -> bool {
        match Url::parse(url) {
            Ok(parsed) => {
                matches!(parsed.scheme(), "http" | "https")
                    && parsed.host_str().is_some_and(|h| !h.is_empty())
            }
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serves `200 OK` on `/ok`, a redirect to `/ok` on `/moved` and `404`
    /// everywhere else.
    async fn serve() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 4096];
                    let n = stream.read(&mut buf).await.unwrap_or(0);
                    let request = String::from_utf8_lossy(&buf[..n]);
                    let path = request.split_whitespace().nth(1).unwrap_or("/");

                    let response = match path {
                        "/ok" => "HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok".to_string(),
                        "/moved" => "HTTP/1.1 302 Found\r\nlocation: /ok\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_string(),
                        "/empty" => "HTTP/1.1 204 No Content\r\nconnection: close\r\n\r\n".to_string(),
                        _ => "HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_string(),
                    };
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        format!("http://{addr}")
    }

    fn checker() -> HttpChecker {
        HttpChecker::new(
            HttpCheckerConfig::builder()
                .timeout(Duration::from_secs(2))
                .use_system_proxy(false)
                .build(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn http_200_is_reachable() {
        let base = serve().await;
        assert!(checker().check(&format!("{base}/ok")).await);
    }

    #[tokio::test]
    async fn redirect_to_200_is_reachable() {
        let base = serve().await;
        assert!(checker().check(&format!("{base}/moved")).await);
    }

    #[tokio::test]
    async fn other_statuses_are_unreachable() {
        let base = serve().await;
        assert!(!checker().check(&format!("{base}/missing")).await);
        assert!(!checker().check(&format!("{base}/empty")).await);
    }

    #[tokio::test]
    async fn connection_refused_is_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        assert!(!checker().check(&format!("http://{addr}/")).await);
    }

    #[tokio::test]
    async fn garbage_is_unreachable() {
        assert!(!checker().check("not a url").await);
        assert!(!checker().check("").await);
    }

    #[tokio::test]
    async fn permissive_checker() {
        let checker = PermissiveChecker;
        assert!(checker.check("https://example.com").await);
        assert!(checker.check("http://example.com/a/b?c=d").await);
        assert!(!checker.check("ftp://example.com/file").await);
        assert!(!checker.check("mailto:someone@example.com").await);
        assert!(!checker.check("example.com").await);
        assert!(!checker.check("").await);
    }
}
