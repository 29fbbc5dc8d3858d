//! URL fetching with HTML to text conversion

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use serde_json::Value;
use tracing::debug;

use super::{FetchError, ResourceFetcher};
use crate::config::FetchConfig;

/// Fetches URLs over HTTP and extracts readable text
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
    max_chars: usize,
}

impl HttpFetcher {
    pub fn from_config(config: &FetchConfig) -> Self {
        debug!(?config, "HttpFetcher::from_config: called");
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .unwrap_or_default();
        Self::with_client(client, config)
    }

    fn with_client(client: reqwest::Client, config: &FetchConfig) -> Self {
        Self {
            client,
            max_bytes: config.max_bytes,
            max_chars: config.max_chars,
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::from_config(&FetchConfig::default())
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        debug!(%url, "HttpFetcher::fetch_text: called");
        if !url.starts_with("http://") && !url.starts_with("https://") {
            debug!("HttpFetcher::fetch_text: invalid URL protocol");
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        let response = self.client.get(url).send().await?;
        debug!(status = %response.status(), "HttpFetcher::fetch_text: response received");

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        if let Some(length) = response.content_length()
            && length > self.max_bytes as u64
        {
            debug!(length, "HttpFetcher::fetch_text: declared length over limit");
            return Err(FetchError::TooLarge {
                size: usize::try_from(length).unwrap_or(usize::MAX),
                limit: self.max_bytes,
            });
        }

        // Content-Length may be absent or wrong, so the cap is enforced per chunk too
        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            if body.len() + chunk.len() > self.max_bytes {
                debug!(read = body.len() + chunk.len(), "HttpFetcher::fetch_text: body over limit");
                return Err(FetchError::TooLarge {
                    size: body.len() + chunk.len(),
                    limit: self.max_bytes,
                });
            }
            body.extend_from_slice(&chunk);
        }

        let body = String::from_utf8_lossy(&body).into_owned();
        debug!(body_len = body.len(), %content_type, "HttpFetcher::fetch_text: body read");
        Ok(truncate_chars(extract_text(&content_type, body), self.max_chars))
    }
}

/// Convert a response body to prompt-friendly text based on its content type
pub(crate) fn extract_text(content_type: &str, body: String) -> String {
    debug!(%content_type, "extract_text: called");
    if content_type.contains("text/html") || content_type.contains("application/xhtml") {
        html2md::rewrite_html(&body, false).trim().to_string()
    } else if content_type.contains("application/json") {
        match serde_json::from_str::<Value>(&body) {
            Ok(json) => serde_json::to_string_pretty(&json).unwrap_or(body),
            Err(_) => body,
        }
    } else {
        body
    }
}

fn truncate_chars(text: String, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text;
    }
    debug!(max_chars, "truncate_chars: truncating extracted text");
    text.chars().take(max_chars).collect()
}

/// Refuses every fetch
pub struct NoFetch;

#[async_trait]
impl ResourceFetcher for NoFetch {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        debug!(%url, "NoFetch::fetch_text: called");
        Err(FetchError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn test_extract_html() {
        let html = r#"
            <html>
                <body>
                    <h1>Hello World</h1>
                    <p>This is a paragraph.</p>
                </body>
            </html>
        "#;

        let text = extract_text("text/html; charset=utf-8", html.to_string());
        assert!(text.contains("Hello World"));
        assert!(text.contains("This is a paragraph"));
        assert!(!text.contains("<p>"));
    }

    #[test]
    fn test_extract_json_pretty() {
        let text = extract_text("application/json", r#"{"a":1}"#.to_string());
        assert_eq!(text, "{\n  \"a\": 1\n}");
    }

    #[test]
    fn test_extract_plain_passthrough() {
        let text = extract_text("text/plain", "just text".to_string());
        assert_eq!(text, "just text");
    }

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("héllo".to_string(), 2), "hé");
        assert_eq!(truncate_chars("hi".to_string(), 10), "hi");
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let fetcher = HttpFetcher::default();
        let err = fetcher.fetch_text("not-a-url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }

    /// Serve one canned HTTP response on a local port
    async fn serve_once(head: String, body: Vec<u8>, repeat_body: bool) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            if socket.write_all(head.as_bytes()).await.is_err() {
                return;
            }
            // Endless bodies stop once the client hangs up
            while socket.write_all(&body).await.is_ok() && repeat_body {}
        });
        format!("http://{}/page", addr)
    }

    fn local_fetcher(max_bytes: usize) -> HttpFetcher {
        let config = FetchConfig {
            max_bytes,
            ..FetchConfig::default()
        };
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpFetcher::with_client(client, &config)
    }

    #[tokio::test]
    async fn test_fetch_small_body() {
        let body = b"hello from the test server".to_vec();
        let head = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        );
        let url = serve_once(head, body, false).await;

        let text = local_fetcher(1024).fetch_text(&url).await.unwrap();
        assert_eq!(text, "hello from the test server");
    }

    #[tokio::test]
    async fn test_fetch_rejects_declared_length_over_limit() {
        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nContent-Length: 5000\r\nConnection: close\r\n\r\n";
        let url = serve_once(head.to_string(), vec![b'a'; 5000], false).await;

        let err = local_fetcher(100).fetch_text(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::TooLarge { size: 5000, limit: 100 }), "{:?}", err);
    }

    #[tokio::test]
    async fn test_fetch_stops_reading_endless_body() {
        let head = "HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n";
        let url = serve_once(head.to_string(), vec![b'a'; 8192], true).await;

        let err = local_fetcher(100_000).fetch_text(&url).await.unwrap_err();
        match err {
            FetchError::TooLarge { size, limit } => {
                assert_eq!(limit, 100_000);
                assert!(size > limit);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_fetch() {
        let err = NoFetch.fetch_text("https://example.com").await.unwrap_err();
        assert!(matches!(err, FetchError::Unsupported));
    }
}
