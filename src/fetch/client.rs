use async_trait::async_trait;
use reqwest::{Request, Response};

/// The transport a [`Fetcher`](super::Fetcher) hands its requests to.
///
/// Implementations perform the socket I/O, DNS and TLS on their own
/// schedule and must be safe to share between concurrent fetches.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn execute(&self, req: Request) -> reqwest::Result<Response>;
}
