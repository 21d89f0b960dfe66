mod basic;
mod client;
mod completion;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use completion::{CompletionLoop, CompletionQueue, Job, completion_queue};

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, Request, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::error::{FetchError, Result};

/// Parses `url` into an absolute `http`/`https` URL.
///
/// Empty input, malformed syntax, relative references and any other scheme
/// are rejected with [`FetchError::InvalidUrl`].
pub fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url).map_err(|e| FetchError::invalid_url(url, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::invalid_url(
            url,
            format!("unsupported scheme '{other}'"),
        )),
    }
}

/// Builds the GET request for `url`, applying `headers` in iteration order.
/// A repeated header name replaces the earlier value.
fn build_request<I, K, V>(url: &str, headers: I) -> Result<Request>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut req = Request::new(Method::GET, parse_url(url)?);

    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_ref().as_bytes())
            .map_err(FetchError::request_failed)?;
        let value = HeaderValue::from_str(value.as_ref()).map_err(FetchError::request_failed)?;
        req.headers_mut().insert(name, value);
    }

    Ok(req)
}

/// Decodes a response body. The HTTP status is deliberately not consulted:
/// only an empty body is treated as a bad response.
fn decode_body<T: DeserializeOwned>(body: &Bytes) -> Result<T> {
    if body.is_empty() {
        return Err(FetchError::InvalidResponse);
    }
    Ok(serde_json::from_slice(body)?)
}

/// Fetches a URL with GET and decodes the JSON body into a caller-chosen type.
///
/// A `Fetcher` holds no per-request state. Clones share the same transport,
/// so one instance can be handed to every caller that needs it.
///
/// Outcomes, first match wins:
///
/// 1. the URL does not parse: [`FetchError::InvalidUrl`], nothing is sent;
/// 2. the transport fails: [`FetchError::RequestFailed`];
/// 3. the body is empty: [`FetchError::InvalidResponse`];
/// 4. the body does not decode: [`FetchError::DecodingFailed`];
/// 5. otherwise the decoded value.
///
/// Status codes are not inspected, so a `500` whose body decodes is a success.
pub struct Fetcher<C = BasicClient> {
    client: Arc<C>,
}

impl<C> Clone for Fetcher<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
        }
    }
}

impl Fetcher<BasicClient> {
    pub fn new() -> Self {
        Self::with_client(BasicClient::new())
    }
}

impl Default for Fetcher<BasicClient> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: HttpClient> Fetcher<C> {
    pub fn with_client(client: C) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Fetches `url` and decodes the body as `T`.
    pub async fn fetch_data<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        self.fetch_data_with_headers(url, std::iter::empty::<(&str, &str)>())
            .await
    }

    /// Like [`fetch_data`](Self::fetch_data), attaching `headers` to the request.
    #[tracing::instrument(level = "debug", skip_all, fields(url = %url))]
    pub async fn fetch_data_with_headers<T, I, K, V>(&self, url: &str, headers: I) -> Result<T>
    where
        T: DeserializeOwned,
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let req = build_request(url, headers)?;
        trace!(headers = req.headers().len(), "sending request");

        let resp = self.client.execute(req).await?;
        let status = resp.status();
        let body = resp.bytes().await?;
        debug!(%status, bytes = body.len(), "response received");

        decode_body(&body)
    }
}

impl<C: HttpClient + 'static> Fetcher<C> {
    /// Starts fetching `url` and returns immediately.
    ///
    /// The outcome is handed to `on_complete` exactly once, through `queue`:
    /// the callback runs on whatever context drives the matching
    /// [`CompletionLoop`], never inside this call. Invalid URLs are reported
    /// the same way.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn fetch<T, F>(&self, url: impl Into<String>, queue: &CompletionQueue, on_complete: F)
    where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<T>) + Send + 'static,
    {
        self.fetch_with_headers(url, Vec::<(String, String)>::new(), queue, on_complete);
    }

    /// Like [`fetch`](Self::fetch), attaching `headers` to the request.
    ///
    /// # Panics
    ///
    /// Must be called from within a Tokio runtime.
    pub fn fetch_with_headers<T, F, I, K, V>(
        &self,
        url: impl Into<String>,
        headers: I,
        queue: &CompletionQueue,
        on_complete: F,
    ) where
        T: DeserializeOwned + Send + 'static,
        F: FnOnce(Result<T>) + Send + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let url = url.into();
        let headers: Vec<(String, String)> = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let fetcher = self.clone();
        let queue = queue.clone();

        let task_url = url.clone();
        let task = tokio::spawn(async move {
            fetcher
                .fetch_data_with_headers::<T, _, _, _>(&task_url, headers)
                .await
        });

        // The callback stays out of the fetch task so a panicking transport
        // still yields exactly one delivery.
        tokio::spawn(async move {
            let result = match task.await {
                Ok(result) => result,
                Err(join_err) => {
                    debug!(url = %url, error = %join_err, "fetch task aborted");
                    Err(FetchError::request_failed(join_err))
                }
            };
            if let Err(e) = &result {
                debug!(url = %url, kind = ?e.kind(), error = %e, "fetch failed");
            }
            queue.dispatch(Box::new(move || on_complete(result)));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: i64,
        name: String,
    }

    #[test]
    fn test_parse_url_accepts_http_and_https() {
        assert!(parse_url("http://localhost:8080/path").is_ok());
        assert!(parse_url("https://api.example.com/user?id=1").is_ok());
    }

    #[test]
    fn test_parse_url_rejects_bad_input() {
        let inputs = [
            "",
            "not a url",
            "/relative/path",
            "http://",
            "ftp://example.com/file",
            "mailto:ada@example.com",
        ];
        for input in inputs {
            let err = parse_url(input).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidUrl, "input: {input:?}");
        }
    }

    #[test]
    fn test_build_request_is_get_with_headers() {
        let req = build_request("https://api.example.com/user", [("X-Test", "abc")]).unwrap();

        assert_eq!(*req.method(), Method::GET);
        assert_eq!(req.url().as_str(), "https://api.example.com/user");
        assert_eq!(req.headers()["x-test"], "abc");
        assert!(req.body().is_none());
    }

    #[test]
    fn test_build_request_last_duplicate_header_wins() {
        let req = build_request(
            "https://api.example.com/user",
            [("X-Test", "first"), ("x-test", "second")],
        )
        .unwrap();

        let values: Vec<_> = req.headers().get_all("x-test").iter().collect();
        assert_eq!(values, vec!["second"]);
    }

    #[test]
    fn test_build_request_rejects_invalid_header() {
        let err = build_request("https://api.example.com", [("bad header", "v")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestFailed);

        let err = build_request("https://api.example.com", [("X-Ok", "line\nbreak")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequestFailed);
    }

    #[test]
    fn test_decode_body_empty_is_invalid_response() {
        let err = decode_body::<User>(&Bytes::new()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidResponse);
    }

    #[test]
    fn test_decode_body_schema_mismatch() {
        let err = decode_body::<User>(&Bytes::from_static(br#"{"unexpected":1}"#)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodingFailed);
    }

    #[test]
    fn test_decode_body_user() {
        let user: User = decode_body(&Bytes::from_static(br#"{"id":1,"name":"Ada"}"#)).unwrap();
        assert_eq!(
            user,
            User {
                id: 1,
                name: "Ada".to_string()
            }
        );
    }
}
