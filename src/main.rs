//! CLI entry point for the HTTP utility.
//!
//! Fetches a URL with GET and prints the decoded JSON body.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http_utility::config::{HeaderConfig, parse_header_arg};
use http_utility::{BasicClient, Fetcher, completion_queue};
use serde_json::Value;
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "http_utility")]
#[command(about = "Fetch a URL and decode its JSON body", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a URL and print the decoded JSON body
    Get {
        #[arg(value_name = "URL")]
        url: String,

        /// Request header in "Name: Value" form; may be repeated
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,

        /// JSON object of headers, applied before any --header
        #[arg(long, value_name = "FILE")]
        headers_file: Option<String>,

        /// Pretty-print the decoded body
        #[arg(short, long, default_value_t = false)]
        pretty: bool,

        /// Deliver the result through the completion loop instead of awaiting it
        #[arg(long, default_value_t = false)]
        callback: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let _file_guard = init_logging()?;

    let cli = Cli::parse();

    match cli.command {
        Commands::Get {
            url,
            headers,
            headers_file,
            pretty,
            callback,
        } => {
            let mut header_config = match headers_file {
                Some(path) => HeaderConfig::load(&path)?,
                None => HeaderConfig::default(),
            };
            for arg in &headers {
                let (name, value) = parse_header_arg(arg)?;
                header_config.push(name, value);
            }
            debug!(headers = header_config.len(), "headers prepared");

            let fetcher = build_fetcher()?;
            let body = if callback {
                get_with_callback(&fetcher, &url, &header_config).await?
            } else {
                fetcher
                    .fetch_data_with_headers::<Value, _, _, _>(&url, header_config.iter())
                    .await
                    .with_context(|| format!("GET {url} failed"))?
            };

            let rendered = if pretty {
                serde_json::to_string_pretty(&body)?
            } else {
                serde_json::to_string(&body)?
            };
            println!("{rendered}");
        }
    }

    Ok(())
}

/// Builds the fetcher over a `reqwest` client that identifies this tool.
fn build_fetcher() -> Result<Fetcher> {
    let client = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;
    Ok(Fetcher::with_client(BasicClient::from_reqwest(client)))
}

/// Runs the fetch through a completion queue driven by the main task.
async fn get_with_callback(fetcher: &Fetcher, url: &str, headers: &HeaderConfig) -> Result<Value> {
    let (queue, main_loop) = completion_queue();
    let (result_tx, result_rx) = tokio::sync::oneshot::channel();

    let owned: Vec<(String, String)> = headers
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    fetcher.fetch_with_headers(url, owned, &queue, move |result| {
        let _ = result_tx.send(result);
    });
    drop(queue);

    main_loop.run().await;
    info!("completion loop drained");

    result_rx
        .await
        .context("fetch finished without delivering a result")?
        .with_context(|| format!("GET {url} failed"))
}

/// Logging setup: stderr, plus a JSON rolling log file when `LOG_FILE_PATH` is set.
fn init_logging() -> Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("warn".parse()?));

    let (json_layer, guard) = match std::env::var("LOG_FILE_PATH") {
        Ok(log_file_path) => {
            let log_dir = Path::new(&log_file_path)
                .parent()
                .unwrap_or(Path::new("logs"));
            let log_file_name = Path::new(&log_file_path)
                .file_name()
                .unwrap_or(OsStr::new("http_utility.log"));

            let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(true)
                .with_writer(non_blocking_file)
                .with_filter(
                    EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?),
                );
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_get_with_callback_returns_decoded_body() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/user")
                .header("X-Test", "cli")
                .header_exists("user-agent");
            then.status(200).json_body(json!({"id": 1, "name": "Ada"}));
        });

        let mut headers = HeaderConfig::from_json(r#"{"X-Test": "file"}"#).unwrap();
        headers.push("X-Test", "cli");

        let fetcher = build_fetcher().unwrap();
        let body = get_with_callback(&fetcher, &server.url("/user"), &headers)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(body, json!({"id": 1, "name": "Ada"}));
    }

    #[tokio::test]
    async fn test_get_with_callback_reports_fetch_error() {
        let fetcher = build_fetcher().unwrap();
        let err = get_with_callback(&fetcher, "not a url", &HeaderConfig::default())
            .await
            .unwrap_err();

        let cause = err.downcast_ref::<http_utility::FetchError>().unwrap();
        assert_eq!(cause.kind(), http_utility::ErrorKind::InvalidUrl);
    }
}
