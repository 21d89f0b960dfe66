//! A small generic HTTP GET client: fetch a URL, decode the JSON body into a
//! caller-chosen type, and get back either the value or one of four
//! classified errors.

pub mod config;
pub mod error;
pub mod fetch;

pub use error::{ErrorKind, FetchError, Result};
pub use fetch::{
    BasicClient, CompletionLoop, CompletionQueue, Fetcher, HttpClient, completion_queue,
    parse_url,
};
