// API client module: a small blocking HTTP client that POSTs bundle bodies
// to the FHIR endpoint. Synchronous on purpose: uploads run strictly one
// after another, each finishing before the next file is printed.

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use std::io;
use std::time::Duration;

/// Where the uploader sends each bundle body.
///
/// `Ok` carries the response status whatever it is; `Err` means no response
/// was received (connection refused, DNS failure, timeout...).
pub trait BundleSink {
    fn post_bundle(&self, body: Vec<u8>) -> Result<StatusCode>;
}

/// Blocking reqwest client bound to one endpoint URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    endpoint: String,
}

impl ApiClient {
    /// Build a client for `endpoint`. Without a timeout a request waits for
    /// the server as long as the connection stays open.
    pub fn new(endpoint: &str, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            endpoint: endpoint.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl BundleSink for ApiClient {
    /// POST the raw bytes with reqwest's default headers. The response body
    /// is read to the end and dropped.
    fn post_bundle(&self, body: Vec<u8>) -> Result<StatusCode> {
        let mut res = self
            .client
            .post(&self.endpoint)
            .body(body)
            .send()
            .with_context(|| format!("Failed to send bundle to {}", self.endpoint))?;
        let status = res.status();
        // A body that breaks off mid-read still leaves us with the status.
        let _ = io::copy(&mut res, &mut io::sink());
        Ok(status)
    }
}
