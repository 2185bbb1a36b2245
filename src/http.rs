use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tracing::warn;

use crate::atlas::AtlasMeta;
use crate::config::{RetryPolicy, SourceRequest};
use crate::domain::SourceLocation;
use crate::error::CatalogError;
use crate::raw::RawDataset;
use crate::source::{CatalogSource, gunzip, read_local};

/// Fetches catalogue documents over HTTP; local paths in the request are
/// read from disk.
#[derive(Clone)]
pub struct HttpCatalogSource {
    client: Client,
    retry: RetryPolicy,
    dataset: SourceRequest,
    atlas_metadata: SourceRequest,
}

impl HttpCatalogSource {
    pub fn new(
        dataset: SourceRequest,
        atlas_metadata: SourceRequest,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("htan-catalog/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| CatalogError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| CatalogError::Http(err.to_string()))?;
        Ok(Self {
            client,
            retry,
            dataset,
            atlas_metadata,
        })
    }

    fn fetch(&self, request: &SourceRequest) -> Result<Vec<u8>, CatalogError> {
        let url = match &request.location {
            SourceLocation::Path(path) => return read_local(path, request.gzip),
            SourceLocation::Url(url) => url,
        };
        let response = send_with_retries(&self.retry, || self.client.get(url))?;
        let response = Self::handle_status(response)?;
        let bytes = response
            .bytes()
            .map_err(|err| CatalogError::Http(err.to_string()))?;
        if request.gzip {
            gunzip(&bytes)
        } else {
            Ok(bytes.to_vec())
        }
    }

    fn handle_status(response: Response) -> Result<Response, CatalogError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "catalogue request failed".to_string());
        Err(CatalogError::HttpStatus { status, message })
    }
}

impl CatalogSource for HttpCatalogSource {
    fn load_dataset(&self) -> Result<RawDataset, CatalogError> {
        RawDataset::from_slice(&self.fetch(&self.dataset)?)
    }

    fn load_atlas_metadata(&self) -> Result<Vec<AtlasMeta>, CatalogError> {
        AtlasMeta::list_from_slice(&self.fetch(&self.atlas_metadata)?)
    }
}

/// Sends a request, rebuilding and resending it while the policy allows and
/// the failure is transient (429, 5xx, timeouts, connection errors).
pub fn send_with_retries<F>(policy: &RetryPolicy, mut make_req: F) -> Result<Response, CatalogError>
where
    F: FnMut() -> RequestBuilder,
{
    let mut attempt = 0usize;
    loop {
        let failure = match make_req().send() {
            Ok(resp) if is_retryable_status(resp.status().as_u16()) => {
                if !policy.allows(attempt) {
                    return Ok(resp);
                }
                format!("status {}", resp.status().as_u16())
            }
            Ok(resp) => return Ok(resp),
            Err(err) if policy.allows(attempt) && is_retryable_error(&err) => err.to_string(),
            Err(err) => return Err(CatalogError::Http(err.to_string())),
        };
        let delay = policy.delay(attempt);
        warn!(
            attempt = attempt + 1,
            delay_ms = delay.as_millis() as u64,
            "transient catalogue fetch failure: {failure}; retrying"
        );
        thread::sleep(delay);
        attempt += 1;
    }
}

pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}
