//! Query execution over the ClickHouse HTTP interface.

use crate::{
    auth::Credentials,
    error::{ClickHouseLinkError, Result},
    models::{settings_url, QueryRequest},
    params::QueryParams,
    settings::{merge_settings, Settings},
    transport::{HttpRequest, RequestBody, StreamingResponse, Transport},
};
use bytes::Bytes;
use log::{debug, warn};
use reqwest::Url;
use reqwest::header::HeaderMap;
use std::io::Read;
use std::sync::Arc;
use std::time::Instant;

/// Builds query requests and dispatches them through the transport.
#[derive(Clone)]
pub struct QueryExecutor {
    base_url: Url,
    auth_headers: HeaderMap,
    transport: Arc<dyn Transport>,
    default_settings: Option<Settings>,
}

impl QueryExecutor {
    pub(crate) fn new(
        base_url: Url,
        credentials: &Credentials,
        transport: Arc<dyn Transport>,
        default_settings: Option<Settings>,
    ) -> Result<Self> {
        Ok(Self {
            base_url,
            auth_headers: credentials.headers()?,
            transport,
            default_settings,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn default_settings(&self) -> Option<&Settings> {
        self.default_settings.as_ref()
    }

    /// Build the multipart POST for a query.
    pub fn build_request(
        &self,
        query: &str,
        params: Option<&QueryParams>,
        settings: Option<&Settings>,
        format: Option<&str>,
    ) -> HttpRequest {
        let request = QueryRequest::new(query, format, params);
        let settings = merge_settings(self.default_settings.as_ref(), settings);
        HttpRequest {
            url: settings_url(&self.base_url, settings.as_deref()),
            headers: self.auth_headers.clone(),
            body: RequestBody::Form(request.form_fields()),
        }
    }

    /// POST arbitrary bytes to `url` with the auth headers attached.
    pub fn build_raw_request(&self, url: Url, content_type: &str, data: Vec<u8>) -> HttpRequest {
        HttpRequest {
            url,
            headers: self.auth_headers.clone(),
            body: RequestBody::Bytes {
                content_type: content_type.to_string(),
                data,
            },
        }
    }

    /// Send a query and return the whole response body.
    pub fn execute(
        &self,
        query: &str,
        params: Option<&QueryParams>,
        settings: Option<&Settings>,
    ) -> Result<Bytes> {
        debug!("[CH_QUERY] Starting query: \"{}\" (len={})", query_preview(query), query.len());
        let request = self.build_request(query, params, settings, None);
        self.post(request)
    }

    /// Send a prepared request and buffer the response.
    pub fn post(&self, request: HttpRequest) -> Result<Bytes> {
        let start = Instant::now();
        let response = self.transport.post(request)?;
        let duration_ms = start.elapsed().as_millis();
        debug!(
            "[CH_HTTP] Response received: status={} bytes={} duration_ms={}",
            response.status,
            response.body.len(),
            duration_ms
        );
        ensure_success_status(response.status, &response.body)?;
        Ok(response.body)
    }

    /// Send a query with `format` appended and leave the body unread.
    ///
    /// A non-success response is drained for its message and closed before
    /// the error is returned.
    pub fn open_stream(
        &self,
        query: &str,
        params: Option<&QueryParams>,
        settings: Option<&Settings>,
        format: &str,
    ) -> Result<StreamingResponse> {
        debug!(
            "[CH_QUERY] Opening stream: \"{}\" (len={}) format={}",
            query_preview(query),
            query.len(),
            format
        );
        let request = self.build_request(query, params, settings, Some(format));
        let start = Instant::now();
        let mut response = self.transport.open_stream_post(request)?;
        debug!(
            "[CH_HTTP] Stream opened: status={} duration_ms={}",
            response.status,
            start.elapsed().as_millis()
        );
        if response.status != 200 {
            let mut body = Vec::new();
            // whatever arrived before a read failure is still the message
            if let Err(e) = response.body.read_to_end(&mut body) {
                debug!(
                    "[CH_HTTP] Error body unreadable after {} bytes: {}",
                    body.len(),
                    e
                );
            }
            ensure_success_status(response.status, &body)?;
        }
        Ok(response)
    }
}

/// Fail with [`ClickHouseLinkError::ServerError`] unless `status` is 200.
pub fn ensure_success_status(status: u16, body: &[u8]) -> Result<()> {
    if status == 200 {
        return Ok(());
    }
    let body = String::from_utf8_lossy(body).into_owned();
    warn!(
        "[CH_HTTP] Server error: status={} message=\"{}\"",
        status,
        body.trim_end()
    );
    Err(ClickHouseLinkError::ServerError {
        status_code: status,
        body,
    })
}

/// Single-line preview of a query for log messages
pub(crate) fn query_preview(query: &str) -> String {
    let flat = query.split_whitespace().collect::<Vec<_>>().join(" ");
    match flat.char_indices().nth(80) {
        Some((idx, _)) => format!("{}...", &flat[..idx]),
        None => flat,
    }
}
