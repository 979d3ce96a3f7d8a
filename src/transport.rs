//! HTTP transport seam.
//!
//! The client builds complete requests and hands them to a [`Transport`];
//! connection pooling, TLS and socket-level behaviour live behind it.
//! [`HttpTransport`] is the default, backed by a blocking reqwest client.

use crate::error::{ClickHouseLinkError, Result};
use crate::timeouts::ClickHouseLinkTimeouts;
use bytes::Bytes;
use log::debug;
use reqwest::Url;
use reqwest::blocking::multipart::Form;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use std::fmt;
use std::io::Read;

/// Body of an outgoing POST
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// Text fields sent as `multipart/form-data`
    Form(Vec<(String, String)>),
    /// Raw payload with an explicit content type
    Bytes { content_type: String, data: Vec<u8> },
}

/// A fully built POST request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl HttpRequest {
    /// Value of a form field, if this is a form request
    pub fn form_field(&self, name: &str) -> Option<&str> {
        match &self.body {
            RequestBody::Form(fields) => fields
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.as_str()),
            RequestBody::Bytes { .. } => None,
        }
    }
}

/// Response whose body has been read completely
#[derive(Debug, Clone)]
pub struct BufferedResponse {
    pub status: u16,
    pub body: Bytes,
}

/// Response whose body is still on the wire.
///
/// Dropping it closes the body and releases the connection.
pub struct StreamingResponse {
    pub status: u16,
    pub body: Box<dyn Read + Send>,
}

impl fmt::Debug for StreamingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamingResponse")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Sends POST requests to the server.
pub trait Transport: Send + Sync {
    /// Send a request and read the whole response body.
    fn post(&self, request: HttpRequest) -> Result<BufferedResponse>;

    /// Send a request and return as soon as the status line and headers
    /// arrive, leaving the body to be read incrementally.
    fn open_stream_post(&self, request: HttpRequest) -> Result<StreamingResponse>;
}

/// [`Transport`] over a pooled, blocking reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http_client: reqwest::blocking::Client,
}

impl HttpTransport {
    /// Build a pooled client with the given timeouts
    pub fn new(timeouts: &ClickHouseLinkTimeouts) -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder()
            .connect_timeout(timeouts.connection_timeout)
            .timeout(timeouts.total_timeout())
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(timeouts.pool_idle_timeout)
            .build()
            .map_err(|e| ClickHouseLinkError::ConfigurationError(e.to_string()))?;
        Ok(Self { http_client })
    }

    /// Reuse an existing reqwest client (and its pool)
    pub fn from_client(http_client: reqwest::blocking::Client) -> Self {
        Self { http_client }
    }

    fn send(&self, request: HttpRequest) -> Result<reqwest::blocking::Response> {
        let builder = self.http_client.post(request.url).headers(request.headers);
        let builder = match request.body {
            RequestBody::Form(fields) => {
                let form = fields
                    .into_iter()
                    .fold(Form::new(), |form, (name, value)| form.text(name, value));
                builder.multipart(form)
            }
            RequestBody::Bytes { content_type, data } => {
                builder.header(CONTENT_TYPE, content_type).body(data)
            }
        };
        Ok(builder.send()?)
    }
}

impl Transport for HttpTransport {
    fn post(&self, request: HttpRequest) -> Result<BufferedResponse> {
        let response = self.send(request)?;
        let status = response.status().as_u16();
        let body = match response.bytes() {
            Ok(body) => body,
            Err(e) if status != 200 => {
                debug!("[CH_HTTP] Error body unreadable: status={} error={}", status, e);
                Bytes::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(BufferedResponse { status, body })
    }

    fn open_stream_post(&self, request: HttpRequest) -> Result<StreamingResponse> {
        let response = self.send(request)?;
        Ok(StreamingResponse {
            status: response.status().as_u16(),
            body: Box::new(response),
        })
    }
}
