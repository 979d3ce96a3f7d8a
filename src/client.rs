//! Main ClickHouse client with builder pattern.
//!
//! Queries go out as multipart POSTs to the HTTP interface; results come back
//! either as raw bytes or as Arrow record batches decoded while they stream.

use crate::{
    auth::Credentials,
    codec::{ArrowIpcCodec, BatchReader, Codec},
    config::{ClientConfig, DEFAULT_URL},
    error::{ClickHouseLinkError, Result},
    params::QueryParams,
    query::{query_preview, QueryExecutor},
    settings::Settings,
    stream::{concat_into_table, BatchStream},
    timeouts::ClickHouseLinkTimeouts,
    transport::{HttpTransport, Transport},
};
use arrow::datatypes::SchemaRef;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use log::debug;
use reqwest::Url;
use std::sync::Arc;
use std::time::Instant;

const OCTET_STREAM: &str = "application/octet-stream";

/// ClickHouse HTTP client.
///
/// Configuration is fixed at construction; the client itself holds no
/// mutable state, so clones share the transport's connection pool.
///
/// # Examples
///
/// ```rust,no_run
/// use clickhouse_link::{ClickHouseLinkClient, QueryParams, Settings};
///
/// # fn example() -> clickhouse_link::Result<()> {
/// let client = ClickHouseLinkClient::builder()
///     .base_url("http://localhost:8123/")
///     .user("default")
///     .password("test")
///     .build()?;
///
/// let params = QueryParams::new().with("i", 10);
/// let table = client.read_table("SELECT {i:Int64} AS i", Some(&params), None, None)?;
/// assert_eq!(table.num_rows(), 1);
///
/// let raw = client.execute(
///     "SELECT ints FROM numbers FORMAT JSONEachRow",
///     None,
///     Some(&Settings::new().with("limit", 1)),
/// )?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ClickHouseLinkClient {
    query_executor: QueryExecutor,
    codec: Arc<dyn Codec>,
}

impl ClickHouseLinkClient {
    /// Create a new builder for configuring the client
    pub fn builder() -> ClickHouseLinkClientBuilder {
        ClickHouseLinkClientBuilder::new()
    }

    /// Client for `http://localhost:8123/` as user `default` with no password
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Build a client from a [`ClientConfig`]
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn base_url(&self) -> &Url {
        self.query_executor.base_url()
    }

    pub fn default_settings(&self) -> Option<&Settings> {
        self.query_executor.default_settings()
    }

    /// Execute a raw query and return the response body unchanged.
    ///
    /// No output format is added; append a `FORMAT` clause to `query` to pick
    /// one.
    ///
    /// # Arguments
    /// * `query` - The query text
    /// * `params` - Optional named parameters, bound server-side
    /// * `settings` - Optional settings, merged over the client defaults
    pub fn execute(
        &self,
        query: &str,
        params: Option<&QueryParams>,
        settings: Option<&Settings>,
    ) -> Result<Bytes> {
        self.query_executor.execute(query, params, settings)
    }

    /// Execute a query in the codec's streaming format and return a reader
    /// over the live response.
    ///
    /// The response stays open while the reader is alive and is closed when it
    /// is dropped.
    pub fn open_stream(
        &self,
        query: &str,
        params: Option<&QueryParams>,
        settings: Option<&Settings>,
    ) -> Result<BatchReader> {
        let response = self.query_executor.open_stream(
            query,
            params,
            settings,
            self.codec.stream_format(),
        )?;
        self.codec.open_stream(response.body)
    }

    /// Execute a query and iterate over its record batches as they arrive.
    ///
    /// The request is sent immediately. The returned stream can be consumed
    /// once; run the query again for a second pass.
    pub fn read_batches(
        &self,
        query: &str,
        params: Option<&QueryParams>,
        settings: Option<&Settings>,
    ) -> Result<BatchStream> {
        Ok(BatchStream::new(self.open_stream(query, params, settings)?))
    }

    /// Execute a query and collect the whole result into one batch.
    ///
    /// With `schema`, every batch is cast to it and an empty result is an
    /// empty batch of that schema. Without one, an empty result fails with
    /// [`ClickHouseLinkError::EmptyResultWithoutSchema`].
    pub fn read_table(
        &self,
        query: &str,
        params: Option<&QueryParams>,
        settings: Option<&Settings>,
        schema: Option<SchemaRef>,
    ) -> Result<RecordBatch> {
        let start = Instant::now();
        let batches = self
            .read_batches(query, params, settings)?
            .collect::<Result<Vec<_>>>()?;
        let table = concat_into_table(&batches, schema.as_ref())?;
        debug!(
            "[CH_QUERY] Read table: batches={} rows={} total_ms={}",
            batches.len(),
            table.num_rows(),
            start.elapsed().as_millis()
        );
        Ok(table)
    }

    /// Insert `data` into `table`.
    ///
    /// Column names of `data` must match columns of `table`.
    pub fn insert(&self, table: &str, data: &RecordBatch) -> Result<()> {
        let columns = data
            .schema_ref()
            .fields()
            .iter()
            .map(|f| quote_identifier(f.name()))
            .collect::<Vec<_>>()
            .join(", ");
        let query = format!(
            "INSERT INTO {} ({}) FORMAT {}",
            table,
            columns,
            self.codec.insert_format()
        );
        debug!(
            "[CH_INSERT] Inserting rows={} into: \"{}\"",
            data.num_rows(),
            query_preview(&query)
        );

        let mut url = self.base_url().clone();
        url.query_pairs_mut().append_pair("query", &query);
        let body = self.codec.serialize(data)?;
        let request = self.query_executor.build_raw_request(url, OCTET_STREAM, body);

        let start = Instant::now();
        self.query_executor.post(request)?;
        debug!("[CH_INSERT] Inserted rows={} in {:?}", data.num_rows(), start.elapsed());
        Ok(())
    }
}

/// Backtick-quote an identifier, escaping `\` and `` ` ``.
pub fn quote_identifier(name: &str) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push('`');
    for c in name.chars() {
        if c == '`' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('`');
    quoted
}

/// Builder for configuring [`ClickHouseLinkClient`] instances.
pub struct ClickHouseLinkClientBuilder {
    base_url: String,
    credentials: Credentials,
    default_settings: Option<Settings>,
    timeouts: ClickHouseLinkTimeouts,
    transport: Option<Arc<dyn Transport>>,
    codec: Arc<dyn Codec>,
}

impl ClickHouseLinkClientBuilder {
    fn new() -> Self {
        Self {
            base_url: DEFAULT_URL.to_string(),
            credentials: Credentials::default(),
            default_settings: None,
            timeouts: ClickHouseLinkTimeouts::default(),
            transport: None,
            codec: Arc::new(ArrowIpcCodec),
        }
    }

    /// Set the base URL of the HTTP interface
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn user(mut self, user: impl Into<String>) -> Self {
        let password = self.credentials.password().to_string();
        self.credentials = Credentials::new(user, password);
        self
    }

    pub fn password(mut self, password: impl Into<String>) -> Self {
        let user = self.credentials.user().to_string();
        self.credentials = Credentials::new(user, password);
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Settings sent with every query; per-call settings win on shared keys
    pub fn default_settings(mut self, settings: Settings) -> Self {
        self.default_settings = Some(settings);
        self
    }

    /// Timeouts for the default transport. Ignored when a transport is set.
    pub fn timeouts(mut self, timeouts: ClickHouseLinkTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Use a custom transport, e.g. one sharing a pool with other clients
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn codec(mut self, codec: Arc<dyn Codec>) -> Self {
        self.codec = codec;
        self
    }

    /// Apply every field of a [`ClientConfig`]
    pub fn config(mut self, config: &ClientConfig) -> Self {
        self.base_url = config.url.clone();
        self.credentials = config.credentials();
        self.default_settings = config.settings();
        self.timeouts = config.timeouts();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<ClickHouseLinkClient> {
        let base_url = Url::parse(&self.base_url).map_err(|e| {
            ClickHouseLinkError::ConfigurationError(format!(
                "invalid base_url '{}': {}",
                self.base_url, e
            ))
        })?;

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(&self.timeouts)?),
        };
        debug!("[CLIENT] Configured for url={} user={}", base_url, self.credentials.user());

        let query_executor =
            QueryExecutor::new(base_url, &self.credentials, transport, self.default_settings)?;

        Ok(ClickHouseLinkClient {
            query_executor,
            codec: self.codec,
        })
    }
}
