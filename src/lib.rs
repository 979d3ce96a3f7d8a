//! # clickhouse-link
//!
//! A small, blocking client for the ClickHouse HTTP interface that reads and
//! writes data as Apache Arrow.
//!
//! - Named query parameters are bound server-side from literals produced by
//!   [`bind`].
//! - Results come back as raw bytes ([`ClickHouseLinkClient::execute`]), a lazy
//!   [`BatchStream`] of record batches, or one concatenated [`RecordBatch`].
//! - [`ClickHouseLinkClient::insert`] bulk-loads a record batch.
//!
//! ```rust,no_run
//! use clickhouse_link::{ClickHouseLinkClient, QueryParams};
//!
//! # fn example() -> clickhouse_link::Result<()> {
//! let client = ClickHouseLinkClient::builder()
//!     .base_url("http://localhost:8123/")
//!     .password("test")
//!     .build()?;
//!
//! let params = QueryParams::new().with("expected", ("a", "b"));
//! for batch in client.read_batches("SELECT {expected:Tuple(String, String)}", Some(&params), None)? {
//!     println!("{} rows", batch?.num_rows());
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod models;
pub mod params;
pub mod query;
pub mod settings;
pub mod stream;
pub mod timeouts;
pub mod transport;

pub use arrow;
pub use arrow::record_batch::RecordBatch;
pub use auth::Credentials;
pub use client::{quote_identifier, ClickHouseLinkClient, ClickHouseLinkClientBuilder};
pub use codec::{ArrowIpcCodec, BatchReader, Codec, EmptyBatchReader};
pub use config::ClientConfig;
pub use error::{ClickHouseLinkError, Result};
pub use models::QueryRequest;
pub use params::{bind, ParamValue, QueryParams};
pub use settings::{merge_settings, Settings};
pub use stream::BatchStream;
pub use timeouts::{ClickHouseLinkTimeouts, ClickHouseLinkTimeoutsBuilder};
pub use transport::{
    BufferedResponse, HttpRequest, HttpTransport, RequestBody, StreamingResponse, Transport,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
