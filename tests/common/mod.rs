#![allow(dead_code)]
//! Shared helpers for clickhouse-link tests.

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef};
use arrow::ipc::writer::StreamWriter;
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use clickhouse_link::{
    BufferedResponse, ClickHouseLinkClient, ClickHouseLinkError, HttpRequest, Result,
    StreamingResponse, Transport,
};
use std::collections::VecDeque;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Transport that records requests and replays canned responses in order.
#[derive(Default)]
pub struct MockTransport {
    requests: Mutex<Vec<HttpRequest>>,
    responses: Mutex<VecDeque<Canned>>,
    released: Mutex<Vec<Arc<AtomicBool>>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, status: u16, body: impl Into<Vec<u8>>) {
        self.push(status, body.into(), false);
    }

    /// Streaming response whose body yields `prefix` and then fails with
    /// `ConnectionReset`
    pub fn respond_broken(&self, status: u16, prefix: impl Into<Vec<u8>>) {
        self.push(status, prefix.into(), true);
    }

    fn push(&self, status: u16, body: Vec<u8>, broken: bool) {
        self.responses.lock().unwrap().push_back(Canned {
            status,
            body,
            broken,
        });
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }

    /// Whether the body of the n-th streaming response has been dropped
    pub fn stream_released(&self, n: usize) -> bool {
        self.released.lock().unwrap()[n].load(Ordering::SeqCst)
    }

    fn next_response(&self, request: HttpRequest) -> Result<Canned> {
        self.requests.lock().unwrap().push(request);
        self.responses.lock().unwrap().pop_front().ok_or_else(|| {
            ClickHouseLinkError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))
        })
    }
}

impl Transport for MockTransport {
    fn post(&self, request: HttpRequest) -> Result<BufferedResponse> {
        let canned = self.next_response(request)?;
        Ok(BufferedResponse {
            status: canned.status,
            body: Bytes::from(canned.body),
        })
    }

    fn open_stream_post(&self, request: HttpRequest) -> Result<StreamingResponse> {
        let canned = self.next_response(request)?;
        let released = Arc::new(AtomicBool::new(false));
        self.released.lock().unwrap().push(released.clone());
        Ok(StreamingResponse {
            status: canned.status,
            body: Box::new(TrackedBody {
                inner: Cursor::new(canned.body),
                broken: canned.broken,
                released,
            }),
        })
    }
}

struct Canned {
    status: u16,
    body: Vec<u8>,
    broken: bool,
}

/// Response body that flags when it is dropped
struct TrackedBody {
    inner: Cursor<Vec<u8>>,
    broken: bool,
    released: Arc<AtomicBool>,
}

impl Read for TrackedBody {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n == 0 && self.broken && !buf.is_empty() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "connection reset by peer",
            ));
        }
        Ok(n)
    }
}

impl Drop for TrackedBody {
    fn drop(&mut self) {
        self.released.store(true, Ordering::SeqCst);
    }
}

pub fn mock_client(transport: &Arc<MockTransport>) -> ClickHouseLinkClient {
    ClickHouseLinkClient::builder()
        .base_url("http://localhost:8123/")
        .user("default")
        .password("test")
        .transport(transport.clone())
        .build()
        .unwrap()
}

pub fn numbers_schema() -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new("ints", DataType::Int64, true),
        Field::new("strs", DataType::Utf8, true),
    ]))
}

/// `ints` over `range` with `strs` holding their decimal strings
pub fn numbers_batch(range: std::ops::Range<i64>) -> RecordBatch {
    let ints: Vec<i64> = range.collect();
    let strs: Vec<String> = ints.iter().map(|i| i.to_string()).collect();
    RecordBatch::try_new(
        numbers_schema(),
        vec![
            Arc::new(Int64Array::from(ints)),
            Arc::new(StringArray::from(strs)),
        ],
    )
    .unwrap()
}

/// Encode batches as an Arrow IPC stream, as ClickHouse sends `ArrowStream`
pub fn ipc_stream(schema: &SchemaRef, batches: &[RecordBatch]) -> Vec<u8> {
    let mut bytes = Vec::new();
    {
        let mut writer = StreamWriter::try_new(&mut bytes, schema).unwrap();
        for batch in batches {
            writer.write(batch).unwrap();
        }
        writer.finish().unwrap();
    }
    bytes
}

static UNIQUE_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn unique_ident(prefix: &str) -> String {
    let counter = UNIQUE_COUNTER.fetch_add(1, Ordering::Relaxed);
    let micros = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_micros();
    format!("{}_{}_{}", prefix, micros, counter)
}
