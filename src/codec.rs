//! Columnar codec seam.
//!
//! Decodes response bodies into record batches and encodes insert payloads.
//! [`ArrowIpcCodec`] speaks Arrow IPC, which ClickHouse exposes as the
//! `ArrowStream` (read) and `Arrow` (insert) formats.

use crate::error::Result;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::error::ArrowError;
use arrow::ipc::reader::StreamReader;
use arrow::ipc::writer::FileWriter;
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use std::io::{BufRead, BufReader, Read};
use std::sync::Arc;

/// Lazily decoded batches backed by a live response body
pub type BatchReader = Box<dyn RecordBatchReader + Send>;

/// Converts between wire bytes and Arrow record batches.
pub trait Codec: Send + Sync {
    /// Start decoding a response body. Batches are read on demand.
    fn open_stream(&self, source: Box<dyn Read + Send>) -> Result<BatchReader>;

    /// Encode a batch as an insert payload.
    fn serialize(&self, data: &RecordBatch) -> Result<Vec<u8>>;

    /// Output format appended to streaming reads
    fn stream_format(&self) -> &str {
        "ArrowStream"
    }

    /// Input format named in insert statements
    fn insert_format(&self) -> &str {
        "Arrow"
    }
}

/// Arrow IPC codec: stream format in, file format out.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArrowIpcCodec;

impl Codec for ArrowIpcCodec {
    fn open_stream(&self, source: Box<dyn Read + Send>) -> Result<BatchReader> {
        let mut source = BufReader::new(source);
        // A zero-row result may arrive as an entirely empty body.
        if source.fill_buf()?.is_empty() {
            return Ok(Box::new(EmptyBatchReader::default()));
        }
        Ok(Box::new(StreamReader::try_new(source, None)?))
    }

    fn serialize(&self, data: &RecordBatch) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut writer = FileWriter::try_new(&mut buf, data.schema_ref())?;
            writer.write(data)?;
            writer.finish()?;
        }
        Ok(buf)
    }
}

/// Batch reader for a body that carried no data at all.
#[derive(Debug, Clone)]
pub struct EmptyBatchReader {
    schema: SchemaRef,
}

impl Default for EmptyBatchReader {
    fn default() -> Self {
        Self {
            schema: Arc::new(Schema::empty()),
        }
    }
}

impl Iterator for EmptyBatchReader {
    type Item = std::result::Result<RecordBatch, ArrowError>;

    fn next(&mut self) -> Option<Self::Item> {
        None
    }
}

impl RecordBatchReader for EmptyBatchReader {
    fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }
}
