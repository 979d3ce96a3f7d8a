//! Lazy record batch streams and table materialisation.

use crate::codec::BatchReader;
use crate::error::{ClickHouseLinkError, Result};
use arrow::array::Array;
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::SchemaRef;
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use log::debug;
use std::iter::FusedIterator;

/// Forward-only sequence of record batches read from one response.
///
/// The underlying response is released as soon as the stream is exhausted,
/// the first decode error is returned, or the stream is dropped. Iterating
/// again requires a new request.
pub struct BatchStream {
    reader: Option<BatchReader>,
    schema: SchemaRef,
    batches_read: usize,
}

impl BatchStream {
    pub(crate) fn new(reader: BatchReader) -> Self {
        let schema = reader.schema();
        Self {
            reader: Some(reader),
            schema,
            batches_read: 0,
        }
    }

    /// Schema announced by the stream (empty for a body with no data)
    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    /// Whether the response is still held open
    pub fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    fn release(&mut self, reason: &str) {
        if self.reader.take().is_some() {
            debug!(
                "[CH_STREAM] Released response: reason={} batches_read={}",
                reason, self.batches_read
            );
        }
    }
}

impl Iterator for BatchStream {
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;
        match reader.next() {
            Some(Ok(batch)) => {
                self.batches_read += 1;
                Some(Ok(batch))
            }
            Some(Err(e)) => {
                self.release("error");
                Some(Err(e.into()))
            }
            None => {
                self.release("exhausted");
                None
            }
        }
    }
}

impl FusedIterator for BatchStream {}

impl Drop for BatchStream {
    fn drop(&mut self) {
        self.release("dropped");
    }
}

/// Concatenate batches into one, typed by `schema` when given.
///
/// Without a schema the first batch defines it, so an empty input fails
/// with [`ClickHouseLinkError::EmptyResultWithoutSchema`].
pub fn concat_into_table(batches: &[RecordBatch], schema: Option<&SchemaRef>) -> Result<RecordBatch> {
    match (schema, batches.first()) {
        (Some(schema), _) => {
            let conformed = batches
                .iter()
                .map(|batch| conform_to_schema(batch, schema))
                .collect::<Result<Vec<_>>>()?;
            Ok(concat_batches(schema, &conformed)?)
        }
        (None, Some(first)) => Ok(concat_batches(&first.schema(), batches)?),
        (None, None) => Err(ClickHouseLinkError::EmptyResultWithoutSchema),
    }
}

/// Cast `batch` to `schema`. Column count and names must match; types are
/// converted with arrow's cast kernels.
pub fn conform_to_schema(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch> {
    if batch.schema_ref() == schema {
        return Ok(batch.clone());
    }
    if batch.num_columns() != schema.fields().len() {
        return Err(ArrowError::SchemaError(format!(
            "expected {} columns but the result has {}",
            schema.fields().len(),
            batch.num_columns()
        ))
        .into());
    }

    let columns = schema
        .fields()
        .iter()
        .zip(batch.schema_ref().fields().iter())
        .zip(batch.columns())
        .map(|((target, actual), column)| {
            if target.name() != actual.name() {
                return Err(ArrowError::SchemaError(format!(
                    "expected column '{}' but the result has '{}'",
                    target.name(),
                    actual.name()
                )));
            }
            if target.data_type() == column.data_type() {
                Ok(column.clone())
            } else {
                cast(column, target.data_type())
            }
        })
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(RecordBatch::try_new(schema.clone(), columns)?)
}
