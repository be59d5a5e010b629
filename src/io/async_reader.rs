//! Asynchronous CSV reader with batch interface
//!
//! Provides batch reads of loyalty events from any `futures` `AsyncRead`,
//! using csv-async for streaming parsing.
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of LoyaltyEvents
//!                  ↓
//!           csv_format module
//!           (CsvEventRecord, convert_csv_record)
//! ```
//!
//! Malformed records are logged and skipped; they never end a batch early.

use crate::io::csv_format::{convert_csv_record, CsvEventRecord};
use crate::types::LoyaltyEvent;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Batch reader over an events CSV stream
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,

    /// Data rows read so far; the header is line 1
    line_num: u64,

    /// Rows dropped because they could not be parsed or converted
    skipped: usize,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 0,
            skipped: 0,
        }
    }

    /// Read up to `batch_size` valid events
    ///
    /// Returns fewer only when the stream is exhausted; an empty batch means
    /// end of input.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<LoyaltyEvent> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvEventRecord>();

        while batch.len() < batch_size {
            let Some(record) = records.next().await else {
                break;
            };
            self.line_num += 1;
            let line = self.line_num + 1;

            match record {
                Ok(record) => match convert_csv_record(record) {
                    Ok(event) => batch.push(event),
                    Err(e) => {
                        self.skipped += 1;
                        warn!(line, error = %e, "skipping invalid event");
                    }
                },
                Err(e) => {
                    self.skipped += 1;
                    warn!(line, error = %e, "skipping unparseable row");
                }
            }
        }

        batch
    }

    /// Rows skipped so far across every batch
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}
