//! Synchronous CSV reader with iterator interface
//!
//! Provides a streaming iterator over loyalty events from a CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<LoyaltyEvent, LoyaltyError>` for each CSV row:
//!
//! ```no_run
//! use loyalty_rewards_engine::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("events.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(event) => println!("Processing event: {:?}", event),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors) are returned from `new()`
//! - Individual record errors are yielded as Err variants carrying the line number
//!
//! Records are read one at a time; the file is never loaded whole.

use crate::io::csv_format::{convert_csv_record, CsvEventRecord};
use crate::types::{LoyaltyError, LoyaltyEvent};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;

/// Open a file, reporting a missing file distinctly from other I/O failures
pub(crate) fn open(path: &Path) -> Result<File, LoyaltyError> {
    File::open(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => LoyaltyError::file_not_found(&path.display().to_string()),
        _ => LoyaltyError::from(e),
    })
}

/// Build the CSV reader settings shared by every input file
pub(crate) fn csv_reader<R: Read>(source: R) -> csv::Reader<R> {
    ReaderBuilder::new()
        .trim(Trim::All)
        .flexible(true)
        .buffer_capacity(8 * 1024)
        .from_reader(source)
}

/// Streaming reader over an events CSV file
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,

    /// Data rows read so far; the header is line 1
    line_num: u64,
}

impl SyncReader {
    /// Open an events file
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the path does not exist, `IoError` if it
    /// cannot be opened.
    pub fn new(path: &Path) -> Result<Self, LoyaltyError> {
        Ok(Self {
            reader: csv_reader(open(path)?),
            line_num: 0,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<LoyaltyEvent, LoyaltyError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CsvEventRecord>();
        let record = deserializer.next()?;
        self.line_num += 1;
        let line = self.line_num + 1;

        Some(match record {
            Ok(record) => convert_csv_record(record)
                .map_err(|e| LoyaltyError::parse_error(Some(line), e.to_string())),
            Err(e) => Err(LoyaltyError::parse_error(Some(line), e.to_string())),
        })
    }
}
