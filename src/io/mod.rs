//! I/O module
//!
//! Handles CSV parsing and output.
//!
//! # Components
//!
//! - `csv_format` - Event record conversion, field parsing and balance output
//! - `catalog` - Merchant and campaign catalog loading
//! - `sync_reader` - Synchronous CSV reader with iterator interface
//! - `async_reader` - Asynchronous CSV reader with batch reading interface

pub mod async_reader;
pub mod catalog;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use catalog::{read_campaigns, read_merchants, Catalog};
pub use csv_format::{convert_csv_record, write_balances_csv, CsvEventRecord};
pub use sync_reader::SyncReader;
