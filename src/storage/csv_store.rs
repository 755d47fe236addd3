use crate::model::{FlatRecord, StorageError};

use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Column order is a compatibility contract: consumers of the log file depend
/// on these names and this order staying stable across releases.
pub const HEADER: [&str; 15] = [
    "logged_at",
    "search_date",
    "origin",
    "destination",
    "dep_airport",
    "dep_time",
    "arr_airport",
    "arr_time",
    "airline",
    "flight_no",
    "stops",
    "duration",
    "price_total",
    "currency",
    "baggage",
];

/// Append-only CSV log of flattened offers. The file moves through
/// missing → header-only → header + N rows; existing rows are never
/// rewritten or reordered. Assumes a single writer process per path.
pub struct CsvStore {
    path: PathBuf,
}

impl CsvStore {
    /// Opens the store, writing the header row if the file is new or empty.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let store = Self {
            path: path.as_ref().to_path_buf(),
        };
        store.ensure_initialized()?;
        Ok(store)
    }

    /// Writes exactly one header row iff the file is missing or zero-length.
    /// Calling it on an already-initialized file is a no-op.
    pub fn ensure_initialized(&self) -> Result<(), StorageError> {
        let needs_header = match fs::metadata(&self.path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if !needs_header {
            return Ok(());
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .open(&self.path)?;
        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush()?;
        Ok(())
    }

    /// Appends one row per record, in the given order, and flushes before
    /// returning. Existing bytes in the file are never touched. An empty
    /// batch writes nothing.
    pub fn append(&self, records: &[FlatRecord]) -> Result<(), StorageError> {
        if records.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new().append(true).create(true).open(&self.path)?;
        let mut writer = csv::Writer::from_writer(file);
        for record in records {
            let stops = record.stops.to_string();
            writer.write_record([
                record.logged_at.as_str(),
                record.search_date.as_str(),
                record.origin.as_str(),
                record.destination.as_str(),
                record.dep_airport.as_str(),
                record.dep_time.as_str(),
                record.arr_airport.as_str(),
                record.arr_time.as_str(),
                record.airline.as_str(),
                record.flight_no.as_str(),
                stops.as_str(),
                record.duration.as_str(),
                record.price_total.as_str(),
                record.currency.as_str(),
                record.baggage.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}
