//! Delivery log storage.
//!
//! This module provides the append-only delivery log backed by a flat CSV
//! file, with a time-bounded cache of the parsed contents.
//!
//! Appends never rewrite the header or earlier rows. A successful append
//! drops the cache so the next [`DeliveryStore::load`] in this process sees
//! the new rows. Writes from other processes become visible once the cache
//! expires.

pub mod cache;
pub mod codec;

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::FixedOffset;
use csv::StringRecord;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::{DeliveryRecord, COLUMNS};

pub use cache::LogCache;

/// Append-only delivery log.
#[derive(Debug)]
pub struct DeliveryStore {
    /// Path to the CSV file.
    path: PathBuf,
    /// Business timezone used to read timestamps.
    offset: FixedOffset,
    /// How long a parsed read may be reused.
    cache_ttl: Duration,
    /// Last parsed read, if any.
    cache: Option<LogCache>,
}

impl DeliveryStore {
    /// Use the log at `path`. Nothing is touched on disk until the first
    /// load or append.
    #[must_use]
    pub fn open(path: impl AsRef<Path>, offset: FixedOffset, cache_ttl: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            offset,
            cache_ttl,
            cache: None,
        }
    }

    /// Use the log described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured business offset is invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::open(
            config.log_path(),
            config.business_offset()?,
            config.cache_ttl(),
        ))
    }

    /// Get the path to the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record in append order.
    ///
    /// Creates the log with the canonical header if it does not exist yet.
    /// Served from cache while the last read is fresh.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be created or read.
    pub fn load(&mut self) -> Result<Vec<DeliveryRecord>> {
        let now = Instant::now();
        if let Some(cache) = &self.cache {
            if cache.is_fresh(now, self.cache_ttl) {
                debug!("Serving {} cached records", cache.records().len());
                return Ok(cache.records().to_vec());
            }
        }

        let records = self.read_all()?;
        self.cache = Some(LogCache::new(records.clone(), now));
        Ok(records)
    }

    /// Append records after the existing rows.
    ///
    /// An empty slice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be opened or written.
    pub fn append(&mut self, records: &[DeliveryRecord]) -> Result<()> {
        if records.is_empty() {
            debug!("Nothing to append");
            return Ok(());
        }

        self.ensure_initialized()?;
        let needs_newline = !self.ends_with_newline().map_err(|e| self.write_error(e))?;

        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| self.write_error(e))?;
        if needs_newline {
            file.write_all(b"\n").map_err(|e| self.write_error(e))?;
        }

        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        for record in records {
            writer
                .write_record(codec::encode(record, self.offset))
                .map_err(|source| Error::LogWrite {
                    path: self.path.clone(),
                    source,
                })?;
        }
        writer.flush().map_err(|e| self.write_error(e))?;

        self.invalidate();
        info!(
            "Appended {} record(s) to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// Drop the cached read.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    fn read_all(&self) -> Result<Vec<DeliveryRecord>> {
        if self.is_missing_or_empty() {
            self.ensure_initialized()?;
            return Ok(Vec::new());
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_path(&self.path)
            .map_err(|source| self.read_error(source))?;

        let header = StringRecord::from_byte_record_lossy(
            reader
                .byte_headers()
                .map_err(|source| self.read_error(source))?
                .clone(),
        );
        if !codec::is_canonical_header(&header) {
            warn!(
                "Unexpected header in {}: {:?}; reading columns by position",
                self.path.display(),
                header
            );
        }

        let mut records = Vec::new();
        for row in reader.byte_records() {
            let row = row.map_err(|source| self.read_error(source))?;
            let line = row.position().map_or(0, csv::Position::line);
            match StringRecord::from_byte_record(row) {
                Ok(row) => records.extend(codec::decode(&row, self.offset)),
                Err(e) => warn!("Skipping log line {}: {}", line, e.utf8_error()),
            }
        }

        debug!(
            "Loaded {} records from {}",
            records.len(),
            self.path.display()
        );
        Ok(records)
    }

    fn is_missing_or_empty(&self) -> bool {
        std::fs::metadata(&self.path).map_or(true, |m| m.len() == 0)
    }

    /// Write the header if the log is missing or empty.
    fn ensure_initialized(&self) -> Result<()> {
        if !self.is_missing_or_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let mut writer = csv::Writer::from_path(&self.path).map_err(|source| Error::LogWrite {
            path: self.path.clone(),
            source,
        })?;
        writer
            .write_record(COLUMNS)
            .map_err(|source| Error::LogWrite {
                path: self.path.clone(),
                source,
            })?;
        writer.flush().map_err(|e| self.write_error(e))?;

        info!("Initialized delivery log at {}", self.path.display());
        Ok(())
    }

    /// Whether the file is empty or its last byte is a newline.
    fn ends_with_newline(&self) -> std::io::Result<bool> {
        let mut file = File::open(&self.path)?;
        if file.metadata()?.len() == 0 {
            return Ok(true);
        }
        file.seek(SeekFrom::End(-1))?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last)?;
        Ok(last[0] == b'\n')
    }

    fn read_error(&self, source: csv::Error) -> Error {
        Error::LogRead {
            path: self.path.clone(),
            source,
        }
    }

    fn write_error(&self, source: std::io::Error) -> Error {
        Error::LogWrite {
            path: self.path.clone(),
            source: csv::Error::from(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Courier;
    use crate::store::codec::parse_timestamp;
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    fn offset() -> FixedOffset {
        FixedOffset::west_opt(6 * 3600).unwrap()
    }

    fn create_test_store(dir: &tempfile::TempDir, ttl: Duration) -> DeliveryStore {
        DeliveryStore::open(dir.path().join("deliveries.csv"), offset(), ttl)
    }

    fn create_test_record(client: &str, amount: Decimal) -> DeliveryRecord {
        DeliveryRecord {
            user: Courier::Isra,
            client: client.to_string(),
            ticket: "T1".to_string(),
            amount,
            departure_time: parse_timestamp("2024-01-01 09:00:00", offset()),
            arrival_time: parse_timestamp("2024-01-01 09:30:00", offset()),
        }
    }

    #[test]
    fn test_load_initializes_missing_log() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);

        assert!(store.load().unwrap().is_empty());

        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(
            contents,
            "user,client,ticket,amount,departure_time,arrival_time\n"
        );
    }

    #[test]
    fn test_append_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);

        let first = create_test_record("Taller X", Decimal::new(15_000, 2));
        let second = create_test_record("Taller Y", Decimal::new(7_550, 2));
        store.append(&[first.clone()]).unwrap();
        store.append(&[second.clone()]).unwrap();

        assert_eq!(store.load().unwrap(), vec![first, second]);
    }

    #[test]
    fn test_append_preserves_prior_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);

        store
            .append(&[create_test_record("Taller X", Decimal::ONE)])
            .unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();
        store
            .append(&[create_test_record("Taller Y", Decimal::TWO)])
            .unwrap();
        let after = std::fs::read_to_string(store.path()).unwrap();

        assert!(after.starts_with(&before));
        assert_eq!(after.lines().count(), 3);
        assert!(after.ends_with("Taller Y,T1,2.00,2024-01-01 09:00:00,2024-01-01 09:30:00\n"));
    }

    #[test]
    fn test_append_quotes_delimiters() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);
        let record = create_test_record("Taller \"El Güero\", Centro", Decimal::TEN);

        store.append(&[record.clone()]).unwrap();
        assert_eq!(store.load().unwrap(), vec![record]);
    }

    #[test]
    fn test_append_empty_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);
        store.append(&[]).unwrap();
        assert!(!store.path().exists());
    }

    #[test]
    fn test_append_repairs_missing_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);
        std::fs::write(
            store.path(),
            "user,client,ticket,amount,departure_time,arrival_time\n\
             GABO,Taller Z,T9,5.00,2024-01-01 08:00:00,2024-01-01 08:10:00",
        )
        .unwrap();

        store
            .append(&[create_test_record("Taller X", Decimal::ONE)])
            .unwrap();
        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user, Courier::Gabo);
        assert_eq!(records[1].client, "Taller X");
    }

    #[test]
    fn test_load_is_cached_until_append() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::from_secs(60));
        assert!(store.load().unwrap().is_empty());

        // An out-of-band write is hidden by the cache...
        let mut raw = OpenOptions::new().append(true).open(store.path()).unwrap();
        writeln!(raw, "SAID,Fuera,T0,1.00,2024-01-01 07:00:00,2024-01-01 07:05:00").unwrap();
        assert!(store.load().unwrap().is_empty());

        // ...until our own append invalidates it.
        store
            .append(&[create_test_record("Taller X", Decimal::ONE)])
            .unwrap();
        let records = store.load().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].client, "Taller X");
    }

    #[test]
    fn test_load_twice_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);
        store
            .append(&[create_test_record("Taller X", Decimal::ONE)])
            .unwrap();

        assert_eq!(store.load().unwrap(), store.load().unwrap());
    }

    #[test]
    fn test_load_coerces_malformed_timestamps() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);
        std::fs::write(
            store.path(),
            "user,client,ticket,amount,departure_time,arrival_time\n\
             ISRA,Taller X,T1,150.00,not a time,2024-01-01 09:30:00\n",
        )
        .unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].departure_time.is_none());
        assert!(records[0].arrival_time.is_some());
    }

    #[test]
    fn test_load_skips_unparsable_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);
        std::fs::write(
            store.path(),
            "user,client,ticket,amount,departure_time,arrival_time\n\
             NADIE,Taller X,T1,150.00,,\n\
             ISRA,Taller Y,T2,abc,,\n\
             SAID,Taller Z,T3,1.50,,\n",
        )
        .unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user, Courier::Said);
    }

    #[test]
    fn test_load_reads_legacy_header_positionally() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);
        std::fs::write(
            store.path(),
            "Usuario,Cliente,Ticket,Monto,Hora de Salida,Hora de Llegada\n\
             GABO,Taller X,T1,99.9,2024-01-01 09:00:00,2024-01-01 09:30:00\n",
        )
        .unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amount, Decimal::new(999, 1));
    }

    #[test]
    fn test_open_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("log.csv");
        let mut store = DeliveryStore::open(&path, offset(), Duration::ZERO);

        store
            .append(&[create_test_record("Taller X", Decimal::ONE)])
            .unwrap();
        assert!(path.exists());
    }

    /// A log path that names a directory cannot be read or written by
    /// anyone, whatever the permissions of the current user.
    fn create_directory_store(dir: &tempfile::TempDir) -> DeliveryStore {
        let path = dir.path().join("deliveries.csv");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), "x").unwrap();
        DeliveryStore::open(path, offset(), Duration::ZERO)
    }

    #[test]
    fn test_append_to_unwritable_log_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_directory_store(&dir);

        let err = store
            .append(&[create_test_record("Taller X", Decimal::ONE)])
            .unwrap_err();
        assert!(matches!(err, Error::LogWrite { .. }));
        assert!(err.to_string().contains("deliveries.csv"));
    }

    #[test]
    fn test_load_unreadable_log_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_directory_store(&dir);

        let err = store.load().unwrap_err();
        assert!(matches!(err, Error::LogRead { .. }));
    }

    #[test]
    fn test_load_skips_invalid_utf8_rows() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);
        let mut raw = b"user,client,ticket,amount,departure_time,arrival_time\n".to_vec();
        raw.extend_from_slice(b"ISRA,Taller \xff,T1,1.00,,\n");
        raw.extend_from_slice(b"SAID,Taller Y,T2,2.00,,\n");
        std::fs::write(store.path(), raw).unwrap();

        let records = store.load().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].user, Courier::Said);
    }

    #[test]
    fn test_append_foreign_offset_round_trips_instant() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = create_test_store(&dir, Duration::ZERO);
        let utc = FixedOffset::east_opt(0).unwrap();
        let mut record = create_test_record("Taller X", Decimal::ONE);
        record.departure_time = Some(utc.with_ymd_and_hms(2024, 1, 2, 3, 0, 0).unwrap());
        record.arrival_time = Some(utc.with_ymd_and_hms(2024, 1, 2, 3, 45, 0).unwrap());

        store.append(&[record.clone()]).unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert!(contents.ends_with(",2024-01-01 21:00:00,2024-01-01 21:45:00\n"));

        let loaded = store.load().unwrap();
        assert_eq!(loaded, vec![record.clone()]);
        assert_eq!(
            loaded[0].departure_time.map(|t| t.timestamp()),
            record.departure_time.map(|t| t.timestamp())
        );
        assert_eq!(loaded[0].departure_time.unwrap().offset(), &offset());
    }
}
