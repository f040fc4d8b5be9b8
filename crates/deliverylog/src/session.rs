//! Delivery sessions.
//!
//! A session is the departure instant a courier recorded for one slot with
//! `start`. `finish` reads it back alongside the arrival instant. Sessions
//! are not cleared on finish: a later `finish` on the same slot without a
//! new `start` sees the old departure.
//!
//! The departure store is an explicit [`SessionStore`] handed to the
//! [`SessionTracker`], so the CLI can persist sessions between invocations
//! while tests keep them in memory.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use tracing::{debug, warn};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::record::Courier;

/// Identifies one slot of one courier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionKey {
    /// Owning courier.
    pub courier: Courier,
    /// Slot number, starting at 1.
    pub slot: usize,
}

impl SessionKey {
    /// Create a key.
    #[must_use]
    pub fn new(courier: Courier, slot: usize) -> Self {
        Self { courier, slot }
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.courier, self.slot)
    }
}

/// Keyed storage of departure instants.
pub trait SessionStore: std::fmt::Debug {
    /// Departure recorded for `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn departure(&self, key: SessionKey) -> Result<Option<DateTime<FixedOffset>>>;

    /// Record a departure for each key, replacing earlier values.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set_departure(&mut self, keys: &[SessionKey], at: DateTime<FixedOffset>) -> Result<()>;
}

/// Sessions that live as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    departures: HashMap<SessionKey, DateTime<FixedOffset>>,
}

impl MemorySessionStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn departure(&self, key: SessionKey) -> Result<Option<DateTime<FixedOffset>>> {
        Ok(self.departures.get(&key).copied())
    }

    fn set_departure(&mut self, keys: &[SessionKey], at: DateTime<FixedOffset>) -> Result<()> {
        for key in keys {
            self.departures.insert(*key, at);
        }
        Ok(())
    }
}

/// Sessions kept in a small JSON file, keyed `COURIER#slot`.
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Use the session file at `path`; it is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path to the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, DateTime<FixedOffset>>> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(Error::SessionRead {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        match serde_json::from_str(&raw) {
            Ok(map) => Ok(map),
            Err(e) => {
                warn!(
                    "Ignoring unreadable session file {}: {}",
                    self.path.display(),
                    e
                );
                Ok(BTreeMap::new())
            }
        }
    }
}

impl SessionStore for FileSessionStore {
    fn departure(&self, key: SessionKey) -> Result<Option<DateTime<FixedOffset>>> {
        Ok(self.read_all()?.get(&key.to_string()).copied())
    }

    fn set_departure(&mut self, keys: &[SessionKey], at: DateTime<FixedOffset>) -> Result<()> {
        let mut all = self.read_all()?;
        for key in keys {
            all.insert(key.to_string(), at);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let json = serde_json::to_string_pretty(&all)?;
        std::fs::write(&self.path, json).map_err(|source| Error::SessionWrite {
            path: self.path.clone(),
            source,
        })
    }
}

/// Departure and arrival of one finished slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinishedSession {
    /// Recorded departure, or the arrival when none was recorded.
    pub departure: DateTime<FixedOffset>,
    /// Arrival instant.
    pub arrival: DateTime<FixedOffset>,
    /// No `start` was seen for the slot; the record will have zero duration.
    pub departure_missing: bool,
}

/// Tracks start/finish per courier and slot.
#[derive(Debug)]
pub struct SessionTracker<S, C> {
    store: S,
    clock: C,
}

impl<S: SessionStore, C: Clock> SessionTracker<S, C> {
    /// Create a tracker over `store`, reading time from `clock`.
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// The clock used for departures and arrivals.
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Record "now" as the departure of one slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub fn start(&mut self, courier: Courier, slot: usize) -> Result<DateTime<FixedOffset>> {
        self.start_many(courier, &[slot])
    }

    /// Record one shared departure for several slots.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be written.
    pub fn start_many(
        &mut self,
        courier: Courier,
        slots: &[usize],
    ) -> Result<DateTime<FixedOffset>> {
        let now = self.clock.now();
        let keys: Vec<SessionKey> = slots
            .iter()
            .map(|slot| SessionKey::new(courier, *slot))
            .collect();
        self.store.set_departure(&keys, now)?;
        debug!("Started {} slot(s) for {} at {}", keys.len(), courier, now);
        Ok(now)
    }

    /// Pair "now" with the recorded departure of one slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub fn finish(&self, courier: Courier, slot: usize) -> Result<FinishedSession> {
        let arrival = self.clock.now();
        self.finish_at(SessionKey::new(courier, slot), arrival)
    }

    /// Finish several slots with one shared arrival instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the session store cannot be read.
    pub fn finish_many(
        &self,
        courier: Courier,
        slots: &[usize],
    ) -> Result<Vec<(usize, FinishedSession)>> {
        let arrival = self.clock.now();
        slots
            .iter()
            .map(|slot| {
                self.finish_at(SessionKey::new(courier, *slot), arrival)
                    .map(|finished| (*slot, finished))
            })
            .collect()
    }

    fn finish_at(
        &self,
        key: SessionKey,
        arrival: DateTime<FixedOffset>,
    ) -> Result<FinishedSession> {
        match self.store.departure(key)? {
            Some(departure) => Ok(FinishedSession {
                departure,
                arrival,
                departure_missing: false,
            }),
            None => {
                warn!("No departure recorded for {}; using arrival time", key);
                Ok(FinishedSession {
                    departure: arrival,
                    arrival,
                    departure_missing: true,
                })
            }
        }
    }
}
