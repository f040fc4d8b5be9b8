//! Delivery registration flow.
//!
//! Ties the pieces together: sessions provide departure and arrival, the
//! builder validates each slot, and accepted records are appended to the
//! store in one batch.

use chrono::{DateTime, FixedOffset};
use tracing::{info, warn};

use crate::builder::{build_batch, validate, BatchOutcome, SlotInput};
use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::record::Courier;
use crate::session::{SessionStore, SessionTracker};
use crate::store::DeliveryStore;

/// What a finish submission produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Registration {
    /// Accepted records and rejected slots.
    pub outcome: BatchOutcome,
    /// Accepted slots that had no recorded departure.
    pub missing_departure: Vec<usize>,
}

impl Registration {
    /// Whether nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcome.is_empty()
    }
}

/// Registers deliveries for couriers.
#[derive(Debug)]
pub struct Registrar<S, C> {
    tracker: SessionTracker<S, C>,
    store: DeliveryStore,
    max_slots: usize,
}

impl<S: SessionStore, C: Clock> Registrar<S, C> {
    /// Create a registrar with `max_slots` slots per submission.
    pub fn new(tracker: SessionTracker<S, C>, store: DeliveryStore, max_slots: usize) -> Self {
        Self {
            tracker,
            store,
            max_slots,
        }
    }

    /// The clock sessions are stamped with.
    pub fn clock(&self) -> &C {
        self.tracker.clock()
    }

    /// The underlying delivery store.
    pub fn store_mut(&mut self) -> &mut DeliveryStore {
        &mut self.store
    }

    /// Start one slot, or every slot when `slot` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot is out of range or the session store
    /// cannot be written.
    pub fn start(
        &mut self,
        courier: Courier,
        slot: Option<usize>,
    ) -> Result<DateTime<FixedOffset>> {
        let slots: Vec<usize> = match slot {
            Some(slot) => vec![self.check_slot(slot)?],
            None => (1..=self.max_slots).collect(),
        };
        let at = self.tracker.start_many(courier, &slots)?;
        info!("{} started {} slot(s) at {}", courier, slots.len(), at);
        Ok(at)
    }

    /// Finish the given slots and append every valid one.
    ///
    /// Invalid slots are reported in the returned outcome. When no slot is
    /// valid nothing is written and the returned registration is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if a slot is out of range or repeated, if sessions
    /// cannot be read, or if the log cannot be written.
    pub fn finish(&mut self, courier: Courier, inputs: Vec<SlotInput>) -> Result<Registration> {
        let mut slots = Vec::with_capacity(inputs.len());
        for input in &inputs {
            let slot = self.check_slot(input.slot)?;
            if slots.contains(&slot) {
                return Err(Error::DuplicateSlot { slot });
            }
            slots.push(slot);
        }

        let finished = self.tracker.finish_many(courier, &slots)?;
        let paired: Vec<_> = inputs
            .into_iter()
            .zip(finished)
            .map(|(input, (_, session))| (input, session))
            .collect();

        let outcome = build_batch(courier, &paired);
        if outcome.is_empty() {
            warn!("{}: nothing valid to register", courier);
            return Ok(Registration {
                outcome,
                missing_departure: Vec::new(),
            });
        }

        self.store.append(&outcome.accepted)?;
        let missing_departure = paired
            .iter()
            .filter(|(input, session)| {
                session.departure_missing
                    && validate(&input.client, &input.ticket, input.amount).is_ok()
            })
            .map(|(input, _)| input.slot)
            .collect();
        Ok(Registration {
            outcome,
            missing_departure,
        })
    }

    fn check_slot(&self, slot: usize) -> Result<usize> {
        if (1..=self.max_slots).contains(&slot) {
            Ok(slot)
        } else {
            Err(Error::SlotOutOfRange {
                slot,
                max: self.max_slots,
            })
        }
    }
}
