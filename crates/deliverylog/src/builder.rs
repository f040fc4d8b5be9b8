//! Record builder.
//!
//! Turns the form fields of one slot plus a finished session into at most
//! one [`DeliveryRecord`]. Invalid slots are filtered, not failed; batches
//! keep the rejected slots and their reasons so the caller can warn.

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;
use tracing::debug;

use crate::record::{Courier, DeliveryRecord};
use crate::session::FinishedSession;

/// Fields a courier fills in for one delivery slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotInput {
    /// Slot number, starting at 1.
    pub slot: usize,
    /// Destination or customer.
    pub client: String,
    /// Ticket identifier.
    pub ticket: String,
    /// Amount collected.
    pub amount: Decimal,
}

/// Why a slot produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// The client field was blank.
    EmptyClient,
    /// The ticket field was blank.
    EmptyTicket,
    /// The amount was zero or negative after rounding to cents.
    NonPositiveAmount,
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyClient => write!(f, "client is empty"),
            Self::EmptyTicket => write!(f, "ticket is empty"),
            Self::NonPositiveAmount => write!(f, "amount must be greater than 0"),
        }
    }
}

/// A slot that was filtered out of a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedSlot {
    /// Slot number.
    pub slot: usize,
    /// First failed check.
    pub reason: RejectReason,
}

/// Result of building a whole submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// Records ready to append, in slot order.
    pub accepted: Vec<DeliveryRecord>,
    /// Slots that produced nothing.
    pub rejected: Vec<RejectedSlot>,
}

impl BatchOutcome {
    /// Whether nothing in the batch is worth appending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Check one slot's fields.
///
/// Client and ticket are compared after trimming; the amount after rounding
/// to two decimal places.
///
/// # Errors
///
/// Returns the first check that failed.
pub fn validate(client: &str, ticket: &str, amount: Decimal) -> Result<(), RejectReason> {
    if client.trim().is_empty() {
        return Err(RejectReason::EmptyClient);
    }
    if ticket.trim().is_empty() {
        return Err(RejectReason::EmptyTicket);
    }
    if amount.round_dp(2) <= Decimal::ZERO {
        return Err(RejectReason::NonPositiveAmount);
    }
    Ok(())
}

/// Build a record, or nothing if the fields are invalid.
#[must_use]
pub fn build(
    user: Courier,
    client: &str,
    ticket: &str,
    amount: Decimal,
    departure: DateTime<FixedOffset>,
    arrival: DateTime<FixedOffset>,
) -> Option<DeliveryRecord> {
    validate(client, ticket, amount).ok()?;
    Some(assemble(user, client, ticket, amount, departure, arrival))
}

fn assemble(
    user: Courier,
    client: &str,
    ticket: &str,
    amount: Decimal,
    departure: DateTime<FixedOffset>,
    arrival: DateTime<FixedOffset>,
) -> DeliveryRecord {
    DeliveryRecord {
        user,
        client: client.trim().to_string(),
        ticket: ticket.trim().to_string(),
        amount: amount.round_dp(2),
        departure_time: Some(departure),
        arrival_time: Some(arrival),
    }
}

/// Build every slot independently and partition the results.
///
/// Each input is paired with the session finished for its slot.
#[must_use]
pub fn build_batch(user: Courier, slots: &[(SlotInput, FinishedSession)]) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for (input, session) in slots {
        match validate(&input.client, &input.ticket, input.amount) {
            Ok(()) => outcome.accepted.push(assemble(
                user,
                &input.client,
                &input.ticket,
                input.amount,
                session.departure,
                session.arrival,
            )),
            Err(reason) => {
                debug!("Slot {} rejected: {}", input.slot, reason);
                outcome.rejected.push(RejectedSlot {
                    slot: input.slot,
                    reason,
                });
            }
        }
    }
    outcome
}
