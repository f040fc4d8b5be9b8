//! `deliverylog` - Delivery logging and reporting for courier runs
//!
//! Couriers start and finish deliveries; finished deliveries are validated
//! and appended to a flat CSV log; reports group and sum that log by
//! courier and date window.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod access;
pub mod builder;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod record;
pub mod registration;
pub mod report;
pub mod session;
pub mod store;

pub use access::AccessDecision;
pub use builder::{build, build_batch, BatchOutcome, RejectReason, RejectedSlot, SlotInput};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::{Error, Result};
pub use export::{write_export, ExportFormat};
pub use logging::init_logging;
pub use record::{Courier, DeliveryRecord};
pub use registration::{Registrar, Registration};
pub use report::{CourierSummary, Dashboard, Ledger, ReportPeriod};
pub use session::{
    FileSessionStore, FinishedSession, MemorySessionStore, SessionStore, SessionTracker,
};
pub use store::DeliveryStore;
