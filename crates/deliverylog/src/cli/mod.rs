//! Command-line interface for deliverylog.
//!
//! This module provides the CLI structure and command handlers for the
//! `delivlog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, CourierArg, DeliveryArg, ExportCommand, ExportFormatArg, FinishCommand,
    LedgerCommand, OutputFormat, PeriodArg, ReportCommand, StartCommand,
};

/// delivlog - Courier delivery log
///
/// Couriers record departure and arrival, client, ticket and amount for
/// each delivery; admins review daily, weekly and monthly totals.
#[derive(Debug, Parser)]
#[command(name = "delivlog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record the departure of one slot or all slots
    Start(StartCommand),

    /// Record arrival and register deliveries
    Finish(FinishCommand),

    /// Show a courier's own deliveries
    Ledger(LedgerCommand),

    /// Admin dashboard for a period
    Report(ReportCommand),

    /// Export a period's deliveries
    Export(ExportCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
