//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Subcommand, ValueEnum};

use crate::error::Error;
use crate::export::ExportFormat;
use crate::record::Courier;
use crate::report::ReportPeriod;

/// Start command arguments.
#[derive(Debug, Args)]
pub struct StartCommand {
    /// Courier starting the run
    #[arg(short, long, value_enum, ignore_case = true)]
    pub user: CourierArg,

    /// Start only this slot instead of every slot
    #[arg(short, long)]
    pub slot: Option<usize>,
}

/// Finish command arguments.
#[derive(Debug, Args)]
pub struct FinishCommand {
    /// Courier finishing the run
    #[arg(short, long, value_enum, ignore_case = true)]
    pub user: CourierArg,

    /// Slot of a single delivery (only with one -d; defaults to 1.. in order)
    #[arg(short, long)]
    pub slot: Option<usize>,

    /// One delivery: client, ticket and amount (repeatable)
    #[arg(
        short,
        long = "delivery",
        num_args = 3,
        value_names = ["CLIENT", "TICKET", "AMOUNT"],
        action = clap::ArgAction::Append,
        required = true
    )]
    pub delivery: Vec<String>,
}

/// One `-d CLIENT TICKET AMOUNT` triple, amount still unparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryArg {
    /// Slot this delivery belongs to.
    pub slot: usize,
    /// Client name as typed.
    pub client: String,
    /// Ticket as typed.
    pub ticket: String,
    /// Amount as typed.
    pub amount: String,
}

impl FinishCommand {
    /// Group the raw values into deliveries and assign their slots.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateSlot`] when `--slot` is given together with
    /// more than one delivery.
    pub fn deliveries(&self) -> crate::Result<Vec<DeliveryArg>> {
        if let Some(slot) = self.slot {
            if self.delivery.len() > 3 {
                return Err(Error::DuplicateSlot { slot });
            }
        }
        Ok(self
            .delivery
            .chunks(3)
            .enumerate()
            .filter_map(|(i, chunk)| match chunk {
                [client, ticket, amount] => Some(DeliveryArg {
                    slot: self.slot.unwrap_or(i + 1),
                    client: client.clone(),
                    ticket: ticket.clone(),
                    amount: amount.clone(),
                }),
                _ => None,
            })
            .collect())
    }
}

/// Ledger command arguments.
#[derive(Debug, Args)]
pub struct LedgerCommand {
    /// Courier whose ledger to show
    #[arg(short, long, value_enum, ignore_case = true)]
    pub user: CourierArg,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Report command arguments.
#[derive(Debug, Args)]
pub struct ReportCommand {
    /// Admin password
    #[arg(short, long)]
    pub password: Option<String>,

    /// Reporting period ending at --date
    #[arg(long, value_enum, default_value = "daily")]
    pub period: PeriodArg,

    /// Anchor date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Only this courier
    #[arg(long, value_enum, ignore_case = true)]
    pub courier: Option<CourierArg>,

    /// Number of top clients to list
    #[arg(long, default_value = "5")]
    pub top: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Export command arguments.
#[derive(Debug, Args)]
pub struct ExportCommand {
    /// Admin password
    #[arg(short, long)]
    pub password: Option<String>,

    /// Reporting period ending at --date
    #[arg(long, value_enum, default_value = "daily")]
    pub period: PeriodArg,

    /// Anchor date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Export format
    #[arg(short, long, value_enum, default_value = "csv")]
    pub format: ExportFormatArg,

    /// Write to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Courier argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "UPPER")]
pub enum CourierArg {
    /// ISRA
    Isra,
    /// SAID
    Said,
    /// GABO
    Gabo,
}

impl From<CourierArg> for Courier {
    fn from(arg: CourierArg) -> Self {
        match arg {
            CourierArg::Isra => Self::Isra,
            CourierArg::Said => Self::Said,
            CourierArg::Gabo => Self::Gabo,
        }
    }
}

/// Reporting period argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PeriodArg {
    /// The anchor day
    #[default]
    Daily,
    /// The seven days ending at the anchor
    Weekly,
    /// The anchor's month up to the anchor
    Monthly,
}

impl From<PeriodArg> for ReportPeriod {
    fn from(arg: PeriodArg) -> Self {
        match arg {
            PeriodArg::Daily => Self::Daily,
            PeriodArg::Weekly => Self::Weekly,
            PeriodArg::Monthly => Self::Monthly,
        }
    }
}

/// Export format argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormatArg {
    /// Comma-separated, spreadsheet friendly
    #[default]
    Csv,
    /// Tab-separated text
    Tsv,
    /// JSON array
    Json,
}

impl From<ExportFormatArg> for ExportFormat {
    fn from(arg: ExportFormatArg) -> Self {
        match arg {
            ExportFormatArg::Csv => Self::Csv,
            ExportFormatArg::Tsv => Self::Tsv,
            ExportFormatArg::Json => Self::Json,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
