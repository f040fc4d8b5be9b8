//! `delivlog` - CLI for deliverylog
//!
//! Couriers start and finish deliveries; admins read reports and exports
//! behind the shared password.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::Context;
use clap::Parser;
use rust_decimal::Decimal;

use deliverylog::cli::{
    Cli, Command, ConfigCommand, ExportCommand, FinishCommand, LedgerCommand, OutputFormat,
    ReportCommand, StartCommand,
};
use deliverylog::record::format_timestamp;
use deliverylog::{
    init_logging, write_export, AccessDecision, Clock, Config, Courier, Dashboard, DeliveryRecord,
    DeliveryStore, Error, FileSessionStore, Ledger, Registrar, SessionTracker, SlotInput,
    SystemClock,
};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    // Execute the command
    match cli.command {
        Command::Start(cmd) => handle_start(&config, &cmd),
        Command::Finish(cmd) => handle_finish(&config, &cmd),
        Command::Ledger(cmd) => handle_ledger(&config, &cmd),
        Command::Report(cmd) => handle_report(&config, &cmd),
        Command::Export(cmd) => handle_export(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn registrar(config: &Config) -> anyhow::Result<Registrar<FileSessionStore, SystemClock>> {
    let clock = SystemClock::new(config.business_offset()?);
    let tracker = SessionTracker::new(FileSessionStore::new(config.session_path()), clock);
    let store = DeliveryStore::from_config(config)?;
    Ok(Registrar::new(tracker, store, config.business.max_slots))
}

fn handle_start(config: &Config, cmd: &StartCommand) -> anyhow::Result<()> {
    let courier = Courier::from(cmd.user);
    let at = registrar(config)?.start(courier, cmd.slot)?;
    match cmd.slot {
        Some(slot) => println!("{courier} slot {slot} departed at {}", format_timestamp(&at)),
        None => println!("{courier} departed at {}", format_timestamp(&at)),
    }
    Ok(())
}

fn handle_finish(config: &Config, cmd: &FinishCommand) -> anyhow::Result<()> {
    let courier = Courier::from(cmd.user);
    let inputs = cmd
        .deliveries()?
        .into_iter()
        .map(|d| {
            let amount = d
                .amount
                .trim()
                .parse::<Decimal>()
                .map_err(|_| Error::InvalidAmount {
                    value: d.amount.clone(),
                })?;
            Ok(SlotInput {
                slot: d.slot,
                client: d.client,
                ticket: d.ticket,
                amount,
            })
        })
        .collect::<deliverylog::Result<Vec<_>>>()?;

    let registration = registrar(config)?.finish(courier, inputs)?;

    for rejected in &registration.outcome.rejected {
        eprintln!("slot {}: {}", rejected.slot, rejected.reason);
    }
    if registration.is_empty() {
        eprintln!("Warning: nothing valid to register");
        return Err(Error::EmptyBatch.into());
    }
    for slot in &registration.missing_departure {
        eprintln!("Warning: slot {slot} had no recorded departure; arrival time used");
    }

    println!(
        "Registered {} deliver{} for {courier}",
        registration.outcome.accepted.len(),
        if registration.outcome.accepted.len() == 1 { "y" } else { "ies" }
    );
    Ok(())
}

fn handle_ledger(config: &Config, cmd: &LedgerCommand) -> anyhow::Result<()> {
    let courier = Courier::from(cmd.user);
    let records = DeliveryStore::from_config(config)?.load()?;
    let ledger = Ledger::new(&records, courier);

    if cmd.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&ledger)?);
        return Ok(());
    }

    if ledger.is_empty() {
        println!("No records for {courier}");
        return Ok(());
    }
    print_records(&ledger.records, cmd.format);
    println!();
    println!("Total: ${:.2}", ledger.total_amount);
    Ok(())
}

fn handle_report(config: &Config, cmd: &ReportCommand) -> anyhow::Result<()> {
    AccessDecision::check(cmd.password.as_deref(), &config.admin.password).require()?;

    let offset = config.business_offset()?;
    let anchor = match cmd.date {
        Some(date) => date,
        None => SystemClock::new(offset).today(),
    };
    let records = DeliveryStore::from_config(config)?.load()?;
    let dashboard = Dashboard::build(
        &records,
        cmd.period.into(),
        anchor,
        offset,
        cmd.courier.map(Courier::from),
        cmd.top,
    );

    if cmd.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
        return Ok(());
    }

    println!(
        "Report ({}) {} to {}",
        dashboard.period, dashboard.start, dashboard.end
    );
    if let Some(courier) = dashboard.courier {
        println!("Courier: {courier}");
    }
    println!();

    if dashboard.is_empty() {
        println!("No records in this period");
        return Ok(());
    }

    print_records(&dashboard.records, cmd.format);
    println!();
    println!("[By courier]");
    for (courier, summary) in &dashboard.summary {
        println!(
            "  {:<6} {:>4} deliveries  ${:.2}",
            courier.as_str(),
            summary.count,
            summary.total_amount
        );
    }
    println!();
    println!("Deliveries:     {}", dashboard.total_count);
    println!("Total amount:   ${:.2}", dashboard.total_amount);
    match dashboard.mean_duration_minutes {
        Some(mean) => println!("Mean duration:  {mean:.1} min"),
        None => println!("Mean duration:  n/a"),
    }
    if !dashboard.top_clients.is_empty() {
        println!();
        println!("[Top clients]");
        for entry in &dashboard.top_clients {
            println!("  {:>4}  {}", entry.count, entry.client);
        }
    }
    Ok(())
}

fn handle_export(config: &Config, cmd: &ExportCommand) -> anyhow::Result<()> {
    AccessDecision::check(cmd.password.as_deref(), &config.admin.password).require()?;

    let offset = config.business_offset()?;
    let anchor = match cmd.date {
        Some(date) => date,
        None => SystemClock::new(offset).today(),
    };
    let records = DeliveryStore::from_config(config)?.load()?;
    let period: deliverylog::ReportPeriod = cmd.period.into();
    let rows = period.select(&records, anchor, offset);

    match &cmd.output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            let mut out = BufWriter::new(file);
            write_export(&rows, cmd.format.into(), offset, &mut out)?;
            out.flush()?;
            eprintln!("Exported {} rows to {}", rows.len(), path.display());
        }
        None => {
            let mut out = io::stdout().lock();
            write_export(&rows, cmd.format.into(), offset, &mut out)?;
            out.flush()?;
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Log path:           {}", config.log_path().display());
                println!("  Session path:       {}", config.session_path().display());
                println!("  Cache TTL (secs):   {}", config.storage.cache_ttl_secs);
                println!();
                println!("[Business]");
                println!("  UTC offset:         {}", config.business.utc_offset);
                println!("  Max slots:          {}", config.business.max_slots);
                println!();
                println!("[Admin]");
                println!("  Password:           (set)");
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_records(records: &[DeliveryRecord], format: OutputFormat) {
    let stamp = |time: Option<&chrono::DateTime<chrono::FixedOffset>>| {
        time.map_or_else(|| "-".to_string(), format_timestamp)
    };

    if format == OutputFormat::Table {
        println!(
            "{:<6} {:<24} {:<12} {:>10}  {:<19}  {:<19}",
            "USER", "CLIENT", "TICKET", "AMOUNT", "DEPARTURE", "ARRIVAL"
        );
        for record in records {
            println!(
                "{:<6} {:<24} {:<12} {:>10.2}  {:<19}  {:<19}",
                record.user.as_str(),
                record.client,
                record.ticket,
                record.amount,
                stamp(record.departure_time.as_ref()),
                stamp(record.arrival_time.as_ref()),
            );
        }
    } else {
        for record in records {
            println!(
                "{}\t{}\t{}\t{:.2}\t{}\t{}",
                record.user,
                record.client,
                record.ticket,
                record.amount,
                stamp(record.departure_time.as_ref()),
                stamp(record.arrival_time.as_ref()),
            );
        }
    }
}
