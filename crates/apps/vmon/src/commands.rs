//! Subcommand implementations

use anyhow::{Context, Result, bail};
use log::{info, warn};
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use volt::{Client, ConnectionSettings, Param, StatementOutcome};

use crate::Cli;
use crate::output::{format_table, print_response};

/// Load settings and apply command-line overrides
pub fn load_settings(cli: &Cli) -> Result<ConnectionSettings> {
    let mut settings = ConnectionSettings::load(cli.config.as_deref())?;

    if let Some(host) = &cli.host {
        settings.host = host.clone();
    }
    if let Some(port) = cli.port {
        settings.port = port;
    }
    if let Some(user) = &cli.user {
        settings.username = Some(user.clone());
    }
    if let Some(password) = &cli.password {
        settings.password = Some(password.clone());
    }
    if cli.admin {
        settings.admin = true;
    }

    Ok(settings)
}

/// Call one procedure and print the response
///
/// User procedures are fetched from the server catalog on first use.
pub fn call(client: &Client, procedure: &str, params: &[String]) -> bool {
    if !client.ensure_procedure(procedure) {
        warn!("{} is not a known system or user procedure", procedure);
    }

    let succeeded = Arc::new(AtomicBool::new(false));
    let flag = succeeded.clone();
    let params: Vec<Param> = params.iter().map(Param::from).collect();

    client
        .call(procedure, params, move |response| {
            flag.store(response.is_success(), Ordering::SeqCst);
            print_response(&response);
        })
        .wait();

    succeeded.load(Ordering::SeqCst)
}

/// Refresh the dashboard once and print a summary
pub fn dashboard(client: &Client, continue_on_failure: bool) -> Result<bool> {
    let Some((snapshot, report)) = volt::refresh_dashboard(client, continue_on_failure) else {
        bail!("Another queue is already running on {}", client.endpoint().key());
    };

    if let Some(overview) = &snapshot.overview {
        println!(
            "Cluster: {} host(s), version {}",
            overview.host_count(),
            overview.version().unwrap_or("unknown")
        );
        for host_id in overview.host_ids() {
            println!("  host {}: {}", host_id, overview.hostname(host_id).unwrap_or("?"));
        }
    }

    if let Some(memory) = &snapshot.memory {
        println!("\nMemory:");
        for host in &memory.hosts {
            let ratio = host
                .rss_ratio()
                .map(|r| format!(" ({:.1}% of physical)", r * 100.0))
                .unwrap_or_default();
            println!(
                "  {} (host {}): rss {} KB{}, {} tuples",
                host.hostname, host.host_id, host.rss_kb, ratio, host.tuple_count
            );
        }
        println!("  total rss {} KB", memory.total_rss_kb());
    }

    if let Some(profile) = &snapshot.procedures {
        println!("\nBusiest procedures:");
        for stat in profile.top_by_invocations(10) {
            println!(
                "  {:<40} {:>10} calls  avg {:>8.3} ms  errors {:.2}%",
                stat.procedure,
                stat.invocations,
                stat.avg_ns as f64 / 1_000_000.0,
                stat.error_rate() * 100.0
            );
        }
    }

    for error in &snapshot.errors {
        warn!("{}", error);
    }
    if report.skipped > 0 {
        warn!("{} dashboard call(s) skipped", report.skipped);
    }

    Ok(report.success)
}

/// Run a SQL script and print each statement's outcome
pub fn sql(client: &Client, file: &str, continue_on_failure: bool) -> Result<bool> {
    let script = if file == "-" {
        let mut script = String::new();
        std::io::stdin()
            .read_to_string(&mut script)
            .context("Failed to read script from stdin")?;
        script
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read script: {}", file))?
    };

    let Some(report) = volt::run_script(client, &script, continue_on_failure) else {
        bail!("Another queue is already running on {}", client.endpoint().key());
    };

    for (sql, outcome) in &report.statements {
        println!("> {}", sql);
        match outcome {
            StatementOutcome::Succeeded(response) => {
                for table in &response.tables {
                    println!("{}", format_table(table));
                }
            }
            StatementOutcome::Failed(response) => {
                println!("ERROR ({}): {}\n", response.status.code(), response.message);
            }
            StatementOutcome::Skipped => println!("skipped\n"),
        }
    }

    info!(
        "{} statement(s), {} failed, {} skipped",
        report.statements.len(),
        report.failed_count(),
        report.skipped_count()
    );
    Ok(report.success)
}

/// List system procedures plus the user procedures in the server catalog
pub fn procedures(client: &Client) -> bool {
    let loaded = match client.load_user_procedures() {
        Ok(count) => {
            info!("Loaded {} user procedure(s)", count);
            true
        }
        Err(response) => {
            warn!("Could not load user procedures: {}", response.message);
            false
        }
    };

    client.with_catalog(|catalog| {
        for name in catalog.names() {
            if let Some((_, signature)) = catalog.lookup(name) {
                let params: Vec<&str> = signature.params().iter().map(|t| t.name()).collect();
                println!("{}({})", name, params.join(", "));
            }
        }
    });

    loaded
}
