use clap::Parser;
use colored::*;
use stowdb::checksum::IntegrityCheck;
use stowdb::error::{Result, StowError};
use stowdb::layout::StorageLayout;
use stowdb::manager::DatabaseManager;
use stowdb::model::StorageMode;
use stowdb::update::SqliteHeaderEngine;

mod args;
use args::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    let layout = resolve_layout(&cli);
    let mut manager = DatabaseManager::new(layout, SqliteHeaderEngine)?;

    match cli.command {
        Commands::Status => handle_status(&mut manager),
        Commands::Mode { mode } => handle_mode(&mut manager, mode.into()),
        Commands::Retry => handle_retry(&mut manager),
        Commands::List => handle_list(&manager),
        Commands::Checksum { name } => handle_checksum(&manager, &name),
        Commands::Verify { name, expected } => handle_verify(&manager, &name, expected.as_deref()),
        Commands::Version { name } => handle_version(&manager, &name),
        Commands::Delete { name } => handle_delete(&manager, &name),
    }
}

fn resolve_layout(cli: &Cli) -> StorageLayout {
    // Discovery only runs when a default root is actually needed, so
    // fully explicit roots work on platforms with no resolvable data dir.
    if let (Some(device), Some(external)) = (&cli.device_root, &cli.external_root) {
        return StorageLayout::new(device.clone(), external.clone());
    }

    let discovered = StorageLayout::discover().expect("Could not determine data dir");
    let device = cli
        .device_root
        .clone()
        .unwrap_or_else(|| discovered.root(StorageMode::Device).to_path_buf());
    let external = cli
        .external_root
        .clone()
        .unwrap_or_else(|| discovered.root(StorageMode::External).to_path_buf());
    StorageLayout::new(device, external)
}

fn handle_status(manager: &mut DatabaseManager<SqliteHeaderEngine>) -> Result<()> {
    manager.refresh_external_state();
    let record = manager.transfer_record()?;

    println!("mode:     {}", manager.storage_mode().to_string().bold());
    println!("state:    {}", manager.storage_state());
    if record.last_transfer_succeeded {
        println!("transfer: {}", "ok".green());
    } else {
        println!(
            "transfer: {} (files still under '{}', run `stowdb retry`)",
            "pending".yellow(),
            record.previous_mode
        );
    }
    Ok(())
}

fn handle_mode(
    manager: &mut DatabaseManager<SqliteHeaderEngine>,
    mode: StorageMode,
) -> Result<()> {
    if manager.storage_mode() == mode {
        println!("Already in {} mode.", mode);
        return Ok(());
    }

    match manager.set_storage_mode(mode) {
        Ok(()) => {
            println!("{}", format!("Switched to {} storage.", mode).green());
            Ok(())
        }
        Err(err @ StowError::Transfer(_)) => {
            eprintln!(
                "{}",
                format!(
                    "Mode changed to {}, but the file transfer failed; run `stowdb retry`.",
                    mode
                )
                .yellow()
            );
            Err(err)
        }
        Err(err) => Err(err),
    }
}

fn handle_retry(manager: &mut DatabaseManager<SqliteHeaderEngine>) -> Result<()> {
    if manager.last_transfer_success()? {
        println!("Nothing to retry.");
        return Ok(());
    }
    manager.retry_pending_transfer()?;
    println!("{}", "Transfer completed.".green());
    Ok(())
}

fn handle_list(manager: &DatabaseManager<SqliteHeaderEngine>) -> Result<()> {
    let names = manager.list_databases()?;
    if names.is_empty() {
        println!("No databases found.");
        return Ok(());
    }

    for name in names {
        let marker = match manager.verify_integrity(&name)? {
            IntegrityCheck::Verified => "ok".green(),
            IntegrityCheck::Mismatched => "corrupt".red(),
            IntegrityCheck::Unavailable => "unverified".dimmed(),
        };
        println!("{}  [{}]", name.bold(), marker);
    }
    Ok(())
}

fn handle_checksum(manager: &DatabaseManager<SqliteHeaderEngine>, name: &str) -> Result<()> {
    match manager.store_checksum(name)? {
        Some(checksum) => {
            println!("{}", checksum);
            Ok(())
        }
        None => {
            println!("{}", format!("No such database: {}", name).red());
            std::process::exit(1);
        }
    }
}

fn handle_verify(
    manager: &DatabaseManager<SqliteHeaderEngine>,
    name: &str,
    expected: Option<&str>,
) -> Result<()> {
    let verdict = match expected {
        Some(expected) => manager.verify_integrity_against(name, expected)?,
        None => manager.verify_integrity(name)?,
    };

    match verdict {
        IntegrityCheck::Verified => {
            println!("{}", "Verified.".green());
            Ok(())
        }
        IntegrityCheck::Mismatched => {
            println!("{}", "Checksum mismatch.".red());
            std::process::exit(1);
        }
        IntegrityCheck::Unavailable => {
            println!("{}", "Cannot verify: missing file or checksum.".yellow());
            std::process::exit(2);
        }
    }
}

fn handle_version(manager: &DatabaseManager<SqliteHeaderEngine>, name: &str) -> Result<()> {
    match manager.database_version(name)? {
        Some(version) => {
            println!("{}", version);
            Ok(())
        }
        None => {
            println!("{}", format!("No such database: {}", name).red());
            std::process::exit(1);
        }
    }
}

fn handle_delete(manager: &DatabaseManager<SqliteHeaderEngine>, name: &str) -> Result<()> {
    if manager.delete_database(name)? {
        println!("{}", format!("Deleted {}.", name).green());
        Ok(())
    } else {
        println!("{}", format!("No such database: {}", name).red());
        std::process::exit(1);
    }
}
