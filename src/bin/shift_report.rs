use std::sync::Arc;

use colored::Colorize;
use fuel_ledger::{
    config::{Config, ConfigManager},
    init,
    ledger::LedgerState,
    report::SummaryReport,
    storage::JsonFileStorage,
    utils::build_info,
    LedgerError, LedgerStore,
};

const USAGE: &str = "usage: shift_report [--version | --archives | --archive <id>]";

fn main() {
    init();

    if std::env::var_os("NO_COLOR").is_some() {
        colored::control::set_override(false);
    }

    if let Err(err) = run(std::env::args().skip(1).collect()) {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Vec<String>) -> Result<(), LedgerError> {
    match args.first().map(String::as_str) {
        Some("--version") | Some("-V") => {
            let info = build_info::current();
            println!("{}", info.summary_line());
            println!("rustc {}", info.rustc);
            Ok(())
        }
        Some("--help") | Some("-h") => {
            println!("{USAGE}");
            Ok(())
        }
        Some("--archives") => {
            let (store, _) = open_store()?;
            let archives = store.list_archives()?;
            if archives.is_empty() {
                println!("No closed shifts.");
            }
            for archive in archives {
                println!("{}", archive.id);
            }
            Ok(())
        }
        Some("--archive") => {
            let id = args
                .get(1)
                .ok_or_else(|| LedgerError::Validation(format!("missing archive id\n{USAGE}")))?;
            let (store, config) = open_store()?;
            let state = store.load_archive(id)?;
            println!("{}", format!("Closed shift {id}").bold());
            print_report(&state, &config);
            Ok(())
        }
        Some(other) => Err(LedgerError::Validation(format!(
            "unknown argument `{other}`\n{USAGE}"
        ))),
        None => {
            let (store, config) = open_store()?;
            println!("{}", "Current shift".bold());
            print_report(store.state(), &config);
            Ok(())
        }
    }
}

fn open_store() -> Result<(LedgerStore, Config), LedgerError> {
    let config = ConfigManager::locate().load()?;
    let storage = JsonFileStorage::deferred(config.data_dir.clone(), Some(config.archive_retention));
    let store = LedgerStore::open(Arc::new(storage), config.storage_key.clone())?;
    Ok((store, config))
}

fn print_report(state: &LedgerState, config: &Config) {
    let report = SummaryReport::from_state(state, config);
    println!(
        "{} fuel sales, {} lubricants, {} expenses",
        report.fuel_sale_count, report.lubricant_count, report.expense_count
    );
    let mut lines = report.render_plain();
    let total = lines.pop().unwrap_or_default();
    for line in lines {
        println!("{line}");
    }
    if report.total < 0.0 {
        println!("{}", total.red().bold());
    } else {
        println!("{}", total.green().bold());
    }
}
