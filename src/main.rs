//! Compass Store entry point
//!
//! Native builds get a small inspection tool over a file-backed store. The
//! web build's entry point lives in `compass_store::web`.

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use clap::{Parser, Subcommand};
    use compass_store::Persistence;
    use compass_store::platform::{self, JsonFileStore};
    use serde_json::Value;

    #[derive(Debug, Parser)]
    #[command(name = "compass-store")]
    #[command(about = "Inspect and back up a Compass store file", long_about = None)]
    pub struct Cli {
        /// Store file
        #[arg(long, env = "COMPASS_STORE", default_value = "compass-store.json")]
        pub store: PathBuf,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, PartialEq, Eq, Subcommand)]
    pub enum Command {
        /// Print storage usage
        Stats,
        /// Print a backup bundle of every record
        Export,
        /// Restore records from a backup bundle file
        Import { file: PathBuf },
        /// Print the record under a key
        Get { key: String },
        /// Delete the record under a key
        Remove { key: String },
    }

    fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
        match serde_json::to_string_pretty(value) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                log::error!("Could not encode output: {}", e);
                ExitCode::FAILURE
            }
        }
    }

    fn status(ok: bool) -> ExitCode {
        if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE }
    }

    pub fn run(cli: Cli) -> ExitCode {
        let store = match JsonFileStore::open(&cli.store) {
            Ok(store) => store,
            Err(e) => {
                eprintln!("Error: cannot open {}: {}", cli.store.display(), e);
                return ExitCode::FAILURE;
            }
        };
        let mut db = match Persistence::try_open_durable(store, platform::now) {
            Ok(db) => db,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        };
        log::info!("Using store {}", cli.store.display());

        match cli.command {
            Command::Stats => match db.stats() {
                Some(stats) => print_json(&stats),
                None => ExitCode::FAILURE,
            },
            Command::Export => match db.export_all() {
                Some(bundle) => print_json(&bundle),
                None => ExitCode::FAILURE,
            },
            Command::Import { file } => {
                let bundle = std::fs::read_to_string(&file)
                    .map_err(|e| e.to_string())
                    .and_then(|text| serde_json::from_str::<Value>(&text).map_err(|e| e.to_string()));
                match bundle {
                    Ok(bundle) => status(db.import_all(&bundle)),
                    Err(e) => {
                        eprintln!("Error: cannot read backup {}: {}", file.display(), e);
                        ExitCode::FAILURE
                    }
                }
            }
            Command::Get { key } => match db.get::<Value>(&key) {
                Some(value) => print_json(&value),
                None => {
                    eprintln!("Error: {} not found", key);
                    ExitCode::FAILURE
                }
            },
            Command::Remove { key } => status(db.remove(&key)),
        }
    }

}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    use clap::Parser;

    env_logger::init();
    native::run(native::Cli::parse())
}

// The web build starts from compass_store::web::start
#[cfg(target_arch = "wasm32")]
fn main() {}
