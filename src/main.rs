//! nftgrid command line interface
//!
//! Small maintenance surface over saved configuration documents:
//!
//! ```bash
//! nftgrid list               # List saved configurations
//! nftgrid check office       # Run the check battery on a configuration
//! nftgrid check ./doc.json   # ... or on an arbitrary document file
//! nftgrid interfaces         # Show detected system interfaces
//! ```
//!
//! `check` exits non-zero when any check reports an error, so it can gate
//! automated deployments of a saved document.

use clap::{Parser, Subcommand};
use std::path::Path;
use std::process::ExitCode;

use nftgrid::core::checks::{CheckStatus, Severity, ValidationReport};
use nftgrid::core::model::Document;
use nftgrid::{storage, utils};

#[derive(Parser)]
#[command(name = "nftgrid")]
#[command(about = "Table-driven nftables configuration editor - core tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all saved configurations
    List,
    /// Run the check battery against a configuration
    Check {
        /// Configuration name, or path to a document file
        target: String,
        /// Also fail on warnings
        #[arg(long)]
        strict: bool,
    },
    /// Show the system's network interfaces
    Interfaces,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let _ = utils::ensure_dirs();

    let cli = Cli::parse();
    match run(cli.command) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Commands) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match command {
        Commands::List => {
            let configs = storage::list_configs()?;
            if configs.is_empty() {
                println!("No saved configurations.");
            } else {
                println!("Saved configurations:");
                for name in configs {
                    println!("  {name}");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { target, strict } => {
            let doc = load_target(&target)?;
            let interfaces = utils::system_interface_names()?;

            let mut report = ValidationReport::new();
            report.run_all(&doc, &interfaces);
            print_report(&report);

            let failed = report.has_errors() || (strict && report.has_warnings());
            Ok(if failed {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Interfaces => {
            for itf in utils::detect_interfaces()? {
                let marker = if itf.loopback { " (loopback)" } else { "" };
                println!("{}{marker}: {}", itf.name, itf.addresses);
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// A target naming an existing file is a document path; anything else is a
/// saved configuration name.
fn load_target(target: &str) -> Result<Document, nftgrid::core::error::StorageError> {
    let path = Path::new(target);
    if path.is_file() {
        storage::load_document(path)
    } else {
        storage::load_config(target)
    }
}

fn print_report(report: &ValidationReport) {
    for item in &report.items {
        let mark = match item.status {
            CheckStatus::Ok => "ok  ",
            CheckStatus::Warning => "WARN",
            CheckStatus::Error => "FAIL",
            CheckStatus::Unchecked => "--  ",
        };
        println!("[{mark}] {}", item.title);
        for finding in &item.findings {
            let prefix = match finding.severity {
                Severity::Error => "error",
                Severity::Warning => "warning",
            };
            println!("        {prefix}: {}", finding.text);
        }
    }
}
