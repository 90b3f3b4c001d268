//! reqgraph CLI tool
//!
//! Command-line interface for checking a set of requirement records with reqgraph-core.
//!
//! ## Commands
//!
//! - `check <config>`: Build the requirement graph once and display diagnostics
//! - `init <config>`: Write a default configuration file

use clap::{Parser, Subcommand};
use reqgraph_core::{
    compiler::RequirementCompiler,
    config::{ConfigProvider, ReqGraphConfig, TomlConfigProvider},
    constraints::NameUnion,
};
use std::{path::PathBuf, process::ExitCode};

#[derive(Parser)]
#[command(name = "reqgraph")]
#[command(author, version, about = "A tool for checking requirement dependency graphs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the requirement graph and display diagnostics and master nodes
    Check {
        /// Path to the configuration file. Record directories are relative to it.
        config: PathBuf,

        /// Print the linked graph as JSON instead of a summary
        #[arg(long)]
        json: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Write a configuration file with the default settings
    Init {
        /// Path of the configuration file to create
        config: PathBuf,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            config,
            json,
            verbose,
        } => {
            if verbose {
                eprintln!("Checking: {:?}", config);
            }

            let (compiler, source) = RequirementCompiler::simple(&config)?;
            let result = compiler.compile(&source, &NameUnion)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result.set.snapshot())?);
            } else {
                let stats = result.stats();
                println!("\n=== Check Results ===");
                println!("Requirements: {}", stats.requirements);
                println!("Relations: {}", stats.edges);
                println!("Constraints: {}", stats.constraints);
                println!(
                    "Master nodes: {}",
                    result
                        .set
                        .master_nodes()
                        .map(|masters| masters.iter().cloned().collect::<Vec<_>>().join(", "))
                        .unwrap_or_default()
                );
                for diagnostic in result.set.diagnostics().entries() {
                    println!("{diagnostic}");
                }
                if verbose {
                    if let Some(ce3) = result.ce3.as_ref() {
                        for (id, env) in ce3.iter() {
                            println!("{id}: {:?}", env.value());
                        }
                    }
                }
            }

            if result.is_usable() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }

        Commands::Init { config, force } => {
            if config.exists() && !force {
                eprintln!("{} already exists, use --force to overwrite", config.display());
                return Ok(ExitCode::FAILURE);
            }
            TomlConfigProvider::new(config.clone()).set_config(&ReqGraphConfig::default())?;
            println!("Wrote default configuration to {}", config.display());
            Ok(ExitCode::SUCCESS)
        }
    }
}
