// Copyright 2026 Shopfit Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use shopfit_runtime::cli::{self, ConfigArgs};
use std::net::SocketAddr;

#[derive(Parser)]
#[command(
    name = "shopfit",
    about = "Shopfit: cheapest-first shopping results as markdown",
    version,
    after_help = "Run 'shopfit <command> --help' for details on each command."
)]
struct Cli {
    /// Debug-level logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve GET /api/search?query=…
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:3000")]
        addr: SocketAddr,
        /// Searches allowed to run at once
        #[arg(long, default_value = "1")]
        max_concurrent: usize,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Run one query and print the result
    Fetch {
        /// What to shop for
        query: String,
        /// Print the full page result as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Check Chromium and show the effective configuration
    Doctor {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if !matches!(cli.command, Commands::Completions { .. }) {
        cli::init_tracing(cli.verbose, cli.log_json);
    }

    let result = match cli.command {
        Commands::Serve {
            addr,
            max_concurrent,
            config,
        } => cli::serve::run(addr, max_concurrent, config).await,
        Commands::Fetch {
            query,
            json,
            config,
        } => cli::fetch_cmd::run(&query, json, config).await,
        Commands::Doctor { config } => cli::doctor::run(config).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "shopfit", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = &result {
        eprintln!("  Error: {e:#}");
        std::process::exit(1);
    }

    result
}
