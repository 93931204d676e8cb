// src/cli.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::app_log;
use crate::core::csv_io;
use crate::core::persona::{resolve_roles, Persona};
use crate::core::ConfigManager;
use crate::start_web_server;

const DEFAULT_PORT: u16 = 8000;

#[derive(Parser)]
#[command(name = "founder-finder")]
#[command(about = "Find the most likely founder/CEO LinkedIn profile for companies")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Settings file (.yaml, .yml or .toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the JSON API used by the dashboard
    Serve {
        /// Defaults to ROCKET_PORT, then 8000
        #[arg(long)]
        port: Option<u16>,
    },
    /// Look up a single company
    Lookup {
        company: String,
        #[arg(long)]
        persona: Option<Persona>,
        /// Comma-separated job titles, overrides the persona
        #[arg(long)]
        roles: Option<String>,
        /// Print the result row as JSON
        #[arg(long)]
        json: bool,
    },
    /// Process a CSV with a 'Company' column
    Batch {
        input: PathBuf,
        #[arg(short, long, default_value = "founders_ceos_linkedin.csv")]
        output: PathBuf,
        #[arg(long)]
        persona: Option<Persona>,
        #[arg(long)]
        roles: Option<String>,
    },
}

fn roles_for(config: &ConfigManager, persona: Option<Persona>, roles: Option<&str>) -> Vec<String> {
    if persona.is_none() && roles.is_none() {
        config.default_roles()
    } else {
        resolve_roles(persona, roles)
    }
}

fn server_port(port: Option<u16>) -> Result<u16> {
    if let Some(port) = port {
        return Ok(port);
    }
    match std::env::var("ROCKET_PORT") {
        Ok(value) => value
            .parse::<u16>()
            .map_err(|_| anyhow::anyhow!("ROCKET_PORT must be a valid port number")),
        Err(_) => Ok(DEFAULT_PORT),
    }
}

pub async fn handle_command(cli: Cli) -> Result<()> {
    // Fails before any processing when a credential is missing.
    let config = ConfigManager::load(cli.config.as_deref())?;
    let runner = config.build_runner()?;

    match cli.command {
        Command::Serve { port } => {
            let port = server_port(port)?;
            start_web_server(Arc::new(runner), port).await
        }

        Command::Lookup {
            company,
            persona,
            roles,
            json,
        } => {
            let roles = roles_for(&config, persona, roles.as_deref());
            let row = runner.lookup_with_roles(&company, &roles).await;

            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&row).context("Failed to serialize result")?
                );
            } else {
                println!("Company:    {}", row.company);
                println!("Best URL:   {}", row.best_url);
                if let Some(message) = &row.message {
                    println!("Message:    {}", message);
                }
                if let Some(confidence) = row.confidence {
                    println!("Confidence: {}", confidence);
                }
                if row.has_error() {
                    println!("Error:      {}", row.error);
                }
            }
            Ok(())
        }

        Command::Batch {
            input,
            output,
            persona,
            roles,
        } => {
            let roles = roles_for(&config, persona, roles.as_deref());
            let companies = csv_io::read_companies_from_path(&input).await?;

            let cancel = Arc::new(AtomicBool::new(false));
            let flag = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    app_log!(warn, "Interrupt received, finishing current company then stopping");
                    flag.store(true, Ordering::SeqCst);
                }
            });

            let rows = runner
                .run_with(&companies, &roles, Some(cancel.as_ref()), |progress| {
                    println!(
                        "[{}/{}] {} {}",
                        progress.processed,
                        progress.total,
                        if progress.resolved { "✓" } else { "✗" },
                        progress.company
                    );
                })
                .await;

            csv_io::write_rows_to_path(&output, &rows).await?;
            let resolved = rows.iter().filter(|r| r.is_resolved()).count();
            println!(
                "Results saved to: {} ({} of {} resolved)",
                output.display(),
                resolved,
                rows.len()
            );
            Ok(())
        }
    }
}
