//! HERA playbook runner binary.
//!
//! Registers the built-in demo playbooks and executes one by ID, against
//! either the in-memory adapter (dry run) or a Supabase backend configured
//! through the environment.

mod demos;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hera_playbooks::{Adapter, EntitySnapshot, MemoryAdapter, RunOptions};
use hera_supabase::SupabaseAdapter;

#[derive(Parser)]
#[command(name = "hera-runner")]
#[command(version, about = "HERA Playbook Runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in playbooks
    List,

    /// Execute a playbook against an entity
    Run {
        /// Playbook ID (see `list`)
        playbook_id: String,

        /// Target entity ID
        #[arg(long)]
        entity_id: String,

        /// Organization scope for the run
        #[arg(long)]
        org: String,

        /// Acting principal ID
        #[arg(long, default_value = "system")]
        actor: String,

        /// Acting principal role
        #[arg(long, default_value = "system")]
        actor_role: String,

        /// Path to a JSON entity snapshot; a bare snapshot of the playbook's
        /// entity type is used when omitted
        #[arg(long)]
        entity_file: Option<PathBuf>,

        /// Execute against the in-memory adapter instead of Supabase
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,hera_playbooks=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let registry = demos::create_demo_registry();

    match cli.command {
        Commands::List => {
            let mut ids = registry.list();
            ids.sort();
            for id in ids {
                println!("{}", id);
            }
            Ok(())
        }
        Commands::Run {
            playbook_id,
            entity_id,
            org,
            actor,
            actor_role,
            entity_file,
            dry_run,
        } => {
            let playbook = registry
                .get(&playbook_id)
                .ok_or_else(|| anyhow!("Playbook not found: {}", playbook_id))?;

            let entity = match entity_file {
                Some(path) => {
                    let raw = std::fs::read_to_string(&path)?;
                    serde_json::from_str(&raw)?
                }
                None => EntitySnapshot::new(&entity_id, &playbook.entity_type),
            };

            let adapter: Arc<dyn Adapter> = if dry_run {
                let memory = MemoryAdapter::new();
                memory.insert_entity(&org, entity.clone());
                Arc::new(memory)
            } else {
                Arc::new(SupabaseAdapter::from_env()?)
            };

            tracing::info!(
                playbook_id = %playbook_id,
                entity_id = %entity.id,
                organization_id = %org,
                dry_run,
                "Executing playbook"
            );

            let output = registry
                .execute(
                    &playbook_id,
                    entity,
                    RunOptions {
                        actor_id: actor,
                        actor_role,
                        organization_id: org,
                        adapter,
                    },
                )
                .await?;

            println!("{}", serde_json::to_string_pretty(&output)?);

            if let Some(failure) = output.first_failure() {
                return Err(anyhow!(
                    "Run failed at {}: {}",
                    failure.id,
                    failure.message().unwrap_or("unknown error")
                ));
            }

            Ok(())
        }
    }
}
