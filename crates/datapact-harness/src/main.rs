//! Datapact CLI harness
//!
//! Loads an authorization snapshot from the shared issuer volumes and
//! runs a single decision or introspection query against it. This is
//! a development surface for exercising the engine; the production
//! transport layer drives the same API.

use anyhow::Result;
use clap::{Parser, Subcommand};
use datapact_authorization::{
    AccessRequest, AuthorizationEngine, CapabilityStore, Decision, Did, IdentityDirectory,
    MemoryCatalog, NamingConvention, ResourceCatalog, RetryPolicy,
};
use std::path::PathBuf;

mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "datapact")]
#[command(about = "Capability-based authorization decisions for federated datasets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Capability/registry directory (falls back to $CAPS_DIR, then /caps)
    #[arg(long, global = true)]
    caps_dir: Option<PathBuf>,

    /// Dataset directory (falls back to $DATA_DIR, then /data)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate one access request and print the decision
    Evaluate {
        /// Capability id presented by the caller
        #[arg(long)]
        capability: Option<String>,

        /// Authenticated caller identity (DID)
        #[arg(long)]
        caller: Option<String>,

        /// Requested resource path, e.g. /ab.json
        #[arg(long)]
        path: String,

        /// Print the resource bytes on an allow decision
        #[arg(long)]
        fetch: bool,
    },

    /// List the capabilities controlled by an identity, in issue order
    Introspect {
        /// Controller identity (DID)
        #[arg(long)]
        controller: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let config = Config::resolve(cli.caps_dir, cli.data_dir);
    let retry = RetryPolicy::default();

    match cli.command {
        Commands::Evaluate {
            capability,
            caller,
            path,
            fetch,
        } => {
            let store = CapabilityStore::load(&config.caps_dir, retry).await?;
            let directory = IdentityDirectory::load(config.registry_path(), retry).await?;
            let catalog =
                MemoryCatalog::scan(&config.data_dir, &NamingConvention::default()).await?;
            let engine = AuthorizationEngine::new(store, directory, catalog);

            let request = AccessRequest {
                capability_id: capability,
                caller: caller.map(|did| Did::from(did.as_str())),
                path,
            };

            match engine.evaluate(&request) {
                Decision::Allow { path } => {
                    println!("ALLOW {path}");
                    if fetch {
                        let bytes = engine.catalog().read(&path)?;
                        println!("{}", String::from_utf8_lossy(&bytes));
                    }
                }
                Decision::Deny(reason) => {
                    println!("DENY {} ({})", reason.code(), reason.http_status());
                    std::process::exit(1);
                }
            }
        }

        Commands::Introspect { controller } => {
            let store = CapabilityStore::load(&config.caps_dir, retry).await?;
            let held = store.controlled_by(&Did::from(controller.as_str()));
            println!("{}", serde_json::to_string_pretty(&held)?);
        }
    }

    Ok(())
}
