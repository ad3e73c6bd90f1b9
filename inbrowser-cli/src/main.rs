//! inbrowser CLI
//!
//! Command-line interface for in-browser gateway addresses and configuration.

mod logging;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use tokio::sync::mpsc::UnboundedReceiver;

use inbrowser_core::input::{dns_resolvers_to_input, list_to_url_input};
use inbrowser_core::traits::WorkerChannel;
use inbrowser_core::types::{compute_defaults, ConfigField, ConfigRecord, Environment, SyncMessage, TargetOrigin};
use inbrowser_state::ConfigMediator;
use inbrowser_store::{ConfigStore, FileStore};
use inbrowser_sync::{
    ConfigSession, HttpWorkerChannel, LocalParentChannel, LocalWorkerChannel, PageContext, SaveOutcome,
};
use inbrowser_uri::{parse_input, validate_input};

use crate::logging::ReloadableFilter;

/// inbrowser - IPFS/IPNS addresses and gateway configuration
#[derive(Parser)]
#[command(name = "inbrowser")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse and validate an IPFS/IPNS address
    Parse {
        /// Gateway URL, content path, native URI, or bare CID
        input: String,
    },

    /// Inspect and change the persisted configuration
    Config {
        #[command(flatten)]
        store: StoreArgs,

        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the persisted configuration
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set one field and save
    Set {
        /// Field key (e.g. gateways, enableWss, dnsJsonResolvers)
        field: String,
        /// Value in text form; use \n between list entries
        value: String,
        #[command(flatten)]
        page: PageArgs,
    },

    /// Reset every field to its default
    Reset,

    /// Load the configuration as a freshly opened page would
    Mount {
        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Args)]
struct StoreArgs {
    /// Directory holding the config database
    #[arg(long, env = "INBROWSER_STORE_DIR", default_value = ".inbrowser")]
    store_dir: PathBuf,

    /// Hostname the config page is served from (selects defaults)
    #[arg(long, env = "INBROWSER_HOST", default_value = "inbrowser.link")]
    host: String,
}

#[derive(Args)]
struct PageArgs {
    /// Worker control endpoint to notify after saving
    #[arg(long, env = "INBROWSER_WORKER_URL")]
    worker_url: Option<String>,

    /// Config page URL; its fragment carries the parent origin when embedded
    #[arg(long, env = "INBROWSER_PAGE_URL")]
    page_url: Option<String>,

    /// Behave as a page embedded in a parent window
    #[arg(long)]
    embedded: bool,
}

/// Channels a config session was built with, plus the receiving ends the
/// CLI prints from.
struct Wiring {
    session: ConfigSession,
    worker_rx: Option<UnboundedReceiver<SyncMessage>>,
    parent_rx: UnboundedReceiver<(TargetOrigin, SyncMessage)>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let filter = Arc::new(logging::init(cli.verbose));

    match cli.command {
        Commands::Parse { input } => cmd_parse(&input),
        Commands::Config { store, command } => {
            let mediator = open_mediator(&store, filter);
            match command {
                ConfigCommand::Show { json } => cmd_show(&mediator, json).await,
                ConfigCommand::Set { field, value, page } => {
                    cmd_set(mediator, &store, &page, &field, &value).await
                }
                ConfigCommand::Reset => cmd_reset(&mediator).await,
                ConfigCommand::Mount { page } => cmd_mount(mediator, &store, &page).await,
            }
        }
    }
}

/// Parse and validate an address
fn cmd_parse(input: &str) -> Result<()> {
    let parts = parse_input(input);

    println!("{}", "🔍 Parsed address".cyan().bold());
    println!(
        "   {} {}",
        "Protocol:".dimmed(),
        parts.protocol.map(|p| p.to_string()).unwrap_or_else(|| "-".into())
    );
    println!(
        "   {} {}",
        "Identifier:".dimmed(),
        parts.identifier.as_deref().unwrap_or("-")
    );
    println!("   {} {}", "Path:".dimmed(), parts.path());

    match validate_input(input, &parts) {
        Ok(internal_path) => {
            println!("\n{} {}", "✅ Navigable:".green().bold(), internal_path);
            Ok(())
        }
        Err(e) => {
            println!("\n{}", "❌ Not navigable".red().bold());
            bail!("{e}")
        }
    }
}

/// Print the persisted configuration
async fn cmd_show(mediator: &ConfigMediator, json: bool) -> Result<()> {
    let config = mediator.load().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
    } else {
        print_config(&config);
    }
    Ok(())
}

/// Set one field and save
async fn cmd_set(
    mediator: Arc<ConfigMediator>,
    store: &StoreArgs,
    page: &PageArgs,
    field: &str,
    value: &str,
) -> Result<()> {
    let field: ConfigField = field.parse()?;
    let wiring = build_session(mediator, store, page)?;

    wiring.session.mount().await;
    // clap hands over a literal backslash-n
    let value = value.replace("\\n", "\n");
    wiring
        .session
        .mediator()
        .set_input(field, &value)
        .with_context(|| format!("Invalid value for {field}"))?;

    let outcome = wiring
        .session
        .save()
        .await
        .context("Failed to save config")?;

    println!("{} {}", "✅ Saved".green().bold(), field);
    print_outcome(&outcome, wiring);
    Ok(())
}

/// Reset to defaults
async fn cmd_reset(mediator: &ConfigMediator) -> Result<()> {
    let config = mediator.reset_to_defaults().await;
    println!("{}", "♻️  Config reset to defaults".green().bold());
    print_config(&config);
    Ok(())
}

/// Load as a freshly opened page
async fn cmd_mount(mediator: Arc<ConfigMediator>, store: &StoreArgs, page: &PageArgs) -> Result<()> {
    let mut wiring = build_session(mediator, store, page)?;

    let notified = wiring.session.mount().await;
    print_config(&wiring.session.mediator().current());

    if wiring.session.page().embedded {
        if notified {
            println!("\n{}", "📨 Config handed to parent window".green());
        } else {
            println!("\n{}", "⚠️  Parent window was not notified".yellow());
        }
    }
    print_parent_messages(&mut wiring.parent_rx);
    Ok(())
}

fn open_mediator(store: &StoreArgs, filter: Arc<ReloadableFilter>) -> Arc<ConfigMediator> {
    let defaults = compute_defaults(&Environment::from_hostname(&store.host));
    let backend = FileStore::for_config(&store.store_dir);
    tracing::debug!(path = ?backend.path(), "Using file store");

    let config_store = ConfigStore::new(Arc::new(backend), defaults).with_debug_hook(filter);
    Arc::new(ConfigMediator::new(Arc::new(config_store)))
}

fn build_session(mediator: Arc<ConfigMediator>, store: &StoreArgs, page: &PageArgs) -> Result<Wiring> {
    let mut worker_rx = None;
    let worker: Arc<dyn WorkerChannel> = match &page.worker_url {
        Some(url) => Arc::new(HttpWorkerChannel::new(url).context("Invalid worker URL")?),
        None => {
            let (channel, rx) = LocalWorkerChannel::new();
            worker_rx = Some(rx);
            Arc::new(channel)
        }
    };

    let location = page
        .page_url
        .clone()
        .unwrap_or_else(|| format!("https://{}/#/ipfs-sw-config", store.host));
    let context = if page.embedded {
        PageContext::embedded(location)
    } else {
        PageContext::top_level(location)
    };

    let (parent, parent_rx) = LocalParentChannel::new();
    let session = ConfigSession::new(mediator, worker, context).with_parent(Arc::new(parent));

    Ok(Wiring {
        session,
        worker_rx,
        parent_rx,
    })
}

fn print_config(config: &ConfigRecord) {
    println!("{}", "⚙️  Configuration".cyan().bold());
    for field in ConfigField::ALL {
        let value = match field {
            ConfigField::Gateways => list_to_url_input(&config.gateways),
            ConfigField::Routers => list_to_url_input(&config.routers),
            ConfigField::DnsJsonResolvers => dns_resolvers_to_input(&config.dns_json_resolvers),
            _ => config.field_value(field).to_string(),
        };
        println!("   {}", format!("{field}:").dimmed());
        for line in value.lines() {
            println!("      {line}");
        }
    }

    if !config.has_retrieval_method() {
        println!("\n{}", "⚠️  No retrieval method is enabled".red().bold());
    }
}

fn print_outcome(outcome: &SaveOutcome, mut wiring: Wiring) {
    if let Some(rx) = wiring.worker_rx.as_mut() {
        while let Ok(message) = rx.try_recv() {
            println!("   {} {}", "Worker message:".dimmed(), to_json(&message));
        }
    }

    let worker = if outcome.worker_notified {
        "notified".green()
    } else {
        "not notified".yellow()
    };
    println!("   {} {}", "Worker:".dimmed(), worker);

    if wiring.session.page().embedded {
        let parent = if outcome.parent_notified {
            "notified".green()
        } else {
            "not notified".yellow()
        };
        println!("   {} {}", "Parent:".dimmed(), parent);
        print_parent_messages(&mut wiring.parent_rx);
    }

    if outcome.navigate_back {
        println!("   {}", "Return to the previous page to continue.".dimmed());
    }
}

fn print_parent_messages(rx: &mut UnboundedReceiver<(TargetOrigin, SyncMessage)>) {
    while let Ok((origin, message)) = rx.try_recv() {
        println!("   {} {}", "Posted to".dimmed(), origin);
        println!("   {}", to_json(&message));
    }
}

fn to_json(message: &SyncMessage) -> String {
    message
        .to_json()
        .unwrap_or_else(|e| format!("<unserializable: {e}>"))
}
