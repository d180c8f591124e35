use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use membank::config::Config;
use membank::repository::MemoryRepository;
use membank_cli::commands::{
    AddCommand, BulkDeleteCommand, DeleteCommand, GetCommand, GraphCommand, LinkCommand,
    ListCommand, MergeCommand, PruneCommand, RebuildCommand, RelatedCommand, SearchCommand,
    StatsCommand, TagCommand, UnlinkCommand, UpdateCommand,
};
use membank_cli::error::CliResult;
use membank_cli::output::OutputFormat;

#[derive(Parser)]
#[command(name = "membank")]
#[command(about = "Membank - durable memory store for AI coding assistants")]
#[command(version)]
pub struct Cli {
    #[clap(long, short, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[clap(long, short = 'd', global = true, help = "Path to data directory")]
    pub data_dir: Option<PathBuf>,

    #[clap(long, short = 'c', global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    #[clap(about = "Store a new memory")]
    Add(AddCommand),

    #[clap(about = "Show one memory in full")]
    Get(GetCommand),

    #[clap(about = "List memories")]
    List(ListCommand),

    #[clap(about = "Search memories by keyword")]
    Search(SearchCommand),

    #[clap(about = "Update a memory's content, tags, or relations")]
    Update(UpdateCommand),

    #[clap(about = "Delete a memory")]
    Delete(DeleteCommand),

    #[clap(about = "Relate two memories to each other")]
    Link(LinkCommand),

    #[clap(about = "Remove the relation between two memories")]
    Unlink(UnlinkCommand),

    #[clap(about = "List memories related to one memory")]
    Related(RelatedCommand),

    #[clap(about = "Merge two or more memories into the first")]
    Merge(MergeCommand),

    #[clap(about = "Show the relation graph")]
    Graph(GraphCommand),

    #[clap(about = "Tag or untag memories in bulk")]
    Tag(TagCommand),

    #[clap(about = "Delete expired memories")]
    Prune(PruneCommand),

    #[clap(about = "Delete memories matching filters in bulk")]
    BulkDelete(BulkDeleteCommand),

    #[clap(about = "Rebuild the index from stored records")]
    Rebuild(RebuildCommand),

    #[clap(about = "Show store statistics")]
    Stats(StatsCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    init_logging();

    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Table
    };

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(ref data_dir) = cli.data_dir {
        config.storage.data_dir = data_dir.clone();
    }
    let repo = MemoryRepository::open(config);

    match &cli.command {
        Command::Add(cmd) => cmd.execute(&repo, format).await,
        Command::Get(cmd) => cmd.execute(&repo, format).await,
        Command::List(cmd) => cmd.execute(&repo, format).await,
        Command::Search(cmd) => cmd.execute(&repo, format).await,
        Command::Update(cmd) => cmd.execute(&repo, format).await,
        Command::Delete(cmd) => cmd.execute(&repo, format).await,
        Command::Link(cmd) => cmd.execute(&repo, format).await,
        Command::Unlink(cmd) => cmd.execute(&repo, format).await,
        Command::Related(cmd) => cmd.execute(&repo, format).await,
        Command::Merge(cmd) => cmd.execute(&repo, format).await,
        Command::Graph(cmd) => cmd.execute(&repo, format).await,
        Command::Tag(cmd) => cmd.execute(&repo, format).await,
        Command::Prune(cmd) => cmd.execute(&repo, format).await,
        Command::BulkDelete(cmd) => cmd.execute(&repo, format).await,
        Command::Rebuild(cmd) => cmd.execute(&repo, format).await,
        Command::Stats(cmd) => cmd.execute(&repo, format).await,
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,membank=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(config_path: Option<&std::path::Path>) -> CliResult<Config> {
    if let Some(path) = config_path {
        tracing::info!("Loading config from: {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
        let config: Config =
            toml::from_str(&content).map_err(|e| format!("Failed to parse config: {e}"))?;
        return Ok(config);
    }

    let default_paths = [
        dirs::home_dir().map(|h| h.join(".membank").join("config.toml")),
        dirs::config_dir().map(|c| c.join("membank").join("config.toml")),
        Some(PathBuf::from("membank.toml")),
    ];

    for path in default_paths.iter().flatten() {
        if path.exists() {
            tracing::info!("Loading config from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
            let config: Config =
                toml::from_str(&content).map_err(|e| format!("Failed to parse config: {e}"))?;
            return Ok(config);
        }
    }

    tracing::debug!("No config file found, using defaults");
    Ok(Config::default())
}
