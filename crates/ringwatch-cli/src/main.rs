//! ringwatch CLI - fiber-ring topology diagnostics from the command line.

mod commands;
mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ringwatch")]
#[command(author, version, about = "ringwatch - fiber-ring topology diagnostics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new ringwatch project
    Init {
        /// Project directory (default: current directory)
        #[arg(short, long)]
        path: Option<String>,
    },

    /// Show connectivity, ring integrity and findings
    Status {
        /// Print the full status as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check one node's connectivity to the center
    Check {
        /// Node id
        node: String,
    },

    /// Set a strand to ok or faulty
    Set {
        /// Segment id (e.g. SET-CT01)
        segment: String,
        /// Strand index
        strand: u32,
        /// New state: ok or faulty
        state: String,
        /// Name recorded in the audit trail
        #[arg(short, long)]
        actor: Option<String>,
    },

    /// Set every faulty strand of a segment back to ok
    Restore {
        /// Segment id
        segment: String,
    },

    /// Discard the working topology and start from the configured one
    Reset,

    /// Show segment and strand statistics
    Stats,

    /// Export a diagnostic report
    Export {
        /// Output file path
        output: String,

        /// Export format
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Manage named snapshots
    Snapshot {
        #[command(subcommand)]
        command: SnapshotCommands,
    },

    /// Manage plants
    Plant {
        #[command(subcommand)]
        command: PlantCommands,
    },

    /// Show or import the active plant's CCTV inventory
    Cctv {
        #[command(subcommand)]
        command: CctvCommands,
    },

    /// Show the strand audit trail, newest first
    History {
        /// Only changes on this segment
        #[arg(short, long)]
        segment: Option<String>,

        /// Only changes on this strand index
        #[arg(long)]
        strand: Option<u32>,

        /// Maximum records to show
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },
}

#[derive(Subcommand)]
enum SnapshotCommands {
    /// Save the working topology
    Save {
        /// Snapshot name
        name: String,

        /// Make it the plant's default
        #[arg(long)]
        default: bool,
    },

    /// Replace the working topology with a saved snapshot
    Load {
        /// Snapshot name
        name: String,
    },

    /// Delete a saved snapshot
    Delete {
        /// Snapshot name
        name: String,
    },

    /// List saved snapshots
    List,
}

#[derive(Subcommand)]
enum PlantCommands {
    /// List stored plants
    List,

    /// Create a plant
    Create {
        /// Plant id
        id: String,

        /// Copy snapshots and CCTV inventory from this plant
        #[arg(short, long)]
        base: Option<String>,
    },

    /// Rename a plant
    Rename {
        /// Current plant id
        old: String,
        /// New plant id
        new: String,
    },

    /// Delete a plant and its snapshots
    Delete {
        /// Plant id
        id: String,
    },

    /// Switch the project to another plant
    Use {
        /// Plant id
        id: String,
    },
}

#[derive(Subcommand)]
enum CctvCommands {
    /// Show the inventory
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace the inventory from a JSON file
    Import {
        /// Input file path
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init { path } => commands::init::run(path),
        Commands::Status { json } => commands::status::run(json),
        Commands::Check { node } => commands::status::check(&node),
        Commands::Set { segment, strand, state, actor } => {
            commands::strand::set(&segment, strand, &state, actor)
        }
        Commands::Restore { segment } => commands::strand::restore(&segment),
        Commands::Reset => commands::strand::reset(),
        Commands::Stats => commands::stats::run(),
        Commands::Export { output, format } => commands::export::run(&output, &format),
        Commands::Snapshot { command } => match command {
            SnapshotCommands::Save { name, default } => commands::snapshot::save(&name, default),
            SnapshotCommands::Load { name } => commands::snapshot::load(&name),
            SnapshotCommands::Delete { name } => commands::snapshot::delete(&name),
            SnapshotCommands::List => commands::snapshot::list(),
        },
        Commands::Plant { command } => match command {
            PlantCommands::List => commands::plant::list(),
            PlantCommands::Create { id, base } => commands::plant::create(&id, base),
            PlantCommands::Rename { old, new } => commands::plant::rename(&old, &new),
            PlantCommands::Delete { id } => commands::plant::delete(&id),
            PlantCommands::Use { id } => commands::plant::switch(&id),
        },
        Commands::Cctv { command } => match command {
            CctvCommands::Show { json } => commands::cctv::show(json),
            CctvCommands::Import { path } => commands::cctv::import(&path),
        },
        Commands::History { segment, strand, limit } => {
            commands::history::run(segment, strand, limit)
        }
    }
}
