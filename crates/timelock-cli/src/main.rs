mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::config::ConfigSubcommand;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "timelock",
    about = "Schedule, reconcile and execute timelocked governance actions",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .timelock/ or .git/)
    #[arg(long, global = true, env = "TIMELOCK_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Override ledger.rpc_url from config.yaml
    #[arg(long, global = true, env = "TIMELOCK_RPC_URL")]
    rpc_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create .timelock/ with a config and an example plan
    Init {
        /// Address of the timelock program
        #[arg(long)]
        timelock: Option<String>,
        /// Account the node signs transactions with
        #[arg(long)]
        sender: Option<String>,
        /// Action store backend: json or redb
        #[arg(long)]
        store: Option<String>,
    },

    /// Inspect the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Print the deterministic id of an action
    Id {
        label: String,
        #[arg(long)]
        target: String,
        /// Hex-encoded calldata
        #[arg(long)]
        calldata: String,
    },

    /// List tracked actions
    List {
        /// Include executed actions
        #[arg(long)]
        all: bool,
    },

    /// Show one action (id prefix accepted)
    Show { id: String },

    /// Schedule one action
    Schedule {
        label: String,
        #[arg(long)]
        target: String,
        /// Hex-encoded calldata
        #[arg(long)]
        calldata: String,
        /// Wei attached at execution
        #[arg(long)]
        value: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    /// Schedule every action in the governance plan
    ScheduleAll {
        /// Plan file (default: .timelock/plan.yaml)
        #[arg(long)]
        plan: Option<PathBuf>,
    },

    /// Refresh pending actions from the timelock program
    Reconcile,

    /// Execute every pending action whose buffer has elapsed
    ExecuteAll,
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());
    let rpc_url = cli.rpc_url.as_deref();

    let result = match cli.command {
        Commands::Init {
            timelock,
            sender,
            store,
        } => cmd::init::run(
            &root,
            cmd::init::InitArgs {
                rpc_url,
                timelock: timelock.as_deref(),
                sender: sender.as_deref(),
                store: store.as_deref(),
            },
        ),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, rpc_url, cli.json),
        Commands::Id {
            label,
            target,
            calldata,
        } => cmd::id::run(&label, &target, &calldata, cli.json),
        Commands::List { all } => cmd::list::run(&root, all, cli.json),
        Commands::Show { id } => cmd::show::run(&root, &id, cli.json),
        Commands::Schedule {
            label,
            target,
            calldata,
            value,
            description,
        } => cmd::schedule::run(
            &root,
            rpc_url,
            cmd::schedule::ScheduleArgs {
                label: &label,
                target: &target,
                calldata: &calldata,
                value: value.as_deref(),
                description: description.as_deref(),
            },
            cli.json,
        ),
        Commands::ScheduleAll { plan } => {
            cmd::schedule::run_all(&root, rpc_url, plan.as_deref(), cli.json)
        }
        Commands::Reconcile => cmd::reconcile::run(&root, rpc_url, cli.json),
        Commands::ExecuteAll => cmd::execute::run(&root, rpc_url, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
