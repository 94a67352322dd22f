mod config;
mod error;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use policy::{
    AccessQuery, ErrorProps, PolicyCache, PolicySnapshot, ResourceSet, SecureGate,
    SessionPayload, Verdict, wildcard_grants,
};
use session::{AuthFlow, ConsoleClient};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const CONFIG_FILE: &str = "bucketgate.toml";
const DENIED_EXIT: u8 = 2;

#[derive(Parser)]
#[command(name = "bucketgate")]
#[command(about = "Evaluate object-storage console permissions", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ./bucketgate.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct QueryArgs {
    /// Session payload (JSON) to evaluate against
    #[arg(long)]
    session: PathBuf,
    /// Resource to check (repeatable)
    #[arg(short, long = "resource", required = true)]
    resources: Vec<String>,
    /// Required scope (repeatable)
    #[arg(short, long = "scope", required = true)]
    scopes: Vec<String>,
    /// Require every scope instead of any
    #[arg(long)]
    match_all: bool,
    /// Accept grants on sub-resources of the requested resources
    #[arg(long)]
    contains_resource: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate an access query (exit status 2 when denied)
    Check {
        #[command(flatten)]
        query: QueryArgs,
        /// Also accept wildcard grants covering or below the first resource
        #[arg(long)]
        wildcard_grants: bool,
    },
    /// Print the display verdict for a gated affordance
    Gate {
        #[command(flatten)]
        query: QueryArgs,
        /// Disable instead of hiding when denied
        #[arg(long)]
        disable: bool,
        /// Tooltip to attach to a disabled affordance
        #[arg(long, requires = "disable")]
        tooltip: Option<String>,
    },
    /// Sign in to the console server and list the granted statements
    Whoami,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Check {
            query,
            wildcard_grants,
        } => cmd_check(&query, wildcard_grants),
        Commands::Gate {
            query,
            disable,
            tooltip,
        } => cmd_gate(&query, disable, tooltip),
        Commands::Whoami => cmd_whoami(cli.config.as_deref()).await,
    }
}

fn cmd_check(args: &QueryArgs, include_wildcards: bool) -> Result<ExitCode> {
    let snapshot = load_snapshot(&args.session)?;

    let mut query = AccessQuery::new(args.resources.clone(), &args.scopes);
    if args.match_all {
        query = query.match_all();
    }
    if args.contains_resource {
        query = query.contains_resource();
    }
    if include_wildcards {
        let path = args.resources.first().map(String::as_str).unwrap_or_default();
        let grants = wildcard_grants(&snapshot, path, &args.scopes);
        debug!(?grants, "adding wildcard grants");
        query = query.with_resources(grants);
    }

    if snapshot.evaluate(&query) {
        println!("allow");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("deny");
        Ok(ExitCode::from(DENIED_EXIT))
    }
}

fn cmd_gate(args: &QueryArgs, disable: bool, tooltip: Option<String>) -> Result<ExitCode> {
    let snapshot = load_snapshot(&args.session)?;

    let mut gate = SecureGate::new(args.resources.clone(), &args.scopes);
    if args.match_all {
        gate = gate.match_all();
    }
    if args.contains_resource {
        gate = gate.contains_resource();
    }
    if disable {
        let mut props = ErrorProps::disabled();
        if let Some(tooltip) = tooltip {
            props = props.with_tooltip(tooltip);
        }
        gate = gate.error_props(props);
    }

    match gate.decide(&snapshot) {
        Verdict::Render => println!("render"),
        Verdict::Hide => println!("hide"),
        Verdict::Disable(props) => println!("disable {}", serde_json::to_string(&props)?),
    }
    Ok(ExitCode::SUCCESS)
}

async fn cmd_whoami(config_path: Option<&Path>) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let credentials = config.credentials()?;

    let flow = AuthFlow::new(Arc::new(PolicyCache::new()));
    let client = ConsoleClient::builder(&config.server.url, flow)
        .timeout(config.timeout())
        .build()?;

    let snapshot = client.sign_in(&credentials).await?;
    print_session(&snapshot);

    if let Err(e) = client.logout().await {
        warn!(error = %e, "logout failed");
    }
    Ok(ExitCode::SUCCESS)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Ok(Config::load(path)?),
        None if Path::new(CONFIG_FILE).exists() => Ok(Config::load(CONFIG_FILE)?),
        None => Ok(Config::default()),
    }
}

/// Load a session payload through the auth flow, as a login would.
fn load_snapshot(path: &Path) -> Result<PolicySnapshot> {
    if !path.exists() {
        return Err(Error::SessionFileNotFound {
            path: path.to_path_buf(),
        });
    }
    let payload = SessionPayload::load(path)?;
    let flow = AuthFlow::new(Arc::new(PolicyCache::new()));
    Ok(flow.establish(payload))
}

fn print_session(snapshot: &PolicySnapshot) {
    let Some(session) = snapshot.session() else {
        println!("Not signed in.");
        return;
    };

    println!("Identity: {}", session.identity());
    if session.is_empty() {
        println!("No statements granted.");
        return;
    }

    println!("{:<24}  {:<6}  {:<40}  RESOURCES", "STATEMENT", "EFFECT", "ACTIONS");
    println!("{}", "-".repeat(100));

    let mut statements: Vec<_> = session.statements().collect();
    statements.sort_by_key(|(id, _)| *id);
    for (id, statement) in statements {
        let actions = statement
            .actions()
            .map(|a| a.as_str())
            .collect::<Vec<_>>()
            .join(",");
        let resources = match statement.resources() {
            ResourceSet::All => "*".to_string(),
            ResourceSet::Patterns(patterns) => patterns
                .iter()
                .map(|p| p.to_string())
                .collect::<Vec<_>>()
                .join(","),
        };
        println!(
            "{:<24}  {:<6}  {:<40}  {resources}",
            id,
            statement.effect().to_string(),
            actions
        );
    }
}
