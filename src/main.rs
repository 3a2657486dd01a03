use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repomirror::config::{parse_mappings, parse_name_list};
use repomirror::{Config, MirrorDriver};

#[derive(Parser)]
#[command(name = "repomirror")]
#[command(about = "Mirror git repositories between hosting providers")]
#[command(version)]
struct Cli {
    /// Source coordinate, e.g. github/xiexianbin
    #[arg(long)]
    src: Option<String>,

    /// Source provider access token (needed to list private repositories)
    #[arg(long)]
    src_token: Option<String>,

    /// Destination coordinate, e.g. gitee/xiexianbin
    #[arg(long)]
    dst: Option<String>,

    /// SSH private key used to push to the destination
    #[arg(long)]
    dst_key: Option<String>,

    /// Destination provider access token (needed to create repositories)
    #[arg(long)]
    dst_token: Option<String>,

    /// Source account kind: user or org
    #[arg(long)]
    account_type: Option<String>,

    /// Destination account kind, defaults to --account-type
    #[arg(long)]
    dst_account_type: Option<String>,

    /// Clone/push transport: ssh or https
    #[arg(long)]
    clone_style: Option<String>,

    /// Local working-copy cache root
    #[arg(long)]
    cache_path: Option<String>,

    /// Repositories to skip, e.g. "repo1,repo2,repo3"
    #[arg(long)]
    black_list: Option<String>,

    /// Mirror exactly these repositories, e.g. "repo1,repo2,repo3"
    #[arg(long)]
    white_list: Option<String>,

    /// Source to destination renames, e.g. "A=>B, C=>CC"
    #[arg(long)]
    mappings: Option<String>,

    /// Force-push branches and tags
    #[arg(long)]
    force_update: bool,

    /// Per-git-operation timeout, e.g. 600, 30m, 2h
    #[arg(long)]
    timeout: Option<String>,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose)?;
    info!("Starting repomirror v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&cli)?;
    let spec = config.resolve()?;

    let driver = MirrorDriver::new(spec).await?;
    let summary = driver.run().await?;

    println!("Mirror run complete");
    println!("   Planned:           {}", summary.planned);
    println!("   Mirrored:          {}", summary.mirrored);
    println!("   Empty (skipped):   {}", summary.skipped_empty);
    println!("   Metadata failures: {}", summary.metadata_failures);

    Ok(())
}

/// Initialize logging based on verbosity level
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    Ok(())
}

/// Load the YAML configuration (explicit path, else the default location,
/// else built-in defaults) and apply CLI flags on top. Flags win.
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => {
            let path = Config::default_config_path()?;
            if path.exists() {
                Config::load(&path)?
            } else {
                Config::default()
            }
        }
    };

    if let Some(src) = &cli.src {
        config.source = src.clone();
    }
    if let Some(dst) = &cli.dst {
        config.destination = dst.clone();
    }
    if cli.src_token.is_some() {
        config.source_token = cli.src_token.clone();
    }
    if cli.dst_token.is_some() {
        config.dest_token = cli.dst_token.clone();
    }
    if cli.dst_key.is_some() {
        config.dest_ssh_key = cli.dst_key.clone();
    }
    if let Some(kind) = &cli.account_type {
        config.account_type = kind.clone();
    }
    if cli.dst_account_type.is_some() {
        config.dest_account_type = cli.dst_account_type.clone();
    }
    if let Some(style) = &cli.clone_style {
        config.clone_style = style.clone();
    }
    if let Some(path) = &cli.cache_path {
        config.cache_path = path.clone();
    }
    if let Some(list) = &cli.black_list {
        config.black_list = parse_name_list(list);
    }
    if let Some(list) = &cli.white_list {
        config.white_list = parse_name_list(list);
    }
    if let Some(mappings) = &cli.mappings {
        config.mappings = parse_mappings(mappings)?;
    }
    if cli.force_update {
        config.force_update = true;
    }
    if let Some(timeout) = &cli.timeout {
        config.timeout = timeout.clone();
    }

    Ok(config)
}
