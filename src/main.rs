//! metaconf: resolve a binding file and print the operative configuration.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Parse CLI arguments
//!   3. Load tool settings (CLI flags layered on top)
//!   4. Resolve effective log level (CLI `-v` flags > env > settings)
//!   5. Init logger once
//!   6. Resolve the root file and print it

use std::io::Write;
use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::info;

use metaconf::bootstrap::logger;
use metaconf::config;
use metaconf::error::AppError;

/// Command-line arguments accepted by the `metaconf` binary.
#[derive(Parser, Debug)]
#[command(
    name = "metaconf",
    version,
    about = "Resolve include-composed binding files and print the operative configuration"
)]
struct CliArgs {
    /// Root binding file.
    #[arg(value_name = "ROOT")]
    root: PathBuf,

    /// Settings file (default: config/default.toml).
    #[arg(short = 'f', long = "settings", value_name = "FILE", env = "METACONF_SETTINGS")]
    settings: Option<String>,

    /// Directory searched for include targets; searched before the settings file's paths.
    #[arg(short = 'I', long = "search-path", value_name = "DIR")]
    search_paths: Vec<PathBuf>,

    /// Extra binding applied after the root file, e.g. `LearnerConfig.learning_rate = 0.01`.
    #[arg(short = 'b', long = "binding", value_name = "BINDING")]
    bindings: Vec<String>,

    /// Fail when a key is bound more than once.
    #[arg(long)]
    strict: bool,

    /// Print JSON instead of binding-file syntax.
    #[arg(long)]
    json: bool,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), AppError> {
    // Load .env if present; the file is optional.
    let _ = dotenvy::dotenv();

    let args = CliArgs::parse();

    let mut settings = config::load(args.settings.as_deref())?;
    if !args.search_paths.is_empty() {
        let mut search_paths = args.search_paths.clone();
        search_paths.append(&mut settings.resolver.search_paths);
        settings.resolver.search_paths = search_paths;
    }
    settings.resolver.bindings.extend(args.bindings.iter().cloned());
    settings.resolver.strict |= args.strict;

    let cli_level = logger::level_for_verbosity(args.verbose);
    let effective_log_level = cli_level.unwrap_or(settings.log_level.as_str());
    logger::parse_level(effective_log_level)?;
    logger::init(effective_log_level, cli_level.is_some())?;

    info!(
        root = %args.root.display(),
        search_paths = ?settings.resolver.search_paths,
        strict = settings.resolver.strict,
        extra_bindings = settings.resolver.bindings.len(),
        "settings loaded"
    );

    let resolved = settings.resolver.resolver().resolve(&args.root)?;

    let rendered = if args.json {
        let mut text = serde_json::to_string_pretty(&resolved.to_json())?;
        text.push('\n');
        text
    } else {
        resolved.to_config_string()
    };

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(rendered.as_bytes())?;
    stdout.flush()?;
    Ok(())
}
