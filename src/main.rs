use std::{error::Error, process, time::Duration};

use clap::{command, Parser, Subcommand, ValueHint};
use log::{debug, error, info, warn, LevelFilter};
use serde::Serialize;

use botarc::{
    config::Config,
    protocol::{BatchPlan, Difficulty, RecentCount, UserKey},
    v4,
};

/// Profile to display when not built in release mode.
#[cfg(debug_assertions)]
const BUILD_PROFILE: &str = "debug";
/// Profile to display when not built release mode.
#[cfg(not(debug_assertions))]
const BUILD_PROFILE: &str = "release";

/// Group name for mutually exclusive logging options.
const ARGS_GROUP_LOGGING: &str = "logging";

/// Group name for mutually exclusive configuration sources.
const ARGS_GROUP_CONFIG: &str = "config";

/// Command line arguments as parsed by `clap`.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    ///
    /// TOML file with `base_url` and optionally `timeout_ms` and
    /// `rate_limit`.
    #[arg(short, long, value_name = "FILE", value_hint = ValueHint::FilePath, group = ARGS_GROUP_CONFIG)]
    config: Option<String>,

    /// Root of the API
    #[arg(short, long, value_name = "URL", value_hint = ValueHint::Url, group = ARGS_GROUP_CONFIG)]
    base_url: Option<String>,

    /// Request timeout in milliseconds
    ///
    /// Overrides the configuration file.
    #[arg(long, value_name = "MS")]
    timeout_ms: Option<u64>,

    /// Suppresses all output except warnings and errors.
    #[arg(short, long, default_value_t = false, group = ARGS_GROUP_LOGGING)]
    quiet: bool,

    /// Enable verbose logging
    ///
    /// Specify twice for trace logging.
    #[arg(short, long, action = clap::ArgAction::Count, group = ARGS_GROUP_LOGGING)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

/// Operations, all against API v4.
#[derive(Clone, Debug, Hash, PartialEq, Eq, Subcommand)]
enum Command {
    /// Account info with recent scores
    Info {
        /// User code, or display name with `--fuzzy`
        user: String,

        /// Look the user up by display name
        #[arg(short, long, default_value_t = false)]
        fuzzy: bool,

        /// Number of recent scores, 0 to 7
        #[arg(short, long, default_value_t = 0)]
        recent: i64,
    },

    /// Best score on one chart, with song info and aliases
    Best {
        /// User code, or display name with `--fuzzy`
        user: String,

        /// Song name or alias
        song: String,

        /// Look the user up by display name
        #[arg(short, long, default_value_t = false)]
        fuzzy: bool,

        /// Difficulty tier, 0 (past) to 3 (beyond)
        #[arg(short, long)]
        difficulty: Option<i64>,
    },

    /// Best 30 with song info for every entry
    Best30 {
        /// User code, or display name with `--fuzzy`
        user: String,

        /// Look the user up by display name
        #[arg(short, long, default_value_t = false)]
        fuzzy: bool,

        /// Number of recent scores, 0 to 7
        #[arg(short, long, default_value_t = 0)]
        recent: i64,
    },

    /// Song info
    Song {
        /// Song name or alias
        song: String,
    },

    /// Submit a batch plan and print the raw results
    Batch {
        /// Plan as JSON array of `{id, bind?, endpoint}`
        calls: String,
    },
}

/// Initializes the logger facade.
///
/// The logging level is determined as follows, in order of precedence from
/// highest to lowest:
/// 1. Command line arguments
/// 2. `RUST_LOG` environment variable
/// 3. Hard coded default
///
/// # Panics
///
/// Panics when a logger facade is already initialized.
fn init_logger(config: &Args) {
    let mut logger = env_logger::Builder::from_env(
        env_logger::Env::default().filter_or(env_logger::DEFAULT_FILTER_ENV, "info"),
    );

    if config.quiet || config.verbose > 0 {
        let level = match config.verbose {
            // Quiet and verbose are mutually exclusive.
            0 => LevelFilter::Warn,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        // Filter log messages of external crates.
        logger.filter_module(module_path!(), level);
    }

    logger.init();
}

/// Builds the client configuration from a file or a base URL.
fn load_config(args: &Args) -> Result<Config, Box<dyn Error>> {
    let mut config = match (&args.config, &args.base_url) {
        (Some(path), _) => Config::from_file(path)?,
        (None, Some(base_url)) => Config::parse(base_url)?,
        (None, None) => return Err("either --config or --base-url is required".into()),
    };

    if let Some(timeout_ms) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(timeout_ms));
    }

    Ok(config)
}

fn print_json(value: &impl Serialize) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Runs the selected command and prints its result.
///
/// # Errors
///
/// Returns error if the configuration is invalid or the request fails.
async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let config = load_config(&args)?;
    info!("using {}", config.base_url);

    let client = v4::Client::new(&config)?;

    match args.command {
        Command::Info {
            user,
            fuzzy,
            recent,
        } => {
            let info = client
                .user()
                .info(&UserKey::new(user, fuzzy), RecentCount::new(recent))
                .await?;
            print_json(&info)
        }

        Command::Best {
            user,
            song,
            fuzzy,
            difficulty,
        } => {
            let best = client
                .util()
                .user_best(
                    &UserKey::new(user, fuzzy),
                    &song,
                    difficulty.map(Difficulty::from_raw),
                )
                .await?;
            print_json(&best)
        }

        Command::Best30 {
            user,
            fuzzy,
            recent,
        } => {
            let best30 = client
                .util()
                .user_best30(&UserKey::new(user, fuzzy), RecentCount::new(recent))
                .await?;
            print_json(&best30)
        }

        Command::Song { song } => {
            let info = client.song().info(&song).await?;
            print_json(&info)
        }

        Command::Batch { calls } => {
            let plan: BatchPlan = calls.parse()?;
            if let Err(e) = plan.validate() {
                // The server may still accept it, so only warn.
                warn!("{e}");
            }

            let results = client.batch(&plan).await?;
            print_json(&results)
        }
    }
}

/// Main entry point of the application.
#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logger(&args);

    // Dump command line arguments before we do anything more.
    debug!("Command {:#?}", args);

    let cmd = command!();
    let name = cmd.get_name().to_string();
    let version = cmd.get_version().unwrap_or("UNKNOWN").to_string();

    info!("starting {name}/{version}; {BUILD_PROFILE}");

    if let Err(e) = run(args).await {
        error!("{e}");
        process::exit(1);
    }
}
