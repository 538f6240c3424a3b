use anyhow::{Context, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use slipway_core::{
    DurationAdjustments, Language, MitigationRequest, ProjectSnapshot, ScenarioChanges,
    analyze_variance, critical_path, project_report, score_confidence, simulate_scenario,
    solve_schedule,
};
use slipway_ingest::SnapshotSource;
use slipway_ingest::types::DEFAULT_TIMEZONE;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod config;
mod llm;
mod state;

#[derive(Parser, Debug)]
#[command(
    name = "slipway",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("SLIPWAY_BUILD_SHA"), ")"),
    about = "Critical-path scheduling and schedule-risk analysis"
)]
struct Cli {
    /// More log output on stderr (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Single-line JSON instead of pretty-printed
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct InputArgs {
    /// Project snapshot as one JSON document
    #[arg(long, conflicts_with_all = ["tasks", "deps"])]
    snapshot: Option<PathBuf>,

    /// Task export (CSV)
    #[arg(long)]
    tasks: Option<PathBuf>,

    /// Dependency export (CSV)
    #[arg(long, requires = "tasks")]
    deps: Option<PathBuf>,

    /// IANA timezone for local dates in CSV exports
    #[arg(long, default_value = DEFAULT_TIMEZONE)]
    tz: String,
}

impl InputArgs {
    fn source(&self) -> Result<SnapshotSource> {
        match (&self.snapshot, &self.tasks) {
            (Some(p), _) => Ok(SnapshotSource::Json(p.clone())),
            (None, Some(tasks)) => Ok(SnapshotSource::Csv {
                tasks: tasks.clone(),
                dependencies: self.deps.clone(),
                timezone: self.tz.clone(),
            }),
            (None, None) => bail!("no input: pass --snapshot <json> or --tasks <csv> [--deps <csv>]"),
        }
    }

    fn load(&self) -> Result<ProjectSnapshot> {
        let source = self.source()?;
        let snapshot = source.load()?;
        if snapshot.tasks.is_empty() {
            tracing::warn!(?source, "snapshot has no tasks");
        }
        Ok(snapshot)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Critical path: task ids, total duration, per-task detail
    CriticalPath {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Full ES/EF/LS/LF/slack table for every task
    Schedule {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Delay factors of completed tasks, grouped
    Variance {
        #[command(flatten)]
        input: InputArgs,
    },

    /// How much to trust the estimates
    Confidence {
        #[command(flatten)]
        input: InputArgs,
    },

    /// What-if: compare a scenario against the baseline schedule
    Simulate {
        #[command(flatten)]
        input: InputArgs,

        /// Scenario changes (JSON)
        #[arg(long)]
        scenario: PathBuf,
    },

    /// Ask the suggestion generator for mitigations
    Mitigate {
        #[command(flatten)]
        input: InputArgs,

        /// Language for the suggestions (en, he); defaults to the config
        #[arg(long)]
        language: Option<Language>,

        /// Print the request instead of sending it
        #[arg(long)]
        dry_run: bool,
    },

    /// Critical path, variance, and confidence in one document
    Report {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Manage ~/.slipway/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config (API key redacted)
    Show,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn emit<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .context("serialize output")?;
    println!("{out}");
    Ok(())
}

fn load_scenario(path: &Path) -> Result<ScenarioChanges> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parsing {}", path.display()))
}

fn mitigation_request(snapshot: &ProjectSnapshot, language: Language) -> MitigationRequest {
    let report = project_report(snapshot);
    MitigationRequest::build(&report.critical_path, &report.variance, &report.confidence, language)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Only `mitigate` and `config show` need the config file to be readable.
    let pretty = !cli.compact && config::output_or_default(config::load_config()).pretty;

    match cli.command {
        Command::CriticalPath { input } => {
            let s = input.load()?;
            emit(&critical_path(&s.tasks, &s.dependencies), pretty)?;
        }

        Command::Schedule { input } => {
            let s = input.load()?;
            let schedule = solve_schedule(&s.tasks, &s.dependencies, &DurationAdjustments::none());
            emit(&schedule, pretty)?;
        }

        Command::Variance { input } => {
            let s = input.load()?;
            emit(&analyze_variance(&s.tasks), pretty)?;
        }

        Command::Confidence { input } => {
            let s = input.load()?;
            emit(&score_confidence(&s.tasks), pretty)?;
        }

        Command::Simulate { input, scenario } => {
            let s = input.load()?;
            let changes = load_scenario(&scenario)?;
            emit(&simulate_scenario(&s.tasks, &s.dependencies, &changes), pretty)?;
        }

        Command::Mitigate {
            input,
            language,
            dry_run,
        } => {
            let s = input.load()?;

            if dry_run {
                let language = language
                    .unwrap_or_else(|| config::output_or_default(config::load_config()).language);
                let request = mitigation_request(&s, language);
                emit(
                    &serde_json::json!({
                        "system": request.system_prompt(),
                        "user": request.user_prompt(),
                    }),
                    pretty,
                )?;
                return Ok(());
            }

            let cfg = config::load_config()?;
            let request = mitigation_request(&s, language.unwrap_or(cfg.output.language));
            let settings = cfg.generator_settings(std::env::var(config::API_KEY_ENV).ok());
            let suggestions =
                llm::request_suggestions(&cfg.generator.provider, &settings, &request).await?;
            emit(&suggestions, pretty)?;
        }

        Command::Report { input } => {
            let s = input.load()?;
            emit(&project_report(&s), pretty)?;
        }

        Command::Config { command } => match command {
            ConfigCommand::Init => {
                let p = config::init_config()?;
                println!("{}", p.display());
            }
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                let shown = toml::to_string_pretty(&cfg.redacted()).context("serialize config")?;
                eprintln!("# {}", config::config_path()?.display());
                print!("{shown}");
            }
        },
    }

    Ok(())
}
