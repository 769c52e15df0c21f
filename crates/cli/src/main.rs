mod args;

use std::{path::Path, sync::Arc};

use args::{GlobalArgs, RunArgs};
use clap::{Parser, Subcommand};
use colored::Colorize;
use feegate_lib::{
    error::SuiteError,
    log::LoggingFormat,
    runner::{Scenario, ScenarioOutcome, ScenarioStatus},
    scenarios, Config, NodeClient, ScenarioRunner, SimulatedLedger, SuiteEnvironment,
    SuiteResult, TransactionService,
};

#[derive(Subcommand)]
enum Commands {
    /// Run the fee-boundary suite
    #[command(
        about = "Run the fee-boundary suite",
        long_about = "Run every scenario (or the ones named with --filter) against the configured node and matcher.\n\nExits with status 1 when any scenario failed or errored."
    )]
    Run {
        #[command(flatten)]
        run_args: RunArgs,
    },
    /// List the scenarios in execution order
    List,
    /// Configuration management commands
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Validate configuration file (no network calls)
    Validate,
}

#[derive(Parser)]
#[command(author, version, about = "feegate - fee-boundary harness for node and matcher services", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    pub global_args: GlobalArgs,
}

#[tokio::main]
async fn main() -> Result<(), SuiteError> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run { run_args }) => {
            setup_logging(&cli.global_args.logging_format);

            let selected = select_scenarios(&run_args.filters).unwrap_or_else(|e| {
                print_error(&e.to_string());
                std::process::exit(1);
            });

            let (config, service) = build_service(&cli.global_args.config, run_args.simulate)
                .unwrap_or_else(|e| {
                    print_error(&format!("Failed to set up the suite: {e}"));
                    std::process::exit(1);
                });

            let env = SuiteEnvironment::from_config(&config, service)?;
            let mut runner = ScenarioRunner::new(env);
            let scenarios: Vec<&Scenario> = selected.iter().collect();
            runner.run_all(&scenarios).await;

            for outcome in runner.outcomes() {
                print_outcome(outcome);
            }
            let result = runner.finalize();
            print_summary(&result, run_args.json)?;

            if !result.is_successful() {
                std::process::exit(1);
            }
        }
        Some(Commands::List) => {
            for scenario in scenarios::catalog() {
                println!("{:<28} {}", scenario.name, scenario.description);
            }
        }
        Some(Commands::Config { config_command }) => match config_command {
            ConfigCommands::Validate => {
                let config = Config::load_config(&cli.global_args.config).unwrap_or_else(|e| {
                    print_error(&format!("Failed to load config: {e}"));
                    std::process::exit(1);
                });
                if let Err(e) = config.validate(true) {
                    print_error(&format!("Validation error: {e}"));
                    std::process::exit(1);
                }
                println!("Configuration {} is valid", cli.global_args.config);
            }
        },
        None => {
            println!("No command specified. Use --help for usage information.");
            println!("Available commands:");
            println!("  run              - Run the fee-boundary suite");
            println!("  list             - List scenarios");
            println!("  config validate  - Validate configuration");
        }
    }

    Ok(())
}

/// Scenarios named by `--filter`, or the whole catalog.
fn select_scenarios(filters: &[String]) -> Result<Vec<Scenario>, SuiteError> {
    if filters.is_empty() {
        return Ok(scenarios::catalog());
    }
    filters
        .iter()
        .map(|name| {
            scenarios::find(name)
                .ok_or_else(|| SuiteError::Config(format!("Unknown scenario '{name}'")))
        })
        .collect()
}

/// A simulated run uses the config file when it exists, otherwise built-in
/// defaults. A live run requires the file and both account secrets.
fn build_service(
    path: &str,
    simulate: bool,
) -> Result<(Config, Arc<dyn TransactionService>), SuiteError> {
    if simulate {
        let config = if Path::new(path).exists() {
            Config::load_config(path)?
        } else {
            tracing::info!("{path} not found, using simulation defaults");
            Config::for_simulation()
        };
        config.validate(false)?;
        let ledger = SimulatedLedger::new(&config)?;
        return Ok((config, Arc::new(ledger)));
    }

    let config = Config::load_config(path)?;
    config.validate(true)?;
    let client = NodeClient::new(&config.service)?;
    Ok((config, Arc::new(client)))
}

fn print_outcome(outcome: &ScenarioOutcome) {
    let elapsed = format!("{:.2}s", outcome.elapsed.as_secs_f64());
    match &outcome.status {
        ScenarioStatus::Passed => {
            println!("{} {} ({elapsed})", "PASS ".green().bold(), outcome.name)
        }
        ScenarioStatus::Failed(failures) => {
            println!("{} {} ({elapsed})", "FAIL ".red().bold(), outcome.name);
            for failure in failures {
                println!("      {failure}");
            }
        }
        ScenarioStatus::Errored { kind, message } => {
            println!("{} {} ({elapsed})", "ERROR".red().bold(), outcome.name);
            println!("      {kind}: {message}");
        }
        ScenarioStatus::Skipped(reason) => {
            println!("{} {} ({reason})", "SKIP ".yellow().bold(), outcome.name)
        }
    }
}

fn print_summary(result: &SuiteResult, json: bool) -> Result<(), SuiteError> {
    if json {
        println!("{}", serde_json::to_string_pretty(&result.summary())?);
    } else {
        println!();
        println!("{result}");
    }
    Ok(())
}

fn print_error(message: &str) {
    eprintln!("Error: {message}");
}

fn setup_logging(format: &LoggingFormat) {
    let env_filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info,reqwest=warn,hyper=warn".into());

    let subscriber = tracing_subscriber::fmt().with_env_filter(env_filter);
    match format {
        LoggingFormat::Standard => subscriber.init(),
        LoggingFormat::Json => subscriber.json().init(),
    }
}
