use clap::Parser;
use feegate_lib::log::LoggingFormat;

/// Global arguments used by all subcommands
#[derive(Debug, Parser)]
#[command(name = "feegate")]
pub struct GlobalArgs {
    /// Path to feegate configuration file (TOML format)
    #[arg(long, env = "FEEGATE_CONFIG", default_value = "feegate.toml", global = true)]
    pub config: String,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LoggingFormat::Standard, global = true)]
    pub logging_format: LoggingFormat,
}

/// Arguments of `feegate run`
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Only run the named scenario; may be repeated
    #[arg(long = "filter", value_name = "NAME")]
    pub filters: Vec<String>,

    /// Run against the in-process simulated ledger instead of a live node
    #[arg(long, default_value_t = false)]
    pub simulate: bool,

    /// Print the summary as JSON instead of colored lines
    #[arg(long, default_value_t = false)]
    pub json: bool,
}
