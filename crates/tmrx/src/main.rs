mod exit;
mod logging;
mod output;
mod receive;
mod viewer;

use clap::Parser;

use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;
use crate::receive::ReceiveArgs;

#[derive(Parser, Debug)]
#[command(
    name = "tmrx",
    version,
    about = "Receive a telemetry downlink into archived images and an XML catalog"
)]
struct Cli {
    /// Run summary output format.
    #[arg(long, value_name = "FORMAT")]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", env = "TMRX_LOG_FORMAT")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info", env = "TMRX_LOG_LEVEL")]
    log_level: LogLevel,

    #[command(flatten)]
    receive: ReceiveArgs,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = receive::run(cli.receive, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}
