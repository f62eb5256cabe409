use std::process::ExitCode;

use io_perf::bench;
use io_perf::cli::{is_informational, Cli};
use io_perf::error::{render_chain, FAILURE_EXIT_CODE};
use io_perf::logging::init_logger;
use io_perf::{IoPerfError, Result};

fn main() -> ExitCode {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) if is_informational(&err) => err.exit(),
        Err(err) => return fail(err.into()),
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => fail(err),
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = cli.into_config();
    let logger = init_logger(&config)?;
    bench::run(config, &logger)?;
    Ok(())
}

fn fail(err: IoPerfError) -> ExitCode {
    eprint!("{}", render_chain(&err));
    eprintln!("\nError: {}", err);
    ExitCode::from(FAILURE_EXIT_CODE)
}
