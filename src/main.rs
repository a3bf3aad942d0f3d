use clap::Parser;
use clap::error::ErrorKind;
use std::process::ExitCode;
use tracing::debug;

use timerlog::aggregator::LogAggregator;
use timerlog::cli::Args;
use timerlog::error::AggregateError;
use timerlog::formatter::{Summary, print_json, print_summary};
use timerlog::logging::init_logging;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            // Missing or surplus positionals; values are only checked afterwards
            ErrorKind::MissingRequiredArgument | ErrorKind::UnknownArgument => {
                println!("2 arguments needed");
                return ExitCode::from(2);
            }
            _ => e.exit(),
        },
    };

    init_logging();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), AggregateError> {
    let (start, end) = args.range()?;
    let aggregator = LogAggregator::new(args.log_dir.clone());
    let files_scanned = end.saturating_sub(start).max(0) as usize;
    debug!(
        log_dir = %aggregator.log_dir().display(),
        start,
        end,
        "aggregating worker logs"
    );

    if args.json {
        let mut error_lines = Vec::new();
        let acc = aggregator.aggregate_range(start, end, |line| {
            error_lines.push(line.to_string())
        })?;

        let summary = Summary {
            files_scanned,
            timer_records: acc.count,
            error_lines: error_lines.len(),
            average_ms: acc.average()?,
        };
        print_json(&summary, &error_lines);
        return Ok(());
    }

    // Error lines go out as soon as they are found
    let mut error_lines = 0;
    let acc = aggregator.aggregate_range(start, end, |line| {
        println!("{}", line);
        error_lines += 1;
    })?;

    let summary = Summary {
        files_scanned,
        timer_records: acc.count,
        error_lines,
        average_ms: acc.average()?,
    };
    print_summary(&summary, args.stats);

    Ok(())
}
