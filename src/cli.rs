use crate::aggregator::DEFAULT_LOG_DIR;
use crate::error::AggregateError;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(name = "timerlog")]
#[clap(about = "Average [Timer] measurements across numbered worker logs", long_about = None)]
#[clap(version = env!("CARGO_PKG_VERSION"))]
#[clap(allow_negative_numbers = true)]
pub struct Args {
    /// First worker index to read (inclusive)
    pub start: String,

    /// Worker index to stop at (exclusive)
    pub end: String,

    /// Directory holding the outputworker<N> files
    #[clap(long, env = "TIMERLOG_DIR", default_value = DEFAULT_LOG_DIR)]
    pub log_dir: PathBuf,

    /// Show record, file and error-line counts
    #[clap(long)]
    pub stats: bool,

    /// Output the summary in JSON format
    #[clap(long)]
    pub json: bool,
}

impl Args {
    /// Converts the positionals to worker indices.
    ///
    /// Kept out of clap's value parsing so a wrong positional count is always
    /// reported as such, whatever the values look like.
    pub fn range(&self) -> Result<(i64, i64), AggregateError> {
        Ok((parse_index(&self.start)?, parse_index(&self.end)?))
    }
}

fn parse_index(value: &str) -> Result<i64, AggregateError> {
    value
        .parse()
        .map_err(|source| AggregateError::InvalidIndex {
            value: value.to_string(),
            source,
        })
}
