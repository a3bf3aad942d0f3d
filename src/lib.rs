// Declare our modules
pub mod accelerated;
pub mod aggregator;
pub mod cli;
pub mod error;
pub mod formatter;
pub mod logging;

// Re-export key types for convenience
pub use aggregator::{Accumulator, LogAggregator, TimerEntry, TimerUnit};
pub use cli::Args;
pub use error::{AggregateError, RecordError};
pub use formatter::{Summary, print_summary};
