use crate::accelerated::LinePrefilter;
use crate::error::{AggregateError, RecordError};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::num::ParseIntError;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

pub const TIMER_MARKER: &str = "[Timer]";

/// Tokens that cause the whole line to be echoed.
pub const ERROR_MARKERS: [&str; 5] = ["[Error]", "error", "Error", "[error]", "Error:"];

/// Directory the workers write their output files to.
pub const DEFAULT_LOG_DIR: &str = "/data/aaron/test_gquery/gquery/output";

pub const WORKER_LOG_PREFIX: &str = "outputworker";

const MILLIS_UNIT: &str = "ms";

pub fn is_error_marker(token: &str) -> bool {
    ERROR_MARKERS.contains(&token)
}

/// Running product and count of every timer record seen so far.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Accumulator {
    pub product: f64,
    pub count: usize,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Accumulator {
    pub fn new() -> Self {
        Accumulator {
            product: 1.0,
            count: 0,
        }
    }

    pub fn record(&mut self, millis: f64) {
        self.product *= millis;
        self.count += 1;
    }

    /// The `count`-th root of the product, i.e. the geometric mean in milliseconds.
    pub fn average(&self) -> Result<f64, AggregateError> {
        if self.count == 0 {
            return Err(AggregateError::EmptyAggregate);
        }

        let average = self.product.powf(1.0 / self.count as f64);
        // A negative product under an even or fractional root
        if average.is_nan() {
            return Err(AggregateError::UndefinedAverage {
                product: self.product,
                count: self.count,
            });
        }
        Ok(average)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerUnit {
    Millis,
    /// Any unit other than `ms`; the value is treated as milliseconds to be
    /// reduced by a truncating division by 1000.
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerEntry {
    pub value: i64,
    pub unit: TimerUnit,
}

impl TimerEntry {
    /// Reads the record from the line's tokens at fixed positions 1 (value) and
    /// 2 (unit), wherever the marker itself sits on the line.
    pub fn parse(tokens: &[&str]) -> Result<Self, RecordError> {
        let value_token = tokens.get(1).ok_or(RecordError::MissingValue)?;
        let unit_token = tokens.get(2).ok_or(RecordError::MissingUnit)?;

        let value = parse_int_token(value_token).map_err(|source| RecordError::InvalidValue {
            token: (*value_token).to_string(),
            source,
        })?;

        let unit = if *unit_token == MILLIS_UNIT {
            TimerUnit::Millis
        } else {
            TimerUnit::Other
        };

        Ok(TimerEntry { value, unit })
    }

    pub fn millis(&self) -> f64 {
        match self.unit {
            TimerUnit::Millis => self.value as f64,
            // Integer division first, so 2500 contributes 2.0 rather than 2.5
            TimerUnit::Other => (self.value / 1000) as f64,
        }
    }
}

/// Integer tokens tolerate surrounding whitespace (tabs survive the split on
/// single spaces) and single `_` separators between digits, as in `1_000`.
fn parse_int_token(token: &str) -> Result<i64, ParseIntError> {
    let trimmed = token.trim();
    if !trimmed.contains('_') {
        return trimmed.parse();
    }

    let sign_len = if trimmed.starts_with(['+', '-']) { 1 } else { 0 };
    let (sign, digits) = trimmed.split_at(sign_len);
    let well_separated = digits
        .split('_')
        .all(|group| !group.is_empty() && group.bytes().all(|b| b.is_ascii_digit()));

    if well_separated {
        format!("{}{}", sign, digits.replace('_', "")).parse()
    } else {
        // Misplaced separators fail like any other stray character
        trimmed.parse()
    }
}

/// Scans one line, folding every `[Timer]` token into `acc` and calling
/// `on_error_line` with the whole line once per error-marker token.
pub fn scan_line<F>(
    acc: &mut Accumulator,
    line: &str,
    on_error_line: &mut F,
) -> Result<(), RecordError>
where
    F: FnMut(&str),
{
    let line = line.trim_end_matches('\n');
    let tokens: Vec<&str> = line.split(' ').collect();

    for token in &tokens {
        if *token == TIMER_MARKER {
            let entry = TimerEntry::parse(&tokens)?;
            trace!(value = entry.value, unit = ?entry.unit, "timer record");
            acc.record(entry.millis());
        } else if is_error_marker(token) {
            on_error_line(line);
        }
    }

    Ok(())
}

pub struct LogAggregator {
    log_dir: PathBuf,
    prefilter: LinePrefilter,
}

impl Default for LogAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_DIR)
    }
}

impl LogAggregator {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        LogAggregator {
            log_dir: log_dir.into(),
            prefilter: LinePrefilter::new(),
        }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn worker_log_path(&self, index: i64) -> PathBuf {
        self.log_dir.join(format!("{}{}", WORKER_LOG_PREFIX, index))
    }

    /// Scans every line of `reader`. `path` is only used to label errors.
    pub fn scan_reader<R, F>(
        &self,
        acc: &mut Accumulator,
        path: &Path,
        reader: R,
        on_error_line: &mut F,
    ) -> Result<(), AggregateError>
    where
        R: BufRead,
        F: FnMut(&str),
    {
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| AggregateError::read(path, e))?;

            if !self.prefilter.may_match(&line) {
                continue;
            }

            scan_line(acc, &line, on_error_line).map_err(|source| {
                AggregateError::MalformedRecord {
                    path: path.to_path_buf(),
                    line_number: idx + 1,
                    source,
                }
            })?;
        }

        Ok(())
    }

    /// Opens, scans and closes the worker log with the given index.
    pub fn aggregate_file<F>(
        &self,
        acc: &mut Accumulator,
        index: i64,
        on_error_line: &mut F,
    ) -> Result<(), AggregateError>
    where
        F: FnMut(&str),
    {
        let path = self.worker_log_path(index);
        debug!(path = %path.display(), "scanning worker log");

        let file = File::open(&path).map_err(|e| AggregateError::file_not_found(&path, e))?;
        self.scan_reader(acc, &path, BufReader::new(file), on_error_line)?;

        debug!(path = %path.display(), records = acc.count, "finished worker log");
        Ok(())
    }

    /// Aggregates the worker logs `start..end` in ascending order, stopping at
    /// the first file that fails.
    pub fn aggregate_range<F>(
        &self,
        start: i64,
        end: i64,
        mut on_error_line: F,
    ) -> Result<Accumulator, AggregateError>
    where
        F: FnMut(&str),
    {
        let mut acc = Accumulator::new();

        for index in start..end {
            self.aggregate_file(&mut acc, index, &mut on_error_line)?;
        }

        Ok(acc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(lines: &[&str]) -> (Accumulator, Vec<String>) {
        let mut acc = Accumulator::new();
        let mut echoed = Vec::new();
        for line in lines {
            scan_line(&mut acc, line, &mut |l: &str| echoed.push(l.to_string())).unwrap();
        }
        (acc, echoed)
    }

    #[test]
    fn test_millis_record() {
        let (acc, echoed) = scan(&["[Timer] 100 ms"]);

        assert_eq!(acc.count, 1);
        assert_eq!(acc.product, 100.0);
        assert!(echoed.is_empty());
    }

    #[test]
    fn test_other_unit_truncates_before_conversion() {
        let (acc, _) = scan(&["[Timer] 2000 s"]);
        assert_eq!(acc.product, 2.0);

        let (acc, _) = scan(&["[Timer] 2999 s"]);
        assert_eq!(acc.product, 2.0);

        let (acc, _) = scan(&["[Timer] 999 us"]);
        assert_eq!(acc.product, 0.0);
    }

    #[test]
    fn test_fixed_position_indexing() {
        // Marker mid-line still reads value and unit from positions 1 and 2
        let (acc, _) = scan(&["q1 250 ms [Timer]"]);

        assert_eq!(acc.count, 1);
        assert_eq!(acc.product, 250.0);
    }

    #[test]
    fn test_each_marker_token_counts() {
        let (acc, _) = scan(&["[Timer] 10 ms [Timer]"]);

        assert_eq!(acc.count, 2);
        assert_eq!(acc.product, 100.0);
    }

    #[test]
    fn test_error_line_echoed_per_marker_token() {
        let (_, echoed) = scan(&["worker 2 error while reading", "Error: error again"]);

        assert_eq!(
            echoed,
            vec![
                "worker 2 error while reading".to_string(),
                "Error: error again".to_string(),
                "Error: error again".to_string(),
            ]
        );
    }

    #[test]
    fn test_marker_must_match_whole_token() {
        let (acc, echoed) = scan(&["errors: 0 [Timer]x 5 ms", "ERROR upper case"]);

        assert_eq!(acc.count, 0);
        assert!(echoed.is_empty());
    }

    #[test]
    fn test_split_on_single_spaces() {
        // A double space yields an empty value token
        let mut acc = Accumulator::new();
        let err = scan_line(&mut acc, "[Timer]  100 ms", &mut |_: &str| {}).unwrap_err();

        assert!(matches!(err, RecordError::InvalidValue { ref token, .. } if token.is_empty()));
    }

    #[test]
    fn test_malformed_records() {
        let mut acc = Accumulator::new();

        let err = scan_line(&mut acc, "[Timer]", &mut |_: &str| {}).unwrap_err();
        assert!(matches!(err, RecordError::MissingValue));

        let err = scan_line(&mut acc, "[Timer] 100", &mut |_: &str| {}).unwrap_err();
        assert!(matches!(err, RecordError::MissingUnit));

        let err = scan_line(&mut acc, "[Timer] fast ms", &mut |_: &str| {}).unwrap_err();
        assert!(matches!(err, RecordError::InvalidValue { .. }));
    }

    #[test]
    fn test_average_is_geometric_mean() {
        let mut acc = Accumulator::new();
        acc.record(4.0);
        acc.record(16.0);

        let avg = acc.average().unwrap();
        assert!((avg - 8.0).abs() < 1e-9);
    }

    #[test]
    fn test_value_token_whitespace_and_separators() {
        let (acc, _) = scan(&["[Timer] 100\t ms"]);
        assert_eq!(acc.product, 100.0);

        let (acc, _) = scan(&["[Timer] 1_500 ms"]);
        assert_eq!(acc.product, 1500.0);

        let (acc, _) = scan(&["[Timer] -2_000 s"]);
        assert_eq!(acc.product, -2.0);

        for line in ["[Timer] 1__0 ms", "[Timer] _10 ms", "[Timer] 10_ ms"] {
            let mut acc = Accumulator::new();
            let err = scan_line(&mut acc, line, &mut |_: &str| {}).unwrap_err();
            assert!(matches!(err, RecordError::InvalidValue { .. }), "{} was accepted", line);
        }
    }

    #[test]
    fn test_negative_product_under_even_root_is_undefined() {
        let mut acc = Accumulator::new();
        acc.record(-8.0);
        acc.record(2.0);

        assert!(matches!(
            acc.average(),
            Err(AggregateError::UndefinedAverage { count: 2, .. })
        ));
    }

    #[test]
    fn test_single_negative_record_is_its_own_average() {
        let mut acc = Accumulator::new();
        acc.record(-8.0);

        assert_eq!(acc.average().unwrap(), -8.0);
    }

    #[test]
    fn test_average_requires_records() {
        let acc = Accumulator::new();
        assert!(matches!(acc.average(), Err(AggregateError::EmptyAggregate)));
    }

    #[test]
    fn test_worker_log_path() {
        let aggregator = LogAggregator::new("/tmp/out");

        assert_eq!(aggregator.worker_log_path(7), PathBuf::from("/tmp/out/outputworker7"));
        assert_eq!(aggregator.worker_log_path(-1), PathBuf::from("/tmp/out/outputworker-1"));
        assert_eq!(LogAggregator::default().log_dir(), Path::new(DEFAULT_LOG_DIR));
    }
}
