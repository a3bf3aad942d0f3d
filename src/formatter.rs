use serde::Serialize;
use std::io::{self, Write};

/// Everything known about a finished run, minus the echoed lines themselves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub files_scanned: usize,
    pub timer_records: usize,
    pub error_lines: usize,
    pub average_ms: f64,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    files_scanned: usize,
    timer_records: usize,
    error_line_count: usize,
    average_ms: f64,
    error_lines: &'a [String],
}

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

pub fn average_line(average_ms: f64) -> String {
    format!("Average Time :  {:.4}  ms", average_ms)
}

// Main production function - prints directly to stdout
pub fn print_summary(summary: &Summary, show_stats: bool) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    // A closed stdout leaves nothing useful to report to
    let _ = print_summary_to_writer(summary, show_stats, &mut handle);
}

// Test-friendly version that can write to any writer
pub fn print_summary_to_writer<W: Write>(
    summary: &Summary,
    show_stats: bool,
    writer: &mut W,
) -> io::Result<()> {
    if show_stats {
        writeln!(writer, "Files scanned: {}", summary.files_scanned)?;
        writeln!(writer, "Timer records: {}", summary.timer_records)?;
        writeln!(
            writer,
            "Error line{}: {}",
            if summary.error_lines == 1 { "" } else { "s" },
            summary.error_lines
        )?;
    }

    writeln!(writer, "{}", average_line(summary.average_ms))?;
    Ok(())
}

pub fn json_summary(summary: &Summary, error_lines: &[String]) -> serde_json::Result<String> {
    let output = JsonOutput {
        files_scanned: summary.files_scanned,
        timer_records: summary.timer_records,
        error_line_count: error_lines.len(),
        average_ms: round_to(summary.average_ms, 4),
        error_lines,
    };

    serde_json::to_string_pretty(&output)
}

pub fn print_json(summary: &Summary, error_lines: &[String]) {
    let json_str = json_summary(summary, error_lines)
        .unwrap_or_else(|_| "Failed to serialize results".to_string());

    println!("{}", json_str);
}
