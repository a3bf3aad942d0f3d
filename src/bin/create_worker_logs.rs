use std::env;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use timerlog::aggregator::WORKER_LOG_PREFIX;

/// Creates synthetic worker logs `outputworker<start>..outputworker<end>`,
/// each with the given number of lines.
fn main() -> io::Result<()> {
    // Parse command line arguments
    let args: Vec<String> = env::args().collect();
    if args.len() != 5 {
        eprintln!("Usage: {} <output-dir> <start> <end> <lines-per-file>", args[0]);
        std::process::exit(1);
    }

    let dir = Path::new(&args[1]);
    let start: i64 = parse_arg(&args[2], "start")?;
    let end: i64 = parse_arg(&args[3], "end")?;
    let lines: usize = parse_arg(&args[4], "lines-per-file")?;

    println!(
        "Creating worker logs {}..{} with {} lines each in {}",
        start,
        end,
        lines,
        dir.display()
    );
    std::fs::create_dir_all(dir)?;

    for index in start..end {
        let path = dir.join(format!("{}{}", WORKER_LOG_PREFIX, index));
        create_worker_log(index, lines, &path)?;
    }
    println!("Worker logs created successfully.");

    Ok(())
}

fn parse_arg<T: std::str::FromStr>(value: &str, name: &str) -> io::Result<T> {
    value.parse().map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid {}: {}", name, value),
        )
    })
}

/// Writes one worker log: mostly timer records in `ms`, with the occasional
/// record in another unit, plain progress lines and error lines.
fn create_worker_log(index: i64, lines: usize, path: &Path) -> io::Result<()> {
    let mut file = BufWriter::new(File::create(path)?);

    for i in 0..lines {
        match i % 10 {
            0 => writeln!(file, "[Timer] {} us", 1000 + (i % 7) * 250)?,
            1 => writeln!(file, "worker {} [Error] query {} timed out", index, i)?,
            2 | 5 => writeln!(file, "worker {} received query {}", index, i)?,
            8 => writeln!(file, "Error: connection reset on worker {}", index)?,
            _ => writeln!(file, "[Timer] {} ms", 20 + (i % 97))?,
        }
    }

    file.flush()
}
