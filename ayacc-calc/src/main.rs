//! Command-line interface for ayacc-calc.
//!
//! Evaluates the expression given with `-e`, or every non-empty line of the
//! input file (standard input by default), and prints one result per line.

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

#[derive(ClapParser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Expression to evaluate
    #[arg(short, long, conflicts_with = "input")]
    expr: Option<String>,

    /// File with one expression per line
    #[arg(short, long)]
    input: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    if let Some(expr) = args.expr {
        println!("{}", ayacc_calc::eval(&expr)?);
        return Ok(());
    }

    let reader: Box<dyn BufRead> = match &args.input {
        Some(path) => Box::new(BufReader::new(
            std::fs::File::open(path).with_context(|| format!("can't open {:?}", path))?,
        )),
        None => Box::new(BufReader::new(std::io::stdin())),
    };
    let mut failed = false;
    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match ayacc_calc::eval(&line) {
            Ok(value) => println!("{}", value),
            Err(err) => {
                eprintln!("line {}: {} (code {})", n + 1, err, err.code());
                failed = true;
            }
        }
    }
    if failed {
        std::process::exit(1);
    }
    Ok(())
}
