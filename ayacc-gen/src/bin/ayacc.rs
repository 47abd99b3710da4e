//! Command-line interface for the `ayacc` parser generator.
//!
//! Wraps [`ayacc_gen::generate`]: reads a `.y` grammar and writes
//! `<name>.rs` (and `<name>.output` with `-v`) into the output directory.

#[cfg(feature = "cli")]
mod real {
    use clap::Parser;
    use std::path::PathBuf;

    #[derive(Parser)]
    #[command(about = "Generate an LALR(1) parser from a yacc grammar")]
    struct Args {
        /// Path to the input grammar file
        #[arg(short = 'g', long)]
        grammar: PathBuf,

        /// Path to the output directory.
        #[arg(short = 'o', long, default_value = ".")]
        output_dir: PathBuf,

        /// Prefix used to construct output file names
        #[arg(short = 'n', long, default_value = "parser")]
        name: String,

        /// Also write a `<name>.output` report with states and conflicts.
        #[arg(short = 'v', long)]
        verbose: bool,

        /// Enable debug logging (off by default).
        #[arg(short = 'd', long)]
        debug: bool,
    }

    pub fn main() -> anyhow::Result<()> {
        let args = Args::parse();
        let level = if args.debug {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        };
        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();

        let summary = ayacc_gen::generate(&args.grammar, &args.output_dir, &args.name, args.verbose)?;
        if !summary.conflicts.is_empty() {
            eprintln!("{}: {}", args.grammar.display(), summary.conflicts);
        }
        log::info!(
            "{} rules, {} states -> {}",
            summary.rules,
            summary.states,
            summary.parser.display()
        );
        Ok(())
    }
}

#[cfg(feature = "cli")]
fn main() -> anyhow::Result<()> {
    real::main()
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("ayacc disabled (compiled without `cli` feature)");
}
