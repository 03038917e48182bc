//! Combine existing per-pair significance outputs into one file.

use std::path::PathBuf;
use colored::Colorize;
use const_format::str_repeat;
use crate::{
    FailurePolicy,
    ext,
    hic::combine,
};

struct Args {
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    strict: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            output: None,
            strict: false,
        }
    }
}

fn print_help() {
    const KEY: usize = 14;
    const VAL: usize = 5;
    const EMPTY: &'static str = str_repeat!(" ", KEY + VAL + 5);

    println!("{}", "Combine per-pair significant interaction files into one file.".yellow());

    println!("\n{} {} combine -i dir [dir ...] -o out.txt",
        "Usage:".bold(), env!("CARGO_PKG_NAME"));

    println!("\n{}", "Input/output arguments:".bold());
    println!("    {:KEY$} {:VAL$}  Result root(s): directories with one subdirectory per contact pair,\n\
        {EMPTY}  such as `<output>/<sample>/chr_sig_interactions`.",
        "-i, --input".green(), "DIR+".yellow());
    println!("    {:KEY$} {:VAL$}  Combined output file. Use {} for stdout.",
        "-o, --output".green(), "FILE".yellow(), "-".cyan());

    println!("\n{}", "Execution parameters:".bold());
    println!("    {:KEY$} {:VAL$}  Abort on the first unreadable result file.",
        "-S, --strict".green(), "");

    println!("\n{}", "Other parameters:".bold());
    println!("    {:KEY$} {:VAL$}  Show this help message.", "-h, --help".green(), "");
    println!("    {:KEY$} {:VAL$}  Show version.", "-V, --version".green(), "");
}

fn parse_args(argv: &[String]) -> Result<Args, lexopt::Error> {
    use lexopt::prelude::*;
    let mut args = Args::default();
    let mut parser = lexopt::Parser::from_args(argv);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('i') | Long("input") =>
                args.inputs.extend(parser.values()?.map(PathBuf::from)),
            Short('o') | Long("output") => args.output = Some(parser.value()?.parse()?),
            Short('S') | Long("strict") => args.strict = true,

            Short('V') | Long("version") => {
                super::print_version();
                std::process::exit(0);
            }
            Short('h') | Long("help") => {
                print_help();
                std::process::exit(0);
            }
            _ => Err(arg.unexpected())?,
        }
    }
    Ok(args)
}

fn process_args(args: Args) -> crate::Result<Args> {
    if args.inputs.is_empty() {
        Err(lexopt::Error::from("Input directories are not provided (see -i/--input)"))?;
    }
    if args.output.is_none() {
        Err(lexopt::Error::from("Output file is not provided (see -o/--output)"))?;
    }
    Ok(args)
}

pub(super) fn run(argv: &[String]) -> crate::Result<()> {
    let args = process_args(parse_args(argv)?)?;
    // unwrap as args.output was previously checked to be Some.
    let out_path = args.output.as_ref().unwrap();
    let policy = if args.strict { FailurePolicy::Abort } else { FailurePolicy::Skip };

    let stats = combine::combine(&args.inputs, out_path, policy)?;
    log::info!("Combined {} interactions from {} files into {}",
        stats.n_lines, stats.n_files, ext::fmt::path(out_path));
    if stats.n_skipped > 0 {
        log::warn!("Could not read {} result file(s)", stats.n_skipped);
    }
    Ok(())
}
