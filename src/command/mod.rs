mod common;
mod paths;
mod run;
mod combine;

use colored::Colorize;
use crate::err::error;
use common::print_version;

fn print_citation() {
    print_version();
    println!();
    println!("{}", "Thank you for using our tool!".bold());
    println!("Publication in progress, please check later.");
}

fn print_help() {
    print_version();
    println!("\n{} {} command [arguments]",
        "Usage:".bold(), env!("CARGO_PKG_NAME"));

    println!("\n{}", "[ Significant interaction calling ]".bold());
    println!("    {:<7}  Run the full pipeline over a sample manifest.", "run".red());
    println!("    {:<7}  Combine existing per-pair results into one file.", "combine".red());

    println!("\n{}", "[ General help ]".bold());
    println!("    {:<7}  Show this help message.", "help".red());
    println!("    {:<7}  Show version.", "version".red());
    println!("    {:<7}  Show citation information.", "cite".red());
}

pub fn run(argv: &[String]) -> crate::Result<()> {
    if argv.len() <= 1 {
        print_help();
        std::process::exit(1);
    }
    match &argv[1] as &str {
        "run" | "r" => run::run(&argv[2..])?,
        "combine" | "c" => combine::run(&argv[2..])?,
        "help" | "h" | "--help" | "-h" => print_help(),
        "version" | "--version" | "-V" => print_version(),
        "cite" => print_citation(),
        cmd => return Err(error!(InvalidInput, "Unknown command {:?}", cmd)),
    }
    Ok(())
}
