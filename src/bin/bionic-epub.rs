//! bionic-epub CLI binary.

use std::io::Write;
use std::process;

use clap::Parser;
use env_logger::Builder;
use log::LevelFilter;

use bionic_epub::cli::args::BionicArgs;
use bionic_epub::cli::commands::execute_command;

fn main() {
    // Parse command line arguments using clap
    let args = BionicArgs::parse();
    let verbosity = args.verbosity();

    let log_level = match verbosity {
        0 => LevelFilter::Error, // Quiet mode
        1 => LevelFilter::Warn,  // Default
        2 => LevelFilter::Info,  // Verbose
        _ => LevelFilter::Debug, // Very verbose (3+)
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    if let Err(e) = execute_command(args) {
        if verbosity >= 2 {
            eprintln!("Error: {e:?}");
        } else {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}
