//! CLI front-end (C9): a thin consumer of the library surface. Owns no
//! parsing logic of its own — argument handling, logging setup, and the
//! swallow-and-echo default only.

use clap::Parser;
use gnu2_demangle::PrintOptions;
use simplelog::{ColorChoice, Config, LevelFilter, TermLogger, TerminalMode};

/// Demangle a GNU v2 C++ mangled symbol name.
#[derive(Clone, Debug, Parser)]
struct Args {
    /// mangled symbol to decode
    symbol: String,
    /// on parse failure, report the error kind and exit non-zero instead
    /// of echoing the input back
    #[arg(short = 'e', long)]
    error_on_failure: bool,
    /// suppress the trailing `&&` hint on back-referenced parameters
    #[arg(long)]
    no_rvalue_marker: bool,
    /// raise logging verbosity (-v: info, -vv: debug)
    #[arg(short, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );
}

fn main() -> std::process::ExitCode {
    let args = Args::parse();
    init_logger(args.verbose);

    let opts = PrintOptions {
        rvalue_marker: !args.no_rvalue_marker,
    };
    let bytes = args.symbol.as_bytes();

    if args.error_on_failure {
        match gnu2_demangle::try_demangle_with(bytes, &opts) {
            Ok(decl) => {
                println!("{decl}");
                std::process::ExitCode::SUCCESS
            }
            Err(err) => {
                eprintln!("{}: {err}", err.kind_tag());
                std::process::ExitCode::FAILURE
            }
        }
    } else {
        println!("{}", gnu2_demangle::demangle_with(bytes, &opts));
        std::process::ExitCode::SUCCESS
    }
}
