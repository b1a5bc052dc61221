use std::io::{self, BufRead};

use anyhow::Context;
use clap::Parser;
use log::{info, LevelFilter};

use dmrburst::DmrDecoderBuilder;

mod app;
mod cli;

use cli::{Args, CliError};

fn main() {
    match dmrdec() {
        Ok(()) => {}
        Err(cli_error) => cli_error.exit(),
    }
}

fn dmrdec() -> Result<(), CliError> {
    // Parse options and start logging
    let args = Args::try_parse()?;
    log_setup(&args);

    // logical channel table from the command line
    let entries = args
        .lsn
        .iter()
        .map(|arg| app::parse_lsn_arg(arg).with_context(|| format!("invalid --lsn \"{}\"", arg)))
        .collect::<Result<Vec<_>, _>>()?;

    // create the decoder
    let mut decoder = DmrDecoderBuilder::new()
        .with_require_valid(args.strict)
        .with_timeslot_frequencies(entries)
        .build();

    if args.demo {
        app::run_demo(&args, &mut decoder)?;
    } else {
        // file setup: locks stdin in case we need it
        let stdin = io::stdin();
        let stdin_handle = stdin.lock();
        let inbuf = file_setup(&args, stdin_handle)?;

        app::run(&args, &mut decoder, inbuf.lines())?;
    }

    let stats = decoder.stats();
    info!(
        "decoded {} bursts: {} valid, {} invalid, {} unknown",
        stats.bursts, stats.valid, stats.invalid, stats.unknown
    );

    Ok(())
}

fn log_setup(args: &Args) {
    if args.quiet {
        // no logging
        return;
    } else if std::env::var_os("RUST_LOG").is_none() {
        // parameter controls
        let log_filter = match args.verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        };

        pretty_env_logger::formatted_builder()
            .filter_module("dmrburst", log_filter)
            .filter_module("dmrdec", log_filter)
            .init();
    } else {
        // environment controls
        pretty_env_logger::init();
    }
}

fn file_setup<'stdin>(
    args: &Args,
    stdin: std::io::StdinLock<'stdin>,
) -> Result<Box<dyn io::BufRead + 'stdin>, anyhow::Error> {
    if args.input_is_stdin() {
        info!("DMR decoder reading standard input");
        Ok(Box::new(stdin))
    } else {
        info!("DMR decoder reading file: \"{}\"", &args.file);
        Ok(Box::new(io::BufReader::new(
            std::fs::File::open(&args.file)
                .with_context(|| format!("Unable to open --file \"{}\"", args.file))?,
        )))
    }
}
