use std::fmt::Display;

use clap::{error::ErrorKind, CommandFactory, Parser};

/// Standard input filename
const STDIN_FILE: &str = "-";

const USAGE_SHORT: &str = r#"
This program accepts DMR bursts, one per line, and decodes them. Each line names the sync pattern, the timeslot, and the 288 burst bits in hexadecimal.

See --help for more details.
"#;

const USAGE_LONG: &str = r##"
This program accepts DMR bursts, one per line, and decodes them. Decoded messages are printed one per line.

Each input line is either a burst:

    BS_DATA 1 <72 hex digits> [<timestamp ms>]

or a logical channel frequency:

    LSN 3 451.125 [456.125]

The first word of a burst line is the sync pattern: BS_VOICE, BS_DATA, MS_VOICE, MS_DATA, RC, DIRECT_VOICE_TS1, DIRECT_DATA_TS1, DIRECT_VOICE_TS2, DIRECT_DATA_TS2, BS_VOICE_B through BS_VOICE_F, VOICE_B through VOICE_F, or UNKNOWN. The BS_VOICE_ frames are the embedded bursts of a repeater voice superframe and carry a CACH; VOICE_B through VOICE_F are mobile or direct mode bursts without one. The timeslot is 0 or 1. The optional timestamp is in milliseconds since the UNIX epoch; if omitted, the current time is used.

LSN lines replace one entry of the logical channel table. Frequencies with a decimal point are in MHz; otherwise they are in Hz. If no uplink is given, the downlink is used. Lines which begin with "#" are ignored.

The same table entries may be given on the command line:

    dmrdec --lsn 3=451.125,456.125 --lsn 4=451.125 --file bursts.txt

Use --demo to decode a few synthesized bursts and exit.
"##;

/// Top-level program arguments
#[derive(Parser, Clone, Debug)]
#[command(version)]
#[command(about, long_about = None)]
#[command(after_help = USAGE_SHORT, after_long_help = USAGE_LONG)]
#[command(max_term_width = 100)]
pub struct Args {
    /// Verbosity level (-vvv for more)
    #[arg(short, long, default_value_t = 0, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print NOTHING, not even decoded messages
    #[arg(short, long)]
    pub quiet: bool,

    /// Input file (or "-" for stdin)
    ///
    /// One burst or LSN record per line.
    #[arg(long, default_value_t = STDIN_FILE.to_string())]
    pub file: String,

    /// Logical channel frequency (LSN=DOWNLINK[,UPLINK])
    ///
    /// May be repeated. Frequencies are in MHz if they contain a
    /// decimal point and Hz otherwise.
    #[arg(long, value_name = "LSN=DOWN[,UP]")]
    pub lsn: Vec<String>,

    /// Report invalid messages as unknown
    ///
    /// Messages which fail their CRC or parity check are printed
    /// as UNKNOWN DMR BURST.
    #[arg(long)]
    pub strict: bool,

    /// Decode synthesized bursts and exit
    ///
    /// No input is read.
    #[arg(long)]
    pub demo: bool,
}

impl Args {
    /// Return true if the user requests input from stdin
    pub fn input_is_stdin(&self) -> bool {
        self.file == STDIN_FILE
    }
}

/// A program-level error with exit code
#[derive(Debug)]
pub struct CliError {
    error: anyhow::Error,
    exit_code: i32,
}

impl CliError {
    /// Create new error with a custom exit code
    pub fn new(error: anyhow::Error, code: i32) -> CliError {
        CliError {
            error,
            exit_code: code,
        }
    }

    /// Print this error to the terminal
    ///
    /// Errors from clap are printed verbatim. Other types of errors
    /// are printed indirectly via clap's fancy formatter.
    pub fn print(&self) -> std::io::Result<()> {
        if let Some(e) = self.error.downcast_ref::<clap::Error>() {
            e.print()
        } else {
            Args::command()
                .error(ErrorKind::Format, self.to_string())
                .print()
        }
    }

    /// Print this error to the terminal and exit
    pub fn exit(&self) -> ! {
        drop(self.print());
        std::process::exit(self.exit_code);
    }
}

impl Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self.error)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> CliError {
        CliError::new(err, 1)
    }
}

impl From<clap::Error> for CliError {
    fn from(err: clap::Error) -> CliError {
        let code = if err.use_stderr() { 1 } else { 0 };
        CliError::new(err.into(), code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clap() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }

    #[test]
    fn test_usage_text() {
        assert!(USAGE_LONG.contains(r##"Lines which begin with "#" are ignored."##));
        assert!(USAGE_LONG.contains("BS_VOICE_B through BS_VOICE_F"));
        assert!(USAGE_LONG
            .trim_end()
            .ends_with("decode a few synthesized bursts and exit."));
    }

    #[test]
    fn test_parse_args() {
        let args = Args::try_parse_from([
            "dmrdec",
            "-vv",
            "--strict",
            "--lsn",
            "3=451.125,456.125",
            "--lsn",
            "4=451125000",
        ])
        .unwrap();
        assert_eq!(args.verbose, 2);
        assert!(args.strict);
        assert!(!args.demo);
        assert!(args.input_is_stdin());
        assert_eq!(args.lsn, vec!["3=451.125,456.125", "4=451125000"]);
    }
}
