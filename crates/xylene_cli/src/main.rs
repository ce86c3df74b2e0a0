//! Xylene CLI, the command-line front end for the Xylene bitstream tools.
//!
//! Provides `xylene parts` to list the part database, `xylene decode` and
//! `xylene validate` to check bitstreams, and `xylene describe`, `frames`,
//! `diff` and `register` to query what configuration bits control.

#![warn(missing_docs)]

mod decode;
mod parts;
mod query;
mod report;
mod session;
mod validate;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

/// Xylene: FPGA bitstream documentation tools.
#[derive(Parser, Debug)]
#[command(name = "xylene", version, about = "Xylene FPGA bitstream documentation tools")]
pub struct Cli {
    /// Path to a custom `xylene.toml` configuration file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the part database (`.json`, `.toml` or `.xcm`).
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Print debug output. This generates a lot of messages.
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Do not print the banner.
    #[arg(short = 'b', long, global = true)]
    pub no_banner: bool,

    /// Control colored output.
    #[arg(long, global = true, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the parts in the database.
    Parts(PartsArgs),
    /// Decode one or more bitstreams and report anomalies.
    Decode(DecodeArgs),
    /// Validate a bitstream against its part.
    Validate(ValidateArgs),
    /// Explain what a single configuration bit controls.
    Describe(DescribeArgs),
    /// List the frames a bitstream writes.
    Frames(FramesArgs),
    /// Compare the frames of two bitstreams.
    Diff(DiffArgs),
    /// Read a named register from a bitstream.
    Register(RegisterArgs),
}

/// Arguments for the `xylene parts` subcommand.
#[derive(Parser, Debug)]
pub struct PartsArgs {
    /// Output format.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

/// Arguments for the `xylene decode` subcommand.
#[derive(Parser, Debug)]
pub struct DecodeArgs {
    /// Bitstream files to decode.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,

    /// Reject a bitstream on its first warning.
    #[arg(long)]
    pub strict: bool,
}

/// Arguments for the `xylene validate` subcommand.
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Bitstream file to validate.
    pub file: PathBuf,

    /// Promote warnings to fatal.
    #[arg(long)]
    pub strict: bool,

    /// Which frames the bitstream must write completely.
    #[arg(long, value_enum)]
    pub scope: Option<ScopeArg>,

    /// Output format.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

/// Arguments for the `xylene describe` subcommand.
#[derive(Parser, Debug)]
pub struct DescribeArgs {
    /// Bitstream file.
    pub file: PathBuf,

    /// Frame address (decimal or `0x` hex).
    #[arg(long, value_parser = parse_u32)]
    pub frame: u32,

    /// Word offset within the frame.
    #[arg(long)]
    pub word: u32,

    /// Bit index within the word (0 = LSB).
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..32))]
    pub bit: u8,

    /// Output format.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

/// Arguments for the `xylene frames` subcommand.
#[derive(Parser, Debug)]
pub struct FramesArgs {
    /// Bitstream file.
    pub file: PathBuf,

    /// Output format.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

/// Arguments for the `xylene diff` subcommand.
#[derive(Parser, Debug)]
pub struct DiffArgs {
    /// The original bitstream.
    pub old: PathBuf,

    /// The bitstream to compare against it.
    pub new: PathBuf,

    /// List every changed bit, not just the frames.
    #[arg(long)]
    pub bits: bool,

    /// Output format.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

/// Arguments for the `xylene register` subcommand.
#[derive(Parser, Debug)]
pub struct RegisterArgs {
    /// Bitstream file.
    pub file: PathBuf,

    /// Register name.
    pub name: String,

    /// Row of the instance to read.
    #[arg(long, requires = "column")]
    pub row: Option<u32>,

    /// Column of the instance to read.
    #[arg(long, requires = "row")]
    pub column: Option<u32>,

    /// Output format.
    #[arg(short, long, value_enum)]
    pub format: Option<ReportFormat>,
}

/// Controls whether colored output is produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    /// Detect from terminal capabilities.
    Auto,
    /// Always produce colored output.
    Always,
    /// Never produce colored output.
    Never,
}

/// Report output format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable terminal output.
    Text,
    /// Machine-readable JSON output.
    Json,
}

/// Frame coverage expectation for `validate`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// Every column the bitstream touches must be written completely.
    Columns,
    /// Every frame of the part must be written.
    Device,
}

/// Global settings derived from CLI flags.
pub struct GlobalArgs {
    /// Whether to suppress non-error output.
    pub quiet: bool,
    /// Whether to print debug information.
    pub debug: bool,
    /// Whether to use colored output.
    pub color: bool,
    /// Optional path to a custom config file.
    pub config: Option<PathBuf>,
    /// Optional path to the part database.
    pub db: Option<PathBuf>,
}

/// Parses a decimal or `0x`-prefixed hexadecimal `u32`.
fn parse_u32(s: &str) -> Result<u32, String> {
    let s = s.trim();
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid number '{s}': {e}"))
}

fn main() {
    let cli = Cli::parse();

    let color = match cli.color {
        ColorChoice::Auto => std::io::stderr().is_terminal(),
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    let global = GlobalArgs {
        quiet: cli.quiet,
        debug: cli.debug,
        color,
        config: cli.config,
        db: cli.db,
    };

    init_logging(&global);
    if !cli.no_banner && !global.quiet {
        print_banner();
    }

    let result = match cli.command {
        Command::Parts(ref args) => parts::run(args, &global),
        Command::Decode(ref args) => decode::run(args, &global),
        Command::Validate(ref args) => validate::run(args, &global),
        Command::Describe(ref args) => query::describe(args, &global),
        Command::Frames(ref args) => query::frames(args, &global),
        Command::Diff(ref args) => query::diff(args, &global),
        Command::Register(ref args) => query::register(args, &global),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    }
}

/// Returns the log level selected by the global flags.
fn log_level(global: &GlobalArgs) -> Level {
    if global.debug {
        Level::DEBUG
    } else if global.quiet {
        Level::ERROR
    } else {
        Level::INFO
    }
}

/// Installs the stderr log subscriber.
fn init_logging(global: &GlobalArgs) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(global))
        .with_writer(std::io::stderr)
        .with_ansi(global.color)
        .with_target(false)
        .init();
}

fn print_banner() {
    eprintln!(
        "xylene v{} ({}-{})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    eprintln!("\nxylene: FPGA bitstream documentation utility\n");
    eprintln!("xylene is part of the Xylene project <https://github.com/prjxylene>");
    eprintln!(
        "xylene is licensed under the BSD-3-Clause <https://spdx.org/licenses/BSD-3-Clause.html>"
    );
    eprintln!(
        "\nPlease report bugs at <{}/issues>\n",
        env!("CARGO_PKG_REPOSITORY")
    );
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_parts_default() {
        let cli = Cli::parse_from(["xylene", "parts"]);
        match cli.command {
            Command::Parts(ref args) => assert!(args.format.is_none()),
            _ => panic!("expected Parts command"),
        }
        assert!(!cli.debug);
        assert!(!cli.no_banner);
        assert_eq!(cli.color, ColorChoice::Auto);
    }

    #[test]
    fn parse_decode_many_files() {
        let cli = Cli::parse_from([
            "xylene", "decode", "a.bit", "b.bit", "--format", "json", "--strict",
        ]);
        match cli.command {
            Command::Decode(ref args) => {
                assert_eq!(args.files, vec![PathBuf::from("a.bit"), PathBuf::from("b.bit")]);
                assert_eq!(args.format, Some(ReportFormat::Json));
                assert!(args.strict);
            }
            _ => panic!("expected Decode command"),
        }
    }

    #[test]
    fn decode_requires_a_file() {
        assert!(Cli::try_parse_from(["xylene", "decode"]).is_err());
    }

    #[test]
    fn parse_validate_scope() {
        let cli = Cli::parse_from(["xylene", "validate", "x.bit", "--scope", "device"]);
        match cli.command {
            Command::Validate(ref args) => {
                assert_eq!(args.file, PathBuf::from("x.bit"));
                assert_eq!(args.scope, Some(ScopeArg::Device));
                assert!(!args.strict);
            }
            _ => panic!("expected Validate command"),
        }
    }

    #[test]
    fn parse_describe_hex_frame() {
        let cli = Cli::parse_from([
            "xylene", "describe", "x.bit", "--frame", "0x1F", "--word", "2", "--bit", "31",
        ]);
        match cli.command {
            Command::Describe(ref args) => {
                assert_eq!(args.frame, 0x1F);
                assert_eq!(args.word, 2);
                assert_eq!(args.bit, 31);
            }
            _ => panic!("expected Describe command"),
        }
    }

    #[test]
    fn describe_rejects_bit_32() {
        let parsed = Cli::try_parse_from([
            "xylene", "describe", "x.bit", "--frame", "1", "--word", "0", "--bit", "32",
        ]);
        assert!(parsed.is_err());
    }

    #[test]
    fn register_row_requires_column() {
        assert!(Cli::try_parse_from(["xylene", "register", "x.bit", "CFG", "--row", "1"]).is_err());
        let cli = Cli::parse_from([
            "xylene", "register", "x.bit", "CFG", "--row", "1", "--column", "0",
        ]);
        match cli.command {
            Command::Register(ref args) => {
                assert_eq!(args.name, "CFG");
                assert_eq!((args.row, args.column), (Some(1), Some(0)));
            }
            _ => panic!("expected Register command"),
        }
    }

    #[test]
    fn parse_diff_bits() {
        let cli = Cli::parse_from(["xylene", "diff", "a.bit", "b.bit", "--bits"]);
        match cli.command {
            Command::Diff(ref args) => {
                assert_eq!(args.old, PathBuf::from("a.bit"));
                assert_eq!(args.new, PathBuf::from("b.bit"));
                assert!(args.bits);
            }
            _ => panic!("expected Diff command"),
        }
    }

    #[test]
    fn parse_global_flags() {
        let cli = Cli::parse_from([
            "xylene", "-d", "-b", "--color", "never", "--db", "parts.json", "frames", "x.bit",
        ]);
        assert!(cli.debug);
        assert!(cli.no_banner);
        assert!(!cli.quiet);
        assert_eq!(cli.color, ColorChoice::Never);
        assert_eq!(cli.db, Some(PathBuf::from("parts.json")));
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::parse_from(["xylene", "parts", "--quiet", "--config", "x/xylene.toml"]);
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("x/xylene.toml")));
    }

    #[test]
    fn numbers_parse_in_both_radixes() {
        assert_eq!(parse_u32("42"), Ok(42));
        assert_eq!(parse_u32("0xdead"), Ok(0xDEAD));
        assert_eq!(parse_u32(" 0X10 "), Ok(16));
        assert!(parse_u32("0xZZ").is_err());
        assert!(parse_u32("-1").is_err());
    }

    #[test]
    fn log_levels_follow_flags() {
        let mut global = GlobalArgs {
            quiet: false,
            debug: false,
            color: false,
            config: None,
            db: None,
        };
        assert_eq!(log_level(&global), Level::INFO);
        global.quiet = true;
        assert_eq!(log_level(&global), Level::ERROR);
        global.debug = true;
        assert_eq!(log_level(&global), Level::DEBUG);
    }
}
