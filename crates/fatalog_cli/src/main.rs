//! fatalog CLI
//!
//! Command-line tools for crash stores kept in sector image files.
//!
//! # Commands
//!
//! - `print` - Render stored crash records
//! - `count` - Print the number of stored records
//! - `clear` - Forget all stored records
//! - `inspect` - Show the raw header and record layout
//! - `simulate` - Record a synthetic fault

mod commands;

use clap::{Parser, Subcommand};
use commands::{simulate::SimulatedFault, CliError, OutputFormat, Target};
use fatalog_core::{Config, DEFAULT_MIN_STACK_DEPTH};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// fatalog crash store tools.
#[derive(Parser)]
#[command(name = "fatalog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the sector image file
    #[arg(global = true, short, long)]
    image: Option<PathBuf>,

    /// Offset of the store window in the sector
    #[arg(global = true, long, default_value_t = 0)]
    offset: u16,

    /// Size of the store window in bytes
    #[arg(global = true, long, default_value_t = 512)]
    size: u16,

    /// Size of the emulated sector in bytes
    #[arg(global = true, long, default_value_t = 4096)]
    sector_size: usize,

    /// Stack words a record must still have room for
    #[arg(global = true, long, default_value_t = DEFAULT_MIN_STACK_DEPTH)]
    min_depth: u16,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render stored crash records
    Print {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the number of stored records
    Count,

    /// Forget all stored records
    Clear,

    /// Show the raw header and record layout
    Inspect {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Include a hex dump of the window
        #[arg(short, long)]
        dump: bool,
    },

    /// Record a synthetic fault
    Simulate {
        /// Reason of restart
        #[arg(long, default_value_t = 2)]
        reason: u32,

        /// Exception cause
        #[arg(long, default_value_t = 0)]
        cause: u32,

        /// Faulting virtual address
        #[arg(long, value_parser = parse_u32, default_value = "0")]
        excvaddr: u32,

        /// Stack words to capture
        #[arg(long, default_value_t = 8)]
        depth: u16,

        /// Address of the first stack word
        #[arg(long, value_parser = parse_u32, default_value = "0x3fffff00")]
        stack_base: u32,

        /// Timestamp to record, in milliseconds
        #[arg(long, default_value_t = 0)]
        at: u32,
    },

    /// Show version information
    Version,
}

/// Parses decimal or `0x`-prefixed hexadecimal numbers.
fn parse_u32(value: &str) -> Result<u32, String> {
    let parsed = match value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => value.parse(),
    };
    parsed.map_err(|e| format!("invalid number {value:?}: {e}"))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Commands::Version = cli.command {
        println!("fatalog CLI v{}", env!("CARGO_PKG_VERSION"));
        println!("fatalog core v{}", fatalog_core::VERSION);
        return Ok(());
    }

    let target = Target {
        image: cli.image.ok_or(CliError::MissingImage)?,
        sector_size: cli.sector_size,
        config: Config::new(cli.offset, cli.size).min_stack_depth(cli.min_depth),
    };

    match cli.command {
        Commands::Print { format } => commands::print::run(&target, format)?,
        Commands::Count => commands::count::run(&target)?,
        Commands::Clear => commands::clear::run(&target)?,
        Commands::Inspect { format, dump } => commands::inspect::run(&target, format, dump)?,
        Commands::Simulate {
            reason,
            cause,
            excvaddr,
            depth,
            stack_base,
            at,
        } => {
            let fault = SimulatedFault {
                reason,
                cause,
                excvaddr,
                depth,
                stack_base,
                at_millis: at,
            };
            commands::simulate::run(&target, &fault)?;
        }
        Commands::Version => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_hex_and_decimal() {
        assert_eq!(parse_u32("0x3fffff00"), Ok(0x3FFF_FF00));
        assert_eq!(parse_u32("1024"), Ok(1024));
        assert!(parse_u32("0xzz").is_err());
    }

    #[test]
    fn global_window_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "fatalog", "print", "--image", "dev.bin", "--offset", "64", "--size", "256", "-f",
            "json",
        ])
        .unwrap();
        assert_eq!(cli.offset, 64);
        assert_eq!(cli.size, 256);
        assert!(matches!(
            cli.command,
            Commands::Print {
                format: OutputFormat::Json
            }
        ));
    }
}
