use std::path::PathBuf;

use clap::Parser;

use crate::error::ConfigError;
use crate::utils::Geometry;

#[derive(Parser, Debug)]
#[command(
    name = "csim",
    version,
    about = "Trace-driven set-associative LRU cache simulator"
)]
pub struct Cli {
    /// Number of set index bits (the cache has 2^s sets)
    #[arg(short = 's', long = "set-bits", required = true)]
    pub set_bits: u32,

    /// Associativity (number of lines per set)
    #[arg(short = 'E', long, required = true)]
    pub associativity: usize,

    /// Number of block bits (blocks are 2^b bytes)
    #[arg(short = 'b', long = "block-bits", required = true)]
    pub block_bits: u32,

    /// Valgrind lackey trace to replay (.zst traces are decompressed)
    #[arg(short = 't', long = "trace", required = true)]
    pub trace: PathBuf,

    /// Print the classification of every access
    #[arg(short, long)]
    pub verbose: bool,

    /// Write a per-access CSV log to this file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Write "hits misses evictions" to this file
    #[arg(long)]
    pub results: Option<PathBuf>,
}

impl Cli {
    pub fn geometry(&self) -> Result<Geometry, ConfigError> {
        Geometry::new(self.set_bits, self.associativity, self.block_bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cache_lab_flags() {
        let args = ["csim", "-s", "4", "-E", "2", "-b", "4", "-t", "traces/yi.trace", "-v"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.set_bits, 4);
        assert_eq!(cli.associativity, 2);
        assert_eq!(cli.block_bits, 4);
        assert_eq!(cli.trace, PathBuf::from("traces/yi.trace"));
        assert!(cli.verbose);
        assert!(cli.csv.is_none());
        assert_eq!(cli.geometry().unwrap().num_sets(), 16);
    }

    #[test]
    fn trace_is_required() {
        assert!(Cli::try_parse_from(["csim", "-s", "1", "-E", "1", "-b", "1"]).is_err());
    }

    #[test]
    fn zero_associativity_is_a_config_error() {
        let args = ["csim", "-s", "1", "-E", "0", "-b", "1", "-t", "x"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.geometry(), Err(ConfigError::ZeroAssociativity));
    }
}
