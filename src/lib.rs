use crate::cache::{Cache, Outcome, Stats};
use crate::cli::Cli;
use crate::error::{ReportError, SimError, TraceError};
use crate::helpers::verbose_line;
use crate::io::{OutcomeWriter, TraceReader, TraceRecord};
use crate::utils::Geometry;
use log::{debug, info};

/// Set-associative LRU cache model
pub mod cache;
pub mod cli;
pub mod error;
/// Verbose output formatting
mod helpers;
/// Trace parsing and report files
pub mod io;
pub mod utils;

/// Replays `records` through `cache`, calling `on_access` after every data
/// access. Instruction fetches are skipped. Stops at the first trace or
/// report error.
pub fn simulate<I, F>(
    cache: &mut Cache,
    geometry: &Geometry,
    records: I,
    mut on_access: F,
) -> Result<Stats, SimError>
where
    I: IntoIterator<Item = Result<TraceRecord, TraceError>>,
    F: FnMut(&TraceRecord, usize, u64, Outcome) -> Result<(), ReportError>,
{
    let mut skipped = 0u64;
    for record in records {
        let record = record?;
        let Some(kind) = record.op.access_kind() else {
            skipped += 1;
            continue;
        };
        let (set_index, tag) = geometry.decode(record.address);
        let outcome = cache.access(kind, set_index, tag);
        on_access(&record, set_index, tag, outcome)?;
    }
    debug!("skipped {} instruction fetches", skipped);
    Ok(cache.stats())
}

pub fn run_simulation(cli: &Cli) -> Result<Stats, SimError> {
    let geometry = cli.geometry()?;
    debug!(
        "sets: {}, lines per set: {}, block size: {}",
        geometry.num_sets(),
        geometry.associativity(),
        geometry.block_size()
    );

    let mut cache = Cache::new(&geometry);
    let reader = TraceReader::open(&cli.trace)?;
    let mut csv_log = match &cli.csv {
        Some(path) => Some(OutcomeWriter::create(path)?),
        None => None,
    };

    let stats = simulate(&mut cache, &geometry, reader, |record, set_index, tag, outcome| {
        if cli.verbose {
            println!("{}", verbose_line(record, outcome));
        }
        if let Some(log) = csv_log.as_mut() {
            log.write(record, set_index, tag, outcome)?;
        }
        Ok(())
    })?;

    if let Some(log) = csv_log {
        log.finish()?;
    }
    if let Some(path) = &cli.results {
        io::write_results(path, &stats)?;
    }

    info!("{}: {}", cli.trace.display(), stats);
    println!("{}", stats);
    Ok(stats)
}
