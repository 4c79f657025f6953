use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::cache::{AccessKind, Outcome, Stats};
use crate::error::{ReportError, TraceError};

static TRACE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([ILSM])\s+([0-9a-fA-F]+)\s*,\s*([0-9]+)\s*$").unwrap()
});

/// Operation letter of a lackey trace record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TraceOp {
    Instruction,
    Load,
    Store,
    Modify,
}

impl TraceOp {
    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'I' => Some(TraceOp::Instruction),
            'L' => Some(TraceOp::Load),
            'S' => Some(TraceOp::Store),
            'M' => Some(TraceOp::Modify),
            _ => None,
        }
    }

    pub fn letter(self) -> char {
        match self {
            TraceOp::Instruction => 'I',
            TraceOp::Load => 'L',
            TraceOp::Store => 'S',
            TraceOp::Modify => 'M',
        }
    }

    /// `None` for instruction fetches, which the data cache never sees.
    pub fn access_kind(self) -> Option<AccessKind> {
        match self {
            TraceOp::Instruction => None,
            TraceOp::Load => Some(AccessKind::Load),
            TraceOp::Store => Some(AccessKind::Store),
            TraceOp::Modify => Some(AccessKind::Modify),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceRecord {
    pub op: TraceOp,
    pub address: u64,
    pub size: u32,
}

/// Parses one ` L 7ff000388,8` style line.
pub fn parse_trace_line(line: &str) -> Option<TraceRecord> {
    let cap = TRACE_LINE.captures(line)?;
    let op = TraceOp::from_letter(cap[1].chars().next()?)?;
    let address = u64::from_str_radix(&cap[2], 16).ok()?;
    let size = cap[3].parse().ok()?;
    Some(TraceRecord { op, address, size })
}

fn is_skippable(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with("==")
}

/// Lazily parsed stream of trace records.
///
/// Blank lines and valgrind `==` banner lines are skipped. Reading stops being
/// useful after the first error; the caller decides whether to continue.
pub struct TraceReader<R> {
    lines: std::io::Lines<R>,
    line_no: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line_no: 0,
        }
    }
}

impl TraceReader<Box<dyn BufRead>> {
    /// Opens a trace file, decompressing `.zst` files on the fly.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader: Box<dyn BufRead> = if path.extension().is_some_and(|ext| ext == "zst") {
            Box::new(BufReader::new(zstd::Decoder::new(file)?))
        } else {
            Box::new(BufReader::new(file))
        };
        Ok(Self::new(reader))
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<TraceRecord, TraceError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let next = self.lines.next()?;
            self.line_no += 1;
            let line = match next {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(TraceError::Unreadable {
                        line: self.line_no,
                        source,
                    }));
                }
            };
            if is_skippable(&line) {
                continue;
            }
            return Some(parse_trace_line(&line).ok_or_else(|| TraceError::Malformed {
                line: self.line_no,
                text: line,
            }));
        }
    }
}

/// Writes the `hits misses evictions` results file read by the cache lab driver.
pub fn write_results(path: impl AsRef<Path>, stats: &Stats) -> Result<(), ReportError> {
    let mut file = File::create(path)?;
    writeln!(file, "{} {} {}", stats.hits, stats.misses, stats.evictions)?;
    Ok(())
}

#[derive(Serialize)]
struct OutcomeRow {
    op: TraceOp,
    address: String,
    size: u32,
    set_index: usize,
    tag: String,
    outcome: Outcome,
    store_hit: bool,
}

/// Per-access CSV log.
pub struct OutcomeWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl OutcomeWriter<File> {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, ReportError> {
        Ok(Self {
            writer: csv::Writer::from_path(path)?,
        })
    }
}

impl<W: Write> OutcomeWriter<W> {
    pub fn from_writer(writer: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(writer),
        }
    }

    pub fn write(
        &mut self,
        record: &TraceRecord,
        set_index: usize,
        tag: u64,
        outcome: Outcome,
    ) -> Result<(), ReportError> {
        self.writer.serialize(OutcomeRow {
            op: record.op,
            address: format!("{:x}", record.address),
            size: record.size,
            set_index,
            tag: format!("{:x}", tag),
            outcome,
            store_hit: record.op == TraceOp::Modify,
        })?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W, ReportError> {
        self.writer.flush()?;
        self.writer
            .into_inner()
            .map_err(|e| ReportError::Io(e.into_error()))
    }
}
