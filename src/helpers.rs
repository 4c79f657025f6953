use crate::cache::Outcome;
use crate::io::{TraceOp, TraceRecord};

pub fn outcome_words(outcome: Outcome) -> &'static str {
    match outcome {
        Outcome::Hit => "hit",
        Outcome::MissCold => "miss",
        Outcome::MissEviction => "miss eviction",
    }
}

/// Formats an access the way `csim -v` prints it, e.g. `M 20,1 miss hit`.
pub fn verbose_line(record: &TraceRecord, outcome: Outcome) -> String {
    let mut line = format!(
        "{} {:x},{} {}",
        record.op.letter(),
        record.address,
        record.size,
        outcome_words(outcome)
    );
    if record.op == TraceOp::Modify {
        line.push_str(" hit");
    }
    line
}
