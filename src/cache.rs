//! Set-associative cache with LRU replacement.
//!
//! Each [`Set`] keeps its resident lines ordered from most recently used
//! (front) to least recently used (back). Recency is purely positional: a hit
//! moves the line to the front, a miss into a full set drops the back line
//! before the new tag is pushed at the front. No per-line counters or
//! timestamps are kept.

use std::collections::VecDeque;

use log::trace;
use serde::Serialize;

use crate::utils::Geometry;

/// Kind of data access the core classifies.
///
/// Instruction fetches never get this far; the driving loop drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Load,
    Store,
    /// Load immediately followed by a store to the same address.
    Modify,
}

/// Classification of a single access (of the load half, for a modify).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outcome {
    Hit,
    /// Miss into a set with a free line.
    MissCold,
    /// Miss into a full set; the LRU line was evicted.
    MissEviction,
}

impl Outcome {
    pub fn is_hit(self) -> bool {
        self == Outcome::Hit
    }
}

/// Aggregate counters of a simulation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

impl std::fmt::Display for Stats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "hits:{} misses:{} evictions:{}",
            self.hits, self.misses, self.evictions
        )
    }
}

/// One cache slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line {
    pub tag: u64,
    pub valid: bool,
}

/// Bounded collection of lines ordered MRU to LRU.
#[derive(Debug, Clone)]
pub struct Set {
    capacity: usize,
    lines: VecDeque<Line>,
}

impl Set {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            lines: VecDeque::new(),
        }
    }

    /// Position of the valid line holding `tag`, counted from the MRU end.
    pub fn contains(&self, tag: u64) -> Option<usize> {
        self.lines
            .iter()
            .position(|line| line.valid && line.tag == tag)
    }

    pub fn line(&self, pos: usize) -> Option<&Line> {
        self.lines.get(pos)
    }

    /// Moves the resident line at `pos` to the MRU end.
    ///
    /// # Panics
    ///
    /// Panics if `pos` does not name a resident line.
    pub fn touch(&mut self, pos: usize) {
        assert!(
            pos < self.lines.len(),
            "touch of line {} in a set holding {} lines",
            pos,
            self.lines.len()
        );
        if pos == 0 {
            return;
        }
        if let Some(line) = self.lines.remove(pos) {
            self.lines.push_front(line);
        }
    }

    /// Admits `tag` at the MRU end.
    ///
    /// # Panics
    ///
    /// Panics if the set is full; callers evict first.
    pub fn insert(&mut self, tag: u64) {
        assert!(!self.is_full(), "insert into a full set (capacity {})", self.capacity);
        self.lines.push_front(Line { tag, valid: true });
    }

    /// Removes and returns the LRU line.
    ///
    /// # Panics
    ///
    /// Panics if the set is empty.
    pub fn evict_lru(&mut self) -> Line {
        match self.lines.pop_back() {
            Some(line) => line,
            None => panic!("eviction from an empty set"),
        }
    }

    pub fn is_full(&self) -> bool {
        self.lines.len() == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn occupied(&self) -> usize {
        self.lines.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resident tags, MRU first.
    pub fn tags(&self) -> impl Iterator<Item = u64> + '_ {
        self.lines.iter().map(|line| line.tag)
    }
}

/// The simulated cache: `2^s` sets of `E` lines each, plus running counters.
#[derive(Debug, Clone)]
pub struct Cache {
    sets: Vec<Set>,
    associativity: usize,
    stats: Stats,
}

impl Cache {
    pub fn new(geometry: &Geometry) -> Self {
        let associativity = geometry.associativity();
        let sets = (0..geometry.num_sets())
            .map(|_| Set::new(associativity))
            .collect();
        Self {
            sets,
            associativity,
            stats: Stats::default(),
        }
    }

    /// Classifies one access against the set at `set_index` and updates the
    /// counters.
    ///
    /// A [`AccessKind::Modify`] is classified as its load half; the store half
    /// that follows always hits, so one extra hit is counted on top of the
    /// returned outcome.
    ///
    /// # Panics
    ///
    /// Panics if `set_index` is not below the number of sets.
    pub fn access(&mut self, kind: AccessKind, set_index: usize, tag: u64) -> Outcome {
        let num_sets = self.sets.len();
        assert!(
            set_index < num_sets,
            "set index {} out of range for {} sets",
            set_index,
            num_sets
        );
        let set = &mut self.sets[set_index];

        let outcome = match set.contains(tag) {
            Some(pos) => {
                self.stats.hits += 1;
                set.touch(pos);
                Outcome::Hit
            }
            None => {
                self.stats.misses += 1;
                let outcome = if set.is_full() {
                    let victim = set.evict_lru();
                    self.stats.evictions += 1;
                    trace!("set {}: evicted tag {:#x}", set_index, victim.tag);
                    Outcome::MissEviction
                } else {
                    Outcome::MissCold
                };
                set.insert(tag);
                outcome
            }
        };

        if kind == AccessKind::Modify {
            self.stats.hits += 1;
        }

        trace!("{:?} set {} tag {:#x}: {:?}", kind, set_index, tag, outcome);
        outcome
    }

    pub fn set(&self, set_index: usize) -> Option<&Set> {
        self.sets.get(set_index)
    }

    pub fn num_sets(&self) -> usize {
        self.sets.len()
    }

    pub fn associativity(&self) -> usize {
        self.associativity
    }

    pub fn hits(&self) -> u64 {
        self.stats.hits
    }

    pub fn misses(&self) -> u64 {
        self.stats.misses
    }

    pub fn evictions(&self) -> u64 {
        self.stats.evictions
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::MAX_SET_BITS;
    use pretty_assertions::assert_eq;

    fn tags(set: &Set) -> Vec<u64> {
        set.tags().collect()
    }

    #[test]
    fn insert_places_tag_at_mru() {
        let mut set = Set::new(3);
        assert!(set.is_empty());
        set.insert(1);
        set.insert(2);
        set.insert(3);
        assert_eq!(tags(&set), vec![3, 2, 1]);
        assert!(set.is_full());
        assert_eq!(set.occupied(), 3);
    }

    #[test]
    fn touch_promotes_to_mru() {
        let mut set = Set::new(3);
        set.insert(1);
        set.insert(2);
        set.insert(3);
        let pos = set.contains(1).unwrap();
        assert_eq!(pos, 2);
        set.touch(pos);
        assert_eq!(tags(&set), vec![1, 3, 2]);
    }

    #[test]
    fn touch_on_mru_is_a_no_op() {
        let mut set = Set::new(2);
        set.insert(7);
        set.insert(8);
        set.touch(0);
        set.touch(0);
        assert_eq!(tags(&set), vec![8, 7]);
    }

    #[test]
    fn evict_lru_removes_back_line() {
        let mut set = Set::new(2);
        set.insert(1);
        set.insert(2);
        let victim = set.evict_lru();
        assert_eq!(victim, Line { tag: 1, valid: true });
        assert_eq!(tags(&set), vec![2]);
        assert!(!set.is_full());
    }

    #[test]
    fn contains_has_no_side_effects() {
        let mut set = Set::new(2);
        set.insert(1);
        set.insert(2);
        assert_eq!(set.contains(1), Some(1));
        assert_eq!(set.contains(9), None);
        assert_eq!(tags(&set), vec![2, 1]);
        assert_eq!(set.line(1), Some(&Line { tag: 1, valid: true }));
    }

    #[test]
    #[should_panic(expected = "insert into a full set")]
    fn insert_into_full_set_panics() {
        let mut set = Set::new(1);
        set.insert(1);
        set.insert(2);
    }

    #[test]
    #[should_panic(expected = "eviction from an empty set")]
    fn evict_from_empty_set_panics() {
        Set::new(1).evict_lru();
    }

    #[test]
    #[should_panic(expected = "touch of line 1 in a set holding 1 lines")]
    fn touch_past_resident_lines_panics() {
        let mut set = Set::new(4);
        set.insert(1);
        set.touch(1);
    }

    #[test]
    fn huge_associativity_only_stores_used_lines() {
        let mut cache = Cache::new(&Geometry::new(0, usize::MAX, 0).unwrap());
        assert_eq!(cache.access(AccessKind::Load, 0, 3), Outcome::MissCold);
        assert_eq!(cache.access(AccessKind::Load, 0, 3), Outcome::Hit);
        let set = cache.set(0).unwrap();
        assert_eq!(set.occupied(), 1);
        assert!(!set.is_full());
    }

    #[test]
    fn builds_cache_with_most_sets_accepted() {
        let geometry = Geometry::new(MAX_SET_BITS, 1, 0).unwrap();
        let mut cache = Cache::new(&geometry);
        assert_eq!(cache.num_sets(), 1 << MAX_SET_BITS);
        let (set_index, tag) = geometry.decode(u64::MAX);
        assert_eq!(cache.access(AccessKind::Load, set_index, tag), Outcome::MissCold);
        assert_eq!(cache.set(set_index).map(tags), Some(vec![tag]));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn access_outside_the_cache_panics() {
        let mut cache = Cache::new(&Geometry::new(1, 1, 0).unwrap());
        cache.access(AccessKind::Load, 2, 0);
    }

    #[test]
    fn modify_miss_into_full_set_counts_one_of_each() {
        let mut cache = Cache::new(&Geometry::new(0, 1, 0).unwrap());
        cache.access(AccessKind::Load, 0, 1);
        let outcome = cache.access(AccessKind::Modify, 0, 2);
        assert_eq!(outcome, Outcome::MissEviction);
        assert_eq!(
            cache.stats(),
            Stats {
                hits: 1,
                misses: 2,
                evictions: 1
            }
        );
    }

    #[test]
    fn sets_are_independent() {
        let mut cache = Cache::new(&Geometry::new(1, 1, 0).unwrap());
        assert_eq!(cache.access(AccessKind::Load, 0, 5), Outcome::MissCold);
        assert_eq!(cache.access(AccessKind::Load, 1, 6), Outcome::MissCold);
        assert_eq!(cache.access(AccessKind::Load, 0, 5), Outcome::Hit);
        assert_eq!(cache.set(1).map(tags), Some(vec![6]));
        assert_eq!(cache.evictions(), 0);
    }

    #[test]
    fn stats_display_matches_summary_format() {
        let stats = Stats {
            hits: 4,
            misses: 5,
            evictions: 3,
        };
        assert_eq!(stats.to_string(), "hits:4 misses:5 evictions:3");
    }
}
