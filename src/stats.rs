use std::collections::HashMap;
use std::fs;

use crate::error::{EngineResult, ErrorKind};

/// The three statistics selectors, in the order they're written to the
/// stats file (the order they appeared on the command line).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatSelector {
    Insts,
    Hot,
    Vars,
}

/// Counts executed instructions, the peak live initialised-variable
/// count, and per-order execution counts (from which `hot` is derived).
/// Owned by the interpreter loop and passed around by reference, never
/// global state.
#[derive(Default)]
pub struct Stats {
    insts: u64,
    peak_vars: usize,
    calls_by_order: HashMap<u32, u64>,
}

impl Stats {
    pub fn new() -> Self {
        Stats::default()
    }

    pub fn record_instruction(&mut self, order: u32) {
        self.insts += 1;
        *self.calls_by_order.entry(order).or_insert(0) += 1;
    }

    pub fn sample_vars(&mut self, live_initialized: usize) {
        if live_initialized > self.peak_vars {
            self.peak_vars = live_initialized;
        }
    }

    pub fn insts(&self) -> u64 {
        self.insts
    }

    pub fn vars(&self) -> usize {
        self.peak_vars
    }

    /// The order of the most-executed instruction; ties go to the
    /// smaller order. `None` if nothing countable ever ran.
    pub fn hot(&self) -> Option<u32> {
        let mut best: Option<(u32, u64)> = None;
        for (&order, &count) in &self.calls_by_order {
            best = Some(match best {
                None => (order, count),
                Some((best_order, best_count)) => {
                    if count > best_count || (count == best_count && order < best_order) {
                        (order, count)
                    } else {
                        (best_order, best_count)
                    }
                }
            });
        }
        best.map(|(order, _)| order)
    }

    /// Writes the selected counters, one per line, in `selectors`'
    /// order, to `path`.
    pub fn save(&self, path: &str, selectors: &[StatSelector]) -> EngineResult<()> {
        let mut out = String::new();
        for selector in selectors {
            let line = match selector {
                StatSelector::Insts => self.insts.to_string(),
                StatSelector::Hot => self.hot().unwrap_or(0).to_string(),
                StatSelector::Vars => self.vars().to_string(),
            };
            out.push_str(&line);
            out.push('\n');
        }
        fs::write(path, out).map_err(|e| ErrorKind::OutputFile(format!("{}: {}", path, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insts_counts_every_recorded_call() {
        let mut stats = Stats::new();
        stats.record_instruction(1);
        stats.record_instruction(2);
        stats.record_instruction(1);
        assert_eq!(stats.insts(), 3);
    }

    #[test]
    fn vars_tracks_the_peak_not_the_latest_sample() {
        let mut stats = Stats::new();
        stats.sample_vars(3);
        stats.sample_vars(1);
        stats.sample_vars(5);
        stats.sample_vars(2);
        assert_eq!(stats.vars(), 5);
    }

    #[test]
    fn hot_breaks_ties_by_smaller_order() {
        let mut stats = Stats::new();
        stats.record_instruction(10);
        stats.record_instruction(3);
        stats.record_instruction(10);
        stats.record_instruction(3);
        assert_eq!(stats.hot(), Some(3));
    }

    #[test]
    fn hot_prefers_strictly_higher_counts() {
        let mut stats = Stats::new();
        stats.record_instruction(10);
        stats.record_instruction(3);
        stats.record_instruction(3);
        assert_eq!(stats.hot(), Some(3));
    }
}
