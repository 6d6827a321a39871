//! Run-length encoded operator stack.
//!
//! Both the CIGAR and the MD tag describe an alignment as runs of
//! `(length, operator)`. Walking a read means consuming those runs one base at
//! a time, so the stack hands out single units and splits runs as it goes:
//! popping from `3M1I2M` yields `M` and leaves `2M1I2M`. Pushing works the
//! other way round and merges into the top run whenever the operator matches,
//! so two neighbouring runs never share an operator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A run of `len` consecutive units of `op`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run<O> {
    pub len: u32,
    pub op: O,
}

impl<O> Run<O> {
    pub fn new(len: u32, op: O) -> Self {
        Self { len, op }
    }
}

/// LIFO container of runs. The top of the stack is the next unit to consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunStack<O> {
    // Top of the stack is the last element
    runs: Vec<Run<O>>,
}

impl<O> Default for RunStack<O> {
    fn default() -> Self {
        Self { runs: Vec::new() }
    }
}

impl<O: Copy + PartialEq> RunStack<O> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load runs so that the first run of `runs` is the first one popped.
    pub fn from_runs<I>(runs: I) -> Self
    where
        I: IntoIterator<Item = Run<O>>,
        I::IntoIter: DoubleEndedIterator,
    {
        let mut stack = Self::new();
        for run in runs.into_iter().rev() {
            stack.push_run(run.len, run.op);
        }
        stack
    }

    /// Remove one unit from the top run and return its operator.
    ///
    /// A run that still has units left stays on top with its length decremented.
    pub fn pop_unit(&mut self) -> Option<O> {
        let top = self.runs.last_mut()?;
        let op = top.op;
        if top.len > 1 {
            top.len -= 1;
        } else {
            self.runs.pop();
        }
        Some(op)
    }

    /// Remove the whole top run.
    pub fn pop_run(&mut self) -> Option<Run<O>> {
        self.runs.pop()
    }

    /// Push a single unit, growing the top run when it carries the same operator.
    pub fn push_unit(&mut self, op: O) {
        self.push_run(1, op);
    }

    /// Push a whole run, merging it into the top run when the operators match.
    ///
    /// Zero-length runs hold no unit and are dropped, so `2M0I2M` loads as `4M`.
    pub fn push_run(&mut self, len: u32, op: O) {
        if len == 0 {
            return;
        }
        match self.runs.last_mut() {
            Some(top) if top.op == op => top.len = top.len.saturating_add(len),
            _ => self.runs.push(Run::new(len, op)),
        }
    }

    pub fn peek(&self) -> Option<&Run<O>> {
        self.runs.last()
    }

    /// Number of runs (not units) on the stack
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Total number of units left
    pub fn units(&self) -> u64 {
        self.runs.iter().map(|run| run.len as u64).sum()
    }

    /// Flip the stack so the bottom run becomes the next one popped.
    pub fn reverse(&mut self) {
        self.runs.reverse();
    }

    /// Runs in the order they will be popped
    pub fn iter(&self) -> impl Iterator<Item = &Run<O>> + '_ {
        self.runs.iter().rev()
    }

    /// Drain the stack into runs, in the order they would have been popped.
    pub fn into_runs(self) -> Vec<Run<O>> {
        let mut runs = self.runs;
        runs.reverse();
        runs
    }
}

impl<O: Copy + PartialEq + fmt::Display> fmt::Display for RunStack<O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for run in self.iter() {
            write!(f, "{}{}", run.len, run.op)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_no_adjacent_duplicates(stack: &RunStack<char>) {
        let runs: Vec<_> = stack.iter().collect();
        for pair in runs.windows(2) {
            assert_ne!(pair[0].op, pair[1].op, "adjacent runs share an operator");
        }
    }

    #[test]
    fn test_pop_unit_splits_top_run() {
        let mut stack = RunStack::from_runs(vec![Run::new(3, 'M'), Run::new(1, 'I'), Run::new(2, 'M')]);
        assert_eq!(stack.pop_unit(), Some('M'));
        assert_eq!(stack.to_string(), "2M1I2M");
        assert_eq!(stack.pop_unit(), Some('M'));
        assert_eq!(stack.pop_unit(), Some('M'));
        assert_eq!(stack.to_string(), "1I2M");
        assert_eq!(stack.pop_unit(), Some('I'));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn test_pop_unit_on_empty_stack() {
        let mut stack: RunStack<char> = RunStack::new();
        assert_eq!(stack.pop_unit(), None);
        assert!(stack.is_empty());
    }

    #[test]
    fn test_push_unit_merges_with_top() {
        let mut stack = RunStack::new();
        for op in ['M', 'M', 'I', 'M', 'M', 'M', 'D', 'D'] {
            stack.push_unit(op);
            assert_no_adjacent_duplicates(&stack);
        }
        // Pushed last means popped first
        assert_eq!(stack.to_string(), "2D3M1I2M");
        assert_eq!(stack.len(), 4);
        assert_eq!(stack.units(), 8);
    }

    #[test]
    fn test_push_run_merges_with_top() {
        let mut stack = RunStack::new();
        stack.push_run(2, 'M');
        stack.push_run(3, 'M');
        assert_eq!(stack.peek(), Some(&Run::new(5, 'M')));
        stack.push_run(1, 'S');
        assert_eq!(stack.len(), 2);
        assert_no_adjacent_duplicates(&stack);
    }

    #[test]
    fn test_unit_round_trip() {
        let expanded: Vec<char> = "SSMMMMIMMDDMMMMS".chars().collect();

        let mut stack = RunStack::new();
        for &op in expanded.iter().rev() {
            stack.push_unit(op);
            assert_no_adjacent_duplicates(&stack);
        }
        assert_eq!(stack.to_string(), "2S4M1I2M2D4M1S");

        let mut recovered = Vec::new();
        while let Some(op) = stack.pop_unit() {
            recovered.push(op);
        }
        assert_eq!(recovered, expanded);
    }

    #[test]
    fn test_reverse() {
        let mut stack = RunStack::from_runs(vec![Run::new(2, 'S'), Run::new(5, 'M'), Run::new(1, 'I')]);
        stack.reverse();
        assert_eq!(stack.to_string(), "1I5M2S");
        assert_eq!(stack.pop_unit(), Some('I'));
        assert_eq!(stack.pop_unit(), Some('M'));
        assert_eq!(
            stack.into_runs(),
            vec![Run::new(4, 'M'), Run::new(2, 'S')]
        );
    }

    #[test]
    fn test_zero_length_runs_are_dropped() {
        let mut stack = RunStack::new();
        stack.push_run(0, 'M');
        assert!(stack.is_empty());
        assert_eq!(stack.pop_unit(), None);

        let mut stack = RunStack::from_runs(vec![Run::new(2, 'M'), Run::new(0, 'I'), Run::new(2, 'M')]);
        assert_eq!(stack.to_string(), "4M");
        let mut recovered = Vec::new();
        while let Some(op) = stack.pop_unit() {
            recovered.push(op);
        }
        assert_eq!(recovered, vec!['M'; 4]);
    }

    #[test]
    fn test_pop_run() {
        let mut stack = RunStack::from_runs(vec![Run::new(4, 'M'), Run::new(1, 'D')]);
        assert_eq!(stack.pop_run(), Some(Run::new(4, 'M')));
        assert_eq!(stack.pop_run(), Some(Run::new(1, 'D')));
        assert_eq!(stack.pop_run(), None);
    }
}
