//! Chunk size table optimization.
//!
//! Chunked storage files only allow a fixed set of chunk sizes roughly
//! following a power series; every allocation is served from the smallest
//! chunk size that is at least as big as requested. The difference between
//! the served chunk size and the requested size is wasted ("slack").
//!
//! This module tunes the chunk size table against a measured histogram of
//! requested sizes: a local search repeatedly shrinks the boundary of the
//! bucket that currently wastes the most bytes, tracking the best table seen
//! so far. The trailing boundaries of the table are never touched; they are
//! reserved for oversized requests that are too rare to show up in the
//! histogram but must still be representable.

use std::fmt;
use std::io::BufRead;

use log::info;

use crate::{Error, Result};

/// Number of trailing chunk sizes excluded from shrinking.
pub const OVERSIZE_RESERVE: usize = 8;

/// One histogram row: `count` requests of exactly `size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeClass {
    pub size: u64,
    pub count: u64,
}

/// A size histogram, ordered ascending by size.
///
/// The slack evaluator relies on the ordering to assign all items in a
/// single forward scan over the chunk size table.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    classes: Vec<SizeClass>,
}

impl Dataset {
    pub fn new(mut classes: Vec<SizeClass>) -> Self {
        classes.sort_by_key(|c| c.size);
        Self { classes }
    }

    /// Reads a dataset from tab-separated `size\tcount` lines.
    ///
    /// The whole input is rejected on the first malformed line; the
    /// optimizer assumes a complete, validly ordered dataset.
    pub fn from_reader(reader: impl BufRead) -> Result<Self> {
        let mut classes = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let lineno = idx + 1;
            let mut fields = line.split('\t');
            let (size, count) = match (fields.next(), fields.next(), fields.next()) {
                (Some(size), Some(count), None) => (size, count),
                _ => return Err(Error::parse(lineno, "expected two tab-separated fields")),
            };
            let size = size
                .trim()
                .parse::<u64>()
                .map_err(|e| Error::parse(lineno, format!("invalid size {:?}: {}", size, e)))?;
            let count = count
                .trim()
                .parse::<u64>()
                .map_err(|e| Error::parse(lineno, format!("invalid count {:?}: {}", count, e)))?;
            classes.push(SizeClass { size, count });
        }
        Ok(Self::new(classes))
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SizeClass> {
        self.classes.iter()
    }
}

/// A monotonically non-decreasing chunk size table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSizes {
    sizes: Vec<u64>,
    reserve: usize,
}

impl ChunkSizes {
    /// Validates and wraps a chunk size table.
    ///
    /// The table must be non-decreasing and must contain at least one entry
    /// in front of the protected suffix, otherwise no bucket would ever be
    /// eligible for shrinking and the search could not make progress.
    pub fn new(sizes: Vec<u64>, reserve: usize) -> Result<Self> {
        if sizes.len() < reserve + 1 {
            return Err(Error::Config(format!(
                "chunk size table has {} entries, need at least {} (protected suffix of {} plus one)",
                sizes.len(),
                reserve + 1,
                reserve
            )));
        }
        if let Some(w) = sizes.windows(2).find(|w| w[0] > w[1]) {
            return Err(Error::Config(format!(
                "chunk size table is not sorted: {} followed by {}",
                w[0], w[1]
            )));
        }
        Ok(Self { sizes, reserve })
    }

    /// The seed table the optimization starts from: a zero entry, 55
    /// placeholder boundaries to be optimized, and a protected suffix of
    /// powers of two up to 2 GiB for oversized chunks.
    pub fn seed() -> Self {
        let mut sizes = vec![0];
        sizes.extend(std::iter::repeat(1u64 << 17).take(55));
        sizes.extend((0..OVERSIZE_RESERVE as u32).map(|i| 1u64 << (2 * i + 17)));
        Self {
            sizes,
            reserve: OVERSIZE_RESERVE,
        }
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.sizes
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }

    pub fn reserve(&self) -> usize {
        self.reserve
    }

    pub fn max_chunk_size(&self) -> u64 {
        self.sizes[self.sizes.len() - 1]
    }

    /// Shrinks the boundary at `idx` towards its predecessor.
    ///
    /// The step is 1% of the gap, rounded down, plus one. This guarantees
    /// strict progress (at least one byte per application) while closing
    /// large gaps quickly, and it never drops a boundary below its
    /// predecessor, so the table stays sorted.
    fn shrink(&mut self, idx: usize) {
        let pred = if idx == 0 { 0 } else { self.sizes[idx - 1] };
        let diff = self.sizes[idx] - pred;
        self.sizes[idx] -= diff / 100 + 1;
    }
}

/// Computes per-bucket slack for `dataset` against `chunk_sizes`.
///
/// Every size class is assigned to the first chunk size that can hold it
/// (first-fit ascending); the slack of a bucket is the sum of
/// `(chunk_size - item_size) * count` over its assigned classes. Pure
/// function of its inputs.
///
/// Fails with [`Error::RangeExceeded`] if a class is larger than the
/// largest chunk size, and with [`Error::SlackOverflow`] if a bucket's
/// slack does not fit into `u64`.
pub fn compute_slacks(dataset: &Dataset, chunk_sizes: &ChunkSizes) -> Result<Vec<u64>> {
    let sizes = chunk_sizes.as_slice();
    let mut slacks = vec![0u64; sizes.len()];
    let mut pos = 0;
    for class in dataset.iter() {
        while pos < sizes.len() && sizes[pos] < class.size {
            pos += 1;
        }
        if pos == sizes.len() {
            return Err(Error::RangeExceeded {
                size: class.size,
                max_chunk_size: chunk_sizes.max_chunk_size(),
            });
        }
        slacks[pos] = (sizes[pos] - class.size)
            .checked_mul(class.count)
            .and_then(|slack| slacks[pos].checked_add(slack))
            .ok_or(Error::SlackOverflow)?;
    }
    Ok(slacks)
}

/// Periodic progress snapshot handed to the report sink.
#[derive(Debug, Clone)]
pub struct Progress<'a> {
    pub iteration: u64,
    /// Total slack of the current (just evaluated) table, in bytes.
    pub current_slack: u64,
    /// Total slack of the best table seen so far, in bytes.
    pub best_slack: u64,
    pub best_chunk_sizes: &'a [u64],
}

impl fmt::Display for Progress<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            "current: {:.3} GB, best: {:.3} GB",
            self.current_slack as f64 / 1e9,
            self.best_slack as f64 / 1e9
        )?;
        write!(f, "best chunk sizes: {:?}", self.best_chunk_sizes)
    }
}

/// Why an optimization run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// No shrinkable bucket has any slack left; further steps are no-ops.
    Converged,
    /// The iteration cap was reached.
    IterationLimit,
}

#[derive(Debug)]
enum StepOutcome {
    Shrunk { current_slack: u64 },
    Converged { current_slack: u64 },
}

/// Local-search driver owning the mutable table and the best-seen snapshot.
pub struct Optimizer {
    dataset: Dataset,
    chunk_sizes: ChunkSizes,
    best_chunk_sizes: Vec<u64>,
    best_slack: u64,
    iteration: u64,
}

impl Optimizer {
    pub fn new(dataset: Dataset, chunk_sizes: ChunkSizes) -> Self {
        let best_chunk_sizes = chunk_sizes.as_slice().to_vec();
        Self {
            dataset,
            chunk_sizes,
            best_chunk_sizes,
            best_slack: u64::MAX,
            iteration: 0,
        }
    }

    pub fn best_chunk_sizes(&self) -> &[u64] {
        &self.best_chunk_sizes
    }

    pub fn best_slack(&self) -> u64 {
        self.best_slack
    }

    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    fn step(&mut self) -> Result<StepOutcome> {
        let slacks = compute_slacks(&self.dataset, &self.chunk_sizes)?;
        let total = slacks
            .iter()
            .try_fold(0u64, |acc, &slack| acc.checked_add(slack))
            .ok_or(Error::SlackOverflow)?;
        if total < self.best_slack {
            self.best_slack = total;
            self.best_chunk_sizes.clear();
            self.best_chunk_sizes
                .extend_from_slice(self.chunk_sizes.as_slice());
        }
        self.iteration += 1;

        // Pick the bucket wasting the most bytes, skipping the protected
        // suffix. On ties the lowest index wins.
        let eligible = self.chunk_sizes.len() - self.chunk_sizes.reserve();
        let mut target = 0;
        let mut max_slack = 0;
        for (idx, &slack) in slacks[..eligible].iter().enumerate() {
            if slack > max_slack {
                max_slack = slack;
                target = idx;
            }
        }
        if max_slack == 0 {
            return Ok(StepOutcome::Converged {
                current_slack: total,
            });
        }

        self.chunk_sizes.shrink(target);
        Ok(StepOutcome::Shrunk {
            current_slack: total,
        })
    }

    /// Runs the search until the slack distribution reaches a fixed point
    /// or `max_iterations` steps were taken, reporting to `sink` every
    /// `report_every` iterations and once more on termination.
    pub fn run(
        &mut self,
        max_iterations: u64,
        report_every: u64,
        mut sink: impl FnMut(&Progress),
    ) -> Result<RunOutcome> {
        let mut outcome = RunOutcome::IterationLimit;
        let mut last_slack = 0;
        for _ in 0..max_iterations {
            match self.step()? {
                StepOutcome::Shrunk { current_slack } => {
                    last_slack = current_slack;
                    if report_every > 0 && self.iteration % report_every == 0 {
                        sink(&self.progress(current_slack));
                    }
                }
                StepOutcome::Converged { current_slack } => {
                    last_slack = current_slack;
                    outcome = RunOutcome::Converged;
                    break;
                }
            }
        }
        info!(
            "optimization stopped after {} iterations: {:?}",
            self.iteration, outcome
        );
        if self.iteration > 0 {
            sink(&self.progress(last_slack));
        }
        Ok(outcome)
    }

    fn progress(&self, current_slack: u64) -> Progress {
        Progress {
            iteration: self.iteration,
            current_slack,
            best_slack: self.best_slack,
            best_chunk_sizes: &self.best_chunk_sizes,
        }
    }
}
