//! Frame-based animation primitives.
//!
//! An entity's animation states form a closed catalog: each state has a dense
//! ordinal and a list of frame image paths. `FrameTable` resolves that catalog
//! into a rectangular `[state][frame]` grid of loaded image handles, leaving
//! cells without art empty.
//!
//! Timing uses integer microseconds (`u64`), so timer behaviour does not drift
//! with floating-point rounding.

use std::collections::HashSet;
use std::fmt;

/// A closed set of animation states with their frame art.
pub trait StateCatalog: Copy + Eq + fmt::Debug + 'static {
    /// Every state, in any order.
    const ALL: &'static [Self];

    /// Row of this state in the frame table. Ordinals must be dense: `0..ALL.len()`.
    fn ordinal(self) -> usize;

    /// Image paths for each frame. Empty strings are placeholders for art that
    /// does not exist yet.
    fn frame_paths(self) -> &'static [&'static str];
}

/// Longest frame sequence across the catalog.
pub fn max_frames<S: StateCatalog>() -> usize {
    S::ALL
        .iter()
        .map(|s| s.frame_paths().len())
        .max()
        .unwrap_or(0)
}

/// Check that ordinals are unique and dense.
pub fn validate_catalog<S: StateCatalog>() -> Result<(), String> {
    let count = S::ALL.len();
    let mut seen = HashSet::new();
    for state in S::ALL {
        let ordinal = state.ordinal();
        if ordinal >= count {
            return Err(format!(
                "Catalog validation failed: state {:?} has ordinal {} outside 0..{}",
                state, ordinal, count
            ));
        }
        if !seen.insert(ordinal) {
            return Err(format!(
                "Catalog validation failed: duplicate ordinal {} ({:?})",
                ordinal, state
            ));
        }
    }
    Ok(())
}

/// Rectangular `[ordinal][frame]` path grid; placeholders and short rows are `None`.
pub fn path_table<S: StateCatalog>() -> Vec<Vec<Option<&'static str>>> {
    let width = max_frames::<S>();
    let mut table = vec![vec![None; width]; S::ALL.len()];
    for state in S::ALL {
        let Some(row) = table.get_mut(state.ordinal()) else {
            continue;
        };
        for (cell, path) in row.iter_mut().zip(state.frame_paths()) {
            if !path.is_empty() {
                *cell = Some(*path);
            }
        }
    }
    table
}

/// Loaded frame handles indexed by `[state][frame]`.
#[derive(Debug, Clone)]
pub struct FrameTable<H> {
    cells: Vec<Option<H>>,
    states: usize,
    max_frames: usize,
}

impl<H> FrameTable<H> {
    /// Resolve every path through `loader`. A `None` path or a failed load
    /// leaves the cell empty. Rows longer than `max_frames` are truncated.
    pub fn load<F>(paths: &[Vec<Option<&str>>], max_frames: usize, mut loader: F) -> Self
    where
        F: FnMut(&str) -> Option<H>,
    {
        let states = paths.len();
        let mut cells = Vec::with_capacity(states * max_frames);
        for row in paths {
            for frame in 0..max_frames {
                let handle = row.get(frame).copied().flatten().and_then(&mut loader);
                cells.push(handle);
            }
        }
        Self {
            cells,
            states,
            max_frames,
        }
    }

    pub fn from_catalog<S, F>(loader: F) -> Self
    where
        S: StateCatalog,
        F: FnMut(&str) -> Option<H>,
    {
        Self::load(&path_table::<S>(), max_frames::<S>(), loader)
    }

    /// `None` for empty cells and for out-of-range indices.
    pub fn get(&self, state: usize, frame: usize) -> Option<&H> {
        if state >= self.states || frame >= self.max_frames {
            return None;
        }
        self.cells[state * self.max_frames + frame].as_ref()
    }

    pub fn states(&self) -> usize {
        self.states
    }

    pub fn max_frames(&self) -> usize {
        self.max_frames
    }

    pub fn loaded_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }
}

/// Fixed-period repeating timer.
#[derive(Debug, Clone)]
pub struct AnimationTimer {
    period_us: u64,
    elapsed_us: u64,
}

impl AnimationTimer {
    pub fn new(period_us: u64) -> Self {
        Self {
            period_us: period_us.max(1),
            elapsed_us: 0,
        }
    }

    pub fn from_millis(period_ms: u64) -> Self {
        Self::new(period_ms.saturating_mul(1000))
    }

    pub fn period_us(&self) -> u64 {
        self.period_us
    }

    /// Advance by `dt_us`; returns how many periods completed.
    pub fn tick(&mut self, dt_us: u64) -> u32 {
        self.elapsed_us = self.elapsed_us.saturating_add(dt_us);
        let fires = self.elapsed_us / self.period_us;
        self.elapsed_us %= self.period_us;
        if fires > 1 {
            log::debug!(
                "Animation timer fell behind: {} periods elapsed in one tick",
                fires
            );
        }
        fires.min(u64::from(u32::MAX)) as u32
    }

    pub fn reset(&mut self) {
        self.elapsed_us = 0;
    }
}

/// Index into a looping frame sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameCycle {
    len: usize,
    index: usize,
}

impl FrameCycle {
    pub fn new(len: usize) -> Self {
        Self {
            len: len.max(1),
            index: 0,
        }
    }

    pub fn current(&self) -> usize {
        self.index
    }

    pub fn advance(&mut self) {
        self.index = (self.index + 1) % self.len;
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}
