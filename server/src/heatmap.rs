//! Session-lifetime occupancy heatmap.
//!
//! A sparse grid keyed by cell coordinate. Cells are created lazily on first
//! visit with a fixed midpoint and only ever gain intensity; nothing is
//! evicted while the process runs. With fixed field bounds the cell count is
//! naturally capped at `(width / CELL_SIZE) * (height / CELL_SIZE)`.

use log::warn;
use shared::{cell_center, cell_key, HeatmapCell};
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct HeatmapGrid {
    cells: HashMap<(i32, i32), HeatmapCell>,
}

impl HeatmapGrid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buckets one position sample. Non-finite coordinates are dropped with
    /// a warning; one bad sample must never poison the grid.
    pub fn record_visit(&mut self, x: f32, y: f32) {
        if !x.is_finite() || !y.is_finite() {
            warn!("Dropping non-finite heatmap sample ({}, {})", x, y);
            return;
        }

        let key = cell_key(x, y);
        let cell = self.cells.entry(key).or_insert_with(|| {
            let (cx, cy) = cell_center(key.0, key.1);
            HeatmapCell {
                x: cx,
                y: cy,
                intensity: 0,
            }
        });

        cell.intensity += 1;
    }

    /// Complete copy of the grid, safe to hand to the dispatcher.
    pub fn snapshot(&self) -> HashMap<(i32, i32), HeatmapCell> {
        self.cells.clone()
    }

    pub fn cell(&self, key: (i32, i32)) -> Option<&HeatmapCell> {
        self.cells.get(&key)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Sum of all cell intensities; equals players x ticks while the
    /// simulation runs.
    pub fn total_intensity(&self) -> u64 {
        self.cells.values().map(|c| c.intensity).sum()
    }
}
