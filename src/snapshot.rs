use std::sync::atomic::{AtomicU64, Ordering};

use crate::{scene::Scene, Vector2};

/// Edge length of the box drawn for every node unless told otherwise.
pub const DEFAULT_NODE_SIZE: f32 = 5.0;

/// Point-in-time copy of every node position, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    rows: usize,
    cols: usize,
    positions: Vec<Vector2>,
}

/// Axis aligned box anchored at a node's position, ready for a rasterizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeBounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Snapshot {
    pub(crate) fn new(rows: usize, cols: usize, positions: Vec<Vector2>) -> Self {
        Self {
            rows,
            cols,
            positions,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn positions(&self) -> &[Vector2] {
        &self.positions
    }

    pub fn position(&self, row: usize, col: usize) -> Option<Vector2> {
        if row >= self.rows || col >= self.cols {
            return None;
        }

        self.positions.get(row * self.cols + col).copied()
    }

    pub fn bounds(&self, size: f32) -> Vec<NodeBounds> {
        self.positions
            .iter()
            .map(|position| NodeBounds {
                x: position.x as f32,
                y: position.y as f32,
                width: size,
                height: size,
            })
            .collect()
    }

    /// Largest distance of any node from where it sits in `reference`.
    pub fn max_displacement(&self, reference: &Snapshot) -> f64 {
        self.positions
            .iter()
            .zip(reference.positions.iter())
            .map(|(now, then)| now.distance(*then))
            .fold(0.0, f64::max)
    }
}

/// Node positions and the simulation clock, shared with whoever wants to look.
///
/// The stepping thread publishes after every tick; readers never block it.
/// Each coordinate is a single atomic, so a reader never sees a half-written
/// number, but a snapshot taken mid-publish can mix two consecutive ticks.
/// That is fine for drawing and must not be fed back into the simulation.
#[derive(Debug)]
pub struct SnapshotBoard {
    rows: usize,
    cols: usize,
    coordinates: Vec<AtomicU64>,
    elapsed: AtomicU64,
    ticks: AtomicU64,
}

impl SnapshotBoard {
    pub(crate) fn new(scene: &Scene) -> Self {
        let lattice = scene.lattice();
        let coordinates = lattice
            .positions()
            .iter()
            .flat_map(|position| [position.x, position.y])
            .map(|value| AtomicU64::new(value.to_bits()))
            .collect();

        Self {
            rows: lattice.rows(),
            cols: lattice.cols(),
            coordinates,
            elapsed: AtomicU64::new(scene.elapsed_time().to_bits()),
            ticks: AtomicU64::new(scene.ticks()),
        }
    }

    pub(crate) fn publish(&self, scene: &Scene) {
        let positions = scene.lattice().positions();

        for (pair, position) in self.coordinates.chunks_exact(2).zip(positions) {
            pair[0].store(position.x.to_bits(), Ordering::Relaxed);
            pair[1].store(position.y.to_bits(), Ordering::Relaxed);
        }

        self.ticks.store(scene.ticks(), Ordering::Relaxed);
        self.elapsed
            .store(scene.elapsed_time().to_bits(), Ordering::Release);
    }

    pub fn snapshot(&self) -> Snapshot {
        let positions = self
            .coordinates
            .chunks_exact(2)
            .map(|pair| {
                Vector2::new(
                    f64::from_bits(pair[0].load(Ordering::Relaxed)),
                    f64::from_bits(pair[1].load(Ordering::Relaxed)),
                )
            })
            .collect();

        Snapshot::new(self.rows, self.cols, positions)
    }

    /// Simulated seconds covered by the last published tick.
    pub fn elapsed_time(&self) -> f64 {
        f64::from_bits(self.elapsed.load(Ordering::Acquire))
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }
}
