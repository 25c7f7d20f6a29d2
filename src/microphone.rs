use log::debug;

use crate::{
    lattice::Lattice,
    recording::{self, SampleBuffer},
    Result,
};

/// Listens to one node and keeps every X displacement it ever saw.
#[derive(Clone, Debug)]
pub struct Microphone {
    node: usize,
    initial_x: f64,
    displacements: Vec<f64>,
}

impl Microphone {
    pub fn new(lattice: &Lattice, row: usize, col: usize) -> Result<Self> {
        let node = lattice.index(row, col)?;

        debug!("microphone listening at ({row}, {col})");

        Ok(Self {
            node,
            initial_x: lattice.position(node).x,
            displacements: Vec::new(),
        })
    }

    pub fn node(&self) -> usize {
        self.node
    }

    pub fn update(&mut self, lattice: &Lattice) {
        self.displacements
            .push(lattice.position(self.node).x - self.initial_x);
    }

    /// Every recorded displacement, one per tick.
    pub fn displacements(&self) -> &[f64] {
        &self.displacements
    }

    pub fn clear(&mut self) {
        self.displacements.clear();
    }

    pub fn recording(&self, sample_rate: u32) -> SampleBuffer {
        recording::normalize(&self.displacements, sample_rate)
    }
}
