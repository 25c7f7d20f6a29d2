use log::debug;

use crate::{lattice::Lattice, signal::SignalSource, Result};

/// How far (in lattice units) a full-scale amplitude pushes a driven node.
pub const DEFAULT_GAIN: f64 = 50.0;

/// Drives a set of nodes sideways from a signal.
///
/// Every tick, after integration, each bound node's X is overwritten with
/// its X at bind time plus the scaled amplitude. Y is left to the springs.
pub struct Speaker {
    source: Box<dyn SignalSource>,
    nodes: Vec<usize>,
    initial_x: Vec<f64>,
    gain: f64,
}

impl Speaker {
    /// Bind to the nodes at the given `(row, col)` coordinates, in order.
    pub fn new(
        lattice: &Lattice,
        source: impl SignalSource + 'static,
        coordinates: &[(usize, usize)],
        gain: f64,
    ) -> Result<Self> {
        let nodes = coordinates
            .iter()
            .map(|&(row, col)| lattice.index(row, col))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::bind(lattice, Box::new(source), nodes, gain))
    }

    /// Bind to a whole lattice column, top to bottom.
    pub fn column(
        lattice: &Lattice,
        source: impl SignalSource + 'static,
        col: usize,
        gain: f64,
    ) -> Result<Self> {
        let nodes = lattice.column(col)?;
        Ok(Self::bind(lattice, Box::new(source), nodes, gain))
    }

    /// Bind to a whole lattice row, left to right.
    pub fn row(
        lattice: &Lattice,
        source: impl SignalSource + 'static,
        row: usize,
        gain: f64,
    ) -> Result<Self> {
        let nodes = lattice.row(row)?;
        Ok(Self::bind(lattice, Box::new(source), nodes, gain))
    }

    fn bind(lattice: &Lattice, source: Box<dyn SignalSource>, nodes: Vec<usize>, gain: f64) -> Self {
        let initial_x = nodes
            .iter()
            .map(|&index| lattice.position(index).x)
            .collect();

        debug!("speaker bound to {} nodes with gain {gain}", nodes.len());

        Self {
            source,
            nodes,
            initial_x,
            gain,
        }
    }

    pub fn nodes(&self) -> &[usize] {
        &self.nodes
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn update(&self, lattice: &mut Lattice, elapsed_time: f64) {
        let offset = self.source.amplitude(elapsed_time) * self.gain;

        for (&index, &initial_x) in self.nodes.iter().zip(self.initial_x.iter()) {
            lattice.set_x(index, initial_x + offset);
        }
    }
}
