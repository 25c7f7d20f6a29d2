use log::debug;

use crate::{snapshot::Snapshot, Error, Result, Vector2};

/// Size of the Moore neighbourhood, the most links a node can have.
pub const MAX_NEIGHBORS: usize = 8;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatticeConfig {
    pub rows: usize,
    pub cols: usize,
    /// Distance between neighbouring nodes along either axis.
    pub spacing: f64,
    /// Added to every node's initial Y.
    pub offset: f64,
}

impl LatticeConfig {
    pub fn new(rows: usize, cols: usize, spacing: f64) -> Self {
        Self {
            rows,
            cols,
            spacing,
            offset: 0.0,
        }
    }

    pub fn with_offset(self, offset: f64) -> Self {
        Self { offset, ..self }
    }
}

/// The springs attached to one node: neighbour indices and their rest lengths.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Links {
    indices: [usize; MAX_NEIGHBORS],
    rest_lengths: [f64; MAX_NEIGHBORS],
    len: usize,
}

impl Links {
    fn push(&mut self, index: usize, rest_length: f64) {
        self.indices[self.len] = index;
        self.rest_lengths[self.len] = rest_length;
        self.len += 1;
    }

    /// Build links by hand, for kernels run outside of a [Lattice].
    ///
    /// Anything past [MAX_NEIGHBORS] pairs is ignored.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (usize, f64)>) -> Self {
        let mut links = Self::default();
        for (index, rest_length) in pairs.into_iter().take(MAX_NEIGHBORS) {
            links.push(index, rest_length);
        }
        links
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices[..self.len]
    }

    pub fn rest_lengths(&self) -> &[f64] {
        &self.rest_lengths[..self.len]
    }

    /// `(neighbour index, rest length)` pairs in neighbourhood scan order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices()
            .iter()
            .copied()
            .zip(self.rest_lengths().iter().copied())
    }
}

/// Read-only view of a single node.
#[derive(Clone, Copy, Debug)]
pub struct Node<'a> {
    pub fixed: bool,
    pub position: Vector2,
    pub velocity: Vector2,
    pub force: Vector2,
    pub links: &'a Links,
}

/// Grid of point masses joined by springs.
///
/// Nodes live in flat row-major arrays, one array per quantity, so that the
/// kernel can hand every row of the array it writes to a different task.
/// Neighbours are referenced by index into those arrays.
#[derive(Clone, Debug)]
pub struct Lattice {
    pub(crate) rows: usize,
    pub(crate) cols: usize,
    spacing: f64,
    offset: f64,
    pub(crate) fixed: Vec<bool>,
    pub(crate) links: Vec<Links>,
    pub(crate) positions: Vec<Vector2>,
    pub(crate) velocities: Vec<Vector2>,
    pub(crate) forces: Vec<Vector2>,
}

impl Lattice {
    pub fn new(config: LatticeConfig) -> Result<Self> {
        let LatticeConfig {
            rows,
            cols,
            spacing,
            offset,
        } = config;

        if rows == 0 || cols == 0 {
            return Err(Error::InvalidDimensions { rows, cols });
        }

        if !(spacing.is_finite() && spacing > 0.0) {
            return Err(Error::InvalidSpacing(spacing));
        }

        let size = rows * cols;
        let mut positions = Vec::with_capacity(size);
        let mut fixed = Vec::with_capacity(size);

        for y in 0..rows {
            for x in 0..cols {
                positions.push(Vector2::new(
                    x as f64 * spacing,
                    y as f64 * spacing + offset,
                ));

                // A single row models a string, so only its ends are held.
                let is_border = if rows == 1 {
                    x == 0 || x == cols - 1
                } else {
                    y == 0 || x == 0 || y == rows - 1 || x == cols - 1
                };
                fixed.push(is_border);
            }
        }

        let links = connect(rows, cols, &positions);

        debug!("built {rows}x{cols} lattice with spacing {spacing}");

        Ok(Self {
            rows,
            cols,
            spacing,
            offset,
            fixed,
            links,
            positions,
            velocities: vec![Vector2::ZERO; size],
            forces: vec![Vector2::ZERO; size],
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn spacing(&self) -> f64 {
        self.spacing
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    /// Total number of nodes.
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Flat index of the node at `(row, col)`.
    pub fn index(&self, row: usize, col: usize) -> Result<usize> {
        if row >= self.rows || col >= self.cols {
            return Err(Error::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }

        Ok(row * self.cols + col)
    }

    /// Grid coordinate `(row, col)` of a flat index.
    pub fn coordinates(&self, index: usize) -> (usize, usize) {
        (index / self.cols, index % self.cols)
    }

    /// Indices of every node in `row`, left to right.
    pub fn row(&self, row: usize) -> Result<Vec<usize>> {
        let start = self.index(row, 0)?;
        Ok((start..start + self.cols).collect())
    }

    /// Indices of every node in `col`, top to bottom.
    pub fn column(&self, col: usize) -> Result<Vec<usize>> {
        self.index(0, col)?;
        Ok((0..self.rows).map(|row| row * self.cols + col).collect())
    }

    pub fn node(&self, index: usize) -> Node<'_> {
        Node {
            fixed: self.fixed[index],
            position: self.positions[index],
            velocity: self.velocities[index],
            force: self.forces[index],
            links: &self.links[index],
        }
    }

    pub fn is_fixed(&self, index: usize) -> bool {
        self.fixed[index]
    }

    pub fn links(&self, index: usize) -> &Links {
        &self.links[index]
    }

    pub fn position(&self, index: usize) -> Vector2 {
        self.positions[index]
    }

    pub fn velocity(&self, index: usize) -> Vector2 {
        self.velocities[index]
    }

    /// Force accumulated for the node during the last tick.
    pub fn force(&self, index: usize) -> Vector2 {
        self.forces[index]
    }

    pub fn positions(&self) -> &[Vector2] {
        &self.positions
    }

    /// Move a node, typically to pluck the sheet before a run.
    ///
    /// Works on fixed nodes too; the kernel will simply never move them back.
    pub fn set_position(&mut self, index: usize, position: Vector2) {
        self.positions[index] = position;
    }

    pub fn displace(&mut self, index: usize, delta: Vector2) {
        self.positions[index] += delta;
    }

    pub fn set_velocity(&mut self, index: usize, velocity: Vector2) {
        self.velocities[index] = velocity;
    }

    pub(crate) fn set_x(&mut self, index: usize, x: f64) {
        self.positions[index].x = x;
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::new(self.rows, self.cols, self.positions.clone())
    }
}

/// Wire up the Moore neighbourhood of every node, clipped at the edges.
fn connect(rows: usize, cols: usize, positions: &[Vector2]) -> Vec<Links> {
    let mut all_links = Vec::with_capacity(positions.len());

    for y in 0..rows {
        for x in 0..cols {
            let here = positions[y * cols + x];
            let mut links = Links::default();

            for dy in -1isize..=1 {
                for dx in -1isize..=1 {
                    if dy == 0 && dx == 0 {
                        continue;
                    }

                    let (Some(ty), Some(tx)) =
                        (y.checked_add_signed(dy), x.checked_add_signed(dx))
                    else {
                        continue;
                    };

                    if ty >= rows || tx >= cols {
                        continue;
                    }

                    let neighbor = ty * cols + tx;
                    links.push(neighbor, (here - positions[neighbor]).length());
                }
            }

            all_links.push(links);
        }
    }

    all_links
}
