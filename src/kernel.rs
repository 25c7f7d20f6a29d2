//! One tick of the mass-spring sheet.
//!
//! A tick runs in two phases. Force accumulation reads positions and
//! velocities and writes forces; integration reads forces and writes
//! positions and velocities. Both fan out over lattice rows with rayon, and
//! the second phase only starts once every row of the first has finished.
//! Within a node, neighbours are always visited in the same order, so a tick
//! produces the same bits no matter how many threads run it.

use rayon::prelude::*;

use crate::{
    lattice::{Lattice, Links},
    Vector2,
};

/// Tunable constants of the sheet material. Every node has unit mass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Stiffness `k` of every spring.
    pub spring_constant: f64,
    /// Velocity damping `c`, applied once for every neighbour of a node.
    pub damping: f64,
    /// Slack a spring must be stretched past before it pulls.
    pub engagement_epsilon: f64,
    /// Springs shorter than this contribute no force.
    pub min_length: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            spring_constant: 1.0e8,
            damping: 50.0,
            engagement_epsilon: 0.001,
            min_length: 1.0e-9,
        }
    }
}

/// Advance every free node of the lattice by `dt` seconds.
pub fn step(lattice: &mut Lattice, config: &PhysicsConfig, dt: f64) {
    accumulate_forces(lattice, config);
    integrate(lattice, dt);
}

pub fn accumulate_forces(lattice: &mut Lattice, config: &PhysicsConfig) {
    let cols = lattice.cols;
    let Lattice {
        fixed,
        links,
        positions,
        velocities,
        forces,
        ..
    } = lattice;

    let (fixed, links, positions, velocities) = (&*fixed, &*links, &*positions, &*velocities);

    forces
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(row, forces)| {
            let row_start = row * cols;

            for (col, force) in forces.iter_mut().enumerate() {
                let index = row_start + col;
                if fixed[index] {
                    continue;
                }

                *force = node_force(
                    positions[index],
                    velocities[index],
                    &links[index],
                    positions,
                    config,
                );
            }
        });
}

pub fn integrate(lattice: &mut Lattice, dt: f64) {
    let cols = lattice.cols;
    let Lattice {
        fixed,
        positions,
        velocities,
        forces,
        ..
    } = lattice;

    positions
        .par_chunks_mut(cols)
        .zip(velocities.par_chunks_mut(cols))
        .zip(forces.par_chunks(cols))
        .zip(fixed.par_chunks(cols))
        .for_each(|(((positions, velocities), forces), fixed)| {
            for col in 0..positions.len() {
                if fixed[col] {
                    continue;
                }

                integrate_node(&mut positions[col], &mut velocities[col], forces[col], dt);
            }
        });
}

/// Total force on a node at `position` moving at `velocity`.
///
/// A spring only pulls once stretched past its rest length by more than the
/// engagement epsilon and never pushes when compressed. Damping is added for
/// every neighbour, so a node with eight neighbours is damped eight times as
/// hard as one with a single neighbour.
pub fn node_force(
    position: Vector2,
    velocity: Vector2,
    links: &Links,
    positions: &[Vector2],
    config: &PhysicsConfig,
) -> Vector2 {
    let mut force = Vector2::ZERO;

    for (neighbor, rest_length) in links.iter() {
        let difference = positions[neighbor] - position;
        let length = difference.length();
        let displacement = length - rest_length;

        if displacement > config.engagement_epsilon && length >= config.min_length {
            let normal = difference / length;
            force += normal * displacement * config.spring_constant;
        }

        force += velocity * -config.damping;
    }

    force
}

/// Semi-implicit Euler: the new velocity moves the node.
pub fn integrate_node(position: &mut Vector2, velocity: &mut Vector2, force: Vector2, dt: f64) {
    *velocity += force * dt;
    *position += *velocity * dt;
}
