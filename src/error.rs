use std::time::Duration;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum Error {
    #[error("lattice needs at least one row and one column, got {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("lattice spacing must be positive and finite, got {0}")]
    InvalidSpacing(f64),

    #[error("sample rate must be non-zero")]
    InvalidSampleRate,

    #[error("grid coordinate ({row}, {col}) lies outside the {rows}x{cols} lattice")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },

    #[error("simulation is already running")]
    AlreadyRunning,

    #[error("the scene cannot be modified while the simulation is running")]
    NotIdle,

    #[error("simulation thread did not finish within {0:?}")]
    StopTimeout(Duration),

    #[error("simulation thread panicked")]
    SimulationPanicked,

    #[error("no microphone with id {0}")]
    UnknownMicrophone(usize),
}
