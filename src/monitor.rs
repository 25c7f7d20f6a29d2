use std::{
    thread,
    time::{Duration, Instant},
};

use crate::snapshot::{Snapshot, SnapshotBoard};

/// One line of progress, as printed by [run_monitor].
#[derive(Clone, Debug, PartialEq)]
pub struct Report {
    /// Simulated seconds so far.
    pub elapsed_time: f64,
    /// Ticks completed since the previous report, per wall-clock second.
    pub ticks_per_second: f64,
    /// How far the most displaced node has strayed from its starting point.
    pub peak_displacement: f64,
}

impl Report {
    fn measure(
        board: &SnapshotBoard,
        reference: &Snapshot,
        ticks: u64,
        wall_time: Duration,
    ) -> Self {
        let seconds = wall_time.as_secs_f64();

        Self {
            elapsed_time: board.elapsed_time(),
            ticks_per_second: if seconds > 0.0 {
                ticks as f64 / seconds
            } else {
                0.0
            },
            peak_displacement: board.snapshot().max_displacement(reference),
        }
    }
}

/// Print progress of a running simulation every `interval` until `duration`
/// of wall-clock time has passed, and return every report made.
///
/// Only the board is read, so the stepping thread is never slowed down.
pub fn run_monitor(board: &SnapshotBoard, duration: Duration, interval: Duration) -> Vec<Report> {
    let reference = board.snapshot();
    let started = Instant::now();
    let mut reports = Vec::new();
    let mut last_report = Instant::now();
    let mut last_ticks = board.ticks();

    while started.elapsed() < duration {
        let remaining = duration.saturating_sub(started.elapsed());
        thread::sleep(interval.min(remaining));

        let ticks = board.ticks();
        let report = Report::measure(
            board,
            &reference,
            ticks.saturating_sub(last_ticks),
            last_report.elapsed(),
        );
        println!(
            "simulated: {:.5} s ({:.0} ticks/s), peak displacement: {:.4}",
            report.elapsed_time, report.ticks_per_second, report.peak_displacement
        );

        last_ticks = ticks;
        last_report = Instant::now();
        reports.push(report);
    }

    reports
}
