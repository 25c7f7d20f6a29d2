use std::{
    thread,
    time::{Duration, Instant},
};

use sound_mesh::{
    kernel::PhysicsConfig,
    lattice::{Lattice, LatticeConfig},
    scene::Scene,
    signal::Tone,
    simulator::{Simulator, SimulatorConfig},
    speaker::Speaker,
    Error,
};

const SAMPLE_RATE: u32 = 44_100;
const ROWS: usize = 12;
const COLS: usize = 20;
const SPEAKER_COLUMN: usize = 1;

fn simulator() -> (Simulator, usize) {
    let lattice = Lattice::new(LatticeConfig::new(ROWS, COLS, 11.0).with_offset(60.0)).unwrap();
    let speaker = Speaker::column(&lattice, Tone::new(440.0), SPEAKER_COLUMN, 2.0).unwrap();

    let mut simulator = Simulator::new(
        Scene::new(lattice, PhysicsConfig::default()),
        SimulatorConfig {
            stop_timeout: Duration::from_secs(5),
        },
    );
    simulator.add_speaker(speaker).unwrap();
    let microphone = simulator.add_microphone(ROWS / 2, COLS - 4).unwrap();

    (simulator, microphone)
}

/// Poll until the stepping thread has done at least `ticks` ticks.
fn wait_for_ticks(simulator: &Simulator, ticks: u64) {
    let deadline = Instant::now() + Duration::from_secs(30);
    while simulator.ticks() < ticks {
        assert!(Instant::now() < deadline, "simulation made no progress");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn clock_is_monotonic_while_running() {
    let (mut simulator, _) = simulator();
    simulator.start(SAMPLE_RATE).unwrap();

    let mut last = simulator.elapsed_simulation_time();
    for _ in 0..50 {
        thread::sleep(Duration::from_micros(200));
        let now = simulator.elapsed_simulation_time();
        assert!(now >= last, "clock went back from {last} to {now}");
        last = now;
    }

    simulator.stop().unwrap();
}

#[test]
fn recording_covers_every_tick() {
    let (mut simulator, microphone) = simulator();

    simulator.start(SAMPLE_RATE).unwrap();
    wait_for_ticks(&simulator, 2_000);
    simulator.stop().unwrap();

    let scene = simulator.scene().unwrap();
    let ticks = scene.ticks();
    assert!(ticks >= 2_000);
    assert_eq!(simulator.ticks(), ticks);
    assert_eq!(simulator.elapsed_simulation_time(), scene.elapsed_time());

    let expected_time = ticks as f64 / SAMPLE_RATE as f64;
    assert!((scene.elapsed_time() - expected_time).abs() < 1e-6);

    let recording = simulator.recording(microphone).unwrap();
    assert_eq!(recording.samples.len() as u64, ticks);
    assert_eq!(recording.sample_rate, SAMPLE_RATE);
    assert_eq!(recording.channel_count, 1);
    assert!(recording.samples.iter().all(|sample| sample.abs() <= 1.0));
}

#[test]
fn border_stays_put_while_running() {
    let (mut simulator, _) = simulator();
    let initial = simulator.snapshot();

    simulator.start(SAMPLE_RATE).unwrap();
    wait_for_ticks(&simulator, 500);
    let during = simulator.snapshot();
    simulator.stop().unwrap();
    let after = simulator.snapshot();

    for snapshot in [&during, &after] {
        assert_eq!(snapshot.rows(), ROWS);
        assert_eq!(snapshot.cols(), COLS);

        for row in 0..ROWS {
            for col in 0..COLS {
                // The speaker column is driven on purpose, border rows included.
                let border = row == 0 || col == 0 || row == ROWS - 1 || col == COLS - 1;
                if border && col != SPEAKER_COLUMN {
                    assert_eq!(snapshot.position(row, col), initial.position(row, col));
                }
            }
        }
    }

    assert_eq!(after, simulator.scene().unwrap().lattice().snapshot());
}

#[test]
fn restart_resets_clock_and_recordings() {
    let (mut simulator, microphone) = simulator();

    simulator.start(SAMPLE_RATE).unwrap();
    wait_for_ticks(&simulator, 1_000);
    simulator.stop().unwrap();

    simulator.start(SAMPLE_RATE / 2).unwrap();
    simulator.stop().unwrap();

    let scene = simulator.scene().unwrap();
    assert_eq!(simulator.sample_rate(), Some(SAMPLE_RATE / 2));
    assert_eq!(
        scene.microphone(microphone).unwrap().displacements().len() as u64,
        scene.ticks()
    );

    // Only the second run is on the clock, at the second run's rate.
    let expected_time = scene.ticks() as f64 * 2.0 / SAMPLE_RATE as f64;
    assert!((scene.elapsed_time() - expected_time).abs() < 1e-6);
}

#[test]
fn lifecycle_errors() {
    let (mut simulator, _) = simulator();

    assert_eq!(simulator.stop(), Ok(()));
    simulator.start(SAMPLE_RATE).unwrap();
    assert_eq!(simulator.start(SAMPLE_RATE), Err(Error::AlreadyRunning));
    assert!(matches!(simulator.scene(), Err(Error::NotIdle)));
    simulator.stop().unwrap();
    assert_eq!(simulator.stop(), Ok(()));
}

#[test]
fn dropping_a_running_simulator_stops_it() {
    let (mut simulator, _) = simulator();
    let board = simulator.board();

    simulator.start(SAMPLE_RATE).unwrap();
    wait_for_ticks(&simulator, 100);
    drop(simulator);

    let ticks = board.ticks();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(board.ticks(), ticks);
}
