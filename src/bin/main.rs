use std::{path::PathBuf, time::Duration};

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use log::info;
use sound_mesh::{
    io::{read_wav, write_wav},
    kernel::PhysicsConfig,
    lattice::{Lattice, LatticeConfig},
    monitor::run_monitor,
    scene::Scene,
    signal::{Sampled, Tone},
    simulator::{Simulator, SimulatorConfig},
    speaker::{Speaker, DEFAULT_GAIN},
};

/// Vertical offset of the whole sheet, leaving room for a status line above it.
const LATTICE_OFFSET: f64 = 60.0;
/// How often progress is printed while the simulation runs.
const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Drive a mass-spring sheet from one column and record what a point on it hears.
///
/// The simulation runs on its own thread, unthrottled, for the given amount of
/// wall-clock time.
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(long, default_value_t = 60)]
    rows: usize,
    #[arg(long, default_value_t = 100)]
    cols: usize,
    #[arg(long, default_value_t = 11.0)]
    spacing: f64,
    /// Simulated samples per second, i.e. ticks per simulated second.
    #[arg(short = 'r', long, default_value_t = 44_100)]
    sample_rate: u32,
    /// Wall-clock seconds to keep the simulation running.
    #[arg(short, long, default_value_t = 10.0)]
    seconds: f64,
    /// Frequency of the driving tone, ignored when `--input` is given.
    #[arg(short, long, default_value_t = 440.0)]
    frequency: f64,
    /// WAV file to play through the speaker instead of a tone.
    #[arg(short, long)]
    input: Option<PathBuf>,
    #[arg(long, default_value_t = 1)]
    speaker_column: usize,
    #[arg(long, default_value_t = DEFAULT_GAIN)]
    gain: f64,
    #[arg(long, default_value_t = 30)]
    microphone_row: usize,
    #[arg(long, default_value_t = 80)]
    microphone_column: usize,
    #[arg(long, default_value_t = 1.0e8)]
    spring_constant: f64,
    #[arg(long, default_value_t = 50.0)]
    damping: f64,
    /// Where to write what the microphone heard.
    #[arg(short, long, default_value = "recording.wav")]
    output: PathBuf,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let args = Args::parse();

    let lattice = Lattice::new(
        LatticeConfig::new(args.rows, args.cols, args.spacing).with_offset(LATTICE_OFFSET),
    )?;
    let physics = PhysicsConfig {
        spring_constant: args.spring_constant,
        damping: args.damping,
        ..Default::default()
    };

    let speaker = match &args.input {
        Some(path) => {
            let buffer = read_wav(path)?;
            info!(
                "playing {} ({:.2} s at {} Hz)",
                path.display(),
                buffer.duration(),
                buffer.sample_rate
            );
            Speaker::column(
                &lattice,
                Sampled::from_buffer(&buffer),
                args.speaker_column,
                args.gain,
            )?
        }
        None => Speaker::column(
            &lattice,
            Tone::new(args.frequency),
            args.speaker_column,
            args.gain,
        )?,
    };

    let mut simulator = Simulator::new(Scene::new(lattice, physics), SimulatorConfig::default());
    simulator.add_speaker(speaker)?;
    let microphone = simulator.add_microphone(args.microphone_row, args.microphone_column)?;

    let duration = run_duration(args.seconds)?;

    simulator.start(args.sample_rate)?;
    run_monitor(&simulator.board(), duration, REPORT_INTERVAL);
    simulator.stop()?;

    let recording = simulator.recording(microphone)?;
    println!(
        "recorded {:.5} s of simulated audio to {}",
        recording.duration(),
        args.output.display()
    );
    write_wav(&args.output, &recording)?;

    Ok(())
}

fn run_duration(seconds: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(seconds)
        .wrap_err_with(|| format!("--seconds must be a finite, non-negative number, got {seconds}"))
}
