use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use sound_mesh::{
    io::{read_wav, write_wav},
    kernel::PhysicsConfig,
    lattice::{Lattice, LatticeConfig},
    scene::Scene,
    signal::{Sampled, SignalSource, Tone},
    speaker::{Speaker, DEFAULT_GAIN},
};

/// Render a fixed number of ticks on the calling thread and write the result.
///
/// Unlike the threaded runner, the output only depends on the arguments, so
/// two renders with the same arguments produce identical files.
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(long, default_value_t = 20)]
    rows: usize,
    #[arg(long, default_value_t = 40)]
    cols: usize,
    #[arg(long, default_value_t = 11.0)]
    spacing: f64,
    #[arg(short = 'r', long, default_value_t = 44_100)]
    sample_rate: u32,
    /// Simulated duration in seconds; defaults to the input's length, or 1 s.
    #[arg(short, long)]
    seconds: Option<f64>,
    #[arg(short, long, default_value_t = 440.0)]
    frequency: f64,
    #[arg(short, long)]
    input: Option<PathBuf>,
    #[arg(long, default_value_t = 1)]
    speaker_column: usize,
    #[arg(long, default_value_t = DEFAULT_GAIN)]
    gain: f64,
    #[arg(long, default_value_t = 10)]
    microphone_row: usize,
    #[arg(long, default_value_t = 30)]
    microphone_column: usize,
    #[arg(long, default_value_t = 1.0e8)]
    spring_constant: f64,
    #[arg(long, default_value_t = 50.0)]
    damping: f64,
    #[arg(short, long, default_value = "render.wav")]
    output: PathBuf,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    env_logger::init();

    let args = Args::parse();

    let lattice = Lattice::new(
        LatticeConfig::new(args.rows, args.cols, args.spacing).with_offset(60.0),
    )?;
    let physics = PhysicsConfig {
        spring_constant: args.spring_constant,
        damping: args.damping,
        ..Default::default()
    };

    let (source, source_duration): (Box<dyn SignalSource>, Option<f64>) = match &args.input {
        Some(path) => {
            let sampled = Sampled::from_buffer(&read_wav(path)?);
            let duration = sampled.duration();
            (Box::new(sampled), Some(duration))
        }
        None => (Box::new(Tone::new(args.frequency)), None),
    };

    let speaker = Speaker::column(&lattice, source, args.speaker_column, args.gain)?;
    let mut scene = Scene::new(lattice, physics);
    scene.add_speaker(speaker);
    let microphone = scene.add_microphone(args.microphone_row, args.microphone_column)?;

    let seconds = args.seconds.or(source_duration).unwrap_or(1.0).max(0.0);
    let ticks = (seconds * args.sample_rate as f64).round() as u64;
    println!("rendering {ticks} ticks ({seconds:.3} s)");
    scene.run(args.sample_rate, ticks)?;

    write_wav(&args.output, &scene.recording(microphone, args.sample_rate)?)?;
    println!("wrote {}", args.output.display());

    Ok(())
}
