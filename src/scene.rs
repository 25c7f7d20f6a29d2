use log::debug;

use crate::{
    kernel::{self, PhysicsConfig},
    lattice::Lattice,
    microphone::Microphone,
    recording::SampleBuffer,
    speaker::Speaker,
    Error, Result,
};

/// Everything a tick touches: the sheet, what drives it, what listens to it,
/// and the simulated clock.
///
/// A scene can be stepped directly for offline rendering, or handed to a
/// [Simulator](crate::simulator::Simulator) to be stepped on its own thread.
pub struct Scene {
    lattice: Lattice,
    physics: PhysicsConfig,
    speakers: Vec<Speaker>,
    microphones: Vec<Microphone>,
    elapsed_time: f64,
    ticks: u64,
}

impl Scene {
    pub fn new(lattice: Lattice, physics: PhysicsConfig) -> Self {
        Self {
            lattice,
            physics,
            speakers: Vec::new(),
            microphones: Vec::new(),
            elapsed_time: 0.0,
            ticks: 0,
        }
    }

    pub fn lattice(&self) -> &Lattice {
        &self.lattice
    }

    pub fn lattice_mut(&mut self) -> &mut Lattice {
        &mut self.lattice
    }

    pub fn physics(&self) -> &PhysicsConfig {
        &self.physics
    }

    /// Returns the speaker's id.
    pub fn add_speaker(&mut self, speaker: Speaker) -> usize {
        self.speakers.push(speaker);
        self.speakers.len() - 1
    }

    /// Place a microphone at `(row, col)` and return its id.
    pub fn add_microphone(&mut self, row: usize, col: usize) -> Result<usize> {
        let microphone = Microphone::new(&self.lattice, row, col)?;
        self.microphones.push(microphone);
        Ok(self.microphones.len() - 1)
    }

    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    pub fn microphones(&self) -> &[Microphone] {
        &self.microphones
    }

    pub fn microphone(&self, id: usize) -> Result<&Microphone> {
        self.microphones.get(id).ok_or(Error::UnknownMicrophone(id))
    }

    pub fn recording(&self, microphone: usize, sample_rate: u32) -> Result<SampleBuffer> {
        Ok(self.microphone(microphone)?.recording(sample_rate))
    }

    /// Simulated seconds since the clock was last reset.
    pub fn elapsed_time(&self) -> f64 {
        self.elapsed_time
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Rewind the clock and drop everything the microphones heard.
    ///
    /// The sheet itself keeps whatever state it is in.
    pub fn reset_clock(&mut self) {
        self.elapsed_time = 0.0;
        self.ticks = 0;
        self.microphones.iter_mut().for_each(Microphone::clear);
    }

    pub fn tick(&mut self, dt: f64) {
        kernel::step(&mut self.lattice, &self.physics, dt);

        for speaker in &self.speakers {
            speaker.update(&mut self.lattice, self.elapsed_time);
        }

        for microphone in &mut self.microphones {
            microphone.update(&self.lattice);
        }

        self.elapsed_time += dt;
        self.ticks += 1;
    }

    /// Step `ticks` audio samples at `sample_rate` on the calling thread.
    pub fn run(&mut self, sample_rate: u32, ticks: u64) -> Result<()> {
        let dt = sample_period(sample_rate)?;

        debug!("running {ticks} ticks at {sample_rate} Hz");

        for _ in 0..ticks {
            self.tick(dt);
        }

        Ok(())
    }
}

/// Seconds per tick for `sample_rate`.
pub fn sample_period(sample_rate: u32) -> Result<f64> {
    if sample_rate == 0 {
        return Err(Error::InvalidSampleRate);
    }

    Ok(1.0 / sample_rate as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lattice::LatticeConfig,
        signal::{Sampled, Tone},
        Vector2,
    };

    fn scene(rows: usize, cols: usize) -> Scene {
        let lattice = Lattice::new(LatticeConfig::new(rows, cols, 1.0)).unwrap();
        Scene::new(
            lattice,
            PhysicsConfig {
                spring_constant: 1000.0,
                damping: 1.0,
                ..Default::default()
            },
        )
    }

    #[test]
    fn clock_advances_by_sample_period() {
        let mut scene = scene(3, 3);
        scene.run(4, 10).unwrap();

        assert_eq!(scene.ticks(), 10);
        assert_eq!(scene.elapsed_time(), 2.5);
        assert_eq!(scene.run(0, 1), Err(Error::InvalidSampleRate));
    }

    #[test]
    fn speaker_overrides_integration() {
        let mut scene = scene(3, 5);
        let lattice = scene.lattice();
        let speaker = Speaker::column(lattice, Sampled::new(vec![1.0], 1), 2, 0.25).unwrap();
        scene.add_speaker(speaker);

        // Integration alone would carry the driven centre far to the left.
        let centre = scene.lattice().index(1, 2).unwrap();
        scene
            .lattice_mut()
            .set_velocity(centre, Vector2::new(-1000.0, 0.0));
        scene.tick(0.01);

        assert_eq!(scene.lattice().position(centre).x, 2.25);
        assert_ne!(scene.lattice().velocity(centre).x, 0.0);
    }

    #[test]
    fn speaker_uses_time_at_tick_start() {
        let mut scene = scene(3, 3);
        let speaker = Speaker::column(scene.lattice(), Tone::new(1.0), 1, 1.0).unwrap();
        scene.add_speaker(speaker);
        let microphone = scene.add_microphone(1, 1).unwrap();

        scene.run(4, 3).unwrap();

        // sin at 0, 1/4 and 1/2 of a period.
        let heard = scene.microphone(microphone).unwrap().displacements();
        assert_eq!(heard.len(), 3);
        assert!(heard[0].abs() < 1e-12);
        assert!((heard[1] - 1.0).abs() < 1e-12);
        assert!(heard[2].abs() < 1e-12);
    }

    #[test]
    fn microphone_hears_the_driven_wave() {
        let mut scene = scene(5, 9);
        let speaker = Speaker::column(scene.lattice(), Tone::new(20.0), 1, 0.2).unwrap();
        scene.add_speaker(speaker);
        let microphone = scene.add_microphone(2, 6).unwrap();

        scene.run(2_000, 2_000).unwrap();

        let recording = scene.recording(microphone, 2_000).unwrap();
        assert_eq!(recording.samples.len(), 2_000);
        let peak = recording
            .samples
            .iter()
            .map(|sample| sample.abs())
            .fold(0.0, f32::max);
        assert_eq!(peak, 1.0);
    }

    #[test]
    fn reset_clock_clears_recordings() {
        let mut scene = scene(3, 3);
        let microphone = scene.add_microphone(1, 1).unwrap();
        scene.run(100, 5).unwrap();

        scene.reset_clock();

        assert_eq!(scene.elapsed_time(), 0.0);
        assert_eq!(scene.ticks(), 0);
        assert!(scene.microphone(microphone).unwrap().displacements().is_empty());
        assert_eq!(scene.recording(7, 100), Err(Error::UnknownMicrophone(7)));
    }
}
