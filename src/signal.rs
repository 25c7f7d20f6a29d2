use std::f64::consts::TAU;

use crate::recording::SampleBuffer;

/// Samples at or above this magnitude are ignored when looking for the peak.
const IMPLAUSIBLE_SAMPLE: f32 = 10.0;

/// Something that can drive a speaker: an amplitude for every point in time.
pub trait SignalSource: Send {
    /// Normalized amplitude at `time` seconds, nominally within `-1.0..=1.0`.
    fn amplitude(&self, time: f64) -> f64;
}

impl<S: SignalSource + ?Sized> SignalSource for Box<S> {
    fn amplitude(&self, time: f64) -> f64 {
        (**self).amplitude(time)
    }
}

/// Pure sine tone.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tone {
    frequency: f64,
}

impl Tone {
    pub fn new(frequency: f64) -> Self {
        Self { frequency }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }
}

impl SignalSource for Tone {
    fn amplitude(&self, time: f64) -> f64 {
        (TAU * self.frequency * time).sin()
    }
}

/// Playback of recorded samples, normalized by their peak.
///
/// Once the samples run out the source falls silent. A sample that does not
/// normalize into `-1.0..=1.0` is treated as corrupt and played as silence.
#[derive(Clone, Debug, PartialEq)]
pub struct Sampled {
    samples: Vec<f32>,
    sample_rate: u32,
    peak: f32,
}

impl Sampled {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        let peak = samples
            .iter()
            .map(|sample| sample.abs())
            .filter(|magnitude| *magnitude < IMPLAUSIBLE_SAMPLE)
            .fold(0.0, f32::max);

        Self {
            samples,
            sample_rate,
            peak,
        }
    }

    pub fn from_buffer(buffer: &SampleBuffer) -> Self {
        Self::new(buffer.samples.clone(), buffer.sample_rate)
    }

    pub fn peak(&self) -> f32 {
        self.peak
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Playback length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }

        self.samples.len() as f64 / self.sample_rate as f64
    }
}

impl SignalSource for Sampled {
    fn amplitude(&self, time: f64) -> f64 {
        if !time.is_finite() || time < 0.0 || self.sample_rate == 0 || self.peak == 0.0 {
            return 0.0;
        }

        let index = (self.sample_rate as f64 * time).floor() as usize;
        let Some(sample) = self.samples.get(index) else {
            return 0.0;
        };

        let normalized = sample / self.peak;
        if !(-1.0..=1.0).contains(&normalized) {
            return 0.0;
        }

        normalized as f64
    }
}
