use crate::Sample;

/// Bit depth of every recording the simulation emits.
pub const RECORDING_BITS_PER_SAMPLE: u16 = 32;

/// Uncompressed audio handed to and received from a codec.
#[derive(Clone, Debug, PartialEq)]
pub struct SampleBuffer {
    pub sample_rate: u32,
    pub bits_per_sample: u16,
    pub channel_count: u16,
    pub samples: Vec<Sample>,
}

impl SampleBuffer {
    pub fn mono(sample_rate: u32, samples: Vec<Sample>) -> Self {
        Self {
            sample_rate,
            bits_per_sample: RECORDING_BITS_PER_SAMPLE,
            channel_count: 1,
            samples,
        }
    }

    /// Length in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 || self.channel_count == 0 {
            return 0.0;
        }

        self.samples.len() as f64 / (self.sample_rate as f64 * self.channel_count as f64)
    }
}

/// Scale a displacement series so that its loudest value is exactly ±1.
///
/// A series that never moved becomes silence of the same length instead of
/// a division by zero.
pub fn normalize(series: &[f64], sample_rate: u32) -> SampleBuffer {
    let max_abs = series.iter().map(|value| value.abs()).fold(0.0, f64::max);

    let samples = if max_abs == 0.0 {
        vec![0.0; series.len()]
    } else {
        series
            .iter()
            .map(|value| (value / max_abs) as Sample)
            .collect()
    };

    SampleBuffer::mono(sample_rate, samples)
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, Rng, SeedableRng};

    use super::*;

    #[test]
    fn loudest_sample_becomes_unity() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut series: Vec<f64> = (0..512).map(|_| rng.gen_range(-0.4..0.4)).collect();
        series[137] = -0.75;

        let buffer = normalize(&series, 44_100);

        let (argmax, peak) = buffer
            .samples
            .iter()
            .map(|sample| sample.abs())
            .enumerate()
            .fold((0, 0.0f32), |best, (index, magnitude)| {
                if magnitude > best.1 {
                    (index, magnitude)
                } else {
                    best
                }
            });
        assert_eq!(peak, 1.0);
        assert_eq!(argmax, 137);
        assert_eq!(buffer.samples[137], -1.0);

        for (sample, value) in buffer.samples.iter().zip(series.iter()) {
            assert_eq!(
                sample.is_sign_negative(),
                value.is_sign_negative(),
                "{sample} vs {value}"
            );
        }
    }

    #[test]
    fn recording_format() {
        let buffer = normalize(&[0.5, -0.25], 8_000);

        assert_eq!(buffer.sample_rate, 8_000);
        assert_eq!(buffer.channel_count, 1);
        assert_eq!(buffer.bits_per_sample, 32);
        assert_eq!(buffer.samples, [1.0, -0.5]);
    }

    #[test]
    fn still_series_becomes_silence() {
        assert_eq!(normalize(&[0.0; 4], 100).samples, [0.0; 4]);
        assert!(normalize(&[], 100).samples.is_empty());
    }

    #[test]
    fn duration_accounts_for_channels() {
        let buffer = SampleBuffer {
            sample_rate: 10,
            bits_per_sample: 16,
            channel_count: 2,
            samples: vec![0.0; 40],
        };

        assert_eq!(buffer.duration(), 2.0);
    }
}
