use std::path::Path;

use color_eyre::eyre::Result;
use eyre::{eyre, Context};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use log::debug;

use crate::{recording::SampleBuffer, Sample};

/// Load the first channel of a WAV file.
///
/// Integer PCM is scaled into `-1.0..1.0`; float data is passed through as is.
pub fn read_wav(path: impl AsRef<Path>) -> Result<SampleBuffer> {
    let path = path.as_ref();
    let mut reader =
        WavReader::open(path).wrap_err_with(|| format!("opening {}", path.display()))?;
    let spec = reader.spec();

    debug!("reading {}: {spec:?}", path.display());

    if spec.channels == 0 {
        return Err(eyre!("{} has no channels", path.display()));
    }

    let interleaved: Vec<Sample> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .wrap_err("decoding float samples")?,
        SampleFormat::Int => {
            let scale = (1u64 << (spec.bits_per_sample.saturating_sub(1))) as Sample;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|value| value as Sample / scale))
                .collect::<Result<_, _>>()
                .wrap_err("decoding integer samples")?
        }
    };

    let samples = interleaved
        .into_iter()
        .step_by(spec.channels as usize)
        .collect();

    Ok(SampleBuffer {
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        channel_count: 1,
        samples,
    })
}

/// Store a buffer as 32-bit float WAV.
pub fn write_wav(path: impl AsRef<Path>, buffer: &SampleBuffer) -> Result<()> {
    let path = path.as_ref();
    let spec = WavSpec {
        channels: buffer.channel_count,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };

    let mut writer =
        WavWriter::create(path, spec).wrap_err_with(|| format!("creating {}", path.display()))?;

    for &sample in &buffer.samples {
        writer.write_sample(sample).wrap_err("writing sample")?;
    }

    writer
        .finalize()
        .wrap_err_with(|| format!("finalizing {}", path.display()))?;

    debug!("wrote {} samples to {}", buffer.samples.len(), path.display());

    Ok(())
}
