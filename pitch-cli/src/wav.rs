//! WAV file loading for offline analysis.

use std::path::Path;

use anyhow::{Context, Result, bail};
use hound::{SampleFormat, WavReader};

/// Reads a WAV file and returns its samples averaged down to mono, together
/// with the sample rate.
pub fn read_mono(path: &Path) -> Result<(Vec<f32>, u32)> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .context("failed to decode float samples")?,
        SampleFormat::Int => {
            if spec.bits_per_sample == 0 || spec.bits_per_sample > 32 {
                bail!("unsupported bit depth {}", spec.bits_per_sample);
            }
            let scale = 1.0 / (1u64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<std::result::Result<_, _>>()
                .context("failed to decode integer samples")?
        }
    };

    let mono = interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f32>() / frame.len() as f32)
        .collect();
    Ok((mono, spec.sample_rate))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hound::{WavSpec, WavWriter};

    fn temp_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("pitch-cli-{}-{name}.wav", std::process::id()))
    }

    #[test]
    fn reads_stereo_int16_as_mono() {
        let path = temp_path("stereo");
        let spec = WavSpec {
            channels: 2,
            sample_rate: 22_050,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..4 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, rate) = read_mono(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(rate, 22_050);
        assert_eq!(samples.len(), 4);
        assert!(samples.iter().all(|&s| (s - 0.25).abs() < 1e-6));
    }

    #[test]
    fn reads_float_mono() {
        let path = temp_path("float");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44_100,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for s in [0.5f32, -0.5, 0.25] {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        let (samples, _) = read_mono(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(samples, vec![0.5, -0.5, 0.25]);
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(read_mono(Path::new("/no/such/file.wav")).is_err());
    }
}
