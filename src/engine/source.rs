//! Audio decoding into shared in-memory sample buffers.
//!
//! Every track is decoded fully at load time (WAV via hound, FLAC via claxon)
//! into a 16-bit interleaved buffer behind an `Arc`. The buffer is what both
//! seeking and end-of-track detection are built on: a [`MemorySource`] over it
//! can seek to any frame instantly, which is what lets a track switch land on
//! the carried-over position without re-reading the file.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rodio::Source;
use rodio::source::SeekError;

use crate::engine::error::{EngineError, EngineResult};

/// A fully decoded audio file: interleaved i16 samples plus format info.
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    samples: Arc<Vec<i16>>,
    channels: u16,
    sample_rate: u32,
}

impl DecodedAudio {
    pub fn load(path: &Path) -> EngineResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "wav" => Self::load_wav(path),
            "flac" => Self::load_flac(path),
            _ => Err(EngineError::Decode(format!(
                "unsupported audio format: {ext}"
            ))),
        }
    }

    fn load_wav(path: &Path) -> EngineResult<Self> {
        let file = File::open(path)
            .map_err(|e| EngineError::Decode(format!("{}: {e}", path.display())))?;
        let mut reader = hound::WavReader::new(BufReader::new(file))
            .map_err(|e| EngineError::Decode(e.to_string()))?;
        let spec = reader.spec();

        // Normalize everything to i16 up front
        let samples: Vec<i16> = match spec.bits_per_sample {
            16 => reader
                .samples::<i16>()
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| EngineError::Decode(e.to_string()))?,
            24 => reader
                .samples::<i32>()
                .map(|s| s.map(|s| (s >> 8) as i16))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| EngineError::Decode(e.to_string()))?,
            32 => reader
                .samples::<i32>()
                .map(|s| s.map(|s| (s >> 16) as i16))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| EngineError::Decode(e.to_string()))?,
            8 => reader
                .samples::<i8>()
                .map(|s| s.map(|s| (s as i16) << 8))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| EngineError::Decode(e.to_string()))?,
            other => {
                return Err(EngineError::Decode(format!(
                    "unsupported bit depth: {other}"
                )));
            }
        };

        log::info!(
            "WAV loaded: {} Hz, {} ch, {} bits, {} samples",
            spec.sample_rate,
            spec.channels,
            spec.bits_per_sample,
            samples.len()
        );

        Ok(Self {
            samples: Arc::new(samples),
            channels: spec.channels,
            sample_rate: spec.sample_rate,
        })
    }

    fn load_flac(path: &Path) -> EngineResult<Self> {
        let mut reader =
            claxon::FlacReader::open(path).map_err(|e| EngineError::Decode(e.to_string()))?;
        let info = reader.streaminfo();
        let bits = info.bits_per_sample;

        let mut samples = Vec::new();
        for sample in reader.samples() {
            let sample = sample.map_err(|e| EngineError::Decode(e.to_string()))?;
            samples.push(match bits {
                16 => sample as i16,
                24 => (sample >> 8) as i16,
                _ => (sample >> 16) as i16,
            });
        }

        log::info!(
            "FLAC loaded: {} Hz, {} ch, {} bits, {} samples",
            info.sample_rate,
            info.channels,
            bits,
            samples.len()
        );

        Ok(Self {
            samples: Arc::new(samples),
            channels: info.channels as u16,
            sample_rate: info.sample_rate,
        })
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn duration(&self) -> Duration {
        let frames = self.samples.len() as f64 / self.channels as f64;
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }

    #[cfg(test)]
    fn from_samples(samples: Vec<i16>, channels: u16, sample_rate: u32) -> Self {
        Self {
            samples: Arc::new(samples),
            channels,
            sample_rate,
        }
    }
}

/// A playable, seekable view over a [`DecodedAudio`] buffer.
pub struct MemorySource {
    audio: DecodedAudio,
    position: usize,
}

impl MemorySource {
    pub fn new(audio: DecodedAudio) -> Self {
        Self { audio, position: 0 }
    }
}

impl Iterator for MemorySource {
    type Item = i16;

    fn next(&mut self) -> Option<Self::Item> {
        let sample = self.audio.samples.get(self.position).copied()?;
        self.position += 1;
        Some(sample)
    }
}

impl Source for MemorySource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.audio.channels
    }

    fn sample_rate(&self) -> u32 {
        self.audio.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(self.audio.duration())
    }

    fn try_seek(&mut self, pos: Duration) -> Result<(), SeekError> {
        // Align to a whole frame so channels stay interleaved correctly
        let frame = (pos.as_secs_f64() * self.audio.sample_rate as f64) as usize;
        let index = frame * self.audio.channels as usize;
        self.position = index.min(self.audio.samples.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_test_wav(dir: &TempDir, name: &str, secs: u32, sample_rate: u32) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for i in 0..(secs * sample_rate) {
            let value = (i % 128) as i16;
            writer.write_sample(value).unwrap();
            writer.write_sample(-value).unwrap();
        }
        writer.finalize().unwrap();
        path
    }

    #[test]
    fn test_load_wav_duration() {
        let dir = TempDir::new().unwrap();
        let path = write_test_wav(&dir, "tone.wav", 3, 8000);

        let audio = DecodedAudio::load(&path).unwrap();
        assert_eq!(audio.channels(), 2);
        assert_eq!(audio.sample_rate(), 8000);
        assert_eq!(audio.duration(), Duration::from_secs(3));
    }

    #[test]
    fn test_load_unsupported_extension() {
        let result = DecodedAudio::load(Path::new("mix.mp3"));
        assert!(matches!(result, Err(EngineError::Decode(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = DecodedAudio::load(Path::new("/nonexistent/mix.wav"));
        assert!(matches!(result, Err(EngineError::Decode(_))));
    }

    #[test]
    fn test_memory_source_iterates_all_samples() {
        let audio = DecodedAudio::from_samples(vec![1, 2, 3, 4], 2, 4);
        let source = MemorySource::new(audio);
        let collected: Vec<i16> = source.collect();
        assert_eq!(collected, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_memory_source_seek_is_frame_aligned() {
        // 2 channels at 4 Hz: one second is 8 interleaved samples
        let audio = DecodedAudio::from_samples((0..16).collect(), 2, 4);
        let mut source = MemorySource::new(audio);

        source.try_seek(Duration::from_secs(1)).unwrap();
        assert_eq!(source.next(), Some(8));

        // Seeking past the end pins to the end
        source.try_seek(Duration::from_secs(60)).unwrap();
        assert_eq!(source.next(), None);
    }

    #[test]
    fn test_memory_source_seek_back_to_start() {
        let audio = DecodedAudio::from_samples(vec![7, 8, 9, 10], 1, 4);
        let mut source = MemorySource::new(audio);
        source.next();
        source.next();

        source.try_seek(Duration::ZERO).unwrap();
        assert_eq!(source.next(), Some(7));
    }
}
