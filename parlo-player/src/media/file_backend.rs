//! Filesystem media backend
//!
//! Resolves locations under a root folder and reads each clip's duration with
//! symphonia. Probing runs on the blocking pool so preload of many segments
//! does not stall the runtime.
//!
//! # Supported Formats
//!
//! Per Cargo.toml symphonia features: MP3, FLAC, AAC, MP4/M4A, Ogg Vorbis, WAV.

use super::{ClockHandle, MediaBackend, MediaError, MediaEvent, MediaHandle, ResourceLocation};
use async_trait::async_trait;
use std::fs::File;
use std::path::{Component, Path, PathBuf};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tokio::sync::mpsc;
use tracing::debug;

pub struct FileMediaBackend {
    root: PathBuf,
    events: mpsc::UnboundedSender<MediaEvent>,
}

impl FileMediaBackend {
    pub fn new(root: impl Into<PathBuf>, events: mpsc::UnboundedSender<MediaEvent>) -> Self {
        Self {
            root: root.into(),
            events,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn full_path(&self, location: &ResourceLocation) -> Result<PathBuf, MediaError> {
        let relative = Path::new(&location.relative_path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(MediaError::NotFound(format!(
                "location outside root: {}",
                location.relative_path
            )));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl MediaBackend for FileMediaBackend {
    async fn open(
        &self,
        location: &ResourceLocation,
        segment: usize,
    ) -> Result<Box<dyn MediaHandle>, MediaError> {
        let path = self.full_path(location)?;
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(MediaError::NotFound(path.display().to_string()));
        }

        let clip_path = path.clone();
        let duration = tokio::task::spawn_blocking(move || read_duration(&clip_path))
            .await
            .map_err(|e| MediaError::Metadata(format!("duration task failed: {}", e)))??;

        debug!(
            "Segment {} metadata ready: {} ({:.3}s)",
            segment,
            path.display(),
            duration
        );
        Ok(Box::new(ClockHandle::new(segment, duration, self.events.clone())))
    }
}

/// Read the duration of an audio file in seconds
///
/// Uses the container's frame count when present, otherwise sums packet
/// durations.
pub fn read_duration(path: &Path) -> Result<f64, MediaError> {
    let file = File::open(path).map_err(|_| MediaError::NotFound(path.display().to_string()))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| MediaError::Unsupported(format!("{}: {}", path.display(), e)))?;
    let mut format = probed.format;

    let track = format
        .default_track()
        .ok_or_else(|| MediaError::Unsupported(format!("{}: no audio track", path.display())))?;
    let track_id = track.id;
    let params = track.codec_params.clone();

    if let (Some(n_frames), Some(sample_rate)) = (params.n_frames, params.sample_rate) {
        if sample_rate > 0 {
            return Ok(n_frames as f64 / sample_rate as f64);
        }
    }

    let time_base = params
        .time_base
        .or_else(|| params.sample_rate.map(|rate| symphonia::core::units::TimeBase::new(1, rate)))
        .ok_or_else(|| MediaError::Metadata(format!("{}: no time base", path.display())))?;

    let mut total_ts: u64 = 0;
    loop {
        match format.next_packet() {
            Ok(packet) if packet.track_id() == track_id => total_ts += packet.dur,
            Ok(_) => {}
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(MediaError::Metadata(format!("{}: {}", path.display(), e))),
        }
    }

    let time = time_base.calc_time(total_ts);
    Ok(time.seconds as f64 + time.frac)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::HandleStatus;

    fn write_wav(path: &Path, seconds: f64) {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for _ in 0..(seconds * 8000.0) as usize {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn location(relative: &str) -> ResourceLocation {
        ResourceLocation {
            relative_path: relative.to_string(),
            format: "wav".to_string(),
            language: "es".to_string(),
        }
    }

    #[test]
    fn test_read_wav_duration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.wav");
        write_wav(&path, 1.5);

        let duration = read_duration(&path).unwrap();
        assert!((duration - 1.5).abs() < 1e-3, "got {}", duration);
    }

    #[test]
    fn test_garbage_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip.mp3");
        std::fs::write(&path, b"definitely not audio").unwrap();
        assert!(matches!(read_duration(&path), Err(MediaError::Unsupported(_))));
    }

    #[tokio::test]
    async fn test_open_existing_clip() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("a")).unwrap();
        write_wav(&dir.path().join("a/000.wav"), 0.25);

        let (tx, _rx) = mpsc::unbounded_channel();
        let backend = FileMediaBackend::new(dir.path(), tx);
        let handle = backend.open(&location("a/000.wav"), 0).await.unwrap();

        assert!((handle.duration_seconds().unwrap() - 0.25).abs() < 1e-3);
        assert_eq!(handle.status(), HandleStatus::Idle);
    }

    #[tokio::test]
    async fn test_open_missing_clip() {
        let dir = tempfile::tempdir().unwrap();
        let (tx, _rx) = mpsc::unbounded_channel();
        let backend = FileMediaBackend::new(dir.path(), tx);
        assert!(matches!(
            backend.open(&location("a/000.wav"), 0).await,
            Err(MediaError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_open_rejects_parent_dir() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let backend = FileMediaBackend::new("/srv/parlo", tx);
        assert!(matches!(
            backend.open(&location("../secret.wav"), 0).await,
            Err(MediaError::NotFound(_))
        ));
    }
}
