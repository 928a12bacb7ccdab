//! Audio file loading
//!
//! Audio is described by an [`AudioFile`]: a resource name, an optional
//! on-disk location, and playback settings. Decoding goes through
//! symphonia; preloaded clips are decoded to interleaved `f32` samples,
//! streamed clips are only probed.

use crate::error::{LoadError, Result};
use crate::loader::ResourceLoader;
use crate::runtime::run_blocking;
use crate::source::{AssetSource, Resolved};
use crate::{AssetKind, Bundle};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// How a clip is placed in the listener's sound field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioInputMode {
    /// Positioned at the emitting entity
    #[default]
    Spatial,
    /// Played directly, ignoring position
    NonSpatial,
    /// Surrounds the listener with a fixed orientation
    Ambient,
}

/// When the clip's samples are decoded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadingStrategy {
    /// Decode everything up front
    #[default]
    Preload,
    /// Decode on demand at playback time
    Stream,
}

/// Description of one audio clip to load
#[derive(Debug, Clone, PartialEq)]
pub struct AudioFile {
    pub resource_name: String,
    /// Load from this file instead of looking the name up in a bundle
    pub url: Option<PathBuf>,
    pub input_mode: AudioInputMode,
    pub loading_strategy: LoadingStrategy,
    pub should_loop: bool,
}

impl AudioFile {
    /// A bundled clip with default playback settings
    pub fn new(resource_name: impl Into<String>, should_loop: bool) -> Self {
        Self {
            resource_name: resource_name.into(),
            url: None,
            input_mode: AudioInputMode::default(),
            loading_strategy: LoadingStrategy::default(),
            should_loop,
        }
    }

    /// Load from a file on disk
    pub fn with_url(mut self, url: impl Into<PathBuf>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_input_mode(mut self, mode: AudioInputMode) -> Self {
        self.input_mode = mode;
        self
    }

    pub fn with_loading_strategy(mut self, strategy: LoadingStrategy) -> Self {
        self.loading_strategy = strategy;
        self
    }

    /// Where the clip's bytes come from
    ///
    /// A set `url` wins; otherwise the name is looked up in `bundle`.
    pub fn source(&self, bundle: Option<&Bundle>) -> AssetSource {
        match &self.url {
            Some(url) => AssetSource::path_named(url.clone(), Some(self.resource_name.clone())),
            None => AssetSource::Named {
                name: self.resource_name.clone(),
                bundle: bundle.cloned(),
            },
        }
    }
}

/// Sample data of a loaded clip
#[derive(Debug, Clone)]
pub enum AudioData {
    /// Interleaved samples in `[-1, 1]`
    Preloaded(Arc<[f32]>),
    /// Decoded later from this file
    Streamed(PathBuf),
}

/// A loaded audio clip
#[derive(Debug, Clone)]
pub struct AudioFileResource {
    pub name: String,
    pub input_mode: AudioInputMode,
    pub should_loop: bool,
    pub sample_rate: u32,
    pub channels: u16,
    /// Frame count, when the container reports it or the clip was preloaded
    pub frames: Option<u64>,
    pub data: AudioData,
}

impl AudioFileResource {
    /// Playback length, when the frame count is known
    pub fn duration(&self) -> Option<Duration> {
        self.frames
            .map(|frames| Duration::from_secs_f64(frames as f64 / self.sample_rate as f64))
    }

    /// The effective loading strategy
    pub fn loading_strategy(&self) -> LoadingStrategy {
        match self.data {
            AudioData::Preloaded(_) => LoadingStrategy::Preload,
            AudioData::Streamed(_) => LoadingStrategy::Stream,
        }
    }
}

/// Loads audio clips with symphonia
#[derive(Debug, Clone)]
pub struct AudioLoader {
    main: Bundle,
    extensions: Vec<String>,
    input_mode: AudioInputMode,
    loading_strategy: LoadingStrategy,
}

impl AudioLoader {
    /// Create a loader that resolves names in `main`
    pub fn new(
        main: Bundle,
        extensions: Vec<String>,
        input_mode: AudioInputMode,
        loading_strategy: LoadingStrategy,
    ) -> Self {
        Self {
            main,
            extensions,
            input_mode,
            loading_strategy,
        }
    }

    /// Load the clip `file` describes, looking names up in `bundle` or the main bundle
    pub async fn load_file(
        &self,
        file: &AudioFile,
        bundle: Option<&Bundle>,
    ) -> Result<AudioFileResource> {
        let resolved = file.source(bundle).resolve(&self.main, &self.extensions)?;
        let bytes = resolved.read().await?;
        let file = file.clone();
        run_blocking(move || AudioLoader::decode(bytes, &resolved, &file)).await
    }

    /// Decode `bytes` according to `file`'s settings
    ///
    /// Streaming needs a file to come back to, so memory sources are always
    /// preloaded.
    pub fn decode(bytes: Arc<[u8]>, resolved: &Resolved, file: &AudioFile) -> Result<AudioFileResource> {
        let mut hint = Hint::new();
        if let Some(ext) = resolved.extension() {
            hint.with_extension(&ext);
        }

        let mss = MediaSourceStream::new(Box::new(std::io::Cursor::new(bytes)), Default::default());
        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| LoadError::Audio(format!("Failed to probe audio format: {e}")))?;
        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| LoadError::Audio("No default audio track found".to_string()))?;
        let track_id = track.id;
        let codec_params = track.codec_params.clone();

        let sample_rate = codec_params
            .sample_rate
            .ok_or_else(|| LoadError::Audio("Sample rate not found".to_string()))?;
        let channels = codec_params
            .channels
            .ok_or_else(|| LoadError::Audio("Channel count not found".to_string()))?
            .count() as u16;

        let mut resource = AudioFileResource {
            name: file.resource_name.clone(),
            input_mode: file.input_mode,
            should_loop: file.should_loop,
            sample_rate,
            channels,
            frames: codec_params.n_frames,
            data: AudioData::Preloaded(Arc::from(Vec::new())),
        };

        if let (LoadingStrategy::Stream, Some(path)) = (file.loading_strategy, resolved.path()) {
            resource.data = AudioData::Streamed(path.to_path_buf());
            return Ok(resource);
        }

        let mut decoder = symphonia::default::get_codecs()
            .make(&codec_params, &DecoderOptions::default())
            .map_err(|e| LoadError::Audio(format!("Failed to create decoder: {e}")))?;

        let mut samples: Vec<f32> = Vec::new();
        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(_)) => break, // end-of-file
                Err(e) => return Err(e.into()),
            };
            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let mut buffer =
                        SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
                Err(SymphoniaError::IoError(_)) => break,
                Err(SymphoniaError::DecodeError(msg)) => {
                    log::warn!("Skipping corrupt audio packet in '{}': {msg}", file.resource_name);
                }
                Err(e) => return Err(e.into()),
            }
        }

        log::debug!(
            "Decoded '{}': {} Hz, {} channels, {} samples",
            file.resource_name,
            sample_rate,
            channels,
            samples.len()
        );
        resource.frames = Some((samples.len() / channels.max(1) as usize) as u64);
        resource.data = AudioData::Preloaded(Arc::from(samples));
        Ok(resource)
    }
}

#[async_trait]
impl ResourceLoader for AudioLoader {
    type Output = AudioFileResource;

    fn kind(&self) -> AssetKind {
        AssetKind::Audio
    }

    async fn load(&self, source: &AssetSource) -> Result<AudioFileResource> {
        let resolved = source.resolve(&self.main, &self.extensions)?;
        let bytes = resolved.read().await?;
        let file = AudioFile {
            resource_name: source.resource_name().unwrap_or_default(),
            url: resolved.path().map(|p| p.to_path_buf()),
            input_mode: self.input_mode,
            loading_strategy: self.loading_strategy,
            should_loop: false,
        };
        run_blocking(move || AudioLoader::decode(bytes, &resolved, &file)).await
    }
}

/// Encode interleaved 16-bit PCM as a WAV file
#[cfg(test)]
pub(crate) fn wav_bytes(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let block_align = channels * 2;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVEfmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes());
    out.extend_from_slice(&channels.to_le_bytes());
    out.extend_from_slice(&sample_rate.to_le_bytes());
    out.extend_from_slice(&(sample_rate * block_align as u32).to_le_bytes());
    out.extend_from_slice(&block_align.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }
    out
}
