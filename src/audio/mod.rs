//! Audio loading: container dispatch, decoding, mono mixdown and resampling.

pub mod decode;
pub mod resample;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::SampleBuffer;

/// Containers the loader can decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    Flac,
    /// MPEG-4 audio (AAC or ALAC).
    M4a,
    /// Ogg Vorbis.
    Ogg,
}

impl AudioFormat {
    pub const ALL: [AudioFormat; 5] = [
        AudioFormat::Wav,
        AudioFormat::Mp3,
        AudioFormat::Flac,
        AudioFormat::M4a,
        AudioFormat::Ogg,
    ];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" | "wave" => Some(AudioFormat::Wav),
            "mp3" => Some(AudioFormat::Mp3),
            "flac" => Some(AudioFormat::Flac),
            "m4a" | "mp4" | "aac" | "alac" => Some(AudioFormat::M4a),
            "ogg" | "oga" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    /// Identify a container from its leading magic bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WAVE" {
            return Some(AudioFormat::Wav);
        }
        if bytes.starts_with(b"fLaC") {
            return Some(AudioFormat::Flac);
        }
        if bytes.starts_with(b"OggS") {
            return Some(AudioFormat::Ogg);
        }
        if bytes.len() >= 8 && &bytes[4..8] == b"ftyp" {
            return Some(AudioFormat::M4a);
        }
        if bytes.starts_with(b"ID3") {
            return Some(AudioFormat::Mp3);
        }
        // bare MPEG audio frame sync: 11 set bits
        if bytes.len() >= 2 && bytes[0] == 0xFF && bytes[1] & 0xE0 == 0xE0 {
            return Some(AudioFormat::Mp3);
        }
        None
    }

    pub fn extension(self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Ogg => "ogg",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        AudioFormat::from_extension(s.trim_start_matches('.'))
            .ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

/// Raw audio bytes plus an optional declared container.
#[derive(Clone, Copy, Debug)]
pub struct AudioSource<'a> {
    pub bytes: &'a [u8],
    pub hint: Option<AudioFormat>,
}

impl<'a> AudioSource<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, hint: None }
    }

    pub fn with_hint(bytes: &'a [u8], hint: AudioFormat) -> Self {
        Self { bytes, hint: Some(hint) }
    }
}

impl<'a> From<&'a [u8]> for AudioSource<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        AudioSource::new(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for AudioSource<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        AudioSource::new(bytes)
    }
}

/// Decode audio bytes into a mono buffer.
///
/// The declared `hint` wins over sniffing. Multi-channel audio is averaged to
/// mono; `target_rate`, when set, resamples the result.
pub fn load(source: AudioSource<'_>, target_rate: Option<u32>) -> Result<SampleBuffer> {
    let format = source
        .hint
        .or_else(|| AudioFormat::sniff(source.bytes))
        .ok_or_else(|| Error::UnsupportedFormat("unrecognized container".into()))?;

    let decoded = match format {
        AudioFormat::Wav => decode::decode_wav(source.bytes)?,
        AudioFormat::Flac => decode::decode_flac(source.bytes)?,
        AudioFormat::Ogg => decode::decode_ogg(source.bytes)?,
        AudioFormat::Mp3 | AudioFormat::M4a => decode::decode_symphonia(source.bytes, format)?,
    };

    log::debug!(
        "decoded {format}: {} frames, {} channel(s), {} Hz",
        decoded.frames(),
        decoded.channels,
        decoded.sample_rate
    );

    let mono = decoded.mix_to_mono();
    if mono.is_empty() {
        return Err(Error::EmptyAudio);
    }

    match target_rate {
        Some(0) => Err(Error::InvalidParameters("target sample rate must be > 0".into())),
        Some(rate) if rate != decoded.sample_rate => {
            let resampled = resample::resample_channel(&mono, decoded.sample_rate, rate)?;
            SampleBuffer::new(resampled, rate)
        }
        _ => SampleBuffer::new(mono, decoded.sample_rate),
    }
}
