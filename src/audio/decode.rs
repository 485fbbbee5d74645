//! Per-container decoders. Each returns interleaved `f32` PCM in [-1, 1].

use std::io::Cursor;

use symphonia::core::audio::SampleBuffer as PcmBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::AudioFormat;
use crate::error::{Error, Result};

/// Interleaved PCM as it came out of a codec.
#[derive(Clone, Debug)]
pub struct DecodedAudio {
    pub interleaved: Vec<f32>,
    pub channels: usize,
    pub sample_rate: u32,
}

impl DecodedAudio {
    pub fn frames(&self) -> usize {
        self.interleaved.len() / self.channels.max(1)
    }

    /// Average every frame's channels into one sample.
    pub fn mix_to_mono(&self) -> Vec<f32> {
        if self.channels <= 1 {
            return self.interleaved.clone();
        }
        let scale = 1.0 / self.channels as f32;
        self.interleaved
            .chunks_exact(self.channels)
            .map(|frame| frame.iter().sum::<f32>() * scale)
            .collect()
    }
}

fn unsupported(format: AudioFormat, e: impl std::fmt::Display) -> Error {
    Error::UnsupportedFormat(format!("{format}: {e}"))
}

/// Integer full-scale value for a bit depth, as used to normalize PCM.
fn int_scale(bits: u32) -> f32 {
    (1i64 << (bits.clamp(1, 32) - 1)) as f32
}

pub fn decode_wav(bytes: &[u8]) -> Result<DecodedAudio> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| unsupported(AudioFormat::Wav, e))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| unsupported(AudioFormat::Wav, e))?,
        hound::SampleFormat::Int => {
            let max = int_scale(spec.bits_per_sample as u32);
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max))
                .collect::<std::result::Result<_, _>>()
                .map_err(|e| unsupported(AudioFormat::Wav, e))?
        }
    };

    Ok(DecodedAudio {
        interleaved,
        channels: spec.channels as usize,
        sample_rate: spec.sample_rate,
    })
}

pub fn decode_flac(bytes: &[u8]) -> Result<DecodedAudio> {
    let mut reader = claxon::FlacReader::new(Cursor::new(bytes))
        .map_err(|e| unsupported(AudioFormat::Flac, e))?;
    let info = reader.streaminfo();
    let max = int_scale(info.bits_per_sample);

    let interleaved: Vec<f32> = reader
        .samples()
        .map(|s| s.map(|v| v as f32 / max))
        .collect::<std::result::Result<_, _>>()
        .map_err(|e| unsupported(AudioFormat::Flac, e))?;

    Ok(DecodedAudio {
        interleaved,
        channels: info.channels as usize,
        sample_rate: info.sample_rate,
    })
}

pub fn decode_ogg(bytes: &[u8]) -> Result<DecodedAudio> {
    let mut reader = lewton::inside_ogg::OggStreamReader::new(Cursor::new(bytes))
        .map_err(|e| unsupported(AudioFormat::Ogg, e))?;
    let channels = reader.ident_hdr.audio_channels as usize;
    let sample_rate = reader.ident_hdr.audio_sample_rate;

    let mut interleaved = Vec::new();
    while let Some(packet) = reader
        .read_dec_packet_itl()
        .map_err(|e| unsupported(AudioFormat::Ogg, e))?
    {
        interleaved.extend(packet.into_iter().map(|s| s as f32 / 32768.0));
    }

    Ok(DecodedAudio {
        interleaved,
        channels,
        sample_rate,
    })
}

/// MP3 and MPEG-4 (AAC/ALAC) through Symphonia.
pub fn decode_symphonia(bytes: &[u8], format: AudioFormat) -> Result<DecodedAudio> {
    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

    let mut hint = Hint::new();
    hint.with_extension(format.extension());

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| unsupported(format, e))?;
    let mut reader = probed.format;

    let track = reader
        .default_track()
        .ok_or_else(|| unsupported(format, "no audio track found"))?
        .clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&track.codec_params, &DecoderOptions::default())
        .map_err(|e| unsupported(format, e))?;

    // Channel count and rate may be unknown upfront (e.g. AAC in MP4);
    // the first decoded packet settles them.
    let mut channels = track.codec_params.channels.map(|c| c.count());
    let mut sample_rate = track.codec_params.sample_rate;
    let mut interleaved = Vec::new();

    loop {
        let packet = match reader.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(unsupported(format, e)),
        };

        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(msg)) => {
                log::warn!("skipping corrupt {format} packet: {msg}");
                continue;
            }
            Err(e) => return Err(unsupported(format, e)),
        };

        let spec = *decoded.spec();
        channels.get_or_insert(spec.channels.count());
        sample_rate.get_or_insert(spec.rate);

        let mut pcm = PcmBuffer::<f32>::new(decoded.capacity() as u64, spec);
        pcm.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(pcm.samples());
    }

    let sample_rate = sample_rate.ok_or_else(|| unsupported(format, "unknown sample rate"))?;

    Ok(DecodedAudio {
        interleaved,
        channels: channels.unwrap_or(1),
        sample_rate,
    })
}
