//! Container decode stage.
//!
//! Uses Symphonia to:
//! - identify the container of an in-memory byte buffer (the container hint comes from the URL suffix)
//! - decode every packet of the default track into interleaved `f32`
//!
//! WAV and OGG decode straight into an [`AudioClip`]. MP3 goes through
//! [`Mp3Transcoder`], which re-encodes the decoded PCM as a WAV buffer with
//! `hound`; the player runs it on a worker thread and decodes the resulting
//! WAV on the tick thread.

use std::io::Cursor;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use music_player_types::ContainerType;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{CodecParameters, DecoderOptions};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::clip::AudioClip;

/// Interleaved PCM produced by a full decode.
#[derive(Clone, Debug)]
pub struct DecodedPcm {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
    pub channels: usize,
}

/// Decodes a complete container buffer into a clip.
pub trait ClipDecoder: Send + Sync {
    fn decode(&self, name: &str, bytes: Vec<u8>) -> Result<AudioClip>;
}

/// Converts a compressed buffer into WAV bytes.
pub trait Transcoder: Send + Sync {
    fn transcode(&self, bytes: Vec<u8>) -> Result<Vec<u8>>;
}

/// Symphonia-backed decoder for one container type.
#[derive(Clone, Copy, Debug)]
pub struct SymphoniaDecoder {
    container: ContainerType,
}

impl SymphoniaDecoder {
    pub fn new(container: ContainerType) -> Self {
        Self { container }
    }
}

impl ClipDecoder for SymphoniaDecoder {
    fn decode(&self, name: &str, bytes: Vec<u8>) -> Result<AudioClip> {
        let pcm = decode_to_pcm(bytes, self.container.extension())?;
        Ok(AudioClip::new(name, pcm.samples, pcm.sample_rate, pcm.channels))
    }
}

/// MP3 → 16-bit PCM WAV transcoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct Mp3Transcoder;

impl Transcoder for Mp3Transcoder {
    fn transcode(&self, bytes: Vec<u8>) -> Result<Vec<u8>> {
        let pcm = decode_to_pcm(bytes, ContainerType::Mp3.extension())?;
        encode_wav(&pcm.samples, pcm.sample_rate, pcm.channels)
    }
}

/// Decoder set used by the player's dispatch, one entry per container.
#[derive(Clone)]
pub struct Decoders {
    pub wav: Arc<dyn ClipDecoder>,
    pub ogg: Arc<dyn ClipDecoder>,
    pub mp3: Arc<dyn Transcoder>,
}

impl Default for Decoders {
    fn default() -> Self {
        Self {
            wav: Arc::new(SymphoniaDecoder::new(ContainerType::Wav)),
            ogg: Arc::new(SymphoniaDecoder::new(ContainerType::Ogg)),
            mp3: Arc::new(Mp3Transcoder),
        }
    }
}

impl Decoders {
    /// Decoder for containers handled on the tick thread; `None` for MP3.
    pub fn direct(&self, container: ContainerType) -> Option<&Arc<dyn ClipDecoder>> {
        match container {
            ContainerType::Wav => Some(&self.wav),
            ContainerType::Ogg => Some(&self.ogg),
            ContainerType::Mp3 => None,
        }
    }
}

/// Probe and fully decode `bytes`, using `ext` as the container hint.
///
/// Undecodable packets are skipped; EOF or a required reset ends the stream.
/// Fails on an empty buffer or when nothing could be decoded.
pub fn decode_to_pcm(bytes: Vec<u8>, ext: &str) -> Result<DecodedPcm> {
    if bytes.is_empty() {
        return Err(anyhow!("empty {ext} buffer"));
    }

    let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes)), Default::default());
    let mut hint = Hint::new();
    hint.with_extension(ext);

    let detected = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("read {ext} container"))?;

    let mut format = detected.format;
    let track = format
        .default_track()
        .ok_or_else(|| anyhow!("No default audio track"))?;
    let track_id = track.id;
    let codec_params: CodecParameters = track.codec_params.clone();
    let sample_rate = codec_params
        .sample_rate
        .ok_or_else(|| anyhow!("Unknown sample rate"))?;

    tracing::debug!(
        codec = codec_name_from_params(&codec_params).unwrap_or("unknown"),
        rate_hz = sample_rate,
        "decoding {ext} buffer"
    );

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .context("create decoder")?;

    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut samples = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                break;
            }
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e).context("read packet"),
        };
        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                tracing::debug!("skipping undecodable packet: {e}");
                continue;
            }
            Err(e) => return Err(e).context("decode packet"),
        };
        if decoded.frames() == 0 {
            continue;
        }

        let spec = *decoded.spec();
        channels = spec.channels.count();
        let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
        sample_buf.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sample_buf.samples());
    }

    if samples.is_empty() || channels == 0 {
        return Err(anyhow!("no audio decoded from {ext} buffer"));
    }

    Ok(DecodedPcm {
        samples,
        sample_rate,
        channels,
    })
}

/// Write interleaved `f32` samples as a 16-bit PCM WAV buffer.
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: usize) -> Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: u16::try_from(channels).context("channel count")?,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut wav = Vec::new();
    {
        let mut writer =
            hound::WavWriter::new(Cursor::new(&mut wav), spec).context("create wav writer")?;
        for &sample in samples {
            writer
                .write_sample(f32_to_i16(sample))
                .context("write wav sample")?;
        }
        writer.finalize().context("finalize wav")?;
    }
    Ok(wav)
}

fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * i16::MAX as f32).round() as i16
}

/// Best-effort codec label used for logging.
fn codec_name_from_params(params: &CodecParameters) -> Option<&'static str> {
    use symphonia::core::codecs::*;
    let name = match params.codec {
        CODEC_TYPE_MP3 => "MP3",
        CODEC_TYPE_VORBIS => "VORBIS",
        CODEC_TYPE_OPUS => "OPUS",
        CODEC_TYPE_FLAC => "FLAC",
        CODEC_TYPE_PCM_U8 => "PCM_U8",
        CODEC_TYPE_PCM_S16LE | CODEC_TYPE_PCM_S16BE => "PCM_S16",
        CODEC_TYPE_PCM_S24LE | CODEC_TYPE_PCM_S24BE => "PCM_S24",
        CODEC_TYPE_PCM_S32LE | CODEC_TYPE_PCM_S32BE => "PCM_S32",
        CODEC_TYPE_PCM_F32LE | CODEC_TYPE_PCM_F32BE => "PCM_F32",
        _ => return None,
    };
    Some(name)
}
