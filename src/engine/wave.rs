//! Fixed-layout WAV container codec
//!
//! Reads and writes the canonical 44-byte RIFF/WAVE header followed by
//! interleaved little-endian signed PCM. The header is kept verbatim so that
//! a rendered output can inherit its source's format bytes; only the size,
//! sample-rate and byte-rate fields are ever rewritten.
//!
//! | Offset | Size | Field |
//! |---|---|---|
//! | 4 | 4 | chunk size (file size - 8) |
//! | 22 | 2 | channel count |
//! | 24 | 4 | sample rate |
//! | 28 | 4 | byte rate |
//! | 34 | 2 | bits per sample |
//! | 40 | 4 | data size |

use std::fs;
use std::path::Path;

use log::{debug, info};

use crate::engine::segment::{extract, play_time, Segment};
use crate::error::{Result, SkipjackError};
use crate::numeric::{max_value_for_bytes, round_to_i64};

/// Header length in bytes
pub const HEADER_LEN: usize = 44;

const CHUNK_SIZE_OFFSET: usize = 4;
const CHANNELS_OFFSET: usize = 22;
const SAMPLE_RATE_OFFSET: usize = 24;
const BYTE_RATE_OFFSET: usize = 28;
const BLOCK_ALIGN_OFFSET: usize = 32;
const BITS_OFFSET: usize = 34;
const DATA_SIZE_OFFSET: usize = 40;

// ============================================================================
// Byte helpers
// ============================================================================

/// Read an unsigned little-endian integer. Bytes past the end read as 0.
fn read_uint_le(bytes: &[u8], pos: usize, width: usize) -> u64 {
    (0..width).rev().fold(0u64, |acc, i| {
        (acc << 8) | u64::from(bytes.get(pos + i).copied().unwrap_or(0))
    })
}

/// Read a signed two's-complement little-endian integer of 1 to 4 bytes.
fn read_int_le(bytes: &[u8], pos: usize, width: usize) -> i32 {
    let raw = read_uint_le(bytes, pos, width) as i64;
    let max = max_value_for_bytes(width);
    let value = if raw >= max / 2 { raw - max } else { raw };
    value as i32
}

/// Write a little-endian integer, clamping to the signed range of `width`
/// bytes first. Bytes past the end of `bytes` are dropped.
fn write_int_le(bytes: &mut [u8], value: i64, pos: usize, width: usize) {
    let max = max_value_for_bytes(width);
    let clamped = value.clamp(-max / 2, max / 2 - 1);
    let mut raw = if clamped < 0 { clamped + max } else { clamped } as u64;
    for i in 0..width {
        if let Some(byte) = bytes.get_mut(pos + i) {
            *byte = (raw & 0xff) as u8;
        }
        raw >>= 8;
    }
}

/// Write an unsigned little-endian field without clamping.
fn write_uint_le(bytes: &mut [u8], value: u64, pos: usize, width: usize) {
    let mut raw = value;
    for i in 0..width {
        if let Some(byte) = bytes.get_mut(pos + i) {
            *byte = (raw & 0xff) as u8;
        }
        raw >>= 8;
    }
}

// ============================================================================
// Header
// ============================================================================

/// The raw 44-byte container header with typed accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaveHeader {
    raw: [u8; HEADER_LEN],
}

impl WaveHeader {
    /// Take the first 44 bytes of `bytes` as a header.
    ///
    /// # Errors
    /// `HeaderTooShort` when fewer than 44 bytes are available.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(SkipjackError::HeaderTooShort { len: bytes.len() });
        }
        let mut raw = [0u8; HEADER_LEN];
        raw.copy_from_slice(&bytes[..HEADER_LEN]);
        Ok(Self { raw })
    }

    /// Build a canonical PCM header (sizes describe an empty payload).
    pub fn pcm(channels: u16, sample_rate: u32, bits_per_sample: u16) -> Self {
        let mut raw = [0u8; HEADER_LEN];
        raw[0..4].copy_from_slice(b"RIFF");
        raw[8..12].copy_from_slice(b"WAVE");
        raw[12..16].copy_from_slice(b"fmt ");
        write_uint_le(&mut raw, 16, 16, 4);
        write_uint_le(&mut raw, 1, 20, 2);
        write_uint_le(&mut raw, u64::from(channels), CHANNELS_OFFSET, 2);
        write_uint_le(&mut raw, u64::from(bits_per_sample), BITS_OFFSET, 2);
        let block_align = u64::from(channels) * u64::from(bits_per_sample / 8);
        write_uint_le(&mut raw, block_align, BLOCK_ALIGN_OFFSET, 2);
        raw[36..40].copy_from_slice(b"data");

        let mut header = Self { raw };
        header.set_sample_rate(sample_rate);
        header.set_data_size(0);
        header
    }

    /// Raw header bytes
    pub fn as_bytes(&self) -> &[u8; HEADER_LEN] {
        &self.raw
    }

    /// Channel count as stored (may be 0 in malformed files)
    pub fn channels(&self) -> u16 {
        read_uint_le(&self.raw, CHANNELS_OFFSET, 2) as u16
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        read_uint_le(&self.raw, SAMPLE_RATE_OFFSET, 4) as u32
    }

    /// Byte rate (`rate * channels * bytes_per_sample`)
    pub fn byte_rate(&self) -> u32 {
        read_uint_le(&self.raw, BYTE_RATE_OFFSET, 4) as u32
    }

    /// Bytes per interleaved frame (`channels * bytes_per_sample`)
    pub fn block_align(&self) -> u16 {
        read_uint_le(&self.raw, BLOCK_ALIGN_OFFSET, 2) as u16
    }

    /// Bits per sample
    pub fn bits_per_sample(&self) -> u16 {
        read_uint_le(&self.raw, BITS_OFFSET, 2) as u16
    }

    /// Bytes per sample (bits halved down to whole bytes)
    pub fn bytes_per_sample(&self) -> usize {
        usize::from(self.bits_per_sample() / 8)
    }

    /// Payload size in bytes
    pub fn data_size(&self) -> u32 {
        read_uint_le(&self.raw, DATA_SIZE_OFFSET, 4) as u32
    }

    /// Overall RIFF chunk size
    pub fn chunk_size(&self) -> u32 {
        read_uint_le(&self.raw, CHUNK_SIZE_OFFSET, 4) as u32
    }

    /// Update the sample rate and the byte rate derived from it.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        let byte_rate = u64::from(sample_rate)
            * u64::from(self.channels())
            * self.bytes_per_sample() as u64;
        write_uint_le(&mut self.raw, u64::from(sample_rate), SAMPLE_RATE_OFFSET, 4);
        write_uint_le(&mut self.raw, byte_rate, BYTE_RATE_OFFSET, 4);
    }

    /// A stored channel count of 0 is read as mono. Write that back along
    /// with the block align and byte rate derived from it.
    fn normalize_channels(&mut self) {
        if self.channels() != 0 {
            return;
        }
        debug!("Header declares 0 channels; rewriting as mono");
        let block_align = self.bytes_per_sample() as u64;
        let sample_rate = self.sample_rate();
        write_uint_le(&mut self.raw, 1, CHANNELS_OFFSET, 2);
        write_uint_le(&mut self.raw, block_align, BLOCK_ALIGN_OFFSET, 2);
        self.set_sample_rate(sample_rate);
    }

    /// Rewrite the data-chunk and RIFF chunk size fields for a payload.
    pub fn set_data_size(&mut self, data_size: u64) {
        write_uint_le(&mut self.raw, data_size, DATA_SIZE_OFFSET, 4);
        write_uint_le(&mut self.raw, data_size + 36, CHUNK_SIZE_OFFSET, 4);
    }
}

// ============================================================================
// Waveform
// ============================================================================

/// A decoded container: header plus per-channel integer samples.
///
/// Channel count and bytes-per-sample come from the header and never change
/// for the lifetime of the value; the size fields are re-derived whenever
/// the samples change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Waveform {
    header: WaveHeader,
    data: Vec<Vec<i32>>,
}

impl Waveform {
    /// Build a waveform from a header and samples.
    ///
    /// # Errors
    /// `ChannelMismatch` when `data` does not have the header's channel
    /// count, `UnsupportedLayout` when the header's sample width is not 1-4
    /// bytes.
    pub fn new(mut header: WaveHeader, data: Vec<Vec<i32>>) -> Result<Self> {
        validate_width(&header)?;
        header.normalize_channels();
        let mut wave = Self {
            header,
            data: Vec::new(),
        };
        wave.set_data(data)?;
        Ok(wave)
    }

    /// Decode a full container image.
    ///
    /// # Errors
    /// * `HeaderTooShort` - fewer than 44 bytes
    /// * `UnsupportedLayout` - sample width outside 1-4 bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut header = WaveHeader::parse(bytes)?;
        let bytes_per_sample = validate_width(&header)?;
        header.normalize_channels();
        let channels = usize::from(header.channels());

        let payload = &bytes[HEADER_LEN..];
        let declared = header.data_size() as usize;
        let payload = if declared > 0 && declared < payload.len() {
            &payload[..declared]
        } else {
            payload
        };

        let frame_bytes = bytes_per_sample * channels;
        let frames = payload.len() / frame_bytes;
        let mut data = vec![Vec::with_capacity(frames); channels];
        for frame in 0..frames {
            for (ch, channel) in data.iter_mut().enumerate() {
                let pos = frame * frame_bytes + ch * bytes_per_sample;
                channel.push(read_int_le(payload, pos, bytes_per_sample));
            }
        }

        debug!(
            "Decoded {} channel(s), {} frames at {} Hz, {} bytes/sample",
            channels,
            frames,
            header.sample_rate(),
            bytes_per_sample
        );

        let mut wave = Self { header, data };
        wave.refresh_sizes();
        Ok(wave)
    }

    /// Encode to a full container image, clamping each sample to the
    /// representable range of the sample width.
    pub fn encode(&self) -> Vec<u8> {
        let bytes_per_sample = self.bytes_per_sample();
        let channels = self.data.len();
        let frames = self.len();
        let mut payload = vec![0u8; frames * channels * bytes_per_sample];

        for frame in 0..frames {
            for (ch, channel) in self.data.iter().enumerate() {
                let pos = (frame * channels + ch) * bytes_per_sample;
                write_int_le(&mut payload, i64::from(channel[frame]), pos, bytes_per_sample);
            }
        }

        let mut header = self.header.clone();
        header.set_data_size(payload.len() as u64);

        let mut bytes = Vec::with_capacity(HEADER_LEN + payload.len());
        bytes.extend_from_slice(header.as_bytes());
        bytes.extend_from_slice(&payload);
        bytes
    }

    /// Read and decode a container from disk.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SkipjackError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        info!("Opening WAV file \"{}\"", path.display());
        let bytes = fs::read(path).map_err(|e| SkipjackError::FileReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::decode(&bytes)
    }

    /// Encode and write the container to disk.
    pub fn save(&self, path: &Path) -> Result<()> {
        info!("Saving WAV file \"{}\"", path.display());
        fs::write(path, self.encode()).map_err(|e| SkipjackError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// The header
    pub fn header(&self) -> &WaveHeader {
        &self.header
    }

    /// Per-channel samples
    pub fn data(&self) -> &[Vec<i32>] {
        &self.data
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.data.len()
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate()
    }

    /// Bytes per sample
    pub fn bytes_per_sample(&self) -> usize {
        self.header.bytes_per_sample()
    }

    /// Samples per channel
    pub fn len(&self) -> usize {
        self.data.first().map_or(0, Vec::len)
    }

    /// True when the waveform holds no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Play time in seconds, truncated to milliseconds
    pub fn play_time(&self) -> f64 {
        play_time(self.len(), self.sample_rate())
    }

    /// Change the sample rate (and the derived byte rate).
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        self.header.set_sample_rate(sample_rate);
    }

    /// Replace the samples, keeping the header's channel layout.
    ///
    /// # Errors
    /// `ChannelMismatch` when `data` has a different channel count than the
    /// header declares.
    pub fn set_data(&mut self, data: Vec<Vec<i32>>) -> Result<()> {
        let expected = usize::from(self.header.channels()).max(1);
        if data.len() != expected {
            return Err(SkipjackError::ChannelMismatch {
                expected,
                found: data.len(),
            });
        }
        self.data = data;
        self.refresh_sizes();
        Ok(())
    }

    /// Replace the samples with a rendered segment, rounding to integers.
    pub fn set_segment(&mut self, segment: &Segment) -> Result<()> {
        let data = segment
            .samples
            .iter()
            .map(|channel| {
                channel
                    .iter()
                    .map(|&s| round_to_i64(s).clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32)
                    .collect()
            })
            .collect();
        self.set_data(data)
    }

    /// An empty waveform sharing this waveform's format.
    pub fn empty_like(&self) -> Self {
        let mut wave = Self {
            header: self.header.clone(),
            data: vec![Vec::new(); self.num_channels()],
        };
        wave.refresh_sizes();
        wave
    }

    /// The whole waveform as a float segment.
    pub fn to_segment(&self) -> Segment {
        Segment::new(
            self.data
                .iter()
                .map(|channel| channel.iter().map(|&s| f64::from(s)).collect())
                .collect(),
        )
    }

    /// Extract a window of samples (see [`extract`]).
    pub fn get_segment(&self, start: f64, length: f64) -> Segment {
        extract(&self.to_segment(), start, length, 1.0)
    }

    fn refresh_sizes(&mut self) {
        let total: usize = self.data.iter().map(Vec::len).sum();
        self.header
            .set_data_size((total * self.header.bytes_per_sample()) as u64);
    }
}

fn validate_width(header: &WaveHeader) -> Result<usize> {
    let bytes_per_sample = header.bytes_per_sample();
    if !(1..=4).contains(&bytes_per_sample) {
        return Err(SkipjackError::UnsupportedLayout {
            reason: format!(
                "{} bits per sample (expected 8, 16, 24 or 32)",
                header.bits_per_sample()
            ),
        });
    }
    Ok(bytes_per_sample)
}
