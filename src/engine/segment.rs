//! Segment Operations
//!
//! A `Segment` is a transient multi-channel sample buffer. Every operation
//! here preserves channel count. Windows that run off either end of a track
//! are normal during rendering, so range problems are padded with silence or
//! truncated; only a channel-count mismatch is an error.

use log::error;

use crate::error::{Result, SkipjackError};
use crate::numeric::{round_to_i64, truncate};

// ============================================================================
// Segment
// ============================================================================

/// Non-interleaved sample buffer: outer Vec is channels, inner Vec is samples.
///
/// Samples are kept as `f64` in the container's integer scale so that
/// volume, averaging and crossfades stay exact until the final encode.
///
/// # Example
/// ```
/// use skipjacker::engine::Segment;
///
/// let seg = Segment::silent(0.5, 44100, 2);
/// assert_eq!(seg.num_channels(), 2);
/// assert_eq!(seg.len(), 22050);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Segment {
    /// Sample data: outer Vec is channels, inner Vec is samples
    pub samples: Vec<Vec<f64>>,
}

impl Segment {
    /// Wrap per-channel sample vectors.
    pub fn new(samples: Vec<Vec<f64>>) -> Self {
        Self { samples }
    }

    /// A segment with `num_channels` channels and no samples.
    pub fn empty(num_channels: usize) -> Self {
        Self {
            samples: vec![Vec::new(); num_channels],
        }
    }

    /// A silent segment `duration_secs` long.
    pub fn silent(duration_secs: f64, sample_rate: u32, num_channels: usize) -> Self {
        let num_samples = round_to_i64(duration_secs * f64::from(sample_rate)).max(0) as usize;
        Self {
            samples: vec![vec![0.0; num_samples]; num_channels],
        }
    }

    /// Number of channels
    pub fn num_channels(&self) -> usize {
        self.samples.len()
    }

    /// Number of samples per channel (length of the first channel)
    pub fn len(&self) -> usize {
        self.samples.first().map_or(0, Vec::len)
    }

    /// True when there are no samples
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Immutable view of one channel
    pub fn channel(&self, index: usize) -> &[f64] {
        &self.samples[index]
    }

    /// Mutable view of one channel
    pub fn channel_mut(&mut self, index: usize) -> &mut [f64] {
        &mut self.samples[index]
    }

    /// Play time in seconds at `sample_rate`, truncated to milliseconds.
    pub fn play_time(&self, sample_rate: u32) -> f64 {
        play_time(self.len(), sample_rate)
    }
}

/// Play time of `num_samples` at `sample_rate`, truncated to milliseconds.
pub fn play_time(num_samples: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    truncate(num_samples as f64 / f64::from(sample_rate), 1000.0)
}

// ============================================================================
// Extraction and reversal
// ============================================================================

/// Copy a window out of `seg`, scaled by `volume`.
///
/// A negative `start` is absorbed into `length` (the window keeps its end
/// and starts at 0). A window that starts inside the data but runs past the
/// end is shrunk to fit; a window that starts beyond the data is silence.
pub fn extract(seg: &Segment, start: f64, length: f64, volume: f64) -> Segment {
    let (mut start, mut length) = (start, length);
    if start < 0.0 {
        length += start;
        start = 0.0;
    }
    let start = round_to_i64(start);
    let mut length = round_to_i64(length);

    let available = seg.len() as i64;
    if start + length > available && start < available {
        length = available - start;
    }
    let start = start as usize;
    let length = length.max(0) as usize;

    let samples = seg
        .samples
        .iter()
        .map(|channel| {
            (start..start + length)
                .map(|i| {
                    channel
                        .get(i)
                        .copied()
                        .filter(|s| s.is_finite())
                        .unwrap_or(0.0)
                        * volume
                })
                .collect()
        })
        .collect();

    Segment { samples }
}

/// Reverse every channel.
pub fn reverse(seg: &Segment) -> Segment {
    Segment {
        samples: seg
            .samples
            .iter()
            .map(|channel| channel.iter().rev().copied().collect())
            .collect(),
    }
}

// ============================================================================
// Time scaling
// ============================================================================

/// Play `seg` at `1/factor` of its duration (`factor > 1` compresses).
///
/// A running fractional counter decides how many output samples each input
/// sample yields, so non-integer factors work. With `smooth` each output
/// sample is the mean of the input samples it replaces (box filter);
/// without it the last input sample is repeated or skipped.
///
/// Non-positive or non-finite factors leave the segment unchanged.
pub fn scale_time(seg: &Segment, factor: f64, smooth: bool) -> Segment {
    if !(factor.is_finite() && factor > 0.0) {
        log::warn!("scale_time() given invalid factor {}; leaving segment unscaled", factor);
        return seg.clone();
    }

    let samples = seg
        .samples
        .iter()
        .map(|channel| {
            let mut out = Vec::with_capacity((channel.len() as f64 / factor).ceil() as usize + 1);
            let mut counter = factor;
            let mut total = 0.0;
            let mut count = 0usize;

            for &sample in channel {
                counter -= 1.0;
                if smooth {
                    total += sample;
                    count += 1;
                    if counter <= 0.0 {
                        let mean = total / count as f64;
                        while counter <= 0.0 {
                            out.push(mean);
                            counter += factor;
                        }
                        total = 0.0;
                        count = 0;
                    }
                } else {
                    while counter <= 0.0 {
                        out.push(sample);
                        counter += factor;
                    }
                }
            }
            out
        })
        .collect();

    Segment { samples }
}

// ============================================================================
// Joining
// ============================================================================

fn check_channels(expected: &Segment, found: &Segment, op: &str) -> Result<()> {
    if expected.num_channels() != found.num_channels() {
        error!(
            "{}() was passed segments with different channel counts ({} vs {})",
            op,
            expected.num_channels(),
            found.num_channels()
        );
        return Err(SkipjackError::ChannelMismatch {
            expected: expected.num_channels(),
            found: found.num_channels(),
        });
    }
    Ok(())
}

/// Per-channel concatenation of `a` then `b`.
///
/// # Errors
/// `ChannelMismatch` when the channel counts differ.
pub fn concat(a: &Segment, b: &Segment) -> Result<Segment> {
    check_channels(a, b, "concat")?;
    let samples = a
        .samples
        .iter()
        .zip(&b.samples)
        .map(|(left, right)| {
            let mut joined = Vec::with_capacity(left.len() + right.len());
            joined.extend_from_slice(left);
            joined.extend_from_slice(right);
            joined
        })
        .collect();
    Ok(Segment { samples })
}

/// Append `src` onto `dest` in place, returning the seam position.
///
/// With `sew_radius` the seam is smoothed with [`sew`].
pub fn append(dest: &mut Segment, src: &Segment, sew_radius: Option<usize>) -> Result<usize> {
    check_channels(dest, src, "append")?;
    let seam = dest.len();
    for (channel, tail) in dest.samples.iter_mut().zip(&src.samples) {
        channel.extend_from_slice(tail);
    }
    if let Some(radius) = sew_radius {
        sew(dest, seam, radius);
    }
    Ok(seam)
}

/// Smooth a hard join at `seam` with a triangular weight ramp.
///
/// The radius is clamped so it never reaches either end of the data. Each
/// sample within the radius is pulled toward the weighted average of the
/// region, most strongly at the seam.
pub fn sew(seg: &mut Segment, seam: usize, radius: usize) {
    let len = seg.len() as i64;
    let seam_pos = seam as i64;
    let mut radius = radius as i64;
    if radius >= seam_pos {
        radius = seam_pos - 1;
    }
    if radius >= len - seam_pos {
        radius = len - seam_pos - 1;
    }
    if radius <= 0 {
        return;
    }
    let radius = radius as usize;
    let weight_at = |i: usize| (radius - i) as f64 / radius as f64;

    for channel in &mut seg.samples {
        let mut total = 0.0;
        let mut total_weight = 0.0;
        for i in 0..radius {
            let weight = weight_at(i);
            total += channel[seam + i] * weight;
            total += channel[seam - i - 1] * weight;
            total_weight += weight * 2.0;
        }
        let average = total / total_weight;

        for i in 0..radius {
            let weight = weight_at(i);
            channel[seam + i] = channel[seam + i] * (1.0 - weight) + average * weight;
            channel[seam - i - 1] = channel[seam - i - 1] * (1.0 - weight) + average * weight;
        }
    }
}

// ============================================================================
// Click repair
// ============================================================================

fn sign(value: f64) -> i8 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Replace near-zero dropouts with the mean of their neighbours.
///
/// An interior sample is repaired when its magnitude is within
/// `sensitivity` and both neighbours share a sign. Returns how many samples
/// changed.
pub fn depop(seg: &mut Segment, sensitivity: f64) -> usize {
    let mut repaired = 0;
    for channel in &mut seg.samples {
        if channel.len() < 3 {
            continue;
        }
        for i in 1..channel.len() - 1 {
            let (prev, current, next) = (channel[i - 1], channel[i], channel[i + 1]);
            if current.abs() <= sensitivity && sign(prev) == sign(next) {
                let mean = (prev + next) / 2.0;
                if mean != current {
                    channel[i] = mean;
                    repaired += 1;
                }
            }
        }
    }
    log::debug!("depop repaired {} samples", repaired);
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp(len: usize) -> Segment {
        Segment::new(vec![(0..len).map(|i| i as f64).collect()])
    }

    #[test]
    fn test_silent_and_empty() {
        let seg = Segment::silent(1.0, 44100, 2);
        assert_eq!(seg.len(), 44100);
        assert!(seg.samples.iter().all(|ch| ch.iter().all(|&s| s == 0.0)));

        let empty = Segment::empty(3);
        assert_eq!(empty.num_channels(), 3);
        assert!(empty.is_empty());
        assert_eq!(Segment::default().len(), 0);
    }

    #[test]
    fn test_extract_absorbs_negative_start() {
        let seg = ramp(100);
        let out = extract(&seg, -10.0, 50.0, 1.0);
        assert_eq!(out.len(), 40);
        assert_eq!(out.channel(0)[0], 0.0);
        assert_eq!(out.channel(0)[39], 39.0);
    }

    #[test]
    fn test_extract_shrinks_past_end() {
        let seg = ramp(100);
        let out = extract(&seg, 90.0, 50.0, 1.0);
        assert_eq!(out.len(), 10);
        assert_eq!(out.channel(0)[9], 99.0);
    }

    #[test]
    fn test_extract_beyond_end_is_silence() {
        let seg = ramp(100);
        let out = extract(&seg, 150.0, 20.0, 1.0);
        assert_eq!(out.len(), 20);
        assert!(out.channel(0).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_extract_applies_volume_and_rounds_window() {
        let seg = ramp(10);
        let out = extract(&seg, 1.6, 2.4, 0.5);
        assert_eq!(out.channel(0), &[1.0, 1.5]);
    }

    #[test]
    fn test_reverse() {
        let seg = Segment::new(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        let rev = reverse(&seg);
        assert_eq!(rev.channel(0), &[3.0, 2.0, 1.0]);
        assert_eq!(rev.channel(1), &[6.0, 5.0, 4.0]);
    }

    #[test]
    fn test_scale_time_identity() {
        let seg = ramp(64);
        assert_eq!(scale_time(&seg, 1.0, true), seg);
        assert_eq!(scale_time(&seg, 1.0, false), seg);
    }

    #[test]
    fn test_scale_time_compress_averages() {
        let seg = Segment::new(vec![vec![1.0, 3.0, 5.0, 7.0]]);
        let out = scale_time(&seg, 2.0, true);
        assert_eq!(out.channel(0), &[2.0, 6.0]);

        let nearest = scale_time(&seg, 2.0, false);
        assert_eq!(nearest.channel(0), &[3.0, 7.0]);
    }

    #[test]
    fn test_scale_time_stretch_repeats() {
        let seg = Segment::new(vec![vec![1.0, 2.0]]);
        let out = scale_time(&seg, 0.5, true);
        assert_eq!(out.channel(0), &[1.0, 1.0, 2.0, 2.0]);
    }

    #[test]
    fn test_scale_time_fractional_length() {
        let seg = ramp(1000);
        let out = scale_time(&seg, 1.5, true);
        let expected = (1000.0_f64 / 1.5).round() as i64;
        assert!((out.len() as i64 - expected).abs() <= 1);
    }

    #[test]
    fn test_scale_time_invalid_factor() {
        let seg = ramp(8);
        assert_eq!(scale_time(&seg, 0.0, true), seg);
        assert_eq!(scale_time(&seg, -2.0, false), seg);
        assert_eq!(scale_time(&seg, f64::NAN, true), seg);
    }

    #[test]
    fn test_concat() {
        let a = Segment::new(vec![vec![1.0], vec![2.0]]);
        let b = Segment::new(vec![vec![3.0, 4.0], vec![5.0, 6.0]]);
        let joined = concat(&a, &b).unwrap();
        assert_eq!(joined.channel(0), &[1.0, 3.0, 4.0]);
        assert_eq!(joined.channel(1), &[2.0, 5.0, 6.0]);
    }

    #[test]
    fn test_concat_channel_mismatch() {
        let stereo = Segment::new(vec![vec![1.0], vec![2.0]]);
        let mono = Segment::new(vec![vec![3.0]]);
        match concat(&stereo, &mono) {
            Err(SkipjackError::ChannelMismatch { expected, found }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, 1);
            }
            other => panic!("Expected ChannelMismatch, got: {:?}", other),
        }
    }

    #[test]
    fn test_append_returns_seam() {
        let mut dest = ramp(10);
        let seam = append(&mut dest, &ramp(5), None).unwrap();
        assert_eq!(seam, 10);
        assert_eq!(dest.len(), 15);
        assert_eq!(dest.channel(0)[10], 0.0);
    }

    #[test]
    fn test_sew_smooths_step() {
        let mut seg = Segment::new(vec![vec![0.0; 16].into_iter().chain(vec![100.0; 16]).collect()]);
        sew(&mut seg, 16, 4);
        let ch = seg.channel(0);
        // The seam samples meet at the region average
        assert_relative_eq!(ch[15], 50.0, epsilon = 1e-9);
        assert_relative_eq!(ch[16], 50.0, epsilon = 1e-9);
        // Outside the radius nothing moves
        assert_eq!(ch[11], 0.0);
        assert_eq!(ch[20], 100.0);
        // Inside it the step is monotone
        assert!(ch.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_sew_radius_clamped_at_edges() {
        let mut seg = Segment::new(vec![vec![0.0, 0.0, 10.0, 10.0]]);
        sew(&mut seg, 1, 64);
        assert_eq!(seg.channel(0), &[0.0, 0.0, 10.0, 10.0]);

        let mut seg = Segment::new(vec![vec![0.0, 0.0, 0.0, 10.0, 10.0, 10.0]]);
        sew(&mut seg, 3, 64);
        // Radius clamps to 2
        assert_eq!(seg.channel(0)[0], 0.0);
        assert_eq!(seg.channel(0)[5], 10.0);
        assert_relative_eq!(seg.channel(0)[2], 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_depop_repairs_dropout() {
        let mut seg = Segment::new(vec![vec![1000.0, 1000.0, 0.0, 1000.0, -1000.0]]);
        let repaired = depop(&mut seg, 256.0);
        assert_eq!(repaired, 1);
        assert_eq!(seg.channel(0)[2], 1000.0);
        assert_eq!(seg.channel(0)[4], -1000.0);
    }

    #[test]
    fn test_play_time() {
        assert_eq!(play_time(44100, 44100), 1.0);
        assert_eq!(play_time(22050, 44100), 0.5);
        assert_eq!(play_time(100, 0), 0.0);
    }
}
