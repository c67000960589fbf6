//! Crossfaded joins between rendered excerpts.
//!
//! Each excerpt is cut together with a short "lead-in": the audio that
//! would naturally precede it in its own playback direction. When the
//! excerpt is appended to the running output, the tail of the output is
//! faded into that lead-in, so the join sounds continuous instead of a
//! hard splice.

use crate::engine::segment::{append, extract, reverse, scale_time, Segment};
use crate::error::Result;

/// An excerpt plus the short lead-in used to blend it onto what came before.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SegmentWithLead {
    /// The excerpt itself, already time-scaled (and reversed if requested)
    pub data: Segment,
    /// Audio leading into `data`, in `data`'s playback direction
    pub leadin: Segment,
}

impl SegmentWithLead {
    /// Cut an excerpt of `source` with its lead-in.
    ///
    /// A negative `length` cuts the same window reversed; its lead-in then
    /// comes from just after the window and is reversed too. A zero
    /// `length` takes the whole source.
    ///
    /// # Arguments
    /// * `source` - Audio to cut from
    /// * `start` - First sample of the window
    /// * `length` - Window length in samples; sign selects direction
    /// * `factor` - Time-scale divisor applied to excerpt and lead-in
    /// * `volume` - Gain applied to excerpt and lead-in
    /// * `blur_length` - Lead-in length in output samples
    pub fn new(
        source: &Segment,
        start: f64,
        length: f64,
        factor: f64,
        volume: f64,
        blur_length: usize,
    ) -> Self {
        let reversed = length < 0.0;
        let (mut start, mut length) = (start, length.abs());
        if length == 0.0 {
            start = 0.0;
            length = source.len() as f64;
        }

        let blur_window = blur_length as f64 * factor;
        let data = scale_time(&extract(source, start, length, volume), factor, true);

        if reversed {
            let leadin = scale_time(
                &extract(source, start + length, blur_window, volume),
                factor,
                true,
            );
            Self {
                data: reverse(&data),
                leadin: reverse(&leadin),
            }
        } else {
            let leadin = scale_time(
                &extract(source, start - blur_window, blur_window, volume),
                factor,
                true,
            );
            Self { data, leadin }
        }
    }

    /// Wrap an already-rendered segment with an empty lead-in.
    pub fn from_segment(segment: Segment) -> Self {
        let leadin = Segment::empty(segment.num_channels());
        Self {
            data: segment,
            leadin,
        }
    }
}

/// Append `tail.data` onto `main`, fading the end of `main` into
/// `tail.leadin`.
///
/// The last `min(leadin length, main length)` samples of `main` are mixed
/// with the lead-in on a linear ramp from all-`main` to all-lead-in.
///
/// # Errors
/// `ChannelMismatch` when `tail` does not match `main`'s channel count.
pub fn lead_blend(main: &mut Segment, tail: &SegmentWithLead) -> Result<()> {
    let blur = tail.leadin.len().min(main.len());
    let seam = append(main, &tail.data, None)?;
    if blur == 0 || tail.leadin.num_channels() != main.num_channels() {
        return Ok(());
    }

    for (channel, leadin) in main.samples.iter_mut().zip(&tail.leadin.samples) {
        for i in 0..blur {
            let ratio = (blur - i) as f64 / blur as f64;
            let pos = seam - blur + i;
            channel[pos] = channel[pos] * ratio + leadin[i] * (1.0 - ratio);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkipjackError;

    fn ramp(len: usize) -> Segment {
        Segment::new(vec![(0..len).map(|i| i as f64).collect()])
    }

    #[test]
    fn test_forward_excerpt_and_leadin() {
        let source = ramp(100);
        let seg = SegmentWithLead::new(&source, 50.0, 10.0, 1.0, 1.0, 4);
        assert_eq!(seg.data.channel(0), &[50.0, 51.0, 52.0, 53.0, 54.0, 55.0, 56.0, 57.0, 58.0, 59.0]);
        assert_eq!(seg.leadin.channel(0), &[46.0, 47.0, 48.0, 49.0]);
    }

    #[test]
    fn test_reversed_excerpt_and_leadin() {
        let source = ramp(100);
        let seg = SegmentWithLead::new(&source, 50.0, -4.0, 1.0, 1.0, 3);
        assert_eq!(seg.data.channel(0), &[53.0, 52.0, 51.0, 50.0]);
        assert_eq!(seg.leadin.channel(0), &[56.0, 55.0, 54.0]);
    }

    #[test]
    fn test_leadin_truncated_at_track_start() {
        let source = ramp(100);
        let seg = SegmentWithLead::new(&source, 2.0, 10.0, 1.0, 1.0, 8);
        assert_eq!(seg.leadin.channel(0), &[0.0, 1.0]);
    }

    #[test]
    fn test_factor_scales_excerpt_and_leadin() {
        let source = ramp(100);
        let seg = SegmentWithLead::new(&source, 20.0, 20.0, 2.0, 1.0, 4);
        assert_eq!(seg.data.len(), 10);
        assert_eq!(seg.leadin.len(), 4);
        // Lead-in covers the 8 source samples before the window
        assert_eq!(seg.leadin.channel(0), &[12.5, 14.5, 16.5, 18.5]);
    }

    #[test]
    fn test_zero_length_takes_whole_track() {
        let source = ramp(30);
        let seg = SegmentWithLead::new(&source, 12.0, 0.0, 1.0, 1.0, 4);
        assert_eq!(seg.data, source);
    }

    #[test]
    fn test_lead_blend_ramps_into_leadin() {
        let mut main = Segment::new(vec![vec![0.0; 8]]);
        let tail = SegmentWithLead {
            data: Segment::new(vec![vec![7.0; 3]]),
            leadin: Segment::new(vec![vec![100.0; 4]]),
        };
        lead_blend(&mut main, &tail).unwrap();

        assert_eq!(main.len(), 11);
        let ch = main.channel(0);
        assert_eq!(&ch[..4], &[0.0; 4]);
        assert_eq!(&ch[4..8], &[0.0, 25.0, 50.0, 75.0]);
        assert_eq!(&ch[8..], &[7.0; 3]);
    }

    #[test]
    fn test_lead_blend_onto_empty_output() {
        let mut main = Segment::empty(1);
        let tail = SegmentWithLead {
            data: Segment::new(vec![vec![1.0, 2.0]]),
            leadin: Segment::new(vec![vec![9.0, 9.0]]),
        };
        lead_blend(&mut main, &tail).unwrap();
        assert_eq!(main.channel(0), &[1.0, 2.0]);
    }

    #[test]
    fn test_lead_blend_channel_mismatch() {
        let mut main = Segment::empty(2);
        let tail = SegmentWithLead::from_segment(Segment::new(vec![vec![1.0]]));
        assert!(matches!(
            lead_blend(&mut main, &tail),
            Err(SkipjackError::ChannelMismatch { .. })
        ));
    }
}
