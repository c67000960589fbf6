//! Pattern expansion
//!
//! Renders rules against a source track. Each pattern character picks a
//! listing from the rule's sample bundle; the listing's slice of the rule
//! is cut (forward or reversed by the character's case), time-scaled by
//! the rule's factor and crossfaded onto the running output.
//!
//! Expansion keeps no state between calls. Problems with a rule's pattern
//! are reported, never fatal; only a channel-count mismatch between the
//! source and the output aborts.

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::config::ExportSettings;
use crate::engine::blend::{lead_blend, SegmentWithLead};
use crate::engine::segment::{scale_time, sew, Segment};
use crate::error::Result;
use crate::numeric::{round_to_i64, truncate};
use crate::rules::listing::{Direction, SampleListing};
use crate::rules::rule::Rule;

// ============================================================================
// Sample bundle
// ============================================================================

/// A rule's listings with their cumulative offsets and a label lookup.
///
/// Offsets follow declaration order, so listings partition `[0, total)` of
/// the rule. When two listings share a label the first one wins.
#[derive(Debug, Clone)]
pub struct SampleBundle<'a> {
    listings: &'a [SampleListing],
    offsets: Vec<f64>,
    by_label: HashMap<char, usize>,
}

impl<'a> SampleBundle<'a> {
    pub fn new(listings: &'a [SampleListing]) -> Self {
        let mut offsets = Vec::with_capacity(listings.len());
        let mut by_label = HashMap::with_capacity(listings.len());
        let mut offset = 0.0;
        for (index, listing) in listings.iter().enumerate() {
            offsets.push(offset);
            offset += listing.portion;
            by_label.entry(listing.label).or_insert(index);
        }
        Self {
            listings,
            offsets,
            by_label,
        }
    }

    /// Index of the listing for a pattern character, ignoring case.
    pub fn lookup(&self, c: char) -> Option<usize> {
        let label = c.to_uppercase().next()?;
        self.by_label.get(&label).copied()
    }

    pub fn listing(&self, index: usize) -> &SampleListing {
        &self.listings[index]
    }

    /// Fraction of the rule preceding listing `index`.
    pub fn offset(&self, index: usize) -> f64 {
        self.offsets[index]
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }
}

// ============================================================================
// Reports
// ============================================================================

/// What happened while expanding one rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExpansionReport {
    /// Label of the rule
    pub rule_label: String,

    /// Pattern positions whose character matched no listing
    pub unmatched_positions: Vec<usize>,

    /// Sum of consumed portions divided by the factor, truncated to 0.001
    pub consumed_ratio: f64,

    /// True when `consumed_ratio` is not 1
    pub ratio_mismatch: bool,

    /// Samples appended to the output
    pub rendered_samples: usize,
}

impl ExpansionReport {
    /// True when nothing about the rule needed a warning.
    pub fn is_clean(&self) -> bool {
        self.unmatched_positions.is_empty() && !self.ratio_mismatch
    }
}

/// A rendered rule list plus one report per rule.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Render {
    pub segment: Segment,
    pub reports: Vec<ExpansionReport>,
}

impl Render {
    /// Reports that carry a warning.
    pub fn warnings(&self) -> impl Iterator<Item = &ExpansionReport> {
        self.reports.iter().filter(|report| !report.is_clean())
    }
}

// ============================================================================
// Expansion
// ============================================================================

/// Expand `rule` against `source`, appending the result to `output`.
///
/// # Errors
/// `ChannelMismatch` when `source` and `output` have different channel
/// counts.
pub fn expand_rule(
    source: &Segment,
    rule: &Rule,
    output: &mut Segment,
    settings: &ExportSettings,
) -> Result<ExpansionReport> {
    let mut report = ExpansionReport {
        rule_label: rule.label.clone(),
        ..Default::default()
    };
    let start_len = output.len();

    if rule.samples.is_empty() {
        warn!("Rule {} has no samples; skipping it", rule.label);
        report.unmatched_positions = (0..rule.pattern.chars().count()).collect();
        report.ratio_mismatch = true;
        return Ok(report);
    }

    let factor = if rule.factor.is_finite() && rule.factor > 0.0 {
        rule.factor
    } else {
        warn!(
            "Rule {} has invalid factor {}; rendering at factor 1",
            rule.label, rule.factor
        );
        1.0
    };

    let bundle = SampleBundle::new(&rule.samples);
    let length = rule.length as f64;
    let mut consumed = 0.0;

    for (position, c) in rule.pattern.chars().enumerate() {
        let index = match bundle.lookup(c) {
            Some(index) => index,
            None => {
                warn!(
                    "Rule {}: pattern label \"{}\" at position {} matches no sample; using \"{}\"",
                    rule.label,
                    c,
                    position,
                    bundle.listing(0).label
                );
                report.unmatched_positions.push(position);
                0
            }
        };
        let listing = bundle.listing(index);
        consumed += listing.portion;

        let excerpt_start = bundle.offset(index) * length + rule.start as f64;
        let excerpt_length = listing.portion * length;
        if round_to_i64(excerpt_length) <= 0 {
            debug!(
                "Rule {}: excerpt for \"{}\" rounds to no samples; skipping",
                rule.label, c
            );
            continue;
        }

        let signed_length = match Direction::from_char(c, settings.invert_reverses) {
            Direction::Forward => excerpt_length,
            Direction::Reverse => -excerpt_length,
        };
        let excerpt = SegmentWithLead::new(
            source,
            excerpt_start,
            signed_length,
            factor,
            rule.volume,
            settings.blur_length,
        );

        let seam = output.len();
        lead_blend(output, &excerpt)?;
        if settings.sew_seams && excerpt.leadin.is_empty() && seam > 0 {
            sew(output, seam, settings.smoothing_rate);
        }
    }

    report.consumed_ratio = truncate(consumed / factor, 1000.0);
    if report.consumed_ratio != 1.0 {
        warn!(
            "Rule {}: pattern plays {}/1 of the rule's duration, expected 1/1",
            rule.label, report.consumed_ratio
        );
        report.ratio_mismatch = true;
    }
    report.rendered_samples = output.len() - start_len;
    Ok(report)
}

/// Render one rule on its own.
pub fn render_rule(
    source: &Segment,
    rule: &Rule,
    settings: &ExportSettings,
) -> Result<(Segment, ExpansionReport)> {
    let mut output = Segment::empty(source.num_channels());
    let report = expand_rule(source, rule, &mut output, settings)?;
    Ok((output, report))
}

/// Render every rule in order into one segment.
///
/// The final speed factor is applied once to the whole result.
pub fn skipjack<'a, I>(source: &Segment, rules: I, settings: &ExportSettings) -> Result<Render>
where
    I: IntoIterator<Item = &'a Rule>,
{
    let mut segment = Segment::empty(source.num_channels());
    let mut reports = Vec::new();

    for rule in rules {
        if !rule.auto_label {
            info!("Skipjacking {}...", rule.label);
        }
        reports.push(expand_rule(source, rule, &mut segment, settings)?);
    }
    info!("Finished skipjacking {} rules", reports.len());

    if settings.final_speed_factor != 1.0 {
        info!(
            "Applying final speed factor {}",
            settings.final_speed_factor
        );
        segment = scale_time(&segment, settings.final_speed_factor, true);
    }

    Ok(Render { segment, reports })
}
