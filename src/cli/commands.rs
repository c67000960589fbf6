//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;

use log::{info, warn};

use crate::cli::RenderArgs;
use crate::config::ExportSettings;
use crate::engine::{depop, CommandPlayer, PlaybackController, Waveform};
use crate::error::{Result, SkipjackError};
use crate::numeric::round_to_i64;
use crate::rules::{format_samples, load_rules, save_rules, skipjack, Render};
use crate::state::ProjectStore;

/// Load, render, encode and write: the export pipeline.
///
/// Container and channel errors abort; pattern problems only warn.
pub fn export(
    input: &Path,
    rules_path: &Path,
    output: &Path,
    sample_rate: Option<u32>,
    args: &RenderArgs,
) -> Result<Render> {
    let settings = args.resolve()?;
    let source = Waveform::load(input)?;
    let rules = load_rules(rules_path)?;

    let render = skipjack(&source.to_segment(), &rules, &settings)?;
    write_render(&source, render, output, sample_rate, args.depop, &settings)
}

/// Render rules `from..=to` only.
pub fn preview(
    input: &Path,
    rules_path: &Path,
    from: i64,
    to: i64,
    output: &Path,
    args: &RenderArgs,
) -> Result<Render> {
    let settings = args.resolve()?;
    let source = Waveform::load(input)?;
    let mut store = ProjectStore::with_rules(load_rules(rules_path)?);
    if !store.select_range(from, to) {
        return Err(SkipjackError::InvalidSelection {
            from,
            to,
            count: store.len(),
        });
    }

    let render = store.skipjack_selected(&source.to_segment(), &settings)?;
    write_render(&source, render, output, None, args.depop, &settings)
}

fn write_render(
    source: &Waveform,
    mut render: Render,
    output: &Path,
    sample_rate: Option<u32>,
    repair: bool,
    settings: &ExportSettings,
) -> Result<Render> {
    if repair {
        let repaired = depop(&mut render.segment, settings.depopping_sensitivity);
        info!("Repaired {} dropout samples", repaired);
    }

    let warnings = render.warnings().count();
    if warnings > 0 {
        warn!("{} rules rendered with warnings", warnings);
    }

    let mut wave = source.empty_like();
    if let Some(rate) = sample_rate {
        wave.set_sample_rate(rate);
    }
    wave.set_segment(&render.segment)?;
    wave.save(output)?;

    println!(
        "Exported {} samples ({} sec) to {}",
        wave.len(),
        wave.play_time(),
        output.display()
    );
    Ok(render)
}

/// Print a container's header fields.
pub fn info(path: &Path) -> Result<()> {
    let wave = Waveform::load(path)?;
    let header = wave.header();

    println!("File: {}", path.display());
    println!("{:-<40}", "");
    println!("Channels:        {}", header.channels());
    println!("Sample rate:     {} Hz", header.sample_rate());
    println!("Byte rate:       {}", header.byte_rate());
    println!("Block align:     {}", header.block_align());
    println!("Bits per sample: {}", header.bits_per_sample());
    println!("Data size:       {} bytes", header.data_size());
    println!("Samples:         {}", wave.len());
    println!("Play time:       {} sec", wave.play_time());

    Ok(())
}

/// List the rules in a rule file.
pub fn list_rules(path: &Path) -> Result<()> {
    let rules = load_rules(path)?;
    if rules.is_empty() {
        println!("No rules in {}", path.display());
        return Ok(());
    }

    println!(
        "{:<4} {:<10} {:>10} {:>10} {:>7} {:>6}  {:<16} Pattern",
        "#", "Label", "Start", "Length", "Factor", "Volume", "Samples"
    );
    println!("{:-<80}", "");
    for (i, rule) in rules.iter().enumerate() {
        println!(
            "{:<4} {:<10} {:>10} {:>10} {:>7} {:>6}  {:<16} {}",
            i,
            rule.label,
            rule.start,
            rule.length,
            rule.factor,
            rule.volume,
            format_samples(&rule.samples),
            rule.pattern
        );
    }
    println!("{:-<80}", "");
    println!("{} rules", rules.len());

    Ok(())
}

/// Parameters for [`new_rules`].
#[derive(Debug, Clone)]
pub struct NewRulesArgs<'a> {
    pub samples: &'a str,
    pub pattern: &'a str,
    pub length_secs: f64,
    pub count: usize,
    pub factor: f64,
    pub volume: f64,
    pub sample_rate: u32,
}

/// Write a rule file of `count` identical, contiguous rules.
pub fn new_rules(output: &Path, args: &NewRulesArgs<'_>) -> Result<()> {
    let length = round_to_i64(args.length_secs * f64::from(args.sample_rate));
    if length <= 0 {
        warn!("Rule length {} sec rounds to no samples", args.length_secs);
    }

    let mut store = ProjectStore::new();
    store.create_rules(
        args.samples,
        args.pattern,
        length,
        args.factor,
        args.volume,
        args.count,
    );
    save_rules(output, store.rules())?;

    println!("Wrote {} rules to {}", store.len(), output.display());
    Ok(())
}

/// Render the rule file and hand it to an external player.
pub fn play(input: &Path, rules_path: &Path, player: &str, args: &RenderArgs) -> Result<()> {
    let settings = args.resolve()?;
    let source = Waveform::load(input)?;
    let rules = load_rules(rules_path)?;

    let mut controller = PlaybackController::new(CommandPlayer::from_command_line(player)?);
    controller.render_and_play(&source, &rules, &settings)?;
    if controller.is_playing() {
        println!("Playing through {} (Ctrl-C to stop)", player);
        controller.player_mut().wait()?;
    }
    Ok(())
}
