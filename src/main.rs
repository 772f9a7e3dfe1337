mod cli;
mod config;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use cli::Cli;
use config::Config;
use musicroll::encode::timeline_json::{write_timeline, ExportInfo};
use musicroll::{
    is_supported_audio, progress_channel, AnalysisDriver, AnalysisSettings, DecodedStream, ProgressEvent, StripStyle,
};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let cli = Cli::parse();

    // Explicit --config path, or auto-detect musicroll.toml / user config
    let config_path = cli.config.clone().or_else(config::discover);
    let cfg = match config_path {
        Some(ref path) => match config::load_config(path) {
            Some(cfg) => {
                log::info!("Loaded config from {}", path.display());
                cfg
            }
            None => {
                log::warn!("Failed to load config from {}", path.display());
                Config::default()
            }
        },
        None => Config::default(),
    };

    let input = &cli.input;
    if !input.exists() {
        anyhow::bail!("Input file not found: {}", input.display());
    }
    if !is_supported_audio(input) {
        anyhow::bail!("Unsupported audio format: {} (expected wav, mp3, ogg or flac)", input.display());
    }

    let output = cli.output.clone().unwrap_or_else(|| input.with_extension("png"));
    if output.exists() && !cli.force {
        log::info!("{} already exists, skipping analysis (use --force to redo it)", output.display());
        return Ok(());
    }

    let settings = build_settings(&cli, &cfg, output.clone());
    log::info!("musicroll - piano-roll analysis");
    log::info!("Input: {}", input.display());
    log::info!("Output: {}", output.display());

    let stream = DecodedStream::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let driver = AnalysisDriver::new(Box::new(stream), settings.clone())?;
    let pitches = driver.pitches();
    let sample_rate = driver.sample_rate();
    let timeline = driver.timeline();

    if cli.sync {
        driver.run_sync()?;
        driver
            .canvas()
            .save_png(&output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        log::info!("Saved piano roll to {}", output.display());
    } else {
        let pb = ProgressBar::new(driver.expected_instants() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} instants ({eta} remaining) {msg}")?
                .progress_chars("=>-"),
        );

        let (sink, events) = progress_channel(cfg.run.progress_buffer);
        let handle = driver.run_async(sink)?;

        for event in events.iter() {
            match event {
                ProgressEvent::Progress(progress) => {
                    pb.set_position(progress.completed as u64);
                    pb.set_message(progress.to_string());
                }
                ProgressEvent::Completed => pb.finish_with_message("Analysis complete"),
                ProgressEvent::Failed(reason) => pb.abandon_with_message(format!("Analysis failed: {}", reason)),
            }
        }
        handle.join().context("Analysis failed")?;
    }

    if let Some(ref path) = cli.timeline_json {
        let info = ExportInfo {
            sample_rate,
            spacing_ms: settings.spacing.as_secs_f64() * 1000.0,
            window_ms: settings.window.as_secs_f64() * 1000.0,
            cycles: settings.cycles,
        };
        write_timeline(path, &pitches, &info, &timeline.snapshot())
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    log::info!("Done! {} instants analysed", timeline.len());
    Ok(())
}

/// CLI values win over the config file, which wins over defaults.
fn build_settings(cli: &Cli, cfg: &Config, output: std::path::PathBuf) -> AnalysisSettings {
    AnalysisSettings {
        spacing: Duration::from_millis(cli.spacing_ms.unwrap_or(cfg.analysis.spacing_ms)),
        window: Duration::from_millis(cli.window_ms.unwrap_or(cfg.analysis.window_ms)),
        cycles: cli.cycles.unwrap_or(cfg.analysis.cycles),
        width: cli.width.unwrap_or(cfg.render.width),
        strip: StripStyle {
            height: cli.strip_height.unwrap_or(cfg.render.strip_height),
            mark_width: cfg.render.mark_width,
            magnitude_floor: cli.magnitude_floor.unwrap_or(cfg.render.magnitude_floor),
        },
        checkpoint_every: cli.checkpoint_every.unwrap_or(cfg.run.checkpoint_every),
        output: Some(output),
    }
}
