use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub analysis: AnalysisConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub run: RunConfig,
}

#[derive(Debug, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default = "default_spacing_ms")]
    pub spacing_ms: u64,
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
    #[serde(default = "default_cycles")]
    pub cycles: f64,
}

#[derive(Debug, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_width")]
    pub width: u32,
    #[serde(default = "default_strip_height")]
    pub strip_height: u32,
    #[serde(default = "default_mark_width")]
    pub mark_width: u32,
    #[serde(default = "default_magnitude_floor")]
    pub magnitude_floor: f64,
}

#[derive(Debug, Deserialize)]
pub struct RunConfig {
    #[serde(default = "default_checkpoint_every")]
    pub checkpoint_every: usize,
    /// Capacity of the progress queue; 0 hands over each update directly.
    #[serde(default)]
    pub progress_buffer: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            spacing_ms: default_spacing_ms(),
            window_ms: default_window_ms(),
            cycles: default_cycles(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            strip_height: default_strip_height(),
            mark_width: default_mark_width(),
            magnitude_floor: default_magnitude_floor(),
        }
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            checkpoint_every: default_checkpoint_every(),
            progress_buffer: 0,
        }
    }
}

fn default_spacing_ms() -> u64 { 1000 }
fn default_window_ms() -> u64 { 100 }
fn default_cycles() -> f64 { musicroll::audio::spectrum::DEFAULT_CYCLES }
fn default_width() -> u32 { musicroll::audio::analysis::DEFAULT_WIDTH }
fn default_strip_height() -> u32 { 10 }
fn default_mark_width() -> u32 { 10 }
fn default_magnitude_floor() -> f64 { 0.001 }
fn default_checkpoint_every() -> usize { musicroll::audio::analysis::DEFAULT_CHECKPOINT_EVERY }

pub fn load_config(path: &Path) -> Option<Config> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(err) => {
            log::warn!("Invalid config {}: {}", path.display(), err);
            None
        }
    }
}

/// First existing config file: `./musicroll.toml`, then the user config dirs.
pub fn discover() -> Option<std::path::PathBuf> {
    let local = std::path::PathBuf::from("musicroll.toml");
    if local.exists() {
        return Some(local);
    }
    if let Some(home) = dirs::home_dir() {
        let xdg = home.join(".config").join("musicroll").join("config.toml");
        if xdg.exists() {
            return Some(xdg);
        }
    }
    if let Some(config_dir) = dirs::config_dir() {
        let platform = config_dir.join("musicroll").join("config.toml");
        if platform.exists() {
            return Some(platform);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.analysis.spacing_ms, 1000);
        assert_eq!(config.analysis.window_ms, 100);
        assert_eq!(config.analysis.cycles, 25.0);
        assert_eq!(config.render.width, 800);
        assert_eq!(config.render.strip_height, 10);
        assert_eq!(config.run.checkpoint_every, 10);
        assert_eq!(config.run.progress_buffer, 0);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
            [analysis]
            spacing_ms = 250

            [render]
            width = 1040
            magnitude_floor = 0.01
            "#,
        )
        .unwrap();
        assert_eq!(config.analysis.spacing_ms, 250);
        assert_eq!(config.analysis.window_ms, 100);
        assert_eq!(config.render.width, 1040);
        assert_eq!(config.render.mark_width, 10);
        assert_eq!(config.render.magnitude_floor, 0.01);
        assert_eq!(config.run.checkpoint_every, 10);
    }

    #[test]
    fn load_config_rejects_bad_files() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.toml");
        assert!(load_config(&missing).is_none());

        let bad = dir.path().join("bad.toml");
        std::fs::write(&bad, "[analysis]\nspacing_ms = \"fast\"\n").unwrap();
        assert!(load_config(&bad).is_none());

        let good = dir.path().join("good.toml");
        std::fs::write(&good, "[run]\nprogress_buffer = 4\n").unwrap();
        assert_eq!(load_config(&good).unwrap().run.progress_buffer, 4);
    }
}
