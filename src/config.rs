use crate::fireworks::{Mode, PerformanceTier};
use crate::render::{ColorMode, RenderMode};
use serde::Deserialize;
use std::path::PathBuf;

/// User configuration loaded from config file.
/// All fields are optional — CLI flags override config, config overrides defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scheduler mode on startup
    pub mode: Option<ModeConfig>,
    /// Scripted show to start immediately (index into --list-shows)
    pub show: Option<usize>,
    /// Default render mode
    pub render: Option<RenderModeConfig>,
    /// Default color mode
    pub color: Option<ColorModeConfig>,
    /// Target FPS (1-120)
    pub fps: Option<u32>,
    /// Particle density tier
    pub tier: Option<TierConfig>,
    /// Terminal bell on detonation
    pub bell: Option<bool>,
    /// Hide status bar
    pub clean: Option<bool>,
    /// Particle draw size (1-5)
    pub size: Option<f64>,
    /// Base particle count (10-100)
    pub count: Option<usize>,
    /// Explosion height fraction (0.3-0.8)
    pub height: Option<f64>,
    /// Launch spread fraction (0.2-0.6)
    pub spread: Option<f64>,
    /// Velocity multiplier (0.5-2)
    pub speed: Option<f64>,
    /// Seconds between random-mode launch opportunities (0.1-1)
    pub delay: Option<f64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeConfig {
    Random,
    Choreography,
}

impl From<ModeConfig> for Mode {
    fn from(c: ModeConfig) -> Self {
        match c {
            ModeConfig::Random => Mode::Random,
            ModeConfig::Choreography => Mode::Choreography,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TierConfig {
    High,
    Medium,
    Low,
}

impl From<TierConfig> for PerformanceTier {
    fn from(c: TierConfig) -> Self {
        match c {
            TierConfig::High => PerformanceTier::High,
            TierConfig::Medium => PerformanceTier::Medium,
            TierConfig::Low => PerformanceTier::Low,
        }
    }
}

/// Render mode names for config file (kebab-case friendly)
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RenderModeConfig {
    Braille,
    HalfBlock,
}

impl From<RenderModeConfig> for RenderMode {
    fn from(c: RenderModeConfig) -> Self {
        match c {
            RenderModeConfig::Braille => RenderMode::Braille,
            RenderModeConfig::HalfBlock => RenderMode::HalfBlock,
        }
    }
}

/// Color mode names for config file (kebab-case friendly)
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorModeConfig {
    Mono,
    Ansi16,
    Ansi256,
    TrueColor,
}

impl From<ColorModeConfig> for ColorMode {
    fn from(c: ColorModeConfig) -> Self {
        match c {
            ColorModeConfig::Mono => ColorMode::Mono,
            ColorModeConfig::Ansi16 => ColorMode::Ansi16,
            ColorModeConfig::Ansi256 => ColorMode::Ansi256,
            ColorModeConfig::TrueColor => ColorMode::TrueColor,
        }
    }
}

/// Get the config file path: ~/.config/skyburst/config.toml
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("skyburst").join("config.toml"))
}

/// Load config from file. Returns default config if file doesn't exist.
pub fn load_config() -> Config {
    let Some(path) = config_path() else {
        return Config::default();
    };
    let Ok(contents) = std::fs::read_to_string(&path) else {
        return Config::default();
    };
    match toml::from_str(&contents) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: failed to parse {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Generate a default config file with all options commented out
pub fn default_config_string() -> String {
    r#"# skyburst configuration
# Use --show-config to see the active config file path.
# CLI flags override these settings.
# Out-of-range values clamp silently.

# Scheduler mode: random, choreography
# mode = "random"

# Scripted show to start immediately (index into --list-shows)
# show = 0

# Render mode: braille, half-block
# render = "braille"

# Color mode: mono, ansi16, ansi256, true-color
# color = "true-color"

# Target FPS (1-120)
# fps = 60

# Particle density tier: high, medium, low
# tier = "high"

# Terminal bell on detonation
# bell = false

# Hide status bar
# clean = false

# Particle draw size (1-5)
# size = 2.0

# Base particle count (10-100)
# count = 30

# Explosion height as a fraction of the viewport (0.3-0.8)
# height = 0.7

# Horizontal launch spread fraction (0.2-0.6)
# spread = 0.4

# Explosion velocity multiplier (0.5-2)
# speed = 1.0

# Seconds between random-mode launch opportunities (0.1-1)
# delay = 0.4
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_parses_to_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.mode.is_none());
        assert!(config.fps.is_none());
        assert!(config.count.is_none());
    }

    #[test]
    fn kebab_case_names_parse() {
        let config: Config = toml::from_str(
            r#"
            mode = "choreography"
            render = "half-block"
            color = "true-color"
            tier = "low"
            count = 80
            "#,
        )
        .unwrap();
        assert!(matches!(config.mode, Some(ModeConfig::Choreography)));
        assert!(matches!(config.render, Some(RenderModeConfig::HalfBlock)));
        assert!(matches!(config.color, Some(ColorModeConfig::TrueColor)));
        assert!(matches!(config.tier, Some(TierConfig::Low)));
        assert_eq!(config.count, Some(80));
    }

    #[test]
    fn default_template_is_valid_toml() {
        let parsed: Result<Config, _> = toml::from_str(&default_config_string());
        assert!(parsed.is_ok());
    }
}
