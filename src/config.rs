/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;

// ── Public Config Structs ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub scoring: ScoringConfig,
    pub feedback: FeedbackConfig,
    pub speed: SpeedConfig,
    pub gamepad: GamepadConfig,
    /// Explicit save directory; `None` = auto-detect.
    pub save_dir: Option<PathBuf>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoringConfig {
    pub start_score: u32,
    pub decay_points: u32,
    pub decay_interval_ms: u64,
    pub miss_penalty: u32,
    pub summary_delay_ms: u64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FeedbackConfig {
    pub max_distance: f32,
    pub very_hot: f32,
    pub hot: f32,
    pub warm: f32,
    pub sample_interval_ms: u64,
    pub cell_size_m: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpeedConfig {
    pub tick_rate_ms: u64,
    pub cursor_move_rate: u32,   // ticks between pointer steps while held
}

#[derive(Clone, Debug, PartialEq)]
pub struct GamepadConfig {
    pub point: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub pause: Vec<String>,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    scoring: TomlScoring,
    #[serde(default)]
    feedback: TomlFeedback,
    #[serde(default)]
    speed: TomlSpeed,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlScoring {
    #[serde(default = "default_start_score")]
    start_score: u32,
    #[serde(default = "default_decay_points")]
    decay_points: u32,
    #[serde(default = "default_decay_interval")]
    decay_interval_ms: u64,
    #[serde(default = "default_miss_penalty")]
    miss_penalty: u32,
    #[serde(default = "default_summary_delay")]
    summary_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlFeedback {
    #[serde(default = "default_max_distance")]
    max_distance: f32,
    #[serde(default = "default_very_hot")]
    very_hot: f32,
    #[serde(default = "default_hot")]
    hot: f32,
    #[serde(default = "default_warm")]
    warm: f32,
    #[serde(default = "default_sample_interval")]
    sample_interval_ms: u64,
    #[serde(default = "default_cell_size")]
    cell_size_m: f32,
}

#[derive(Deserialize, Debug)]
struct TomlSpeed {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_cursor_move")]
    cursor_move_rate: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_point")]
    point: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_pause")]
    pause: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    save_dir: Option<String>,
}

// ── Defaults ──

fn default_start_score() -> u32 { 1000 }
fn default_decay_points() -> u32 { 2 }
fn default_decay_interval() -> u64 { 1000 }
fn default_miss_penalty() -> u32 { 10 }
fn default_summary_delay() -> u64 { 2000 }

fn default_max_distance() -> f32 { 15.0 }
fn default_very_hot() -> f32 { 3.0 }
fn default_hot() -> f32 { 5.0 }
fn default_warm() -> f32 { 8.0 }
fn default_sample_interval() -> u64 { 200 }
fn default_cell_size() -> f32 { 0.5 }    // 30x20 field ≈ 15m x 10m

fn default_tick_rate() -> u64 { 50 }
fn default_cursor_move() -> u32 { 2 }

fn default_point() -> Vec<String> { vec!["A".into(), "R1".into(), "R2".into()] }
fn default_confirm() -> Vec<String> { vec!["A".into(), "Start".into()] }
fn default_cancel() -> Vec<String> { vec!["B".into(), "Select".into()] }
fn default_pause() -> Vec<String> { vec!["Start".into()] }

impl Default for TomlScoring {
    fn default() -> Self {
        TomlScoring {
            start_score: default_start_score(),
            decay_points: default_decay_points(),
            decay_interval_ms: default_decay_interval(),
            miss_penalty: default_miss_penalty(),
            summary_delay_ms: default_summary_delay(),
        }
    }
}

impl Default for TomlFeedback {
    fn default() -> Self {
        TomlFeedback {
            max_distance: default_max_distance(),
            very_hot: default_very_hot(),
            hot: default_hot(),
            warm: default_warm(),
            sample_interval_ms: default_sample_interval(),
            cell_size_m: default_cell_size(),
        }
    }
}

impl Default for TomlSpeed {
    fn default() -> Self {
        TomlSpeed {
            tick_rate_ms: default_tick_rate(),
            cursor_move_rate: default_cursor_move(),
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            point: default_point(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            pause: default_pause(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral { save_dir: None }
    }
}

// ── Conversion ──

impl From<TomlScoring> for ScoringConfig {
    fn from(t: TomlScoring) -> Self {
        ScoringConfig {
            start_score: t.start_score,
            decay_points: t.decay_points,
            decay_interval_ms: t.decay_interval_ms,
            miss_penalty: t.miss_penalty,
            summary_delay_ms: t.summary_delay_ms,
        }
    }
}

impl From<TomlFeedback> for FeedbackConfig {
    fn from(t: TomlFeedback) -> Self {
        FeedbackConfig {
            max_distance: t.max_distance,
            very_hot: t.very_hot,
            hot: t.hot,
            warm: t.warm,
            sample_interval_ms: t.sample_interval_ms,
            cell_size_m: t.cell_size_m,
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self { TomlScoring::default().into() }
}

impl Default for FeedbackConfig {
    fn default() -> Self { TomlFeedback::default().into() }
}

impl Default for SpeedConfig {
    fn default() -> Self {
        let t = TomlSpeed::default();
        SpeedConfig { tick_rate_ms: t.tick_rate_ms, cursor_move_rate: t.cursor_move_rate }
    }
}

impl Default for GamepadConfig {
    fn default() -> Self {
        let t = TomlGamepad::default();
        GamepadConfig { point: t.point, confirm: t.confirm, cancel: t.cancel, pause: t.pause }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) `~/.local/share/hidden-animals`.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::from_toml(toml_cfg)
    }

    /// Parse config text directly (no filesystem search).
    #[allow(dead_code)]
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<TomlConfig>(text).map(Self::from_toml)
    }

    fn from_toml(t: TomlConfig) -> Self {
        GameConfig {
            scoring: t.scoring.into(),
            feedback: t.feedback.into(),
            speed: SpeedConfig {
                tick_rate_ms: t.speed.tick_rate_ms.max(1),
                cursor_move_rate: t.speed.cursor_move_rate,
            },
            gamepad: GamepadConfig {
                point: t.gamepad.point,
                confirm: t.gamepad.confirm,
                cancel: t.gamepad.cancel,
                pause: t.gamepad.pause,
            },
            save_dir: t.general.save_dir.filter(|s| !s.trim().is_empty()).map(PathBuf::from),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default())
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/hidden-animals");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => {
                        tracing::info!(path = %path.display(), "loaded config");
                        return cfg;
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "config.toml parse error, using defaults");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "could not read config.toml");
                }
            }
        }
    }
    TomlConfig::default()
}
