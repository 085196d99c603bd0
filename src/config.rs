/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.
/// Problems found while loading are kept in `warnings` so they can be
/// logged once the subscriber is up.

use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::deck::{DeckSpec, Layout};

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub timing: TimingConfig,
    pub board: BoardConfig,
    pub gamepad: GamepadConfig,
    pub logging: LoggingConfig,
    pub warnings: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct TimingConfig {
    pub tick_rate_ms: u64,
    pub memorize_secs: u32,
    pub mismatch_delay_ms: u64,  // both faces stay visible this long
    pub finish_delay_ms: u64,    // last match → end screen
    pub message_ms: u64,         // encouragement display time
}

#[derive(Clone, Debug)]
pub struct BoardConfig {
    pub rows: usize,
    pub cols: usize,
    pub shuffle: bool,
    pub seed: Option<u64>,
}

#[derive(Clone, Debug)]
pub struct GamepadConfig {
    pub flip: Vec<String>,
    pub confirm: Vec<String>,
    pub cancel: Vec<String>,
    pub restart: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub file: Option<PathBuf>,
    pub level: String,
}

impl Default for TimingConfig {
    fn default() -> Self {
        TimingConfig {
            tick_rate_ms: default_tick_rate(),
            memorize_secs: default_memorize_secs(),
            mismatch_delay_ms: default_mismatch_delay(),
            finish_delay_ms: default_finish_delay(),
            message_ms: default_message_ms(),
        }
    }
}

impl BoardConfig {
    pub fn deck_spec(&self) -> DeckSpec {
        DeckSpec::standard(Layout::new(self.rows, self.cols), self.shuffle)
    }
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    timing: TomlTiming,
    #[serde(default)]
    board: TomlBoard,
    #[serde(default)]
    gamepad: TomlGamepad,
    #[serde(default)]
    logging: TomlLogging,
}

#[derive(Deserialize, Debug)]
struct TomlTiming {
    #[serde(default = "default_tick_rate")]
    tick_rate_ms: u64,
    #[serde(default = "default_memorize_secs")]
    memorize_secs: u32,
    #[serde(default = "default_mismatch_delay")]
    mismatch_delay_ms: u64,
    #[serde(default = "default_finish_delay")]
    finish_delay_ms: u64,
    #[serde(default = "default_message_ms")]
    message_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlBoard {
    #[serde(default = "default_rows")]
    rows: usize,
    #[serde(default = "default_cols")]
    cols: usize,
    #[serde(default = "default_shuffle")]
    shuffle: bool,
    #[serde(default)]
    seed: Option<u64>,
}

#[derive(Deserialize, Debug)]
struct TomlGamepad {
    #[serde(default = "default_flip")]
    flip: Vec<String>,
    #[serde(default = "default_confirm")]
    confirm: Vec<String>,
    #[serde(default = "default_cancel")]
    cancel: Vec<String>,
    #[serde(default = "default_restart")]
    restart: Vec<String>,
}

#[derive(Deserialize, Debug)]
struct TomlLogging {
    #[serde(default)]
    file: Option<String>,
    #[serde(default = "default_level")]
    level: String,
}

// ── Defaults ──

fn default_tick_rate() -> u64 { 33 }        // ~30 fps particle animation
fn default_memorize_secs() -> u32 { 5 }
fn default_mismatch_delay() -> u64 { 500 }
fn default_finish_delay() -> u64 { 1000 }
fn default_message_ms() -> u64 { 2000 }

fn default_rows() -> usize { 4 }
fn default_cols() -> usize { 5 }
fn default_shuffle() -> bool { true }

fn default_flip() -> Vec<String> { vec!["A".into(), "B".into()] }
fn default_confirm() -> Vec<String> { vec!["Start".into()] }
fn default_cancel() -> Vec<String> { vec!["Select".into()] }
fn default_restart() -> Vec<String> { vec!["Y".into()] }

fn default_level() -> String { "info".into() }

impl Default for TomlTiming {
    fn default() -> Self {
        TomlTiming {
            tick_rate_ms: default_tick_rate(),
            memorize_secs: default_memorize_secs(),
            mismatch_delay_ms: default_mismatch_delay(),
            finish_delay_ms: default_finish_delay(),
            message_ms: default_message_ms(),
        }
    }
}

impl Default for TomlBoard {
    fn default() -> Self {
        TomlBoard {
            rows: default_rows(),
            cols: default_cols(),
            shuffle: default_shuffle(),
            seed: None,
        }
    }
}

impl Default for TomlGamepad {
    fn default() -> Self {
        TomlGamepad {
            flip: default_flip(),
            confirm: default_confirm(),
            cancel: default_cancel(),
            restart: default_restart(),
        }
    }
}

impl Default for TomlLogging {
    fn default() -> Self {
        TomlLogging { file: None, level: default_level() }
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory,
    /// (3) ~/.local/share/memflip, (4) /usr/share/memflip.
    pub fn load() -> Self {
        let mut warnings = vec![];
        let text = read_config_text(&candidate_dirs(), &mut warnings).unwrap_or_default();
        Self::parse(&text, warnings)
    }

    /// Parse config text; missing keys use defaults, malformed text
    /// falls back to defaults entirely.
    fn parse(text: &str, mut warnings: Vec<String>) -> Self {
        let toml_cfg = match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => cfg,
            Err(e) => {
                warnings.push(format!("config.toml parse error, using defaults: {e}"));
                TomlConfig::default()
            }
        };
        Self::from_toml(toml_cfg, warnings)
    }

    fn from_toml(toml_cfg: TomlConfig, mut warnings: Vec<String>) -> Self {
        let mut timing = TimingConfig {
            tick_rate_ms: toml_cfg.timing.tick_rate_ms,
            memorize_secs: toml_cfg.timing.memorize_secs,
            mismatch_delay_ms: toml_cfg.timing.mismatch_delay_ms,
            finish_delay_ms: toml_cfg.timing.finish_delay_ms,
            message_ms: toml_cfg.timing.message_ms,
        };
        if timing.tick_rate_ms == 0 {
            warnings.push("timing.tick_rate_ms must be positive; using default".into());
            timing.tick_rate_ms = default_tick_rate();
        }

        let logging_file = toml_cfg.logging.file
            .filter(|f| !f.trim().is_empty())
            .map(PathBuf::from);

        GameConfig {
            timing,
            board: BoardConfig {
                rows: toml_cfg.board.rows,
                cols: toml_cfg.board.cols,
                shuffle: toml_cfg.board.shuffle,
                seed: toml_cfg.board.seed,
            },
            gamepad: GamepadConfig {
                flip: toml_cfg.gamepad.flip,
                confirm: toml_cfg.gamepad.confirm,
                cancel: toml_cfg.gamepad.cancel,
                restart: toml_cfg.gamepad.restart,
            },
            logging: LoggingConfig {
                file: logging_file,
                level: toml_cfg.logging.level,
            },
            warnings,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + data paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    if let Ok(exe) = std::env::current_exe() {
        // Follow symlinks so an installed link still finds its data
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
        let xdg = PathBuf::from(&home).join(".local/share/memflip");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    let sys = PathBuf::from("/usr/share/memflip");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn read_config_text(search_dirs: &[PathBuf], warnings: &mut Vec<String>) -> Option<String> {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return Some(text),
                Err(e) => warnings.push(format!("could not read {}: {e}", path.display())),
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg = GameConfig::parse("", vec![]);
        assert_eq!(cfg.timing.memorize_secs, 5);
        assert_eq!(cfg.timing.mismatch_delay_ms, 500);
        assert_eq!(cfg.timing.finish_delay_ms, 1000);
        assert_eq!((cfg.board.rows, cfg.board.cols), (4, 5));
        assert!(cfg.board.shuffle);
        assert!(cfg.board.seed.is_none());
        assert!(cfg.logging.file.is_none());
        assert!(cfg.warnings.is_empty());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = GameConfig::parse(
            "[board]\nrows = 2\ncols = 2\nseed = 42\n\n[timing]\nmemorize_secs = 3\n",
            vec![],
        );
        assert_eq!((cfg.board.rows, cfg.board.cols), (2, 2));
        assert_eq!(cfg.board.seed, Some(42));
        assert_eq!(cfg.timing.memorize_secs, 3);
        assert_eq!(cfg.timing.tick_rate_ms, 33);
        assert_eq!(cfg.board.deck_spec().pair_count, 2);
    }

    #[test]
    fn malformed_file_warns_and_falls_back() {
        let cfg = GameConfig::parse("[board\nrows = ", vec![]);
        assert_eq!(cfg.board.rows, 4);
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn zero_tick_rate_is_replaced() {
        let cfg = GameConfig::parse("[timing]\ntick_rate_ms = 0\n", vec![]);
        assert_eq!(cfg.timing.tick_rate_ms, 33);
        assert_eq!(cfg.warnings.len(), 1);
    }

    #[test]
    fn blank_log_file_means_no_file() {
        let cfg = GameConfig::parse("[logging]\nfile = \"  \"\nlevel = \"debug\"\n", vec![]);
        assert!(cfg.logging.file.is_none());
        assert_eq!(cfg.logging.level, "debug");
    }
}
