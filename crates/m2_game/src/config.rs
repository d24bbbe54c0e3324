//! Game settings loaded from `assets/config/game.json`.
//!
//! Every field is optional in the file. Defaults are the stock game:
//! 160x144 at 5x, 60 Hz, 75 ms walk animation.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use m2_platform::window::PlatformConfig;

pub const MAX_SCREEN_SCALE: u32 = 16;
pub const MAX_LOGICAL_SIZE: u32 = 1024;
pub const MAX_ANIMATION_PERIOD_MS: u64 = 60_000;
/// Logical pixels per tick; anything faster skips whole tiles.
pub const MAX_PLAYER_SPEED: i32 = 16;

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct GameConfig {
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default = "default_logical_width")]
    pub logical_width: u32,
    #[serde(default = "default_logical_height")]
    pub logical_height: u32,
    #[serde(default = "default_screen_scale")]
    pub screen_scale: u32,
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
    #[serde(default = "default_map_path")]
    pub map_path: String,
    #[serde(default = "default_animation_period_ms")]
    pub animation_period_ms: u64,
    #[serde(default = "default_player_speed")]
    pub player_speed: i32,
    #[serde(default = "default_stall_threshold_ms")]
    pub stall_threshold_ms: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            logical_width: default_logical_width(),
            logical_height: default_logical_height(),
            screen_scale: default_screen_scale(),
            frame_rate: default_frame_rate(),
            map_path: default_map_path(),
            animation_period_ms: default_animation_period_ms(),
            player_speed: default_player_speed(),
            stall_threshold_ms: default_stall_threshold_ms(),
        }
    }
}

impl GameConfig {
    pub fn platform(&self) -> PlatformConfig {
        PlatformConfig {
            title: self.title.clone(),
            logical_width: self.logical_width,
            logical_height: self.logical_height,
            scale: self.screen_scale,
        }
    }
}

pub fn load_config_from_path(path: &Path) -> Result<GameConfig, String> {
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config file {}: {e}", path.display()))?;
    let config: GameConfig = serde_json::from_str(&raw)
        .map_err(|e| format!("Failed to parse config file {}: {e}", path.display()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Missing file means defaults; a broken file is logged and also falls back.
pub fn load_config_or_default(path: &Path) -> GameConfig {
    if !path.exists() {
        log::info!(
            "No config at '{}', using built-in defaults",
            path.display()
        );
        return GameConfig::default();
    }
    match load_config_from_path(path) {
        Ok(config) => {
            log::info!("Config loaded from '{}'", path.display());
            config
        }
        Err(err) => {
            log::error!("{err}. Using built-in defaults.");
            GameConfig::default()
        }
    }
}

fn validate_config(config: &GameConfig) -> Result<(), String> {
    if config.screen_scale == 0 {
        return Err("Config validation failed: screen_scale must be > 0".to_string());
    }
    if config.screen_scale > MAX_SCREEN_SCALE {
        return Err(format!(
            "Config validation failed: screen_scale {} exceeds {MAX_SCREEN_SCALE}",
            config.screen_scale
        ));
    }
    if config.logical_width == 0 || config.logical_height == 0 {
        return Err(
            "Config validation failed: logical_width and logical_height must be > 0".to_string(),
        );
    }
    if config.logical_width > MAX_LOGICAL_SIZE || config.logical_height > MAX_LOGICAL_SIZE {
        return Err(format!(
            "Config validation failed: logical size {}x{} exceeds {MAX_LOGICAL_SIZE}",
            config.logical_width, config.logical_height
        ));
    }
    if config.frame_rate == 0 {
        return Err("Config validation failed: frame_rate must be > 0".to_string());
    }
    if config.animation_period_ms == 0 {
        return Err("Config validation failed: animation_period_ms must be > 0".to_string());
    }
    if config.animation_period_ms > MAX_ANIMATION_PERIOD_MS {
        return Err(format!(
            "Config validation failed: animation_period_ms {} exceeds {MAX_ANIMATION_PERIOD_MS}",
            config.animation_period_ms
        ));
    }
    if !(0..=MAX_PLAYER_SPEED).contains(&config.player_speed) {
        return Err(format!(
            "Config validation failed: player_speed {} must be within 0..={MAX_PLAYER_SPEED}",
            config.player_speed
        ));
    }
    if config.stall_threshold_ms == 0 {
        return Err("Config validation failed: stall_threshold_ms must be > 0".to_string());
    }
    if config.map_path.is_empty() {
        return Err("Config validation failed: map_path is empty".to_string());
    }
    Ok(())
}

fn default_title() -> String {
    "Metroid 2: Return of Samus".to_string()
}

const fn default_logical_width() -> u32 {
    160
}

const fn default_logical_height() -> u32 {
    144
}

const fn default_screen_scale() -> u32 {
    5
}

const fn default_frame_rate() -> u32 {
    60
}

fn default_map_path() -> String {
    "assets/maps/test_map".to_string()
}

const fn default_animation_period_ms() -> u64 {
    75
}

const fn default_player_speed() -> i32 {
    crate::samus::SPEED
}

const fn default_stall_threshold_ms() -> u64 {
    250
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "m2_config_test_{}_{}_{}.json",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn empty_object_yields_defaults() {
        let path = temp_file_path("empty");
        fs::write(&path, "{}").expect("write temp file");
        let config = load_config_from_path(&path).expect("empty config should load");
        assert_eq!(config, GameConfig::default());
        assert_eq!(config.screen_scale, 5);
        assert_eq!(config.frame_rate, 60);
        assert_eq!(config.animation_period_ms, 75);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let path = temp_file_path("partial");
        fs::write(&path, r#"{ "screen_scale": 3, "map_path": "maps/other" }"#)
            .expect("write temp file");
        let config = load_config_from_path(&path).expect("partial config should load");
        assert_eq!(config.screen_scale, 3);
        assert_eq!(config.map_path, "maps/other");
        assert_eq!(config.player_speed, 2);
        let platform = config.platform();
        assert_eq!(platform.width(), 480);
        assert_eq!(platform.height(), 432);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn zero_scale_is_rejected() {
        let path = temp_file_path("zero_scale");
        fs::write(&path, r#"{ "screen_scale": 0 }"#).expect("write temp file");
        let err = load_config_from_path(&path).expect_err("zero scale should fail");
        assert!(err.contains("screen_scale must be > 0"));
        let _ = fs::remove_file(path);
    }

    #[test]
    fn zero_animation_period_is_rejected() {
        let path = temp_file_path("zero_period");
        fs::write(&path, r#"{ "animation_period_ms": 0 }"#).expect("write temp file");
        let err = load_config_from_path(&path).expect_err("zero period should fail");
        assert!(err.contains("animation_period_ms"));
        let _ = fs::remove_file(path);
    }

    fn rejection_for(name: &str, body: &str) -> String {
        let path = temp_file_path(name);
        fs::write(&path, body).expect("write temp file");
        let err = load_config_from_path(&path).expect_err("config should be rejected");
        let _ = fs::remove_file(path);
        err
    }

    #[test]
    fn oversized_scale_is_rejected() {
        let err = rejection_for("big_scale", r#"{ "screen_scale": 100000000 }"#);
        assert!(err.contains("screen_scale 100000000 exceeds 16"), "{err}");
        let path = temp_file_path("max_scale");
        fs::write(&path, r#"{ "screen_scale": 16 }"#).expect("write temp file");
        let config = load_config_from_path(&path).expect("largest scale should load");
        assert_eq!(config.platform().width(), 2560);
        let _ = fs::remove_file(path);
    }

    #[test]
    fn oversized_logical_size_is_rejected() {
        let err = rejection_for("big_width", r#"{ "logical_width": 4000000000 }"#);
        assert!(err.contains("logical size"), "{err}");
    }

    #[test]
    fn oversized_animation_period_is_rejected() {
        let err = rejection_for(
            "big_period",
            r#"{ "animation_period_ms": 18446744073709551615 }"#,
        );
        assert!(err.contains("animation_period_ms"), "{err}");
    }

    #[test]
    fn negative_player_speed_is_rejected() {
        let err = rejection_for("negative_speed", r#"{ "player_speed": -2 }"#);
        assert!(err.contains("player_speed -2"), "{err}");
    }

    #[test]
    fn oversized_player_speed_is_rejected() {
        let err = rejection_for("big_speed", r#"{ "player_speed": 2147483647 }"#);
        assert!(err.contains("player_speed"), "{err}");
    }

    #[test]
    fn zero_stall_threshold_is_rejected() {
        let err = rejection_for("zero_stall", r#"{ "stall_threshold_ms": 0 }"#);
        assert!(err.contains("stall_threshold_ms"), "{err}");
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let path = temp_file_path("malformed");
        fs::write(&path, "{ not json").expect("write temp file");
        assert!(load_config_from_path(&path).is_err());
        assert_eq!(load_config_or_default(&path), GameConfig::default());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let path = temp_file_path("missing");
        assert_eq!(load_config_or_default(&path), GameConfig::default());
    }
}
