use std::path::{Path, PathBuf};

use log::LevelFilter;

use crate::io::SaveFormat;
use crate::ops::stroke::BrushState;

const SETTINGS_FILE: &str = "paintlite_settings.cfg";

/// Startup configuration, read from a `key=value` file.
///
/// The editor only reads this file; nothing it does at runtime is written back.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorSettings {
    /// Brush used for every stroke of the session
    pub brush: BrushState,
    /// Format picked for the CLI when neither `--format` nor an output
    /// extension says otherwise
    pub default_save_format: SaveFormat,
    pub log_level: LevelFilter,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            brush: BrushState::default(),
            default_save_format: SaveFormat::Png,
            log_level: LevelFilter::Info,
        }
    }
}

impl EditorSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/paintlite/paintlite_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\PaintLite\paintlite_settings.cfg
    /// On macOS:   ~/Library/Application Support/PaintLite/paintlite_settings.cfg
    pub fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            let appdata = std::env::var("APPDATA").or_else(|_| std::env::var("USERPROFILE")).ok()?;
            return Some(PathBuf::from(appdata).join("PaintLite").join(SETTINGS_FILE));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").ok()?;
            return Some(
                PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join("PaintLite")
                    .join(SETTINGS_FILE),
            );
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos")))]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
                .ok()?;
            Some(config_dir.join("paintlite").join(SETTINGS_FILE))
        }
    }

    /// Load from the default location (defaults if the file is missing).
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load from `path`; a missing or unreadable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse `key=value` lines. Unknown keys, comments and bad values are
    /// skipped, leaving the default in place.
    pub fn parse(content: &str) -> Self {
        let mut s = Self::default();
        for line in content.lines() {
            let line = line.trim();
            if line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else { continue };
            let val = val.trim();
            match key.trim() {
                "brush_color" => {
                    if let Some(c) = parse_color(val) {
                        s.brush.color = c;
                    }
                }
                "brush_width" => {
                    if let Ok(w) = val.parse::<f32>()
                        && w.is_finite()
                        && w > 0.0
                    {
                        s.brush.width = w;
                    }
                }
                "antialias" => {
                    s.brush.antialias = val != "false";
                }
                "default_save_format" => {
                    s.default_save_format = SaveFormat::from_extension(val);
                }
                "log_level" => {
                    if let Ok(level) = val.parse() {
                        s.log_level = level;
                    }
                }
                _ => {}
            }
        }
        s
    }
}

/// Parse a color from "r,g,b" or "r,g,b,a"
fn parse_color(s: &str) -> Option<[u8; 4]> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }
    let mut out = [0, 0, 0, 255];
    for (slot, part) in out.iter_mut().zip(&parts) {
        *slot = part.parse().ok()?;
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_gives_defaults() {
        let s = EditorSettings::parse("");
        assert_eq!(s, EditorSettings::default());
        assert_eq!(s.brush.color, [0, 0, 0, 255]);
        assert_eq!(s.brush.width, 4.0);
        assert!(s.brush.antialias);
    }

    #[test]
    fn parses_known_keys() {
        let s = EditorSettings::parse(
            "# brush\n\
             brush_color = 255, 0, 0\n\
             brush_width=7.5\n\
             antialias=false\n\
             default_save_format=jpeg\n\
             log_level=debug\n\
             unknown=1\n",
        );
        assert_eq!(s.brush.color, [255, 0, 0, 255]);
        assert_eq!(s.brush.width, 7.5);
        assert!(!s.brush.antialias);
        assert_eq!(s.default_save_format, SaveFormat::Jpeg);
        assert_eq!(s.log_level, LevelFilter::Debug);
    }

    #[test]
    fn bad_values_keep_defaults() {
        let s = EditorSettings::parse("brush_color=1,2\nbrush_width=-3\nlog_level=loud\n");
        assert_eq!(s, EditorSettings::default());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("paintlite-settings-that-does-not-exist.cfg");
        assert_eq!(EditorSettings::load_from(&path), EditorSettings::default());
    }
}
