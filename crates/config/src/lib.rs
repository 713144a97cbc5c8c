//! Shared configuration for Inkwell
//!
//! This crate provides the single source of truth for the tunables used by
//! pens, erasers and ink meshing on every participant. All replicas of a
//! session must run with the same values, otherwise double-click detection
//! and ribbon geometry diverge.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default window for two presses to count as a double-click, in milliseconds
pub const DEFAULT_CLICK_INTERVAL_MS: u64 = 200;

/// Default lateral offset of each ribbon edge from the stroke centerline
pub const DEFAULT_RIBBON_HALF_WIDTH: f32 = 0.005;

/// Default physics layer that finished ink lives on
pub const DEFAULT_INK_LAYER: u8 = 17;

/// Default name prefix for ink objects
pub const DEFAULT_INK_PREFIX: &str = "Ink";

/// Default spawn target follow speed (per second)
pub const DEFAULT_FOLLOW_SPEED: f32 = 20.0;

/// Default number of finished strokes a pen keeps before evicting the oldest
pub const DEFAULT_INK_POOL_CAPACITY: usize = 1024;

/// Tunables for a pen/eraser pair and its ink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolConfig {
    /// Maximum gap between two press-downs that forms a double-click
    pub click_interval_ms: u64,
    /// Half of the ribbon collider width
    pub ribbon_half_width: f32,
    /// Layer tag checked by erasers
    pub ink_layer: u8,
    /// Name prefix checked by erasers
    pub ink_prefix: String,
    /// How fast the spawn target chases the pen tip on the holder's replica
    pub follow_speed: f32,
    /// Finished strokes kept per pen
    pub ink_pool_capacity: usize,
    /// Whether double-click (undo + swap to eraser) is enabled at startup
    pub use_double_click: bool,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            click_interval_ms: DEFAULT_CLICK_INTERVAL_MS,
            ribbon_half_width: DEFAULT_RIBBON_HALF_WIDTH,
            ink_layer: DEFAULT_INK_LAYER,
            ink_prefix: DEFAULT_INK_PREFIX.to_string(),
            follow_speed: DEFAULT_FOLLOW_SPEED,
            ink_pool_capacity: DEFAULT_INK_POOL_CAPACITY,
            use_double_click: true,
        }
    }
}

impl ToolConfig {
    /// Build a config from defaults, overridden by `INKWELL_*` environment variables
    ///
    /// Recognised variables:
    /// - `INKWELL_CLICK_INTERVAL_MS`
    /// - `INKWELL_RIBBON_HALF_WIDTH`
    /// - `INKWELL_INK_LAYER`
    /// - `INKWELL_INK_PREFIX`
    /// - `INKWELL_FOLLOW_SPEED`
    /// - `INKWELL_INK_POOL_CAPACITY`
    /// - `INKWELL_DOUBLE_CLICK` (`true`/`false`, `1`/`0`)
    ///
    /// Unparseable values are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`ToolConfig::from_env`] but reading from an arbitrary source
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "INKWELL_CLICK_INTERVAL_MS") {
            config.click_interval_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "INKWELL_RIBBON_HALF_WIDTH") {
            config.ribbon_half_width = v;
        }
        if let Some(v) = parse_var(&lookup, "INKWELL_INK_LAYER") {
            config.ink_layer = v;
        }
        if let Some(v) = lookup("INKWELL_INK_PREFIX").filter(|s| !s.is_empty()) {
            config.ink_prefix = v;
        }
        if let Some(v) = parse_var(&lookup, "INKWELL_FOLLOW_SPEED") {
            config.follow_speed = v;
        }
        if let Some(v) = parse_var(&lookup, "INKWELL_INK_POOL_CAPACITY") {
            config.ink_pool_capacity = v;
        }
        match lookup("INKWELL_DOUBLE_CLICK").as_deref() {
            Some("1") | Some("true") => config.use_double_click = true,
            Some("0") | Some("false") => config.use_double_click = false,
            Some(other) => {
                tracing::warn!("Ignoring INKWELL_DOUBLE_CLICK={:?}", other);
            }
            None => {}
        }

        config
    }

    /// Double-click window as a [`Duration`]
    pub fn click_interval(&self) -> Duration {
        Duration::from_millis(self.click_interval_ms)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid value", key, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = ToolConfig::default();
        assert_eq!(config.click_interval(), Duration::from_millis(200));
        assert_eq!(config.ribbon_half_width, DEFAULT_RIBBON_HALF_WIDTH);
        assert_eq!(config.ink_layer, 17);
        assert_eq!(config.ink_prefix, "Ink");
        assert!(config.use_double_click);
    }

    #[test]
    fn test_env_overrides() {
        let config = ToolConfig::from_lookup(lookup_from(&[
            ("INKWELL_CLICK_INTERVAL_MS", "350"),
            ("INKWELL_INK_LAYER", "9"),
            ("INKWELL_INK_PREFIX", "Stroke"),
            ("INKWELL_DOUBLE_CLICK", "0"),
        ]));
        assert_eq!(config.click_interval_ms, 350);
        assert_eq!(config.ink_layer, 9);
        assert_eq!(config.ink_prefix, "Stroke");
        assert!(!config.use_double_click);
        assert_eq!(config.ink_pool_capacity, DEFAULT_INK_POOL_CAPACITY);
    }

    #[test]
    fn test_bad_values_fall_back_to_defaults() {
        let config = ToolConfig::from_lookup(lookup_from(&[
            ("INKWELL_INK_LAYER", "not-a-layer"),
            ("INKWELL_DOUBLE_CLICK", "maybe"),
            ("INKWELL_INK_PREFIX", ""),
        ]));
        assert_eq!(config.ink_layer, DEFAULT_INK_LAYER);
        assert!(config.use_double_click);
        assert_eq!(config.ink_prefix, DEFAULT_INK_PREFIX);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ToolConfig = serde_json::from_str(r#"{"follow_speed": 5.0}"#).unwrap();
        assert_eq!(config.follow_speed, 5.0);
        assert_eq!(config.click_interval_ms, DEFAULT_CLICK_INTERVAL_MS);
    }
}
