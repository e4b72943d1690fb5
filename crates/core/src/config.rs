//! Session configuration.

use serde::{Deserialize, Serialize};

/// Tunables for a document session.
///
/// Serializable so host applications can persist user preferences; every
/// field has a default matching the original editor's behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Pixels per PDF point when rasterizing pages.
    pub render_scale: f32,

    /// Upload size limit in bytes.
    pub max_file_bytes: u64,

    /// Per-page undo depth. The oldest edit becomes permanent when the
    /// stack is full; its pixels stay in the replay list, only the undo
    /// snapshot is released.
    pub max_undo_depth: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            render_scale: 1.5,
            max_file_bytes: 50 * 1024 * 1024,
            max_undo_depth: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_editor_behavior() {
        let config = SessionConfig::default();
        assert_eq!(config.render_scale, 1.5);
        assert_eq!(config.max_file_bytes, 50 * 1024 * 1024);
        assert_eq!(config.max_undo_depth, 64);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: SessionConfig =
            serde_json::from_str(r#"{"render_scale": 2.0}"#).expect("parse");
        assert_eq!(config.render_scale, 2.0);
        assert_eq!(config.max_undo_depth, 64);
    }
}
