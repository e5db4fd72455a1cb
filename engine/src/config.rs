use serde::Deserialize;
use serde::Serialize;

/// How panel items are bucketed when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupBy {
    /// Group items by their location's file, in first-seen file order.
    File,
}

/// Per-instance finder behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinderConfig {
    /// Cap on ranked results shown for filter sources.
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default)]
    pub preview: PreviewConfig,

    /// Panel-only: grouping mode. `None` renders a flat numbered list.
    #[serde(default)]
    pub group_by: Option<GroupBy>,

    /// Panel-only: follow cursor moves in other buffers and highlight the
    /// matching panel entry.
    #[serde(default)]
    pub sync_with_editor: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// `None` auto-enables the preview when any displayed entry carries a
    /// location.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Context lines above and below the target line.
    #[serde(default = "default_context_lines")]
    pub context_lines: u32,
}

fn default_max_results() -> usize {
    100
}

fn default_context_lines() -> u32 {
    5
}

impl Default for FinderConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            preview: PreviewConfig::default(),
            group_by: None,
            sync_with_editor: false,
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            context_lines: default_context_lines(),
        }
    }
}
