use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use scout_protocol::Location;
use scout_protocol::Severity;
use serde::Deserialize;
use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::events::EventKind;

/// Identifies a split/pane in the host editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneId(pub u64);

/// Identifies a buffer in the host editor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BufferId(pub u64);

/// A rendered surface: a buffer displayed in a pane. Stable for the
/// lifetime of the surface so content can be updated in place.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Surface {
    pub buffer: BufferId,
    pub pane: PaneId,
}

/// One row of the prompt's suggestion list. `value` is the index of the
/// backing result the row refers to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Suggestion {
    pub text: String,
    pub description: Option<String>,
    pub value: usize,
}

/// Presentation role of a surface line. The host decides styling; the
/// engine only tags roles (and severity for diagnostic items).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineKind {
    Title,
    Blank,
    /// Per-group header line in a grouped panel.
    Header,
    /// A selectable item line.
    Item,
    Separator,
    /// Preview context line.
    Context,
    /// The preview's target line.
    Target,
    Help,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SurfaceLine {
    pub text: String,
    pub kind: LineKind,
    pub severity: Option<Severity>,
}

impl SurfaceLine {
    pub fn new(kind: LineKind, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind,
            severity: None,
        }
    }

    pub fn blank() -> Self {
        Self::new(LineKind::Blank, "")
    }

    pub fn item(text: impl Into<String>, severity: Option<Severity>) -> Self {
        Self {
            text: text.into(),
            kind: LineKind::Item,
            severity,
        }
    }
}

/// How an external search process finished.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    Exit(i32),
    /// The process was terminated by a kill request. Neither success nor
    /// failure; produces no status message.
    Killed,
}

/// Structured result of an external search process.
#[derive(Clone, Debug)]
pub struct SearchOutput {
    pub stdout: String,
    pub stderr: String,
    pub status: SearchStatus,
}

/// A running external search that can be killed while its output is still
/// being awaited. Hosts build one around their process-spawn primitive:
/// the token requests best-effort termination, the future resolves with
/// the structured output (status `Killed` when the token fired first).
pub struct CancellableSearch {
    kill: CancellationToken,
    output: BoxFuture<'static, anyhow::Result<SearchOutput>>,
}

impl CancellableSearch {
    pub fn new(
        kill: CancellationToken,
        output: BoxFuture<'static, anyhow::Result<SearchOutput>>,
    ) -> Self {
        Self { kill, output }
    }

    pub(crate) fn kill_token(&self) -> CancellationToken {
        self.kill.clone()
    }

    pub(crate) async fn wait(self) -> anyhow::Result<SearchOutput> {
        self.output.await
    }
}

/// Everything the engine needs from the host editor.
///
/// All methods are best-effort from the engine's point of view: failures
/// are logged and surfaced as status text, never propagated as panics or
/// unhandled errors.
#[async_trait]
pub trait Host: Send + Sync {
    /// Replace the prompt's suggestion list.
    async fn set_suggestions(&self, suggestions: Vec<Suggestion>) -> anyhow::Result<()>;

    /// Create a read-only structured surface and return its stable id.
    async fn create_surface(
        &self,
        title: &str,
        lines: Vec<SurfaceLine>,
    ) -> anyhow::Result<Surface>;

    /// Replace the content of an existing surface in place.
    async fn update_surface(&self, surface: Surface, lines: Vec<SurfaceLine>)
    -> anyhow::Result<()>;

    async fn set_surface_title(&self, surface: Surface, title: &str) -> anyhow::Result<()>;

    async fn close_surface(&self, surface: Surface) -> anyhow::Result<()>;

    /// Full text content of a file.
    async fn read_file(&self, path: &Path) -> anyhow::Result<String>;

    async fn active_pane(&self) -> anyhow::Result<PaneId>;

    async fn focus_pane(&self, pane: PaneId) -> anyhow::Result<()>;

    /// Move the cursor of a surface to a 0-based line.
    async fn set_cursor_line(&self, surface: Surface, line: u32) -> anyhow::Result<()>;

    /// Re-apply the current-entry highlight to a 0-based surface line.
    async fn highlight_line(&self, surface: Surface, line: u32) -> anyhow::Result<()>;

    /// Open a location in the editor (the default confirm action).
    async fn open_location(&self, location: &Location) -> anyhow::Result<()>;

    /// Show a transient status message.
    async fn set_status(&self, message: &str);

    /// Register a named handler for a named event. The engine derives
    /// handler names from its instance id, so names never collide across
    /// finder instances.
    fn subscribe(&self, event: EventKind, handler: &str);

    fn unsubscribe(&self, event: EventKind, handler: &str);

    /// Cooperative delay; the engine's debounce primitive.
    async fn delay(&self, duration: Duration);
}
