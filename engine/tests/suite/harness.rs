//! A scripted host that records every call the engine makes.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;
use scout_engine::BufferId;
use scout_engine::EventKind;
use scout_engine::Host;
use scout_engine::PaneId;
use scout_engine::Suggestion;
use scout_engine::Surface;
use scout_engine::SurfaceLine;
use scout_engine::protocol::Location;

pub const ORIGIN_PANE: PaneId = PaneId(1);

#[derive(Clone, Debug, PartialEq)]
pub enum HostCall {
    Suggestions(Vec<String>),
    CreateSurface { title: String, surface: Surface },
    UpdateSurface { surface: Surface, lines: Vec<String> },
    SetSurfaceTitle { title: String },
    CloseSurface(Surface),
    FocusPane(PaneId),
    SetCursorLine(u32),
    HighlightLine(u32),
    OpenLocation { file: PathBuf, line: u32 },
    Status(String),
    Subscribe(String),
    Unsubscribe(String),
}

#[derive(Default)]
pub struct MockHost {
    calls: Mutex<Vec<HostCall>>,
    files: Mutex<HashMap<PathBuf, String>>,
    next_surface: AtomicU64,
}

impl MockHost {
    pub fn add_file(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files.lock().unwrap().insert(path.into(), content.into());
    }

    pub fn calls(&self) -> Vec<HostCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Labels of the most recent suggestion render, if any.
    pub fn last_suggestions(&self) -> Option<Vec<String>> {
        self.calls()
            .into_iter()
            .rev()
            .find_map(|call| match call {
                HostCall::Suggestions(labels) => Some(labels),
                _ => None,
            })
    }

    pub fn suggestion_renders(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, HostCall::Suggestions(_)))
            .count()
    }

    pub fn statuses(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Status(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn created_surfaces(&self) -> Vec<(String, Surface)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::CreateSurface { title, surface } => Some((title, surface)),
                _ => None,
            })
            .collect()
    }

    pub fn subscriptions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Subscribe(handler) => Some(handler),
                _ => None,
            })
            .collect()
    }

    pub fn unsubscriptions(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::Unsubscribe(handler) => Some(handler),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: HostCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Host for MockHost {
    async fn set_suggestions(&self, suggestions: Vec<Suggestion>) -> anyhow::Result<()> {
        self.record(HostCall::Suggestions(
            suggestions.into_iter().map(|s| s.text).collect(),
        ));
        Ok(())
    }

    async fn create_surface(
        &self,
        title: &str,
        _lines: Vec<SurfaceLine>,
    ) -> anyhow::Result<Surface> {
        let id = 100 + self.next_surface.fetch_add(1, Ordering::Relaxed);
        let surface = Surface {
            buffer: BufferId(id),
            pane: PaneId(id),
        };
        self.record(HostCall::CreateSurface {
            title: title.to_string(),
            surface,
        });
        Ok(surface)
    }

    async fn update_surface(
        &self,
        surface: Surface,
        lines: Vec<SurfaceLine>,
    ) -> anyhow::Result<()> {
        self.record(HostCall::UpdateSurface {
            surface,
            lines: lines.into_iter().map(|line| line.text).collect(),
        });
        Ok(())
    }

    async fn set_surface_title(&self, _surface: Surface, title: &str) -> anyhow::Result<()> {
        self.record(HostCall::SetSurfaceTitle {
            title: title.to_string(),
        });
        Ok(())
    }

    async fn close_surface(&self, surface: Surface) -> anyhow::Result<()> {
        self.record(HostCall::CloseSurface(surface));
        Ok(())
    }

    async fn read_file(&self, path: &Path) -> anyhow::Result<String> {
        self.files
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("no such file: {}", path.display()))
    }

    async fn active_pane(&self) -> anyhow::Result<PaneId> {
        Ok(ORIGIN_PANE)
    }

    async fn focus_pane(&self, pane: PaneId) -> anyhow::Result<()> {
        self.record(HostCall::FocusPane(pane));
        Ok(())
    }

    async fn set_cursor_line(&self, _surface: Surface, line: u32) -> anyhow::Result<()> {
        self.record(HostCall::SetCursorLine(line));
        Ok(())
    }

    async fn highlight_line(&self, _surface: Surface, line: u32) -> anyhow::Result<()> {
        self.record(HostCall::HighlightLine(line));
        Ok(())
    }

    async fn open_location(&self, location: &Location) -> anyhow::Result<()> {
        self.record(HostCall::OpenLocation {
            file: location.file.clone(),
            line: location.line,
        });
        Ok(())
    }

    async fn set_status(&self, message: &str) {
        self.record(HostCall::Status(message.to_string()));
    }

    fn subscribe(&self, _event: EventKind, handler: &str) {
        self.record(HostCall::Subscribe(handler.to_string()));
    }

    fn unsubscribe(&self, _event: EventKind, handler: &str) {
        self.record(HostCall::Unsubscribe(handler.to_string()));
    }

    async fn delay(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
