//! Panel mode: a persistent structured surface the cursor navigates.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use scout_protocol::DisplayEntry;
use tokio::sync::mpsc;
use tracing::warn;

use crate::config::GroupBy;
use crate::error::FinderError;
use crate::error::Result;
use crate::events::EventKind;
use crate::finder::Finder;
use crate::finder::Mode;
use crate::finder::preview_enabled;
use crate::host::BufferId;
use crate::host::LineKind;
use crate::host::PaneId;
use crate::host::Surface;
use crate::host::SurfaceLine;
use crate::preview::Preview;
use crate::source::FinderProvider;
use crate::source::ProviderSubscription;

const NO_FILE_HEADER: &str = "(no file):";
const HELP_TEXT: &str = "enter: open   q: close";

pub(crate) struct PanelState<T> {
    pub(crate) items: Vec<T>,
    pub(crate) entries: Vec<DisplayEntry>,
    /// Surface line number to entry index, rebuilt on every render.
    /// Only `Item` lines appear here.
    pub(crate) line_items: BTreeMap<u32, usize>,
    pub(crate) cursor_line: u32,
    pub(crate) surface: Option<Surface>,
    pub(crate) origin_pane: PaneId,
    pub(crate) live: Option<LivePanel<T>>,
    pub(crate) preview: Preview,
}

pub(crate) struct LivePanel<T> {
    pub(crate) provider: Arc<dyn FinderProvider<T>>,
    pub(crate) subscription: Option<ProviderSubscription>,
}

pub(crate) struct PanelRender {
    pub(crate) lines: Vec<SurfaceLine>,
    pub(crate) line_items: BTreeMap<u32, usize>,
}

impl<T: Clone + Send + Sync + 'static> Finder<T> {
    /// Open this finder as a panel over a fixed set of items.
    pub async fn panel(&self, items: Vec<T>) -> Result<()> {
        self.open_panel(items, None).await
    }

    /// Open this finder as a live panel. The provider's notifications
    /// trigger a re-pull and in-place re-render until the panel closes.
    pub async fn live_panel(&self, provider: Arc<dyn FinderProvider<T>>) -> Result<()> {
        let items = provider.get_items();
        self.open_panel(items, Some(provider)).await
    }

    async fn open_panel(
        &self,
        items: Vec<T>,
        provider: Option<Arc<dyn FinderProvider<T>>>,
    ) -> Result<()> {
        let shared = self.shared();
        let mut mode = shared.mode.lock().await;
        if !matches!(*mode, Mode::Closed) {
            return Err(FinderError::AlreadyOpen(shared.id.clone()));
        }

        let origin = shared.host.active_pane().await?;
        let entries = shared.format_entries(&items);
        let title = format!("{} ({})", shared.title_snapshot(), entries.len());
        let render = build_panel_lines(&title, &entries, shared.config.group_by);
        let surface = shared
            .host
            .create_surface(&title, render.lines)
            .await?;

        // Land the cursor on the first selectable line.
        let cursor = render.line_items.keys().next().copied().unwrap_or(0);
        if let Err(err) = shared.host.set_cursor_line(surface, cursor).await {
            warn!("initial cursor placement failed: {err:#}");
        }

        let mut state = PanelState {
            items,
            entries,
            line_items: render.line_items,
            cursor_line: cursor,
            surface: Some(surface),
            origin_pane: origin,
            live: None,
            preview: Preview::new(shared.config.preview.context_lines),
        };
        if let Some(provider) = provider {
            let (notify_tx, notify_rx) = mpsc::unbounded_channel();
            let subscription = provider.subscribe(Box::new(move || {
                let _ = notify_tx.send(());
            }));
            state.live = Some(LivePanel {
                provider,
                subscription: Some(subscription),
            });
            self.spawn_live_refresh(notify_rx);
        }

        shared.registry.register(&[
            EventKind::Confirmed,
            EventKind::Cancelled,
            EventKind::CursorMoved,
        ]);
        *mode = Mode::Panel(state);
        self.mark_open(true);
        Ok(())
    }

    /// Drain provider notifications until the channel closes. Closing the
    /// panel unsubscribes, which drops the sender and ends this task; a
    /// notification racing the close finds the mode changed and is a no-op.
    fn spawn_live_refresh(&self, mut notify_rx: mpsc::UnboundedReceiver<()>) {
        let finder = self.clone();
        tokio::spawn(async move {
            while notify_rx.recv().await.is_some() {
                finder.refresh_live_panel().await;
            }
        });
    }

    async fn refresh_live_panel(&self) {
        let shared = self.shared();
        let mut mode = shared.mode.lock().await;
        let Mode::Panel(state) = &mut *mode else {
            return;
        };
        let Some(surface) = state.surface else {
            return;
        };
        let Some(live) = &state.live else {
            return;
        };

        let items = live.provider.get_items();
        let entries = shared.format_entries(&items);
        let title = format!("{} ({})", shared.title_snapshot(), entries.len());
        let render = build_panel_lines(&title, &entries, shared.config.group_by);
        state.items = items;
        state.entries = entries;
        state.line_items = render.line_items;

        if let Err(err) = shared.host.update_surface(surface, render.lines).await {
            warn!("panel refresh failed: {err:#}");
            shared
                .host
                .set_status(&format!("panel refresh failed: {err}"))
                .await;
            return;
        }
        if let Err(err) = shared.host.set_surface_title(surface, &title).await {
            warn!("panel retitle failed: {err:#}");
        }
    }

    pub(crate) async fn on_cursor_moved(
        &self,
        buffer: BufferId,
        file: Option<PathBuf>,
        line: u32,
    ) -> bool {
        let shared = self.shared();
        let mut mode = shared.mode.lock().await;
        let Mode::Panel(state) = &mut *mode else {
            return false;
        };
        let Some(surface) = state.surface else {
            return false;
        };

        if buffer == surface.buffer {
            state.cursor_line = line;
            if let Some(&index) = state.line_items.get(&line)
                && preview_enabled(&shared.config, &state.entries)
                && let Some(entry) = state.entries.get(index).cloned()
            {
                // The panel keeps input focus while previewing.
                let panel_pane = surface.pane;
                state.preview.show(&shared.host, &entry, panel_pane).await;
            }
            return true;
        }

        if !shared.config.sync_with_editor {
            return true;
        }
        let Some(file) = file else {
            return true;
        };
        // Host cursor lines are 0-based; entry locations are 1-based.
        let target = state.entries.iter().position(|entry| {
            entry
                .location
                .as_ref()
                .is_some_and(|loc| loc.file == file && loc.line == line + 1)
        });
        if let Some(index) = target
            && let Some((&panel_line, _)) = state
                .line_items
                .iter()
                .find(|&(_, &candidate)| candidate == index)
        {
            state.cursor_line = panel_line;
            if let Err(err) = shared.host.set_cursor_line(surface, panel_line).await {
                warn!("panel cursor sync failed: {err:#}");
            }
            if let Err(err) = shared.host.highlight_line(surface, panel_line).await {
                warn!("panel highlight failed: {err:#}");
            }
        }
        true
    }
}

/// Title, blank, the item body (flat or grouped), blank, help footer.
/// Grouped rendering buckets by file in first-seen order; items without a
/// location share a trailing sentinel bucket.
pub(crate) fn build_panel_lines(
    title: &str,
    entries: &[DisplayEntry],
    group_by: Option<GroupBy>,
) -> PanelRender {
    let mut lines = vec![
        SurfaceLine::new(LineKind::Title, title),
        SurfaceLine::blank(),
    ];
    let mut line_items = BTreeMap::new();

    match group_by {
        None => {
            for (index, entry) in entries.iter().enumerate() {
                line_items.insert(lines.len() as u32, index);
                lines.push(SurfaceLine::item(
                    format!("{:>3}. {}", index + 1, entry_text(entry)),
                    entry.severity,
                ));
            }
        }
        Some(GroupBy::File) => {
            let mut buckets: Vec<(Option<PathBuf>, Vec<usize>)> = Vec::new();
            for (index, entry) in entries.iter().enumerate() {
                let key = entry.location.as_ref().map(|loc| loc.file.clone());
                match buckets.iter_mut().find(|(existing, _)| *existing == key) {
                    Some((_, indices)) => indices.push(index),
                    None => buckets.push((key, vec![index])),
                }
            }
            // Locationless items render last regardless of arrival order.
            buckets.sort_by_key(|(key, _)| key.is_none());
            for (position, (file, indices)) in buckets.iter().enumerate() {
                if position > 0 {
                    lines.push(SurfaceLine::blank());
                }
                lines.push(SurfaceLine::new(LineKind::Header, header_for(file.as_deref())));
                for &index in indices {
                    line_items.insert(lines.len() as u32, index);
                    lines.push(SurfaceLine::item(
                        format!("  {}", entry_text(&entries[index])),
                        entries[index].severity,
                    ));
                }
            }
        }
    }

    lines.push(SurfaceLine::blank());
    lines.push(SurfaceLine::new(LineKind::Help, HELP_TEXT));
    PanelRender { lines, line_items }
}

fn header_for(file: Option<&std::path::Path>) -> String {
    match file {
        Some(path) => {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());
            format!("{name}:")
        }
        None => NO_FILE_HEADER.to_string(),
    }
}

fn entry_text(entry: &DisplayEntry) -> String {
    match &entry.description {
        Some(description) => format!("{}  {description}", entry.label),
        None => entry.label.clone(),
    }
}
