//! The finder instance: one id, one source, at most one open mode.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

use scout_protocol::DisplayEntry;
use tracing::debug;
use tracing::warn;

use crate::config::FinderConfig;
use crate::events::FinderEvent;
use crate::events::HandlerRegistry;
use crate::host::Host;
use crate::panel::PanelState;
use crate::prompt::PromptState;
use crate::source::FinderSource;
use crate::source::FormatFn;
use crate::source::SelectFn;

/// What the finder is currently showing. Prompt and panel are mutually
/// exclusive per instance; every transition goes through `Closed`.
pub(crate) enum Mode<T> {
    Closed,
    Prompt(PromptState<T>),
    Panel(PanelState<T>),
}

/// Everything needed to construct a [`Finder`].
pub struct FinderOptions<T> {
    /// Stable instance id; namespaces handler registrations.
    pub id: String,
    pub title: String,
    pub source: FinderSource<T>,
    pub format: FormatFn<T>,
    /// Invoked on confirm. `None` falls back to opening the entry's
    /// location.
    pub on_select: Option<SelectFn<T>>,
    pub config: FinderConfig,
}

impl<T> FinderOptions<T> {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        source: FinderSource<T>,
        format: impl Fn(&T, usize) -> DisplayEntry + Send + Sync + 'static,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            source,
            format: Box::new(format),
            on_select: None,
            config: FinderConfig::default(),
        }
    }

    pub fn with_on_select(
        mut self,
        on_select: impl Fn(T, DisplayEntry) -> futures::future::BoxFuture<'static, anyhow::Result<()>>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.on_select = Some(Box::new(on_select));
        self
    }

    pub fn with_config(mut self, config: FinderConfig) -> Self {
        self.config = config;
        self
    }
}

pub(crate) struct FinderShared<T> {
    pub(crate) id: String,
    pub(crate) host: Arc<dyn Host>,
    pub(crate) config: FinderConfig,
    title: Mutex<String>,
    format: FormatFn<T>,
    on_select: Option<SelectFn<T>>,
    pub(crate) source: FinderSource<T>,
    pub(crate) mode: tokio::sync::Mutex<Mode<T>>,
    pub(crate) registry: HandlerRegistry,
    open: AtomicBool,
}

impl<T> FinderShared<T> {
    pub(crate) fn format_entries(&self, items: &[T]) -> Vec<DisplayEntry> {
        items
            .iter()
            .enumerate()
            .map(|(index, item)| (self.format)(item, index))
            .collect()
    }

    pub(crate) fn title_snapshot(&self) -> String {
        lock_unpoisoned(&self.title).clone()
    }
}

/// A fuzzy find-and-navigate instance. Cheap to clone; all clones share
/// the same state.
pub struct Finder<T> {
    shared: Arc<FinderShared<T>>,
}

impl<T> Clone for Finder<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Finder<T> {
    pub fn new(host: Arc<dyn Host>, options: FinderOptions<T>) -> Self {
        let registry = HandlerRegistry::new(host.clone(), &options.id);
        Self {
            shared: Arc::new(FinderShared {
                id: options.id,
                host,
                config: options.config,
                title: Mutex::new(options.title),
                format: options.format,
                on_select: options.on_select,
                source: options.source,
                mode: tokio::sync::Mutex::new(Mode::Closed),
                registry,
                open: AtomicBool::new(false),
            }),
        }
    }

    pub(crate) fn shared(&self) -> &FinderShared<T> {
        &self.shared
    }

    pub(crate) fn mark_open(&self, open: bool) {
        self.shared.open.store(open, Ordering::Relaxed);
    }

    /// Whether a prompt or panel is currently active.
    pub fn is_open(&self) -> bool {
        self.shared.open.load(Ordering::Relaxed)
    }

    /// Route a host event to the active mode.
    ///
    /// Returns `true` while the finder remains interested in this event
    /// class; `false` tells the host the registration is stale.
    pub async fn handle_event(&self, event: FinderEvent) -> bool {
        match event {
            FinderEvent::InputChanged { text } => self.on_input_changed(text).await,
            FinderEvent::SelectionChanged { index } => self.on_selection_changed(index).await,
            FinderEvent::Confirmed => self.on_confirmed().await,
            FinderEvent::Cancelled => self.on_cancelled().await,
            FinderEvent::CursorMoved { buffer, file, line } => {
                self.on_cursor_moved(buffer, file, line).await
            }
        }
    }

    async fn on_confirmed(&self) -> bool {
        let shared = self.shared();
        // Snapshot the selection, then release the lock before running
        // teardown or user callbacks.
        let (selection, origin, was_prompt) = {
            let mut mode = shared.mode.lock().await;
            match &mut *mode {
                Mode::Closed => return false,
                Mode::Prompt(state) => {
                    let selection = state.selected.and_then(|index| {
                        state
                            .results
                            .get(index)
                            .cloned()
                            .zip(state.entries.get(index).cloned())
                    });
                    (selection, state.origin_pane, true)
                }
                Mode::Panel(state) => {
                    let selection = state.line_items.get(&state.cursor_line).and_then(|&index| {
                        state
                            .items
                            .get(index)
                            .cloned()
                            .zip(state.entries.get(index).cloned())
                    });
                    (selection, state.origin_pane, false)
                }
            }
        };

        if was_prompt {
            // The prompt is single-shot: confirming always closes it.
            self.close().await;
        }

        match selection {
            Some((item, entry)) => {
                if !was_prompt && let Err(err) = shared.host.focus_pane(origin).await {
                    warn!("focus restore failed: {err:#}");
                }
                self.invoke_select(item, entry).await;
            }
            None if was_prompt => {
                shared.host.set_status("no selection").await;
            }
            None => {
                shared.host.set_status("no item selected").await;
            }
        }
        true
    }

    async fn on_cancelled(&self) -> bool {
        {
            let mode = self.shared().mode.lock().await;
            if matches!(*mode, Mode::Closed) {
                return false;
            }
        }
        self.close().await;
        true
    }

    async fn invoke_select(&self, item: T, entry: DisplayEntry) {
        let shared = self.shared();
        match &shared.on_select {
            Some(on_select) => {
                if let Err(err) = on_select(item, entry).await {
                    warn!("selection handler failed: {err:#}");
                    shared.host.set_status(&format!("open failed: {err}")).await;
                }
            }
            None => match &entry.location {
                Some(location) => {
                    if let Err(err) = shared.host.open_location(location).await {
                        warn!("open location failed: {err:#}");
                        shared.host.set_status(&format!("open failed: {err}")).await;
                    }
                }
                None => {
                    debug!("confirmed entry has no location");
                    shared.host.set_status("selected item has no location").await;
                }
            },
        }
    }

    /// Tear down whichever mode is active and release all host resources:
    /// in-flight searches, previews, surfaces, subscriptions, handler
    /// registrations. Idempotent.
    pub async fn close(&self) {
        let shared = self.shared();
        let mut mode = shared.mode.lock().await;
        let previous = std::mem::replace(&mut *mode, Mode::Closed);
        self.mark_open(false);
        shared.registry.unregister_all();
        match previous {
            Mode::Closed => {}
            Mode::Prompt(mut state) => {
                if let Some(inflight) = state.search.inflight.take() {
                    inflight.kill.cancel();
                }
                state.preview.close(&shared.host).await;
                if let Err(err) = shared.host.set_suggestions(Vec::new()).await {
                    warn!("suggestion clear failed: {err:#}");
                }
                if let Err(err) = shared.host.focus_pane(state.origin_pane).await {
                    warn!("focus restore failed: {err:#}");
                }
            }
            Mode::Panel(mut state) => {
                if let Some(mut live) = state.live.take()
                    && let Some(subscription) = live.subscription.take()
                {
                    subscription.unsubscribe();
                }
                state.preview.close(&shared.host).await;
                if let Some(surface) = state.surface.take()
                    && let Err(err) = shared.host.close_surface(surface).await
                {
                    warn!("panel close failed: {err:#}");
                }
                if let Err(err) = shared.host.focus_pane(state.origin_pane).await {
                    warn!("focus restore failed: {err:#}");
                }
            }
        }
    }

    /// Change the finder's base title. An open panel is retitled in place
    /// with its entry count; otherwise the new title applies on next open.
    pub async fn update_title(&self, title: impl Into<String>) {
        let shared = self.shared();
        let title = title.into();
        *lock_unpoisoned(&shared.title) = title.clone();

        let mode = shared.mode.lock().await;
        match &*mode {
            Mode::Panel(state) => {
                if let Some(surface) = state.surface {
                    let full = format!("{title} ({})", state.entries.len());
                    if let Err(err) = shared.host.set_surface_title(surface, &full).await {
                        warn!("panel retitle failed: {err:#}");
                    }
                }
            }
            _ => {
                debug!("title for finder {} updated while not showing a panel", shared.id);
            }
        }
    }
}

/// Whether to show a preview for the current entry set. An explicit config
/// wins; otherwise previews turn on when any entry carries a location.
pub(crate) fn preview_enabled(config: &FinderConfig, entries: &[DisplayEntry]) -> bool {
    config
        .preview
        .enabled
        .unwrap_or_else(|| entries.iter().any(|entry| entry.location.is_some()))
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
