//! Prompt mode: a query line above a suggestion list.

use scout_protocol::DisplayEntry;
use tracing::warn;

use crate::coordinator::SearchState;
use crate::error::FinderError;
use crate::error::Result;
use crate::events::EventKind;
use crate::finder::Finder;
use crate::finder::Mode;
use crate::finder::preview_enabled;
use crate::host::PaneId;
use crate::host::Suggestion;
use crate::preview::Preview;
use crate::source::FinderSource;

pub(crate) struct PromptState<T> {
    /// Items currently shown, in display order.
    pub(crate) results: Vec<T>,
    /// Formatted entry per result, same order.
    pub(crate) entries: Vec<DisplayEntry>,
    pub(crate) selected: Option<usize>,
    /// Filter sources only: the full loaded set.
    pub(crate) all_items: Option<Vec<T>>,
    pub(crate) search: SearchState,
    /// Pane that was focused when the prompt opened; focus returns here.
    pub(crate) origin_pane: PaneId,
    pub(crate) preview: Preview,
}

impl<T> PromptState<T> {
    fn new(origin_pane: PaneId, context_lines: u32) -> Self {
        Self {
            results: Vec::new(),
            entries: Vec::new(),
            selected: None,
            all_items: None,
            search: SearchState::default(),
            origin_pane,
            preview: Preview::new(context_lines),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Finder<T> {
    /// Open this finder as an interactive prompt.
    ///
    /// Filter sources load their items eagerly and show the unfiltered set;
    /// search sources start empty and populate as the user types. A failed
    /// load degrades to an empty prompt rather than refusing to open.
    pub async fn prompt(&self) -> Result<()> {
        let shared = self.shared();
        let mut mode = shared.mode.lock().await;
        if !matches!(*mode, Mode::Closed) {
            return Err(FinderError::AlreadyOpen(shared.id.clone()));
        }

        let origin = shared.host.active_pane().await?;
        let mut state = PromptState::new(origin, shared.config.preview.context_lines);
        match &shared.source {
            FinderSource::Filter(source) => {
                match (source.load)().await {
                    Ok(items) => state.all_items = Some(items),
                    Err(err) => {
                        warn!("finder {} failed to load items: {err:#}", shared.id);
                        shared
                            .host
                            .set_status(&format!("load failed: {err}"))
                            .await;
                        state.all_items = Some(Vec::new());
                    }
                }
                self.apply_prompt_filter(&mut state, "").await;
            }
            FinderSource::Search(_) => {
                self.render_suggestions(&[]).await;
            }
        }

        shared.registry.register(&[
            EventKind::InputChanged,
            EventKind::SelectionChanged,
            EventKind::Confirmed,
            EventKind::Cancelled,
        ]);
        *mode = Mode::Prompt(state);
        self.mark_open(true);
        Ok(())
    }

    pub(crate) async fn on_input_changed(&self, text: String) -> bool {
        let shared = self.shared();
        match &shared.source {
            FinderSource::Filter(_) => {
                let mut mode = shared.mode.lock().await;
                let Mode::Prompt(state) = &mut *mode else {
                    return false;
                };
                self.apply_prompt_filter(state, &text).await;
                true
            }
            FinderSource::Search(_) => {
                let version = {
                    let mut mode = shared.mode.lock().await;
                    let Mode::Prompt(state) = &mut *mode else {
                        return false;
                    };
                    state.search.begin_query()
                };
                self.spawn_search(text, version);
                true
            }
        }
    }

    /// Re-rank the loaded set against the query and render. Runs
    /// synchronously under the mode lock; filter sources never debounce.
    pub(crate) async fn apply_prompt_filter(&self, state: &mut PromptState<T>, query: &str) {
        let shared = self.shared();
        let FinderSource::Filter(source) = &shared.source else {
            return;
        };
        let results: Vec<T> = {
            let items: &[T] = state.all_items.as_deref().unwrap_or(&[]);
            let indices = match &source.filter {
                Some(filter) => {
                    let mut indices = filter(items, query);
                    indices.truncate(shared.config.max_results);
                    indices
                }
                None => {
                    let labels: Vec<String> = shared
                        .format_entries(items)
                        .into_iter()
                        .map(|entry| entry.label)
                        .collect();
                    scout_matcher::rank(&labels, query, shared.config.max_results)
                }
            };
            indices
                .into_iter()
                .filter_map(|index| items.get(index).cloned())
                .collect()
        };
        self.apply_prompt_results(state, results).await;
    }

    /// Install a new result set and render it. The caller holds the mode
    /// lock, so renders can never interleave out of order.
    pub(crate) async fn apply_prompt_results(&self, state: &mut PromptState<T>, items: Vec<T>) {
        state.entries = self.shared().format_entries(&items);
        state.results = items;
        state.selected = None;
        self.render_suggestions(&state.entries).await;
    }

    pub(crate) async fn on_selection_changed(&self, index: Option<usize>) -> bool {
        let shared = self.shared();
        let mut mode = shared.mode.lock().await;
        let Mode::Prompt(state) = &mut *mode else {
            return false;
        };
        state.selected = index;
        if let Some(index) = index
            && preview_enabled(&shared.config, &state.entries)
            && let Some(entry) = state.entries.get(index).cloned()
        {
            let origin = state.origin_pane;
            state.preview.show(&shared.host, &entry, origin).await;
        }
        true
    }

    pub(crate) async fn render_suggestions(&self, entries: &[DisplayEntry]) {
        let shared = self.shared();
        if let Err(err) = shared.host.set_suggestions(suggestions_from(entries)).await {
            warn!("suggestion render failed: {err:#}");
            shared
                .host
                .set_status(&format!("render failed: {err}"))
                .await;
        }
    }
}

fn suggestions_from(entries: &[DisplayEntry]) -> Vec<Suggestion> {
    entries
        .iter()
        .enumerate()
        .map(|(value, entry)| Suggestion {
            text: entry.label.clone(),
            description: entry.description.clone(),
            value,
        })
        .collect()
}
