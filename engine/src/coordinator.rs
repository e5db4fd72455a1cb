//! Supersession-safe coordination of external searches.
//!
//! Every input change allocates a strictly increasing version; every
//! resumption point after an await re-validates that version before
//! touching shared state. At most one external search is in flight per
//! finder, and its cancellation is acknowledged before the slot is
//! reused, so two processes never contend over shared context.

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::finder::Finder;
use crate::finder::Mode;
use crate::host::SearchOutput;
use crate::host::SearchStatus;
use crate::source::FinderSource;
use crate::source::SearchInvocation;

/// Search bookkeeping owned by the active prompt.
#[derive(Default)]
pub(crate) struct SearchState {
    version: u64,
    /// Last query that actually completed a search; repeats are skipped.
    last_completed: Option<String>,
    pub(crate) inflight: Option<InflightSearch>,
    pending_cancel: Option<oneshot::Receiver<()>>,
}

pub(crate) struct InflightSearch {
    pub(crate) kill: CancellationToken,
    done: oneshot::Receiver<()>,
}

impl SearchState {
    /// Allocate a version for a newly arrived query and request
    /// cancellation of any in-flight search. Runs synchronously at event
    /// arrival so no older search can sneak in a render afterwards.
    pub(crate) fn begin_query(&mut self) -> u64 {
        self.version += 1;
        if let Some(inflight) = self.inflight.take() {
            trace!("cancelling in-flight search for version {}", self.version);
            inflight.kill.cancel();
            self.pending_cancel = Some(inflight.done);
        }
        self.version
    }

    pub(crate) fn is_current(&self, version: u64) -> bool {
        self.version == version
    }
}

enum Resolution<T> {
    Output(anyhow::Result<SearchOutput>),
    Items(anyhow::Result<Vec<T>>),
}

impl<T: Clone + Send + Sync + 'static> Finder<T> {
    pub(crate) fn spawn_search(&self, query: String, version: u64) {
        let finder = self.clone();
        tokio::spawn(async move {
            finder.run_search(query, version).await;
        });
    }

    async fn run_search(&self, query: String, version: u64) {
        let shared = self.shared();
        let FinderSource::Search(source) = &shared.source else {
            return;
        };

        // Too-short queries clear the list without issuing a search.
        if query.trim().chars().count() < source.min_query_len {
            self.await_pending_cancel().await;
            let mut mode = shared.mode.lock().await;
            let Mode::Prompt(state) = &mut *mode else {
                return;
            };
            if !state.search.is_current(version) {
                return;
            }
            self.apply_prompt_results(state, Vec::new()).await;
            return;
        }

        shared.host.delay(source.debounce).await;

        // The previous process must have released any shared context
        // before a new one starts.
        self.await_pending_cancel().await;

        {
            let mode = shared.mode.lock().await;
            let Mode::Prompt(state) = &*mode else {
                return;
            };
            if !state.search.is_current(version) {
                trace!("query {query:?} superseded during debounce");
                return;
            }
            if state.search.last_completed.as_deref() == Some(query.as_str()) {
                trace!("query {query:?} already completed, skipping");
                return;
            }
        }

        let invocation = (source.search)(&query);
        let kill = match &invocation {
            SearchInvocation::Cancellable(handle) => handle.kill_token(),
            SearchInvocation::Immediate(_) => CancellationToken::new(),
        };
        let (done_tx, done_rx) = oneshot::channel();
        {
            let mut mode = shared.mode.lock().await;
            let Mode::Prompt(state) = &mut *mode else {
                kill.cancel();
                return;
            };
            if !state.search.is_current(version) {
                kill.cancel();
                return;
            }
            state.search.inflight = Some(InflightSearch {
                kill,
                done: done_rx,
            });
        }

        let resolution = match invocation {
            SearchInvocation::Cancellable(handle) => Resolution::Output(handle.wait().await),
            SearchInvocation::Immediate(future) => Resolution::Items(future.await),
        };
        // Acknowledge completion to whoever superseded us (if anyone).
        let _ = done_tx.send(());

        let mut mode = shared.mode.lock().await;
        let Mode::Prompt(state) = &mut *mode else {
            return;
        };
        if !state.search.is_current(version) {
            trace!("discarding superseded result for {query:?}");
            return;
        }
        state.search.inflight = None;

        match resolution {
            Resolution::Output(Ok(output)) => match output.status {
                SearchStatus::Killed => {
                    debug!("search for {query:?} was killed");
                }
                SearchStatus::Exit(0) => {
                    let items = (source.parse)(&output.stdout);
                    state.search.last_completed = Some(query);
                    self.apply_prompt_results(state, items).await;
                }
                SearchStatus::Exit(1) => {
                    // Tool-reported "no matches"; a normal empty result.
                    state.search.last_completed = Some(query);
                    self.apply_prompt_results(state, Vec::new()).await;
                }
                SearchStatus::Exit(code) => {
                    let diagnostic = output.stderr.trim().to_string();
                    warn!("search for {query:?} exited with {code}: {diagnostic}");
                    shared
                        .host
                        .set_status(&format!("search failed: {diagnostic}"))
                        .await;
                    self.apply_prompt_results(state, Vec::new()).await;
                }
            },
            Resolution::Items(Ok(items)) => {
                state.search.last_completed = Some(query);
                self.apply_prompt_results(state, items).await;
            }
            Resolution::Output(Err(err)) | Resolution::Items(Err(err)) => {
                if is_lifecycle_error(&err) {
                    debug!("suppressing expected search lifecycle error: {err:#}");
                    return;
                }
                warn!("search for {query:?} failed: {err:#}");
                shared
                    .host
                    .set_status(&format!("search failed: {err}"))
                    .await;
                self.apply_prompt_results(state, Vec::new()).await;
            }
        }
    }

    /// Await the acknowledgment of a previously requested cancellation, if
    /// one is pending.
    async fn await_pending_cancel(&self) {
        let pending = {
            let mut mode = self.shared().mode.lock().await;
            match &mut *mode {
                Mode::Prompt(state) => state.search.pending_cancel.take(),
                _ => None,
            }
        };
        if let Some(done) = pending {
            // A dropped sender also counts as "no longer running".
            let _ = done.await;
        }
    }
}

/// Killed searches and absent tools are expected lifecycle signals, not
/// user-facing failures.
fn is_lifecycle_error(err: &anyhow::Error) -> bool {
    if let Some(io) = err.downcast_ref::<std::io::Error>()
        && io.kind() == std::io::ErrorKind::NotFound
    {
        return true;
    }
    let text = format!("{err:#}").to_lowercase();
    text.contains("killed") || text.contains("not found")
}
