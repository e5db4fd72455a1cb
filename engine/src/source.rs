use std::time::Duration;

use futures::future::BoxFuture;
use scout_protocol::DisplayEntry;

use crate::host::CancellableSearch;

pub type FormatFn<T> = Box<dyn Fn(&T, usize) -> DisplayEntry + Send + Sync>;
pub type SelectFn<T> =
    Box<dyn Fn(T, DisplayEntry) -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;
pub type SearchFn<T> = Box<dyn Fn(&str) -> SearchInvocation<T> + Send + Sync>;
pub type ParseFn<T> = Box<dyn Fn(&str) -> Vec<T> + Send + Sync>;
pub type LoadFn<T> = Box<dyn Fn() -> BoxFuture<'static, anyhow::Result<Vec<T>>> + Send + Sync>;
pub type FilterFn<T> = Box<dyn Fn(&[T], &str) -> Vec<usize> + Send + Sync>;

/// What a search function hands back for one query.
///
/// The two shapes are an explicit tagged union so coordinator branching is
/// exhaustive: external processes come back as a killable handle whose
/// stdout still needs parsing, in-process searches resolve straight to
/// typed items.
pub enum SearchInvocation<T> {
    Cancellable(CancellableSearch),
    Immediate(BoxFuture<'static, anyhow::Result<Vec<T>>>),
}

/// An external, per-query computation (project grep, symbol references).
pub struct SearchSource<T> {
    pub(crate) search: SearchFn<T>,
    /// Converts a zero-exit stdout into typed items.
    pub(crate) parse: ParseFn<T>,
    pub(crate) debounce: Duration,
    pub(crate) min_query_len: usize,
}

impl<T> SearchSource<T> {
    pub fn new(
        search: impl Fn(&str) -> SearchInvocation<T> + Send + Sync + 'static,
        parse: impl Fn(&str) -> Vec<T> + Send + Sync + 'static,
    ) -> Self {
        Self {
            search: Box::new(search),
            parse: Box::new(parse),
            debounce: Duration::from_millis(150),
            min_query_len: 2,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_min_query_len(mut self, min_query_len: usize) -> Self {
        self.min_query_len = min_query_len;
        self
    }
}

/// A one-time bulk load, filtered client-side on every keystroke.
pub struct FilterSource<T> {
    pub(crate) load: LoadFn<T>,
    /// Replaces the default fuzzy ranking when set. Returns indices into
    /// the loaded items.
    pub(crate) filter: Option<FilterFn<T>>,
}

impl<T> FilterSource<T> {
    pub fn new(
        load: impl Fn() -> BoxFuture<'static, anyhow::Result<Vec<T>>> + Send + Sync + 'static,
    ) -> Self {
        Self {
            load: Box::new(load),
            filter: None,
        }
    }

    pub fn with_filter(
        mut self,
        filter: impl Fn(&[T], &str) -> Vec<usize> + Send + Sync + 'static,
    ) -> Self {
        self.filter = Some(Box::new(filter));
        self
    }
}

/// The data source a finder instance is built over.
pub enum FinderSource<T> {
    Search(SearchSource<T>),
    Filter(FilterSource<T>),
}

/// A pull-based live data source with push-based invalidation, used by
/// live panels (diagnostics and the like).
pub trait FinderProvider<T>: Send + Sync {
    fn get_items(&self) -> Vec<T>;

    /// Register an invalidation callback. The returned subscription keeps
    /// the callback alive; dropping or consuming it unsubscribes.
    fn subscribe(&self, notify: Box<dyn Fn() + Send + Sync>) -> ProviderSubscription;
}

/// Guard for a provider subscription. Unsubscribes when consumed or
/// dropped, so a torn-down panel can never be called back into.
pub struct ProviderSubscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ProviderSubscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to release (providers whose callbacks
    /// die naturally with the provider).
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    pub(crate) fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for ProviderSubscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}
