//! Fuzzy find-and-navigate engine for editor extension layers.
//!
//! A [`Finder`] instance pairs a data source with formatting and selection
//! callbacks and presents it in one of two modes: an interactive prompt
//! with a live suggestion list, or a persistent panel surface navigated
//! with the cursor. Search-backed prompts debounce, version and cancel
//! external searches so stale results never render.

mod config;
mod coordinator;
mod error;
mod events;
mod finder;
mod host;
mod panel;
mod preview;
mod prompt;
mod source;

pub use scout_protocol as protocol;

pub use config::FinderConfig;
pub use config::GroupBy;
pub use config::PreviewConfig;
pub use error::FinderError;
pub use error::Result;
pub use events::EventKind;
pub use events::FinderEvent;
pub use finder::Finder;
pub use finder::FinderOptions;
pub use host::BufferId;
pub use host::CancellableSearch;
pub use host::Host;
pub use host::LineKind;
pub use host::PaneId;
pub use host::SearchOutput;
pub use host::SearchStatus;
pub use host::Suggestion;
pub use host::Surface;
pub use host::SurfaceLine;
pub use source::FilterFn;
pub use source::FilterSource;
pub use source::FinderProvider;
pub use source::FinderSource;
pub use source::FormatFn;
pub use source::LoadFn;
pub use source::ParseFn;
pub use source::ProviderSubscription;
pub use source::SearchFn;
pub use source::SearchInvocation;
pub use source::SearchSource;
pub use source::SelectFn;
