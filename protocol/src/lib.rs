//! Shared data types for the scout finder engine.
//!
//! Everything in this crate is a plain value: display entries are derived
//! from source items by a format function and regenerated on every render,
//! never mutated in place.

mod entry;
mod grep;

pub use entry::DisplayEntry;
pub use entry::Location;
pub use entry::Severity;
pub use grep::GrepMatch;
pub use grep::parse_grep_line;
pub use grep::parse_grep_output;
