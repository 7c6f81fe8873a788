//! Map-theme orchestration for geosearch.
//!
//! Themes are grouped by a bracketed label convention for the toolbar
//! chooser, applied either as an overwrite or as an additive union with
//! the current visibility, and a generated pre-search theme preserves the
//! state from just before each search for a one-click restore.

#![warn(missing_docs)]

mod apply;
mod group;
mod snapshot;

pub use apply::{PRE_SEARCH_THEME, ThemeManager};
pub use group::{
    BRACKET_CLOSE_KEY, BRACKET_OPEN_KEY, DEFAULT_BRACKET_CLOSE, DEFAULT_BRACKET_OPEN, ThemeGroups,
    ThemeSelector, parse_theme_group, parse_theme_group_with, theme_brackets,
};
pub use snapshot::{
    LayerSnapshot, SnapshotStore, ThemeFileError, ThemeSnapshot, apply_snapshot, capture_snapshot,
    load_theme_file, save_theme_file,
};
