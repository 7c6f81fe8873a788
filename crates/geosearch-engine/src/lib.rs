//! Search execution and result handling.
//!
//! [`LayerSource`] names the set of layers a tab searches, [`run_search`]
//! executes a predicate across that set and groups non-empty results per
//! layer, and [`ResultModel`] holds the grouped results with pagination
//! for the result dialog.

#![warn(missing_docs)]

mod engine;
mod result;
mod source;

pub use engine::{ResultGroup, run_search, view_fields_for_layer};
pub use result::{Cell, DisplayMode, ResultModel, ResultTab};
pub use source::{
    ALL_LAYERS_TITLE, LayerSource, VISIBLE_LAYERS_TITLE, layer_source_for_tab, resolve_layer,
};
