//! Vector-map search and result-navigation core.
//!
//! This crate ties the subsystems together: [`SearchController`] builds
//! one [`SearchFeature`] per configured tab, routes the search button to
//! the active tab, pushes toolbar state (pan mode, fixed scale, additive
//! themes, forced layer visibility) onto every feature, and mediates the
//! host's theme signals through re-entrancy guards.
//!
//! The host GIS application is abstracted behind
//! [`geosearch_host::Host`]; everything here runs identically against the
//! in-memory adapter, which is how the integration tests drive it.

#![warn(missing_docs)]

mod aza;
mod controller;
mod feature;
mod guards;

pub use aza::{AzaCodeTable, RowSource, StaticRows};
pub use controller::{SearchController, parse_scale_text};
pub use feature::{
    OWNER_TAB_TITLE, SearchFeature, SearchInputs, SearchKind, Suggestion, TIBAN_TAB_TITLE,
};
pub use guards::{ReentryGuard, ReentryPass, WarnLimiter};
