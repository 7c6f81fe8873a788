//! Field resolution and predicate building.
//!
//! Turns a tab's configured field descriptors plus a normalized input value
//! into an expression string the host evaluates. The three search styles
//! (plain text, parcel-number, owner-name) each have their own
//! builder; field-name resolution against the target layer is shared.

#![warn(missing_docs)]

mod fields;
mod owner;
mod predicate;
mod tiban;

pub use fields::{resolve_field_name, resolve_specs};
pub use owner::owner_predicate;
pub use predicate::{Join, eq_or_fuzzy_predicate, like_predicate};
pub use tiban::{FUZZY_RADIUS, tiban_predicate};
