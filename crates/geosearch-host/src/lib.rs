//! Host GIS abstraction for geosearch.
//!
//! The search core never talks to a concrete GIS runtime. Everything it
//! needs from the host (layers, the map canvas, the layer tree, map
//! themes, project variables) is expressed as the small capability traits
//! in [`api`], summed up in the [`Host`] trait. A production adapter wires
//! those to the real application; [`MemoryHost`] implements the whole
//! surface in memory so the core can be exercised headless.
//!
//! Predicates are exchanged as host-evaluable expression strings. The
//! [`expr`] module implements the evaluator the memory host uses for them.

#![warn(missing_docs)]

mod api;
pub mod expr;
mod geometry;
mod memory;
mod types;
mod vars;

pub use api::{
    CanvasApi, Host, LayerApi, LayerTreeApi, ProjectApi, StyleApi, TaskApi, ThemeApi, VariableApi,
};
pub use geometry::{Crs, Point, Rect};
pub use memory::{LayerBuilder, MemoryHost, VarSetter};
pub use types::{
    AttrValue, Feature, FeatureId, FieldDef, FieldType, LayerHandle, LayerId, LayerNode,
    LegendItem, LegendItemKind, LegendState, NodePath,
};
pub use vars::set_project_variable;
